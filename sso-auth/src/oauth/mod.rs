//! The browser-facing OAuth2 SSO flow.
//!
//! Leaves first: state blob codec and anti-replay tokens ([`state`]), profile
//! normalization ([`profile`]), the token exchange ([`exchange`]) and profile
//! fetch ([`fetch`]) HTTP calls, the callback stash ([`stash`]), and the flow
//! controller that orchestrates them ([`flow`]).

pub mod exchange;
pub mod fetch;
pub mod flow;
pub mod profile;
pub mod stash;
pub mod state;

pub use exchange::{AccessTokenResponse, TokenExchangeClient};
pub use fetch::ProfileFetcher;
pub use flow::{CallbackOutcome, CallbackParams, ConnectData, RefreshOutcome, SsoFlow};
pub use profile::{translate, CanonicalProfile};
pub use stash::{InMemoryStashStore, StashStore, StashedSession, STASH_TTL_SECONDS};
pub use state::{InMemoryStateTokens, StateBlob, StateTokenService};

/// Merge override parameters into a default list.
///
/// Overrides replace defaults key-by-key (later lists win), then entries with
/// empty values are dropped before transmission.
pub(crate) fn merge_params(
    defaults: Vec<(String, String)>,
    overrides: &[&[(String, String)]],
) -> Vec<(String, String)> {
    let mut merged = defaults;
    for layer in overrides {
        for (key, value) in layer.iter() {
            match merged.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.clone(),
                None => merged.push((key.clone(), value.clone())),
            }
        }
    }
    merged.retain(|(_, value)| !value.is_empty());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_overrides_take_precedence() {
        let merged = merge_params(
            pairs(&[("grant_type", "authorization_code"), ("scope", "openid")]),
            &[&pairs(&[("scope", "custom"), ("audience", "api")])],
        );

        assert_eq!(
            merged,
            pairs(&[
                ("grant_type", "authorization_code"),
                ("scope", "custom"),
                ("audience", "api"),
            ])
        );
    }

    #[test]
    fn test_empty_values_are_dropped() {
        let merged = merge_params(
            pairs(&[("client_secret", ""), ("code", "abc")]),
            &[&pairs(&[("extra", "")])],
        );

        assert_eq!(merged, pairs(&[("code", "abc")]));
    }
}
