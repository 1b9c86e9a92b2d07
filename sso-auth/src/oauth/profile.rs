//! Provider profile normalization.
//!
//! Translates a raw provider profile payload into the canonical shape used
//! for account linking, driven entirely by the provider's configured field
//! mapping. Unmapped source fields pass through verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::provider::FieldMapping;

/// Canonical field names. A raw field whose literal name collides with one of
/// these is dropped rather than allowed to overwrite the mapped value.
const CANONICAL_KEYS: [&str; 6] = ["Email", "Photo", "Name", "FullName", "UniqueID", "Provider"];

/// The provider-agnostic normalized profile.
///
/// `unique_id` is the durable identity key used for account linking; merge
/// steps must never overwrite it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProfile {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Photo")]
    pub photo: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "FullName")]
    pub full_name: String,
    #[serde(rename = "UniqueID")]
    pub unique_id: String,
    #[serde(rename = "Provider")]
    pub provider: String,
    /// Untranslated source fields, preserved under their original keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Translate a raw profile payload into the canonical shape.
///
/// For each canonical field the configured source key is looked up (dotted
/// keys descend into nested objects), moved into place, and removed from the
/// raw set; absent fields become empty strings. Whatever remains is copied
/// through unchanged, and `Provider` is stamped last.
pub fn translate(
    mut raw: Map<String, Value>,
    mapping: &FieldMapping,
    provider_key: &str,
) -> CanonicalProfile {
    let email = take_field(&mut raw, &mapping.email);
    let photo = take_field(&mut raw, &mapping.photo);
    let name = take_field(&mut raw, &mapping.name);
    let full_name = take_field(&mut raw, &mapping.full_name);
    let unique_id = take_field(&mut raw, &mapping.unique_id);

    let mut extra = Map::new();
    for (key, value) in raw {
        if CANONICAL_KEYS.contains(&key.as_str()) {
            continue;
        }
        extra.insert(key, value);
    }

    CanonicalProfile {
        email,
        photo,
        name,
        full_name,
        unique_id,
        provider: provider_key.to_string(),
        extra,
    }
}

/// Remove the value at `path` from the raw profile and render it as a string.
fn take_field(raw: &mut Map<String, Value>, path: &str) -> String {
    take_path(raw, path).map(value_to_string).unwrap_or_default()
}

/// Remove and return the value at a possibly dotted path.
fn take_path(raw: &mut Map<String, Value>, path: &str) -> Option<Value> {
    match path.split_once('.') {
        Some((head, rest)) => {
            let nested = raw.get_mut(head)?.as_object_mut()?;
            take_path(nested, rest)
        }
        None => raw.remove(path),
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn test_translate_with_custom_mapping() {
        let mapping = FieldMapping {
            unique_id: "sub".to_string(),
            email: "email".to_string(),
            ..FieldMapping::default()
        };
        let profile = translate(
            raw(json!({"sub": "123", "email": "a@b.com", "locale": "en"})),
            &mapping,
            "acme",
        );

        assert_eq!(profile.unique_id, "123");
        assert_eq!(profile.email, "a@b.com");
        assert_eq!(profile.photo, "");
        assert_eq!(profile.name, "");
        assert_eq!(profile.full_name, "");
        assert_eq!(profile.provider, "acme");
        assert_eq!(profile.extra.get("locale"), Some(&json!("en")));
    }

    #[test]
    fn test_mapped_fields_are_removed_from_passthrough() {
        let profile = translate(
            raw(json!({"email": "a@b.com", "picture": "p.png"})),
            &FieldMapping::default(),
            "acme",
        );

        assert_eq!(profile.email, "a@b.com");
        assert_eq!(profile.photo, "p.png");
        assert!(profile.extra.is_empty());
    }

    #[test]
    fn test_dotted_path_lookup() {
        let mapping = FieldMapping {
            email: "account.contact.email".to_string(),
            ..FieldMapping::default()
        };
        let profile = translate(
            raw(json!({"account": {"contact": {"email": "a@b.com", "phone": "1"}}})),
            &mapping,
            "acme",
        );

        assert_eq!(profile.email, "a@b.com");
        // Siblings of the extracted leaf survive under the original nesting.
        assert_eq!(
            profile.extra.get("account"),
            Some(&json!({"contact": {"phone": "1"}}))
        );
    }

    #[test]
    fn test_collision_with_canonical_key_does_not_overwrite() {
        let mapping = FieldMapping {
            email: "mail".to_string(),
            ..FieldMapping::default()
        };
        let profile = translate(
            raw(json!({"mail": "mapped@b.com", "Email": "raw@b.com"})),
            &mapping,
            "acme",
        );

        assert_eq!(profile.email, "mapped@b.com");
        assert!(!profile.extra.contains_key("Email"));
    }

    #[test]
    fn test_non_string_values_are_rendered() {
        let mapping = FieldMapping {
            unique_id: "id".to_string(),
            ..FieldMapping::default()
        };
        let profile = translate(raw(json!({"id": 42, "verified": true})), &mapping, "acme");

        assert_eq!(profile.unique_id, "42");
        assert_eq!(profile.extra.get("verified"), Some(&json!(true)));
    }

    #[test]
    fn test_serializes_to_canonical_keys() {
        let profile = translate(
            raw(json!({"email": "a@b.com", "locale": "en"})),
            &FieldMapping::default(),
            "acme",
        );

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value.get("Email"), Some(&json!("a@b.com")));
        assert_eq!(value.get("Provider"), Some(&json!("acme")));
        assert_eq!(value.get("locale"), Some(&json!("en")));
    }
}
