use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;

/// Default public base URL the SSO callback endpoints are reachable under.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:4000";

/// Default frontend URL the callback redirects to for the account-connect step.
pub const DEFAULT_CONNECT_URL: &str = "http://localhost:3000/account/connect";

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The public base URL this service is reachable under. Used to build the
    /// redirect URI registered with identity providers.
    #[arg(long, env, default_value = DEFAULT_PUBLIC_BASE_URL)]
    public_base_url: String,

    /// The frontend URL the provider callback redirects to, carrying the
    /// `target` and `stash_id` query parameters for the account-connect step.
    #[arg(long, env, default_value = DEFAULT_CONNECT_URL)]
    connect_url: String,

    /// Timeout in seconds for outbound calls to provider token and profile endpoints
    #[arg(long, env, default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Maximum transient-failure retries performed by the HTTP transport
    #[arg(long, env, default_value_t = 3)]
    pub http_max_retries: u32,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Returns the public base URL, without a trailing slash.
    pub fn public_base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }

    pub fn set_public_base_url(mut self, public_base_url: String) -> Self {
        self.public_base_url = public_base_url;
        self
    }

    /// Returns the frontend account-connect URL.
    pub fn connect_url(&self) -> &str {
        &self.connect_url
    }

    pub fn set_connect_url(mut self, connect_url: String) -> Self {
        self.connect_url = connect_url;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["sso-platform"]);
        assert_eq!(config.public_base_url(), DEFAULT_PUBLIC_BASE_URL);
        assert_eq!(config.connect_url(), DEFAULT_CONNECT_URL);
        assert_eq!(config.http_timeout_secs, 10);
        assert_eq!(config.http_max_retries, 3);
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn test_public_base_url_strips_trailing_slash() {
        let config = Config::parse_from(["sso-platform"])
            .set_public_base_url("https://sso.example.com/".to_string());
        assert_eq!(config.public_base_url(), "https://sso.example.com");
    }
}
