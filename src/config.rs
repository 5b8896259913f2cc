//! Remote endpoint constants and client options.

use std::time::Duration;

/// Root of the BigPanda ingestion API
pub const DEFAULT_BASE_URL: &str = "https://api.bigpanda.io/data/v2";

/// Path receiving alerts, single or batched
pub const ALERTS_ENDPOINT: &str = "/alerts";

/// Path receiving deployment events
pub const DEPLOYMENTS_ENDPOINT: &str = "/deployments";

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable controlling whether system proxy settings are honored
pub const TRUST_ENV_VAR: &str = "TRUST_ENV";

/// Read [`TRUST_ENV_VAR`] from the process environment.
pub fn trust_env_from_env() -> bool {
    parse_trust_env(std::env::var(TRUST_ENV_VAR).ok().as_deref())
}

fn parse_trust_env(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !matches!(
            v.to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
    }
}

/// Options for constructing a [`BigPandaClient`](crate::BigPandaClient)
///
/// # Example
///
/// ```rust
/// use bigpanda_api::ClientOptions;
/// use std::time::Duration;
///
/// let options = ClientOptions::new("my-api-token")
///     .with_app_key("my-app-key")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(options.app_key.as_deref(), Some("my-app-key"));
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Organization API token, sent as a bearer credential
    pub api_token: String,

    /// Application key, required for alerts
    pub app_key: Option<String>,

    /// Root URL that endpoint paths are appended to
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Allow sending alerts without an app key
    pub suppress_app_key: bool,

    /// Honor system proxy settings
    pub trust_env: bool,
}

impl ClientOptions {
    /// Create options with defaults for everything but the API token
    ///
    /// `trust_env` is read from the `TRUST_ENV` environment variable.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            app_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            suppress_app_key: false,
            trust_env: trust_env_from_env(),
        }
    }

    /// Set the application key
    pub fn with_app_key(mut self, app_key: impl Into<String>) -> Self {
        self.app_key = Some(app_key.into());
        self
    }

    /// Override the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allow alerts to be sent without an app key
    pub fn with_suppress_app_key(mut self, suppress: bool) -> Self {
        self.suppress_app_key = suppress;
        self
    }

    /// Override the `TRUST_ENV` environment setting
    pub fn with_trust_env(mut self, trust_env: bool) -> Self {
        self.trust_env = trust_env;
        self
    }
}
