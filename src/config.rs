use crate::{auth::Auth, errors::Result, telemetry::TelemetryConfig, Error};
use std::time::Duration;

/// Environment variable holding the API base URL
pub const ENV_BASE_URL: &str = "PASSWORD_SAFE_BASE_URL";
/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "PASSWORD_SAFE_API_KEY";
/// Environment variable holding the run-as user name
pub const ENV_RUN_AS_USERNAME: &str = "PASSWORD_SAFE_RUN_AS_USERNAME";
/// Environment variable holding the run-as user's password
pub const ENV_RUN_AS_PASSWORD: &str = "PASSWORD_SAFE_RUN_AS_PASSWORD";
/// Environment variable selecting OAuth client credentials
pub const ENV_USE_OAUTH: &str = "PASSWORD_SAFE_USE_OAUTH";
/// Environment variable holding the OAuth client id
pub const ENV_OAUTH_CLIENT_ID: &str = "PASSWORD_SAFE_OAUTH_CLIENT_ID";
/// Environment variable holding the OAuth client secret
pub const ENV_OAUTH_CLIENT_SECRET: &str = "PASSWORD_SAFE_OAUTH_CLIENT_SECRET";
/// Environment variable holding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "PASSWORD_SAFE_TIMEOUT_SECS";
/// Environment variable holding the default password duration in minutes
pub const ENV_PASSWORD_DURATION: &str = "PASSWORD_SAFE_PASSWORD_DURATION";
/// Environment variable toggling automatic token refresh
pub const ENV_AUTO_REFRESH: &str = "PASSWORD_SAFE_AUTO_REFRESH";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Password Safe API, including the version segment
    pub base_url: String,
    /// Authentication configuration
    pub auth: Auth,
    /// Request timeout
    pub timeout: Duration,
    /// Default check-out duration for password requests, in minutes
    pub default_password_duration: u32,
    /// Re-authenticate automatically when the session token expires or is rejected
    pub auto_refresh_token: bool,
    /// User agent suffix
    pub user_agent_suffix: Option<String>,
    /// Telemetry configuration
    pub telemetry_config: TelemetryConfig,
    /// Allow plain HTTP base URLs
    pub allow_insecure_http: bool,
}

/// Builder for creating a configured Client
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: String,
    auth: Option<Auth>,
    timeout_secs: u64,
    default_password_duration: u32,
    auto_refresh_token: bool,
    user_agent_suffix: Option<String>,
    telemetry_config: TelemetryConfig,
    allow_insecure_http: bool,
}

impl ClientBuilder {
    /// Create a new client builder with the given base URL
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the API including its version, e.g.
    ///   `"https://pam.example.com/BeyondTrust/api/public/v3/"`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: None,
            timeout_secs: crate::DEFAULT_TIMEOUT_SECS,
            default_password_duration: crate::DEFAULT_PASSWORD_DURATION_MINUTES,
            auto_refresh_token: true,
            user_agent_suffix: None,
            telemetry_config: TelemetryConfig::default(),
            allow_insecure_http: false,
        }
    }

    /// Create a builder from `PASSWORD_SAFE_*` environment variables
    ///
    /// `PASSWORD_SAFE_BASE_URL` is required. Credentials come from
    /// `PASSWORD_SAFE_API_KEY` / `PASSWORD_SAFE_RUN_AS_USERNAME` /
    /// `PASSWORD_SAFE_RUN_AS_PASSWORD`, or from `PASSWORD_SAFE_OAUTH_CLIENT_ID` /
    /// `PASSWORD_SAFE_OAUTH_CLIENT_SECRET` when `PASSWORD_SAFE_USE_OAUTH` is
    /// true. Missing credentials are reported by [`ClientBuilder::build`].
    pub fn from_env() -> Result<Self> {
        let base_url = env_var(ENV_BASE_URL)
            .ok_or_else(|| Error::Config(format!("{} is not set", ENV_BASE_URL)))?;

        let auth = if env_flag(ENV_USE_OAUTH)?.unwrap_or(false) {
            Auth::oauth(
                env_var(ENV_OAUTH_CLIENT_ID).unwrap_or_default(),
                env_var(ENV_OAUTH_CLIENT_SECRET).unwrap_or_default(),
            )
        } else {
            let auth = Auth::api_key(
                env_var(ENV_API_KEY).unwrap_or_default(),
                env_var(ENV_RUN_AS_USERNAME).unwrap_or_default(),
            );
            match env_var(ENV_RUN_AS_PASSWORD) {
                Some(password) => auth.with_run_as_password(password),
                None => auth,
            }
        };

        let mut builder = ClientBuilder::new(base_url).auth(auth);
        if let Some(secs) = env_number::<u64>(ENV_TIMEOUT_SECS)? {
            builder = builder.timeout_secs(secs);
        }
        if let Some(minutes) = env_number::<u32>(ENV_PASSWORD_DURATION)? {
            builder = builder.default_password_duration(minutes);
        }
        if let Some(enabled) = env_flag(ENV_AUTO_REFRESH)? {
            builder = builder.auto_refresh_token(enabled);
        }
        Ok(builder)
    }

    /// Set the authentication method
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the default check-out duration for password requests, in minutes
    pub fn default_password_duration(mut self, minutes: u32) -> Self {
        self.default_password_duration = minutes;
        self
    }

    /// Enable or disable automatic re-authentication (enabled by default)
    pub fn auto_refresh_token(mut self, enabled: bool) -> Self {
        self.auto_refresh_token = enabled;
        self
    }

    /// Add a custom user agent suffix
    pub fn user_agent_extra(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Configure telemetry/metrics
    #[cfg(feature = "metrics")]
    pub fn with_telemetry(mut self, config: TelemetryConfig) -> Self {
        self.telemetry_config = config;
        self
    }

    /// Enable telemetry with default settings
    #[cfg(feature = "metrics")]
    pub fn enable_telemetry(mut self) -> Self {
        self.telemetry_config.enabled = true;
        self
    }

    /// Allow a plain `http://` base URL
    ///
    /// Credentials and passwords then travel unencrypted; meant for local
    /// mock servers only.
    pub fn allow_insecure_http(mut self) -> Self {
        self.allow_insecure_http = true;
        self
    }

    /// Build the client with the configured options
    pub fn build(self) -> Result<crate::Client> {
        let url = self.base_url.trim().trim_end_matches('/');

        if url.starts_with("http://") && !self.allow_insecure_http {
            return Err(Error::Config(
                "HTTP URLs are not allowed by default. Use .allow_insecure_http() to enable (dangerous!)".to_string(),
            ));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Config(
                "Base URL must start with http:// or https://".to_string(),
            ));
        }

        let auth = self.auth.ok_or_else(|| {
            Error::Config(
                "Authentication is required. Use .auth() to set authentication method".to_string(),
            )
        })?;
        auth.validate().map_err(Error::Config)?;

        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout must be greater than zero".to_string()));
        }
        if self.default_password_duration == 0 {
            return Err(Error::Config(
                "default password duration must be greater than zero".to_string(),
            ));
        }

        let config = ClientConfig {
            base_url: url.to_string(),
            auth,
            timeout: Duration::from_secs(self.timeout_secs),
            default_password_duration: self.default_password_duration,
            auto_refresh_token: self.auto_refresh_token,
            user_agent_suffix: self.user_agent_suffix,
            telemetry_config: self.telemetry_config,
            allow_insecure_http: self.allow_insecure_http,
        };

        crate::client::Client::new(config)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(name: &str) -> Result<Option<bool>> {
    match env_var(name) {
        None => Ok(None),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::Config(format!(
                "{} must be a boolean, got {:?}",
                name, value
            ))),
        },
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    env_var(name)
        .map(|value| {
            value
                .parse()
                .map_err(|_| Error::Config(format!("{} must be a number, got {:?}", name, value)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_auth() {
        let result = ClientBuilder::new("https://example.com").build();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_builder_validates_url() {
        let result = ClientBuilder::new("not-a-url")
            .auth(Auth::api_key("key", "user"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_http() {
        let result = ClientBuilder::new("http://example.com")
            .auth(Auth::api_key("key", "user"))
            .build();
        assert!(matches!(result.unwrap_err(), Error::Config(_)));

        let result = ClientBuilder::new("http://localhost:8080/v3")
            .auth(Auth::api_key("key", "user"))
            .allow_insecure_http()
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_builder_rejects_empty_credentials() {
        let err = ClientBuilder::new("https://example.com")
            .auth(Auth::api_key("", "user"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("api_key"));

        let err = ClientBuilder::new("https://example.com")
            .auth(Auth::oauth("id", " "))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("oauth_client_secret"));
    }

    #[test]
    fn test_builder_rejects_zero_values() {
        let result = ClientBuilder::new("https://example.com")
            .auth(Auth::api_key("key", "user"))
            .timeout_secs(0)
            .build();
        assert!(matches!(result.unwrap_err(), Error::Config(_)));

        let result = ClientBuilder::new("https://example.com")
            .auth(Auth::api_key("key", "user"))
            .default_password_duration(0)
            .build();
        assert!(matches!(result.unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_builder_defaults() {
        let client = ClientBuilder::new("https://pam.example.com/BeyondTrust/api/public/v3/")
            .auth(Auth::api_key("key", "user"))
            .build()
            .unwrap();
        let config = client.config();
        assert_eq!(config.base_url, "https://pam.example.com/BeyondTrust/api/public/v3");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.default_password_duration, 60);
        assert!(config.auto_refresh_token);
    }
}
