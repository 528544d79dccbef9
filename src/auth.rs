//! Authentication support for the Password Safe SDK
//!
//! Password Safe accepts two sign-in flows:
//!
//! 1. **API key** - an API key registered in BeyondInsight, used on behalf of a
//!    "run as" user (optionally with that user's password). Sent on every call as
//!    `Authorization: PS-Auth key=<key>; runas=<user>; pwd=[<password>]`.
//! 2. **OAuth client credentials** - a client id/secret pair exchanged for a
//!    bearer token at `Auth/connect/token`.
//!
//! Either way the client then calls `Auth/SignAppin` to open a session. The
//! resulting [`AuthenticationResult`] is cached by the client and refreshed
//! automatically when `auto_refresh_token` is enabled.
//!
//! # Examples
//!
//! ```
//! use password_safe_sdk::Auth;
//!
//! // API key with a run-as user
//! let auth = Auth::api_key("your-api-key", "svc-automation");
//!
//! // API key with a run-as user that also needs its password
//! let auth = Auth::api_key("your-api-key", "svc-automation")
//!     .with_run_as_password("run-as-password");
//!
//! // OAuth client credentials
//! let auth = Auth::oauth("client-id", "client-secret");
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use time::{Duration, OffsetDateTime};

/// Token type reported for API-key sessions
pub const PS_AUTH_TOKEN_TYPE: &str = "PS-Auth";

/// A token counts as expired this long before its real expiry
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 300;

/// Nominal lifetime of an API-key session
pub(crate) const API_KEY_SESSION_SECS: u64 = 3600;

/// Credentials used to sign in to Password Safe
///
/// All credentials are stored using [`SecretString`] so they never show up in
/// logs or debug output.
#[derive(Clone)]
pub enum Auth {
    /// API key plus the user the key acts on behalf of
    ApiKey {
        /// API key configured in BeyondInsight
        key: SecretString,
        /// User granted permission to use the key
        run_as_username: String,
        /// Password of the run-as user, when the key requires one
        run_as_password: Option<SecretString>,
    },
    /// OAuth client-credentials grant
    OAuth {
        /// OAuth client id
        client_id: String,
        /// OAuth client secret
        client_secret: SecretString,
    },
}

impl Auth {
    /// Create API-key authentication for the given run-as user
    pub fn api_key(key: impl Into<String>, run_as_username: impl Into<String>) -> Self {
        Auth::ApiKey {
            key: SecretString::new(key.into()),
            run_as_username: run_as_username.into(),
            run_as_password: None,
        }
    }

    /// Create OAuth client-credentials authentication
    pub fn oauth(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Auth::OAuth {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
        }
    }

    /// Attach the run-as user's password (API-key auth only)
    pub fn with_run_as_password(self, password: impl Into<String>) -> Self {
        match self {
            Auth::ApiKey {
                key,
                run_as_username,
                ..
            } => Auth::ApiKey {
                key,
                run_as_username,
                run_as_password: Some(SecretString::new(password.into())),
            },
            other => other,
        }
    }

    /// Whether this is the OAuth flow
    pub fn is_oauth(&self) -> bool {
        matches!(self, Auth::OAuth { .. })
    }

    /// Build the `PS-Auth` header value (API-key auth only)
    pub(crate) fn ps_auth_header(&self) -> Option<String> {
        match self {
            Auth::ApiKey {
                key,
                run_as_username,
                run_as_password,
            } => {
                let mut value = format!(
                    "{} key={}; runas={}",
                    PS_AUTH_TOKEN_TYPE,
                    key.expose_secret(),
                    run_as_username
                );
                if let Some(pwd) = run_as_password {
                    if !pwd.expose_secret().is_empty() {
                        value.push_str(&format!("; pwd=[{}]", pwd.expose_secret()));
                    }
                }
                Some(value)
            }
            Auth::OAuth { .. } => None,
        }
    }

    /// Value for the `Authorization` header on calls made under `token`
    ///
    /// API-key sessions resend the `PS-Auth` header; OAuth sessions send the
    /// token itself.
    pub(crate) fn authorization_header(&self, token: &AuthenticationResult) -> String {
        self.ps_auth_header()
            .unwrap_or_else(|| token.bearer_header())
    }

    /// Check that the configured credentials are usable
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            Auth::ApiKey {
                key,
                run_as_username,
                ..
            } => {
                if key.expose_secret().trim().is_empty() {
                    return Err("api_key is required".to_string());
                }
                if run_as_username.trim().is_empty() {
                    return Err("run_as_username is required for API key authentication".to_string());
                }
            }
            Auth::OAuth {
                client_id,
                client_secret,
            } => {
                if client_id.trim().is_empty() {
                    return Err("oauth_client_id is required for OAuth authentication".to_string());
                }
                if client_secret.expose_secret().trim().is_empty() {
                    return Err(
                        "oauth_client_secret is required for OAuth authentication".to_string()
                    );
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::ApiKey {
                run_as_username, ..
            } => write!(f, "Auth::ApiKey(****, runas={})", run_as_username),
            Auth::OAuth { client_id, .. } => write!(f, "Auth::OAuth({}, ****)", client_id),
        }
    }
}

/// Result of a successful sign-in
#[derive(Clone)]
pub struct AuthenticationResult {
    /// Access token (the API key itself for PS-Auth sessions)
    pub access_token: SecretString,
    /// Token type, `PS-Auth` or the OAuth token type (usually `Bearer`)
    pub token_type: String,
    /// Seconds until the token expires, counted from `issued_at`
    pub expires_in: u64,
    /// Refresh token, if the OAuth server issued one
    pub refresh_token: Option<SecretString>,
    /// When the token was obtained
    pub issued_at: OffsetDateTime,
}

impl AuthenticationResult {
    pub(crate) fn new(
        access_token: SecretString,
        token_type: impl Into<String>,
        expires_in: u64,
        refresh_token: Option<SecretString>,
    ) -> Self {
        Self {
            access_token,
            token_type: token_type.into(),
            expires_in,
            refresh_token,
            issued_at: OffsetDateTime::now_utc(),
        }
    }

    /// When the token expires
    pub fn expires_at(&self) -> OffsetDateTime {
        self.issued_at + Duration::seconds(self.expires_in as i64)
    }

    /// Whether the token is expired or within the refresh window of expiring
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    pub(crate) fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_SKEW_SECS) >= self.expires_at()
    }

    /// Value for the `Authorization` header on data calls (OAuth sessions)
    pub(crate) fn bearer_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token.expose_secret())
    }
}

impl fmt::Debug for AuthenticationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationResult")
            .field("access_token", &"****")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// OAuth token endpoint response
#[derive(Deserialize)]
pub(crate) struct OAuthTokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_expires_in() -> u64 {
    API_KEY_SESSION_SECS
}

impl From<OAuthTokenResponse> for AuthenticationResult {
    fn from(resp: OAuthTokenResponse) -> Self {
        AuthenticationResult::new(
            SecretString::new(resp.access_token),
            resp.token_type,
            resp.expires_in,
            resp.refresh_token.map(SecretString::new),
        )
    }
}

/// Session token state held by the client
#[derive(Debug, Clone, Default)]
pub(crate) enum TokenState {
    /// No sign-in yet, or signed out
    #[default]
    Unauthenticated,
    /// Signed in
    Active(AuthenticationResult),
}

/// Observable status of the session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Not signed in
    Unauthenticated,
    /// Signed in with a usable token
    Valid,
    /// Signed in, but the token is expired or about to expire
    Expired,
}

impl TokenState {
    pub(crate) fn status(&self) -> SessionStatus {
        match self {
            TokenState::Unauthenticated => SessionStatus::Unauthenticated,
            TokenState::Active(result) if result.is_expired() => SessionStatus::Expired,
            TokenState::Active(_) => SessionStatus::Valid,
        }
    }

    pub(crate) fn current(&self) -> Option<&AuthenticationResult> {
        match self {
            TokenState::Active(result) => Some(result),
            TokenState::Unauthenticated => None,
        }
    }
}
