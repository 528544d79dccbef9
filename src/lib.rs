//! BeyondTrust Password Safe SDK for Rust
//!
//! An async client for the Password Safe REST API: managed systems and
//! accounts, password check-out and check-in, and Secrets Safe retrieval.
//!
//! # Features
//!
//! - Async/await support with tokio runtime
//! - API-key (`PS-Auth`) and OAuth client-credentials sign-in
//! - Automatic session refresh on expiry or 401
//! - Transparent reuse of an account's active password request on 409
//! - Secure value handling: passwords and credentials are [`SecretString`]s
//! - Optional OpenTelemetry metrics (`metrics` feature)
//!
//! # Example
//!
//! ```no_run
//! use password_safe_sdk::{Auth, ClientBuilder};
//! use secrecy::ExposeSecret;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("https://pam.example.com/BeyondTrust/api/public/v3/")
//!         .auth(Auth::api_key("your-api-key", "svc-automation"))
//!         .build()?;
//!
//!     client.authenticate().await?;
//!
//!     let password = client.get_managed_account_password_by_id("50", None).await?;
//!     println!("checked out under request {}", password.request_id);
//!     let _value = password.password.expose_secret();
//!
//!     client.check_in_password(password.request_id, None).await?;
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

#![deny(
    missing_docs,
    missing_debug_implementations,
    unsafe_code,
    unused_results
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod auth;
mod client;
mod config;
mod endpoints;
mod errors;
mod models;
/// Telemetry and observability support
#[cfg(feature = "metrics")]
pub mod telemetry;

#[cfg(not(feature = "metrics"))]
mod telemetry;
mod util;

pub use auth::{
    Auth, AuthenticationResult, SessionStatus, PS_AUTH_TOKEN_TYPE, TOKEN_EXPIRY_SKEW_SECS,
};
pub use client::Client;
pub use config::{
    ClientBuilder, ClientConfig, ENV_API_KEY, ENV_AUTO_REFRESH, ENV_BASE_URL,
    ENV_OAUTH_CLIENT_ID, ENV_OAUTH_CLIENT_SECRET, ENV_PASSWORD_DURATION, ENV_RUN_AS_PASSWORD,
    ENV_RUN_AS_USERNAME, ENV_TIMEOUT_SECS, ENV_USE_OAUTH,
};
pub use errors::{Error, ErrorKind, Result};
pub use models::{
    AccessType, AccountLookup, ConflictOption, ManagedAccount, ManagedPassword, ManagedSystem,
    PasswordRequest, PasswordRequestResult, Secret, DEFAULT_REQUEST_REASON,
};

// Re-export commonly used types
pub use secrecy::SecretString;

/// SDK version, matches Cargo.toml version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default password check-out duration in minutes
pub const DEFAULT_PASSWORD_DURATION_MINUTES: u32 = 60;
