//! Tests for building a client from `PASSWORD_SAFE_*` environment variables

use password_safe_sdk::{
    ClientBuilder, Error, ENV_API_KEY, ENV_AUTO_REFRESH, ENV_BASE_URL, ENV_OAUTH_CLIENT_ID,
    ENV_OAUTH_CLIENT_SECRET, ENV_PASSWORD_DURATION, ENV_RUN_AS_PASSWORD, ENV_RUN_AS_USERNAME,
    ENV_TIMEOUT_SECS, ENV_USE_OAUTH,
};
use serial_test::serial;
use std::time::Duration;

const ALL_VARS: &[&str] = &[
    ENV_BASE_URL,
    ENV_API_KEY,
    ENV_RUN_AS_USERNAME,
    ENV_RUN_AS_PASSWORD,
    ENV_USE_OAUTH,
    ENV_OAUTH_CLIENT_ID,
    ENV_OAUTH_CLIENT_SECRET,
    ENV_TIMEOUT_SECS,
    ENV_PASSWORD_DURATION,
    ENV_AUTO_REFRESH,
];

fn clear_env() {
    for var in ALL_VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_api_key() {
    clear_env();
    std::env::set_var(ENV_BASE_URL, "https://pam.example.com/BeyondTrust/api/public/v3/");
    std::env::set_var(ENV_API_KEY, "env-key");
    std::env::set_var(ENV_RUN_AS_USERNAME, "svc-env");
    std::env::set_var(ENV_RUN_AS_PASSWORD, "env-pass");
    std::env::set_var(ENV_TIMEOUT_SECS, "12");
    std::env::set_var(ENV_PASSWORD_DURATION, "15");
    std::env::set_var(ENV_AUTO_REFRESH, "false");

    let client = ClientBuilder::from_env().unwrap().build().unwrap();
    let config = client.config();
    assert_eq!(config.base_url, "https://pam.example.com/BeyondTrust/api/public/v3");
    assert!(!config.auth.is_oauth());
    assert_eq!(format!("{:?}", config.auth), "Auth::ApiKey(****, runas=svc-env)");
    assert_eq!(config.timeout, Duration::from_secs(12));
    assert_eq!(config.default_password_duration, 15);
    assert!(!config.auto_refresh_token);
    clear_env();
}

#[test]
#[serial]
fn test_from_env_oauth() {
    clear_env();
    std::env::set_var(ENV_BASE_URL, "https://pam.example.com/BeyondTrust/api/public/v3");
    std::env::set_var(ENV_USE_OAUTH, "true");
    std::env::set_var(ENV_OAUTH_CLIENT_ID, "client-1");
    std::env::set_var(ENV_OAUTH_CLIENT_SECRET, "secret-1");

    let client = ClientBuilder::from_env().unwrap().build().unwrap();
    let config = client.config();
    assert!(config.auth.is_oauth());
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.default_password_duration, 60);
    assert!(config.auto_refresh_token);
    clear_env();
}

#[test]
#[serial]
fn test_from_env_requires_base_url() {
    clear_env();
    std::env::set_var(ENV_API_KEY, "env-key");

    let err = ClientBuilder::from_env().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    clear_env();
}

#[test]
#[serial]
fn test_from_env_missing_credentials_fail_at_build() {
    clear_env();
    std::env::set_var(ENV_BASE_URL, "https://pam.example.com/BeyondTrust/api/public/v3");
    std::env::set_var(ENV_USE_OAUTH, "yes");
    std::env::set_var(ENV_OAUTH_CLIENT_ID, "client-1");

    let err = ClientBuilder::from_env().unwrap().build().unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("oauth_client_secret")));
    clear_env();
}

#[test]
#[serial]
fn test_from_env_rejects_bad_numbers() {
    clear_env();
    std::env::set_var(ENV_BASE_URL, "https://pam.example.com/BeyondTrust/api/public/v3");
    std::env::set_var(ENV_API_KEY, "env-key");
    std::env::set_var(ENV_RUN_AS_USERNAME, "svc-env");
    std::env::set_var(ENV_TIMEOUT_SECS, "soon");

    let err = ClientBuilder::from_env().unwrap_err();
    assert!(err.to_string().contains(ENV_TIMEOUT_SECS));

    std::env::set_var(ENV_TIMEOUT_SECS, "10");
    std::env::set_var(ENV_AUTO_REFRESH, "maybe");
    let err = ClientBuilder::from_env().unwrap_err();
    assert!(err.to_string().contains(ENV_AUTO_REFRESH));
    clear_env();
}
