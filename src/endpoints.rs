//! API endpoint URL construction
//!
//! Paths are relative to the configured base URL, which already carries the
//! API version, e.g. `https://pam.example.com/BeyondTrust/api/public/v3`.

use crate::util::{encode_path, with_query};

/// Endpoint builder
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    /// Create a new endpoints builder
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the full URL for a path
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    // Auth
    /// Session sign-in
    pub fn sign_app_in(&self) -> String {
        self.url("Auth/SignAppin")
    }

    pub fn oauth_token(&self) -> String {
        self.url("Auth/connect/token")
    }

    pub fn sign_out(&self) -> String {
        self.url("Auth/Signout")
    }

    // Managed systems
    pub fn managed_systems(&self, system_id: Option<&str>) -> String {
        match system_id {
            Some(id) => self.url(&format!("ManagedSystems/{}", encode_path(id))),
            None => self.url("ManagedSystems"),
        }
    }

    // Managed accounts
    pub fn managed_accounts(&self, system_id: Option<&str>, account_name: Option<&str>) -> String {
        with_query(
            self.url("ManagedAccounts"),
            &[("systemId", system_id), ("accountName", account_name)],
        )
    }

    pub fn managed_account(&self, account_id: &str) -> String {
        self.url(&format!("ManagedAccounts/{}", encode_path(account_id)))
    }

    pub fn managed_account_by_local_name(&self, system_name: &str, account_name: &str) -> String {
        with_query(
            self.url("ManagedAccounts"),
            &[("systemName", Some(system_name)), ("accountName", Some(account_name))],
        )
    }

    pub fn managed_account_by_domain_name(&self, domain_name: &str, account_name: &str) -> String {
        let qualified = format!("{}\\{}", domain_name, account_name);
        with_query(
            self.url("ManagedAccounts"),
            &[("accountname", Some(qualified.as_str())), ("type", Some("domainlinked"))],
        )
    }

    // Password requests
    pub fn create_request(&self) -> String {
        self.url("Requests")
    }

    pub fn active_requests(&self, account_id: Option<u64>) -> String {
        let account_id = account_id.map(|id| id.to_string());
        with_query(
            self.url("Requests"),
            &[("accountId", account_id.as_deref()), ("state", Some("active"))],
        )
    }

    pub fn check_in(&self, request_id: &str) -> String {
        self.url(&format!("Requests/{}/Checkin", encode_path(request_id)))
    }

    pub fn credentials(&self, request_id: &str) -> String {
        self.url(&format!("Credentials/{}", encode_path(request_id)))
    }

    // Secrets Safe
    pub fn secret(&self, secret_id: &str) -> String {
        self.url(&format!("Secrets-Safe/Secrets/{}", encode_path(secret_id)))
    }

    pub fn secrets_by_title(&self, title: &str) -> String {
        with_query(self.url("Secrets-Safe/Secrets"), &[("title", Some(title))])
    }
}
