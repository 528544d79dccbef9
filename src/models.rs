//! Data models for the Password Safe SDK
//!
//! Response types mirror the API's PascalCase JSON. The API is not consistent
//! about identifier casing (`ManagedAccountID` vs `AccountId`), so the id
//! fields accept both spellings, and ids sent as strings are accepted as well.
//! Fields the SDK does not model are kept in each type's `properties` map.
//!
//! # Key Types
//!
//! * [`ManagedSystem`], [`ManagedAccount`] - read-only inventory records
//! * [`PasswordRequest`] - a check-out request built by the caller
//! * [`PasswordRequestResult`] - a request as known to the server
//! * [`ManagedPassword`] - a checked-out password bound to its request
//! * [`Secret`] - a Secrets Safe entry
//! * [`AccountLookup`] - how to find an account by name

use crate::errors::{Error, Result};
use crate::util::{de_flexible_id, de_null_default, de_opt_timestamp};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Reason attached to password requests when the caller gives none
pub const DEFAULT_REQUEST_REASON: &str = "API Password Request";

/// A system whose accounts Password Safe manages
#[derive(Debug, Clone, Deserialize)]
pub struct ManagedSystem {
    /// Managed system id
    #[serde(
        rename = "ManagedSystemID",
        alias = "ManagedSystemId",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub managed_system_id: u64,
    /// Generic system id (some endpoints fill this instead)
    #[serde(
        rename = "SystemID",
        alias = "SystemId",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub system_id: u64,
    /// System name
    #[serde(rename = "SystemName", default, deserialize_with = "de_null_default")]
    pub system_name: String,
    /// Asset id
    #[serde(
        rename = "AssetID",
        alias = "AssetId",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub asset_id: u64,
    /// Asset name
    #[serde(rename = "AssetName", default)]
    pub asset_name: Option<String>,
    /// Platform id
    #[serde(
        rename = "PlatformID",
        alias = "PlatformId",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub platform_id: u64,
    /// NetBIOS name
    #[serde(rename = "NetBiosName", alias = "NetBIOSName", default)]
    pub netbios_name: Option<String>,
    /// IP address
    #[serde(rename = "IPAddress", alias = "IpAddress", default)]
    pub ip_address: Option<String>,
    /// DNS name
    #[serde(rename = "DnsName", alias = "DNSName", default)]
    pub dns_name: Option<String>,
    /// Domain name
    #[serde(rename = "DomainName", default)]
    pub domain_name: Option<String>,
    /// Forest name
    #[serde(rename = "ForestName", default)]
    pub forest_name: Option<String>,
    /// Fully qualified domain name
    #[serde(rename = "FQDN", alias = "Fqdn", default)]
    pub fqdn: Option<String>,
    /// Connection port
    #[serde(rename = "Port", default)]
    pub port: Option<u32>,
    /// System type
    #[serde(rename = "SystemType", default)]
    pub system_type: Option<String>,
    /// Whether the system is active
    #[serde(rename = "IsActive", default)]
    pub is_active: Option<bool>,
    /// Whether the system is suspended
    #[serde(rename = "IsSuspended", default)]
    pub is_suspended: Option<bool>,
    /// Default release duration in minutes
    #[serde(rename = "ReleaseDuration", default)]
    pub release_duration: Option<u32>,
    /// Maximum release duration in minutes
    #[serde(rename = "MaxReleaseDuration", default)]
    pub max_release_duration: Option<u32>,
    /// Contact email
    #[serde(rename = "ContactEmail", default)]
    pub contact_email: Option<String>,
    /// Description
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    /// Any other fields returned by the API
    #[serde(flatten)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl ManagedSystem {
    pub(crate) fn normalize(mut self) -> Self {
        if self.managed_system_id == 0 && self.system_id > 0 {
            self.managed_system_id = self.system_id;
        }
        self
    }
}

impl std::fmt::Display for ManagedSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (ID: {})", self.system_name, self.managed_system_id)
    }
}

/// An account managed by Password Safe
#[derive(Debug, Clone, Deserialize)]
pub struct ManagedAccount {
    /// Managed account id
    #[serde(
        rename = "ManagedAccountID",
        alias = "ManagedAccountId",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub managed_account_id: u64,
    /// Account id (requestor-facing endpoints fill this instead)
    #[serde(
        rename = "AccountId",
        alias = "AccountID",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub account_id: u64,
    /// Owning managed system id
    #[serde(
        rename = "ManagedSystemID",
        alias = "ManagedSystemId",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub managed_system_id: u64,
    /// Owning system id (requestor-facing endpoints fill this instead)
    #[serde(
        rename = "SystemId",
        alias = "SystemID",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub system_id: u64,
    /// Account name
    #[serde(rename = "AccountName", default, deserialize_with = "de_null_default")]
    pub account_name: String,
    /// Owning system name
    #[serde(rename = "SystemName", default)]
    pub system_name: Option<String>,
    /// Domain of a domain-linked account
    #[serde(rename = "DomainName", default)]
    pub domain_name: Option<String>,
    /// Platform id
    #[serde(
        rename = "PlatformID",
        alias = "PlatformId",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub platform_id: u64,
    /// Database instance name
    #[serde(rename = "InstanceName", default)]
    pub instance_name: Option<String>,
    /// User principal name
    #[serde(rename = "UserPrincipalName", default)]
    pub user_principal_name: Option<String>,
    /// Default release duration in minutes
    #[serde(rename = "DefaultReleaseDuration", default)]
    pub default_release_duration: Option<u32>,
    /// Maximum release duration in minutes
    #[serde(rename = "MaximumReleaseDuration", default)]
    pub maximum_release_duration: Option<u32>,
    /// Last password change
    #[serde(rename = "LastChangeDate", default, deserialize_with = "de_opt_timestamp")]
    pub last_change_date: Option<OffsetDateTime>,
    /// Next scheduled password change
    #[serde(rename = "NextChangeDate", default, deserialize_with = "de_opt_timestamp")]
    pub next_change_date: Option<OffsetDateTime>,
    /// Whether a password change is in progress
    #[serde(rename = "IsChanging", default)]
    pub is_changing: Option<bool>,
    /// Whether the account is information-systems-administrator access only
    #[serde(rename = "IsISAAccess", default)]
    pub is_isa_access: Option<bool>,
    /// Description
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    /// Any other fields returned by the API
    #[serde(flatten)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl ManagedAccount {
    pub(crate) fn normalize(mut self) -> Self {
        if self.managed_account_id == 0 && self.account_id > 0 {
            self.managed_account_id = self.account_id;
        }
        if self.managed_system_id == 0 && self.system_id > 0 {
            self.managed_system_id = self.system_id;
        }
        self
    }
}

impl std::fmt::Display for ManagedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (ID: {}) on {}",
            self.account_name,
            self.managed_account_id,
            self.system_name.as_deref().unwrap_or("?")
        )
    }
}

/// How to find a managed account by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountLookup {
    /// An account local to a managed system
    Local {
        /// Managed system name
        system_name: String,
        /// Account name
        account_name: String,
    },
    /// A domain-linked account
    DomainLinked {
        /// Domain name
        domain_name: String,
        /// Account name
        account_name: String,
    },
}

impl AccountLookup {
    /// Look up a local account on a system
    pub fn local(system_name: impl Into<String>, account_name: impl Into<String>) -> Self {
        AccountLookup::Local {
            system_name: system_name.into(),
            account_name: account_name.into(),
        }
    }

    /// Look up a domain-linked account
    pub fn domain_linked(domain_name: impl Into<String>, account_name: impl Into<String>) -> Self {
        AccountLookup::DomainLinked {
            domain_name: domain_name.into(),
            account_name: account_name.into(),
        }
    }

    /// The account name being looked up
    pub fn account_name(&self) -> &str {
        match self {
            AccountLookup::Local { account_name, .. }
            | AccountLookup::DomainLinked { account_name, .. } => account_name,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.account_name().trim().is_empty() {
            return Err(Error::InvalidArgument(
                "account name cannot be empty".to_string(),
            ));
        }
        match self {
            AccountLookup::Local { system_name, .. } if system_name.trim().is_empty() => Err(
                Error::InvalidArgument("system name is required for local accounts".to_string()),
            ),
            AccountLookup::DomainLinked { domain_name, .. } if domain_name.trim().is_empty() => {
                Err(Error::InvalidArgument(
                    "domain name is required for domain-linked accounts".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// What the server should do when the account already has an active request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictOption {
    /// Reuse the existing request
    #[default]
    Reuse,
    /// Reject the new request with 409
    Fail,
}

/// Kind of access requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AccessType {
    /// Password view
    #[default]
    View,
    /// RDP session
    #[serde(rename = "RDP")]
    Rdp,
    /// SSH session
    #[serde(rename = "SSH")]
    Ssh,
    /// Application session
    App,
}

/// A password check-out request
///
/// # Example
///
/// ```
/// use password_safe_sdk::{ConflictOption, PasswordRequest};
///
/// let request = PasswordRequest::new(12, 50)
///     .with_duration(30)
///     .with_reason("quarterly patching")
///     .with_conflict_option(ConflictOption::Fail);
/// assert_eq!(request.duration_minutes, 30);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PasswordRequest {
    /// Managed system id
    #[serde(rename = "SystemID")]
    pub system_id: u64,
    /// Managed account id
    #[serde(rename = "AccountID")]
    pub account_id: u64,
    /// How long the password stays checked out
    pub duration_minutes: u32,
    /// Why the password is needed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Behavior when a request already exists
    pub conflict_option: ConflictOption,
    /// Kind of access requested
    pub access_type: AccessType,
    /// Ticket system id
    #[serde(rename = "TicketSystemID", skip_serializing_if = "Option::is_none")]
    pub ticket_system_id: Option<u64>,
    /// Ticket number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<String>,
}

impl PasswordRequest {
    /// Create a request for an account with a one-hour duration
    pub fn new(system_id: u64, account_id: u64) -> Self {
        Self {
            system_id,
            account_id,
            duration_minutes: crate::DEFAULT_PASSWORD_DURATION_MINUTES,
            reason: None,
            conflict_option: ConflictOption::default(),
            access_type: AccessType::default(),
            ticket_system_id: None,
            ticket_number: None,
        }
    }

    /// Set the duration in minutes
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the conflict option
    pub fn with_conflict_option(mut self, option: ConflictOption) -> Self {
        self.conflict_option = option;
        self
    }

    /// Attach a change-management ticket
    pub fn with_ticket(mut self, ticket_system_id: u64, ticket_number: impl Into<String>) -> Self {
        self.ticket_system_id = Some(ticket_system_id);
        self.ticket_number = Some(ticket_number.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.system_id == 0 {
            return Err(Error::InvalidArgument("system_id is required".to_string()));
        }
        if self.account_id == 0 {
            return Err(Error::InvalidArgument("account_id is required".to_string()));
        }
        if self.duration_minutes == 0 {
            return Err(Error::InvalidArgument(
                "duration_minutes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// A password request as known to the server
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordRequestResult {
    /// Request id
    #[serde(
        rename = "RequestID",
        alias = "RequestId",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub request_id: u64,
    /// Managed system id
    #[serde(
        rename = "SystemID",
        alias = "SystemId",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub system_id: u64,
    /// Managed account id
    #[serde(
        rename = "AccountID",
        alias = "AccountId",
        default,
        deserialize_with = "de_flexible_id"
    )]
    pub account_id: u64,
    /// System name
    #[serde(rename = "SystemName", default)]
    pub system_name: Option<String>,
    /// Account name
    #[serde(rename = "AccountName", default)]
    pub account_name: Option<String>,
    /// Requested duration in minutes
    #[serde(rename = "DurationMinutes", default)]
    pub duration_minutes: Option<u32>,
    /// When the request was created or released
    #[serde(
        rename = "CreationDate",
        alias = "RequestReleaseDate",
        default,
        deserialize_with = "de_opt_timestamp"
    )]
    pub creation_date: Option<OffsetDateTime>,
    /// When the check-out expires
    #[serde(
        rename = "ExpirationDate",
        alias = "ExpiresDate",
        default,
        deserialize_with = "de_opt_timestamp"
    )]
    pub expiration_date: Option<OffsetDateTime>,
    /// Request status
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    /// Reason given for the request
    #[serde(rename = "Reason", default)]
    pub reason: Option<String>,
    /// Requesting user name
    #[serde(rename = "RequesterName", default)]
    pub requester_name: Option<String>,
    /// Access type
    #[serde(rename = "AccessType", default)]
    pub access_type: Option<String>,
}

impl PasswordRequestResult {
    /// Whether the check-out has expired; unknown expiry counts as expired
    pub fn is_expired(&self) -> bool {
        match self.expiration_date {
            Some(expiration) => OffsetDateTime::now_utc() > expiration,
            None => true,
        }
    }

    /// Map the body of a `POST Requests` response
    ///
    /// The server answers with either the bare request id or the full request
    /// record. With a bare id the expiration is computed from the requested
    /// duration.
    pub(crate) fn from_create_response(body: &str, request: &PasswordRequest) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body.trim()).or_else(|_| {
            // plain-text id
            Ok::<_, Error>(serde_json::Value::String(body.trim().to_string()))
        })?;

        let mut result = match value {
            serde_json::Value::Object(map) => {
                serde_json::from_value::<PasswordRequestResult>(serde_json::Value::Object(map))?
            }
            serde_json::Value::Number(n) => PasswordRequestResult {
                request_id: n.as_u64().ok_or_else(|| {
                    Error::Deserialize(format!("invalid request id: {}", n))
                })?,
                ..Default::default()
            },
            serde_json::Value::String(s) => PasswordRequestResult {
                request_id: s
                    .trim_matches('"')
                    .parse()
                    .map_err(|_| Error::Deserialize(format!("invalid request id: {}", s)))?,
                ..Default::default()
            },
            other => {
                return Err(Error::Deserialize(format!(
                    "unexpected password request response: {}",
                    other
                )))
            }
        };

        if result.request_id == 0 {
            return Err(Error::Deserialize(
                "password request response did not contain a request id".to_string(),
            ));
        }
        if result.system_id == 0 {
            result.system_id = request.system_id;
        }
        if result.account_id == 0 {
            result.account_id = request.account_id;
        }
        if result.duration_minutes.is_none() {
            result.duration_minutes = Some(request.duration_minutes);
        }
        if result.reason.is_none() {
            result.reason = request.reason.clone();
        }
        if result.expiration_date.is_none() {
            let now = OffsetDateTime::now_utc();
            if result.creation_date.is_none() {
                result.creation_date = Some(now);
            }
            result.expiration_date =
                Some(now + Duration::minutes(i64::from(request.duration_minutes)));
        }
        Ok(result)
    }
}

/// A checked-out password
#[derive(Debug, Clone)]
pub struct ManagedPassword {
    /// The password value (protected)
    pub password: SecretString,
    /// Request the password was released under
    pub request_id: u64,
    /// Managed account id, when known
    pub account_id: Option<u64>,
    /// Managed system id, when known
    pub system_id: Option<u64>,
    /// When the check-out expires, when known
    pub expiration_date: Option<OffsetDateTime>,
}

impl ManagedPassword {
    pub(crate) fn from_request(password: SecretString, request: &PasswordRequestResult) -> Self {
        Self {
            password,
            request_id: request.request_id,
            account_id: Some(request.account_id).filter(|id| *id > 0),
            system_id: Some(request.system_id).filter(|id| *id > 0),
            expiration_date: request.expiration_date,
        }
    }

    /// Whether the check-out has expired; unknown expiry counts as expired
    pub fn is_expired(&self) -> bool {
        match self.expiration_date {
            Some(expiration) => OffsetDateTime::now_utc() > expiration,
            None => true,
        }
    }
}

impl std::fmt::Display for ManagedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.account_id {
            Some(account_id) => write!(
                f,
                "Password for account ID: {} (Request ID: {})",
                account_id, self.request_id
            ),
            None => write!(f, "Password (Request ID: {})", self.request_id),
        }
    }
}

/// Extract the password from a `GET Credentials/{id}` body
///
/// The API answers with a JSON string; some versions wrap it in an object with a
/// `Password` field, and proxies occasionally strip the JSON quoting.
pub(crate) fn parse_credential_body(body: &str) -> Result<SecretString> {
    let password = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Object(map)) => map
            .get("Password")
            .or_else(|| map.get("password"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Deserialize("credential response has no Password field".to_string())
            })?,
        // an all-digit password arrives unquoted
        Ok(serde_json::Value::Number(_)) => body.trim().to_string(),
        Ok(other) => {
            return Err(Error::Deserialize(format!(
                "unexpected credential response: {}",
                json_kind(&other)
            )))
        }
        Err(_) => body.trim().trim_matches('"').to_string(),
    };

    if password.is_empty() {
        return Err(Error::Deserialize(
            "credential response contained no password".to_string(),
        ));
    }
    Ok(SecretString::new(password))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Object(_) => "object",
    }
}

/// A Secrets Safe entry
#[derive(Debug, Clone, Deserialize)]
pub struct Secret {
    /// Secret id
    #[serde(rename = "Id", alias = "ID")]
    pub id: Uuid,
    /// Title
    #[serde(rename = "Title", default, deserialize_with = "de_null_default")]
    pub title: String,
    /// Secret type (Credential, Text, File)
    #[serde(rename = "SecretType", default)]
    pub secret_type: Option<String>,
    /// Secret value (protected)
    #[serde(rename = "SecretValue", alias = "Password", alias = "Text", default)]
    pub value: Option<SecretString>,
    /// User name of a credential secret
    #[serde(rename = "Username", alias = "UserName", default)]
    pub username: Option<String>,
    /// Description
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    /// Creation time
    #[serde(
        rename = "CreatedDate",
        alias = "CreatedOn",
        default,
        deserialize_with = "de_opt_timestamp"
    )]
    pub created_date: Option<OffsetDateTime>,
    /// Creator
    #[serde(rename = "CreatedBy", default)]
    pub created_by: Option<String>,
    /// Last modification time
    #[serde(
        rename = "LastModifiedDate",
        alias = "ModifiedOn",
        default,
        deserialize_with = "de_opt_timestamp"
    )]
    pub last_modified_date: Option<OffsetDateTime>,
    /// Last modifier
    #[serde(rename = "LastModifiedBy", alias = "ModifiedBy", default)]
    pub last_modified_by: Option<String>,
    /// Containing folder id
    #[serde(rename = "FolderId", alias = "FolderID", default)]
    pub folder_id: Option<Uuid>,
    /// Containing folder path
    #[serde(rename = "FolderPath", alias = "Folder", default)]
    pub folder_path: Option<String>,
}

impl Secret {
    /// Borrow the secret value, if the API returned one
    pub fn expose_value(&self) -> Option<&str> {
        self.value.as_ref().map(|v| v.expose_secret().as_str())
    }
}

/// A response that is either one record or a list of records
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}
