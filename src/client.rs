//! Password Safe Client Implementation
//!
//! This module contains the main `Client` struct that maps SDK calls onto the
//! Password Safe REST API.
//!
//! # Architecture
//!
//! The client is designed with the following key components:
//! - **HTTP Layer**: Built on `reqwest`, with a cookie store holding the
//!   session cookie issued by `Auth/SignAppin`
//! - **Session**: the token state sits behind a `tokio` mutex, so concurrent
//!   calls on a shared client never sign in twice
//! - **Refresh**: an expired token, or a 401 on a data call, triggers one
//!   re-authentication when `auto_refresh_token` is enabled
//! - **Check-out protocol**: a 409 on a password request is resolved by
//!   adopting the account's live request instead of creating a new one
//! - **Telemetry**: Optional OpenTelemetry integration for observability
//!
//! # Examples
//!
//! ```no_run
//! use password_safe_sdk::{Auth, ClientBuilder};
//! use secrecy::ExposeSecret;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::new("https://pam.example.com/BeyondTrust/api/public/v3/")
//!     .auth(Auth::api_key("your-api-key", "svc-automation"))
//!     .build()?;
//!
//! client.authenticate().await?;
//! let password = client
//!     .get_managed_account_password_by_id("50", Some("nightly backup"))
//!     .await?;
//! println!("request {} expires {:?}", password.request_id, password.expiration_date);
//! # let _ = password.password.expose_secret();
//! client.check_in_password(password.request_id, None).await?;
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    auth::{
        Auth, AuthenticationResult, OAuthTokenResponse, SessionStatus, TokenState,
        API_KEY_SESSION_SECS, PS_AUTH_TOKEN_TYPE,
    },
    config::ClientConfig,
    endpoints::Endpoints,
    errors::{Error, Result},
    models::{
        parse_credential_body, AccountLookup, ConflictOption, ManagedAccount, ManagedPassword,
        ManagedSystem, OneOrMany, PasswordRequest, PasswordRequestResult, Secret,
        DEFAULT_REQUEST_REASON,
    },
    telemetry::{self, Metrics},
    util::{generate_request_id, header_str},
};

use reqwest::{
    header::AUTHORIZATION, Client as HttpClient, Method, RequestBuilder, Response, StatusCode,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

const USER_AGENT_PREFIX: &str = "password-safe-sdk-rust";

/// Password Safe client
///
/// One client holds one API session. It is not `Clone`; share it behind an
/// `Arc` when several tasks need it. Call [`Client::authenticate`] before any
/// data call and [`Client::close`] (or [`Client::sign_out`]) when done.
pub struct Client {
    config: ClientConfig,
    http: HttpClient,
    endpoints: Endpoints,
    token: Mutex<TokenState>,
    metrics: Arc<Metrics>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url)
            .field("auth", &self.config.auth)
            .field("timeout", &self.config.timeout)
            .field("auto_refresh_token", &self.config.auto_refresh_token)
            .finish()
    }
}

impl Client {
    /// Create a new client with the given configuration
    pub(crate) fn new(config: ClientConfig) -> Result<Self> {
        let user_agent = if let Some(suffix) = &config.user_agent_suffix {
            format!("{}/{} {}", USER_AGENT_PREFIX, crate::VERSION, suffix)
        } else {
            format!("{}/{}", USER_AGENT_PREFIX, crate::VERSION)
        };

        let mut http_builder = HttpClient::builder()
            .user_agent(user_agent)
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .cookie_store(true);

        if !config.allow_insecure_http {
            http_builder = http_builder.https_only(true);
        }

        let http = http_builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let metrics = if config.telemetry_config.enabled {
            telemetry::init_telemetry(config.telemetry_config.clone())
        } else {
            Arc::new(Metrics::new(&config.telemetry_config))
        };

        Ok(Self {
            endpoints: Endpoints::new(&config.base_url),
            http,
            token: Mutex::new(TokenState::default()),
            metrics,
            config,
        })
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current state of the session token
    pub async fn session_status(&self) -> SessionStatus {
        self.token.lock().await.status()
    }

    // Session lifecycle

    /// Sign in and open an API session
    ///
    /// With API-key auth this calls `Auth/SignAppin` with the `PS-Auth` header.
    /// With OAuth it first exchanges the client credentials at
    /// `Auth/connect/token`, then signs in with the bearer token.
    ///
    /// A still-valid token is returned as-is without a network call.
    ///
    /// # Errors
    ///
    /// * `Error::Authentication` for rejected credentials or an unreachable host
    pub async fn authenticate(&self) -> Result<AuthenticationResult> {
        let mut state = self.token.lock().await;
        if let TokenState::Active(current) = &*state {
            if !current.is_expired() {
                trace!("reusing current session token");
                return Ok(current.clone());
            }
        }

        let token = self.sign_in().await?;
        info!(
            token_type = %token.token_type,
            expires_at = %token.expires_at(),
            "authenticated with Password Safe"
        );
        *state = TokenState::Active(token.clone());
        Ok(token)
    }

    /// End the API session
    ///
    /// Does nothing when no session is open. Local token state is cleared even
    /// when the server call fails; that failure is still returned.
    pub async fn sign_out(&self) -> Result<()> {
        let mut state = self.token.lock().await;
        let current = match std::mem::take(&mut *state) {
            TokenState::Active(current) => current,
            TokenState::Unauthenticated => {
                trace!("sign_out called without an active session");
                return Ok(());
            }
        };

        let authorization = self.config.auth.authorization_header(&current);
        let request = self
            .build_request(Method::POST, &self.endpoints.sign_out())
            .header(AUTHORIZATION, authorization);
        let response = self.dispatch("sign_out", request).await?;
        if !response.status().is_success() {
            return Err(self.parse_error_response(response).await);
        }

        info!("signed out of Password Safe");
        Ok(())
    }

    /// Sign out (if a session is open) and release the client
    pub async fn close(self) -> Result<()> {
        self.sign_out().await
    }

    // Managed systems / accounts

    /// List managed systems, or fetch one by id
    ///
    /// A single-object response becomes a one-element list; an unknown id
    /// yields an empty list.
    pub async fn get_managed_systems(&self, system_id: Option<&str>) -> Result<Vec<ManagedSystem>> {
        let system_id = system_id
            .map(|id| require_non_empty("system_id", id))
            .transpose()?;
        let url = self.endpoints.managed_systems(system_id);
        let systems: Vec<ManagedSystem> = self.get_collection("get_managed_systems", &url).await?;
        debug!(count = systems.len(), "fetched managed systems");
        Ok(systems.into_iter().map(ManagedSystem::normalize).collect())
    }

    /// List managed accounts
    ///
    /// * no filter: every account visible to the caller
    /// * `system_id`: the accounts of that system
    /// * `system_id` and `account_name`: at most one account
    ///
    /// No match is an empty list, never an error.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidArgument` when `account_name` is given without `system_id`
    pub async fn get_managed_accounts(
        &self,
        system_id: Option<&str>,
        account_name: Option<&str>,
    ) -> Result<Vec<ManagedAccount>> {
        let system_id = system_id
            .map(|id| require_non_empty("system_id", id))
            .transpose()?;
        let account_name = account_name
            .map(|name| require_non_empty("account_name", name))
            .transpose()?;
        if account_name.is_some() && system_id.is_none() {
            return Err(Error::InvalidArgument(
                "account_name requires system_id".to_string(),
            ));
        }

        let url = self.endpoints.managed_accounts(system_id, account_name);
        let accounts: Vec<ManagedAccount> =
            self.get_collection("get_managed_accounts", &url).await?;
        let accounts = accounts.into_iter().map(ManagedAccount::normalize);

        Ok(match account_name {
            Some(name) => accounts
                .filter(|a| account_name_matches(&a.account_name, name))
                .take(1)
                .collect(),
            None => accounts.collect(),
        })
    }

    /// Fetch a managed account by id; `None` when it does not exist
    pub async fn get_managed_account_by_id(&self, account_id: &str) -> Result<Option<ManagedAccount>> {
        let account_id = require_non_empty("account_id", account_id)?;
        let url = self.endpoints.managed_account(account_id);
        let accounts: Vec<ManagedAccount> =
            self.get_collection("get_managed_account_by_id", &url).await?;
        Ok(accounts.into_iter().next().map(ManagedAccount::normalize))
    }

    /// Find a managed account by name; `None` when nothing matches
    pub async fn get_managed_account_by_name(
        &self,
        lookup: &AccountLookup,
    ) -> Result<Option<ManagedAccount>> {
        lookup.validate()?;
        let url = match lookup {
            AccountLookup::Local {
                system_name,
                account_name,
            } => self
                .endpoints
                .managed_account_by_local_name(system_name.trim(), account_name.trim()),
            AccountLookup::DomainLinked {
                domain_name,
                account_name,
            } => self
                .endpoints
                .managed_account_by_domain_name(domain_name.trim(), account_name.trim()),
        };

        let accounts: Vec<ManagedAccount> =
            self.get_collection("get_managed_account_by_name", &url).await?;
        let wanted = lookup.account_name().trim();
        Ok(accounts
            .into_iter()
            .map(ManagedAccount::normalize)
            .find(|a| account_name_matches(&a.account_name, wanted)))
    }

    // Password check-out

    /// Check out the password of an account identified by id
    ///
    /// Resolves the account, submits a password request with the configured
    /// default duration and `reason` (default `"API Password Request"`), then
    /// fetches the credential.
    ///
    /// When the account already has an active request the server answers 409.
    /// The client then lists the account's active requests and returns the
    /// password of the live one instead, so no duplicate request is created.
    ///
    /// # Errors
    ///
    /// * `Error::Api` with status 404 if the account does not exist
    /// * `Error::Api` with status 409 if the request conflicts and no live
    ///   request can be found
    /// * `Error::Api` for any other rejected call
    /// * `Error::Authentication` if the session is missing or cannot be refreshed
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use password_safe_sdk::Client;
    /// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
    /// let password = client.get_managed_account_password_by_id("50", None).await?;
    /// assert!(!password.is_expired());
    /// client.check_in_password(password.request_id, Some("done")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_managed_account_password_by_id(
        &self,
        account_id: &str,
        reason: Option<&str>,
    ) -> Result<ManagedPassword> {
        let account = self
            .get_managed_account_by_id(account_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("managed account {} not found", account_id.trim())))?;
        self.check_out(&account, reason).await
    }

    /// Check out the password of an account identified by name
    ///
    /// Same protocol as [`Client::get_managed_account_password_by_id`].
    pub async fn get_managed_account_password_by_name(
        &self,
        lookup: &AccountLookup,
        reason: Option<&str>,
    ) -> Result<ManagedPassword> {
        let account = self
            .get_managed_account_by_name(lookup)
            .await?
            .ok_or_else(|| {
                Error::not_found(format!(
                    "managed account {} not found",
                    lookup.account_name().trim()
                ))
            })?;
        self.check_out(&account, reason).await
    }

    /// Fetch the password of an existing request
    ///
    /// Skips request creation. Account, system and expiration are filled in
    /// from the active request list when the server still lists the request.
    pub async fn get_managed_account_password_by_request_id(
        &self,
        request_id: u64,
        reason: Option<&str>,
    ) -> Result<ManagedPassword> {
        require_request_id(request_id)?;
        if let Some(reason) = reason {
            debug!(request_id, reason, "retrieving password for existing request");
        }

        let password = self.fetch_credential(request_id).await?;

        let known = match self.get_active_password_requests(None).await {
            Ok(active) => active.into_iter().find(|r| r.request_id == request_id),
            Err(e) => {
                debug!(request_id, error = %e, "could not look up request details");
                None
            }
        };

        Ok(match known {
            Some(request) => ManagedPassword::from_request(password, &request),
            None => ManagedPassword {
                password,
                request_id,
                account_id: None,
                system_id: None,
                expiration_date: None,
            },
        })
    }

    /// Release a checked-out password
    ///
    /// A second check-in of the same request is rejected by the server and
    /// surfaces as `Error::Api`.
    pub async fn check_in_password(&self, request_id: u64, reason: Option<&str>) -> Result<()> {
        require_request_id(request_id)?;
        let body = match reason {
            Some(reason) => serde_json::json!({ "Reason": reason }),
            None => serde_json::json!({}),
        };
        let request = self
            .build_request(Method::PUT, &self.endpoints.check_in(&request_id.to_string()))
            .json(&body);

        let response = self.execute("check_in_password", request).await?;
        let _ = self.ensure_success(response).await?;

        info!(request_id, "password checked in");
        Ok(())
    }

    /// Submit a password request as-is
    ///
    /// The server may answer with the bare request id; the expiration is then
    /// computed from the requested duration. A 409 is returned to the caller
    /// unchanged.
    pub async fn create_password_request(
        &self,
        request: &PasswordRequest,
    ) -> Result<PasswordRequestResult> {
        request.validate()?;
        let http_request = self
            .build_request(Method::POST, &self.endpoints.create_request())
            .json(request);

        let response = self.execute("create_password_request", http_request).await?;
        let response = self.ensure_success(response).await?;
        let body = response.text().await?;
        let result = PasswordRequestResult::from_create_response(&body, request)?;

        info!(
            request_id = result.request_id,
            system_id = result.system_id,
            account_id = result.account_id,
            "password request created"
        );
        Ok(result)
    }

    /// List the caller's active password requests, optionally for one account
    pub async fn get_active_password_requests(
        &self,
        account_id: Option<u64>,
    ) -> Result<Vec<PasswordRequestResult>> {
        let url = self.endpoints.active_requests(account_id);
        self.get_collection("get_active_password_requests", &url)
            .await
    }

    // Secrets Safe

    /// Fetch a secret by id; `None` when it does not exist
    pub async fn get_secret_by_id(&self, secret_id: &str) -> Result<Option<Secret>> {
        let secret_id = uuid::Uuid::parse_str(secret_id.trim()).map_err(|e| {
            Error::InvalidArgument(format!("secret id {:?} is not a UUID: {}", secret_id, e))
        })?;
        let url = self.endpoints.secret(&secret_id.to_string());
        let secrets: Vec<Secret> = self.get_collection("get_secret_by_id", &url).await?;
        Ok(secrets.into_iter().next())
    }

    /// Fetch a secret by title
    ///
    /// Only exact title matches count. When several secrets share the title
    /// the first one in server order is returned and a warning is logged.
    pub async fn get_secret_by_name(&self, title: &str) -> Result<Option<Secret>> {
        let title = require_non_empty("title", title)?;
        let url = self.endpoints.secrets_by_title(title);
        let secrets: Vec<Secret> = self.get_collection("get_secret_by_name", &url).await?;

        let mut matches = secrets.into_iter().filter(|s| s.title == title);
        let first = matches.next();
        let others = matches.count();
        if let (Some(secret), true) = (&first, others > 0) {
            warn!(
                title,
                matches = others + 1,
                secret_id = %secret.id,
                "secret title is ambiguous; using the first match"
            );
        }
        Ok(first)
    }

    // Check-out protocol

    async fn check_out(
        &self,
        account: &ManagedAccount,
        reason: Option<&str>,
    ) -> Result<ManagedPassword> {
        let request = PasswordRequest::new(account.managed_system_id, account.managed_account_id)
            .with_duration(self.config.default_password_duration)
            .with_reason(reason.unwrap_or(DEFAULT_REQUEST_REASON));

        let mut granted = match self.create_password_request(&request).await {
            Ok(created) => created,
            Err(err) if err.is_conflict() && request.conflict_option == ConflictOption::Reuse => {
                debug!(
                    account_id = request.account_id,
                    "password request conflicts with an active request"
                );
                self.adopt_active_request(request.account_id)
                    .await?
                    .ok_or(err)?
            }
            Err(err) => return Err(err),
        };
        if granted.system_id == 0 {
            granted.system_id = request.system_id;
        }

        let password = self.fetch_credential(granted.request_id).await?;
        Ok(ManagedPassword::from_request(password, &granted))
    }

    async fn adopt_active_request(&self, account_id: u64) -> Result<Option<PasswordRequestResult>> {
        let active = self.get_active_password_requests(Some(account_id)).await?;
        let adopted = select_live_request(active, account_id, OffsetDateTime::now_utc());
        if let Some(request) = &adopted {
            warn!(
                request_id = request.request_id,
                account_id,
                "password request already active; reusing it"
            );
            self.metrics.record_conflict_adoption();
        }
        Ok(adopted)
    }

    async fn fetch_credential(&self, request_id: u64) -> Result<SecretString> {
        let url = self.endpoints.credentials(&request_id.to_string());
        let response = self
            .execute("get_credentials", self.build_request(Method::GET, &url))
            .await?;
        let response = self.ensure_success(response).await?;
        let body = response.text().await?;
        parse_credential_body(&body)
    }

    // Helper methods

    /// Build a request with common headers
    fn build_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("X-Request-ID", generate_request_id())
    }

    async fn sign_in(&self) -> Result<AuthenticationResult> {
        let token = match &self.config.auth {
            Auth::ApiKey { key, .. } => AuthenticationResult::new(
                key.clone(),
                PS_AUTH_TOKEN_TYPE,
                API_KEY_SESSION_SECS,
                None,
            ),
            Auth::OAuth {
                client_id,
                client_secret,
            } => self.request_oauth_token(client_id, client_secret).await?,
        };

        let authorization = self.config.auth.authorization_header(&token);
        let request = self
            .build_request(Method::POST, &self.endpoints.sign_app_in())
            .header(AUTHORIZATION, authorization);
        let response = self
            .dispatch("sign_in", request)
            .await
            .map_err(|e| e.into_authentication("sign-in failed"))?;
        if !response.status().is_success() {
            return Err(self
                .parse_error_response(response)
                .await
                .into_authentication("sign-in failed"));
        }

        debug!(token_type = %token.token_type, expires_in = token.expires_in, "signed in");
        Ok(token)
    }

    async fn request_oauth_token(
        &self,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<AuthenticationResult> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret.expose_secret().as_str()),
        ];
        let request = self
            .build_request(Method::POST, &self.endpoints.oauth_token())
            .form(&form);

        let response = self
            .dispatch("oauth_token", request)
            .await
            .map_err(|e| e.into_authentication("token request failed"))?;
        if !response.status().is_success() {
            return Err(self
                .parse_error_response(response)
                .await
                .into_authentication("token request failed"));
        }

        let token: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| Error::from(e).into_authentication("invalid token response"))?;
        Ok(token.into())
    }

    /// Authorization header for a data call, refreshing an expired token first
    async fn authorization(&self) -> Result<String> {
        let mut state = self.token.lock().await;
        match state.status() {
            SessionStatus::Valid => {}
            SessionStatus::Unauthenticated => {
                return Err(Error::authentication(
                    "not authenticated; call authenticate() first",
                    None,
                ))
            }
            SessionStatus::Expired if self.config.auto_refresh_token => {
                debug!("session token expired, re-authenticating");
                let token = self.sign_in().await?;
                self.metrics.record_token_refresh("expired");
                *state = TokenState::Active(token);
            }
            SessionStatus::Expired => {
                return Err(Error::authentication("session token expired", None));
            }
        }

        state
            .current()
            .map(|token| self.config.auth.authorization_header(token))
            .ok_or_else(|| Error::authentication("not authenticated", None))
    }

    /// Re-authenticate after a 401, unless another caller already did
    async fn refresh_after_unauthorized(&self, rejected: &str) -> Result<String> {
        let mut state = self.token.lock().await;
        match &*state {
            TokenState::Active(current) => {
                let header = self.config.auth.authorization_header(current);
                if header != rejected && !current.is_expired() {
                    return Ok(header);
                }
            }
            // signed out while the request was in flight
            TokenState::Unauthenticated => {
                return Err(Error::authentication("not authenticated", None));
            }
        }

        let token = self.sign_in().await?;
        self.metrics.record_token_refresh("unauthorized");
        let header = self.config.auth.authorization_header(&token);
        *state = TokenState::Active(token);
        Ok(header)
    }

    /// Execute an authenticated request, refreshing the session once on 401
    ///
    /// Non-2xx responses other than 401 are returned to the caller untouched.
    async fn execute(&self, operation: &'static str, request: RequestBuilder) -> Result<Response> {
        let authorization = self.authorization().await?;
        let first = request
            .try_clone()
            .ok_or_else(|| Error::Other("Request cannot be cloned".to_string()))?
            .header(AUTHORIZATION, authorization.as_str());

        let response = self.dispatch(operation, first).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if !self.config.auto_refresh_token {
            return Err(self
                .parse_error_response(response)
                .await
                .into_authentication("request rejected"));
        }

        warn!(operation, "Got 401, attempting token refresh");
        let authorization = self.refresh_after_unauthorized(&authorization).await?;
        let response = self
            .dispatch(operation, request.header(AUTHORIZATION, authorization))
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(self
                .parse_error_response(response)
                .await
                .into_authentication("request rejected after token refresh"));
        }
        Ok(response)
    }

    /// Send a request and record its outcome
    async fn dispatch(&self, operation: &'static str, request: RequestBuilder) -> Result<Response> {
        let request = request
            .build()
            .map_err(|e| Error::Other(format!("Failed to build request: {}", e)))?;
        trace!(
            operation,
            method = %request.method(),
            path = request.url().path(),
            "sending request"
        );

        let start = Instant::now();
        match self.http.execute(request).await {
            Ok(response) => {
                let status = response.status().as_u16();
                self.metrics
                    .record_request(operation, status, start.elapsed().as_secs_f64());
                trace!(operation, status, "received response");
                Ok(response)
            }
            Err(e) => {
                self.metrics.record_transport_error(operation);
                debug!(operation, error = %e, "request failed");
                Err(Error::from(e))
            }
        }
    }

    async fn ensure_success(&self, response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(self.parse_error_response(response).await)
        }
    }

    /// GET a list endpoint; 404 and an empty body mean no records
    async fn get_collection<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
    ) -> Result<Vec<T>> {
        let response = self
            .execute(operation, self.build_request(Method::GET, url))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(operation, "no records (404)");
            return Ok(Vec::new());
        }

        let response = self.ensure_success(response).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str::<OneOrMany<T>>(&body)?.into_vec())
    }

    /// Parse error response from server
    async fn parse_error_response(&self, response: Response) -> Error {
        let status = response.status().as_u16();
        let request_id = header_str(response.headers(), "x-request-id");
        let body = response.text().await.unwrap_or_default();
        Error::from_response(status, body, request_id)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let TokenState::Active(_) = self.token.get_mut() {
            warn!(
                base_url = %self.config.base_url,
                "client dropped with an active session; call close() or sign_out() to end it"
            );
        }
    }
}

/// Pick the request to adopt after a 409
///
/// Candidates belong to the account (or do not say which account they belong
/// to) and have not expired; a request without an expiration counts as live.
/// The latest expiration wins.
fn select_live_request(
    requests: Vec<PasswordRequestResult>,
    account_id: u64,
    now: OffsetDateTime,
) -> Option<PasswordRequestResult> {
    requests
        .into_iter()
        .filter(|r| r.request_id > 0)
        .filter(|r| r.account_id == account_id || r.account_id == 0)
        .filter(|r| r.expiration_date.map_or(true, |expires| expires > now))
        .max_by_key(|r| r.expiration_date)
        .map(|mut r| {
            r.account_id = account_id;
            r
        })
}

fn account_name_matches(candidate: &str, wanted: &str) -> bool {
    // domain-linked accounts may come back as DOMAIN\name
    let short = candidate.rsplit('\\').next().unwrap_or(candidate);
    candidate.eq_ignore_ascii_case(wanted) || short.eq_ignore_ascii_case(wanted)
}

fn require_non_empty<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::InvalidArgument(format!("{} cannot be empty", name)))
    } else {
        Ok(value)
    }
}

fn require_request_id(request_id: u64) -> Result<()> {
    if request_id == 0 {
        Err(Error::InvalidArgument("request_id is required".to_string()))
    } else {
        Ok(())
    }
}
