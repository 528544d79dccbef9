//! Walk through a Password Safe session: sign in, look around, check a
//! password out and back in, then sign out.
//!
//! Configuration comes from `PASSWORD_SAFE_*` variables (a `.env` file works):
//!
//! ```text
//! PASSWORD_SAFE_BASE_URL=https://your-instance.beyondtrustcloud.com/BeyondTrust/api/public/v3/
//! PASSWORD_SAFE_API_KEY=...
//! PASSWORD_SAFE_RUN_AS_USERNAME=...
//! PASSWORD_SAFE_DEMO_ACCOUNT_ID=50          # optional
//! PASSWORD_SAFE_DEMO_SECRET_TITLE=db-admin  # optional
//! ```

use anyhow::Result;
use password_safe_sdk::ClientBuilder;
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,password_safe_sdk=debug")),
        )
        .init();

    let client = ClientBuilder::from_env()?
        .user_agent_extra("basic-usage-demo")
        .build()?;

    let token = client.authenticate().await?;
    info!(
        token_type = %token.token_type,
        expires_in = token.expires_in,
        "authentication successful"
    );

    let systems = client.get_managed_systems(None).await?;
    info!("found {} managed systems", systems.len());
    for system in systems.iter().take(5) {
        info!("  {}", system);
    }

    let accounts = client.get_managed_accounts(None, None).await?;
    info!("found {} managed accounts", accounts.len());
    for account in accounts.iter().take(5) {
        info!("  {}", account);
    }

    if let Ok(account_id) = std::env::var("PASSWORD_SAFE_DEMO_ACCOUNT_ID") {
        let password = client
            .get_managed_account_password_by_id(&account_id, Some("basic usage demo"))
            .await?;
        let first = password.password.expose_secret().chars().next().unwrap_or('?');
        info!(
            request_id = password.request_id,
            expires = ?password.expiration_date,
            "retrieved password {}*****",
            first
        );

        client
            .check_in_password(password.request_id, Some("basic usage demo completed"))
            .await?;
        info!(request_id = password.request_id, "password checked in");
    }

    if let Ok(title) = std::env::var("PASSWORD_SAFE_DEMO_SECRET_TITLE") {
        match client.get_secret_by_name(&title).await? {
            Some(secret) => info!(id = %secret.id, folder = ?secret.folder_path, "found secret {}", secret.title),
            None => info!("no secret titled {:?}", title),
        }
    }

    client.close().await?;
    info!("signed out");
    Ok(())
}
