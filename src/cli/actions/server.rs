use crate::{
    api,
    cli::{commands, globals::GlobalArgs},
    face::{FaceAuth, Matcher},
    store::PgEnrollmentStore,
    token::{Credentials, TokenConfig},
    vault,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub token_secret: Option<SecretString>,
    pub token_ttl_seconds: i64,
    pub match_threshold: f64,
    pub vault: Option<commands::vault::Options>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the token secret cannot be resolved, the database is
/// unreachable, the schema cannot be applied, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let secret = resolve_token_secret(args.token_secret, args.vault.as_ref()).await?;

    let credentials =
        Credentials::new(TokenConfig::new(secret).with_ttl_seconds(args.token_ttl_seconds))
            .context("Invalid token configuration")?;

    let matcher = Matcher::new(args.match_threshold);

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&args.dsn)
        .await
        .context("Failed to connect to database")?;

    let store = PgEnrollmentStore::new(pool);
    store
        .migrate()
        .await
        .context("Failed to apply database schema")?;

    info!(
        threshold = matcher.threshold(),
        token_ttl_seconds = credentials.ttl_seconds(),
        "Face authentication configured"
    );

    let auth = Arc::new(FaceAuth::new(Arc::new(store), matcher, credentials));

    api::new(args.port, auth).await
}

async fn resolve_token_secret(
    inline: Option<SecretString>,
    vault_opts: Option<&commands::vault::Options>,
) -> Result<SecretString> {
    if let Some(secret) = inline {
        if vault_opts.is_some() {
            debug!("--token-secret given, not reading the secret from Vault");
        }
        return Ok(secret);
    }

    let opts = vault_opts.ok_or_else(|| anyhow!("Token secret is required"))?;

    let mut globals = GlobalArgs::new(opts.url.clone());

    // If vault wrapped token try to unwrap, otherwise use secret-id.
    let vault_token = if let Some(wrapped) = &opts.wrapped_token {
        let secret_id = vault::unwrap(&globals.vault_url, wrapped).await?;
        vault::approle_login(&globals.vault_url, &secret_id, &opts.role_id).await?
    } else {
        let secret_id = opts
            .secret_id
            .as_deref()
            .ok_or_else(|| anyhow!("Vault secret-id is required"))?;
        vault::approle_login(&globals.vault_url, secret_id, &opts.role_id).await?
    };

    globals.set_token(SecretString::from(vault_token));

    debug!("Global args: {:?}", globals);

    vault::kv::read_token_secret(&globals, &opts.kv_mount, &opts.kv_path)
        .await
        .context("Could not read token secret from Vault")
}
