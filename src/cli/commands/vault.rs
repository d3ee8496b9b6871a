use anyhow::Result;
use clap::{Arg, ArgGroup, ArgMatches, Command};

pub const ARG_VAULT_URL: &str = "vault-url";
pub const ARG_VAULT_ROLE_ID: &str = "vault-role-id";
pub const ARG_VAULT_SECRET_ID: &str = "vault-secret-id";
pub const ARG_VAULT_WRAPPED_TOKEN: &str = "vault-wrapped-token";
pub const ARG_VAULT_KV_MOUNT: &str = "vault-kv-mount";
pub const ARG_VAULT_KV_PATH: &str = "vault-kv-path";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VAULT_URL)
                .long(ARG_VAULT_URL)
                .help("Vault approle login URL, example: https://vault.tld:8200/v1/auth/<approle>/login")
                .env("FACEGATE_VAULT_URL"),
        )
        .arg(
            Arg::new(ARG_VAULT_ROLE_ID)
                .long(ARG_VAULT_ROLE_ID)
                .help("Vault role id (required with --vault-url)")
                .env("FACEGATE_VAULT_ROLE_ID"),
        )
        .arg(
            Arg::new(ARG_VAULT_SECRET_ID)
                .long(ARG_VAULT_SECRET_ID)
                .help("Vault secret id (required with --vault-url unless using a wrapped token)")
                .env("FACEGATE_VAULT_SECRET_ID")
                .conflicts_with(ARG_VAULT_WRAPPED_TOKEN),
        )
        .arg(
            Arg::new(ARG_VAULT_WRAPPED_TOKEN)
                .long(ARG_VAULT_WRAPPED_TOKEN)
                .help("Vault wrapped secret id")
                .env("FACEGATE_VAULT_WRAPPED_TOKEN"),
        )
        .arg(
            Arg::new(ARG_VAULT_KV_MOUNT)
                .long(ARG_VAULT_KV_MOUNT)
                .help("Vault KV-v2 mount holding the token secret")
                .env("FACEGATE_VAULT_KV_MOUNT")
                .default_value("secret"),
        )
        .arg(
            Arg::new(ARG_VAULT_KV_PATH)
                .long(ARG_VAULT_KV_PATH)
                .help("Vault KV-v2 path holding the `token_secret` field")
                .env("FACEGATE_VAULT_KV_PATH")
                .default_value("facegate/config"),
        )
        .group(
            ArgGroup::new("vault-auth")
                .args([ARG_VAULT_ROLE_ID, ARG_VAULT_SECRET_ID, ARG_VAULT_WRAPPED_TOKEN])
                .multiple(true),
        )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub url: String,
    pub role_id: String,
    pub secret_id: Option<String>,
    pub wrapped_token: Option<String>,
    pub kv_mount: String,
    pub kv_path: String,
}

impl Options {
    /// Read the Vault options, or `None` when `--vault-url` is absent.
    ///
    /// # Errors
    /// Returns an error if the URL is set but the AppRole credentials are incomplete.
    pub fn parse(matches: &ArgMatches) -> Result<Option<Self>> {
        let Some(url) = matches.get_one::<String>(ARG_VAULT_URL).cloned() else {
            return Ok(None);
        };

        let role_id = matches
            .get_one::<String>(ARG_VAULT_ROLE_ID)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_VAULT_ROLE_ID}"))?;
        let secret_id = matches.get_one::<String>(ARG_VAULT_SECRET_ID).cloned();
        let wrapped_token = matches.get_one::<String>(ARG_VAULT_WRAPPED_TOKEN).cloned();

        if secret_id.is_none() && wrapped_token.is_none() {
            return Err(anyhow::anyhow!(
                "missing required argument: --{ARG_VAULT_SECRET_ID} or --{ARG_VAULT_WRAPPED_TOKEN}"
            ));
        }

        Ok(Some(Self {
            url,
            role_id,
            secret_id,
            wrapped_token,
            kv_mount: matches
                .get_one::<String>(ARG_VAULT_KV_MOUNT)
                .cloned()
                .unwrap_or_else(|| "secret".to_string()),
            kv_path: matches
                .get_one::<String>(ARG_VAULT_KV_PATH)
                .cloned()
                .unwrap_or_else(|| "facegate/config".to_string()),
        }))
    }
}
