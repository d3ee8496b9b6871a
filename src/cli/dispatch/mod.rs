//! Map validated command-line arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, vault};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    crate::cli::commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let auth_opts = auth::Options::parse(matches);
    let vault_opts = vault::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        token_secret: auth_opts.token_secret,
        token_ttl_seconds: auth_opts.token_ttl_seconds,
        match_threshold: auth_opts.match_threshold,
        vault: vault_opts,
    }))
}
