use crate::{
    face::DEFAULT_MATCH_THRESHOLD,
    token::{DEFAULT_TOKEN_TTL_SECONDS, MAX_TOKEN_TTL_SECONDS},
};
use clap::{builder::ValueParser, Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_TOKEN_TTL: &str = "token-ttl";
pub const ARG_MATCH_THRESHOLD: &str = "match-threshold";

/// Accept only finite, strictly positive distances.
#[must_use]
pub fn validator_threshold() -> ValueParser {
    ValueParser::from(move |raw: &str| -> std::result::Result<f64, String> {
        let threshold = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid match threshold: {raw}"))?;

        if threshold.is_finite() && threshold > 0.0 {
            Ok(threshold)
        } else {
            Err("match threshold must be a finite number greater than zero".to_string())
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("HMAC secret used to sign bearer tokens")
                .long_help(
                    "HMAC secret used to sign bearer tokens. Required unless --vault-url is set, in which case the secret is read from Vault KV.",
                )
                .env("FACEGATE_TOKEN_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL)
                .long(ARG_TOKEN_TTL)
                .help("Bearer token lifetime in seconds (at most one year)")
                .env("FACEGATE_TOKEN_TTL")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_MATCH_THRESHOLD)
                .long(ARG_MATCH_THRESHOLD)
                .help("Maximum Euclidean distance accepted as the same face")
                .env("FACEGATE_MATCH_THRESHOLD")
                .default_value("0.6")
                .value_parser(validator_threshold()),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub token_secret: Option<SecretString>,
    pub token_ttl_seconds: i64,
    pub match_threshold: f64,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            token_secret: matches
                .get_one::<String>(ARG_TOKEN_SECRET)
                .cloned()
                .map(SecretString::from),
            token_ttl_seconds: matches
                .get_one::<i64>(ARG_TOKEN_TTL)
                .copied()
                .unwrap_or(DEFAULT_TOKEN_TTL_SECONDS),
            match_threshold: matches
                .get_one::<f64>(ARG_MATCH_THRESHOLD)
                .copied()
                .unwrap_or(DEFAULT_MATCH_THRESHOLD),
        }
    }
}
