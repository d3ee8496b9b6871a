//! # Facegate
//!
//! Passwordless authentication by face descriptor. A client submits a
//! fixed-length vector of numbers describing a face; `facegate` either enrolls
//! it as a new identity or resolves it to the closest enrolled identity, and
//! answers with a signed, expiring bearer token.
//!
//! ## Matching
//!
//! Login is a linear nearest-neighbour scan by Euclidean distance over every
//! enrollment. The closest candidate wins when its distance is within the
//! configured threshold (default `0.6`); ties keep the first candidate seen.
//! Descriptors of a different length are skipped, never compared.
//!
//! ## Enrollment
//!
//! A descriptor that exactly equals an existing enrollment is refused. The
//! database enforces the same rule through a unique fingerprint, so two
//! concurrent registrations of one face cannot both succeed.
//!
//! ## Tokens
//!
//! Tokens are HS256 JWTs carrying the identity and an expiry. They are
//! stateless: there is no revocation or refresh.

pub mod api;
pub mod cli;
pub mod error;
pub mod face;
pub mod store;
pub mod token;
pub mod vault;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // non-git build
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
