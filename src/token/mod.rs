//! Bearer credentials: signed, expiring identity tokens.
//!
//! Tokens are stateless. Nothing is stored server-side, so expiry is the only
//! way a credential stops working.

mod error;
mod jwt;

pub use error::Error;
pub use jwt::{sign_hs256, verify_hs256, Claims, TokenHeader};

use axum::http::{header::AUTHORIZATION, HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;
use uuid::Uuid;

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Fallback secret shipped by earlier deployments. Refused outright.
pub const LEGACY_DEFAULT_SECRET: &str = "SECRET123";

const RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct TokenConfig {
    secret: SecretString,
    ttl_seconds: i64,
}

impl TokenConfig {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }
}

/// A freshly minted credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Issues and verifies bearer tokens with a process-wide HMAC secret.
#[derive(Clone, Debug)]
pub struct Credentials {
    config: TokenConfig,
}

impl Credentials {
    /// # Errors
    /// Returns [`Error::InsecureSecret`] for an empty secret, the legacy
    /// default secret, or a TTL outside `1..=MAX_TOKEN_TTL_SECONDS`.
    pub fn new(config: TokenConfig) -> Result<Self, Error> {
        let secret = config.secret.expose_secret();
        if secret.is_empty() {
            return Err(Error::InsecureSecret("secret is empty"));
        }
        if secret == LEGACY_DEFAULT_SECRET {
            return Err(Error::InsecureSecret("secret is the well-known default"));
        }
        if config.ttl_seconds <= 0 {
            return Err(Error::InsecureSecret("token ttl must be positive"));
        }
        if config.ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(Error::InsecureSecret("token ttl exceeds one year"));
        }
        if secret.len() < RECOMMENDED_SECRET_LEN {
            warn!(
                "Token secret is shorter than {} bytes; use a longer random value",
                RECOMMENDED_SECRET_LEN
            );
        }

        Ok(Self { config })
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.config.ttl_seconds
    }

    /// Mint a token for `identity`, valid until `now + ttl`.
    ///
    /// # Errors
    /// Returns [`Error::ExpiryOverflow`] if `now + ttl` does not fit, or an
    /// error if signing fails.
    pub fn issue(&self, identity: Uuid, now_unix_seconds: i64) -> Result<IssuedToken, Error> {
        let exp = now_unix_seconds
            .checked_add(self.config.ttl_seconds)
            .ok_or(Error::ExpiryOverflow)?;
        let claims = Claims {
            id: identity.to_string(),
            iat: now_unix_seconds,
            exp,
        };
        let token = sign_hs256(self.config.secret.expose_secret().as_bytes(), &claims)?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Check a presented token and recover its identity.
    ///
    /// # Errors
    /// Returns the specific failure kind; callers must not reveal it to clients.
    pub fn verify(&self, token: &str, now_unix_seconds: i64) -> Result<Uuid, Error> {
        let claims = verify_hs256(
            token,
            self.config.secret.expose_secret().as_bytes(),
            now_unix_seconds,
        )?;
        Uuid::parse_str(&claims.id).map_err(|_| Error::InvalidIdentity)
    }

    /// Verify the `Authorization: Bearer <token>` header of a request.
    ///
    /// # Errors
    /// Returns [`Error::Missing`] when no bearer token is present, otherwise
    /// the failure from [`Credentials::verify`].
    pub fn verify_headers(&self, headers: &HeaderMap, now_unix_seconds: i64) -> Result<Uuid, Error> {
        let token = extract_bearer_token(headers).ok_or(Error::Missing)?;
        self.verify(token, now_unix_seconds)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
#[must_use]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Seconds since the Unix epoch, saturating at zero for clocks before 1970.
#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use base64ct::{Base64UrlUnpadded, Encoding};

    const SECRET: &str = "a-long-enough-test-secret-for-hs256-signing";
    const NOW: i64 = 1_700_000_000;

    fn credentials() -> Credentials {
        Credentials::new(TokenConfig::new(SecretString::from(SECRET.to_string()))).unwrap()
    }

    #[test]
    fn issue_then_verify_returns_identity() {
        let credentials = credentials();
        let identity = Uuid::now_v7();

        let issued = credentials.issue(identity, NOW).unwrap();

        assert_eq!(issued.expires_at, NOW + DEFAULT_TOKEN_TTL_SECONDS);
        assert_eq!(credentials.verify(&issued.token, NOW).unwrap(), identity);
    }

    #[test]
    fn flipped_signature_byte_is_invalid_signature() {
        let credentials = credentials();
        let issued = credentials.issue(Uuid::now_v7(), NOW).unwrap();

        let (signing_input, signature_b64) = issued.token.rsplit_once('.').unwrap();
        let mut signature = Base64UrlUnpadded::decode_vec(signature_b64).unwrap();
        signature[0] ^= 0x01;
        let tampered = format!(
            "{signing_input}.{}",
            Base64UrlUnpadded::encode_string(&signature)
        );

        assert!(matches!(
            credentials.verify(&tampered, NOW).unwrap_err(),
            Error::InvalidSignature
        ));
    }

    #[test]
    fn token_past_seven_days_is_expired() {
        let credentials = credentials();
        let issued = credentials.issue(Uuid::now_v7(), NOW).unwrap();

        let just_before = NOW + DEFAULT_TOKEN_TTL_SECONDS - 1;
        assert!(credentials.verify(&issued.token, just_before).is_ok());

        let after = NOW + DEFAULT_TOKEN_TTL_SECONDS + 1;
        assert!(matches!(
            credentials.verify(&issued.token, after).unwrap_err(),
            Error::Expired
        ));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = Credentials::new(TokenConfig::new(SecretString::from(
            "some-other-secret-with-plenty-of-bytes".to_string(),
        )))
        .unwrap();
        let issued = other.issue(Uuid::now_v7(), NOW).unwrap();

        assert!(matches!(
            credentials().verify(&issued.token, NOW).unwrap_err(),
            Error::InvalidSignature
        ));
    }

    #[test]
    fn non_uuid_identity_is_rejected() {
        let token = sign_hs256(
            SECRET.as_bytes(),
            &Claims {
                id: "not-a-uuid".to_string(),
                iat: NOW,
                exp: NOW + 60,
            },
        )
        .unwrap();

        assert!(matches!(
            credentials().verify(&token, NOW).unwrap_err(),
            Error::InvalidIdentity
        ));
    }

    #[test]
    fn custom_ttl_is_applied() {
        let credentials = Credentials::new(
            TokenConfig::new(SecretString::from(SECRET.to_string())).with_ttl_seconds(60),
        )
        .unwrap();
        let issued = credentials.issue(Uuid::now_v7(), NOW).unwrap();
        assert_eq!(issued.expires_at, NOW + 60);
    }

    #[test]
    fn insecure_secrets_are_refused() {
        for secret in ["", LEGACY_DEFAULT_SECRET] {
            let result = Credentials::new(TokenConfig::new(SecretString::from(secret.to_string())));
            assert!(matches!(result, Err(Error::InsecureSecret(_))));
        }

        let result = Credentials::new(
            TokenConfig::new(SecretString::from(SECRET.to_string())).with_ttl_seconds(0),
        );
        assert!(matches!(result, Err(Error::InsecureSecret(_))));
    }

    #[test]
    fn oversized_ttl_is_refused() {
        for ttl in [MAX_TOKEN_TTL_SECONDS + 1, i64::MAX] {
            let result = Credentials::new(
                TokenConfig::new(SecretString::from(SECRET.to_string())).with_ttl_seconds(ttl),
            );
            assert!(matches!(result, Err(Error::InsecureSecret(_))));
        }

        let longest = Credentials::new(
            TokenConfig::new(SecretString::from(SECRET.to_string()))
                .with_ttl_seconds(MAX_TOKEN_TTL_SECONDS),
        )
        .unwrap();
        let issued = longest.issue(Uuid::now_v7(), NOW).unwrap();
        assert_eq!(issued.expires_at, NOW + MAX_TOKEN_TTL_SECONDS);
    }

    #[test]
    fn expiry_past_the_clock_is_an_error() {
        let credentials = credentials();
        assert!(matches!(
            credentials.issue(Uuid::now_v7(), i64::MAX - 1).unwrap_err(),
            Error::ExpiryOverflow
        ));
    }

    #[test]
    fn short_secret_is_accepted() {
        assert!(Credentials::new(TokenConfig::new(SecretString::from("short".to_string()))).is_ok());
    }

    #[test]
    fn bearer_header_is_required() {
        let credentials = credentials();
        let headers = HeaderMap::new();
        assert!(matches!(
            credentials.verify_headers(&headers, NOW).unwrap_err(),
            Error::Missing
        ));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            credentials.verify_headers(&headers, NOW).unwrap_err(),
            Error::Missing
        ));
    }

    #[test]
    fn bearer_header_round_trip() {
        let credentials = credentials();
        let identity = Uuid::now_v7();
        let issued = credentials.issue(identity, NOW).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", issued.token)).unwrap(),
        );

        assert_eq!(credentials.verify_headers(&headers, NOW).unwrap(), identity);
    }

    #[test]
    fn extract_bearer_token_trims_and_rejects_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer   abc  "));
        assert_eq!(extract_bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer    "));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
