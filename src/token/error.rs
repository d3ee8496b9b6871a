use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid identity claim")]
    InvalidIdentity,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid signing key")]
    Key,
    #[error("token expiry overflows the clock")]
    ExpiryOverflow,
    #[error("insecure signing secret: {0}")]
    InsecureSecret(&'static str),
}
