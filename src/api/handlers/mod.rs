//! API handlers and the request/response bodies they share.

pub mod auth;
pub mod health;
pub mod login;
pub mod me;
pub mod register;

use crate::face::Authenticated;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `/register` and `/login`.
///
/// `descriptor` is a comma-separated list of numbers. Older clients send the
/// same value as `faceId`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct DescriptorRequest {
    #[serde(default, alias = "faceId")]
    #[schema(example = "-0.0812,0.1022,0.0437")]
    pub descriptor: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
    pub message: String,
    pub id: String,
    /// Unix seconds after which the token is rejected.
    pub expires_at: i64,
}

impl TokenResponse {
    fn new(authenticated: Authenticated, message: &str) -> Self {
        Self {
            token: authenticated.credential.token,
            message: message.to_string(),
            id: authenticated.identity.to_string(),
            expires_at: authenticated.credential.expires_at,
        }
    }
}

/// Error body: `{message}` and, for server errors, a generic `error`.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
