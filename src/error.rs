//! Authentication error taxonomy and its HTTP mapping.
//!
//! Variants stay distinct for logs and tests, but the responses collapse them:
//! every token failure is a bare 401, and "nothing enrolled" is
//! indistinguishable from "no match" to the client.

use crate::{face::DescriptorError, store::StoreError, token};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const MISSING_DESCRIPTOR: &str = "Face ID is required";
pub const NOT_REGISTERED: &str = "Face not registered. Please register first.";
pub const ALREADY_REGISTERED: &str = "Face already registered";
pub const CONFLICTING_ENROLLMENT: &str =
    "This face is already registered or database has conflicting data. Please try again or contact support.";
pub const UNAUTHORIZED: &str = "Unauthorized";
pub const SERVER_ERROR: &str = "Server error";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    MalformedInput(String),
    #[error("no enrollments exist")]
    NotEnrolled,
    #[error("no enrollment within the match threshold")]
    NoMatch,
    #[error("descriptor already enrolled")]
    AlreadyEnrolled,
    #[error("descriptor enrolled concurrently")]
    ConflictingEnrollment,
    #[error("missing bearer token")]
    TokenMissing,
    #[error("malformed token")]
    TokenMalformed,
    #[error("invalid token signature")]
    TokenInvalidSignature,
    #[error("token expired")]
    TokenExpired,
    #[error("storage failure: {0}")]
    StorageFailure(#[source] StoreError),
    #[error("failed to issue credential: {0}")]
    CredentialIssue(#[source] token::Error),
}

impl AuthError {
    #[must_use]
    pub fn missing_descriptor() -> Self {
        Self::MalformedInput(MISSING_DESCRIPTOR.to_string())
    }

    #[must_use]
    pub const fn is_token_failure(&self) -> bool {
        matches!(
            self,
            Self::TokenMissing
                | Self::TokenMalformed
                | Self::TokenInvalidSignature
                | Self::TokenExpired
        )
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedInput(_) | Self::AlreadyEnrolled | Self::ConflictingEnrollment => {
                StatusCode::BAD_REQUEST
            }
            Self::NotEnrolled | Self::NoMatch => StatusCode::NOT_FOUND,
            Self::TokenMissing
            | Self::TokenMalformed
            | Self::TokenInvalidSignature
            | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::StorageFailure(_) | Self::CredentialIssue(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DescriptorError> for AuthError {
    fn from(err: DescriptorError) -> Self {
        Self::MalformedInput(format!("Invalid face descriptor: {err}"))
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation => Self::ConflictingEnrollment,
            other @ StoreError::Database(_) => Self::StorageFailure(other),
        }
    }
}

impl From<token::Error> for AuthError {
    fn from(err: token::Error) -> Self {
        match err {
            token::Error::Missing => Self::TokenMissing,
            token::Error::InvalidSignature => Self::TokenInvalidSignature,
            token::Error::Expired => Self::TokenExpired,
            token::Error::TokenFormat
            | token::Error::Base64
            | token::Error::Json(_)
            | token::Error::UnsupportedAlg(_)
            | token::Error::InvalidIdentity => Self::TokenMalformed,
            other @ (token::Error::Key
            | token::Error::ExpiryOverflow
            | token::Error::InsecureSecret(_)) => {
                Self::CredentialIssue(other)
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::MalformedInput(message) => json!({ "message": message }),
            Self::NotEnrolled | Self::NoMatch => json!({ "message": NOT_REGISTERED }),
            Self::AlreadyEnrolled => json!({ "message": ALREADY_REGISTERED }),
            Self::ConflictingEnrollment => json!({ "message": CONFLICTING_ENROLLMENT }),
            Self::TokenMissing
            | Self::TokenMalformed
            | Self::TokenInvalidSignature
            | Self::TokenExpired => json!({ "message": UNAUTHORIZED }),
            Self::StorageFailure(err) => {
                error!("Storage failure: {err:?}");
                json!({ "message": SERVER_ERROR, "error": "storage unavailable" })
            }
            Self::CredentialIssue(err) => {
                error!("Credential issue failure: {err:?}");
                json!({ "message": SERVER_ERROR, "error": "could not issue credential" })
            }
        };

        (status, Json(body)).into_response()
    }
}
