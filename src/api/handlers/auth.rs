//! Bearer token middleware.
//!
//! Verifies `Authorization: Bearer <token>` and binds the recovered identity
//! to the request as a [`Principal`] extension for downstream handlers.

use crate::{face::FaceAuth, token::now_unix_seconds};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Authenticated identity derived from the bearer token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal {
    pub identity: Uuid,
}

pub async fn require_bearer(
    Extension(auth): Extension<Arc<FaceAuth>>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth.verify_headers(request.headers(), now_unix_seconds()) {
        Ok(identity) => {
            request.extensions_mut().insert(Principal { identity });
            next.run(request).await
        }
        Err(err) => {
            // the kind is only logged; the client always sees a plain 401
            debug!(error = %err, "Bearer verification failed");
            err.into_response()
        }
    }
}
