use super::{DescriptorRequest, MessageResponse, TokenResponse};
use crate::{error::AuthError, face::FaceAuth, token::now_unix_seconds};
use axum::{extract::Extension, Json};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/register",
    request_body = DescriptorRequest,
    responses (
        (status = 200, description = "Registration successful", body = TokenResponse, content_type = "application/json"),
        (status = 400, description = "Missing or malformed descriptor, or face already registered", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse),
    ),
    tag = "auth"
)]
// axum handler for register
#[instrument(skip(auth, payload))]
pub async fn register(
    auth: Extension<Arc<FaceAuth>>,
    payload: Option<Json<DescriptorRequest>>,
) -> Result<Json<TokenResponse>, AuthError> {
    let descriptor = payload
        .as_ref()
        .and_then(|Json(request)| request.descriptor.as_deref());

    let authenticated = auth.register(descriptor, now_unix_seconds()).await?;

    Ok(Json(TokenResponse::new(
        authenticated,
        "Registration successful",
    )))
}
