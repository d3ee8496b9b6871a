use super::{DescriptorRequest, MessageResponse, TokenResponse};
use crate::{error::AuthError, face::FaceAuth, token::now_unix_seconds};
use axum::{extract::Extension, Json};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/login",
    request_body = DescriptorRequest,
    responses (
        (status = 200, description = "Login successful", body = TokenResponse, content_type = "application/json"),
        (status = 400, description = "Missing or malformed descriptor", body = MessageResponse),
        (status = 404, description = "Face not registered", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse),
    ),
    tag = "auth"
)]
// axum handler for login
#[instrument(skip(auth, payload))]
pub async fn login(
    auth: Extension<Arc<FaceAuth>>,
    payload: Option<Json<DescriptorRequest>>,
) -> Result<Json<TokenResponse>, AuthError> {
    let descriptor = payload
        .as_ref()
        .and_then(|Json(request)| request.descriptor.as_deref());

    let authenticated = auth.login(descriptor, now_unix_seconds()).await?;

    Ok(Json(TokenResponse::new(authenticated, "Login successful")))
}
