use super::{auth::Principal, MessageResponse};
use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MeResponse {
    pub id: String,
}

#[utoipa::path(
    get,
    path = "/me",
    responses (
        (status = 200, description = "Identity bound to the bearer token", body = MeResponse),
        (status = 401, description = "Missing, malformed, forged or expired token", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(Extension(principal): Extension<Principal>) -> Json<MeResponse> {
    Json(MeResponse {
        id: principal.identity.to_string(),
    })
}
