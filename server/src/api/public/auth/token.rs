use crate::accounts;
use crate::api::{ApiError, AppJson, ErrorResponse};
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/user/token/",
    tag = "user",
    request_body(content = TokenRequest, example = json!({"email": "cook@example.com", "password": "testpass123"})),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Missing or invalid credentials", body = ErrorResponse)
    )
)]
pub async fn token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = accounts::issue_token(
        state.store.as_ref(),
        req.email.as_deref(),
        req.password.as_deref(),
    )?;

    Ok(Json(TokenResponse { token }))
}
