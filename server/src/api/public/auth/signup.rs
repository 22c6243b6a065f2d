use crate::accounts;
use crate::api::users::me::UserResponse;
use crate::api::{ApiError, AppJson, ErrorResponse};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/user/create/",
    tag = "user",
    request_body(content = SignupRequest, example = json!({"email": "cook@example.com", "password": "testpass123", "name": "Cook"})),
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid input or email already registered", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = accounts::create_user(
        state.store.as_ref(),
        req.email.as_deref(),
        req.password.as_deref(),
        req.name.as_deref(),
    )?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}
