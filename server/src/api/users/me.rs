use crate::accounts;
use crate::api::{ApiError, AppJson, ErrorResponse};
use crate::auth::AuthUser;
use crate::models::User;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use larder_core::ProfileChanges;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public view of an account. The password hash is never exposed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/user/me/",
    tag = "user",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(UserResponse::from(&user))
}

#[utoipa::path(
    patch,
    path = "/api/user/me/",
    tag = "user",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppJson(req): AppJson<UpdateMeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let changes = ProfileChanges::validate(
        req.email.as_deref(),
        req.name.as_deref(),
        req.password.as_deref(),
    )?;

    let updated = accounts::update_profile(state.store.as_ref(), &user, changes)?;

    Ok(Json(UserResponse::from(&updated)))
}
