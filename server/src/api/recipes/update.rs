use crate::api::{ApiError, AppJson, AppPath, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use larder_core::{RecipeInput, UpdateMode};

use super::types::{RecipeDetail, RecipeRequest};

fn apply_update(
    state: &AppState,
    owner: i64,
    id: i64,
    request: RecipeRequest,
    mode: UpdateMode,
) -> Result<Json<RecipeDetail>, ApiError> {
    // Foreign ids are 404 before any payload error is reported.
    state.store.get_recipe(owner, id)?;

    let patch = RecipeInput::from(request).into_patch(mode)?;
    let recipe = state.store.update_recipe(owner, id, &patch)?;

    Ok(Json(RecipeDetail::new(&recipe, &state.media)))
}

#[utoipa::path(
    put,
    path = "/api/recipe/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe replaced", body = RecipeDetail),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn replace_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<RecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    apply_update(&state, user.id, id, request, UpdateMode::Full)
}

#[utoipa::path(
    patch,
    path = "/api/recipe/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeDetail),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<RecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    apply_update(&state, user.id, id, request, UpdateMode::Partial)
}
