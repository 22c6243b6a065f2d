use crate::api::{ApiError, AppPath, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};

use super::types::RecipeDetail;

#[utoipa::path(
    get,
    path = "/api/recipe/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetail),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = state.store.get_recipe(user.id, id)?;

    Ok(Json(RecipeDetail::new(&recipe, &state.media)))
}
