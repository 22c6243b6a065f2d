use crate::api::{ApiError, AppPath, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

#[utoipa::path(
    delete,
    path = "/api/recipe/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = state.store.delete_recipe(user.id, id)?;
    tracing::info!(recipe_id = recipe.id, "Deleted recipe {}", recipe);

    if let Some(image) = &recipe.image {
        // The row is gone either way; a leftover file is only logged.
        if let Err(e) = state.media.delete(image).await {
            tracing::warn!("Failed to remove image for deleted recipe {}: {}", recipe.id, e);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
