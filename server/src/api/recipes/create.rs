use crate::api::{ApiError, AppJson, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use larder_core::RecipeInput;

use super::types::{RecipeDetail, RecipeRequest};

#[utoipa::path(
    post,
    path = "/api/recipe/recipes/",
    tag = "recipes",
    request_body(content = RecipeRequest, example = json!({"title": "Soup", "time_minutes": 30, "price": "5.50", "tags": [1]})),
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeDetail),
        (status = 400, description = "Invalid input or unknown tag/ingredient ids", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<RecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = RecipeInput::from(request).into_new()?;

    let recipe = state.store.create_recipe(user.id, &fields)?;
    tracing::info!(recipe_id = recipe.recipe.id, "Created recipe {}", recipe.recipe);

    Ok((
        StatusCode::CREATED,
        Json(RecipeDetail::new(&recipe, &state.media)),
    ))
}
