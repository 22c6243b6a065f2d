use crate::api::{ApiError, AppJson, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use larder_core::validate_item_name;
use serde::Deserialize;
use utoipa::ToSchema;

use super::list::IngredientItem;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    pub name: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/recipe/ingredients/",
    tag = "ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created successfully", body = IngredientItem),
        (status = 400, description = "Invalid request (empty name)", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_ingredient(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateIngredientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_item_name(request.name.as_deref())?;

    let ingredient = state.store.create_ingredient(user.id, &name)?;
    tracing::info!(ingredient_id = ingredient.id, "Created ingredient {}", ingredient);

    Ok((StatusCode::CREATED, Json(IngredientItem::from(&ingredient))))
}
