use crate::api::{ApiError, AppQuery, ErrorResponse};
use crate::auth::AuthUser;
use crate::models::Ingredient;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientItem {
    pub id: i64,
    pub name: String,
}

impl From<&Ingredient> for IngredientItem {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListIngredientsParams {
    /// `1` to only return ingredients linked to at least one recipe.
    pub assigned_only: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/recipe/ingredients/",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "The user's ingredients, by name descending", body = Vec<IngredientItem>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_ingredients(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListIngredientsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let assigned_only = crate::api::parse_flag("assigned_only", params.assigned_only.as_deref())?;

    let ingredients = state.store.list_ingredients(user.id, assigned_only)?;

    Ok(Json(ingredients.iter().map(IngredientItem::from).collect::<Vec<_>>()))
}
