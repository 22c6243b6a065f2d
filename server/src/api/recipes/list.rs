use crate::api::{ApiError, AppQuery, ErrorResponse};
use crate::auth::AuthUser;
use crate::store::RecipeFilter;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use larder_core::{parse_id_list, ValidationError};
use serde::Deserialize;
use utoipa::IntoParams;

use super::types::RecipeSummary;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListRecipesParams {
    /// Comma-separated tag ids. Matches recipes linked to any of them.
    pub tags: Option<String>,
    /// Comma-separated ingredient ids. Matches recipes linked to any of them.
    pub ingredients: Option<String>,
}

impl ListRecipesParams {
    /// An empty list (`?tags=`) means no restriction on that axis.
    fn into_filter(self) -> Result<RecipeFilter, ValidationError> {
        let mut errors = ValidationError::new();
        let mut parse = |field: &str, raw: Option<String>| match raw {
            None => None,
            Some(raw) => match parse_id_list(field, &raw) {
                Ok(ids) if ids.is_empty() => None,
                Ok(ids) => Some(ids),
                Err(e) => {
                    errors.merge(e);
                    None
                }
            },
        };

        let filter = RecipeFilter {
            tags: parse("tags", self.tags),
            ingredients: parse("ingredients", self.ingredients),
        };

        errors.into_result().map(|()| filter)
    }
}

#[utoipa::path(
    get,
    path = "/api/recipe/recipes/",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "The user's recipes, newest first", body = Vec<RecipeSummary>),
        (status = 400, description = "Malformed id list", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListRecipesParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = params.into_filter()?;

    let recipes = state.store.list_recipes(user.id, &filter)?;

    Ok(Json(
        recipes.iter().map(RecipeSummary::from).collect::<Vec<_>>(),
    ))
}
