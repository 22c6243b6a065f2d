use crate::api::{ApiError, AppQuery, ErrorResponse};
use crate::auth::AuthUser;
use crate::models::Tag;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagItem {
    pub id: i64,
    pub name: String,
}

impl From<&Tag> for TagItem {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTagsParams {
    /// `1` to only return tags linked to at least one recipe.
    pub assigned_only: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/recipe/tags/",
    tag = "tags",
    params(ListTagsParams),
    responses(
        (status = 200, description = "The user's tags, by name descending", body = Vec<TagItem>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_tags(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListTagsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let assigned_only = crate::api::parse_flag("assigned_only", params.assigned_only.as_deref())?;

    let tags = state.store.list_tags(user.id, assigned_only)?;

    Ok(Json(tags.iter().map(TagItem::from).collect::<Vec<_>>()))
}
