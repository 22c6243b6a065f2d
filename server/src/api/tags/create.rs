use crate::api::{ApiError, AppJson, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use larder_core::validate_item_name;
use serde::Deserialize;
use utoipa::ToSchema;

use super::list::TagItem;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/recipe/tags/",
    tag = "tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created successfully", body = TagItem),
        (status = 400, description = "Invalid request (empty name)", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_tag(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_item_name(request.name.as_deref())?;

    let tag = state.store.create_tag(user.id, &name)?;
    tracing::info!(tag_id = tag.id, "Created tag {}", tag);

    Ok((StatusCode::CREATED, Json(TagItem::from(&tag))))
}
