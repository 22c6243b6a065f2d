use crate::api::{ApiError, AppMultipart, AppPath, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use larder_core::{recipe_image_path, validate_image, ValidationError};
use utoipa::ToSchema;

use super::types::RecipeImageResponse;

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadImageRequest {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/api/recipe/recipes/{id}/upload-image/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    request_body(content_type = "multipart/form-data", content = UploadImageRequest),
    responses(
        (status = 200, description = "Image stored", body = RecipeImageResponse),
        (status = 400, description = "Missing file or not a supported image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_image(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<impl IntoResponse, ApiError> {
    state.store.get_recipe(user.id, id)?;

    // Find the `image` field; other fields are ignored.
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            let filename = field.file_name().map(str::to_string);
            let data = field.bytes().await?;
            upload = Some((filename, data));
            break;
        }
    }

    let Some((filename, data)) = upload else {
        return Err(ValidationError::field("image", "No file was submitted.").into());
    };

    let image = validate_image(&data)?;
    let path = recipe_image_path(filename.as_deref(), &image);

    state.media.save(&path, &data).await?;

    let previous = match state.store.set_recipe_image(user.id, id, &path) {
        Ok(previous) => previous,
        Err(e) => {
            // Don't leave an orphaned file behind.
            if let Err(cleanup) = state.media.delete(&path).await {
                tracing::warn!("Failed to remove unused upload {}: {}", path, cleanup);
            }
            return Err(e.into());
        }
    };

    if let Some(previous) = previous.filter(|p| p != &path) {
        if let Err(e) = state.media.delete(&previous).await {
            tracing::warn!("Failed to remove replaced image {}: {}", previous, e);
        }
    }

    tracing::info!(recipe_id = id, "Stored {} image at {}", image.content_type(), path);

    Ok(Json(RecipeImageResponse {
        id,
        image: state.media.url(&path),
    }))
}
