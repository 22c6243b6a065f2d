pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod types;
pub mod update;
pub mod upload_image;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/recipe/recipes/",
            get(list::list_recipes).post(create::create_recipe),
        )
        .route(
            "/api/recipe/recipes/{id}/",
            get(get::get_recipe)
                .put(update::replace_recipe)
                .patch(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .route(
            "/api/recipe/recipes/{id}/upload-image/",
            post(upload_image::upload_image),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        create::create_recipe,
        get::get_recipe,
        update::replace_recipe,
        update::update_recipe,
        delete::delete_recipe,
        upload_image::upload_image,
    ),
    components(schemas(
        types::RecipeRequest,
        types::RecipeSummary,
        types::RecipeDetail,
        types::RecipeImageResponse,
        upload_image::UploadImageRequest,
    ))
)]
pub struct ApiDoc;
