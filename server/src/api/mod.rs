pub mod error;
pub mod ingredients;
pub mod public;
pub mod recipes;
pub mod tags;
pub mod users;


pub use error::{ApiError, AppJson, AppMultipart, AppPath, AppQuery};

use std::collections::BTreeMap;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use serde::Serialize;
use tower_http::services::ServeDir;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::AppState;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Per-field validation messages, present on 400 validation failures.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_fields(error: impl Into<String>, fields: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            error: error.into(),
            fields,
        }
    }
}

/// Parse a boolean query flag such as `assigned_only=1`. Absent or empty is
/// `false`.
pub fn parse_flag(field: &str, raw: Option<&str>) -> Result<bool, larder_core::ValidationError> {
    match raw.map(str::trim).unwrap_or_default() {
        "" | "0" | "false" | "False" => Ok(false),
        "1" | "true" | "True" => Ok(true),
        other => Err(larder_core::ValidationError::field(
            field,
            format!("\"{other}\" is not a valid boolean."),
        )),
    }
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Larder API", description = "Recipe collections with tags and ingredients"),
        components(schemas(ErrorResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    // Add security scheme
    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("API token from /api/user/token/"))
                    .build(),
            ),
        );
    }

    // Merge in each module's spec
    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        public::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
        tags::ApiDoc::openapi(),
        ingredients::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.merge(module_spec);
    }

    spec
}

/// The full application: API routes, media files and API docs.
pub fn router(state: AppState) -> Router {
    let media_url = state.media.base_url().to_string();
    let media_files = ServeDir::new(state.media.root());

    let api = Router::new()
        .merge(public::router())
        .merge(users::router())
        .merge(tags::router())
        .merge(ingredients::router())
        .merge(recipes::router())
        // Leave headroom over the file limit for the multipart framing.
        .layer(DefaultBodyLimit::max(larder_core::MAX_FILE_SIZE + 64 * 1024));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi());

    let router = Router::new().merge(api).merge(swagger_ui);

    let router = if media_url.is_empty() {
        router.fallback_service(media_files)
    } else {
        router.nest_service(&media_url, media_files)
    };

    router.with_state(state)
}
