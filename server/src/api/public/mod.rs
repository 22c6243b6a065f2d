pub mod auth;
pub mod health;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/user/create/", post(auth::signup::signup))
        .route("/api/user/token/", post(auth::token::token))
}

#[derive(OpenApi)]
#[openapi(
    paths(health::health, auth::signup::signup, auth::token::token),
    components(schemas(
        health::HealthResponse,
        auth::signup::SignupRequest,
        auth::token::TokenRequest,
        auth::token::TokenResponse,
        crate::api::users::me::UserResponse,
    ))
)]
pub struct ApiDoc;
