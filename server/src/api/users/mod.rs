pub mod me;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/user/me/", get(me::get_me).patch(me::update_me))
}

#[derive(OpenApi)]
#[openapi(
    paths(me::get_me, me::update_me),
    components(schemas(me::UserResponse, me::UpdateMeRequest))
)]
pub struct ApiDoc;
