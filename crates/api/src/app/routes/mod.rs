use axum::Router;

pub mod parties;
pub mod system;

/// Router for every party endpoint.
pub fn router() -> Router {
    Router::new().nest("/parties", parties::router())
}
