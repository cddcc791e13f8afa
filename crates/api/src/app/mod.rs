//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the shared [`services::AppServices`]
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and request validation
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use partyhub_infra::StoreError;

use crate::config::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, StoreError> {
    let services = services::build_services(config).await?;
    Ok(router(Arc::new(services)))
}

/// Router over already-wired services.
pub fn router(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
