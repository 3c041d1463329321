use axum::{Router, extract::DefaultBodyLimit, routing::get};
use deployment::Deployment;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{DeploymentImpl, routes};

/// Large enough for several images at the per-image limit, so oversized
/// files are reported per field instead of failing the whole request.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024 * 1024;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api_routes = Router::new()
        .merge(routes::product_variants::router(&deployment))
        .merge(routes::catalog::router());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .nest_service("/storage", ServeDir::new(deployment.public_storage_dir()))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}
