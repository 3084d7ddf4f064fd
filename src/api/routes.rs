use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::content::{render_template, test_template};
use super::health::health;
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Template endpoints
        .nest(
            "/api/v1",
            Router::new()
                .route("/templates/render", post(render_template))
                .route("/templates/test", post(test_template)),
        )
}
