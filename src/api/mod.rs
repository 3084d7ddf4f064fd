//! API layer - HTTP endpoint handlers.

mod content;
mod extract;
mod health;
mod metrics;
mod routes;

pub use content::{render_template, test_template, TestSendRequest};
pub use health::{health, HealthResponse};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
