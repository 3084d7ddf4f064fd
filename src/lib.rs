// Infrastructure (shared components)
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain layer (business logic)
pub mod channel;
pub mod delivery;
pub mod diagnostics;
pub mod render;
pub mod result;
pub mod secrets;

// Application layer
pub mod api;
pub mod server;
