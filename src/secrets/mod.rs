//! Workspace secret lookup.
//!
//! Template rendering only ever sees the secrets named in
//! [`TEMPLATE_SECRET_NAMES`]; backends are scoped per workspace.

mod backend;
mod factory;
mod memory_backend;
mod postgres_backend;

pub use backend::{SecretError, SecretLoader, SUBSCRIPTION_SECRET_NAME, TEMPLATE_SECRET_NAMES};
pub use factory::create_secret_loader;
pub use memory_backend::MemorySecretLoader;
pub use postgres_backend::PostgresSecretLoader;
