//! Secret backend factory

use std::sync::Arc;

use crate::config::Settings;

use super::backend::{SecretError, SecretLoader};
use super::memory_backend::MemorySecretLoader;
use super::postgres_backend::PostgresSecretLoader;

/// Create a secret backend based on configuration.
///
/// - `database.url` set: `PostgresSecretLoader`
/// - otherwise: `MemorySecretLoader` seeded from the `secrets` list
pub fn create_secret_loader(settings: &Settings) -> Result<Arc<dyn SecretLoader>, SecretError> {
    if let Some(database) = settings.database.as_ref().filter(|db| !db.url.is_empty()) {
        tracing::info!(backend = "postgres", "Creating PostgreSQL secret backend");
        return Ok(Arc::new(PostgresSecretLoader::connect_lazy(database)?));
    }

    let loader = MemorySecretLoader::new();
    for seed in &settings.secrets {
        loader.insert(&seed.workspace_id, &seed.name, &seed.value);
    }

    tracing::info!(
        backend = "memory",
        seeded = settings.secrets.len(),
        "Creating in-memory secret backend"
    );
    Ok(Arc::new(loader))
}
