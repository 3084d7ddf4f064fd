//! PostgreSQL secret backend.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

use super::backend::{SecretError, SecretLoader};

const SELECT_SECRETS: &str =
    r#"SELECT name, value FROM "Secret" WHERE "workspaceId"::text = $1 AND name = ANY($2)"#;

/// Secrets read from the `"Secret"` table
pub struct PostgresSecretLoader {
    pool: PgPool,
}

impl PostgresSecretLoader {
    /// Build a loader over a lazily connected pool.
    ///
    /// No connection is opened until the first lookup.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, SecretError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect_lazy(&config.url)?;

        tracing::info!(
            pool_size = config.pool_size,
            "PostgreSQL secret backend configured"
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl SecretLoader for PostgresSecretLoader {
    fn backend_type(&self) -> &'static str {
        "postgres"
    }

    async fn load_secrets(
        &self,
        workspace_id: &str,
        names: &[&str],
    ) -> Result<HashMap<String, String>, SecretError> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();

        let rows: Vec<(String, Option<String>)> = sqlx::query_as(SELECT_SECRETS)
            .bind(workspace_id)
            .bind(names)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect())
    }
}
