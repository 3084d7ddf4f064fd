//! Backend trait for workspace secret lookup.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Secret exposed to templates for subscription management links
pub const SUBSCRIPTION_SECRET_NAME: &str = "subscription-key";

/// Secrets a template render is allowed to see
pub const TEMPLATE_SECRET_NAMES: &[&str] = &[SUBSCRIPTION_SECRET_NAME];

/// Errors that can occur during secret lookup.
#[derive(Debug, Error)]
pub enum SecretError {
    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Backend is temporarily unavailable
    #[error("Secret backend unavailable: {0}")]
    Unavailable(String),
}

/// Backend trait for workspace secret storage.
///
/// Implementations must only return secrets belonging to `workspace_id` whose
/// names are in `names`. Entries with no value may be omitted.
#[async_trait]
pub trait SecretLoader: Send + Sync {
    /// Backend type identifier, reported by the health endpoint
    fn backend_type(&self) -> &'static str;

    /// Look up the named secrets of a workspace.
    async fn load_secrets(
        &self,
        workspace_id: &str,
        names: &[&str],
    ) -> Result<HashMap<String, String>, SecretError>;
}
