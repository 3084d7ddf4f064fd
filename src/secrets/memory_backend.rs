//! In-memory secret backend.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use super::backend::{SecretError, SecretLoader};

/// Secrets held in process memory, keyed by workspace then name
#[derive(Debug, Default)]
pub struct MemorySecretLoader {
    workspaces: DashMap<String, HashMap<String, String>>,
}

impl MemorySecretLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a secret
    pub fn insert(
        &self,
        workspace_id: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.workspaces
            .entry(workspace_id.into())
            .or_default()
            .insert(name.into(), value.into());
    }
}

#[async_trait]
impl SecretLoader for MemorySecretLoader {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn load_secrets(
        &self,
        workspace_id: &str,
        names: &[&str],
    ) -> Result<HashMap<String, String>, SecretError> {
        let Some(secrets) = self.workspaces.get(workspace_id) else {
            return Ok(HashMap::new());
        };

        Ok(names
            .iter()
            .filter_map(|name| {
                secrets
                    .get(*name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_requested_names_returned() {
        let loader = MemorySecretLoader::new();
        loader.insert("ws-1", "a", "1");
        loader.insert("ws-1", "b", "2");

        let secrets = loader.load_secrets("ws-1", &["a", "missing"]).await.unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets["a"], "1");
    }

    #[tokio::test]
    async fn test_unknown_workspace_is_empty() {
        let loader = MemorySecretLoader::new();
        loader.insert("ws-1", "a", "1");

        let secrets = loader.load_secrets("ws-2", &["a"]).await.unwrap();
        assert!(secrets.is_empty());
    }
}
