//! Delivery attempt boundary.
//!
//! The transport that talks to email, SMS and push providers lives outside
//! this service. It is reached through [`MessageSender`] and reports back a
//! [`SendOutcome`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::ChannelType;
use crate::diagnostics::{SendOutcome, WorkspaceMisconfiguration};

/// Errors raised by the delivery collaborator itself, outside any modeled outcome
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Delivery backend unavailable: {0}")]
    Unavailable(String),
}

/// A single delivery attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub workspace_id: String,
    pub template_id: String,
    pub user_property_assignments: serde_json::Map<String, serde_json::Value>,
    pub channel: ChannelType,
    /// Send the template's unpublished draft
    pub use_draft: bool,
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, request: &SendMessageRequest)
        -> Result<SendOutcome, DeliveryError>;
}

/// Sender used when no transport is wired in.
///
/// Every attempt reports that the workspace has no message service provider.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredSender;

#[async_trait]
impl MessageSender for UnconfiguredSender {
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendOutcome, DeliveryError> {
        tracing::warn!(
            workspace_id = %request.workspace_id,
            channel = %request.channel,
            "No message service provider configured"
        );
        Ok(SendOutcome::Misconfigured(
            WorkspaceMisconfiguration::ProviderNotFound,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_sender_reports_missing_provider() {
        let request = SendMessageRequest {
            workspace_id: "ws-1".to_string(),
            template_id: "tpl-1".to_string(),
            user_property_assignments: Default::default(),
            channel: ChannelType::Email,
            use_draft: true,
        };

        let outcome = UnconfiguredSender.send_message(&request).await.unwrap();
        assert_eq!(
            outcome,
            SendOutcome::Misconfigured(WorkspaceMisconfiguration::ProviderNotFound)
        );
    }
}
