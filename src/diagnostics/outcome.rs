//! Outcome of a delivery attempt, as reported by the delivery subsystem

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::ChannelType;

/// Tagged result of attempting to send a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "variant")]
pub enum SendOutcome {
    /// Delivered; the payload is the provider's confirmation
    Success(Value),
    /// Delivery was not attempted
    Skipped(SkipReason),
    /// Delivery was attempted and rejected
    Failure(ChannelFailure),
    /// The workspace's channel configuration is invalid
    Misconfigured(WorkspaceMisconfiguration),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum SkipReason {
    /// The user has no value for the channel's identifier property
    MissingIdentifier { identifier_key: String },
    /// The user is unsubscribed from the channel's subscription group
    UnsubscribedChannel { channel: ChannelType },
}

/// Channel-specific rejection detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "provider")]
pub enum ChannelFailure {
    Email(EmailProviderFailure),
    Sms(SmsProviderFailure),
    MobilePush {
        message: String,
    },
    Webhook {
        status: Option<u16>,
        body: Option<Value>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EmailProviderFailure {
    /// HTTP rejection from Sendgrid
    Sendgrid {
        status: Option<u16>,
        body: Option<Value>,
    },
    AmazonSes {
        message: String,
    },
    Smtp {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SmsProviderFailure {
    Twilio { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkspaceMisconfiguration {
    ProviderMisconfigured { message: String },
    ProviderNotFound,
}

impl SendOutcome {
    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SendOutcome::Success(_) => "success",
            SendOutcome::Skipped(SkipReason::MissingIdentifier { .. }) => "missing_identifier",
            SendOutcome::Skipped(SkipReason::UnsubscribedChannel { .. }) => "unsubscribed",
            SendOutcome::Failure(ChannelFailure::Email(_)) => "email_failure",
            SendOutcome::Failure(ChannelFailure::Sms(_)) => "sms_failure",
            SendOutcome::Failure(ChannelFailure::MobilePush { .. }) => "mobile_push_failure",
            SendOutcome::Failure(ChannelFailure::Webhook { .. }) => "webhook_failure",
            SendOutcome::Misconfigured(WorkspaceMisconfiguration::ProviderMisconfigured {
                ..
            }) => "provider_misconfigured",
            SendOutcome::Misconfigured(WorkspaceMisconfiguration::ProviderNotFound) => {
                "provider_not_found"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_wire_format() {
        let outcome = SendOutcome::Failure(ChannelFailure::Email(EmailProviderFailure::Sendgrid {
            status: Some(403),
            body: Some(json!({"errors": []})),
        }));

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "Failure",
                "variant": {
                    "type": "Email",
                    "provider": {"type": "Sendgrid", "status": 403, "body": {"errors": []}}
                }
            })
        );
    }

    #[test]
    fn test_skipped_deserialize() {
        let outcome: SendOutcome = serde_json::from_value(json!({
            "type": "Skipped",
            "variant": {"type": "MissingIdentifier", "identifierKey": "email"}
        }))
        .unwrap();

        assert_eq!(
            outcome,
            SendOutcome::Skipped(SkipReason::MissingIdentifier {
                identifier_key: "email".to_string()
            })
        );
        assert_eq!(outcome.kind(), "missing_identifier");
    }
}
