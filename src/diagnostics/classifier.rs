//! Classification of send outcomes into results or diagnostics

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::metrics::DiagnosticMetrics;
use crate::result::JsonResult;

use super::outcome::{
    ChannelFailure, EmailProviderFailure, SendOutcome, SkipReason, SmsProviderFailure,
    WorkspaceMisconfiguration,
};
use super::suggestions;

/// Remediation guidance for a failed or skipped send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Read top to bottom as a checklist
    pub suggestions: Vec<String>,

    /// Raw provider response, for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
}

impl Diagnostic {
    pub fn new(suggestions: Vec<String>) -> Self {
        Self {
            suggestions,
            response_data: None,
        }
    }

    pub fn with_response_data(mut self, data: Value) -> Self {
        self.response_data = Some(data);
        self
    }
}

/// Test-send response payload
pub type TestSendResult = JsonResult<Value, Diagnostic>;

/// An outcome the classifier has no guidance for
#[derive(Debug, Error)]
#[error("unclassified send outcome: {}", .outcome.kind())]
pub struct UnclassifiedOutcome {
    pub outcome: SendOutcome,
}

/// Map a send outcome onto the test-send response.
///
/// Every variant is named explicitly; a new variant will not compile until it
/// is either classified or routed to [`UnclassifiedOutcome`].
pub fn classify(outcome: SendOutcome) -> Result<TestSendResult, UnclassifiedOutcome> {
    let kind = outcome.kind();

    let diagnostic = match outcome {
        SendOutcome::Success(value) => {
            DiagnosticMetrics::classified(kind);
            return Ok(JsonResult::ok(value));
        }
        SendOutcome::Skipped(SkipReason::MissingIdentifier { identifier_key }) => {
            Diagnostic::new(suggestions::missing_identifier(&identifier_key))
        }
        SendOutcome::Failure(ChannelFailure::Email(EmailProviderFailure::Sendgrid {
            status,
            body,
        })) => Diagnostic::new(suggestions::provider_rejection(status))
            .with_response_data(body.unwrap_or(Value::Null)),
        SendOutcome::Misconfigured(WorkspaceMisconfiguration::ProviderMisconfigured {
            message,
        }) => Diagnostic::new(suggestions::provider_misconfigured(&message)),
        SendOutcome::Misconfigured(WorkspaceMisconfiguration::ProviderNotFound) => {
            Diagnostic::new(suggestions::provider_not_found())
        }
        outcome @ (SendOutcome::Skipped(SkipReason::UnsubscribedChannel { .. })
        | SendOutcome::Failure(ChannelFailure::Email(
            EmailProviderFailure::AmazonSes { .. } | EmailProviderFailure::Smtp { .. },
        ))
        | SendOutcome::Failure(ChannelFailure::Sms(SmsProviderFailure::Twilio { .. }))
        | SendOutcome::Failure(ChannelFailure::MobilePush { .. })
        | SendOutcome::Failure(ChannelFailure::Webhook { .. })) => {
            tracing::error!(outcome = ?outcome, "Unexpected error sending test message");
            DiagnosticMetrics::unclassified(kind);
            return Err(UnclassifiedOutcome { outcome });
        }
    };

    DiagnosticMetrics::classified(kind);
    Ok(JsonResult::err(diagnostic))
}
