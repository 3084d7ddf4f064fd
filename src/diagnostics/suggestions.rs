//! Suggestion text for classified send failures.
//!
//! Each builder returns the exact, ordered list for its case. Lists are never
//! reordered or deduplicated.

const CLAUSE_SEPARATOR: &str = " - ";

const MISSING_IDENTIFIER: &str = "Missing identifying user property value: ";
const PROVIDER_STATUS: &str = "Provider responded with status: ";
const UNAUTHORIZED_DOMAIN: &str = "Is the configured email domain authorized in sengrid?";
const PROVIDER_MISCONFIGURED: &str =
    "Unable to send message, because your message service provider is not configured correctly";
const PROVIDER_NOT_FOUND: &str =
    "Unable to send message, because you haven't configured a message service provider.";

pub fn missing_identifier(identifier_key: &str) -> Vec<String> {
    vec![format!("{}{}", MISSING_IDENTIFIER, identifier_key)]
}

/// The domain hint is only added after the status line it refines.
/// A zero status counts as no status.
pub fn provider_rejection(status: Option<u16>) -> Vec<String> {
    let mut suggestions = Vec::new();
    if let Some(status) = status.filter(|s| *s != 0) {
        suggestions.push(format!("{}{}", PROVIDER_STATUS, status));
        if status == 403 {
            suggestions.push(UNAUTHORIZED_DOMAIN.to_string());
        }
    }
    suggestions
}

pub fn provider_misconfigured(message: &str) -> Vec<String> {
    vec![[PROVIDER_MISCONFIGURED, message].join(CLAUSE_SEPARATOR)]
}

pub fn provider_not_found() -> Vec<String> {
    vec![PROVIDER_NOT_FOUND.to_string()]
}
