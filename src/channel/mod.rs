//! Messaging channels and the user property that addresses each of them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Delivery channel a template is rendered or sent for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ChannelType {
    Email,
    MobilePush,
    Sms,
    Webhook,
}

impl ChannelType {
    /// Name of the user property holding the recipient address for this channel
    pub fn identifier_key(&self) -> &'static str {
        match self {
            ChannelType::Email => "email",
            ChannelType::MobilePush => "deviceToken",
            ChannelType::Sms => "phone",
            ChannelType::Webhook => "id",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Email => "Email",
            ChannelType::MobilePush => "MobilePush",
            ChannelType::Sms => "Sms",
            ChannelType::Webhook => "Webhook",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
