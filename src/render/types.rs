//! Render pipeline types and error definitions

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::ChannelType;
use crate::result::JsonResult;

/// Template evaluation error. The message is surfaced verbatim for the failing slot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Parse or render failure reported by the template engine
    #[error("{0}")]
    Liquid(String),

    #[error("failed to sign subscription token: {0}")]
    Token(String),
}

impl From<liquid_core::Error> for EvalError {
    fn from(err: liquid_core::Error) -> Self {
        EvalError::Liquid(err.to_string().trim_end().to_string())
    }
}

/// A named unit of template content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSlot {
    /// Raw template source
    pub value: String,

    /// Treat the slot as rich markup
    #[serde(default)]
    pub mjml: bool,
}

impl ContentSlot {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            mjml: false,
        }
    }

    pub fn markup(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            mjml: true,
        }
    }
}

/// Everything a slot render can see. Built once per render call.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub workspace_id: String,
    pub subscription_group_id: Option<String>,
    pub user_properties: serde_json::Map<String, serde_json::Value>,
    /// User property naming the recipient address for the channel
    pub identifier_key: String,
    /// Workspace secrets, already filtered to the allow-list and non-empty values
    pub secrets: HashMap<String, String>,
}

impl RenderContext {
    /// Value of the recipient identifier property, if the user has one
    pub fn identifier(&self) -> Option<&serde_json::Value> {
        self.user_properties
            .get(&self.identifier_key)
            .filter(|v| !v.is_null())
    }
}

/// Per-slot outcome
pub type SlotRenderResult = JsonResult<String, String>;

/// Request body for rendering a template's contents
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub workspace_id: String,

    #[serde(default)]
    pub subscription_group_id: Option<String>,

    pub channel: ChannelType,

    #[serde(default)]
    pub user_properties: serde_json::Map<String, serde_json::Value>,

    pub contents: BTreeMap<String, ContentSlot>,
}

/// Response body for a render call, keyed by the requested slot names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderResponse {
    pub contents: BTreeMap<String, SlotRenderResult>,
}
