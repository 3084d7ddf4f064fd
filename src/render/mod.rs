//! Message template rendering.
//!
//! This module provides:
//! - Content slots and the per-request render context
//! - A Liquid evaluator behind the [`TemplateEvaluator`] trait, with the
//!   standard tags and filters plus the subscription management tags
//! - The render pipeline: secrets are loaded once, the channel identifier key
//!   is resolved once, then every slot renders independently
//!
//! # Example
//!
//! ```ignore
//! let evaluator = LiquidEvaluator::new("https://app.example.com");
//! let loader = MemorySecretLoader::new();
//!
//! let request: RenderRequest = serde_json::from_value(json!({
//!     "workspaceId": "ws-1",
//!     "channel": "Email",
//!     "userProperties": { "name": "Ada" },
//!     "contents": { "body": { "value": "Hello {{name}}" } }
//! }))?;
//!
//! let response = render_contents(request, &loader, &evaluator).await?;
//! // {"contents": {"body": {"type": "Ok", "value": "Hello Ada"}}}
//! ```

mod liquid;
mod pipeline;
mod types;

pub use liquid::{LiquidEvaluator, TemplateEvaluator};
pub use pipeline::{load_template_secrets, render_contents, render_slots};
pub use types::{
    ContentSlot, EvalError, RenderContext, RenderRequest, RenderResponse, SlotRenderResult,
};
