//! Render pipeline: secrets → context → independent per-slot renders

use std::collections::{BTreeMap, HashMap};

use crate::metrics::RenderMetrics;
use crate::secrets::{SecretError, SecretLoader, TEMPLATE_SECRET_NAMES};

use super::liquid::TemplateEvaluator;
use super::types::{ContentSlot, RenderContext, RenderRequest, RenderResponse, SlotRenderResult};

/// Render every slot against the same context.
///
/// Slots are independent: a failing slot yields `Err` with the evaluator's
/// message and never affects its siblings. The output has exactly the input's
/// slot names.
pub fn render_slots(
    slots: &BTreeMap<String, ContentSlot>,
    context: &RenderContext,
    evaluator: &dyn TemplateEvaluator,
) -> BTreeMap<String, SlotRenderResult> {
    slots
        .iter()
        .map(|(name, slot)| {
            let result = render_slot(name, slot, context, evaluator);
            (name.clone(), result)
        })
        .collect()
}

fn render_slot(
    name: &str,
    slot: &ContentSlot,
    context: &RenderContext,
    evaluator: &dyn TemplateEvaluator,
) -> SlotRenderResult {
    let result = evaluator.evaluate(&slot.value, slot.mjml, context);

    match &result {
        Ok(_) => RenderMetrics::slot_rendered(),
        Err(e) => {
            tracing::debug!(slot = %name, error = %e, "Slot failed to render");
            RenderMetrics::slot_failed();
        }
    }

    result.map_err(|e| e.to_string()).into()
}

/// Load the allow-listed workspace secrets, skipping empty values
pub async fn load_template_secrets(
    loader: &dyn SecretLoader,
    workspace_id: &str,
) -> Result<HashMap<String, String>, SecretError> {
    let secrets = loader
        .load_secrets(workspace_id, TEMPLATE_SECRET_NAMES)
        .await?;

    Ok(secrets
        .into_iter()
        .filter(|(name, value)| {
            TEMPLATE_SECRET_NAMES.contains(&name.as_str()) && !value.is_empty()
        })
        .collect())
}

/// Full render operation for a request
pub async fn render_contents(
    request: RenderRequest,
    loader: &dyn SecretLoader,
    evaluator: &dyn TemplateEvaluator,
) -> Result<RenderResponse, SecretError> {
    let secrets = load_template_secrets(loader, &request.workspace_id).await?;

    let context = RenderContext {
        workspace_id: request.workspace_id,
        subscription_group_id: request.subscription_group_id,
        user_properties: request.user_properties,
        identifier_key: request.channel.identifier_key().to_string(),
        secrets,
    };

    let contents = render_slots(&request.contents, &context, evaluator);

    tracing::debug!(
        workspace_id = %context.workspace_id,
        slots = contents.len(),
        failed = contents.values().filter(|r| r.is_err()).count(),
        "Rendered template contents"
    );

    Ok(RenderResponse { contents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelType;
    use crate::render::LiquidEvaluator;
    use crate::secrets::{MemorySecretLoader, SUBSCRIPTION_SECRET_NAME};
    use serde_json::json;

    fn evaluator() -> LiquidEvaluator {
        LiquidEvaluator::new("https://app.example.com")
    }

    fn request(contents: BTreeMap<String, ContentSlot>) -> RenderRequest {
        RenderRequest {
            workspace_id: "ws-1".to_string(),
            subscription_group_id: None,
            channel: ChannelType::Email,
            user_properties: json!({"name": "Ada", "email": "ada@example.com"})
                .as_object()
                .cloned()
                .unwrap(),
            contents,
        }
    }

    #[test]
    fn test_render_slots_isolates_failures() {
        let mut slots = BTreeMap::new();
        slots.insert("subject".to_string(), ContentSlot::text("Hi {{ name }}"));
        slots.insert("body".to_string(), ContentSlot::text("Broken {{ name"));
        slots.insert("preview".to_string(), ContentSlot::text("Plain text"));

        let ctx = RenderContext {
            user_properties: json!({"name": "Ada"}).as_object().cloned().unwrap(),
            ..Default::default()
        };
        let results = render_slots(&slots, &ctx, &evaluator());

        assert_eq!(results.len(), 3);
        assert_eq!(results["subject"], SlotRenderResult::ok("Hi Ada".to_string()));
        assert_eq!(results["preview"], SlotRenderResult::ok("Plain text".to_string()));
        assert!(results["body"].is_err());
    }

    #[tokio::test]
    async fn test_render_contents_resolves_identifier_key() {
        let mut slots = BTreeMap::new();
        slots.insert("to".to_string(), ContentSlot::text("{{ identifier_key }}"));

        let mut req = request(slots);
        req.channel = ChannelType::Sms;

        let loader = MemorySecretLoader::new();
        let response = render_contents(req, &loader, &evaluator()).await.unwrap();
        assert_eq!(response.contents["to"], SlotRenderResult::ok("phone".to_string()));
    }

    #[tokio::test]
    async fn test_empty_secrets_are_omitted() {
        let loader = MemorySecretLoader::new();
        loader.insert("ws-1", SUBSCRIPTION_SECRET_NAME, "");
        loader.insert("ws-1", "other-secret", "value");

        let secrets = load_template_secrets(&loader, "ws-1").await.unwrap();
        assert!(secrets.is_empty());
    }

    #[tokio::test]
    async fn test_secrets_scoped_to_workspace() {
        let loader = MemorySecretLoader::new();
        loader.insert("ws-2", SUBSCRIPTION_SECRET_NAME, "secret");

        let secrets = load_template_secrets(&loader, "ws-1").await.unwrap();
        assert!(secrets.is_empty());

        let secrets = load_template_secrets(&loader, "ws-2").await.unwrap();
        assert_eq!(secrets.get(SUBSCRIPTION_SECRET_NAME).map(String::as_str), Some("secret"));
    }
}
