//! Template render and test-send endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;

use super::extract::ApiJson;
use crate::channel::ChannelType;
use crate::delivery::SendMessageRequest;
use crate::diagnostics::{classify, TestSendResult};
use crate::error::Result;
use crate::render::{render_contents, RenderRequest, RenderResponse};
use crate::server::AppState;

/// Request body for a test send
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSendRequest {
    pub workspace_id: String,
    pub template_id: String,
    pub channel: ChannelType,
    #[serde(default)]
    pub user_properties: serde_json::Map<String, serde_json::Value>,
}

/// POST /api/v1/templates/render - Render each content slot independently
#[tracing::instrument(
    name = "http.render_template",
    skip(state, request),
    fields(
        workspace_id = %request.workspace_id,
        channel = %request.channel,
        slots = request.contents.len()
    )
)]
pub async fn render_template(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RenderRequest>,
) -> Result<Json<RenderResponse>> {
    let response = render_contents(
        request,
        state.secret_loader.as_ref(),
        state.evaluator.as_ref(),
    )
    .await?;

    Ok(Json(response))
}

/// POST /api/v1/templates/test - Send a draft and explain any failure
#[tracing::instrument(
    name = "http.test_template",
    skip(state, request),
    fields(
        workspace_id = %request.workspace_id,
        template_id = %request.template_id,
        channel = %request.channel
    )
)]
pub async fn test_template(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TestSendRequest>,
) -> Result<Json<TestSendResult>> {
    let send_request = SendMessageRequest {
        workspace_id: request.workspace_id,
        template_id: request.template_id,
        user_property_assignments: request.user_properties,
        channel: request.channel,
        use_draft: true,
    };

    let outcome = state.sender.send_message(&send_request).await?;
    tracing::debug!(kind = outcome.kind(), "Test send attempted");

    Ok(Json(classify(outcome)?))
}
