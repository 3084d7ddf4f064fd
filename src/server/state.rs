use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::delivery::{MessageSender, UnconfiguredSender};
use crate::render::{LiquidEvaluator, TemplateEvaluator};
use crate::secrets::{create_secret_loader, SecretError, SecretLoader};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub secret_loader: Arc<dyn SecretLoader>,
    pub sender: Arc<dyn MessageSender>,
    pub evaluator: Arc<dyn TemplateEvaluator>,
    pub start_time: Instant,
}

impl AppState {
    /// Build state from settings, with no delivery transport wired in
    pub fn new(settings: Settings) -> Result<Self, SecretError> {
        let secret_loader = create_secret_loader(&settings)?;
        Ok(Self::with_components(
            settings,
            secret_loader,
            Arc::new(UnconfiguredSender),
        ))
    }

    pub fn with_components(
        settings: Settings,
        secret_loader: Arc<dyn SecretLoader>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        let evaluator = Arc::new(LiquidEvaluator::new(
            settings.render.public_base_url.clone(),
        ));

        Self {
            settings: Arc::new(settings),
            secret_loader,
            sender,
            evaluator,
            start_time: Instant::now(),
        }
    }
}
