//! Pauses between pipeline stages.

use archsmith_config::Config;
use archsmith_utils::types::StageId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

/// Decides how long to pause after a stage completes.
#[async_trait]
pub trait WaitPolicy: Send + Sync {
    async fn wait_after(&self, stage: StageId);
}

/// Fixed per-stage delays, typically read from configuration.
#[derive(Debug, Clone, Default)]
pub struct FixedDelayPolicy {
    delays: HashMap<StageId, Duration>,
}

impl FixedDelayPolicy {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let delays = StageId::ALL
            .iter()
            .map(|stage| (*stage, config.delay_for(stage.as_str())))
            .collect();
        Self { delays }
    }

    #[must_use]
    pub fn with_delay(mut self, stage: StageId, delay: Duration) -> Self {
        self.delays.insert(stage, delay);
        self
    }

    #[must_use]
    pub fn delay_for(&self, stage: StageId) -> Duration {
        self.delays.get(&stage).copied().unwrap_or_default()
    }
}

#[async_trait]
impl WaitPolicy for FixedDelayPolicy {
    async fn wait_after(&self, stage: StageId) {
        let delay = self.delay_for(stage);
        if delay.is_zero() {
            return;
        }
        info!(
            stage = stage.as_str(),
            delay_secs = delay.as_secs(),
            "Waiting before the next stage"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl WaitPolicy for NoDelay {
    async fn wait_after(&self, _stage: StageId) {}
}
