use crate::provider::{combine_prompt, Credential, GenerationRequest, ModelInfo, ProviderKind};
use crate::stream::{Phase, StreamConsumer};
use anyhow::Context;
use std::sync::Arc;

/// Number of panels shown side by side.
pub const MAX_SLOTS: usize = 3;

/// A resolved panel configuration. Empty fields mean "not selected".
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub provider: Option<ProviderKind>,
    pub model: String,
    pub endpoint: String,
    pub credential: Credential,
}

impl Slot {
    pub fn request(&self, prompt: String) -> GenerationRequest {
        GenerationRequest {
            endpoint: self.endpoint.clone(),
            credential: self.credential.clone(),
            model: self.model.clone(),
            prompt,
        }
    }

    pub fn model_info(&self) -> Option<&'static ModelInfo> {
        self.provider?.model(&self.model)
    }

    pub fn title(&self) -> String {
        match (self.provider, self.model.is_empty()) {
            (Some(p), false) => format!("{} / {}", p.label(), self.model),
            (Some(p), true) => p.label().to_string(),
            (None, _) => "(no provider)".to_string(),
        }
    }
}

pub struct Panel {
    pub slot: Slot,
    pub consumer: Arc<StreamConsumer>,
}

/// Up to [`MAX_SLOTS`] independent consumers driven together.
pub struct Comparison {
    panels: Vec<Panel>,
}

impl Comparison {
    pub fn new(http: &reqwest::Client, slots: Vec<Slot>) -> anyhow::Result<Self> {
        if slots.len() > MAX_SLOTS {
            anyhow::bail!("at most {MAX_SLOTS} slots are supported, got {}", slots.len());
        }
        let panels = slots
            .into_iter()
            .map(|slot| Panel {
                slot,
                consumer: Arc::new(StreamConsumer::new(http.clone())),
            })
            .collect();
        Ok(Self { panels })
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Start every panel on the same prompt and wait until all of them reach
    /// a terminal phase. Phases are returned in panel order.
    pub async fn start_all(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> anyhow::Result<Vec<Phase>> {
        let prompt = combine_prompt(system_prompt, user_prompt);
        tracing::debug!(panels = self.panels.len(), "starting all panels");

        let handles: Vec<_> = self
            .panels
            .iter()
            .map(|panel| {
                let consumer = panel.consumer.clone();
                let req = panel.slot.request(prompt.clone());
                tokio::spawn(async move { consumer.start(req).await })
            })
            .collect();

        let mut phases = Vec::with_capacity(handles.len());
        for (i, handle) in handles.into_iter().enumerate() {
            let phase = handle
                .await
                .with_context(|| format!("panel {} task failed", i + 1))?;
            phases.push(phase);
        }
        Ok(phases)
    }

    pub fn stop_all(&self) {
        for panel in &self.panels {
            panel.consumer.stop();
        }
    }

    pub fn clear_all(&self) {
        for panel in &self.panels {
            panel.consumer.clear();
        }
    }

    pub fn is_generating(&self) -> bool {
        self.panels
            .iter()
            .any(|p| p.consumer.snapshot().is_generating())
    }
}
