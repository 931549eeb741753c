use crate::app::{Slot, MAX_SLOTS};
use crate::provider::{Credential, ProviderKind};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// System prompt used when none is given on the command line.
    pub system_prompt: Option<String>,

    /// Print provider, model details and the combined prompt per panel.
    #[serde(default)]
    pub debug: bool,

    /// Panels, at most three.
    #[serde(default, rename = "slot")]
    pub slots: Vec<SlotConfig>,
}

/// One panel as written in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SlotConfig {
    /// Provider identifier (e.g. "openai").
    pub provider: Option<String>,
    pub model: Option<String>,

    /// Overrides the provider's or the model's endpoint.
    pub endpoint: Option<String>,

    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub api_key: Option<Credential>,
}

impl Config {
    /// Load config if the file exists, otherwise return Ok(None).
    pub fn load_optional(path: impl AsRef<Path>) -> anyhow::Result<Option<Self>> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e))
                    .with_context(|| format!("failed to read config: {}", path.display()))
            }
        };

        let s = String::from_utf8(bytes).context("config is not valid UTF-8")?;
        let cfg: Config = toml::from_str(&s)
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;
        Ok(Some(cfg))
    }
}

/// Resolve configured panels into slots, reading API keys through `env`.
pub fn resolve_slots(
    slots: &[SlotConfig],
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Vec<Slot>> {
    if slots.len() > MAX_SLOTS {
        anyhow::bail!("{} slots configured, at most {MAX_SLOTS} are supported", slots.len());
    }
    slots
        .iter()
        .enumerate()
        .map(|(i, s)| s.resolve(&env).with_context(|| format!("slot {}", i + 1)))
        .collect()
}

impl SlotConfig {
    pub fn resolve(&self, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Slot> {
        let provider = match self.provider.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(id) => {
                let Some(p) = ProviderKind::from_id(id) else {
                    anyhow::bail!("unknown provider: {id}");
                };
                if !p.is_implemented() {
                    anyhow::bail!("provider {} is not implemented yet", p.label());
                }
                Some(p)
            }
        };

        let model = self.model.clone().unwrap_or_default();

        let endpoint = self
            .endpoint
            .clone()
            .or_else(|| {
                let p = provider?;
                p.model(&model)
                    .map(|m| m.endpoint)
                    .or_else(|| p.default_endpoint())
                    .map(str::to_string)
            })
            .unwrap_or_default();

        let credential = self
            .api_key_env
            .as_deref()
            .and_then(&env)
            .map(Credential::new)
            .or_else(|| self.api_key.clone())
            .or_else(|| provider.and_then(|p| p.api_key_env()).and_then(&env).map(Credential::new))
            .unwrap_or_default();

        Ok(Slot {
            provider,
            model,
            endpoint,
            credential,
        })
    }
}
