use crate::stream::ConfigField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API key or bearer token. `Debug` never prints the value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for the `Authorization` header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

/// Everything one attempt needs. Immutable once handed to
/// [`StreamConsumer::start`](crate::stream::StreamConsumer::start).
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub endpoint: String,
    pub credential: Credential,
    pub model: String,

    /// System and user prompt, already combined.
    pub prompt: String,
}

impl GenerationRequest {
    /// Check the fields that must be non-empty before anything is sent.
    pub fn validate(&self) -> Result<(), ConfigField> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigField::Endpoint);
        }
        if self.credential.is_empty() {
            return Err(ConfigField::Credential);
        }
        if self.model.trim().is_empty() {
            return Err(ConfigField::Model);
        }
        Ok(())
    }
}

/// Join the system and user prompt the way every panel sends them.
pub fn combine_prompt(system: &str, user: &str) -> String {
    format!("{system}\n{user}")
}
