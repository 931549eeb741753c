use std::fmt;

/// Field of a [`GenerationRequest`](crate::provider::GenerationRequest) that is
/// empty or unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Endpoint,
    Credential,
    Model,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfigField::Endpoint => "endpoint",
            ConfigField::Credential => "API key",
            ConfigField::Model => "model",
        };
        f.write_str(s)
    }
}

/// Errors produced while running one generation attempt.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid configuration: {0} is missing or malformed")]
    InvalidConfiguration(ConfigField),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("response carried no body")]
    EmptyResponseBody,

    #[error("malformed frame: {line}")]
    MalformedFrame { line: String },

    #[error("request cancelled")]
    Cancelled,
}

impl StreamError {
    /// Classify an attempt-ending error for the published state.
    ///
    /// Returns `None` for outcomes that are not failures (cancellation) or that
    /// never end an attempt (malformed frames).
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            StreamError::InvalidConfiguration(field) => {
                Some(FailureKind::InvalidConfiguration(*field))
            }
            StreamError::Transport(_) | StreamError::Status { .. } => Some(FailureKind::Transport),
            StreamError::EmptyResponseBody => Some(FailureKind::EmptyResponseBody),
            StreamError::MalformedFrame { .. } | StreamError::Cancelled => None,
        }
    }
}

/// Why an attempt ended in `Failed`. Carries no cause text so it can be
/// rendered without leaking transport details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidConfiguration(ConfigField),
    Transport,
    EmptyResponseBody,
}
