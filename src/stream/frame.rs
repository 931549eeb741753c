use serde::Deserialize;

/// Literal payload that ends a chat-completions stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded line of a streaming chat-completions response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Content of the first choice's delta. Empty for frames that only carry
    /// role or finish metadata.
    ContentDelta { text: String },
    /// The `[DONE]` sentinel.
    StreamEnd,
    /// A line that is not a valid frame. Kept verbatim for logging.
    Malformed { raw_line: String },
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Parse one line. Returns `None` for lines that carry nothing: blanks and
/// SSE comments (`: keep-alive`).
pub fn parse_line(line: &str) -> Option<Frame> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.trim(),
        None => trimmed,
    };
    if payload.is_empty() {
        return None;
    }
    if payload == DONE_SENTINEL {
        return Some(Frame::StreamEnd);
    }

    match serde_json::from_str::<ChunkPayload>(payload) {
        Ok(chunk) => {
            let text = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta)
                .and_then(|d| d.content)
                .unwrap_or_default();
            Some(Frame::ContentDelta { text })
        }
        Err(_) => Some(Frame::Malformed {
            raw_line: line.to_string(),
        }),
    }
}
