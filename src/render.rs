//! Plain-text status and debug lines for one panel.

use crate::app::Slot;
use crate::stream::{FailureKind, Phase, StreamSnapshot};

/// Status lines for a panel, most important condition first.
pub fn status_lines(slot: &Slot, snap: &StreamSnapshot) -> Vec<String> {
    if slot.provider.is_none() {
        return vec!["Provider Not Selected ...".to_string()];
    }
    if slot.credential.is_empty() {
        return vec!["API Key Not Set ...".to_string()];
    }
    if slot.model.trim().is_empty() {
        return vec!["Model Not Selected ...".to_string()];
    }
    if snap.is_generating() {
        return vec!["Generating response ...".to_string()];
    }

    let headline = match snap.phase {
        Phase::Idle | Phase::Requesting | Phase::Streaming => return Vec::new(),
        Phase::Completed => "Response Complete...".to_string(),
        Phase::Aborted => "Response Aborted...".to_string(),
        Phase::Failed(FailureKind::InvalidConfiguration(field)) => {
            return vec![format!("Invalid configuration: {field} is missing or malformed ...")];
        }
        Phase::Failed(_) => "Response Failed...".to_string(),
    };

    let mut lines = vec![headline];
    if !snap.elapsed.is_zero() {
        lines.push(format!(
            "{} tokens generated in {:.2}s",
            snap.token_count,
            snap.elapsed.as_secs_f64()
        ));
        if let Some(rate) = snap.tokens_per_second() {
            lines.push(format!("{rate:.2} tokens per second."));
        }
    }
    if snap.malformed_frames > 0 {
        lines.push(format!("{} malformed frames skipped.", snap.malformed_frames));
    }
    lines
}

/// Provider, model details and the combined prompt, shown in debug mode.
pub fn debug_lines(slot: &Slot, prompt: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "provider: {}",
        slot.provider.map(|p| p.label()).unwrap_or("-")
    )];
    if let Some(info) = slot.model_info() {
        lines.push(format!("max tokens: {}", info.max_tokens));
        lines.push(format!("training data: {}", info.training_data));
    }
    if !slot.endpoint.is_empty() {
        lines.push(format!("url: {}", slot.endpoint));
    }
    lines.push(format!("combined prompt: \"{prompt}\""));
    lines
}
