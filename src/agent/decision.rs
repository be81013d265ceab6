//! Pulls the trailing `{"should_message": ...}` object out of free-form
//! model output.

use serde::Deserialize;

const SEND_KEY: &str = "\"should_message\"";

/// Outcome of an orchestrator turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub should_message: bool,
    /// The model's read on the correspondent's state
    pub reason: String,
    pub message: Option<String>,
}

impl Decision {
    pub fn abstain(reason: impl Into<String>) -> Self {
        Self {
            should_message: false,
            reason: reason.into(),
            message: None,
        }
    }

    /// Message to send, if this decision sends one.
    pub fn outgoing(&self) -> Option<&str> {
        if !self.should_message {
            return None;
        }
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("no decision object in response")]
    NotFound,
    #[error("malformed decision object: {0}")]
    Malformed(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageBody {
    One(String),
    Lines(Vec<String>),
}

#[derive(Deserialize)]
struct RawDecision {
    #[serde(default)]
    should_message: bool,
    #[serde(default, alias = "hypothesis")]
    reason: Option<String>,
    #[serde(default)]
    message: Option<MessageBody>,
}

/// Extract the decision object. Pure; callers decide how to log a failure.
pub fn extract_decision(text: &str) -> Result<Decision, DecisionError> {
    let object = fenced_object(text)
        .or_else(|| keyed_object(text))
        .ok_or(DecisionError::NotFound)?;

    let raw: RawDecision =
        serde_json::from_str(object).map_err(|e| DecisionError::Malformed(e.to_string()))?;

    let message = raw.message.map(|body| match body {
        MessageBody::One(text) => text,
        MessageBody::Lines(lines) => lines.join("\n"),
    });

    Ok(Decision {
        should_message: raw.should_message,
        reason: raw.reason.unwrap_or_default(),
        message,
    })
}

/// Like [`extract_decision`], but every failure becomes an abstention.
pub fn resolve_decision(text: &str) -> Decision {
    match extract_decision(text) {
        Ok(decision) => decision,
        Err(error) => {
            let preview: String = text.chars().take(100).collect();
            tracing::warn!(%error, preview, "orchestrator decision unusable, abstaining");
            Decision::abstain(error.to_string())
        }
    }
}

/// First object inside a ```json fence.
fn fenced_object(text: &str) -> Option<&str> {
    let fence = text.find("```json")?;
    let start = fence + text[fence..].find('{')?;
    balanced_object(text, start)
}

/// First `{` whose body reaches the send key before any other brace.
fn keyed_object(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let rest = &text[start + 1..];
        if let Some(key_at) = rest.find(SEND_KEY)
            && !rest[..key_at].contains(['{', '}'])
        {
            return balanced_object(text, start);
        }
        search_from = start + 1;
    }
    None
}

/// Slice from the `{` at `start` to its matching `}`. Braces inside JSON
/// strings are ignored.
fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
