use super::context::profile_path;
use super::history::ConversationHistory;
use super::prompts::FALLBACK_COACH_PROMPT;
use super::tool_loop::{ToolLoop, ToolLoopRun};
use crate::config::PersonaConfig;
use crate::providers::{MessageRole, Provider};
use crate::store::Workspace;
use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio::sync::{Mutex, OnceCell};

pub const PROTOCOL_PATH: &str = "memory/spark/protocol.md";
pub const LEARNED_PATH: &str = "memory/spark/learned.md";

/// Reply used when the model produced nothing sendable
pub const EMPTY_REPLY: &str = "hold on";

/// Replies longer than this many lines are chain-of-thought leaking through
const MAX_REPLY_LINES: usize = 6;
const KEPT_REPLY_LINES: usize = 4;

const ACKNOWLEDGMENT_WORDS: [&str; 5] = ["updated", "noted", "saved", "recorded", "logged"];

static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d{1,2}:\d{2}\]\s*").expect("hardcoded regex"));

pub struct CoachSettings {
    pub model: String,
    pub temperature: f64,
    /// Provider-specific rules appended to the system prompt
    pub style_boost: &'static str,
}

/// The conversational agent behind every reply.
pub struct Coach {
    provider: Arc<dyn Provider>,
    settings: CoachSettings,
    tool_loop: ToolLoop,
    workspace: Arc<Workspace>,
    persona: PersonaConfig,
    history: Arc<Mutex<ConversationHistory>>,
    /// Persona, protocol and profile; loaded once
    base_prompt: OnceCell<String>,
}

impl Coach {
    pub fn new(
        provider: Arc<dyn Provider>,
        settings: CoachSettings,
        tool_loop: ToolLoop,
        workspace: Arc<Workspace>,
        persona: PersonaConfig,
        history: Arc<Mutex<ConversationHistory>>,
    ) -> Self {
        Self {
            provider,
            settings,
            tool_loop,
            workspace,
            persona,
            history,
            base_prompt: OnceCell::new(),
        }
    }

    pub fn history(&self) -> &Arc<Mutex<ConversationHistory>> {
        &self.history
    }

    /// Clears the shared history; returns how many entries were dropped.
    pub async fn clear_history(&self) -> usize {
        let cleared = self.history.lock().await.clear();
        tracing::info!(cleared, "conversation history cleared");
        cleared
    }

    async fn load_base_prompt(&self) -> String {
        let mut parts = vec![format!("# User\n{}", self.persona.summary())];

        match self.workspace.read_text(PROTOCOL_PATH).await {
            Ok(protocol) => parts.push(protocol),
            Err(error) => {
                tracing::warn!(%error, "protocol not readable, using fallback prompt");
                parts.push(FALLBACK_COACH_PROMPT.to_string());
            }
        }

        if let Ok(profile) = self.workspace.read_text(&profile_path(&self.persona)).await {
            parts.push(format!("\n---\n\n# User Profile\n\n{profile}"));
        }

        let prompt = parts.join("\n");
        tracing::info!(chars = prompt.len(), "loaded base system prompt");
        prompt
    }

    /// Base prompt plus learned preferences, which reload every turn.
    pub async fn system_prompt(&self) -> String {
        let mut prompt = self
            .base_prompt
            .get_or_init(|| self.load_base_prompt())
            .await
            .clone();
        if let Ok(learned) = self.workspace.read_text(LEARNED_PATH).await {
            prompt.push_str("\n---\n\n# Learned Preferences\n\n");
            prompt.push_str(&learned);
        }
        prompt.push_str(self.settings.style_boost);
        prompt
    }

    /// Run one user turn and return the reply text.
    pub async fn chat(&self, text: &str, now: DateTime<Local>) -> anyhow::Result<String> {
        let system_prompt = self.system_prompt().await;

        let messages = {
            let mut history = self.history.lock().await;
            history.reset_if_new_day(now.date_naive());
            history.push(
                MessageRole::User,
                format!("[{}] {text}", now.format("%H:%M %A %Y-%m-%d")),
            );
            tracing::info!(history = history.len(), "calling coach");
            history.provider_messages()
        };

        let result = self
            .tool_loop
            .run(ToolLoopRun {
                provider: self.provider.as_ref(),
                system_prompt: &system_prompt,
                messages,
                model: &self.settings.model,
                temperature: self.settings.temperature,
            })
            .await?;

        let Some(reply) = postprocess(&result.final_text, result.called("workspace_write")) else {
            tracing::warn!("empty coach response, not saving to history");
            return Ok(EMPTY_REPLY.to_string());
        };

        self.history.lock().await.push(
            MessageRole::Assistant,
            format!("[{}] {reply}", now.format("%H:%M")),
        );
        Ok(reply)
    }
}

/// Clean a raw reply: drop `[HH:MM]` stamps the model copied from history and
/// cut runaway reasoning down to its last lines. `None` when nothing is left.
pub fn postprocess(text: &str, wrote: bool) -> Option<String> {
    let text = TIMESTAMP.replace_all(text, "");

    let lower = text.to_lowercase();
    if !wrote && ACKNOWLEDGMENT_WORDS.iter().any(|word| lower.contains(word)) {
        let preview: String = text.chars().take(100).collect();
        tracing::warn!(preview, "reply claims a write but workspace_write was not called");
    }

    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let text = if lines.len() > MAX_REPLY_LINES {
        tracing::info!(lines = lines.len(), "truncating verbose response");
        lines[lines.len() - KEPT_REPLY_LINES..].join("\n")
    } else {
        text.trim().to_string()
    };

    (!text.is_empty()).then_some(text)
}
