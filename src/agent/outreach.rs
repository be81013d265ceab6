use super::fragments::{FragmentPacing, send_fragments, split_fragments};
use super::history::ConversationHistory;
use crate::channels::Channel;
use crate::providers::MessageRole;
use crate::state::StateStore;
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Proactive sends to the correspondent, shared by the tick path and the
/// fixed daily triggers.
pub struct Outreach {
    channel: Arc<dyn Channel>,
    recipient: String,
    history: Arc<Mutex<ConversationHistory>>,
    state: Arc<StateStore>,
    pacing: FragmentPacing,
}

impl Outreach {
    pub fn new(
        channel: Arc<dyn Channel>,
        recipient: impl Into<String>,
        history: Arc<Mutex<ConversationHistory>>,
        state: Arc<StateStore>,
        pacing: FragmentPacing,
    ) -> Self {
        Self {
            channel,
            recipient: recipient.into(),
            history,
            state,
            pacing,
        }
    }

    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    /// Send, then log to history, then count the send. A transport failure
    /// returns early so no send is recorded that never arrived.
    pub async fn send_proactive(&self, text: &str, now: DateTime<Local>) -> anyhow::Result<()> {
        let fragments = split_fragments(text);
        if fragments.is_empty() {
            tracing::debug!("nothing to send");
            return Ok(());
        }

        send_fragments(self.channel.as_ref(), &self.recipient, &fragments, self.pacing)
            .await
            .inspect_err(|error| tracing::error!(%error, "proactive send failed"))?;

        {
            let mut history = self.history.lock().await;
            history.reset_if_new_day(now.date_naive());
            history.push(
                MessageRole::Assistant,
                format!("[{}] {text}", now.format("%H:%M")),
            );
        }

        self.state
            .record_proactive_send(now.with_timezone(&Utc))
            .await?;
        tracing::info!(fragments = fragments.len(), "proactive message sent");
        Ok(())
    }
}
