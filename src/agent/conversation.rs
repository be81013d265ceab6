use super::coach::Coach;
use super::debounce::{FlushedBatch, TurnFuture, TurnHandler};
use super::duration::parse_duration_minutes;
use super::fragments::{FragmentPacing, send_fragments, split_fragments};
use crate::channels::Channel;
use crate::state::StateStore;
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;

/// Source of "now" for a turn.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Local::now)
}

/// The reply path: one flushed batch in, one coach reply out.
pub struct ConversationTurn {
    coach: Arc<Coach>,
    channel: Arc<dyn Channel>,
    state: Arc<StateStore>,
    /// Shortest announced work window that becomes a deadline
    min_deadline_minutes: u32,
    pacing: FragmentPacing,
    clock: Clock,
}

impl ConversationTurn {
    pub fn new(
        coach: Arc<Coach>,
        channel: Arc<dyn Channel>,
        state: Arc<StateStore>,
        min_deadline_minutes: u32,
        pacing: FragmentPacing,
    ) -> Self {
        Self {
            coach,
            channel,
            state,
            min_deadline_minutes,
            pacing,
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    async fn note_deadline(&self, text: &str, now: DateTime<Utc>) {
        let Some(minutes) = parse_duration_minutes(text) else {
            return;
        };
        if minutes < self.min_deadline_minutes {
            tracing::debug!(minutes, "duration too short for a deadline");
            return;
        }
        if let Err(error) = self.state.set_working_deadline(now, minutes).await {
            tracing::warn!(%error, "could not set working deadline");
        }
    }

    async fn run(&self, batch: FlushedBatch) -> anyhow::Result<()> {
        let now = (self.clock)();
        let text = batch.combined_text();
        tracing::info!(
            correspondent = %batch.correspondent,
            messages = batch.messages.len(),
            "processing batch"
        );

        self.note_deadline(&text, now.with_timezone(&Utc)).await;

        if let Err(error) = self.channel.send_typing(&batch.reply_to).await {
            tracing::debug!(%error, "typing indicator failed");
        }

        let reply = match self.coach.chat(&text, now).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::error!(%error, "coach turn failed");
                self.channel
                    .send(&format!("Error: {error}"), &batch.reply_to)
                    .await?;
                return Ok(());
            }
        };

        let fragments = split_fragments(&reply);
        send_fragments(self.channel.as_ref(), &batch.reply_to, &fragments, self.pacing).await?;

        self.state
            .record_interaction(now.with_timezone(&Utc), None)
            .await?;
        Ok(())
    }
}

impl TurnHandler for ConversationTurn {
    fn handle_turn(&self, batch: FlushedBatch) -> TurnFuture<'_> {
        Box::pin(self.run(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::coach::CoachSettings;
    use crate::agent::history::ConversationHistory;
    use crate::agent::testing::{RecordingChannel, ScriptedProvider};
    use crate::agent::tool_loop::ToolLoop;
    use crate::config::PersonaConfig;
    use crate::providers::ProviderResponse;
    use crate::store::test_workspace;
    use crate::tools::workspace_tools;
    use chrono::TimeZone;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    struct Fixture {
        turn: ConversationTurn,
        channel: Arc<RecordingChannel>,
        state: Arc<StateStore>,
    }

    fn fixture(tmp: &TempDir, script: Vec<ProviderResponse>, now: DateTime<Local>) -> Fixture {
        let workspace = test_workspace(tmp.path());
        let coach = Coach::new(
            Arc::new(ScriptedProvider::new(script)),
            CoachSettings {
                model: "m".into(),
                temperature: 0.5,
                style_boost: "",
            },
            ToolLoop::new(Arc::new(workspace_tools(&workspace)), 3),
            Arc::clone(&workspace),
            PersonaConfig::default(),
            Arc::new(Mutex::new(ConversationHistory::new())),
        );
        let channel = Arc::new(RecordingChannel::default());
        let state = Arc::new(StateStore::new(workspace, "memory/spark/state.json"));
        let turn = ConversationTurn::new(
            Arc::new(coach),
            Arc::clone(&channel) as Arc<dyn Channel>,
            Arc::clone(&state),
            5,
            FragmentPacing::immediate(),
        )
        .with_clock(Arc::new(move || now));
        Fixture {
            turn,
            channel,
            state,
        }
    }

    fn batch(messages: &[&str]) -> FlushedBatch {
        FlushedBatch {
            correspondent: "42".into(),
            reply_to: "42".into(),
            messages: messages.iter().map(ToString::to_string).collect(),
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn reply_is_fragmented_and_interaction_recorded() {
        let tmp = TempDir::new().expect("tempdir");
        let fx = fixture(
            &tmp,
            vec![ProviderResponse::text_only("nice. now the essay")],
            now(),
        );
        fx.state.record_proactive_send(now().with_timezone(&Utc)).await.unwrap();

        fx.turn.handle_turn(batch(&["done with dishes"])).await.unwrap();

        assert_eq!(fx.channel.sent_texts(), vec!["nice", "now the essay"]);
        assert!(fx.channel.typing_count() >= 1);
        let state = fx.state.reload().await;
        assert_eq!(state.unanswered_count, 0);
        assert_eq!(state.last_interaction, Some(now().with_timezone(&Utc)));
    }

    #[tokio::test]
    async fn announced_duration_sets_deadline() {
        let tmp = TempDir::new().expect("tempdir");
        let fx = fixture(&tmp, vec![ProviderResponse::text_only("go")], now());

        fx.turn
            .handle_turn(batch(&["ok", "doing the essay for 30 min"]))
            .await
            .unwrap();

        let until = fx.state.reload().await.working_until;
        assert_eq!(
            until,
            Some(now().with_timezone(&Utc) + chrono::Duration::minutes(30))
        );
    }

    #[tokio::test]
    async fn short_duration_is_ignored() {
        let tmp = TempDir::new().expect("tempdir");
        let fx = fixture(&tmp, vec![ProviderResponse::text_only("k")], now());

        fx.turn.handle_turn(batch(&["give me 2 min"])).await.unwrap();
        assert!(fx.state.reload().await.working_until.is_none());
    }

    #[tokio::test]
    async fn coach_failure_reports_error_without_recording_interaction() {
        let tmp = TempDir::new().expect("tempdir");
        let fx = fixture(&tmp, vec![], now());

        fx.turn.handle_turn(batch(&["hello?"])).await.unwrap();

        let sent = fx.channel.sent_texts();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("Error: "));
        assert!(fx.state.reload().await.last_interaction.is_none());
    }
}
