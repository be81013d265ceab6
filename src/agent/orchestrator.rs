use super::context::{RECENT_LINES, build_tick_context, tick_user_message};
use super::decision::resolve_decision;
use super::history::ConversationHistory;
use super::lock::InteractionLock;
use super::outreach::Outreach;
use super::prompts::orchestrator_prompt;
use super::tool_loop::{LoopStopReason, ToolLoop, ToolLoopRun};
use crate::config::PersonaConfig;
use crate::providers::{Provider, ProviderMessage};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::Mutex;

/// What a decision turn ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    Sent,
    /// A conversation started while the model was thinking
    Preempted,
    Abstained(String),
}

pub struct OrchestratorSettings {
    pub model: String,
    pub temperature: f64,
    /// Output-format rule for backends that need one
    pub format_hint: &'static str,
}

/// Decides whether to reach out. Guards that need no model call live in the
/// scheduler; this runs only once they pass.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    settings: OrchestratorSettings,
    tool_loop: ToolLoop,
    persona: PersonaConfig,
    lock: Arc<InteractionLock>,
    history: Arc<Mutex<ConversationHistory>>,
    outreach: Arc<Outreach>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        settings: OrchestratorSettings,
        tool_loop: ToolLoop,
        persona: PersonaConfig,
        lock: Arc<InteractionLock>,
        history: Arc<Mutex<ConversationHistory>>,
        outreach: Arc<Outreach>,
    ) -> Self {
        Self {
            provider,
            settings,
            tool_loop,
            persona,
            lock,
            history,
            outreach,
        }
    }

    pub fn lock(&self) -> &Arc<InteractionLock> {
        &self.lock
    }

    pub fn outreach(&self) -> &Arc<Outreach> {
        &self.outreach
    }

    /// Run one decision turn and send if the model says so.
    pub async fn decide_and_send(&self, now: DateTime<Local>) -> anyhow::Result<DecisionOutcome> {
        let state = self.outreach.state().reload().await;
        let recent = {
            let history = self.history.lock().await;
            history.recent(RECENT_LINES).to_vec()
        };
        let context = build_tick_context(&self.persona, &recent, &state, now);
        let system_prompt = orchestrator_prompt(&self.persona.style, self.settings.format_hint);

        let result = self
            .tool_loop
            .run(ToolLoopRun {
                provider: self.provider.as_ref(),
                system_prompt: &system_prompt,
                messages: vec![ProviderMessage::user(tick_user_message(&context))],
                model: &self.settings.model,
                temperature: self.settings.temperature,
            })
            .await?;

        if result.stop_reason == LoopStopReason::MaxRounds {
            tracing::warn!(rounds = result.rounds, "decision turn hit the round cap, abstaining");
            return Ok(DecisionOutcome::Abstained("round cap reached".into()));
        }

        tracing::info!(text = %result.final_text, "orchestrator response");
        let decision = resolve_decision(&result.final_text);
        let Some(message) = decision.outgoing() else {
            tracing::info!(reason = %decision.reason, "decided not to message");
            return Ok(DecisionOutcome::Abstained(decision.reason));
        };

        if self.lock.is_held() {
            tracing::info!("conversation started while deciding, dropping message");
            return Ok(DecisionOutcome::Preempted);
        }

        self.outreach.send_proactive(message, now).await?;
        Ok(DecisionOutcome::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::fragments::FragmentPacing;
    use crate::agent::testing::{RecordingChannel, ScriptedProvider};
    use crate::providers::{ProviderFuture, ProviderResponse};
    use crate::state::StateStore;
    use crate::store::test_workspace;
    use crate::tools::{ToolSpec, workspace_tools};
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        orchestrator: Orchestrator,
        channel: Arc<RecordingChannel>,
    }

    fn fixture(tmp: &TempDir, provider: Arc<dyn Provider>, lock: Arc<InteractionLock>) -> Fixture {
        let workspace = test_workspace(tmp.path());
        let history = Arc::new(Mutex::new(ConversationHistory::new()));
        let channel = Arc::new(RecordingChannel::default());
        let outreach = Arc::new(Outreach::new(
            Arc::clone(&channel) as Arc<dyn crate::channels::Channel>,
            "42",
            Arc::clone(&history),
            Arc::new(StateStore::new(
                Arc::clone(&workspace),
                "memory/spark/state.json",
            )),
            FragmentPacing::immediate(),
        ));
        let orchestrator = Orchestrator::new(
            provider,
            OrchestratorSettings {
                model: "m".into(),
                temperature: 0.7,
                format_hint: "",
            },
            ToolLoop::new(Arc::new(workspace_tools(&workspace)), 2),
            PersonaConfig::default(),
            lock,
            history,
            outreach,
        );
        Fixture {
            orchestrator,
            channel,
        }
    }

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn send_decision_goes_out_and_is_counted() {
        let tmp = TempDir::new().expect("tempdir");
        let provider = Arc::new(ScriptedProvider::new(vec![ProviderResponse::text_only(
            "they {probably} ate. {\"should_message\": true, \"hypothesis\": \"slacking\", \"message\": \"go eat\"}",
        )]));
        let fx = fixture(&tmp, Arc::clone(&provider) as Arc<dyn Provider>, Arc::new(InteractionLock::new()));

        let outcome = fx.orchestrator.decide_and_send(noon()).await.unwrap();

        assert_eq!(outcome, DecisionOutcome::Sent);
        assert_eq!(fx.channel.sent_texts(), vec!["go eat"]);
        assert_eq!(fx.orchestrator.outreach().state().reload().await.unanswered_count, 1);
        assert!(provider.system_prompts()[0].contains("should_message"));
    }

    #[tokio::test]
    async fn unparseable_decision_abstains() {
        let tmp = TempDir::new().expect("tempdir");
        let provider = Arc::new(ScriptedProvider::new(vec![ProviderResponse::text_only(
            "I'd rather not say.",
        )]));
        let fx = fixture(&tmp, provider, Arc::new(InteractionLock::new()));

        let outcome = fx.orchestrator.decide_and_send(noon()).await.unwrap();
        assert!(matches!(outcome, DecisionOutcome::Abstained(_)));
        assert!(fx.channel.sent_texts().is_empty());
    }

    #[tokio::test]
    async fn round_cap_abstains_without_sending() {
        let tmp = TempDir::new().expect("tempdir");
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_use("a", "current_time", json!({})),
            ScriptedProvider::tool_use("b", "current_time", json!({})),
        ]));
        let fx = fixture(&tmp, provider, Arc::new(InteractionLock::new()));

        let outcome = fx.orchestrator.decide_and_send(noon()).await.unwrap();
        assert_eq!(outcome, DecisionOutcome::Abstained("round cap reached".into()));
        assert!(fx.channel.sent_texts().is_empty());
    }

    /// Simulates a reply arriving while the model is thinking.
    struct ReplyArrivesProvider {
        lock: Arc<InteractionLock>,
        inner: ScriptedProvider,
    }

    impl Provider for ReplyArrivesProvider {
        fn name(&self) -> &str {
            "reply-arrives"
        }

        fn chat_with_tools<'a>(
            &'a self,
            system_prompt: Option<&'a str>,
            messages: &'a [ProviderMessage],
            tools: &'a [ToolSpec],
            model: &'a str,
            temperature: f64,
        ) -> ProviderFuture<'a> {
            self.lock.acquire("42");
            self.inner
                .chat_with_tools(system_prompt, messages, tools, model, temperature)
        }
    }

    #[tokio::test]
    async fn lock_taken_during_thinking_preempts_send() {
        let tmp = TempDir::new().expect("tempdir");
        let lock = Arc::new(InteractionLock::new());
        let provider = Arc::new(ReplyArrivesProvider {
            lock: Arc::clone(&lock),
            inner: ScriptedProvider::new(vec![ProviderResponse::text_only(
                r#"{"should_message": true, "reason": "idle", "message": "hey"}"#,
            )]),
        });
        let fx = fixture(&tmp, provider, lock);

        let outcome = fx.orchestrator.decide_and_send(noon()).await.unwrap();
        assert_eq!(outcome, DecisionOutcome::Preempted);
        assert!(fx.channel.sent_texts().is_empty());
        assert_eq!(fx.orchestrator.outreach().state().reload().await.unanswered_count, 0);
    }
}
