use crate::agent::{
    Coach, CoachSettings, ConversationHistory, ConversationTurn, DebounceBuffer, FragmentPacing,
    InteractionLock, Orchestrator, OrchestratorSettings, Outreach, ToolLoop,
};
use crate::channels::{Channel, MessageRouter, TelegramChannel};
use crate::config::{Config, ModelConfig};
use crate::platform::scheduler::{DailyTrigger, QuietHours, TickScheduler, TickSettings};
use crate::providers::{Provider, create_provider};
use crate::security::AccessPolicy;
use crate::state::StateStore;
use crate::store::{LocalStore, Workspace};
use crate::tools::workspace_tools;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Externally-facing collaborators. Production wires Telegram and the
/// configured backends; tests substitute fakes.
pub struct RuntimeParts {
    pub channel: Arc<dyn Channel>,
    pub orchestrator_provider: Arc<dyn Provider>,
    pub coach_provider: Arc<dyn Provider>,
}

impl RuntimeParts {
    pub fn from_config(config: &Config) -> Result<Self> {
        let bot_token = config
            .telegram
            .bot_token
            .clone()
            .context("TELEGRAM_BOT_TOKEN is not set")?;
        Ok(Self {
            channel: Arc::new(TelegramChannel::new(bot_token)),
            orchestrator_provider: provider_for(&config.orchestrator)?,
            coach_provider: provider_for(&config.coach)?,
        })
    }
}

fn provider_for(section: &ModelConfig) -> Result<Arc<dyn Provider>> {
    let kind = section.kind()?;
    Ok(Arc::from(create_provider(kind, section.api_key.as_deref())))
}

pub fn build_workspace(config: &Config) -> Arc<Workspace> {
    Arc::new(Workspace::new(
        AccessPolicy::from_config(&config.access, &config.workspace_root),
        Arc::new(LocalStore::new()),
    ))
}

/// Every long-lived component, wired once at startup.
pub struct SparkRuntime {
    pub workspace: Arc<Workspace>,
    pub state: Arc<StateStore>,
    pub lock: Arc<InteractionLock>,
    pub debounce: Arc<DebounceBuffer>,
    pub coach: Arc<Coach>,
    pub outreach: Arc<Outreach>,
    pub orchestrator: Arc<Orchestrator>,
    pub scheduler: Arc<TickScheduler>,
    pub router: Arc<MessageRouter>,
    pub triggers: Arc<Vec<DailyTrigger>>,
}

impl SparkRuntime {
    pub fn build(config: &Config, parts: RuntimeParts) -> Result<Self> {
        let correspondent = config
            .telegram
            .allowed_user
            .clone()
            .context("USER_TELEGRAM_ID is not set")?;

        let workspace = build_workspace(config);
        let state = Arc::new(StateStore::new(
            Arc::clone(&workspace),
            config.access.state_path.clone(),
        ));
        let lock = Arc::new(InteractionLock::new());
        let history = Arc::new(Mutex::new(ConversationHistory::new()));
        let registry = Arc::new(workspace_tools(&workspace));
        let pacing = FragmentPacing::new(
            Duration::from_millis(config.debounce.fragment_pause_min_ms),
            Duration::from_millis(config.debounce.fragment_pause_max_ms),
        );

        let coach_kind = config.coach.kind()?;
        let coach = Arc::new(Coach::new(
            parts.coach_provider,
            CoachSettings {
                model: config.coach.model_name()?,
                temperature: config.coach.temperature,
                style_boost: coach_kind.coach_style_boost(),
            },
            ToolLoop::new(Arc::clone(&registry), config.coach.max_tool_rounds),
            Arc::clone(&workspace),
            config.persona.clone(),
            Arc::clone(&history),
        ));

        let turn = ConversationTurn::new(
            Arc::clone(&coach),
            Arc::clone(&parts.channel),
            Arc::clone(&state),
            config.scheduler.min_deadline_minutes,
            pacing,
        );
        let debounce = Arc::new(DebounceBuffer::new(
            config.debounce.delay(),
            Arc::clone(&lock),
            Arc::new(turn),
        ));

        let outreach = Arc::new(Outreach::new(
            Arc::clone(&parts.channel),
            correspondent.clone(),
            Arc::clone(&history),
            Arc::clone(&state),
            pacing,
        ));

        let orchestrator_kind = config.orchestrator.kind()?;
        let orchestrator = Arc::new(Orchestrator::new(
            parts.orchestrator_provider,
            OrchestratorSettings {
                model: config.orchestrator.model_name()?,
                temperature: config.orchestrator.temperature,
                format_hint: orchestrator_kind.decision_format_hint(),
            },
            ToolLoop::new(registry, config.orchestrator.max_tool_rounds),
            config.persona.clone(),
            Arc::clone(&lock),
            history,
            Arc::clone(&outreach),
        ));

        let scheduler_config = &config.scheduler;
        let scheduler = Arc::new(TickScheduler::new(
            Arc::clone(&orchestrator),
            TickSettings {
                quiet: QuietHours::new(scheduler_config.quiet_start, scheduler_config.quiet_end),
                min_spacing: scheduler_config.min_spacing(),
                min_delay: Duration::from_secs(scheduler_config.tick_min_secs),
                max_delay: Duration::from_secs(scheduler_config.tick_max_secs),
            },
        ));

        let triggers = Arc::new(vec![
            DailyTrigger::new(
                "morning",
                &scheduler_config.morning_time,
                scheduler_config.morning_message.clone(),
            )?,
            DailyTrigger::new(
                "evening",
                &scheduler_config.evening_time,
                scheduler_config.evening_message.clone(),
            )?,
        ]);

        let router = Arc::new(MessageRouter::new(
            correspondent,
            parts.channel,
            Arc::clone(&debounce),
            Arc::clone(&coach),
            Arc::clone(&workspace),
        ));

        tracing::info!(
            orchestrator = %orchestrator_kind,
            coach = %coach_kind,
            quiet_start = scheduler_config.quiet_start,
            quiet_end = scheduler_config.quiet_end,
            test_mode = scheduler_config.test_mode,
            "runtime assembled"
        );

        Ok(Self {
            workspace,
            state,
            lock,
            debounce,
            coach,
            outreach,
            orchestrator,
            scheduler,
            router,
            triggers,
        })
    }
}
