//! Proactive triggers: the randomized tick and the fixed daily messages.

use crate::agent::{Clock, DecisionOutcome, Orchestrator, Outreach, system_clock};
use crate::state::DeadlineStatus;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveTime, TimeDelta, Timelike, Utc};
use cron::Schedule;
use rand::Rng;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Parse a 24h `HH:MM` clock time into `(hour, minute)`.
pub fn parse_clock_time(raw: &str) -> Result<(u32, u32)> {
    let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .with_context(|| format!("invalid clock time '{raw}' (expected HH:MM)"))?;
    Ok((time.hour(), time.minute()))
}

/// `[start, end)` in local hours; wraps midnight when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    start: u32,
    end: u32,
}

impl QuietHours {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(self, hour: u32) -> bool {
        if self.start <= self.end {
            (self.start..self.end).contains(&hour)
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

/// Why a tick ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    QuietHours,
    ConversationActive,
    TooSoon,
    DeadlineActive(DateTime<Utc>),
    Decided(DecisionOutcome),
    Failed(String),
}

pub struct TickSettings {
    pub quiet: QuietHours,
    /// `None` disables the spacing floor
    pub min_spacing: Option<Duration>,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

/// Randomized-interval trigger. Cheap guards run here; the model is only
/// called once every guard passes.
pub struct TickScheduler {
    orchestrator: Arc<Orchestrator>,
    settings: TickSettings,
    clock: Clock,
}

impl TickScheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, settings: TickSettings) -> Self {
        Self {
            orchestrator,
            settings,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Uniform in `[min_delay, max_delay]`.
    pub fn next_delay(&self) -> Duration {
        let (min, max) = (self.settings.min_delay, self.settings.max_delay);
        if min >= max {
            return min;
        }
        rand::rng().random_range(min..=max)
    }

    pub async fn tick(&self, now: DateTime<Local>) -> TickOutcome {
        let tick_id = uuid::Uuid::new_v4();

        if self.settings.quiet.contains(now.hour()) {
            tracing::info!(%tick_id, hour = now.hour(), "tick skipped: quiet hours");
            return TickOutcome::QuietHours;
        }

        if self.orchestrator.lock().is_held() {
            tracing::info!(%tick_id, "tick skipped: conversation in progress");
            return TickOutcome::ConversationActive;
        }

        let state_store = self.orchestrator.outreach().state();
        let state = state_store.reload().await;
        let now_utc = now.with_timezone(&Utc);

        if let Some(spacing) = self.settings.min_spacing
            && let Some(since) = state.since_last_spark(now_utc)
            && since < TimeDelta::from_std(spacing).unwrap_or(TimeDelta::MAX)
        {
            tracing::info!(
                %tick_id,
                since_secs = since.num_seconds(),
                "tick skipped: last proactive message too recent"
            );
            return TickOutcome::TooSoon;
        }

        match state.deadline_status(now_utc) {
            DeadlineStatus::Active(until) => {
                tracing::info!(%tick_id, %until, "tick skipped: working until deadline");
                return TickOutcome::DeadlineActive(until);
            }
            DeadlineStatus::Expired(until) => {
                tracing::info!(%tick_id, %until, "working deadline passed, clearing");
                if let Err(error) = state_store.clear_working_deadline().await {
                    tracing::warn!(%tick_id, %error, "could not clear working deadline");
                }
            }
            DeadlineStatus::None => {}
        }

        tracing::info!(%tick_id, "running orchestrator");
        match self.orchestrator.decide_and_send(now).await {
            Ok(outcome) => {
                tracing::info!(%tick_id, ?outcome, "tick complete");
                TickOutcome::Decided(outcome)
            }
            Err(error) => {
                tracing::warn!(%tick_id, %error, "tick failed");
                TickOutcome::Failed(error.to_string())
            }
        }
    }

    /// Sleep a fresh random delay, tick, repeat. Every outcome re-arms.
    pub async fn run(&self) -> Result<()> {
        loop {
            let delay = self.next_delay();
            tracing::info!(delay_secs = delay.as_secs(), "next tick scheduled");
            tokio::time::sleep(delay).await;
            self.tick((self.clock)()).await;
        }
    }
}

/// A canned message sent every day at a fixed local time, no guards.
pub struct DailyTrigger {
    name: &'static str,
    schedule: Schedule,
    message: String,
}

impl DailyTrigger {
    pub fn new(name: &'static str, at: &str, message: impl Into<String>) -> Result<Self> {
        let (hour, minute) = parse_clock_time(at)?;
        let expression = format!("0 {minute} {hour} * * *");
        let schedule = Schedule::from_str(&expression)
            .with_context(|| format!("invalid schedule for {name} trigger: {expression}"))?;
        Ok(Self {
            name,
            schedule,
            message: message.into(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Next firing strictly after `from`.
    pub fn next_after(&self, from: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(from).next()
    }
}

/// Fire each trigger at its time, forever.
pub async fn run_daily_triggers(
    triggers: &[DailyTrigger],
    outreach: Arc<Outreach>,
    clock: Clock,
) -> Result<()> {
    let mut from = clock();
    loop {
        let (trigger, at) = triggers
            .iter()
            .filter_map(|trigger| trigger.next_after(&from).map(|at| (trigger, at)))
            .min_by_key(|(_, at)| *at)
            .context("no upcoming daily trigger")?;

        tracing::info!(trigger = trigger.name(), %at, "next daily trigger");
        let wait = (at - clock()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        tracing::info!(trigger = trigger.name(), "daily trigger firing");
        if let Err(error) = outreach.send_proactive(trigger.message(), at).await {
            tracing::warn!(trigger = trigger.name(), %error, "daily trigger send failed");
        }
        from = at;
    }
}
