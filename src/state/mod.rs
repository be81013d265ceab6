//! Durable coordination record shared by the reply path and the tick path.

mod store;

pub use store::StateStore;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Coordination facts that survive restarts. One record per deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    /// Last time the correspondent replied
    pub last_interaction: Option<DateTime<Utc>>,
    /// Proactive messages sent since the last reply
    pub unanswered_count: u32,
    pub stuck_on: Option<String>,
    pub current_focus: Option<String>,
    pub last_checkin_summary: Option<String>,
    /// Self-declared deadline; outreach is suppressed until it passes
    pub working_until: Option<DateTime<Utc>>,
    /// Most recent proactive send
    pub last_spark_message: Option<DateTime<Utc>>,
}

/// How a tick should treat `working_until` at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    None,
    Active(DateTime<Utc>),
    /// Passed; the observer clears it and proceeds
    Expired(DateTime<Utc>),
}

impl PersistedState {
    pub fn minutes_since_interaction(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_interaction
            .map(|last| (now - last).num_minutes().max(0))
    }

    /// Time since the last proactive send, if there was one.
    pub fn since_last_spark(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_spark_message.map(|last| now - last)
    }

    pub fn deadline_status(&self, now: DateTime<Utc>) -> DeadlineStatus {
        match self.working_until {
            None => DeadlineStatus::None,
            Some(until) if now < until => DeadlineStatus::Active(until),
            Some(until) => DeadlineStatus::Expired(until),
        }
    }

    /// A genuine reply: the only thing that resets the unanswered count.
    pub fn apply_interaction(&mut self, now: DateTime<Utc>, summary: Option<&str>) {
        self.last_interaction = Some(now);
        self.unanswered_count = 0;
        if let Some(summary) = summary {
            self.last_checkin_summary = Some(summary.to_string());
        }
    }

    pub fn apply_proactive_send(&mut self, now: DateTime<Utc>) {
        self.unanswered_count = self.unanswered_count.saturating_add(1);
        self.last_spark_message = Some(now);
    }
}
