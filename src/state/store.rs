use super::PersistedState;
use crate::store::{Workspace, WriteMode};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Load/save of [`PersistedState`] through the guarded workspace.
///
/// The store is the only source of truth: every read goes to the workspace
/// and `update` is a fresh read-modify-write, serialized in-process.
pub struct StateStore {
    workspace: Arc<Workspace>,
    path: String,
    write_guard: Mutex<()>,
}

impl StateStore {
    pub fn new(workspace: Arc<Workspace>, path: impl Into<String>) -> Self {
        Self {
            workspace,
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Missing file is the default record; anything else unreadable is an error.
    async fn load(&self) -> Result<PersistedState> {
        match self.workspace.read_text(&self.path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("State file {} is not valid JSON", self.path)),
            Err(error) if error.is_not_found() => Ok(PersistedState::default()),
            Err(error) => {
                Err(anyhow::Error::new(error).context(format!("Failed to read {}", self.path)))
            }
        }
    }

    /// Fresh copy from the store. Readers fall back to defaults rather than
    /// fail; only writers refuse to proceed over an unreadable record.
    pub async fn reload(&self) -> PersistedState {
        self.load().await.unwrap_or_else(|error| {
            tracing::warn!(
                path = %self.path,
                error = format!("{error:#}"),
                "could not load state, using defaults"
            );
            PersistedState::default()
        })
    }

    /// Load, mutate, save. An unreadable record is left untouched.
    pub async fn update<F>(&self, mutate: F) -> Result<PersistedState>
    where
        F: FnOnce(&mut PersistedState),
    {
        let _guard = self.write_guard.lock().await;
        let mut state = self.load().await?;
        mutate(&mut state);

        let json = serde_json::to_string_pretty(&state).context("Failed to serialize state")?;
        self.workspace
            .write(&self.path, &json, WriteMode::Overwrite)
            .await
            .with_context(|| format!("Failed to save state to {}", self.path))?;
        Ok(state)
    }

    pub async fn record_interaction(
        &self,
        now: DateTime<Utc>,
        summary: Option<&str>,
    ) -> Result<PersistedState> {
        self.update(|state| state.apply_interaction(now, summary))
            .await
    }

    pub async fn record_proactive_send(&self, now: DateTime<Utc>) -> Result<PersistedState> {
        self.update(|state| state.apply_proactive_send(now)).await
    }

    pub async fn record_stuck(&self, task: &str) -> Result<PersistedState> {
        self.update(|state| state.stuck_on = Some(task.to_string()))
            .await
    }

    pub async fn clear_stuck(&self) -> Result<PersistedState> {
        self.update(|state| state.stuck_on = None).await
    }

    pub async fn set_focus(&self, focus: &str) -> Result<PersistedState> {
        self.update(|state| state.current_focus = Some(focus.to_string()))
            .await
    }

    /// Suppress outreach for the next `minutes`.
    pub async fn set_working_deadline(
        &self,
        now: DateTime<Utc>,
        minutes: u32,
    ) -> Result<DateTime<Utc>> {
        let until = now + Duration::minutes(i64::from(minutes));
        self.update(|state| state.working_until = Some(until))
            .await?;
        tracing::info!(%until, minutes, "working deadline set");
        Ok(until)
    }

    pub async fn clear_working_deadline(&self) -> Result<PersistedState> {
        self.update(|state| state.working_until = None).await
    }
}
