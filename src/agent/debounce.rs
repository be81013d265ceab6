use super::lock::InteractionLock;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

pub type TurnFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Everything a correspondent sent during one debounce window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushedBatch {
    pub correspondent: String,
    /// Chat to answer in
    pub reply_to: String,
    pub messages: Vec<String>,
}

impl FlushedBatch {
    pub fn combined_text(&self) -> String {
        self.messages.join("\n")
    }
}

/// Runs one conversation turn for a flushed batch.
pub trait TurnHandler: Send + Sync {
    fn handle_turn(&self, batch: FlushedBatch) -> TurnFuture<'_>;
}

#[derive(Default)]
struct PendingEntry {
    messages: Vec<String>,
    reply_to: String,
    /// Bumped on every message; a flush only runs if it still matches
    generation: u64,
    flush: Option<JoinHandle<()>>,
}

impl PendingEntry {
    fn is_pending(&self) -> bool {
        !self.messages.is_empty() || self.flush.is_some()
    }
}

#[derive(Default)]
struct BufferState {
    entries: HashMap<String, PendingEntry>,
    /// Turns taken out of the buffer (or started directly) and not yet done
    in_flight: usize,
}

impl BufferState {
    fn is_idle(&self) -> bool {
        self.in_flight == 0 && !self.entries.values().any(PendingEntry::is_pending)
    }
}

/// Per-correspondent coalescing buffer in front of the conversation turn.
///
/// A message arms a flush `delay` in the future; any later message before it
/// fires cancels and re-arms it, so a burst becomes a single turn. The
/// interaction lock is taken when the first message is accepted and released
/// once the last turn finishes with nothing left pending.
pub struct DebounceBuffer {
    delay: Duration,
    lock: Arc<InteractionLock>,
    handler: Arc<dyn TurnHandler>,
    state: Mutex<BufferState>,
    /// One conversation turn at a time
    turn_gate: tokio::sync::Mutex<()>,
}

impl DebounceBuffer {
    pub fn new(delay: Duration, lock: Arc<InteractionLock>, handler: Arc<dyn TurnHandler>) -> Self {
        Self {
            delay,
            lock,
            handler,
            state: Mutex::new(BufferState::default()),
            turn_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept a message and (re)arm the flush timer for its correspondent.
    pub fn on_message(self: &Arc<Self>, correspondent: &str, reply_to: &str, text: impl Into<String>) {
        let mut state = self.state();
        self.lock.acquire(correspondent);

        let entry = state.entries.entry(correspondent.to_string()).or_default();
        entry.messages.push(text.into());
        entry.reply_to = reply_to.to_string();
        if let Some(previous) = entry.flush.take() {
            previous.abort();
        }
        entry.generation += 1;

        let generation = entry.generation;
        let buffer = Arc::clone(self);
        let key = correspondent.to_string();
        entry.flush = Some(tokio::spawn(async move {
            tokio::time::sleep(buffer.delay).await;
            buffer.flush(key, generation).await;
        }));

        tracing::debug!(
            correspondent,
            buffered = entry.messages.len(),
            "message buffered"
        );
    }

    /// Messages waiting for a flush, across all correspondents.
    pub fn pending_messages(&self) -> usize {
        self.state()
            .entries
            .values()
            .map(|entry| entry.messages.len())
            .sum()
    }

    fn take_batch(&self, correspondent: String, generation: u64) -> Option<FlushedBatch> {
        let mut state = self.state();
        let entry = state.entries.get_mut(&correspondent)?;
        if entry.generation != generation {
            return None;
        }
        entry.flush = None;
        if entry.messages.is_empty() {
            return None;
        }
        let batch = FlushedBatch {
            correspondent,
            reply_to: entry.reply_to.clone(),
            messages: std::mem::take(&mut entry.messages),
        };
        state.in_flight += 1;
        Some(batch)
    }

    async fn flush(self: Arc<Self>, correspondent: String, generation: u64) {
        let Some(batch) = self.take_batch(correspondent, generation) else {
            return;
        };
        tracing::info!(
            correspondent = %batch.correspondent,
            messages = batch.messages.len(),
            "processing buffered messages"
        );

        let holder = batch.correspondent.clone();
        let turn = self.handler.handle_turn(batch);
        if let Err(error) = self.run_gated(&holder, turn, TurnGuard { buffer: &self }).await {
            tracing::error!(%error, "conversation turn failed");
        }
    }

    /// Run a turn with the interaction lock held, one turn at a time. Used by
    /// commands that skip the buffer.
    pub async fn run_exclusive<T>(&self, holder: &str, turn: impl Future<Output = T>) -> T {
        self.state().in_flight += 1;
        self.run_gated(holder, turn, TurnGuard { buffer: self }).await
    }

    async fn run_gated<T>(
        &self,
        holder: &str,
        turn: impl Future<Output = T>,
        _guard: TurnGuard<'_>,
    ) -> T {
        let _gate = self.turn_gate.lock().await;
        self.lock.acquire(holder);
        turn.await
    }

    fn finish_turn(&self) {
        let mut state = self.state();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.is_idle() {
            self.lock.release();
        }
    }
}

/// Ends a turn on every exit path, panics included; the lock is released
/// only when nothing else is buffered or running.
struct TurnGuard<'a> {
    buffer: &'a DebounceBuffer,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.buffer.finish_turn();
    }
}
