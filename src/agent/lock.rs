use std::sync::atomic::{AtomicBool, Ordering};

/// Advisory flag marking "a conversation turn is in progress".
///
/// Contending paths never wait on it: the tick path reads [`is_held`]
/// and abstains, the reply path sets it as soon as a message is accepted.
///
/// [`is_held`]: InteractionLock::is_held
#[derive(Debug, Default)]
pub struct InteractionLock {
    held: AtomicBool,
}

impl InteractionLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a conversation as active. Idempotent; `holder` is for the log.
    pub fn acquire(&self, holder: &str) {
        if !self.held.swap(true, Ordering::SeqCst) {
            tracing::debug!(holder, "interaction lock acquired");
        }
    }

    pub fn release(&self) {
        if self.held.swap(false, Ordering::SeqCst) {
            tracing::debug!("interaction lock released");
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_round_trip() {
        let lock = InteractionLock::new();
        assert!(!lock.is_held());

        lock.acquire("42");
        lock.acquire("42");
        assert!(lock.is_held());

        lock.release();
        lock.release();
        assert!(!lock.is_held());
    }
}
