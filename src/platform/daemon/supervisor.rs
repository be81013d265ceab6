use anyhow::Result;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Restart policy for one long-running component.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub initial_secs: u64,
    pub max_secs: u64,
    /// Consecutive failures before giving up; 0 never gives up
    pub max_restarts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_secs: 2,
            max_secs: 60,
            max_restarts: 0,
        }
    }
}

/// Run `run_component` forever, restarting it with exponential backoff
/// whenever it fails or returns.
pub fn spawn_component_supervisor<F, Fut>(
    name: &'static str,
    backoff: Backoff,
    mut run_component: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let initial = backoff.initial_secs.max(1);
        let max_delay = backoff.max_secs.max(initial);
        let mut delay = initial;
        let mut consecutive_failures: u32 = 0;

        loop {
            tracing::info!(component = name, "starting");
            match run_component().await {
                Ok(()) => {
                    tracing::warn!(component = name, "exited unexpectedly");
                    delay = initial;
                }
                Err(error) => {
                    tracing::error!(component = name, %error, "failed");
                }
            }
            consecutive_failures = consecutive_failures.saturating_add(1);

            if backoff.max_restarts > 0 && consecutive_failures > backoff.max_restarts {
                tracing::error!(
                    component = name,
                    max_restarts = backoff.max_restarts,
                    "too many restarts, giving up"
                );
                break;
            }
            tokio::time::sleep(Duration::from_secs(delay)).await;
            delay = delay.saturating_mul(2).min(max_delay);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn restarts_until_the_limit() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&runs);
        let backoff = Backoff {
            initial_secs: 1,
            max_secs: 4,
            max_restarts: 3,
        };

        let handle = spawn_component_supervisor("flaky", backoff, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { anyhow::bail!("boom") }
        });

        handle.await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn clean_exit_is_restarted_too() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&runs);

        let handle = spawn_component_supervisor("exits", Backoff::default(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.abort();
        let _ = handle.await;
        assert!(runs.load(Ordering::SeqCst) >= 2);
    }
}
