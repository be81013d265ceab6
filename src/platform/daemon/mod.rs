//! Long-running mode: transport listener, randomized tick, daily triggers.

mod supervisor;

pub use supervisor::{Backoff, spawn_component_supervisor};

use crate::agent::system_clock;
use crate::app::runtime::SparkRuntime;
use crate::platform::scheduler::run_daily_triggers;
use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;

fn spawn_components(runtime: &SparkRuntime) -> Vec<JoinHandle<()>> {
    let backoff = Backoff::default();

    let router = Arc::clone(&runtime.router);
    let scheduler = Arc::clone(&runtime.scheduler);
    let triggers = Arc::clone(&runtime.triggers);
    let outreach = Arc::clone(&runtime.outreach);

    vec![
        spawn_component_supervisor("channel", backoff, move || {
            let router = Arc::clone(&router);
            async move { router.run_listener().await }
        }),
        spawn_component_supervisor("tick", backoff, move || {
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.run().await }
        }),
        spawn_component_supervisor("daily-triggers", backoff, move || {
            let triggers = Arc::clone(&triggers);
            let outreach = Arc::clone(&outreach);
            async move { run_daily_triggers(&triggers, outreach, system_clock()).await }
        }),
    ]
}

/// Run until Ctrl-C.
pub async fn run(runtime: SparkRuntime) -> Result<()> {
    let handles = spawn_components(&runtime);
    tracing::info!(components = handles.len(), "spark daemon started, Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    for handle in &handles {
        handle.abort();
    }
    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}
