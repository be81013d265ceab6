use super::runtime::{RuntimeParts, SparkRuntime, build_workspace};
use crate::cli::Commands;
use crate::config::Config;
use crate::state::StateStore;
use anyhow::{Context, Result};
use chrono::Local;

pub async fn dispatch(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Daemon => {
            let runtime = assemble(&config)?;
            crate::platform::daemon::run(runtime).await
        }

        Commands::Tick => {
            let runtime = assemble(&config)?;
            let outcome = runtime.scheduler.tick(Local::now()).await;
            println!("{outcome:?}");
            Ok(())
        }

        Commands::Access => {
            println!("{}", build_workspace(&config).policy().summary());
            Ok(())
        }

        Commands::State => {
            let store = StateStore::new(build_workspace(&config), config.access.state_path.clone());
            let state = store.reload().await;
            println!(
                "{}",
                serde_json::to_string_pretty(&state).context("Failed to render state")?
            );
            Ok(())
        }
    }
}

fn assemble(config: &Config) -> Result<SparkRuntime> {
    config.validate()?;
    let parts = RuntimeParts::from_config(config)?;
    SparkRuntime::build(config, parts)
}
