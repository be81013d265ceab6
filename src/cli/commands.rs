use clap::{Parser, Subcommand};

/// `Spark` - a proactive accountability companion.
#[derive(Parser, Debug)]
#[command(name = "spark")]
#[command(version)]
#[command(about = "Knows when to check in and when to stay quiet.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the chat listener, the randomized tick and the daily triggers
    Daemon,

    /// Run one orchestrator tick now, guards included
    Tick,

    /// Show the workspace access rules
    Access,

    /// Print the persisted coordination state
    State,
}
