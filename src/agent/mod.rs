pub mod coach;
pub mod context;
pub mod conversation;
pub mod debounce;
pub mod decision;
pub mod duration;
pub mod fragments;
pub mod history;
pub mod lock;
pub mod orchestrator;
pub mod outreach;
pub mod prompts;
pub mod tool_loop;

#[cfg(test)]
pub(crate) mod testing;

pub use coach::{Coach, CoachSettings};
pub use conversation::{Clock, ConversationTurn, system_clock};
pub use debounce::{DebounceBuffer, FlushedBatch, TurnHandler};
pub use decision::{Decision, DecisionError, extract_decision, resolve_decision};
pub use fragments::{FragmentPacing, split_fragments};
pub use history::ConversationHistory;
pub use lock::InteractionLock;
pub use orchestrator::{DecisionOutcome, Orchestrator, OrchestratorSettings};
pub use outreach::Outreach;
pub use prompts::SessionCommand;
pub use tool_loop::{LoopStopReason, ToolLoop, ToolLoopResult, ToolLoopRun};
