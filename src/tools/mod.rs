//! Capabilities the completion backend may call during a turn.

pub mod common;
pub mod current_time;
pub mod registry;
pub mod traits;
pub mod types;
pub mod workspace_read;
pub mod workspace_write;

pub use current_time::CurrentTimeTool;
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolFuture};
pub use types::{ToolResult, ToolSpec};
pub use workspace_read::WorkspaceReadTool;
pub use workspace_write::WorkspaceWriteTool;

use crate::store::Workspace;
use std::sync::Arc;

/// The standard workspace tool set shared by the coach and the orchestrator.
pub fn workspace_tools(workspace: &Arc<Workspace>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WorkspaceReadTool::new(Arc::clone(workspace))));
    registry.register(Box::new(WorkspaceWriteTool::new(Arc::clone(workspace))));
    registry.register(Box::new(CurrentTimeTool));
    registry
}
