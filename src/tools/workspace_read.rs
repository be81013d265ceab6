use super::common::{required_str, workspace_failure, workspace_path_property};
use super::traits::{Tool, ToolFuture};
use super::types::ToolResult;
use crate::store::{ReadOutcome, Workspace};
use serde_json::json;
use std::sync::Arc;

/// Read a workspace file or list a workspace directory.
pub struct WorkspaceReadTool {
    workspace: Arc<Workspace>,
}

impl WorkspaceReadTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

impl Tool for WorkspaceReadTool {
    fn name(&self) -> &str {
        "workspace_read"
    }

    fn description(&self) -> &str {
        "Read a file from the user's notes workspace, or list a directory. \
         Use for daily notes, todos, profile, protocol and learned preferences."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": workspace_path_property()
            },
            "required": ["path"]
        })
    }

    fn execute(&self, args: serde_json::Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let path = match required_str(&args, "path") {
                Ok(path) => path,
                Err(failed) => return Ok(failed),
            };

            Ok(match self.workspace.read(path).await {
                Ok(ReadOutcome::File(content)) => ToolResult::ok(content),
                Ok(ReadOutcome::Directory(entries)) => {
                    if entries.is_empty() {
                        ToolResult::ok("(empty directory)")
                    } else {
                        ToolResult::ok(entries.join("\n"))
                    }
                }
                Err(error) if error.is_not_found() => {
                    ToolResult::failed(format!("File not found: {path}"))
                }
                Err(error) => workspace_failure(&error),
            })
        })
    }
}
