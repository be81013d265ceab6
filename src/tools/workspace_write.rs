use super::common::{required_str, workspace_failure, workspace_path_property};
use super::traits::{Tool, ToolFuture};
use super::types::ToolResult;
use crate::store::{Workspace, WriteMode};
use serde_json::json;
use std::sync::Arc;

/// Write or append to a workspace file.
pub struct WorkspaceWriteTool {
    workspace: Arc<Workspace>,
}

impl WorkspaceWriteTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

impl Tool for WorkspaceWriteTool {
    fn name(&self) -> &str {
        "workspace_write"
    }

    fn description(&self) -> &str {
        "Write content to a file in the user's notes workspace. \
         Allowed: daily notes, todo files and spark memory files."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": workspace_path_property(),
                "content": {
                    "type": "string",
                    "description": "Full file for overwrite, or just the new lines for append"
                },
                "mode": {
                    "type": "string",
                    "enum": ["overwrite", "append"],
                    "description": "overwrite (default) replaces the file, append adds to the end"
                }
            },
            "required": ["path", "content"]
        })
    }

    fn execute(&self, args: serde_json::Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let path = match required_str(&args, "path") {
                Ok(path) => path,
                Err(failed) => return Ok(failed),
            };
            let content = match required_str(&args, "content") {
                Ok(content) => content,
                Err(failed) => return Ok(failed),
            };
            let mode = match args
                .get("mode")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .parse::<WriteMode>()
            {
                Ok(mode) => mode,
                Err(error) => return Ok(ToolResult::failed(error)),
            };

            Ok(match self.workspace.write(path, content, mode).await {
                Ok(()) => ToolResult::ok(format!("Wrote {} chars to {path}", content.len())),
                Err(error) => workspace_failure(&error),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_workspace;
    use tempfile::TempDir;

    #[tokio::test]
    async fn overwrite_then_append() {
        let tmp = TempDir::new().expect("tempdir");
        let tool = WorkspaceWriteTool::new(test_workspace(tmp.path()));
        let path = "memory/timeline/daily/2026-10-19.md";

        let first = tool
            .execute(json!({"path": path, "content": "# Monday"}))
            .await
            .unwrap();
        assert!(first.success, "{first:?}");

        let second = tool
            .execute(json!({"path": path, "content": "- 10:02 gym done", "mode": "append"}))
            .await
            .unwrap();
        assert!(second.success);

        assert_eq!(
            std::fs::read_to_string(tmp.path().join(path)).unwrap(),
            "# Monday\n- 10:02 gym done"
        );
    }

    #[tokio::test]
    async fn write_allowlist_is_separate_from_read() {
        let tmp = TempDir::new().expect("tempdir");
        let tool = WorkspaceWriteTool::new(test_workspace(tmp.path()));

        let result = tool
            .execute(json!({"path": "now.md", "content": "overwritten"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("not allowed to write: now.md"));
        assert!(!tmp.path().join("now.md").exists());
    }

    #[tokio::test]
    async fn unknown_mode_is_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let tool = WorkspaceWriteTool::new(test_workspace(tmp.path()));

        let result = tool
            .execute(json!({
                "path": "memory/spark/learned.md",
                "content": "x",
                "mode": "prepend"
            }))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("prepend"));
    }
}
