use super::types::ToolResult;
use crate::error::WorkspaceError;
use serde_json::json;

pub(crate) fn workspace_path_property() -> serde_json::Value {
    json!({
        "type": "string",
        "description": "Path relative to the workspace root (e.g. memory/timeline/daily/2026-10-19.md)"
    })
}

pub(crate) fn required_str<'a>(args: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolResult> {
    args.get(key)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ToolResult::failed(format!("Missing '{key}' parameter")))
}

/// Access and store failures become structured results; the turn goes on.
pub(crate) fn workspace_failure(error: &WorkspaceError) -> ToolResult {
    match error {
        WorkspaceError::Access(access) => ToolResult::failed(access.to_string()),
        WorkspaceError::Store(store) => {
            tracing::warn!(%store, "workspace tool failed");
            ToolResult::failed(store.to_string())
        }
    }
}
