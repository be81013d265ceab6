use super::{DocumentStore, WriteMode};
use crate::error::WorkspaceError;
use crate::security::{AccessMode, AccessPolicy};
use std::sync::Arc;

/// Result of reading a workspace path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    File(String),
    /// Workspace-relative entries, sorted, `dir/` suffix on subdirectories
    Directory(Vec<String>),
}

/// A document store behind the access policy. Every call is validated
/// before the store is touched, whoever the caller is.
pub struct Workspace {
    policy: AccessPolicy,
    store: Arc<dyn DocumentStore>,
}

impl Workspace {
    pub fn new(policy: AccessPolicy, store: Arc<dyn DocumentStore>) -> Self {
        Self { policy, store }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Read a file, or list a directory.
    pub async fn read(&self, path: &str) -> Result<ReadOutcome, WorkspaceError> {
        let resolved = self.policy.check(path, AccessMode::Read)?;

        if self.store.is_dir(&resolved.absolute).await {
            let entries = self
                .store
                .list(&resolved.absolute)
                .await?
                .into_iter()
                .map(|name| format!("{}/{name}", resolved.relative))
                .filter(|rel| !self.policy.is_blocked(rel))
                .collect::<Vec<_>>();
            tracing::info!(path = %resolved.relative, items = entries.len(), "workspace list");
            return Ok(ReadOutcome::Directory(entries));
        }

        let content = self.store.read(&resolved.absolute).await?;
        tracing::info!(path = %resolved.relative, chars = content.len(), "workspace read");
        Ok(ReadOutcome::File(content))
    }

    /// Read a file's text; directories are an error.
    pub async fn read_text(&self, path: &str) -> Result<String, WorkspaceError> {
        let resolved = self.policy.check(path, AccessMode::Read)?;
        Ok(self.store.read(&resolved.absolute).await?)
    }

    pub async fn write(
        &self,
        path: &str,
        content: &str,
        mode: WriteMode,
    ) -> Result<(), WorkspaceError> {
        let resolved = self.policy.check(path, AccessMode::Write)?;
        self.store
            .write(&resolved.absolute, content, mode)
            .await
            .inspect_err(|error| {
                tracing::error!(path = %resolved.relative, %error, "workspace write failed");
            })?;
        tracing::info!(
            path = %resolved.relative,
            ?mode,
            chars = content.len(),
            "workspace write"
        );
        Ok(())
    }

    pub async fn exists(&self, path: &str) -> Result<bool, WorkspaceError> {
        let resolved = self.policy.check(path, AccessMode::Read)?;
        Ok(self.store.exists(&resolved.absolute).await)
    }
}
