//! Document store: named text resources under one workspace root.

mod local;
#[cfg(test)]
mod memory;
mod workspace;

pub use local::LocalStore;
pub use workspace::{ReadOutcome, Workspace};

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Overwrite,
    /// Existing content, a newline, then the new content
    Append,
}

impl std::str::FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "overwrite" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            other => Err(format!("unknown write mode: {other}")),
        }
    }
}

/// Backend for workspace documents. Paths handed to a store have already
/// passed the access policy.
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    fn read<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, Result<String, StoreError>>;

    fn write<'a>(
        &'a self,
        path: &'a Path,
        content: &'a str,
        mode: WriteMode,
    ) -> StoreFuture<'a, Result<(), StoreError>>;

    fn exists<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, bool>;

    fn is_dir<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, bool>;

    /// Entry names in `dir`, sorted, with a trailing `/` on subdirectories.
    fn list<'a>(&'a self, dir: &'a Path) -> StoreFuture<'a, Result<Vec<String>, StoreError>>;
}

/// Workspace over a local directory with the default access rules.
#[cfg(test)]
pub(crate) fn test_workspace(root: &Path) -> std::sync::Arc<Workspace> {
    let policy = crate::security::AccessPolicy::from_config(
        &crate::config::AccessConfig::default(),
        root,
    );
    std::sync::Arc::new(Workspace::new(policy, std::sync::Arc::new(LocalStore::new())))
}

/// Workspace over [`memory::MemoryStore`] with the default access rules.
#[cfg(test)]
pub(crate) fn memory_workspace(root: &Path) -> std::sync::Arc<Workspace> {
    let policy = crate::security::AccessPolicy::from_config(
        &crate::config::AccessConfig::default(),
        root,
    );
    std::sync::Arc::new(Workspace::new(
        policy,
        std::sync::Arc::new(memory::MemoryStore::default()),
    ))
}
