//! In-memory [`DocumentStore`] for tests that run on paused time, where
//! `tokio::fs` would stall on its blocking pool.

use super::{DocumentStore, StoreFuture, WriteMode};
use crate::error::StoreError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryStore {
    fn has_children(files: &BTreeMap<PathBuf, String>, dir: &Path) -> bool {
        files.keys().any(|path| path != dir && path.starts_with(dir))
    }
}

impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn read<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, Result<String, StoreError>> {
        Box::pin(async move {
            let files = self.files.lock().unwrap();
            match files.get(path) {
                Some(content) => Ok(content.clone()),
                None if Self::has_children(&files, path) => {
                    Err(StoreError::NotAFile(path.to_path_buf()))
                }
                None => Err(StoreError::NotFound(path.to_path_buf())),
            }
        })
    }

    fn write<'a>(
        &'a self,
        path: &'a Path,
        content: &'a str,
        mode: WriteMode,
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut files = self.files.lock().unwrap();
            let body = match (mode, files.get(path)) {
                (WriteMode::Append, Some(existing)) => format!("{existing}\n{content}"),
                _ => content.to_string(),
            };
            files.insert(path.to_path_buf(), body);
            Ok(())
        })
    }

    fn exists<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let files = self.files.lock().unwrap();
            files.contains_key(path) || Self::has_children(&files, path)
        })
    }

    fn is_dir<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, bool> {
        Box::pin(async move { Self::has_children(&self.files.lock().unwrap(), path) })
    }

    fn list<'a>(&'a self, dir: &'a Path) -> StoreFuture<'a, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            let files = self.files.lock().unwrap();
            let mut entries: Vec<String> = files
                .keys()
                .filter_map(|path| path.strip_prefix(dir).ok())
                .filter_map(|rest| {
                    let mut parts = rest.components();
                    let first = parts.next()?.as_os_str().to_string_lossy().into_owned();
                    Some(if parts.next().is_some() { format!("{first}/") } else { first })
                })
                .collect();
            entries.dedup();
            Ok(entries)
        })
    }
}
