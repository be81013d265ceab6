use super::{DocumentStore, StoreFuture, WriteMode};
use crate::error::StoreError;
use std::path::Path;
use tokio::fs;

/// Plain files on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

impl LocalStore {
    pub const fn new() -> Self {
        Self
    }
}

impl DocumentStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    fn read<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, Result<String, StoreError>> {
        Box::pin(async move {
            let meta = fs::metadata(path)
                .await
                .map_err(|e| StoreError::io(path, e))?;
            if !meta.is_file() {
                return Err(StoreError::NotAFile(path.to_path_buf()));
            }
            fs::read_to_string(path)
                .await
                .map_err(|e| StoreError::io(path, e))
        })
    }

    fn write<'a>(
        &'a self,
        path: &'a Path,
        content: &'a str,
        mode: WriteMode,
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::io(parent, e))?;
            }

            let body = match mode {
                WriteMode::Overwrite => content.to_string(),
                WriteMode::Append => match fs::read_to_string(path).await {
                    Ok(existing) => format!("{existing}\n{content}"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => content.to_string(),
                    Err(e) => return Err(StoreError::io(path, e)),
                },
            };

            fs::write(path, body)
                .await
                .map_err(|e| StoreError::io(path, e))
        })
    }

    fn exists<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, bool> {
        Box::pin(async move { fs::try_exists(path).await.unwrap_or(false) })
    }

    fn is_dir<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, bool> {
        Box::pin(async move { fs::metadata(path).await.is_ok_and(|m| m.is_dir()) })
    }

    fn list<'a>(&'a self, dir: &'a Path) -> StoreFuture<'a, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            let mut entries = fs::read_dir(dir)
                .await
                .map_err(|e| StoreError::io(dir, e))?;
            let mut names = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::io(dir, e))?
            {
                let mut name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                    name.push('/');
                }
                names.push(name);
            }
            names.sort();
            Ok(names)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_missing_is_not_found() {
        let tmp = TempDir::new().expect("tempdir");
        let err = LocalStore::new()
            .read(&tmp.path().join("nope.md"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn write_creates_parents_and_append_joins_with_newline() {
        let tmp = TempDir::new().expect("tempdir");
        let store = LocalStore::new();
        let path = tmp.path().join("memory/timeline/daily/2026-10-19.md");

        store.write(&path, "## Check-ins", WriteMode::Append).await.unwrap();
        store.write(&path, "- 09:10 | started", WriteMode::Append).await.unwrap();
        assert_eq!(
            store.read(&path).await.unwrap(),
            "## Check-ins\n- 09:10 | started"
        );

        store.write(&path, "fresh", WriteMode::Overwrite).await.unwrap();
        assert_eq!(store.read(&path).await.unwrap(), "fresh");
        assert!(store.exists(&path).await);
    }

    #[tokio::test]
    async fn list_is_sorted_with_directory_suffix() {
        let tmp = TempDir::new().expect("tempdir");
        let store = LocalStore::new();
        std::fs::create_dir_all(tmp.path().join("b_dir")).unwrap();
        std::fs::write(tmp.path().join("c.md"), "").unwrap();
        std::fs::write(tmp.path().join("a.md"), "").unwrap();

        assert_eq!(
            store.list(tmp.path()).await.unwrap(),
            vec!["a.md", "b_dir/", "c.md"]
        );
        assert!(store.is_dir(&tmp.path().join("b_dir")).await);
    }

    #[tokio::test]
    async fn reading_a_directory_is_not_a_file() {
        let tmp = TempDir::new().expect("tempdir");
        let err = LocalStore::new().read(tmp.path()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAFile(_)));
    }

    #[test]
    fn write_mode_parses_loosely() {
        assert_eq!("Append".parse::<WriteMode>(), Ok(WriteMode::Append));
        assert_eq!("".parse::<WriteMode>(), Ok(WriteMode::Overwrite));
        assert!("truncate".parse::<WriteMode>().is_err());
    }
}
