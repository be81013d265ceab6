use std::path::PathBuf;
use thiserror::Error;

// ─── Config errors ───────────────────────────────────────────────────────────

/// Startup-fatal configuration problems. The daemon refuses to run while any
/// of these are present.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Access errors ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("path traversal detected: {0}")]
    Traversal(String),

    #[error("access denied: {0}")]
    Denied(String),

    #[error("not allowed to {action}: {path}")]
    NotAllowed { action: &'static str, path: String },
}

// ─── Store errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ─── Workspace errors ────────────────────────────────────────────────────────

/// Failure of a guarded document-store call: either the access policy
/// rejected the path or the underlying store failed.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkspaceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(store) if store.is_not_found())
    }
}
