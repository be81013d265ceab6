mod glob;
mod path;
#[cfg(test)]
mod tests;

pub use path::ResolvedPath;

use crate::config::AccessConfig;
use crate::error::AccessError;
use std::path::{Path, PathBuf};

pub(crate) use glob::{glob_match, glob_match_anywhere};

/// Operation being requested; read and write allow lists are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

impl AccessMode {
    fn verb(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Allow/deny rules for the document workspace.
///
/// Evaluation order is traversal, then deny rules, then the allow list for
/// the requested mode. A path that matches both an allow and a deny rule is
/// rejected.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    root: PathBuf,
    readable: Vec<String>,
    writable: Vec<String>,
    blocked: Vec<String>,
}

impl AccessPolicy {
    pub fn new(
        root: impl Into<PathBuf>,
        readable: Vec<String>,
        writable: Vec<String>,
        blocked: Vec<String>,
    ) -> Self {
        Self {
            root: root.into(),
            readable,
            writable,
            blocked,
        }
    }

    pub fn from_config(config: &AccessConfig, root: &Path) -> Self {
        Self::new(
            root,
            config.readable.clone(),
            config.writable.clone(),
            config.blocked.clone(),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn check(&self, requested: &str, mode: AccessMode) -> Result<ResolvedPath, AccessError> {
        let resolved = path::resolve_lexically(&self.root, requested).inspect_err(|error| {
            tracing::warn!(path = requested, %error, "access denied");
        })?;

        if !path::stays_inside_root(&self.root, &resolved.absolute) {
            tracing::warn!(path = requested, "access denied (symlink escape)");
            return Err(AccessError::Traversal(requested.trim().to_string()));
        }

        if self.is_blocked(&resolved.relative) {
            tracing::warn!(path = %resolved.relative, "access denied (blocked)");
            return Err(AccessError::Denied(resolved.relative));
        }

        let allowed = match mode {
            AccessMode::Read => &self.readable,
            AccessMode::Write => &self.writable,
        };
        if !allowed.iter().any(|p| glob_match(p, &resolved.relative)) {
            tracing::warn!(
                path = %resolved.relative,
                mode = mode.verb(),
                "access denied (not in allowlist)"
            );
            return Err(AccessError::NotAllowed {
                action: mode.verb(),
                path: resolved.relative,
            });
        }

        Ok(resolved)
    }

    /// Whether a workspace-relative path matches any deny rule. Deny rules
    /// are not anchored, so a nested `private/` is as blocked as a top-level one.
    pub fn is_blocked(&self, relative: &str) -> bool {
        self.blocked.iter().any(|p| glob_match_anywhere(p, relative))
    }

    /// Human-readable summary of the rules.
    pub fn summary(&self) -> String {
        format!(
            "Workspace access controls ({})\n\
             READABLE: {}\n\
             WRITABLE: {}\n\
             BLOCKED:  {}",
            self.root.display(),
            self.readable.join(", "),
            self.writable.join(", "),
            self.blocked.join(", "),
        )
    }
}
