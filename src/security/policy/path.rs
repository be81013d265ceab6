use crate::error::AccessError;
use std::path::{Component, Path, PathBuf};

/// A request that passed lexical resolution: the absolute location and the
/// `/`-joined workspace-relative form that the glob rules are matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub absolute: PathBuf,
    pub relative: String,
}

/// Resolve `requested` against `root` without touching the filesystem.
///
/// `.` and `..` are folded; a `..` that would climb above the root is
/// traversal. Absolute requests must already lie under the root.
pub(super) fn resolve_lexically(root: &Path, requested: &str) -> Result<ResolvedPath, AccessError> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(AccessError::InvalidPath("empty path".into()));
    }
    // Null bytes truncate paths in C-backed syscalls
    if trimmed.contains('\0') {
        return Err(AccessError::InvalidPath("path contains a null byte".into()));
    }
    let lower = trimmed.to_lowercase();
    if lower.contains("..%2f") || lower.contains("%2f..") || lower.contains("..%5c") {
        return Err(AccessError::Traversal(trimmed.to_string()));
    }

    let requested_path = Path::new(trimmed);
    let relative_part = if requested_path.is_absolute() {
        let normalized = normalize(requested_path)
            .ok_or_else(|| AccessError::Traversal(trimmed.to_string()))?;
        let root = normalize(root).unwrap_or_else(|| root.to_path_buf());
        normalized
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .map_err(|_| AccessError::Traversal(format!("outside workspace: {trimmed}")))?
    } else {
        requested_path.to_path_buf()
    };

    let mut parts: Vec<String> = Vec::new();
    for component in relative_part.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(AccessError::Traversal(trimmed.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(AccessError::Traversal(trimmed.to_string()));
            }
        }
    }

    if parts.is_empty() {
        return Err(AccessError::InvalidPath(format!(
            "path resolves to the workspace root: {trimmed}"
        )));
    }

    let relative = parts.join("/");
    Ok(ResolvedPath {
        absolute: root.join(&relative),
        relative,
    })
}

/// Fold `.`/`..` in an absolute path. `None` if `..` climbs past `/`.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}

/// Symlink escape check: the deepest existing ancestor of `resolved` must
/// canonicalize to somewhere under the canonical root.
pub(super) fn stays_inside_root(root: &Path, resolved: &Path) -> bool {
    let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let mut probe = resolved;
    loop {
        if let Ok(canonical) = probe.canonicalize() {
            return canonical.starts_with(&canonical_root);
        }
        match probe.parent() {
            Some(parent) => probe = parent,
            None => return true,
        }
    }
}
