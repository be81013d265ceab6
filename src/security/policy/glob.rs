//! Component-wise glob matching for workspace-relative paths.
//!
//! `*` and `?` never cross a `/`. `**` as a whole component matches zero or
//! more components. A pattern without any `/` is matched against the final
//! component only, so `*.secret.md` blocks that suffix at every depth.
//!
//! Allow rules are anchored at the workspace root ([`glob_match`]). Deny rules
//! use [`glob_match_anywhere`]: a relative pattern may start at any component,
//! so `private/**` also covers `tinker/journal/private/diary.md`. A leading
//! `/` pins a deny rule back to the root.

/// Match `path` against `pattern` from the workspace root.
pub(crate) fn glob_match(pattern: &str, path: &str) -> bool {
    let Some((pattern_parts, path_parts)) = split_inputs(pattern, path) else {
        return false;
    };
    match_from_root(&pattern_parts, &path_parts)
}

/// Match `pattern` against any trailing run of components of `path`.
pub(crate) fn glob_match_anywhere(pattern: &str, path: &str) -> bool {
    if pattern.trim_start().starts_with('/') {
        return glob_match(pattern, path);
    }
    let Some((pattern_parts, path_parts)) = split_inputs(pattern, path) else {
        return false;
    };
    (0..path_parts.len()).any(|start| match_from_root(&pattern_parts, &path_parts[start..]))
}

fn split_inputs<'a>(pattern: &'a str, path: &'a str) -> Option<(Vec<&'a str>, Vec<&'a str>)> {
    let pattern = pattern.trim().trim_matches('/');
    let path = path.trim_matches('/');
    if pattern.is_empty() || path.is_empty() {
        return None;
    }
    Some((pattern.split('/').collect(), path.split('/').collect()))
}

fn match_from_root(pattern: &[&str], path: &[&str]) -> bool {
    if let [single] = pattern
        && *single != "**"
    {
        return path.last().is_some_and(|name| segment_match(single, name));
    }
    match_components(pattern, path)
}

fn match_components(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len()).any(|skip| match_components(rest, &path[skip..])),
        Some((head, rest)) => path.split_first().is_some_and(|(segment, tail)| {
            segment_match(head, segment) && match_components(rest, tail)
        }),
    }
}

/// Single-component wildcard match with backtracking on the last `*`.
fn segment_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, resume)) = backtrack {
            pi = star + 1;
            ti = resume + 1;
            backtrack = Some((star, resume + 1));
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
