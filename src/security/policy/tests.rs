use super::*;
use crate::config::AccessConfig;
use tempfile::TempDir;

fn default_policy(root: &Path) -> AccessPolicy {
    AccessPolicy::from_config(&AccessConfig::default(), root)
}

#[test]
fn traversal_rejected_regardless_of_allow_rules() {
    let workspace = TempDir::new().expect("tempdir");
    let policy = AccessPolicy::new(
        workspace.path(),
        vec!["**".into()],
        vec!["**".into()],
        vec![],
    );

    for mode in [AccessMode::Read, AccessMode::Write] {
        assert!(matches!(
            policy.check("../../etc/passwd", mode),
            Err(AccessError::Traversal(_))
        ));
    }
}

#[test]
fn deny_wins_over_allow() {
    let workspace = TempDir::new().expect("tempdir");
    let policy = AccessPolicy::new(
        workspace.path(),
        vec!["memory/*.md".into()],
        vec!["memory/*.md".into()],
        vec!["*.secret.md".into()],
    );

    assert!(policy.check("memory/bank.md", AccessMode::Read).is_ok());
    assert_eq!(
        policy.check("memory/bank.secret.md", AccessMode::Read),
        Err(AccessError::Denied("memory/bank.secret.md".into()))
    );
    assert_eq!(
        policy.check("memory/bank.secret.md", AccessMode::Write),
        Err(AccessError::Denied("memory/bank.secret.md".into()))
    );
}

#[test]
fn read_and_write_lists_are_independent() {
    let workspace = TempDir::new().expect("tempdir");
    let policy = default_policy(workspace.path());

    assert!(policy.check("now.md", AccessMode::Read).is_ok());
    assert_eq!(
        policy.check("now.md", AccessMode::Write),
        Err(AccessError::NotAllowed {
            action: "write",
            path: "now.md".into()
        })
    );
    assert!(policy
        .check("memory/timeline/daily/2026-10-19.md", AccessMode::Write)
        .is_ok());
    assert!(policy.check("memory/spark/state.json", AccessMode::Write).is_ok());
}

#[test]
fn default_rules_block_private_and_git() {
    let workspace = TempDir::new().expect("tempdir");
    let policy = default_policy(workspace.path());

    assert!(matches!(
        policy.check("private/journal.md", AccessMode::Read),
        Err(AccessError::Denied(_))
    ));
    assert!(matches!(
        policy.check(".git/config", AccessMode::Read),
        Err(AccessError::Denied(_))
    ));
    assert!(matches!(
        policy.check("memory/people/landlord.secret.md", AccessMode::Read),
        Err(AccessError::Denied(_))
    ));
}

#[test]
fn nested_private_and_git_dirs_are_blocked_inside_readable_trees() {
    let workspace = TempDir::new().expect("tempdir");
    let policy = default_policy(workspace.path());

    for path in [
        "tinker/journal/private/diary.md",
        "tinker/journal/private",
        "tinker/proj/.git/notes.md",
    ] {
        for mode in [AccessMode::Read, AccessMode::Write] {
            assert_eq!(
                policy.check(path, mode),
                Err(AccessError::Denied(path.into())),
                "{path}"
            );
        }
    }
    assert!(policy.check("tinker/journal/privately.md", AccessMode::Read).is_ok());
}

#[test]
fn unlisted_paths_are_not_allowed() {
    let workspace = TempDir::new().expect("tempdir");
    let policy = default_policy(workspace.path());

    assert!(matches!(
        policy.check("memory/people/deep/nested.md", AccessMode::Read),
        Err(AccessError::NotAllowed { action: "read", .. })
    ));
    assert!(matches!(
        policy.check("notes.txt", AccessMode::Read),
        Err(AccessError::NotAllowed { .. })
    ));
}

#[test]
fn recursive_tinker_rules() {
    let workspace = TempDir::new().expect("tempdir");
    let policy = default_policy(workspace.path());

    assert!(policy.check("tinker", AccessMode::Read).is_ok());
    assert!(policy.check("tinker/robot", AccessMode::Read).is_ok());
    assert!(policy.check("tinker/robot/parts/list.md", AccessMode::Read).is_ok());
    assert!(policy.check("tinker/robot/parts/cad.step", AccessMode::Read).is_err());
}

#[test]
fn absolute_path_inside_root_is_checked_relative() {
    let workspace = TempDir::new().expect("tempdir");
    let policy = default_policy(workspace.path());
    let absolute = workspace.path().join("now.md");

    let resolved = policy
        .check(&absolute.display().to_string(), AccessMode::Read)
        .expect("inside root");
    assert_eq!(resolved.relative, "now.md");
    assert_eq!(resolved.absolute, absolute);
}

#[cfg(unix)]
#[test]
fn symlink_escape_is_traversal() {
    let workspace = TempDir::new().expect("tempdir");
    let outside = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(workspace.path().join("memory")).unwrap();
    std::fs::write(outside.path().join("loot.md"), "x").unwrap();
    std::os::unix::fs::symlink(
        outside.path().join("loot.md"),
        workspace.path().join("memory/loot.md"),
    )
    .unwrap();

    let policy = default_policy(workspace.path());
    assert!(matches!(
        policy.check("memory/loot.md", AccessMode::Read),
        Err(AccessError::Traversal(_))
    ));
}

#[test]
fn summary_lists_every_rule_group() {
    let workspace = TempDir::new().expect("tempdir");
    let summary = default_policy(workspace.path()).summary();

    assert!(summary.contains("READABLE: now.md, memory/*.md"));
    assert!(summary.contains("WRITABLE: memory/timeline/daily/*.md"));
    assert!(summary.contains("BLOCKED:  *.secret.md, private/**, .git/**"));
}
