//! Git operations for the release pipeline and the version-bump gate.
//!
//! Everything shells out through the command runner as opaque command
//! lines with captured text output. Callers decide which failures are
//! expected (tag probe, best-effort fetch) and which are fatal.

use std::path::Path;

use crate::error::{Error, Result};
use crate::exec::{self, ExecOptions};

/// Fetch tags from the remote so locally-missing tags are visible.
pub fn fetch_tags(path: &Path, options: &ExecOptions) -> Result<String> {
    exec::run_in(Some(path), "git fetch --tags", options)
        .map_err(|e| Error::git_command_failed(e.to_string()))
}

/// Check whether a tag exists. A failed lookup reads as absent.
pub fn tag_exists(path: &Path, tag: &str, options: &ExecOptions) -> bool {
    exec::run_in(
        Some(path),
        &format!("git show-ref --tags --verify refs/tags/{}", tag),
        options,
    )
    .is_ok()
}

/// Resolve the commit a tag points to.
pub fn tag_commit(path: &Path, tag: &str, options: &ExecOptions) -> Result<String> {
    let stdout = exec::run_in(Some(path), &format!("git rev-list -n 1 {}", tag), options)
        .map_err(|e| {
            Error::git_command_failed(format!("Failed to resolve commit for {}: {}", tag, e))
        })?;
    Ok(stdout.trim().to_string())
}

/// Force-move a tag to a commit locally.
pub fn force_move_tag(path: &Path, tag: &str, commit: &str, options: &ExecOptions) -> Result<()> {
    exec::run_in(Some(path), &format!("git tag -f {} {}", tag, commit), options)
        .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Force-push a tag to origin. Last push wins.
pub fn force_push_tag(path: &Path, tag: &str, options: &ExecOptions) -> Result<()> {
    exec::run_in(
        Some(path),
        &format!("git push origin {} --force", tag),
        options,
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Diff the given paths between a base range and the working tree.
pub fn diff_paths(
    path: &Path,
    range: &str,
    paths: &[String],
    options: &ExecOptions,
) -> Result<String> {
    exec::run_in(
        Some(path),
        &format!("git diff {} {}", range, paths.join(" ")),
        options,
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))
}

/// Names of the files changed between a base range and the working tree,
/// limited to the given paths.
pub fn changed_files(
    path: &Path,
    range: &str,
    paths: &[String],
    options: &ExecOptions,
) -> Result<String> {
    exec::run_in(
        Some(path),
        &format!("git diff --name-only {} {}", range, paths.join(" ")),
        options,
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn lenient() -> ExecOptions {
        ExecOptions {
            fail_on_stderr: false,
            ..ExecOptions::default()
        }
    }

    fn init_repo(path: &Path) {
        for args in [
            vec!["init"],
            vec!["config", "user.email", "test@test.com"],
            vec!["config", "user.name", "Test User"],
        ] {
            Command::new("git")
                .args(&args)
                .current_dir(path)
                .output()
                .expect("Failed to run git");
        }
        std::fs::write(path.join("file.txt"), "content").expect("Failed to write file");
        for args in [vec!["add", "."], vec!["commit", "-m", "initial"]] {
            Command::new("git")
                .args(&args)
                .current_dir(path)
                .output()
                .expect("Failed to run git");
        }
    }

    #[test]
    fn tag_exists_reflects_local_tags() {
        let dir = tempfile::TempDir::new().unwrap();
        init_repo(dir.path());

        assert!(!tag_exists(dir.path(), "v1.0.0", &lenient()));

        Command::new("git")
            .args(["tag", "v1.0.0"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to tag");

        assert!(tag_exists(dir.path(), "v1.0.0", &lenient()));
    }

    #[test]
    fn tag_commit_resolves_to_head() {
        let dir = tempfile::TempDir::new().unwrap();
        init_repo(dir.path());
        Command::new("git")
            .args(["tag", "v1.0.0"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to tag");

        let head = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to rev-parse");
        let head = String::from_utf8_lossy(&head.stdout).trim().to_string();

        let commit = tag_commit(dir.path(), "v1.0.0", &lenient()).unwrap();
        assert_eq!(commit, head);
    }

    #[test]
    fn diff_paths_sees_working_tree_changes() {
        let dir = tempfile::TempDir::new().unwrap();
        init_repo(dir.path());

        let paths = vec!["file.txt".to_string()];
        let clean = diff_paths(dir.path(), "HEAD", &paths, &lenient()).unwrap();
        assert!(clean.trim().is_empty());

        std::fs::write(dir.path().join("file.txt"), "changed").unwrap();
        let dirty = diff_paths(dir.path(), "HEAD", &paths, &lenient()).unwrap();
        assert!(dirty.contains("-content"));
        assert!(dirty.contains("+changed"));

        let names = changed_files(dir.path(), "HEAD", &paths, &lenient()).unwrap();
        assert_eq!(names.trim(), "file.txt");
    }
}
