//! The release pipeline: a fixed, strictly ordered sequence of guarded
//! steps that builds, publishes, and tags one version.
//!
//! Every step returns a `Result` and the driver short-circuits on the
//! first failure; the only designed early exit is the tag-already-exists
//! branch, which is a success. There is no rollback: a publish that
//! succeeds followed by a failed tag push leaves the package published
//! with the major tag not moved.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::exec::{self, ExecOptions};
use crate::git;
use crate::manifest::Manifest;

/// Configuration for one release run. Defaults mirror the scaffold's
/// repository layout: an npm package whose rollup build produces a
/// self-contained `dist-package/` distributable.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Repository root the pipeline runs in.
    pub root: PathBuf,
    /// Manifest the release version is read from, relative to `root`.
    pub manifest_path: PathBuf,
    /// Distributable directory containing its own manifest copy.
    pub dist_dir: PathBuf,
    pub build_command: String,
    pub publish_command: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            manifest_path: PathBuf::from("package.json"),
            dist_dir: PathBuf::from("dist-package"),
            build_command: "npm run build:package".to_string(),
            publish_command: "npm publish".to_string(),
        }
    }
}

/// Version-derived naming for one release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseState {
    pub version: String,
    pub tag: String,
    pub major_tag: String,
}

impl ReleaseState {
    /// Derive tag names from a version: `2.1.8` gives `v2.1.8` and `v2`.
    pub fn from_version(version: &str) -> Self {
        let major = version.split('.').next().unwrap_or(version);
        Self {
            version: version.to_string(),
            tag: format!("v{}", version),
            major_tag: format!("v{}", major),
        }
    }
}

/// Terminal outcome of a release run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReleaseOutcome {
    /// The release tag already existed; nothing was built or published.
    Skipped { tag: String },
    Published {
        version: String,
        tag: String,
        major_tag: String,
        commit: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        release_url: Option<String>,
    },
}

/// Run the release pipeline.
pub fn run(config: &ReleaseConfig, options: &ExecOptions) -> Result<ReleaseOutcome> {
    let root = config.root.as_path();

    // Step 1: read the release version from the manifest.
    let manifest = Manifest::read(&root.join(&config.manifest_path))?;
    let version = manifest.require_version()?;
    let state = ReleaseState::from_version(&version);
    log_status!("release", "Found version: {}", state.version);

    // Step 2: an existing tag means this version is already released, and
    // rerunning is a success, not an error. The fetch is best-effort so
    // offline or remote-less repositories still release.
    let _ = git::fetch_tags(root, options);
    if git::tag_exists(root, &state.tag, options) {
        log_status!(
            "release",
            "Tag {} already exists, skipping release",
            state.tag
        );
        return Ok(ReleaseOutcome::Skipped { tag: state.tag });
    }
    log_status!(
        "release",
        "Tag {} does not exist, proceeding with release",
        state.tag
    );

    // Step 3: build the distributable.
    exec::run_in(Some(root), &config.build_command, options)?;

    // Step 4: stamp the release version into the distributable's own
    // manifest copy, leaving every other field untouched.
    let dist_manifest_path = root.join(&config.dist_dir).join("package.json");
    let mut dist_manifest = Manifest::read(&dist_manifest_path)?;
    let old_version = dist_manifest.version().map(str::to_string);
    dist_manifest.set_version(&state.version);
    dist_manifest.write()?;
    log_status!(
        "release",
        "Updated distributable version from {} to {}",
        old_version.as_deref().unwrap_or("(none)"),
        state.version
    );

    // Step 5: publish from the distributable's own directory.
    let dist_dir = root.join(&config.dist_dir);
    exec::run_in(Some(dist_dir.as_path()), &config.publish_command, options)?;

    // Step 6: create the hosted release.
    if exec::run_in(Some(root), "gh --version", options).is_err() {
        return Err(Error::release_tool_missing("gh", "https://cli.github.com/"));
    }
    exec::run_in(
        Some(root),
        &format!(
            "gh release create {tag} --title \"{tag}\" --generate-notes --latest",
            tag = state.tag
        ),
        options,
    )?;

    // Step 7: move the floating major tag to the release commit. Unlike
    // step 2 the fetch is fatal here: it must see the tag the hosted
    // release just created before the commit can be resolved.
    git::fetch_tags(root, options)?;
    let commit = git::tag_commit(root, &state.tag, options)?;
    log_status!("release", "Moving {} to {}", state.major_tag, commit);
    git::force_move_tag(root, &state.major_tag, &commit, options)?;
    git::force_push_tag(root, &state.major_tag, options)?;

    let release_url = release_url(&state.tag);
    log_status!("release", "Release process completed: {}", state.tag);

    Ok(ReleaseOutcome::Published {
        version: state.version,
        tag: state.tag,
        major_tag: state.major_tag,
        commit,
        release_url,
    })
}

/// Link to the hosted release page, when the CI environment names the
/// repository.
fn release_url(tag: &str) -> Option<String> {
    std::env::var("GITHUB_REPOSITORY")
        .ok()
        .filter(|repo| !repo.is_empty())
        .map(|repo| format!("https://github.com/{}/releases/tag/{}", repo, tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::path::Path;
    use std::process::Command;

    fn lenient() -> ExecOptions {
        ExecOptions {
            fail_on_stderr: false,
            ..ExecOptions::default()
        }
    }

    fn init_repo(path: &Path, version: &str) {
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
        std::fs::write(
            path.join("package.json"),
            format!("{{\"name\": \"demo\", \"version\": \"{}\"}}\n", version),
        )
        .expect("Failed to write manifest");
        for args in [vec!["add", "."], vec!["commit", "-m", "initial"]] {
            Command::new("git")
                .args(&args)
                .current_dir(path)
                .output()
                .expect("Failed to run git");
        }
    }

    fn config_for(path: &Path, build_command: &str) -> ReleaseConfig {
        ReleaseConfig {
            root: path.to_path_buf(),
            build_command: build_command.to_string(),
            ..ReleaseConfig::default()
        }
    }

    #[test]
    fn state_derives_tag_and_major_tag() {
        let state = ReleaseState::from_version("2.1.8");
        assert_eq!(state.tag, "v2.1.8");
        assert_eq!(state.major_tag, "v2");
    }

    #[test]
    fn existing_tag_skips_without_side_effects() {
        let dir = tempfile::TempDir::new().unwrap();
        init_repo(dir.path(), "2.1.8");
        Command::new("git")
            .args(["tag", "v2.1.8"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to tag");

        let config = config_for(dir.path(), "touch built-marker");
        let outcome = run(&config, &lenient()).unwrap();

        match outcome {
            ReleaseOutcome::Skipped { tag } => assert_eq!(tag, "v2.1.8"),
            other => panic!("Expected skip, got {:?}", other),
        }
        // The build step never ran.
        assert!(!dir.path().join("built-marker").exists());
    }

    #[test]
    fn skip_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        init_repo(dir.path(), "2.1.8");
        Command::new("git")
            .args(["tag", "v2.1.8"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to tag");

        let config = config_for(dir.path(), "touch built-marker");
        let first = run(&config, &lenient()).unwrap();
        let second = run(&config, &lenient()).unwrap();

        assert!(matches!(first, ReleaseOutcome::Skipped { .. }));
        assert!(matches!(second, ReleaseOutcome::Skipped { .. }));
        assert!(!dir.path().join("built-marker").exists());
    }

    #[test]
    fn missing_version_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        init_repo(dir.path(), "1.0.0");
        std::fs::write(dir.path().join("package.json"), "{\"name\": \"demo\"}\n").unwrap();

        let config = config_for(dir.path(), "true");
        let err = run(&config, &lenient()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ManifestMissingKey);
    }

    #[test]
    fn failed_build_aborts_before_patching_the_distributable() {
        let dir = tempfile::TempDir::new().unwrap();
        init_repo(dir.path(), "1.0.0");
        std::fs::create_dir(dir.path().join("dist-package")).unwrap();
        let dist_manifest = dir.path().join("dist-package").join("package.json");
        std::fs::write(&dist_manifest, "{\"version\": \"0.0.0\"}\n").unwrap();

        let config = config_for(dir.path(), "false");
        let err = run(&config, &lenient()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ExecCommandFailed);

        let untouched = std::fs::read_to_string(&dist_manifest).unwrap();
        assert_eq!(untouched, "{\"version\": \"0.0.0\"}\n");
    }
}
