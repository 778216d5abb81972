//! Fail-closed version-bump gate for pull requests.
//!
//! A textual check on a version-control diff: built artifacts changing
//! without a manifest version bump fail the gate. It deliberately does
//! not compare old and new version numbers — a formatting-only edit of
//! the version line passes, and a bump to a lower or identical value is
//! not detected. Strengthening that would change merge behavior and is
//! out of scope.

use std::path::PathBuf;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::exec::ExecOptions;
use crate::git;
use crate::manifest::Manifest;

/// Default base range the working tree is diffed against.
pub const DEFAULT_BASE_RANGE: &str = "origin/main...HEAD";

/// Build artifacts whose changes require a version bump.
const BUILT_FILES: [&str; 2] = ["dist/index.js", "dist-package/index.js"];

const MANIFEST_FILE: &str = "package.json";

/// A diff line adding or removing a `"version": "..."` field.
const VERSION_LINE_PATTERN: &str = r#"(?m)^[+-]\s*"version"\s*:\s*"[^"]*""#;

/// Strict `major.minor.patch` form.
const SEMVER_PATTERN: &str = r"^\d+\.\d+\.\d+$";

#[derive(Debug, Clone)]
pub struct VersionCheckConfig {
    /// Repository root the gate runs in.
    pub root: PathBuf,
    pub base_range: String,
    pub built_files: Vec<String>,
    pub manifest: String,
}

impl Default for VersionCheckConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            base_range: DEFAULT_BASE_RANGE.to_string(),
            built_files: BUILT_FILES.iter().map(|f| f.to_string()).collect(),
            manifest: MANIFEST_FILE.to_string(),
        }
    }
}

/// Successful gate outcome.
#[derive(Debug, Clone, Serialize)]
pub struct BumpCheck {
    pub artifacts_changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Run the gate. `Ok` means the change set is mergeable; every failure
/// mode is a typed error carrying the offending diff context.
pub fn check(config: &VersionCheckConfig, options: &ExecOptions) -> Result<BumpCheck> {
    let root = config.root.as_path();

    log_status!("check", "Checking if version bump is required...");

    // Step A: did any build artifact change since base? No change, no
    // version bump required.
    let artifact_diff = git::diff_paths(root, &config.base_range, &config.built_files, options)?;
    if artifact_diff.trim().is_empty() {
        log_status!("check", "No changes to built files, version check skipped");
        return Ok(BumpCheck {
            artifacts_changed: false,
            version: None,
        });
    }
    log_status!(
        "check",
        "Built files have changed, checking if {} version was updated...",
        config.manifest
    );

    // Step B: the manifest must have changed too.
    let manifest_paths = [config.manifest.clone()];
    let manifest_diff = git::diff_paths(root, &config.base_range, &manifest_paths, options)?;
    if manifest_diff.trim().is_empty() {
        let changed = git::changed_files(root, &config.base_range, &config.built_files, options)
            .unwrap_or_default();
        return Err(Error::check_version_not_updated(&config.manifest, &changed));
    }

    // Step C: the manifest diff must touch the version field itself, not
    // merely any line. The current version is read from the working tree,
    // not the diff.
    let current_version = Manifest::read(&root.join(&config.manifest))?.require_version()?;

    let version_line = compile(VERSION_LINE_PATTERN)?;
    if !version_line.is_match(&manifest_diff) {
        return Err(Error::check_version_field_not_updated(
            &config.manifest,
            &current_version,
            &manifest_diff,
        ));
    }

    // Step D: the current version must be plain major.minor.patch.
    let semver = compile(SEMVER_PATTERN)?;
    if !semver.is_match(&current_version) {
        return Err(Error::check_version_invalid_format(&current_version));
    }

    log_status!("check", "Version updated to {}", current_version);
    Ok(BumpCheck {
        artifacts_changed: true,
        version: Some(current_version),
    })
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::internal_unexpected(format!("Invalid pattern '{}': {}", pattern, e)))
}
