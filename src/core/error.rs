use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationInvalidArgument,

    ManifestMissingKey,
    ManifestInvalidJson,

    ExecCommandFailed,
    ExecStderrOutput,

    GitCommandFailed,

    ReleaseToolMissing,

    CheckVersionNotUpdated,
    CheckVersionFieldNotUpdated,
    CheckVersionInvalidFormat,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::ManifestMissingKey => "manifest.missing_key",
            ErrorCode::ManifestInvalidJson => "manifest.invalid_json",

            ErrorCode::ExecCommandFailed => "exec.command_failed",
            ErrorCode::ExecStderrOutput => "exec.stderr_output",

            ErrorCode::GitCommandFailed => "git.command_failed",

            ErrorCode::ReleaseToolMissing => "release.tool_missing",

            ErrorCode::CheckVersionNotUpdated => "check.version_not_updated",
            ErrorCode::CheckVersionFieldNotUpdated => "check.version_field_not_updated",
            ErrorCode::CheckVersionInvalidFormat => "check.version_invalid_format",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMissingKeyDetails {
    pub key: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCommandFailedDetails {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecStderrOutputDetails {
    pub command: String,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMissingDetails {
    pub tool: String,
    pub install_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCheckDetails {
    pub manifest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_files: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_diff: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn details_value<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.hints = hints.into_iter().map(|message| Hint { message }).collect();
        self
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let problem = problem.into();
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            format!("Invalid {}: {}", field, problem),
            details_value(InvalidArgumentDetails { field, problem }),
        )
    }

    pub fn manifest_missing_key(key: &str, path: &std::path::Path) -> Self {
        Self::new(
            ErrorCode::ManifestMissingKey,
            format!("No {} found in {}", key, path.display()),
            details_value(ManifestMissingKeyDetails {
                key: key.to_string(),
                path: path.display().to_string(),
            }),
        )
    }

    pub fn manifest_invalid_json(path: &std::path::Path, error: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ManifestInvalidJson,
            format!("Error reading {}: {}", path.display(), error),
            details_value(ManifestInvalidJsonDetails {
                path: path.display().to_string(),
                error: error.to_string(),
            }),
        )
    }

    pub fn exec_command_failed(
        command: &str,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Self {
        let summary = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        let message = match exit_code {
            Some(code) => format!("Command failed with exit code {}: {}", code, summary),
            None => format!("Command failed: {}", summary),
        };
        Self::new(
            ErrorCode::ExecCommandFailed,
            message,
            details_value(ExecCommandFailedDetails {
                command: command.to_string(),
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
        )
    }

    pub fn exec_output_overflow(command: &str, stream: &str, limit: usize) -> Self {
        Self::new(
            ErrorCode::ExecCommandFailed,
            format!("Command {} exceeded the {} byte output limit", stream, limit),
            details_value(ExecCommandFailedDetails {
                command: command.to_string(),
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
            }),
        )
    }

    /// Clean exit, but the child wrote to stderr while the caller demanded
    /// silence. The error message is the stderr text itself.
    pub fn exec_stderr_output(command: &str, stderr: &str) -> Self {
        Self::new(
            ErrorCode::ExecStderrOutput,
            stderr,
            details_value(ExecStderrOutputDetails {
                command: command.to_string(),
                stderr: stderr.to_string(),
            }),
        )
    }

    pub fn git_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn release_tool_missing(tool: &str, install_url: &str) -> Self {
        Self::new(
            ErrorCode::ReleaseToolMissing,
            format!("{} is not installed or not available", tool),
            details_value(ToolMissingDetails {
                tool: tool.to_string(),
                install_url: install_url.to_string(),
            }),
        )
        .with_hints(vec![format!("Install it from: {}", install_url)])
    }

    pub fn check_version_not_updated(manifest: &str, changed_files: &str) -> Self {
        Self::new(
            ErrorCode::CheckVersionNotUpdated,
            format!("Built files changed but {} version was not updated", manifest),
            details_value(VersionCheckDetails {
                manifest: manifest.to_string(),
                current_version: None,
                changed_files: Some(changed_files.to_string()),
                manifest_diff: None,
            }),
        )
        .with_hints(vec![format!(
            "Update the version in {} and commit when built files change",
            manifest
        )])
    }

    pub fn check_version_field_not_updated(
        manifest: &str,
        current_version: &str,
        manifest_diff: &str,
    ) -> Self {
        Self::new(
            ErrorCode::CheckVersionFieldNotUpdated,
            format!("{} changed but version field was not updated", manifest),
            details_value(VersionCheckDetails {
                manifest: manifest.to_string(),
                current_version: Some(current_version.to_string()),
                changed_files: None,
                manifest_diff: Some(manifest_diff.to_string()),
            }),
        )
        .with_hints(vec![format!("Update the version field in {}", manifest)])
    }

    pub fn check_version_invalid_format(current_version: &str) -> Self {
        Self::new(
            ErrorCode::CheckVersionInvalidFormat,
            "Version does not follow semantic versioning format (major.minor.patch)",
            details_value(VersionCheckDetails {
                manifest: String::new(),
                current_version: Some(current_version.to_string()),
                changed_files: None,
                manifest_diff: None,
            }),
        )
        .with_hints(vec![
            "Use the format: major.minor.patch (e.g., 1.0.0, 2.1.3)".to_string()
        ])
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let error = error.into();
        Self::new(
            ErrorCode::InternalIoError,
            error.clone(),
            details_value(InternalErrorDetails {
                error,
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let error = error.into();
        Self::new(
            ErrorCode::InternalJsonError,
            error.clone(),
            details_value(InternalErrorDetails {
                error,
                context,
            }),
        )
    }

    pub fn internal_unexpected(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::InternalUnexpected,
            message.clone(),
            details_value(InternalErrorDetails {
                error: message,
                context: None,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_error_message_is_the_stderr_text() {
        let err = Error::exec_stderr_output("echo hi 1>&2", "warning: something\n");
        assert_eq!(err.code, ErrorCode::ExecStderrOutput);
        assert_eq!(err.message, "warning: something\n");
    }

    #[test]
    fn codes_serialize_as_dotted_strings() {
        assert_eq!(ErrorCode::ExecCommandFailed.as_str(), "exec.command_failed");
        assert_eq!(
            ErrorCode::CheckVersionInvalidFormat.as_str(),
            "check.version_invalid_format"
        );
    }

    #[test]
    fn tool_missing_carries_install_hint() {
        let err = Error::release_tool_missing("gh", "https://cli.github.com/");
        assert_eq!(err.code, ErrorCode::ReleaseToolMissing);
        assert_eq!(err.hints.len(), 1);
        assert!(err.hints[0].message.contains("https://cli.github.com/"));
    }
}
