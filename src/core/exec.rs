//! Safe execution of opaque shell command lines with captured output.
//!
//! One child process per call, run via `sh -c`; the caller is responsible
//! for quoting. The call blocks until the child exits or a captured stream
//! exceeds the output ceiling, in which case the child is killed and the
//! call fails — output is never truncated silently. There is no timeout
//! beyond the ceiling: a child that hangs without producing output blocks
//! the caller indefinitely. No retries.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// Default per-stream ceiling on captured output: 200 MiB.
/// High enough for large tool output (e.g. `npm ls --all --json`).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 200 * 1024 * 1024;

/// Environment variable overriding the output ceiling (bytes).
pub const MAX_OUTPUT_ENV: &str = "SAFE_EXEC_MAX_BUFFER";

/// Per-call execution options. Immutable once a call starts.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Treat a clean exit with non-empty stderr as a failure.
    pub fail_on_stderr: bool,
    /// Log the command line before execution and error output on failure.
    /// Diagnostic only; never affects the outcome.
    pub verbose: bool,
    /// Per-stream cap on captured bytes (stdout and stderr each).
    pub max_output_bytes: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            fail_on_stderr: true,
            verbose: false,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl ExecOptions {
    pub fn with_max_output(max_output_bytes: usize) -> Self {
        Self {
            max_output_bytes,
            ..Self::default()
        }
    }
}

/// Read the output ceiling from the environment.
///
/// Called once at startup and threaded into [`ExecOptions`] from there.
/// Unset, non-numeric, or zero falls back to the 200 MiB default.
pub fn max_output_bytes_from_env() -> usize {
    std::env::var(MAX_OUTPUT_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_MAX_OUTPUT_BYTES)
}

/// Run a shell command line in the current directory.
///
/// Returns the child's stdout (raw, untrimmed) on success. Fails with
/// `exec.command_failed` on spawn failure, non-zero exit, or output
/// overflow, and with `exec.stderr_output` on a clean exit that wrote to
/// stderr while `fail_on_stderr` is set — stdout is discarded in that case.
pub fn run(command: &str, options: &ExecOptions) -> Result<String> {
    run_in(None, command, options)
}

/// Run a shell command line in a specific directory.
pub fn run_in(dir: Option<&Path>, command: &str, options: &ExecOptions) -> Result<String> {
    if options.verbose {
        log_status!("exec", "Running command: {}", command);
    }

    let mut cmd = Command::new("sh");
    cmd.args(["-c", command])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            if options.verbose {
                log_status!("exec", "   - error: {}", e);
            }
            return Err(Error::exec_command_failed(
                command,
                None,
                "",
                &format!("Failed to spawn: {}", e),
            ));
        }
    };

    let (status, stdout, stderr, overflow) = capture(child, command, options.max_output_bytes)?;

    if let Some(stream) = overflow {
        if options.verbose {
            log_status!("exec", "   - error: {} output limit exceeded", stream);
        }
        return Err(Error::exec_output_overflow(
            command,
            stream,
            options.max_output_bytes,
        ));
    }

    if !status.success() {
        if options.verbose {
            log_status!("exec", "   - error: {}", stderr.trim_end());
        }
        return Err(Error::exec_command_failed(
            command,
            status.code(),
            &stdout,
            &stderr,
        ));
    }

    if options.fail_on_stderr && !stderr.is_empty() {
        if options.verbose {
            log_status!("exec", "   - stderr: {}", stderr.trim_end());
        }
        return Err(Error::exec_stderr_output(command, &stderr));
    }

    Ok(stdout)
}

/// Drain both pipes with a per-stream byte cap, then reap the child.
///
/// Each stream is read on its own thread so neither pipe can fill up and
/// deadlock the child. A reader that hits the cap kills the child, which
/// closes the other pipe and unblocks its reader.
fn capture(
    mut child: Child,
    command: &str,
    cap: usize,
) -> Result<(std::process::ExitStatus, String, String, Option<&'static str>)> {
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let child = Arc::new(Mutex::new(child));
    let stdout_handle = spawn_reader(stdout_pipe, cap, Arc::clone(&child));
    let stderr_handle = spawn_reader(stderr_pipe, cap, Arc::clone(&child));

    let stdout_read = stdout_handle
        .join()
        .unwrap_or_else(|_| Ok((Vec::new(), false)));
    let stderr_read = stderr_handle
        .join()
        .unwrap_or_else(|_| Ok((Vec::new(), false)));

    // A read error leaves the child with no consumer; kill it so the wait
    // below cannot block on a full pipe.
    if stdout_read.is_err() || stderr_read.is_err() {
        if let Ok(mut guard) = child.lock() {
            let _ = guard.kill();
        }
    }

    let status = match child.lock() {
        Ok(mut guard) => guard.wait().map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("wait for: {}", command)))
        })?,
        Err(_) => return Err(Error::internal_unexpected("Child process lock poisoned")),
    };

    let (stdout_buf, stdout_over) = stdout_read
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read stdout of: {}", command))))?;
    let (stderr_buf, stderr_over) = stderr_read
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read stderr of: {}", command))))?;

    let overflow = if stdout_over {
        Some("stdout")
    } else if stderr_over {
        Some("stderr")
    } else {
        None
    };

    Ok((
        status,
        String::from_utf8_lossy(&stdout_buf).into_owned(),
        String::from_utf8_lossy(&stderr_buf).into_owned(),
        overflow,
    ))
}

fn spawn_reader(
    pipe: Option<impl Read + Send + 'static>,
    cap: usize,
    child: Arc<Mutex<Child>>,
) -> std::thread::JoinHandle<std::io::Result<(Vec<u8>, bool)>> {
    std::thread::spawn(move || {
        let result = match pipe {
            Some(pipe) => read_capped(pipe, cap),
            None => Ok((Vec::new(), false)),
        };
        if let Ok((_, true)) = result {
            if let Ok(mut guard) = child.lock() {
                let _ = guard.kill();
            }
        }
        result
    })
}

/// Read a stream to EOF or until one more chunk would exceed the cap.
/// Returns the bytes read and whether the cap was hit.
fn read_capped(mut reader: impl Read, cap: usize) -> std::io::Result<(Vec<u8>, bool)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            return Ok((buf, false));
        }
        if buf.len() + n > cap {
            return Ok((buf, true));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn run_returns_raw_stdout_on_success() {
        let result = run("echo hello", &ExecOptions::default());
        assert_eq!(result.unwrap(), "hello\n");
    }

    #[test]
    fn run_fails_on_nonzero_exit() {
        let err = run("exit 3", &ExecOptions::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ExecCommandFailed);
    }

    #[test]
    fn nonzero_exit_fails_even_when_stderr_is_allowed() {
        let options = ExecOptions {
            fail_on_stderr: false,
            ..ExecOptions::default()
        };
        let err = run("echo out; exit 1", &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::ExecCommandFailed);
    }

    #[test]
    fn clean_exit_with_stderr_fails_when_strict() {
        let err = run("echo oops 1>&2", &ExecOptions::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ExecStderrOutput);
        assert_eq!(err.message, "oops\n");
    }

    #[test]
    fn clean_exit_with_stderr_succeeds_when_lenient() {
        let options = ExecOptions {
            fail_on_stderr: false,
            ..ExecOptions::default()
        };
        let result = run("echo out; echo oops 1>&2", &options);
        assert_eq!(result.unwrap(), "out\n");
    }

    #[test]
    fn empty_stderr_is_not_a_failure() {
        let result = run("echo quiet", &ExecOptions::default());
        assert_eq!(result.unwrap(), "quiet\n");
    }

    #[test]
    fn run_in_executes_in_the_given_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = run_in(Some(dir.path()), "pwd", &ExecOptions::default()).unwrap();
        let reported = std::fs::canonicalize(result.trim()).unwrap();
        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(reported, expected);
    }

    #[test]
    fn output_over_the_ceiling_fails_instead_of_truncating() {
        let options = ExecOptions::with_max_output(64);
        let err = run("printf '%01000d' 0", &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::ExecCommandFailed);
        assert!(err.message.contains("output limit"));
    }

    #[test]
    fn stderr_over_the_ceiling_fails_too() {
        let options = ExecOptions {
            fail_on_stderr: false,
            max_output_bytes: 64,
            ..ExecOptions::default()
        };
        let err = run("printf '%01000d' 0 1>&2", &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::ExecCommandFailed);
        assert!(err.message.contains("stderr"));
    }

    #[test]
    fn output_ceiling_env_parsing() {
        std::env::remove_var(MAX_OUTPUT_ENV);
        assert_eq!(max_output_bytes_from_env(), DEFAULT_MAX_OUTPUT_BYTES);

        std::env::set_var(MAX_OUTPUT_ENV, "1024");
        assert_eq!(max_output_bytes_from_env(), 1024);

        std::env::set_var(MAX_OUTPUT_ENV, "not-a-number");
        assert_eq!(max_output_bytes_from_env(), DEFAULT_MAX_OUTPUT_BYTES);

        std::env::set_var(MAX_OUTPUT_ENV, "0");
        assert_eq!(max_output_bytes_from_env(), DEFAULT_MAX_OUTPUT_BYTES);

        std::env::remove_var(MAX_OUTPUT_ENV);
    }
}
