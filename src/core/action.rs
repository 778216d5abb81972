//! The example action and its CI plumbing.
//!
//! The action itself is deliberately trivial — build a help text and echo
//! it through the command runner — so the scaffold's wiring (CLI wrapper,
//! workflow entrypoint, failure reporting) is what gets exercised.

use crate::error::Result;
use crate::exec::{self, ExecOptions};

/// Input name the action reads from the workflow.
pub const EXAMPLE_INPUT: &str = "example-input";

/// Value used when the input is not provided.
pub const DEFAULT_EXAMPLE_INPUT: &str = "default-value";

/// Build the help text for an input value.
pub fn help_text(example_input: &str) -> String {
    format!("{} + my help text", example_input)
}

/// Run the example action: echo the help text through the command runner
/// and return the child's stdout.
pub fn run_action(example_input: &str, options: &ExecOptions) -> Result<String> {
    let text = help_text(example_input);
    let stdout = exec::run(&format!("echo {}", text), options)?;
    log_status!("action", "My action executed successfully");
    Ok(stdout)
}

/// Read a workflow input from the environment.
///
/// The runner exposes `example-input` as `INPUT_EXAMPLE-INPUT` (spaces to
/// underscores, uppercased). An empty value reads as absent.
pub fn input(name: &str) -> Option<String> {
    let key = format!("INPUT_{}", name.replace(' ', "_").to_uppercase());
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Report a failure to the workflow runner.
pub fn set_failed(message: &str) {
    println!("::error::{}", escape_data(message));
}

/// Workflow-command data encoding: `%`, CR, and LF must be escaped so the
/// message stays a single command line.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
