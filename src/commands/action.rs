use clap::Args;

use shipwright::action;
use shipwright::exec::ExecOptions;

use super::ExecContext;

#[derive(Args)]
pub struct ActionArgs {}

/// Workflow entrypoint: inputs come from the `INPUT_*` environment and
/// failures are reported as workflow commands, not the JSON envelope.
pub fn run(_args: ActionArgs, ctx: &ExecContext) -> u8 {
    let example_input = action::input(action::EXAMPLE_INPUT)
        .unwrap_or_else(|| action::DEFAULT_EXAMPLE_INPUT.to_string());

    let options = ExecOptions {
        max_output_bytes: ctx.max_output_bytes,
        ..ExecOptions::default()
    };

    match action::run_action(&example_input, &options) {
        Ok(_) => 0,
        Err(err) => {
            action::set_failed(&format!("Action failed with error: {}", err));
            1
        }
    }
}
