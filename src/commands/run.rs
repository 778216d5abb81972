use clap::Args;
use serde::Serialize;

use shipwright::action;
use shipwright::exec::ExecOptions;

use super::{CmdResult, ExecContext};

#[derive(Args)]
pub struct RunArgs {
    /// Input string passed to the example action
    #[arg(
        short = 'e',
        long = "exampleInput",
        default_value = action::DEFAULT_EXAMPLE_INPUT
    )]
    pub example_input: String,

    /// Log each command before it runs
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Serialize)]
pub struct RunOutput {
    command: String,
    example_input: String,
    stdout: String,
}

pub fn run(args: RunArgs, ctx: &ExecContext) -> CmdResult<RunOutput> {
    let options = ExecOptions {
        verbose: args.verbose,
        max_output_bytes: ctx.max_output_bytes,
        ..ExecOptions::default()
    };

    let stdout = action::run_action(&args.example_input, &options)?;

    Ok((
        RunOutput {
            command: "run".to_string(),
            example_input: args.example_input,
            stdout,
        },
        0,
    ))
}
