use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod commands;
mod output;

use commands::ExecContext;
use shipwright::exec;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "shipwright")]
#[command(version = VERSION)]
#[command(about = "CLI scaffold for CI action execution and release automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the example action
    Run(commands::run::RunArgs),
    /// Workflow entrypoint (inputs from the INPUT_* environment)
    Action(commands::action::ActionArgs),
    /// Build, publish, and tag the current manifest version
    Release(commands::release::ReleaseArgs),
    /// Fail when built artifacts changed without a version bump
    CheckVersionBump(commands::check::CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Read the output ceiling once at startup; every runner call inherits it.
    let ctx = ExecContext {
        max_output_bytes: exec::max_output_bytes_from_env(),
    };

    let (json_result, exit_code) = match cli.command {
        // The workflow entrypoint reports through workflow commands, not
        // the JSON envelope.
        Commands::Action(args) => return ExitCode::from(commands::action::run(args, &ctx)),
        Commands::Run(args) => output::map_cmd_result_to_json(commands::run::run(args, &ctx)),
        Commands::Release(args) => {
            output::map_cmd_result_to_json(commands::release::run(args, &ctx))
        }
        Commands::CheckVersionBump(args) => {
            output::map_cmd_result_to_json(commands::check::run(args, &ctx))
        }
    };

    if let Err(err) = output::print_json_result(json_result) {
        // Never exit 0 with an unreported result.
        eprintln!("shipwright: failed to write response: {}", err);
        return ExitCode::from(1);
    }

    ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
