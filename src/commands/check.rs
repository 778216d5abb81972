use clap::Args;
use serde::Serialize;

use shipwright::exec::ExecOptions;
use shipwright::version_check::{self, BumpCheck, VersionCheckConfig, DEFAULT_BASE_RANGE};

use super::{CmdResult, ExecContext};

#[derive(Args)]
pub struct CheckArgs {
    /// Base range the working tree is diffed against
    #[arg(long, value_name = "RANGE", default_value = DEFAULT_BASE_RANGE)]
    pub base: String,
}

#[derive(Serialize)]
pub struct CheckOutput {
    command: String,
    #[serde(flatten)]
    check: BumpCheck,
}

pub fn run(args: CheckArgs, ctx: &ExecContext) -> CmdResult<CheckOutput> {
    let config = VersionCheckConfig {
        base_range: args.base,
        ..VersionCheckConfig::default()
    };

    let options = ExecOptions {
        fail_on_stderr: false,
        verbose: true,
        max_output_bytes: ctx.max_output_bytes,
    };

    let check = version_check::check(&config, &options)?;

    Ok((
        CheckOutput {
            command: "check-version-bump".to_string(),
            check,
        },
        0,
    ))
}
