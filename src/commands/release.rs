use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use shipwright::exec::ExecOptions;
use shipwright::release::{self, ReleaseConfig, ReleaseOutcome};

use super::{CmdResult, ExecContext};

#[derive(Args)]
pub struct ReleaseArgs {
    /// Manifest the release version is read from
    #[arg(long, value_name = "PATH", default_value = "package.json")]
    pub manifest: PathBuf,

    /// Distributable directory containing its own manifest copy
    #[arg(long, value_name = "DIR", default_value = "dist-package")]
    pub dist_dir: PathBuf,

    /// Command that builds the distributable
    #[arg(long, value_name = "COMMAND", default_value = "npm run build:package")]
    pub build_command: String,

    /// Command that publishes the distributable
    #[arg(long, value_name = "COMMAND", default_value = "npm publish")]
    pub publish_command: String,
}

#[derive(Serialize)]
pub struct ReleaseOutput {
    command: String,
    #[serde(flatten)]
    outcome: ReleaseOutcome,
}

pub fn run(args: ReleaseArgs, ctx: &ExecContext) -> CmdResult<ReleaseOutput> {
    let config = ReleaseConfig {
        root: PathBuf::from("."),
        manifest_path: args.manifest,
        dist_dir: args.dist_dir,
        build_command: args.build_command,
        publish_command: args.publish_command,
    };

    // Pipeline commands fail on exit status, not on stderr chatter — git
    // and npm both write progress there.
    let options = ExecOptions {
        fail_on_stderr: false,
        verbose: true,
        max_output_bytes: ctx.max_output_bytes,
    };

    let outcome = release::run(&config, &options)?;

    Ok((
        ReleaseOutput {
            command: "release".to_string(),
            outcome,
        },
        0,
    ))
}
