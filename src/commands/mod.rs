pub mod action;
pub mod check;
pub mod release;
pub mod run;

pub type CmdResult<T> = shipwright::Result<(T, i32)>;

/// Context shared by every subcommand. The output ceiling is read from
/// the environment once at startup and threaded through here rather than
/// consulted per call.
#[derive(Debug, Clone, Copy)]
pub struct ExecContext {
    pub max_output_bytes: usize,
}
