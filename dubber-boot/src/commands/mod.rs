pub mod bootstrap;

pub use bootstrap::{BootstrapCommands, handle_bootstrap_command};

use clap::Args;
use std::path::PathBuf;

/// Options shared by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Project root holding the environment descriptor and entry point
    #[arg(long, global = true, env = "DUBBER_BOOT_ROOT")]
    pub root: Option<PathBuf>,

    /// Configuration file (default: <root>/bootstrap.toml when present)
    #[arg(long, global = true, env = "DUBBER_BOOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}
