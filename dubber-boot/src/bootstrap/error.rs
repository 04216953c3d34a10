//! Fatal bootstrap failures
//!
//! Advisory failures never become errors; they are printed and the
//! sequence moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit status for every fatal failure
pub const FATAL_EXIT_CODE: i32 = 1;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to install {binary}: {reason}\n  Install it manually ({hint}) and re-run")]
    SyncToolInstall {
        binary: String,
        reason: String,
        hint: String,
    },

    #[error(
        "{binary} is still not on PATH after restarting\n  Install it manually ({hint}) or add its directory to PATH, then re-run"
    )]
    SyncToolMissingAfterRestart { binary: String, hint: String },

    #[error("Failed to restart after installing the dependency-sync tool: {source}")]
    Restart {
        #[source]
        source: std::io::Error,
    },

    #[error("Environment sync failed: {reason}\n  Run `{command}` manually in {}", root.display())]
    EnvironmentSync {
        reason: String,
        command: String,
        root: PathBuf,
    },

    #[error("Failed to launch {}: {source}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BootstrapError {
    /// Short name of the step that failed
    pub fn step(&self) -> &'static str {
        match self {
            BootstrapError::SyncToolInstall { .. }
            | BootstrapError::SyncToolMissingAfterRestart { .. } => "dependency-sync tool",
            BootstrapError::Restart { .. } => "restart",
            BootstrapError::EnvironmentSync { .. } => "environment sync",
            BootstrapError::Launch { .. } => "launch",
        }
    }
}
