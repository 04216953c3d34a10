//! Host access for the bootstrap sequence
//!
//! Everything the sequence observes or changes on the machine goes through
//! [`Host`]: search-path probes, filesystem probes, subprocesses, the
//! self-restart and the final launch. [`SystemHost`] talks to the real OS.

use crate::bootstrap::config::CommandSpec;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Set on the restarted invocation so it never installs twice
pub const RESTART_MARKER_ENV: &str = "DUBBER_BOOT_RESTARTED";

/// Program, arguments and environment of the final launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    pub env: Vec<(String, OsString)>,
    pub env_remove: Vec<String>,
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Resolve `name` against the search path
    fn find_binary(&self, name: &str) -> Option<PathBuf>;

    fn path_exists(&self, path: &Path) -> bool;

    /// Run a command to completion and return its exit code. `path_hints`
    /// are searched ahead of PATH for the program and its own children.
    async fn run(&self, command: &CommandSpec, cwd: &Path, path_hints: &[PathBuf]) -> io::Result<i32>;

    /// Stdout of a successful command, `None` on any failure
    async fn capture(&self, program: &str, args: &[&str]) -> Option<String>;

    /// Re-invoke the current executable with the same arguments and
    /// `path_hints` prepended to PATH. Returns the child's exit code where
    /// the platform cannot replace the process image.
    async fn restart(&self, path_hints: &[PathBuf]) -> io::Result<i32>;

    async fn launch(&self, launch: &Launch) -> io::Result<i32>;
}

/// [`Host`] backed by the running operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }
}

/// Exit code of a finished child; signals count as failure
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Prepend `dirs` to the current PATH
pub fn extended_search_path(dirs: &[PathBuf]) -> io::Result<OsString> {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let paths = dirs
        .iter()
        .cloned()
        .chain(std::env::split_paths(&current));
    std::env::join_paths(paths).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

#[async_trait]
impl Host for SystemHost {
    fn find_binary(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    async fn run(&self, command: &CommandSpec, cwd: &Path, path_hints: &[PathBuf]) -> io::Result<i32> {
        tracing::info!("Running: {}", command.display());
        let search_path = extended_search_path(path_hints)?;
        let program = which::which_in(&command.program, Some(&search_path), cwd)
            .unwrap_or_else(|_| PathBuf::from(&command.program));
        tracing::debug!("Resolved {} to {}", command.program, program.display());
        let status = Command::new(&program)
            .args(&command.args)
            .env("PATH", &search_path)
            .envs(&command.env)
            .current_dir(cwd)
            .status()
            .await?;
        tracing::debug!("{} exited with {}", command.program, status);
        Ok(exit_code(status))
    }

    async fn capture(&self, program: &str, args: &[&str]) -> Option<String> {
        let output = Command::new(program).args(args).output().await.ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn restart(&self, path_hints: &[PathBuf]) -> io::Result<i32> {
        let exe = std::env::current_exe()?;
        let args: Vec<OsString> = std::env::args_os().skip(1).collect();
        let search_path = extended_search_path(path_hints)?;
        tracing::info!("Restarting {} with extended PATH", exe.display());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;

            // exec only returns on failure
            let err = std::process::Command::new(&exe)
                .args(&args)
                .env("PATH", &search_path)
                .env(RESTART_MARKER_ENV, "1")
                .exec();
            Err(err)
        }

        #[cfg(not(unix))]
        {
            let status = Command::new(&exe)
                .args(&args)
                .env("PATH", &search_path)
                .env(RESTART_MARKER_ENV, "1")
                .status()
                .await?;
            Ok(exit_code(status))
        }
    }

    async fn launch(&self, launch: &Launch) -> io::Result<i32> {
        tracing::info!("Launching {} in {}", launch.program.display(), launch.cwd.display());
        let mut command = Command::new(&launch.program);
        command.args(&launch.args).current_dir(&launch.cwd);
        for (key, value) in &launch.env {
            command.env(key, value);
        }
        for key in &launch.env_remove {
            command.env_remove(key);
        }
        let status = command.status().await?;
        Ok(exit_code(status))
    }
}
