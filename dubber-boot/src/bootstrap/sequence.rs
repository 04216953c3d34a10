//! The bootstrap sequence
//!
//! Strictly linear: package manager, media binary, dependency-sync tool,
//! local environment, activation, launch. Each step awaits its subprocess
//! before the next starts.

use crate::bootstrap::activate::Activation;
use crate::bootstrap::config::{BootstrapConfig, Severity, ToolRole, ToolSpec};
use crate::bootstrap::error::BootstrapError;
use crate::bootstrap::host::{Host, RESTART_MARKER_ENV};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Facts about this invocation that are not configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunContext {
    /// True when this process is the re-invocation after installing the sync tool
    pub restarted: bool,
}

impl RunContext {
    pub fn from_env() -> Self {
        Self {
            restarted: std::env::var_os(RESTART_MARKER_ENV).is_some_and(|v| v == "1"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The entry point ran and exited with this code
    Launched { exit_code: i32 },
    /// The sync tool was installed and the re-invocation exited with this code
    Restarted { exit_code: i32 },
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Launched { exit_code } | Outcome::Restarted { exit_code } => exit_code,
        }
    }
}

pub struct Bootstrapper<'a, H: Host + ?Sized> {
    host: &'a H,
    config: &'a BootstrapConfig,
    root: &'a Path,
    context: RunContext,
    path_hints: Vec<PathBuf>,
}

impl<'a, H: Host + ?Sized> Bootstrapper<'a, H> {
    pub fn new(host: &'a H, config: &'a BootstrapConfig, root: &'a Path, context: RunContext) -> Self {
        Self {
            host,
            config,
            root,
            context,
            path_hints: config.expanded_path_hints(),
        }
    }

    pub async fn run(&self) -> Result<Outcome, BootstrapError> {
        debug!(
            "Bootstrapping {} ({:?} variant, restarted: {})",
            self.root.display(),
            self.config.variant,
            self.context.restarted
        );

        for role in ToolRole::ALL {
            if !role.active_in(self.config.variant) {
                continue;
            }
            match role.severity() {
                Severity::Advisory => self.ensure_advisory(role).await,
                Severity::Fatal => {
                    if let Some(exit_code) = self.ensure_required(role).await? {
                        return Ok(Outcome::Restarted { exit_code });
                    }
                }
            }
        }

        self.ensure_environment().await?;

        let layout = &self.config.layout;
        let activation = Activation::new(self.root.join(&layout.env_dir));
        let interpreter = activation.interpreter(&layout.interpreter, self.host);
        let current_path = std::env::var_os("PATH");
        let launch = activation.launch(
            interpreter,
            &layout.entry_point,
            self.root,
            current_path.as_deref(),
        );

        println!(
            "🚀 Launching {} {}",
            launch.program.display(),
            layout.entry_point.display()
        );
        let exit_code = self
            .host
            .launch(&launch)
            .await
            .map_err(|source| BootstrapError::Launch {
                program: launch.program.clone(),
                source,
            })?;
        info!("Entry point exited with {}", exit_code);

        Ok(Outcome::Launched { exit_code })
    }

    /// Probe, install on absence, and only warn when that fails
    async fn ensure_advisory(&self, role: ToolRole) {
        let spec = self.config.tools.get(role);
        if let Some(path) = self.host.find_binary(&spec.binary) {
            println!("✅ {} found at {}", spec.binary, path.display());
            return;
        }

        println!("🔧 {} ({}) not found, installing...", role.label(), spec.binary);
        let Some(install) = &spec.install else {
            debug!("No scripted install for {} on this platform", spec.binary);
            println!(
                "  ⚠️  No scripted install for {} on this platform; {}",
                spec.binary,
                spec.manual_hint()
            );
            return;
        };

        match self.host.run(install, self.root, &self.path_hints).await {
            Ok(0) => println!("  ✅ {} installed", spec.binary),
            Ok(code) => {
                debug!("{} exited with status {}", install.display(), code);
                println!(
                    "  ⚠️  Installing {} failed (status {}), continuing; {}",
                    spec.binary,
                    code,
                    spec.manual_hint()
                );
            }
            Err(e) => {
                debug!("Could not run {}: {}", install.display(), e);
                println!(
                    "  ⚠️  Installing {} failed ({}), continuing; {}",
                    spec.binary,
                    e,
                    spec.manual_hint()
                );
            }
        }
    }

    /// Probe, install on absence, then restart so the new PATH is seen.
    /// `Ok(Some(code))` when the sequence continued in a restarted process.
    async fn ensure_required(&self, role: ToolRole) -> Result<Option<i32>, BootstrapError> {
        let spec = self.config.tools.get(role);
        if let Some(path) = self.host.find_binary(&spec.binary) {
            println!("✅ {} found at {}", spec.binary, path.display());
            return Ok(None);
        }

        if self.context.restarted {
            return Err(BootstrapError::SyncToolMissingAfterRestart {
                binary: spec.binary.clone(),
                hint: spec.manual_hint(),
            });
        }

        println!("🔧 {} ({}) not found, installing...", role.label(), spec.binary);
        self.install_required(spec).await?;
        println!("  ✅ {} installed", spec.binary);

        println!("🔄 Restarting to pick up the updated PATH...");
        let exit_code = self
            .host
            .restart(&self.path_hints)
            .await
            .map_err(|source| BootstrapError::Restart { source })?;
        Ok(Some(exit_code))
    }

    async fn install_required(&self, spec: &ToolSpec) -> Result<(), BootstrapError> {
        let failed = |reason: String| BootstrapError::SyncToolInstall {
            binary: spec.binary.clone(),
            reason,
            hint: spec.manual_hint(),
        };

        let install = spec
            .install
            .as_ref()
            .ok_or_else(|| failed("no scripted install for this platform".to_string()))?;

        let code = self
            .host
            .run(install, self.root, &self.path_hints)
            .await
            .map_err(|e| failed(format!("could not run `{}`: {}", install.display(), e)))?;
        if code != 0 {
            return Err(failed(format!(
                "`{}` exited with status {}",
                install.display(),
                code
            )));
        }
        Ok(())
    }

    async fn ensure_environment(&self) -> Result<(), BootstrapError> {
        let layout = &self.config.layout;
        let env_dir = self.root.join(&layout.env_dir);
        if self.host.path_exists(&Activation::marker(&env_dir)) {
            println!("✅ Environment ready at {}", env_dir.display());
            return Ok(());
        }

        let command = self.config.sync_command();
        let failed = |reason: String| BootstrapError::EnvironmentSync {
            reason,
            command: command.display(),
            root: self.root.to_path_buf(),
        };

        let descriptor: PathBuf = self.root.join(&layout.descriptor);
        if !self.host.path_exists(&descriptor) {
            return Err(failed(format!(
                "environment descriptor {} not found",
                descriptor.display()
            )));
        }

        println!("📦 Creating environment with `{}`...", command.display());
        let code = self
            .host
            .run(&command, self.root, &self.path_hints)
            .await
            .map_err(|e| failed(format!("could not run `{}`: {}", command.display(), e)))?;
        if code != 0 {
            return Err(failed(format!(
                "`{}` exited with status {}",
                command.display(),
                code
            )));
        }
        println!("  ✅ Environment created");
        Ok(())
    }
}
