//! Bootstrap commands
//!
//! - `run` (default): provision the host, then launch the entry point
//! - `check`: report prerequisite status without changing anything
//! - `config`: print the effective configuration

use crate::bootstrap::{
    BootstrapConfig, BootstrapReport, Bootstrapper, RunContext, SystemHost, Variant,
    config::resolve_project_root, print_report,
};
use crate::commands::GlobalArgs;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum BootstrapCommands {
    /// Provision missing tools and the local environment, then launch the app
    Run {
        /// Override the configured variant
        #[arg(long, value_enum)]
        variant: Option<Variant>,
    },

    /// Check prerequisites only
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

impl Default for BootstrapCommands {
    fn default() -> Self {
        BootstrapCommands::Run { variant: None }
    }
}

/// Handle a bootstrap command and return the process exit code
pub async fn handle_bootstrap_command(cmd: BootstrapCommands, global: &GlobalArgs) -> Result<i32> {
    let root = resolve_project_root(global.root.as_deref())
        .context("Failed to determine the project root")?;
    let config = BootstrapConfig::load(&root, global.config.as_deref())
        .context("Failed to load bootstrap configuration")?;

    match cmd {
        BootstrapCommands::Run { variant } => run_bootstrap(config, root, variant).await,
        BootstrapCommands::Check { json } => check_only(&config, root, json).await,
        BootstrapCommands::Config => print_config(&config),
    }
}

async fn run_bootstrap(mut config: BootstrapConfig, root: PathBuf, variant: Option<Variant>) -> Result<i32> {
    if let Some(variant) = variant {
        config.variant = variant;
    }

    let context = RunContext::from_env();
    if !context.restarted {
        println!("🥾 dubber-boot: preparing {}", root.display());
    }

    let host = SystemHost::new();
    let outcome = Bootstrapper::new(&host, &config, &root, context).run().await?;
    tracing::debug!("Bootstrap outcome: {:?}", outcome);

    Ok(outcome.exit_code())
}

async fn check_only(config: &BootstrapConfig, root: PathBuf, json: bool) -> Result<i32> {
    let host = SystemHost::new();
    let report = BootstrapReport::collect(&host, config, &root, Utc::now().to_rfc3339()).await;

    if json {
        let rendered =
            serde_json::to_string_pretty(&report).context("Failed to serialize check report")?;
        println!("{}", rendered);
    } else {
        print_report(&report);
    }

    Ok(if report.ready() { 0 } else { 1 })
}

fn print_config(config: &BootstrapConfig) -> Result<i32> {
    print!("{}", config.to_toml_string()?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        assert_eq!(
            BootstrapCommands::default(),
            BootstrapCommands::Run { variant: None }
        );
    }
}
