//! Bootstrap module for the dubber environment
//!
//! Brings a machine from an arbitrary state to one where the application
//! entry point can run:
//! - Package manager and media binary (advisory; full variant only)
//! - Dependency-sync tool (fatal; restarts once after installing it)
//! - Local isolated environment (fatal; materialized by the sync tool)
//! - Activation and launch of the entry point

pub mod activate;
pub mod config;
pub mod error;
pub mod host;
pub mod media;
pub mod prereq;
pub mod report;
pub mod sequence;

pub use activate::Activation;
pub use config::{BootstrapConfig, CommandSpec, ConfigError, ToolRole, ToolSpec, Variant};
pub use error::{BootstrapError, FATAL_EXIT_CODE};
pub use host::{Host, Launch, SystemHost};
pub use prereq::check_prerequisites;
pub use report::{BootstrapReport, print_report, render_report};
pub use sequence::{Bootstrapper, Outcome, RunContext};
