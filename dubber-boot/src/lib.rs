//! # dubber-boot
//!
//! Environment bootstrapper for the Khmer AI video dubber. Installs what is
//! missing, materializes the project's isolated environment and launches
//! the application entry point.

pub mod bootstrap;
pub mod commands;
pub mod logging;

pub use bootstrap::{BootstrapConfig, BootstrapError, Bootstrapper, Outcome, RunContext, SystemHost};
