//! Prerequisite checker
//!
//! Read-only view of the tools the sequence depends on: whether each is on
//! PATH, which version it reports, and whether that satisfies the
//! configured requirement. Nothing is installed here.

use crate::bootstrap::config::{BootstrapConfig, Severity, ToolRole, ToolSpec};
use crate::bootstrap::host::Host;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"v?(\d+)\.(\d+)(?:\.(\d+))?").expect("static regex is valid")
});

/// Result of prerequisite check for a single tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolCheck {
    pub role: ToolRole,
    pub name: String,
    pub found: bool,
    pub path: Option<PathBuf>,
    pub installed_version: Option<String>,
    pub required_version: Option<String>,
    pub meets_requirement: bool,
    pub install_hint: String,
}

impl ToolCheck {
    pub fn is_ok(&self) -> bool {
        self.found && self.meets_requirement
    }

    pub fn severity(&self) -> Severity {
        self.role.severity()
    }
}

/// Overall prerequisite check result
#[derive(Debug, Clone, Serialize)]
pub struct PrereqResult {
    pub tools: Vec<ToolCheck>,
    pub all_required_met: bool,
}

impl PrereqResult {
    /// Tools whose absence aborts a run
    pub fn missing_required(&self) -> Vec<&ToolCheck> {
        self.tools
            .iter()
            .filter(|t| t.severity() == Severity::Fatal && !t.is_ok())
            .collect()
    }

    /// Tools whose absence only produces a warning
    pub fn missing_optional(&self) -> Vec<&ToolCheck> {
        self.tools
            .iter()
            .filter(|t| t.severity() == Severity::Advisory && !t.is_ok())
            .collect()
    }
}

/// Extract a semantic version from version output.
///
/// Handles:
///   "uv 0.4.18 (Homebrew 2024-10-01)" -> "0.4.18"
///   "ffmpeg version 6.1.1 Copyright (c) ..." -> "6.1.1"
///   "ffmpeg version 7.0-full_build" -> "7.0.0"
///   "Homebrew 4.2.0" -> "4.2.0"
pub fn extract_version(output: &str) -> Option<String> {
    let caps = VERSION_RE.captures(output)?;
    let patch = caps.get(3).map_or("0", |m| m.as_str());
    Some(format!("{}.{}.{}", &caps[1], &caps[2], patch))
}

/// Check if installed version meets requirement like ">=1.0.0"
pub fn version_meets_requirement(installed: &str, requirement: &str) -> Result<bool> {
    let requirement = requirement.trim();

    let (op, required_ver_str) = [">=", "<=", ">", "<", "="]
        .iter()
        .find_map(|op| requirement.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("=", requirement));

    let installed_ver = semver::Version::parse(installed.trim())
        .with_context(|| format!("Failed to parse installed version: {}", installed))?;

    let required_ver = semver::Version::parse(required_ver_str.trim())
        .with_context(|| format!("Failed to parse required version: {}", required_ver_str))?;

    Ok(match op {
        ">=" => installed_ver >= required_ver,
        "<=" => installed_ver <= required_ver,
        ">" => installed_ver > required_ver,
        "<" => installed_ver < required_ver,
        _ => installed_ver == required_ver,
    })
}

async fn check_tool<H: Host + ?Sized>(host: &H, role: ToolRole, spec: &ToolSpec) -> ToolCheck {
    let path = host.find_binary(&spec.binary);
    let found = path.is_some();

    let (installed_version, meets_requirement) = if found {
        let version = host
            .capture(&spec.binary, &[spec.version_arg.as_str()])
            .await
            .and_then(|out| extract_version(&out));

        match (&version, &spec.version) {
            (Some(installed), Some(required)) => {
                let meets = version_meets_requirement(installed, required).unwrap_or_else(|e| {
                    tracing::warn!("Cannot compare {} versions: {:#}", spec.binary, e);
                    false
                });
                (version, meets)
            }
            (Some(_), None) => (version, true),
            // Found but version unknown - assume OK
            (None, _) => (Some("unknown".to_string()), true),
        }
    } else {
        (None, false)
    };

    ToolCheck {
        role,
        name: spec.binary.clone(),
        found,
        path,
        installed_version,
        required_version: spec.version.clone(),
        meets_requirement,
        install_hint: spec.manual_hint(),
    }
}

/// Check every tool the configured variant uses, in sequence order
pub async fn check_prerequisites<H: Host + ?Sized>(host: &H, config: &BootstrapConfig) -> PrereqResult {
    let mut tools = Vec::new();
    for role in ToolRole::ALL {
        if role.active_in(config.variant) {
            tools.push(check_tool(host, role, config.tools.get(role)).await);
        }
    }

    let mut result = PrereqResult {
        tools,
        all_required_met: false,
    };
    result.all_required_met = result.missing_required().is_empty();
    result
}
