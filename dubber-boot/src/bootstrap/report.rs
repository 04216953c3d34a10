//! Check report
//!
//! Collects prerequisite, environment and media capability status without
//! changing anything, and renders it for humans or as JSON.

use crate::bootstrap::activate::Activation;
use crate::bootstrap::config::{BootstrapConfig, Variant};
use crate::bootstrap::host::Host;
use crate::bootstrap::media::{MediaCapabilities, detect_capabilities};
use crate::bootstrap::prereq::{PrereqResult, check_prerequisites};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentStatus {
    pub env_dir: PathBuf,
    pub marker_present: bool,
    pub descriptor_present: bool,
    pub entry_point_present: bool,
}

/// Bootstrap report encompassing all checks
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub timestamp: String,
    pub root: PathBuf,
    pub variant: Variant,
    pub prereq: PrereqResult,
    pub environment: EnvironmentStatus,
    /// Only probed when the media binary is on PATH
    pub media: Option<MediaCapabilities>,
}

impl BootstrapReport {
    pub async fn collect<H: Host + ?Sized>(
        host: &H,
        config: &BootstrapConfig,
        root: &std::path::Path,
        timestamp: String,
    ) -> Self {
        let prereq = check_prerequisites(host, config).await;

        let env_dir = root.join(&config.layout.env_dir);
        let environment = EnvironmentStatus {
            marker_present: host.path_exists(&Activation::marker(&env_dir)),
            descriptor_present: host.path_exists(&root.join(&config.layout.descriptor)),
            entry_point_present: host.path_exists(&root.join(&config.layout.entry_point)),
            env_dir,
        };

        let media_binary = &config.tools.media.binary;
        let media = if host.find_binary(media_binary).is_some() {
            Some(detect_capabilities(host, media_binary).await)
        } else {
            None
        };

        Self {
            timestamp,
            root: root.to_path_buf(),
            variant: config.variant,
            prereq,
            environment,
            media,
        }
    }

    /// A run would reach the launch step without a fatal failure,
    /// assuming sync succeeds where the environment is missing
    pub fn ready(&self) -> bool {
        self.prereq.all_required_met
            && self.environment.entry_point_present
            && (self.environment.marker_present || self.environment.descriptor_present)
    }
}

fn mark(ok: bool) -> &'static str {
    if ok { "✅" } else { "❌" }
}

/// Render report in human-readable format
pub fn render_report(report: &BootstrapReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("🥾 dubber-boot check ({:?})\n", report.variant));
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str(&format!("Generated: {}\n", report.timestamp));
    out.push_str(&format!("Root:      {}\n\n", report.root.display()));

    out.push_str("📦 Tools:\n");
    for tool in &report.prereq.tools {
        let status = if tool.is_ok() {
            "✅"
        } else if tool.found {
            "⚠️"
        } else {
            "❌"
        };
        out.push_str(&format!("  {} {} [{}] ", status, tool.name, tool.role.label()));

        match (&tool.installed_version, &tool.required_version) {
            (Some(installed), Some(required)) if !tool.meets_requirement => {
                out.push_str(&format!("(installed: {}, requires: {})\n", installed, required));
            }
            (Some(installed), _) => out.push_str(&format!("({})\n", installed)),
            (None, _) => out.push_str(&format!("(not installed) - {}\n", tool.install_hint)),
        }
    }

    let required = report.prereq.missing_required();
    let optional = report.prereq.missing_optional();
    if !required.is_empty() || !optional.is_empty() {
        out.push_str("\n🔧 To fix:\n");
        for tool in required {
            out.push_str(&format!("  ❌ {} (required): {}\n", tool.name, tool.install_hint));
        }
        for tool in optional {
            out.push_str(&format!("  ⚠️  {} (optional): {}\n", tool.name, tool.install_hint));
        }
    }

    let env = &report.environment;
    out.push_str("\n📁 Project:\n");
    out.push_str(&format!(
        "  {} environment {}\n",
        mark(env.marker_present),
        env.env_dir.display()
    ));
    out.push_str(&format!("  {} environment descriptor\n", mark(env.descriptor_present)));
    out.push_str(&format!("  {} entry point\n", mark(env.entry_point_present)));

    if let Some(media) = &report.media {
        out.push_str("\n🎬 Media:\n");
        out.push_str(&format!(
            "  {} hardware H.264 encoding (h264_nvenc) via {}\n",
            if media.h264_nvenc { "✅" } else { "➖" },
            media.binary
        ));
    }

    out.push('\n');
    if report.ready() {
        out.push_str("✅ Ready to launch\n");
    } else {
        out.push_str("⚠️  Some required prerequisites are missing\n");
    }

    out
}

pub fn print_report(report: &BootstrapReport) {
    print!("{}", render_report(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::host::fake::FakeHost;
    use std::path::Path;

    const TS: &str = "2026-01-01T12:00:00Z";

    #[tokio::test]
    async fn test_ready_project() {
        let root = Path::new("/proj");
        let config = BootstrapConfig {
            variant: Variant::Minimal,
            ..BootstrapConfig::default()
        };
        let host = FakeHost::new()
            .with_binary("uv")
            .with_path(root.join("pyproject.toml"))
            .with_path(root.join("main.py"));

        let report = BootstrapReport::collect(&host, &config, root, TS.to_string()).await;

        assert!(report.ready());
        assert!(!report.environment.marker_present);
        assert!(report.media.is_none());
        let text = render_report(&report);
        assert!(text.contains("✅ uv [dependency-sync tool]"));
        assert!(text.contains("Ready to launch"));
        assert!(!text.contains("To fix"));
    }

    #[tokio::test]
    async fn test_missing_tools_list_install_hints() {
        let root = Path::new("/proj");
        let mut config = BootstrapConfig::default();
        config.tools.sync.install_hint = Some("pipx install uv".to_string());
        config.tools.media.install_hint = Some("grab a static ffmpeg build".to_string());
        let host = FakeHost::new().with_binary(&config.tools.package_manager.binary);

        let report = BootstrapReport::collect(&host, &config, root, TS.to_string()).await;
        let text = render_report(&report);

        assert!(text.contains("🔧 To fix:"));
        assert!(text.contains("❌ uv (required): pipx install uv"));
        assert!(text.contains("⚠️  ffmpeg (optional): grab a static ffmpeg build"));
        let required = text.find("(required)").unwrap();
        let optional = text.find("(optional)").unwrap();
        assert!(required < optional);
    }

    #[tokio::test]
    async fn test_missing_sync_tool_is_not_ready() {
        let root = Path::new("/proj");
        let config = BootstrapConfig::default();
        let host = FakeHost::new()
            .with_binary("ffmpeg")
            .with_path(root.join("main.py"))
            .with_path(root.join("pyproject.toml"));

        let report = BootstrapReport::collect(&host, &config, root, TS.to_string()).await;

        assert!(!report.ready());
        assert!(report.media.is_some());
        let text = render_report(&report);
        assert!(text.contains("❌ uv"));
        assert!(text.contains("Some required prerequisites are missing"));
    }

    #[tokio::test]
    async fn test_json_shape() {
        let root = Path::new("/proj");
        let config = BootstrapConfig::default();
        let host = FakeHost::new().with_binary("uv");

        let report = BootstrapReport::collect(&host, &config, root, TS.to_string()).await;
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["timestamp"], TS);
        assert_eq!(json["variant"], "full");
        assert_eq!(json["prereq"]["tools"][2]["role"], "sync_tool");
        assert_eq!(json["environment"]["entry_point_present"], false);
    }
}
