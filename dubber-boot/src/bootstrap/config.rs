//! Bootstrap configuration
//!
//! Reads an optional `bootstrap.toml` from the project root. Every section
//! falls back to platform defaults, so a fresh checkout needs no file at all.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the project root when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "bootstrap.toml";

/// Environment descriptor consumed by the sync step
pub const DEFAULT_DESCRIPTOR: &str = "pyproject.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Which steps of the sequence run.
///
/// `full` also provisions the package manager and the media binary;
/// `minimal` starts at the dependency-sync tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Full,
    Minimal,
}

/// A program invocation taken verbatim from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Shell-like rendering for messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One host tool the bootstrapper probes for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub binary: String,
    /// Format: ">=0.4.0"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default = "default_version_arg")]
    pub version_arg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<CommandSpec>,
}

fn default_version_arg() -> String {
    "--version".to_string()
}

impl ToolSpec {
    fn new(binary: &str, install: Option<CommandSpec>, install_hint: &str) -> Self {
        Self {
            binary: binary.to_string(),
            version: None,
            version_arg: default_version_arg(),
            install_hint: Some(install_hint.to_string()),
            install,
        }
    }

    /// Manual-install suggestion printed when a step fails
    pub fn manual_hint(&self) -> String {
        self.install_hint
            .clone()
            .unwrap_or_else(|| format!("install `{}` manually", self.binary))
    }
}

/// Role a tool plays in the sequence; decides how install failures are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolRole {
    PackageManager,
    Media,
    SyncTool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Warn and continue
    Advisory,
    /// Abort with exit status 1
    Fatal,
}

impl ToolRole {
    pub const ALL: [ToolRole; 3] = [ToolRole::PackageManager, ToolRole::Media, ToolRole::SyncTool];

    pub fn label(self) -> &'static str {
        match self {
            ToolRole::PackageManager => "package manager",
            ToolRole::Media => "media binary",
            ToolRole::SyncTool => "dependency-sync tool",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ToolRole::PackageManager | ToolRole::Media => Severity::Advisory,
            ToolRole::SyncTool => Severity::Fatal,
        }
    }

    /// Whether the role takes part in a run of the given variant
    pub fn active_in(self, variant: Variant) -> bool {
        match self {
            ToolRole::PackageManager | ToolRole::Media => variant == Variant::Full,
            ToolRole::SyncTool => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub package_manager: ToolSpec,
    pub media: ToolSpec,
    pub sync: ToolSpec,
}

impl Tools {
    pub fn get(&self, role: ToolRole) -> &ToolSpec {
        match role {
            ToolRole::PackageManager => &self.package_manager,
            ToolRole::Media => &self.media,
            ToolRole::SyncTool => &self.sync,
        }
    }
}

impl Default for Tools {
    fn default() -> Self {
        let mut media = ToolSpec::new(
            "ffmpeg",
            default_media_install(),
            "see https://ffmpeg.org/download.html",
        );
        media.version_arg = "-version".to_string();

        Self {
            package_manager: default_package_manager(),
            media,
            sync: ToolSpec::new(
                "uv",
                Some(default_sync_install()),
                "see https://docs.astral.sh/uv/getting-started/installation/",
            ),
        }
    }
}

#[cfg(target_os = "macos")]
fn default_package_manager() -> ToolSpec {
    let install = CommandSpec::new(
        "/bin/bash",
        [
            "-c",
            "$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)",
        ],
    )
    .with_env("NONINTERACTIVE", "1");
    ToolSpec::new("brew", Some(install), "see https://brew.sh")
}

#[cfg(windows)]
fn default_package_manager() -> ToolSpec {
    let install = CommandSpec::new(
        "powershell",
        [
            "-NoProfile",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            "[System.Net.ServicePointManager]::SecurityProtocol = 3072; \
             iex ((New-Object System.Net.WebClient).DownloadString('https://community.chocolatey.org/install.ps1'))",
        ],
    );
    ToolSpec::new("choco", Some(install), "see https://chocolatey.org/install")
}

#[cfg(not(any(target_os = "macos", windows)))]
fn default_package_manager() -> ToolSpec {
    // Distro package managers ship with the system; nothing to script.
    ToolSpec::new("apt-get", None, "use your distribution's package manager")
}

#[cfg(target_os = "macos")]
fn default_media_install() -> Option<CommandSpec> {
    Some(CommandSpec::new("brew", ["install", "ffmpeg"]))
}

#[cfg(windows)]
fn default_media_install() -> Option<CommandSpec> {
    Some(CommandSpec::new("choco", ["install", "ffmpeg", "-y"]))
}

#[cfg(not(any(target_os = "macos", windows)))]
fn default_media_install() -> Option<CommandSpec> {
    Some(CommandSpec::new("sudo", ["apt-get", "install", "-y", "ffmpeg"]))
}

#[cfg(windows)]
fn default_sync_install() -> CommandSpec {
    CommandSpec::new(
        "powershell",
        [
            "-ExecutionPolicy",
            "ByPass",
            "-c",
            "irm https://astral.sh/uv/install.ps1 | iex",
        ],
    )
}

#[cfg(not(windows))]
fn default_sync_install() -> CommandSpec {
    CommandSpec::new("sh", ["-c", "curl -LsSf https://astral.sh/uv/install.sh | sh"])
}

/// Install destinations of the default tools that may not be on PATH yet
fn default_path_hints() -> Vec<String> {
    let mut hints = vec!["~/.local/bin".to_string(), "~/.cargo/bin".to_string()];
    hints.extend(platform_path_hints().iter().map(ToString::to_string));
    hints
}

#[cfg(target_os = "macos")]
fn platform_path_hints() -> &'static [&'static str] {
    &["/opt/homebrew/bin", "/usr/local/bin"]
}

#[cfg(windows)]
fn platform_path_hints() -> &'static [&'static str] {
    &[r"C:\ProgramData\chocolatey\bin"]
}

#[cfg(not(any(target_os = "macos", windows)))]
fn platform_path_hints() -> &'static [&'static str] {
    &[]
}

/// Project-relative locations and the launch command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub env_dir: PathBuf,
    pub descriptor: PathBuf,
    pub entry_point: PathBuf,
    pub interpreter: String,
    /// Arguments handed to the sync tool to materialize `env_dir`
    pub sync_args: Vec<String>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            env_dir: PathBuf::from(".venv"),
            descriptor: PathBuf::from(DEFAULT_DESCRIPTOR),
            entry_point: PathBuf::from("main.py"),
            interpreter: "python".to_string(),
            sync_args: vec!["sync".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub variant: Variant,
    /// Directories searched ahead of PATH by installs, syncs and the
    /// restarted invocation
    pub path_hints: Vec<String>,
    pub layout: Layout,
    pub tools: Tools,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            path_hints: default_path_hints(),
            layout: Layout::default(),
            tools: Tools::default(),
        }
    }
}

impl BootstrapConfig {
    /// Load configuration for `root`.
    ///
    /// An explicit path must exist. Without one, `<root>/bootstrap.toml` is
    /// read when present and defaults are used otherwise.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    tracing::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, root.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// `path_hints` with `~` and environment variables expanded
    pub fn expanded_path_hints(&self) -> Vec<PathBuf> {
        self.path_hints
            .iter()
            .map(|hint| match shellexpand::full(hint) {
                Ok(expanded) => PathBuf::from(expanded.as_ref()),
                Err(e) => {
                    tracing::warn!("Could not expand path hint {}: {}", hint, e);
                    PathBuf::from(shellexpand::tilde(hint).as_ref())
                }
            })
            .collect()
    }

    /// The command that materializes the local environment
    pub fn sync_command(&self) -> CommandSpec {
        CommandSpec::new(self.tools.sync.binary.clone(), self.layout.sync_args.clone())
    }
}

/// Pick the project root.
///
/// An explicit root wins. Otherwise the directory holding the executable is
/// used when it contains the environment descriptor, else the current
/// directory.
pub fn resolve_project_root(explicit: Option<&Path>) -> std::io::Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        && exe_dir.join(DEFAULT_DESCRIPTOR).is_file()
    {
        return Ok(exe_dir);
    }

    std::env::current_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = BootstrapConfig::default();
        assert_eq!(config.variant, Variant::Full);
        assert_eq!(config.tools.sync.binary, "uv");
        assert_eq!(config.tools.media.binary, "ffmpeg");
        assert_eq!(config.tools.media.version_arg, "-version");
        assert_eq!(config.layout.env_dir, PathBuf::from(".venv"));
        assert_eq!(config.sync_command().display(), "uv sync");
        assert!(config.tools.sync.install.is_some());
        assert!(config.path_hints.contains(&"~/.local/bin".to_string()));
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_default_hints_cover_homebrew() {
        let hints = BootstrapConfig::default().path_hints;
        assert!(hints.contains(&"/opt/homebrew/bin".to_string()));
    }

    #[cfg(windows)]
    #[test]
    fn test_default_hints_cover_chocolatey() {
        let hints = BootstrapConfig::default().path_hints;
        assert!(hints.iter().any(|hint| hint.ends_with(r"chocolatey\bin")));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: BootstrapConfig = toml::from_str(
            r#"
            variant = "minimal"

            [layout]
            entry_point = "app/run.py"
            "#,
        )
        .unwrap();

        assert_eq!(config.variant, Variant::Minimal);
        assert_eq!(config.layout.entry_point, PathBuf::from("app/run.py"));
        assert_eq!(config.layout.env_dir, PathBuf::from(".venv"));
        assert_eq!(config.tools, Tools::default());
    }

    #[test]
    fn test_tool_override() {
        let config: BootstrapConfig = toml::from_str(
            r#"
            [tools.sync]
            binary = "uv"
            version = ">=0.4.0"
            install = { program = "pipx", args = ["install", "uv"] }
            "#,
        )
        .unwrap();

        let sync = &config.tools.sync;
        assert_eq!(sync.version.as_deref(), Some(">=0.4.0"));
        assert_eq!(sync.version_arg, "--version");
        assert_eq!(sync.install.as_ref().unwrap().display(), "pipx install uv");
        assert_eq!(sync.manual_hint(), "install `uv` manually");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = BootstrapConfig::load(dir.path(), None).unwrap();
        assert_eq!(config, BootstrapConfig::default());
    }

    #[test]
    fn test_load_from_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "variant = \"minimal\"\n").unwrap();
        let config = BootstrapConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.variant, Variant::Minimal);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = BootstrapConfig::load(dir.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "variant = [").unwrap();
        let err = BootstrapConfig::load(dir.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_config_renders_and_parses_back() {
        let config = BootstrapConfig::default();
        let rendered = config.to_toml_string().unwrap();
        assert!(rendered.contains("[layout]"));
        let parsed: BootstrapConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_expand_path_hints() {
        let config = BootstrapConfig {
            path_hints: vec!["~/.local/bin".to_string(), "/opt/tools".to_string()],
            ..BootstrapConfig::default()
        };
        let hints = config.expanded_path_hints();
        assert!(!hints[0].to_string_lossy().contains('~'));
        assert!(hints[0].ends_with(".local/bin"));
        assert_eq!(hints[1], PathBuf::from("/opt/tools"));
    }

    #[test]
    fn test_roles() {
        assert_eq!(ToolRole::SyncTool.severity(), Severity::Fatal);
        assert_eq!(ToolRole::Media.severity(), Severity::Advisory);
        assert!(!ToolRole::PackageManager.active_in(Variant::Minimal));
        assert!(ToolRole::SyncTool.active_in(Variant::Minimal));
    }

    #[test]
    fn test_explicit_root_wins() {
        let root = resolve_project_root(Some(Path::new("/srv/dubber"))).unwrap();
        assert_eq!(root, PathBuf::from("/srv/dubber"));
    }
}
