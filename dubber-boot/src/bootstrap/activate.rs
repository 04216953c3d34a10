//! Activation of the local isolated environment
//!
//! Instead of sourcing the activation script into our own process, the
//! variables it would set are applied to the launched child.

use crate::bootstrap::host::{Host, Launch, RESTART_MARKER_ENV};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

#[cfg(windows)]
const ACTIVATION_ARTIFACT: &str = "activate.bat";
#[cfg(not(windows))]
const ACTIVATION_ARTIFACT: &str = "activate";

#[derive(Debug, Clone)]
pub struct Activation {
    env_dir: PathBuf,
    bin_dir: PathBuf,
}

impl Activation {
    pub fn new(env_dir: impl Into<PathBuf>) -> Self {
        let env_dir = env_dir.into();
        let bin_dir = env_dir.join(BIN_DIR);
        Self { env_dir, bin_dir }
    }

    /// The activation artifact, which doubles as the "environment exists" marker
    pub fn marker(env_dir: &Path) -> PathBuf {
        env_dir.join(BIN_DIR).join(ACTIVATION_ARTIFACT)
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// PATH with the environment's executables first
    pub fn search_path(&self, current: Option<&OsStr>) -> OsString {
        let ambient = current
            .filter(|c| !c.is_empty())
            .into_iter()
            .flat_map(std::env::split_paths);
        let paths = std::iter::once(self.bin_dir.clone()).chain(ambient);
        std::env::join_paths(paths).unwrap_or_else(|e| {
            tracing::warn!("Cannot put {} on PATH: {}", self.bin_dir.display(), e);
            current.map(OsStr::to_os_string).unwrap_or_default()
        })
    }

    /// Interpreter inside the environment when present, else the bare name
    /// resolved through the activated PATH
    pub fn interpreter<H: Host + ?Sized>(&self, name: &str, host: &H) -> PathBuf {
        let candidate = self
            .bin_dir
            .join(format!("{}{}", name, std::env::consts::EXE_SUFFIX));
        if host.path_exists(&candidate) {
            candidate
        } else {
            PathBuf::from(name)
        }
    }

    /// Launch of `entry_point` under this environment, without extra arguments
    pub fn launch(
        &self,
        interpreter: PathBuf,
        entry_point: &Path,
        cwd: &Path,
        current_path: Option<&OsStr>,
    ) -> Launch {
        Launch {
            program: interpreter,
            args: vec![entry_point.as_os_str().to_os_string()],
            cwd: cwd.to_path_buf(),
            env: vec![
                (
                    "VIRTUAL_ENV".to_string(),
                    self.env_dir.clone().into_os_string(),
                ),
                ("PATH".to_string(), self.search_path(current_path)),
            ],
            env_remove: vec!["PYTHONHOME".to_string(), RESTART_MARKER_ENV.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::host::fake::FakeHost;

    #[test]
    fn test_marker_lives_in_bin_dir() {
        let marker = Activation::marker(Path::new("/proj/.venv"));
        assert_eq!(
            marker,
            Path::new("/proj/.venv").join(BIN_DIR).join(ACTIVATION_ARTIFACT)
        );
    }

    #[test]
    fn test_search_path_prepends_bin_dir() {
        let activation = Activation::new("/proj/.venv");
        let path = activation.search_path(Some(OsStr::new("/usr/bin")));
        let first = std::env::split_paths(&path).next().unwrap();
        assert_eq!(first, activation.bin_dir());
        assert_eq!(std::env::split_paths(&path).count(), 2);
    }

    #[test]
    fn test_search_path_without_ambient_path() {
        let activation = Activation::new("/proj/.venv");
        assert_eq!(
            activation.search_path(None),
            activation.bin_dir().as_os_str().to_os_string()
        );
    }

    #[test]
    fn test_interpreter_prefers_environment_copy() {
        let activation = Activation::new("/proj/.venv");
        let inside = activation
            .bin_dir()
            .join(format!("python{}", std::env::consts::EXE_SUFFIX));

        let host = FakeHost::new().with_path(inside.clone());
        assert_eq!(activation.interpreter("python", &host), inside);

        let bare = FakeHost::new();
        assert_eq!(activation.interpreter("python", &bare), PathBuf::from("python"));
    }

    #[test]
    fn test_launch_sets_environment() {
        let activation = Activation::new("/proj/.venv");
        let launch = activation.launch(
            PathBuf::from("python"),
            Path::new("main.py"),
            Path::new("/proj"),
            None,
        );

        assert_eq!(launch.args, vec![OsString::from("main.py")]);
        assert_eq!(launch.cwd, PathBuf::from("/proj"));
        assert!(launch
            .env
            .iter()
            .any(|(k, v)| k == "VIRTUAL_ENV" && v == OsStr::new("/proj/.venv")));
        assert!(launch.env_remove.contains(&"PYTHONHOME".to_string()));
    }

    #[test]
    fn test_launch_clears_restart_marker() {
        let activation = Activation::new("/proj/.venv");
        let launch = activation.launch(
            PathBuf::from("python"),
            Path::new("main.py"),
            Path::new("/proj"),
            None,
        );
        assert!(launch.env_remove.contains(&RESTART_MARKER_ENV.to_string()));
        assert!(!launch.env.iter().any(|(k, _)| k == RESTART_MARKER_ENV));
    }
}
