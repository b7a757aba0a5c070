//! Dispatcher configuration.
//!
//! Sources (later wins): built-in defaults -> YAML file -> CLI flags.
//! The YAML file is `--config PATH`, else `VEGAM_CONFIG`, else `vegam.yaml`
//! in the working directory when present.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "VEGAM_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "vegam.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Base directory for tools lookup and child process cwd.
    pub working_dir: PathBuf,
    /// Tools directory, relative to `working_dir` unless absolute.
    pub tools_dir: PathBuf,
    /// Script file extension (without the dot).
    pub script_extension: String,
    /// Program used to launch scripts, shell-split. Empty runs the script directly.
    pub interpreter: String,
    pub engine_name: String,
    pub project_name: String,
    pub version_major: u32,
    pub version_minor: u32,
    /// Build configuration handed to MSBuild / make.
    pub build_configuration: String,
    /// Environment variable holding the raw MSBuild path.
    pub build_tool_env: String,
    /// Drive prefix prepended to the trimmed MSBuild path.
    pub build_tool_drive: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            tools_dir: PathBuf::from("tools"),
            script_extension: "py".to_string(),
            interpreter: "python3".to_string(),
            engine_name: "AthiVegam".to_string(),
            project_name: "Parugu".to_string(),
            version_major: 0,
            version_minor: 0,
            build_configuration: "debug".to_string(),
            build_tool_env: "MS_BUILD_PATH".to_string(),
            build_tool_drive: r"S:\\".to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Resolved tools directory.
    pub fn tools_path(&self) -> PathBuf {
        if self.tools_dir.is_absolute() {
            self.tools_dir.clone()
        } else {
            self.working_dir.join(&self.tools_dir)
        }
    }

    /// Interpreter tokens (program + leading args), empty when scripts run directly.
    pub fn interpreter_tokens(&self) -> Result<Vec<String>> {
        shell_words::split(self.interpreter.trim())
            .with_context(|| format!("Failed to parse interpreter: '{}'", self.interpreter))
    }

    pub fn version_string(&self) -> String {
        format!("v{}.{}", self.version_major, self.version_minor)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a map.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).context("Failed to parse dispatcher config YAML")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Load using the process environment and current directory.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let base = std::env::current_dir().context("Failed to read current directory")?;
        Self::load_from(explicit, std::env::var(CONFIG_ENV).ok(), &base)
    }

    /// Precedence: `explicit` > `env_value` > `<base>/vegam.yaml`. An explicit
    /// or env path must exist; the implicit file is optional.
    pub fn load_from(
        explicit: Option<&Path>,
        env_value: Option<String>,
        base: &Path,
    ) -> Result<Self> {
        let env_path = env_value
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        if let Some(path) = explicit.map(Path::to_path_buf).or(env_path) {
            crate::log_debug!("config: loading {}", path.display());
            return Self::from_file(&path);
        }

        let implicit = base.join(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            crate::log_debug!("config: loading {}", implicit.display());
            return Self::from_file(&implicit);
        }
        crate::log_trace!("config: no config file, using defaults");
        Ok(Self::default())
    }

    /// Apply `--tools-dir` / `--configuration`. A blank configuration is ignored.
    pub fn apply_overrides(&mut self, tools_dir: Option<PathBuf>, configuration: Option<String>) {
        if let Some(dir) = tools_dir {
            self.tools_dir = dir;
        }
        if let Some(cfg) = configuration
            && !cfg.trim().is_empty()
        {
            self.build_configuration = cfg;
        }
    }
}
