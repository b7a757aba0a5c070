//! Solution build (`buildsln`).
//!
//! Windows: `cmd.exe /c <msbuild> <engine>.sln /property:Configuration=<cfg>`,
//! with the MSBuild path taken from an environment variable holding a quoted
//! compatibility-layer mount path (`"/mnt/s/...exe"`). The first 8 and last
//! character are dropped, the drive prefix is prepended and `/` becomes `\\`.
//!
//! Linux / macOS: `make config=<cfg>`.
//!
//! Unknown platforms are an error, never a silent success.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::DispatcherConfig;
use crate::dispatch::{CommandHandler, ProcessRunner, ProcessSpec};
use crate::error::DispatchError;
use crate::platform::PlatformKind;

pub const BUILD_COMMAND: &str = "buildsln";

/// Leading characters dropped from the raw tool path (`"/mnt/s/`).
const TOOL_PATH_HEAD: usize = 8;
/// Trailing characters dropped (closing quote).
const TOOL_PATH_TAIL: usize = 1;
const WINDOWS_SEPARATOR: &str = r"\\";

/// Runs one external build and returns its exit code unchanged.
pub trait BuildInvoker: Send + Sync {
    fn invoke(&self, configuration: &str, platform: PlatformKind) -> Result<i32>;
}

#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub engine_name: String,
    pub tool_env: String,
    pub tool_drive: String,
    pub cwd: PathBuf,
}

impl BuildSettings {
    pub fn from_config(config: &DispatcherConfig) -> Self {
        Self {
            engine_name: config.engine_name.clone(),
            tool_env: config.build_tool_env.clone(),
            tool_drive: config.build_tool_drive.clone(),
            cwd: config.working_dir.clone(),
        }
    }
}

/// Turn the raw environment value into a Windows MSBuild path.
pub fn windows_tool_path(raw: &str, drive: &str) -> Result<String, DispatchError> {
    let len = raw.chars().count();
    if len <= TOOL_PATH_HEAD + TOOL_PATH_TAIL {
        return Err(DispatchError::MalformedBuildToolPath {
            raw: raw.to_string(),
        });
    }
    let middle: String = raw
        .chars()
        .skip(TOOL_PATH_HEAD)
        .take(len - TOOL_PATH_HEAD - TOOL_PATH_TAIL)
        .collect();
    Ok(format!("{drive}{middle}").replace('/', WINDOWS_SEPARATOR))
}

/// Resolve the single child invocation for this platform.
pub fn plan_build<F>(
    settings: &BuildSettings,
    configuration: &str,
    platform: PlatformKind,
    env: F,
) -> Result<ProcessSpec, DispatchError>
where
    F: Fn(&str) -> Option<String>,
{
    let spec = match platform {
        PlatformKind::Windows => {
            let raw = env(&settings.tool_env).ok_or_else(|| DispatchError::MissingEnv {
                var: settings.tool_env.clone(),
            })?;
            let tool = windows_tool_path(&raw, &settings.tool_drive)?;
            ProcessSpec::new("cmd.exe").args([
                "/c".to_string(),
                tool,
                format!("{}.sln", settings.engine_name),
                format!("/property:Configuration={configuration}"),
            ])
        }
        PlatformKind::Linux | PlatformKind::MacOs => {
            ProcessSpec::new("make").arg(format!("config={configuration}"))
        }
        PlatformKind::Unknown => {
            return Err(DispatchError::UnknownPlatform {
                raw: std::env::consts::OS.to_string(),
            });
        }
    };
    Ok(spec.cwd(settings.cwd.clone()))
}

/// Invoker backed by real MSBuild / make processes.
pub struct ExternalBuild {
    settings: BuildSettings,
    runner: Arc<dyn ProcessRunner>,
}

impl ExternalBuild {
    pub fn new(settings: BuildSettings, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { settings, runner }
    }
}

impl BuildInvoker for ExternalBuild {
    fn invoke(&self, configuration: &str, platform: PlatformKind) -> Result<i32> {
        let spec = plan_build(&self.settings, configuration, platform, |k| {
            std::env::var(k).ok()
        })?;
        crate::log_debug!("build: {} on {}", spec.display_line(), platform);
        self.runner.run(&spec)
    }
}

/// The `buildsln` command: one build for the configured configuration.
pub struct BuildCommand {
    invoker: Arc<dyn BuildInvoker>,
    configuration: String,
    platform: PlatformKind,
}

impl BuildCommand {
    pub fn new(
        invoker: Arc<dyn BuildInvoker>,
        configuration: impl Into<String>,
        platform: PlatformKind,
    ) -> Self {
        Self {
            invoker,
            configuration: configuration.into(),
            platform,
        }
    }
}

impl CommandHandler for BuildCommand {
    fn run(&self) -> Result<i32> {
        self.invoker.invoke(&self.configuration, self.platform)
    }

    fn describe(&self) -> String {
        let tool = if self.platform.is_windows() {
            "msbuild"
        } else {
            "make"
        };
        format!(
            "builtin: {} build ({}, {})",
            tool, self.configuration, self.platform
        )
    }
}
