//! Builtin commands and startup registry assembly.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;

use crate::build::{BUILD_COMMAND, BuildCommand, BuildSettings, ExternalBuild};
use crate::config::DispatcherConfig;
use crate::dispatch::{CommandHandler, OutputTarget, ProcessRunner, Registry};
use crate::platform::PlatformKind;

pub const VERSION_COMMAND: &str = "version";

/// Prints `<engine> v<major>.<minor> (<project>)`.
pub struct VersionCommand {
    line: String,
    output: OutputTarget,
}

impl VersionCommand {
    pub fn from_config(config: &DispatcherConfig, output: OutputTarget) -> Self {
        Self {
            line: format!(
                "{} {} ({})",
                config.engine_name,
                config.version_string(),
                config.project_name
            ),
            output,
        }
    }

    fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "{}", self.line)
    }
}

impl CommandHandler for VersionCommand {
    fn run(&self) -> Result<i32> {
        match self.output {
            OutputTarget::Stdout => self.write_to(&mut std::io::stdout().lock())?,
            OutputTarget::Stderr => self.write_to(&mut std::io::stderr().lock())?,
        }
        Ok(0)
    }

    fn describe(&self) -> String {
        "builtin: print engine version".to_string()
    }
}

/// Builtins followed by tools-directory scripts (scripts win on name clash).
/// `output` must match the runner's output target.
pub fn startup_registry(
    config: &DispatcherConfig,
    runner: Arc<dyn ProcessRunner>,
    platform: PlatformKind,
    output: OutputTarget,
) -> Result<Registry> {
    let mut registry = Registry::new();

    let invoker = ExternalBuild::new(BuildSettings::from_config(config), runner.clone());
    registry.register(
        BUILD_COMMAND,
        Arc::new(BuildCommand::new(
            Arc::new(invoker),
            config.build_configuration.clone(),
            platform,
        )),
    );
    registry.register(VERSION_COMMAND, Arc::new(VersionCommand::from_config(config, output)));

    let scripts = registry.discover_scripts(config, runner)?;
    crate::log_debug!(
        "registry: {:?} ({} scripts from {})",
        registry.names(),
        scripts,
        config.tools_path().display()
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::runner::testing::RecordingRunner;
    use crate::dispatch::CommandDispatcher;

    fn config_in(dir: &std::path::Path) -> DispatcherConfig {
        DispatcherConfig {
            working_dir: dir.to_path_buf(),
            version_minor: 2,
            ..DispatcherConfig::default()
        }
    }

    #[test]
    fn version_line_format() {
        let cfg = config_in(std::path::Path::new("/w"));
        let cmd = VersionCommand::from_config(&cfg, OutputTarget::Stdout);
        let mut out = Vec::new();
        cmd.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "AthiVegam v0.2 (Parugu)\n");
    }

    #[test]
    fn version_follows_output_target() {
        let cfg = config_in(std::path::Path::new("/w"));
        let cmd = VersionCommand::from_config(&cfg, OutputTarget::Stderr);
        assert_eq!(cmd.output, OutputTarget::Stderr);
        assert_eq!(cmd.run().unwrap(), 0);
    }

    #[test]
    fn registry_has_builtins_and_scripts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("tools")).unwrap();
        std::fs::write(dir.path().join("tools").join("gen.py"), "").unwrap();

        let reg = startup_registry(
            &config_in(dir.path()),
            Arc::new(RecordingRunner::new()),
            PlatformKind::Linux,
            OutputTarget::Stdout,
        )
        .unwrap();
        assert_eq!(reg.names(), vec!["buildsln", "gen", "version"]);
    }

    #[test]
    fn buildsln_runs_make_on_linux() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let reg = startup_registry(
            &config_in(dir.path()),
            runner.clone(),
            PlatformKind::Linux,
            OutputTarget::Stdout,
        )
        .unwrap();
        let d = CommandDispatcher::new(reg).announce(false);

        let report = d.run(&["buildsln", "version"]);
        assert_eq!(report.exit_code, 0);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "make");
        assert_eq!(calls[0].args, vec!["config=debug"]);
    }

    #[test]
    fn buildsln_on_unknown_platform_fails_without_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let reg = startup_registry(
            &config_in(dir.path()),
            runner.clone(),
            PlatformKind::Unknown,
            OutputTarget::Stdout,
        )
        .unwrap();
        let d = CommandDispatcher::new(reg).announce(false);

        let report = d.run(&["buildsln", "version"]);
        assert_eq!(report.exit_code, -1);
        assert_eq!(report.attempted(), vec!["buildsln"]);
        assert!(runner.calls().is_empty());
    }
}
