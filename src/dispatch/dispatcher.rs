/*!
dispatcher.rs - fail-fast sequential command execution.

Each name is looked up in the registry and run to completion before the
next one is considered. The first unknown name (-1), handler error (-1) or
non-zero exit code stops the sequence and becomes the overall result.

JSON report shape (`--json`):
{
  "status": "ok" | "error",
  "exit_code": 0,
  "steps": [
    { "name": "build", "status": "ok", "exit_code": 0, "elapsed_ms": 12 }
  ]
}
*/

use std::time::Instant;

use serde::Serialize;

use super::registry::Registry;
use crate::error::DispatchError;
use crate::utils::style::{Role, color, rule};

/// Overall result when a command name cannot be resolved or its handler errors.
pub const FAILURE_EXIT: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Failed,
    NotFound,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    pub exit_code: i32,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: &'static str,
    pub exit_code: i32,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    fn finish(steps: Vec<StepReport>) -> Self {
        let exit_code = steps
            .last()
            .filter(|s| s.status != StepStatus::Ok)
            .map(|s| s.exit_code)
            .unwrap_or(0);
        Self {
            status: if exit_code == 0 { "ok" } else { "error" },
            exit_code,
            steps,
        }
    }

    /// Names of the steps that were attempted, in order.
    pub fn attempted(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }
}

pub struct CommandDispatcher {
    registry: Registry,
    announce: bool,
}

impl CommandDispatcher {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            announce: true,
        }
    }

    /// Toggle the human-readable per-command banner on stdout.
    pub fn announce(mut self, on: bool) -> Self {
        self.announce = on;
        self
    }

    pub fn run<S: AsRef<str>>(&self, commands: &[S]) -> RunReport {
        let mut steps = Vec::with_capacity(commands.len());
        for name in commands {
            let step = self.run_one(name.as_ref());
            let stop = step.status != StepStatus::Ok;
            steps.push(step);
            if stop {
                break;
            }
        }
        RunReport::finish(steps)
    }

    fn run_one(&self, name: &str) -> StepReport {
        if self.announce {
            println!("\n{}", rule());
        }
        let started = Instant::now();

        let Some(handler) = self.registry.get(name) else {
            self.print_invalid(name);
            return StepReport {
                name: name.to_string(),
                status: StepStatus::NotFound,
                exit_code: FAILURE_EXIT,
                elapsed_ms: 0,
                error: Some(DispatchError::CommandNotFound { name: name.to_string() }.to_string()),
            };
        };

        if self.announce {
            println!("Executing: {}", color(Role::Primary, name));
        }
        crate::log_debug!("dispatch: {} ({})", name, handler.describe());

        let outcome = handler.run();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        crate::log_trace!("dispatch: {} finished in {} ms", name, elapsed_ms);

        match outcome {
            Ok(0) => StepReport {
                name: name.to_string(),
                status: StepStatus::Ok,
                exit_code: 0,
                elapsed_ms,
                error: None,
            },
            Ok(code) => {
                crate::log_error!("command '{}' exited with code {}", name, code);
                StepReport {
                    name: name.to_string(),
                    status: StepStatus::Failed,
                    exit_code: code,
                    elapsed_ms,
                    error: None,
                }
            }
            Err(err) => {
                let not_found = matches!(
                    err.downcast_ref::<DispatchError>(),
                    Some(DispatchError::CommandNotFound { .. })
                );
                if not_found {
                    self.print_invalid(name);
                } else {
                    crate::log_error!("command '{}' failed: {:#}", name, err);
                }
                StepReport {
                    name: name.to_string(),
                    status: if not_found {
                        StepStatus::NotFound
                    } else {
                        StepStatus::Error
                    },
                    exit_code: FAILURE_EXIT,
                    elapsed_ms,
                    error: Some(format!("{err:#}")),
                }
            }
        }
    }

    fn print_invalid(&self, name: &str) {
        if self.announce {
            println!("{} {}", color(Role::Error, "Invalid command:"), name);
        } else {
            crate::log_error!("invalid command: {}", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::registry::CommandHandler;
    use crate::dispatch::runner::testing::RecordingRunner;
    use crate::dispatch::script::ScriptCommand;
    use std::path::Path;
    use std::sync::Arc;

    /// Registry of script commands backed by real (empty) files and a
    /// recording runner that replays the configured exit codes.
    fn fixture(
        dir: &Path,
        scripts: &[&str],
        runner: Arc<RecordingRunner>,
    ) -> CommandDispatcher {
        let mut reg = Registry::new();
        for name in scripts {
            let path = dir.join(format!("{name}.py"));
            std::fs::write(&path, "").unwrap();
            let cmd = ScriptCommand::new(
                *name,
                path,
                vec!["python3".to_string()],
                dir,
                runner.clone(),
            );
            reg.register(*name, Arc::new(cmd));
        }
        CommandDispatcher::new(reg).announce(false)
    }

    fn spawned(runner: &RecordingRunner) -> Vec<String> {
        runner
            .calls()
            .iter()
            .filter_map(|c| c.args.last())
            .filter_map(|a| Path::new(a).file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect()
    }

    #[test]
    fn all_succeeding_returns_zero() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let d = fixture(dir.path(), &["gen", "build", "run"], runner.clone());

        let report = d.run(&["gen", "build", "run"]);
        assert_eq!(report.exit_code, 0);
        assert_eq!(report.status, "ok");
        assert_eq!(spawned(&runner), vec!["gen", "build", "run"]);
    }

    #[test]
    fn stops_at_first_failure_and_propagates_code() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new().with_code("run", 2));
        let d = fixture(dir.path(), &["build", "run", "gen"], runner.clone());

        let report = d.run(&["build", "run", "gen"]);
        assert_eq!(report.exit_code, 2);
        assert_eq!(report.attempted(), vec!["build", "run"]);
        assert_eq!(spawned(&runner), vec!["build", "run"]);
        assert_eq!(report.steps[1].status, StepStatus::Failed);
    }

    #[test]
    fn unknown_command_returns_minus_one_without_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let d = fixture(dir.path(), &["build"], runner.clone());

        let report = d.run(&["deploy"]);
        assert_eq!(report.exit_code, FAILURE_EXIT);
        assert_eq!(report.steps[0].status, StepStatus::NotFound);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn unknown_command_mid_sequence_halts() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let d = fixture(dir.path(), &["build", "run"], runner.clone());

        let report = d.run(&["build", "deploy", "run"]);
        assert_eq!(report.exit_code, FAILURE_EXIT);
        assert_eq!(report.attempted(), vec!["build", "deploy"]);
        assert_eq!(spawned(&runner), vec!["build"]);
    }

    #[test]
    fn empty_sequence_succeeds() {
        let d = CommandDispatcher::new(Registry::new()).announce(false);
        let report = d.run::<&str>(&[]);
        assert_eq!(report.exit_code, 0);
        assert!(report.steps.is_empty());
    }

    struct Broken;

    impl CommandHandler for Broken {
        fn run(&self) -> anyhow::Result<i32> {
            Err(DispatchError::UnknownPlatform {
                raw: "plan9".into(),
            }
            .into())
        }
        fn describe(&self) -> String {
            "broken".into()
        }
    }

    #[test]
    fn handler_error_is_terminal_failure() {
        let mut reg = Registry::new();
        reg.register("buildsln", Arc::new(Broken));
        let d = CommandDispatcher::new(reg).announce(false);

        let report = d.run(&["buildsln", "buildsln"]);
        assert_eq!(report.exit_code, FAILURE_EXIT);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.steps[0].status, StepStatus::Error);
        assert!(report.steps[0].error.as_deref().unwrap().contains("plan9"));
    }

    #[test]
    fn report_serializes_snake_case_status() {
        let d = CommandDispatcher::new(Registry::new()).announce(false);
        let json = serde_json::to_value(d.run(&["nope"])).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["exit_code"], -1);
        assert_eq!(json["steps"][0]["status"], "not_found");
    }

    #[cfg(unix)]
    #[test]
    fn end_to_end_with_real_scripts() {
        use crate::config::DispatcherConfig;
        use crate::dispatch::runner::SystemRunner;

        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        std::fs::create_dir(&tools).unwrap();
        std::fs::write(tools.join("build.sh"), "exit 0\n").unwrap();
        std::fs::write(tools.join("run.sh"), "exit 2\n").unwrap();
        std::fs::write(tools.join("gen.sh"), "touch gen-ran\n").unwrap();

        let config = DispatcherConfig {
            working_dir: dir.path().to_path_buf(),
            script_extension: "sh".into(),
            interpreter: "sh".into(),
            ..DispatcherConfig::default()
        };
        let mut reg = Registry::new();
        reg.discover_scripts(&config, Arc::new(SystemRunner::new().unwrap()))
            .unwrap();
        let d = CommandDispatcher::new(reg).announce(false);

        let report = d.run(&["build", "run", "gen"]);
        assert_eq!(report.exit_code, 2);
        assert_eq!(report.attempted(), vec!["build", "run"]);
        assert!(!dir.path().join("gen-ran").exists());

        let report = d.run(&["gen"]);
        assert_eq!(report.exit_code, 0);
        assert!(dir.path().join("gen-ran").exists());
    }
}
