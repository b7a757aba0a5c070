//! Script-backed command: `<interpreter...> <tools>/<name>.<ext>`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use super::registry::CommandHandler;
use super::runner::{ProcessRunner, ProcessSpec};
use crate::error::DispatchError;

pub struct ScriptCommand {
    name: String,
    path: PathBuf,
    launcher: Vec<String>,
    cwd: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl ScriptCommand {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        launcher: Vec<String>,
        cwd: impl Into<PathBuf>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            launcher,
            cwd: cwd.into(),
            runner,
        }
    }

    pub fn process_spec(&self) -> ProcessSpec {
        let script = self.path.to_string_lossy().into_owned();
        let spec = match self.launcher.split_first() {
            Some((program, rest)) => ProcessSpec::new(program.clone())
                .args(rest.iter().cloned())
                .arg(script),
            None => ProcessSpec::new(script),
        };
        spec.cwd(self.cwd.clone())
    }
}

impl CommandHandler for ScriptCommand {
    fn run(&self) -> Result<i32> {
        // The file may have vanished since discovery.
        if !self.path.is_file() {
            return Err(DispatchError::CommandNotFound {
                name: self.name.clone(),
            }
            .into());
        }
        self.runner.run(&self.process_spec())
    }

    fn describe(&self) -> String {
        format!("script: {}", self.path.display())
    }
}
