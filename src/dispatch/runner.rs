/*!
runner.rs - child process execution seam.

`ProcessRunner` is the only place the dispatcher touches the OS process API.
`SystemRunner` spawns through `tokio::process` on a private runtime and
blocks until the child exits, so the dispatcher itself stays synchronous.
Tests substitute `RecordingRunner`.
*/

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::error::DispatchError;

/// Fully resolved child invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, a: impl Into<String>) -> Self {
        self.args.push(a.into());
        self
    }

    pub fn args<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Shell-quoted command line, for logs.
    pub fn display_line(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}

/// Where command output meant for the user goes. `Stderr` keeps stdout free
/// for the `--json` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputTarget {
    #[default]
    Stdout,
    Stderr,
}

impl OutputTarget {
    pub fn for_json(json: bool) -> Self {
        if json {
            OutputTarget::Stderr
        } else {
            OutputTarget::Stdout
        }
    }
}

/// Runs a child with inherited stdio and waits for it, returning its exit code.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, spec: &ProcessSpec) -> Result<i32>;
}

/// Real process runner.
pub struct SystemRunner {
    rt: tokio::runtime::Runtime,
    output: OutputTarget,
}

impl SystemRunner {
    pub fn new() -> Result<Self> {
        let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
        Ok(Self {
            rt,
            output: OutputTarget::Stdout,
        })
    }

    /// Route every child's stdout to `output` (stderr is always inherited).
    pub fn with_output(mut self, output: OutputTarget) -> Self {
        self.output = output;
        self
    }

    async fn run_async(spec: &ProcessSpec, output: OutputTarget) -> Result<i32> {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        if output == OutputTarget::Stderr {
            cmd.stdout(std::process::Stdio::from(std::io::stderr()));
        }
        let status = cmd.status().await.map_err(|source| DispatchError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        // No exit code means the child was killed by a signal.
        Ok(status.code().unwrap_or(-1))
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &ProcessSpec) -> Result<i32> {
        crate::log_debug!("spawn: {}", spec.display_line());
        self.rt.block_on(Self::run_async(spec, self.output))
    }
}
