/*!
registry.rs - name -> handler table built once at startup.

Builtins are registered first; `discover_scripts` then adds one entry per
`<tools>/<name>.<ext>` file, replacing a builtin of the same name.
*/

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use super::runner::ProcessRunner;
use super::script::ScriptCommand;
use crate::config::DispatcherConfig;

/// A dispatchable unit of work. Returns the exit code to propagate.
pub trait CommandHandler: Send + Sync {
    fn run(&self) -> Result<i32>;

    /// One-line description for `--list`.
    fn describe(&self) -> String;
}

#[derive(Default, Clone)]
pub struct Registry {
    entries: BTreeMap<String, Arc<dyn CommandHandler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a handler, returning the one it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Option<Arc<dyn CommandHandler>> {
        self.entries.insert(name.into(), handler)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.entries.get(name)
    }

    /// Sorted command names.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn CommandHandler>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register every script in the tools directory. A missing directory
    /// yields zero scripts. Returns the number registered.
    pub fn discover_scripts(
        &mut self,
        config: &DispatcherConfig,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<usize> {
        let tools = config.tools_path();
        if !tools.is_dir() {
            crate::log_debug!("registry: no tools directory at {}", tools.display());
            return Ok(0);
        }

        let launcher = config.interpreter_tokens()?;
        let read = std::fs::read_dir(&tools)
            .with_context(|| format!("Failed to read tools directory: {}", tools.display()))?;

        let mut count = 0;
        for entry in read {
            let path = entry
                .with_context(|| format!("Failed to read entry in {}", tools.display()))?
                .path();
            if !path.is_file() {
                continue;
            }
            let matches_ext = path
                .extension()
                .is_some_and(|e| e.to_string_lossy() == config.script_extension);
            if !matches_ext {
                continue;
            }
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            let handler = ScriptCommand::new(
                name.clone(),
                path.clone(),
                launcher.clone(),
                config.working_dir.clone(),
                runner.clone(),
            );
            if self.register(name.clone(), Arc::new(handler)).is_some() {
                crate::log_debug!("registry: script {} overrides builtin", path.display());
            } else {
                crate::log_trace!("registry: {} -> {}", name, path.display());
            }
            count += 1;
        }
        Ok(count)
    }
}
