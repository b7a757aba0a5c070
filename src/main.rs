use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

mod build;
mod builtin;
mod config;
mod dispatch;
mod error;
mod platform;
mod utils;

use config::DispatcherConfig;
use dispatch::{CommandDispatcher, OutputTarget, SystemRunner};
use utils::style::{Role, color};

/// Vegam - run tools/<command> scripts in order, stopping at the first failure.
///
/// Usage:
///   vegam gen buildsln run
///   vegam --list
///   vegam --json buildsln
///
/// Commands:
///   buildsln   Builtin: MSBuild on Windows (incl. the Linux compatibility layer), make elsewhere
///   version    Builtin: print engine name and version
///   <name>     Any tools/<name>.<ext> script (overrides a builtin of the same name)
///
/// Global flags / env:
///   -v / -vv          Increase verbosity
///   -q / --quiet      Errors only
///   --config PATH     YAML config (or VEGAM_CONFIG env; else ./vegam.yaml if present)
///   --tools-dir DIR   Tools directory override
///   MS_BUILD_PATH     Raw MSBuild path used by `buildsln` on Windows
///
/// Exit code: 0 when every command succeeds, otherwise the first non-zero
/// exit code, or -1 for an unknown command or a command that could not run.
#[derive(Parser, Debug)]
#[command(
    name = "vegam",
    version,
    about = "Vegam - tools-directory command dispatcher",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long)]
    quiet: bool,

    /// YAML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Tools directory (relative to the working directory unless absolute)
    #[arg(long = "tools-dir", value_name = "DIR")]
    tools_dir: Option<PathBuf>,

    /// Build configuration passed to MSBuild / make
    #[arg(long = "configuration", value_name = "NAME")]
    configuration: Option<String>,

    /// Print a JSON run report instead of human-readable banners
    #[arg(long)]
    json: bool,

    /// List available commands and exit
    #[arg(long)]
    list: bool,

    /// Commands to run, in order
    #[arg(value_name = "COMMAND")]
    commands: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let mut config = DispatcherConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.tools_dir, cli.configuration);

    let output = OutputTarget::for_json(cli.json);
    let runner = Arc::new(SystemRunner::new()?.with_output(output));
    let registry =
        builtin::startup_registry(&config, runner, platform::detect_platform(), output)?;

    if cli.list {
        print_list(&registry, cli.json);
        return Ok(());
    }

    if cli.commands.is_empty() {
        crate::log_info!("no commands given (try --list)");
        return Ok(());
    }

    let dispatcher = CommandDispatcher::new(registry).announce(!cli.json && !cli.quiet);
    let report = dispatcher.run(cli.commands.as_slice());
    crate::log_debug!("attempted {:?} -> exit {}", report.attempted(), report.exit_code);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    std::process::exit(report.exit_code);
}

fn print_list(registry: &dispatch::Registry, json: bool) {
    if json {
        let items: Vec<_> = registry
            .iter()
            .map(|(name, h)| serde_json::json!({ "name": name, "description": h.describe() }))
            .collect();
        println!(
            "{}",
            serde_json::json!({ "count": items.len(), "commands": items })
        );
        return;
    }
    if registry.is_empty() {
        println!("No commands available.");
        return;
    }
    println!("Commands ({})", registry.len());
    for (name, handler) in registry.iter() {
        println!(
            "  {} {}",
            color(Role::Primary, format!("{name:<12}")),
            color(Role::Dim, handler.describe())
        );
    }
}
