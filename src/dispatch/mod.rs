/*!
Command dispatch.

  registry.rs    (CommandHandler trait + Registry, tools-dir discovery)
  script.rs      (ScriptCommand: tools/<name>.<ext> launched as a child)
  runner.rs      (ProcessRunner seam + tokio-backed SystemRunner)
  dispatcher.rs  (CommandDispatcher: fail-fast sequential run + RunReport)
*/

pub mod dispatcher;
pub mod registry;
pub mod runner;
pub mod script;

pub use dispatcher::CommandDispatcher;
pub use registry::{CommandHandler, Registry};
pub use runner::{OutputTarget, ProcessRunner, ProcessSpec, SystemRunner};
