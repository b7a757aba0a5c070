//! Domain error taxonomy for dispatch and build invocation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid command: {name}")]
    CommandNotFound { name: String },

    #[error("unsupported host platform '{raw}' (expected windows, linux or macos)")]
    UnknownPlatform { raw: String },

    #[error("environment variable {var} is not set")]
    MissingEnv { var: String },

    #[error("build tool path '{raw}' is too short to trim")]
    MalformedBuildToolPath { raw: String },

    #[error("failed to spawn '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
