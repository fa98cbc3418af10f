use std::path::PathBuf;

use thiserror::Error;

/// The main error type for casker operations
#[derive(Debug, Error)]
pub enum CaskerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No casker.yml found in {} or any parent directory", .start.display())]
    ConfigNotFound { start: PathBuf },

    #[error("Module '{}' is not installed", .path.display())]
    ModuleNotInstalled { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task name must not be empty")]
    EmptyName,

    #[error("Task already exists with name '{0}'.")]
    DuplicateTaskName(String),

    #[error("'{from}' refers to '{to}' which is not registered")]
    UnknownReference { from: String, to: String },

    #[error("Group '{group}' contains group '{member}'; groups may only contain tasks")]
    NestedGroup { group: String, member: String },

    #[error("Circular dependency detected: {0}")]
    DependencyCycle(String),

    #[error("Could not find task '{0}'.")]
    UnknownTaskRequested(String),

    #[error("Failed to spawn task '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Task {name} failed")]
    TaskProcessFailure { name: String },

    #[error("Interrupted")]
    Interrupted,
}

/// Result type alias for casker operations
pub type CaskerResult<T> = Result<T, CaskerError>;
