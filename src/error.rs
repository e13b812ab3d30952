//! Error types for the reconciliation engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors while running the external save converter.
///
/// Never fatal: the tracker falls back to the placeholder boss list.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("converter tool not found at {path}")]
    ToolMissing { path: PathBuf },

    #[error("failed to spawn converter {path}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("converter exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("failed to create temporary output file")]
    TempFile(#[source] std::io::Error),

    #[error("failed to read converter output {path}")]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("converter output is not valid save data")]
    Malformed(#[from] serde_json::Error),
}

/// Errors while reading or writing the reference catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write catalog {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize catalog")]
    Serialize(#[source] serde_json::Error),

    #[error("editing catalog entry '{raw_identifier}' is disabled")]
    EditingDisabled { raw_identifier: String },
}

/// Errors from the per-save manual override store
#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("failed to create override directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read overrides {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse overrides {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write overrides {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove overrides {path}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize overrides")]
    Serialize(#[source] serde_json::Error),

    #[error("no save file is being tracked")]
    NoActiveSave,

    #[error("manual edits of detected boss '{raw_identifier}' are disabled")]
    EditingDisabled { raw_identifier: String },
}

/// Errors while setting up the save file watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("failed to initialize file watcher")]
    InitWatcher(#[source] notify::Error),

    #[error("failed to watch path {path}")]
    WatchPath {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("save path {path} has no file name or parent directory")]
    MissingParent { path: PathBuf },
}

/// Errors while persisting the application configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),
}
