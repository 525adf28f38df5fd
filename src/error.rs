//! Error types for the fallible edges of the crate
//!
//! The render path itself never returns errors; these cover settings
//! persistence, shader hot reload and logging setup.

use std::path::PathBuf;

use thiserror::Error;

use crate::effects::EffectKind;

/// Settings-related errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Parse(#[from] quick_xml::DeError),

    #[error("XML write error: {0}")]
    Serialize(#[from] quick_xml::SeError),

    #[error("Could not find config directory")]
    NoConfigDir,
}

/// Shader loading errors
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("Failed to read shader {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Shader file is not part of the catalog: {0}")]
    UnknownShaderFile(PathBuf),

    #[error("{kind} shader failed validation:\n{message}")]
    Invalid { kind: EffectKind, message: String },
}

/// Logging setup errors
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A global subscriber is already installed: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}
