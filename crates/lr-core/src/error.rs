//! Error types for the PS2 libretro bridge

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the bridge
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("GS error: {0}")]
    Gs(#[from] GsError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

/// Errors that abort `load_game`. No session exists after any of these.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not find any valid PS2 BIOS file in {}", .0.display())]
    NoBios(PathBuf),

    #[error("Media unreadable: {}: {source}", path.display())]
    MediaUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No hardware context accepted by the frontend (requested {0})")]
    ContextNegotiation(String),

    #[error("Core not initialized")]
    NotInitialized,

    #[error("A game is already loaded")]
    AlreadyLoaded,

    #[error("Virtual machine failed to start: {0}")]
    Machine(String),
}

/// Graphics worker errors
#[derive(Error, Debug)]
pub enum GsError {
    #[error("Graphics worker is not open")]
    NotOpen,

    #[error("Graphics worker is already open")]
    AlreadyOpen,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Graphics worker thread is gone")]
    WorkerGone,

    #[error("Failed to spawn graphics worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Persisted configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, CoreError>;
