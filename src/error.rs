use std::path::PathBuf;

use thiserror::Error;

use crate::ambience::AmbientSound;

/// Errors that can occur in the OpenLore overlay
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Error reading or parsing configuration
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// No audio file exists for the requested sound
    #[error("audio file not found for {sound} in {}", .dir.display())]
    AudioResourceMissing {
        /// The sound that was requested
        sound: AmbientSound,
        /// Directory that was searched
        dir: PathBuf,
    },

    /// The audio file exists but could not be opened, decoded or played
    #[error("failed to initialize audio for {sound}: {reason}")]
    AudioInitError {
        /// The sound that was requested
        sound: AmbientSound,
        /// What went wrong
        reason: String,
    },

    /// A line typed on the command input could not be understood
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Error reading the command input
    #[error("failed to read command input: {0}")]
    InputError(#[source] std::io::Error),
}

/// Result type alias for overlay operations
pub type Result<T> = std::result::Result<T, OverlayError>;
