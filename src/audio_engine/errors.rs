//! Audio-specific error types.

use thiserror::Error;

/// Errors that can occur while setting up the duplex audio stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// No default input device is available.
    #[error("no audio input device found")]
    NoInputDevice,

    /// No default output device is available.
    #[error("no audio output device found")]
    NoOutputDevice,

    /// Failed to query a device's default configuration.
    #[error("no default stream config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    /// Failed to build an input or output stream.
    #[error("failed to build audio stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    /// Failed to start a stream.
    #[error("failed to play audio stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

/// Reasons a persisted state blob is rejected.
///
/// These never reach the host; decoding collapses them to "no state".
#[derive(Debug, Error)]
pub enum StateDecodeError {
    /// The blob is not a valid state document.
    #[error("malformed state document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document carries a foreign tag.
    #[error("unexpected state tag {found:?}")]
    TagMismatch {
        /// Tag found in the document.
        found: String,
    },

    /// The document declares a schema version that was never produced.
    #[error("unsupported state version {0}")]
    UnsupportedVersion(u32),
}
