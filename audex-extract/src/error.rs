//! Error types for audex-extract
//!
//! Every failure in the extraction run is returned as a typed [`Error`]; the
//! binary maps each kind to its own process exit code.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for missing or malformed command-line arguments
pub const USAGE_EXIT_CODE: u8 = 1;

/// Main error type for audex-extract
#[derive(Error, Debug)]
pub enum Error {
    /// Settings could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] audex_common::Error),

    /// Input media file could not be opened
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Container format not recognised
    #[error("Failed to probe format: {0}")]
    Probe(String),

    /// Container has no audio stream
    #[error("No audio stream found")]
    NoAudioStream,

    /// No decoder available for the chosen stream
    #[error("Unsupported codec for stream #{index}: {reason}")]
    UnsupportedCodec { index: usize, reason: String },

    /// Container read failure (the demux driver treats this as end of input)
    #[error("Packet read error: {0}")]
    Read(String),

    /// Codec rejected a packet
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Decoder reported an impossible consumption count
    #[error("Decoder protocol violation: {0}")]
    Protocol(String),

    /// Size or layout mismatch between a frame and its byte-size computation
    #[error("Internal error: {0}")]
    Internal(String),

    /// Output sink could not be opened or written
    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) => 2,
            Error::Open { .. }
            | Error::Probe(_)
            | Error::NoAudioStream
            | Error::UnsupportedCodec { .. } => 3,
            Error::Decode(_) | Error::Protocol(_) => 4,
            Error::Internal(_) => 5,
            Error::Read(_) | Error::Output { .. } => 6,
        }
    }
}

/// Convenience Result type using audex-extract Error
pub type Result<T> = std::result::Result<T, Error>;
