//! # audex common library
//!
//! Shared code for the audex workspace:
//! - Error type used by the settings layer
//! - Settings file discovery, TOML parsing and environment overrides
//! - Output and decode-error policies consumed by the extractor

pub mod config;
pub mod error;

pub use config::{DecodeErrorPolicy, OutputMode, Settings};
pub use error::{Error, Result};
