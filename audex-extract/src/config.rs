//! audex-extract run configuration

use audex_common::{DecodeErrorPolicy, OutputMode, Settings};
use std::path::PathBuf;

/// Everything one extraction run needs, passed explicitly to [`crate::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Media file to read
    pub input: PathBuf,

    /// Raw PCM file to write
    pub output: PathBuf,

    pub output_mode: OutputMode,
    pub on_decode_error: DecodeErrorPolicy,
    pub max_consecutive_decode_errors: u32,
}

impl ExtractConfig {
    /// Configuration with default settings
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self::from_settings(input, output, &Settings::default())
    }

    pub fn from_settings(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        settings: &Settings,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            output_mode: settings.output_mode,
            on_decode_error: settings.on_decode_error,
            max_consecutive_decode_errors: settings.max_consecutive_decode_errors,
        }
    }
}
