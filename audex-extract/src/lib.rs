//! # audex extractor library (audex-extract)
//!
//! Extracts the first audio stream of a media container and writes it as raw,
//! headerless, interleaved PCM in the decoder's native sample encoding.
//!
//! **Pipeline:** container setup → demux driver (per packet) → frame decode
//! loop (per packet, 0+ frames) → interleaver (planar frames only) → PCM sink
//!
//! **Architecture:** single-threaded and synchronous, using symphonia for
//! container parsing and decoding.

pub mod audio;
pub mod config;
pub mod demux;
pub mod error;
pub mod pipeline;

pub use config::ExtractConfig;
pub use error::{Error, Result};
pub use pipeline::{extract, run_extraction, ExtractReport};
