//! Test helper modules for audex integration tests

#![allow(dead_code)]

pub mod audio_generator;

pub use audio_generator::{write_wav, WavFixture};
