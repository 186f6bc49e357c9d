//! Raw PCM output
//!
//! The output is a headerless byte stream: channel count, sample rate and
//! sample encoding are not recorded and have to be communicated separately.

use crate::error::{Error, Result};
use audex_common::OutputMode;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only destination for interleaved PCM bytes.
pub trait PcmSink {
    /// Write all of `bytes` after everything written so far.
    fn write_pcm(&mut self, bytes: &[u8]) -> Result<()>;

    /// Total bytes written during this run
    fn bytes_written(&self) -> u64;
}

/// In-memory sink
impl PcmSink for Vec<u8> {
    fn write_pcm(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.len() as u64
    }
}

/// File-backed sink.
///
/// The file is opened on the first write, so a run that fails before
/// producing any audio leaves the output path untouched. Every write is
/// handed to the OS before returning; a crash loses at most the write in
/// progress.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    mode: OutputMode,
    file: Option<File>,
    bytes_written: u64,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P, mode: OutputMode) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode,
            file: None,
            bytes_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn open(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            let mut options = OpenOptions::new();
            match self.mode {
                OutputMode::Truncate => options.write(true).create(true).truncate(true),
                OutputMode::Append => options.append(true).create(true),
            };
            let file = options.open(&self.path).map_err(|source| Error::Output {
                path: self.path.clone(),
                source,
            })?;
            debug!("Opened {} ({})", self.path.display(), self.mode);
            self.file = Some(file);
        }

        self.file.as_mut().ok_or_else(|| {
            Error::Internal(format!("{} not open after open", self.path.display()))
        })
    }

    /// Create the output if nothing was written, then sync it to disk.
    ///
    /// Returns the number of bytes written during this run.
    pub fn finish(mut self) -> Result<u64> {
        let path = self.path.clone();
        let file = self.open()?;
        file.sync_all()
            .map_err(|source| Error::Output { path, source })?;
        Ok(self.bytes_written)
    }
}

impl PcmSink for FileSink {
    fn write_pcm(&mut self, bytes: &[u8]) -> Result<()> {
        let path = self.path.clone();
        let file = self.open()?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|source| Error::Output { path, source })?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_writes_in_order() {
        let mut sink: Vec<u8> = Vec::new();
        sink.write_pcm(&[1, 2]).unwrap();
        sink.write_pcm(&[3]).unwrap();
        assert_eq!(sink, vec![1, 2, 3]);
        assert_eq!(sink.bytes_written(), 3);
    }

    #[test]
    fn test_vec_sink_through_trait_object() {
        let mut buffer: Vec<u8> = vec![7];
        {
            let sink: &mut dyn PcmSink = &mut buffer;
            sink.write_pcm(&[8, 9]).unwrap();
            assert_eq!(sink.bytes_written(), 3);
        }
        assert_eq!(buffer, vec![7, 8, 9]);
    }

    #[test]
    fn test_file_sink_opens_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pcm");

        let sink = FileSink::new(&path, OutputMode::Truncate);
        assert!(!sink.is_open());
        assert!(!path.exists());
        drop(sink);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_sink_truncates_stale_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pcm");
        std::fs::write(&path, b"stale data").unwrap();

        let mut sink = FileSink::new(&path, OutputMode::Truncate);
        sink.write_pcm(&[1, 2, 3]).unwrap();
        sink.write_pcm(&[4]).unwrap();
        assert_eq!(sink.finish().unwrap(), 4);

        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_file_sink_append_mode_keeps_existing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pcm");
        std::fs::write(&path, [9u8, 9]).unwrap();

        let mut sink = FileSink::new(&path, OutputMode::Append);
        sink.write_pcm(&[1, 2]).unwrap();
        assert_eq!(sink.bytes_written(), 2);
        sink.finish().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![9, 9, 1, 2]);
    }

    #[test]
    fn test_finish_creates_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pcm");

        let sink = FileSink::new(&path, OutputMode::Truncate);
        assert_eq!(sink.finish().unwrap(), 0);

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_unwritable_path_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.pcm");

        let mut sink = FileSink::new(&path, OutputMode::Truncate);
        let err = sink.write_pcm(&[0]).unwrap_err();

        assert!(matches!(err, Error::Output { .. }), "got {:?}", err);
        assert_eq!(sink.bytes_written(), 0);
    }
}
