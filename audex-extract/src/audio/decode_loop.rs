//! Frame decode loop
//!
//! Feeds one packet at a time to a [`FrameDecoder`] until the packet is fully
//! consumed. A decoder may consume only part of its input per call and may
//! report zero, one or several completed frames for a single packet (codec
//! delay means a frame can complete on a later packet than the one that
//! started it). Each completed frame is written to the sink in interleaved
//! order before the next decode call overwrites it.

use super::interleave::interleave;
use super::sink::PcmSink;
use super::types::{DecodedFrame, Packet, SampleFormat};
use crate::error::{Error, Result};
use tracing::{debug, trace, warn};

/// Frames a decoder may emit in a row without consuming input before the
/// loop treats it as stuck.
pub const MAX_FRAMES_WITHOUT_PROGRESS: usize = 64;

/// Outcome of one decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStep {
    /// Compressed bytes taken from the front of the input
    pub consumed: usize,

    /// A complete frame is available through [`FrameDecoder::frame`]
    pub frame_ready: bool,
}

/// Stateful audio decoder for one stream.
pub trait FrameDecoder {
    /// Decode from `input`, the unconsumed tail of `packet`.
    fn decode(&mut self, packet: &Packet, input: &[u8]) -> Result<DecodeStep>;

    /// The frame completed by the last decode call that reported `frame_ready`.
    ///
    /// Valid only until the next call to [`decode`](Self::decode).
    fn frame(&self) -> &DecodedFrame;

    /// Release codec resources at the end of the run.
    fn close(&mut self) {}
}

/// Read position within a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketCursor {
    offset: usize,
    remaining: usize,
}

impl PacketCursor {
    /// Cursor spanning a whole packet of `len` bytes
    pub fn new(len: usize) -> Self {
        Self {
            offset: 0,
            remaining: len,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Move past `consumed` bytes.
    ///
    /// # Errors
    /// [`Error::Protocol`] if `consumed` exceeds the remaining bytes; the cursor is unchanged.
    pub fn advance(&mut self, consumed: usize) -> Result<()> {
        if consumed > self.remaining {
            return Err(Error::Protocol(format!(
                "decoder consumed {} bytes with only {} remaining at offset {}",
                consumed, self.remaining, self.offset
            )));
        }
        self.offset += consumed;
        self.remaining -= consumed;
        Ok(())
    }
}

/// Shape of the PCM written to the sink, taken from the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLayout {
    pub channels: usize,

    /// Format as produced by the decoder (the sink always receives it interleaved)
    pub format: SampleFormat,
}

/// Running totals for the decode loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Packets fully consumed
    pub packets: u64,
    pub frames: u64,
    /// Samples per channel across all frames
    pub samples: u64,
    pub bytes_written: u64,
    pub layout: Option<OutputLayout>,
}

/// Owns the decoder state for the chosen stream and routes frames to a sink.
pub struct FrameDecodeLoop<D> {
    decoder: D,

    /// Interleave buffer, grown to the largest frame seen
    scratch: Vec<u8>,

    stats: DecodeStats,
}

impl<D: FrameDecoder> FrameDecodeLoop<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            scratch: Vec::new(),
            stats: DecodeStats::default(),
        }
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Decode all of `packet`, writing every completed frame to `sink`.
    ///
    /// Returns the number of frames written.
    ///
    /// # Errors
    /// - [`Error::Decode`] from the decoder
    /// - [`Error::Protocol`] when the decoder over-consumes or stops making progress
    /// - [`Error::Internal`] when a frame's buffers disagree with its size
    /// - sink errors
    pub fn consume_packet<S: PcmSink + ?Sized>(
        &mut self,
        packet: &Packet,
        sink: &mut S,
    ) -> Result<usize> {
        let mut cursor = PacketCursor::new(packet.len());
        let mut frames = 0;
        let mut frames_without_progress = 0;

        while !cursor.is_exhausted() {
            let step = self
                .decoder
                .decode(packet, &packet.data[cursor.offset()..])?;
            cursor.advance(step.consumed)?;
            trace!(
                consumed = step.consumed,
                remaining = cursor.remaining(),
                frame_ready = step.frame_ready,
                "decode step"
            );

            if step.consumed > 0 {
                frames_without_progress = 0;
            } else if step.frame_ready {
                frames_without_progress += 1;
                if frames_without_progress > MAX_FRAMES_WITHOUT_PROGRESS {
                    return Err(Error::Protocol(format!(
                        "decoder produced {} frames without consuming input at offset {} of a {}-byte packet",
                        frames_without_progress,
                        cursor.offset(),
                        packet.len()
                    )));
                }
            }

            if step.frame_ready {
                self.write_frame(sink)?;
                frames += 1;
            } else if step.consumed == 0 {
                return Err(Error::Protocol(format!(
                    "decoder made no progress at offset {} of a {}-byte packet",
                    cursor.offset(),
                    packet.len()
                )));
            }
        }

        self.stats.packets += 1;
        Ok(frames)
    }

    fn write_frame<S: PcmSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        let frame = self.decoder.frame();
        let data_size = frame.data_size();

        match self.stats.layout {
            None => {
                debug!(
                    "First frame: {} channels, {}, {} samples",
                    frame.channels, frame.format, frame.nb_samples
                );
                self.stats.layout = Some(OutputLayout {
                    channels: frame.channels,
                    format: frame.format,
                });
            }
            Some(layout) if layout.channels != frame.channels || layout.format != frame.format => {
                warn!(
                    "Frame {} changes output from {} channels {} to {} channels {}; raw output is now ambiguous",
                    self.stats.frames, layout.channels, layout.format, frame.channels, frame.format
                );
            }
            Some(_) => {}
        }

        if data_size > 0 {
            if frame.format.planar {
                if self.scratch.len() < data_size {
                    self.scratch.resize(data_size, 0);
                }
                let out = &mut self.scratch[..data_size];
                interleave(frame.planes(), out, frame.channels, frame.format, data_size)?;
                sink.write_pcm(out)?;
            } else {
                let buffer = frame.planes().first().map(Vec::as_slice).unwrap_or(&[]);
                if buffer.len() < data_size {
                    return Err(Error::Internal(format!(
                        "interleaved frame holds {} bytes, expected {}",
                        buffer.len(),
                        data_size
                    )));
                }
                sink.write_pcm(&buffer[..data_size])?;
            }
        }

        self.stats.frames += 1;
        self.stats.samples += frame.nb_samples as u64;
        self.stats.bytes_written += data_size as u64;
        Ok(())
    }

    /// Close the decoder and return the final totals.
    pub fn close(mut self) -> DecodeStats {
        self.decoder.close();
        self.stats
    }
}
