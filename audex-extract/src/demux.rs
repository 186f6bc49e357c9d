//! Stream demux driver
//!
//! Pulls packets from a [`MediaContainer`] in container order and hands the
//! ones belonging to the selected stream to the [`FrameDecodeLoop`]. Packets of
//! other streams are dropped without being decoded. Every packet is owned by
//! exactly one holder at a time, so each is released exactly once on every path.

use crate::audio::decode_loop::{FrameDecodeLoop, FrameDecoder};
use crate::audio::sink::PcmSink;
use crate::audio::types::{MediaType, Packet, StreamDescriptor};
use crate::error::{Error, Result};
use audex_common::DecodeErrorPolicy;
use tracing::{debug, trace, warn};

/// An opened media container.
pub trait MediaContainer {
    type Decoder: FrameDecoder;

    /// Streams discovered when the container was opened
    fn streams(&self) -> &[StreamDescriptor];

    /// Open a decoder for the stream whose [`StreamDescriptor::index`] is `index`.
    fn open_decoder(&self, index: usize) -> Result<Self::Decoder>;

    /// Next packet in container order, or `None` at end of stream.
    fn next_packet(&mut self) -> Result<Option<Packet>>;
}

/// First stream of `media_type` in container order, if any.
pub fn first_stream_of_type(
    streams: &[StreamDescriptor],
    media_type: MediaType,
) -> Option<&StreamDescriptor> {
    streams.iter().find(|s| s.media_type == media_type)
}

/// Packet counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxStats {
    pub packets_read: u64,
    pub packets_decoded: u64,
    /// Packets of other streams, released undecoded
    pub packets_ignored: u64,
    /// Selected-stream packets dropped after a decode error
    pub packets_skipped: u64,
}

/// Drives packets from a container into a decode loop.
#[derive(Debug, Clone)]
pub struct DemuxDriver {
    stream_index: usize,
    on_decode_error: DecodeErrorPolicy,
    max_consecutive_errors: u32,
}

impl DemuxDriver {
    /// Driver for `stream_index` that aborts on the first decode error.
    pub fn new(stream_index: usize) -> Self {
        Self {
            stream_index,
            on_decode_error: DecodeErrorPolicy::Abort,
            max_consecutive_errors: 0,
        }
    }

    /// With [`DecodeErrorPolicy::Skip`], up to `max_consecutive_errors` packets in
    /// a row may fail to decode before the run is aborted.
    pub fn with_error_policy(mut self, policy: DecodeErrorPolicy, max_consecutive_errors: u32) -> Self {
        self.on_decode_error = policy;
        self.max_consecutive_errors = max_consecutive_errors;
        self
    }

    /// Run until the container is exhausted.
    ///
    /// A packet read error ends the run like end of stream does.
    pub fn run<C, S>(
        &self,
        container: &mut C,
        decode_loop: &mut FrameDecodeLoop<C::Decoder>,
        sink: &mut S,
    ) -> Result<DemuxStats>
    where
        C: MediaContainer,
        S: PcmSink + ?Sized,
    {
        let mut stats = DemuxStats::default();
        let mut consecutive_errors = 0u32;

        loop {
            let packet = match container.next_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => {
                    debug!("Reached end of stream");
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet, treating as end of input: {}", e);
                    break;
                }
            };
            stats.packets_read += 1;

            if packet.stream_index != self.stream_index {
                trace!(stream = packet.stream_index, "Ignoring packet of other stream");
                stats.packets_ignored += 1;
                continue;
            }

            match decode_loop.consume_packet(&packet, sink) {
                Ok(frames) => {
                    trace!(ts = packet.ts, bytes = packet.len(), frames, "Decoded packet");
                    consecutive_errors = 0;
                    stats.packets_decoded += 1;
                }
                Err(Error::Decode(msg)) if self.on_decode_error == DecodeErrorPolicy::Skip => {
                    consecutive_errors += 1;
                    if consecutive_errors > self.max_consecutive_errors {
                        return Err(Error::Decode(format!(
                            "{} consecutive packets failed to decode, last: {}",
                            consecutive_errors, msg
                        )));
                    }
                    warn!(
                        packet = stats.packets_read,
                        ts = packet.ts,
                        bytes = packet.len(),
                        "Skipping undecodable packet: {}",
                        msg
                    );
                    stats.packets_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(stats)
    }
}
