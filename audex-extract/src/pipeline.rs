//! Extraction pipeline
//!
//! Wires container setup, the demux driver, the frame decode loop and the PCM
//! sink together for one run.

use crate::audio::container::SymphoniaContainer;
use crate::audio::decode_loop::{DecodeStats, FrameDecodeLoop};
use crate::audio::sink::{FileSink, PcmSink};
use crate::audio::types::{MediaType, StreamDescriptor};
use crate::config::ExtractConfig;
use crate::demux::{first_stream_of_type, DemuxDriver, DemuxStats, MediaContainer};
use crate::error::{Error, Result};
use audex_common::DecodeErrorPolicy;
use std::fmt;
use tracing::info;

/// Summary of a completed extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    /// The audio stream that was extracted
    pub stream: StreamDescriptor,
    pub demux: DemuxStats,
    pub decode: DecodeStats,
}

impl ExtractReport {
    pub fn bytes_written(&self) -> u64 {
        self.decode.bytes_written
    }

    /// Raw PCM player arguments describing the output (`-f <fmt> -ac <n> -ar <hz>`).
    ///
    /// `None` when no frame was decoded, since the format is then unknown.
    pub fn playback_hint(&self) -> Option<String> {
        let layout = self.decode.layout?;
        let mut hint = format!("-f {} -ac {}", layout.format.encoding, layout.channels);
        if let Some(rate) = self.stream.sample_rate {
            hint.push_str(&format!(" -ar {}", rate));
        }
        Some(hint)
    }
}

impl fmt::Display for ExtractReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stream #{} ({}): {} frames, {} bytes written",
            self.stream.index, self.stream.codec, self.decode.frames, self.decode.bytes_written
        )?;
        if let Some(hint) = self.playback_hint() {
            write!(f, " [{}]", hint)?;
        }
        write!(
            f,
            "; packets read {}, decoded {}, ignored {}, skipped {}",
            self.demux.packets_read,
            self.demux.packets_decoded,
            self.demux.packets_ignored,
            self.demux.packets_skipped
        )
    }
}

/// Extract the first audio stream of `container` into `sink`.
///
/// Fails before reading any packet if the container has no audio stream or
/// its decoder cannot be opened. The decoder is closed on every path once opened.
pub fn run_extraction<C, S>(
    container: &mut C,
    sink: &mut S,
    on_decode_error: DecodeErrorPolicy,
    max_consecutive_decode_errors: u32,
) -> Result<ExtractReport>
where
    C: MediaContainer,
    S: PcmSink + ?Sized,
{
    let stream = first_stream_of_type(container.streams(), MediaType::Audio)
        .cloned()
        .ok_or(Error::NoAudioStream)?;
    info!("Selected {}", stream);

    let mut decode_loop = FrameDecodeLoop::new(container.open_decoder(stream.index)?);
    let driver = DemuxDriver::new(stream.index)
        .with_error_policy(on_decode_error, max_consecutive_decode_errors);

    let demux = driver.run(container, &mut decode_loop, sink);
    let decode = decode_loop.close();
    let demux = demux?;

    Ok(ExtractReport {
        stream,
        demux,
        decode,
    })
}

/// Extract the audio of `config.input` into `config.output`.
pub fn extract(config: &ExtractConfig) -> Result<ExtractReport> {
    info!(
        "Extracting audio from {} to {} (output mode: {}, decode errors: {})",
        config.input.display(),
        config.output.display(),
        config.output_mode,
        config.on_decode_error
    );

    let mut container = SymphoniaContainer::open(&config.input)?;
    container.dump_streams();

    let mut sink = FileSink::new(&config.output, config.output_mode);
    let report = run_extraction(
        &mut container,
        &mut sink,
        config.on_decode_error,
        config.max_consecutive_decode_errors,
    )?;
    sink.finish()?;

    info!("Extraction complete: {}", report);
    Ok(report)
}
