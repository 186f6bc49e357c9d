//! Container and codec setup using symphonia
//!
//! Opens a media file, describes its streams, and resolves decoders for them.
//! Decoders emit planar frames in the codec's native sample encoding; no
//! sample conversion is performed here.
//!
//! Supported formats follow the symphonia features in Cargo.toml (MP3, FLAC,
//! AAC, MP4/M4A, Vorbis, WAV, MKV/WebM, Ogg, ADPCM) plus Opus with the `opus`
//! feature.

use super::decode_loop::{DecodeStep, FrameDecoder};
use super::types::{
    DecodedFrame, MediaType, Packet, SampleEncoding, SampleFormat, StreamDescriptor,
};
use crate::demux::MediaContainer;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{CodecRegistry, Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet as SymphoniaPacket, Track};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, info, warn};

/// Codec registry shared by every container opened in the process.
fn codec_registry() -> &'static CodecRegistry {
    static CODEC_REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();
    CODEC_REGISTRY.get_or_init(|| {
        let mut registry = CodecRegistry::new();
        // Registered first so it wins over any other Opus implementation
        #[cfg(feature = "opus")]
        registry.register_all::<symphonia_adapter_libopus::OpusDecoder>();
        registry.register_all::<symphonia::default::codecs::MpaDecoder>();
        registry.register_all::<symphonia::default::codecs::PcmDecoder>();
        registry.register_all::<symphonia::default::codecs::VorbisDecoder>();
        registry.register_all::<symphonia::default::codecs::FlacDecoder>();
        registry.register_all::<symphonia::default::codecs::AdpcmDecoder>();
        registry.register_all::<symphonia::default::codecs::AacDecoder>();
        registry
    })
}

/// A media file opened for demuxing.
pub struct SymphoniaContainer {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    streams: Vec<StreamDescriptor>,
}

impl SymphoniaContainer {
    /// Open and probe a media file.
    ///
    /// # Errors
    /// - [`Error::Open`] if the file cannot be opened
    /// - [`Error::Probe`] if no container format recognises it
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening container: {}", path.display());

        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Probe(format!("{}: {}", path.display(), e)))?;

        let format = probed.format;
        let streams = format
            .tracks()
            .iter()
            .enumerate()
            .map(|(index, track)| describe_track(index, track))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            format,
            streams,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log every stream of the container.
    pub fn dump_streams(&self) {
        info!("Input {}: {} stream(s)", self.path.display(), self.streams.len());
        for stream in &self.streams {
            info!("  {}", stream);
        }
    }

    fn stream_index_of(&self, track_id: u32) -> Option<usize> {
        self.streams.iter().position(|s| s.id == track_id)
    }
}

fn describe_track(index: usize, track: &Track) -> StreamDescriptor {
    let params = &track.codec_params;
    let (media_type, codec) = if params.codec == CODEC_TYPE_NULL {
        (MediaType::Other, "none".to_string())
    } else {
        let codec = codec_registry()
            .get_codec(params.codec)
            .map(|descriptor| descriptor.short_name.to_string())
            .unwrap_or_else(|| format!("{:?}", params.codec));
        (MediaType::Audio, codec)
    };

    StreamDescriptor {
        index,
        id: track.id,
        media_type,
        codec,
        sample_rate: params.sample_rate,
        channels: params.channels.map(|c| c.count()),
        bits_per_sample: params.bits_per_sample,
        frames: params.n_frames,
    }
}

impl MediaContainer for SymphoniaContainer {
    type Decoder = SymphoniaFrameDecoder;

    fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    fn open_decoder(&self, index: usize) -> Result<SymphoniaFrameDecoder> {
        let track = self
            .format
            .tracks()
            .get(index)
            .ok_or_else(|| Error::UnsupportedCodec {
                index,
                reason: "no such stream".to_string(),
            })?;

        let decoder = codec_registry()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::UnsupportedCodec {
                index,
                reason: e.to_string(),
            })?;

        debug!("Opened decoder for stream #{} (track id {})", index, track.id);
        Ok(SymphoniaFrameDecoder::new(decoder, track.id))
    }

    fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(Error::Read(e.to_string())),
            };

            let Some(stream_index) = self.stream_index_of(packet.track_id()) else {
                debug!("Dropping packet of undeclared track {}", packet.track_id());
                continue;
            };

            return Ok(Some(Packet {
                stream_index,
                ts: packet.ts,
                dur: packet.dur,
                data: packet.data,
            }));
        }
    }
}

/// Decoder state for one symphonia track.
pub struct SymphoniaFrameDecoder {
    decoder: Box<dyn Decoder>,
    track_id: u32,

    /// Reused for every decoded frame
    frame: DecodedFrame,
}

impl SymphoniaFrameDecoder {
    fn new(decoder: Box<dyn Decoder>, track_id: u32) -> Self {
        Self {
            decoder,
            track_id,
            frame: DecodedFrame::empty(),
        }
    }
}

impl FrameDecoder for SymphoniaFrameDecoder {
    /// Symphonia decodes a whole packet per call, so every step consumes all of
    /// `input`. A packet that only primes the codec reports no frame.
    fn decode(&mut self, packet: &Packet, input: &[u8]) -> Result<DecodeStep> {
        let packet = SymphoniaPacket::new_from_slice(self.track_id, packet.ts, packet.dur, input);

        let decoded = match self.decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => return Err(Error::Decode(msg.to_string())),
            Err(SymphoniaError::ResetRequired) => {
                self.decoder.reset();
                return Err(Error::Decode(
                    "stream parameters changed, decoder was reset".to_string(),
                ));
            }
            Err(e) => return Err(Error::Decode(e.to_string())),
        };

        let frame_ready = copy_planes(&decoded, &mut self.frame);
        Ok(DecodeStep {
            consumed: input.len(),
            frame_ready,
        })
    }

    fn frame(&self) -> &DecodedFrame {
        &self.frame
    }

    fn close(&mut self) {
        let result = self.decoder.finalize();
        match result.verify_ok {
            Some(true) => info!("Decoder verification passed"),
            Some(false) => warn!("Decoder verification failed: decoded audio does not match the stream checksum"),
            None => {}
        }
    }
}

/// Copy a symphonia buffer into `frame` as little-endian planes.
///
/// Returns false for an empty buffer.
fn copy_planes(decoded: &AudioBufferRef<'_>, frame: &mut DecodedFrame) -> bool {
    match decoded {
        AudioBufferRef::U8(buf) => fill_planes(&**buf, SampleEncoding::U8, frame, |s, out| out.push(*s)),
        AudioBufferRef::U16(buf) => fill_planes(&**buf, SampleEncoding::U16, frame, |s, out| {
            out.extend_from_slice(&s.to_le_bytes())
        }),
        AudioBufferRef::U24(buf) => fill_planes(&**buf, SampleEncoding::U24, frame, |s, out| {
            out.extend_from_slice(&s.inner().to_le_bytes()[..3])
        }),
        AudioBufferRef::U32(buf) => fill_planes(&**buf, SampleEncoding::U32, frame, |s, out| {
            out.extend_from_slice(&s.to_le_bytes())
        }),
        AudioBufferRef::S8(buf) => fill_planes(&**buf, SampleEncoding::S8, frame, |s, out| {
            out.push(*s as u8)
        }),
        AudioBufferRef::S16(buf) => fill_planes(&**buf, SampleEncoding::S16, frame, |s, out| {
            out.extend_from_slice(&s.to_le_bytes())
        }),
        AudioBufferRef::S24(buf) => fill_planes(&**buf, SampleEncoding::S24, frame, |s, out| {
            out.extend_from_slice(&s.inner().to_le_bytes()[..3])
        }),
        AudioBufferRef::S32(buf) => fill_planes(&**buf, SampleEncoding::S32, frame, |s, out| {
            out.extend_from_slice(&s.to_le_bytes())
        }),
        AudioBufferRef::F32(buf) => fill_planes(&**buf, SampleEncoding::F32, frame, |s, out| {
            out.extend_from_slice(&s.to_le_bytes())
        }),
        AudioBufferRef::F64(buf) => fill_planes(&**buf, SampleEncoding::F64, frame, |s, out| {
            out.extend_from_slice(&s.to_le_bytes())
        }),
    }
}

fn fill_planes<S, F>(
    buf: &AudioBuffer<S>,
    encoding: SampleEncoding,
    frame: &mut DecodedFrame,
    write: F,
) -> bool
where
    S: Sample,
    F: Fn(&S, &mut Vec<u8>),
{
    let channels = buf.spec().channels.count();
    let nb_samples = buf.frames();
    frame.reset(nb_samples, channels, SampleFormat::planar(encoding));

    for ch in 0..channels {
        if let Some(plane) = frame.plane_mut(ch) {
            plane.reserve(nb_samples * encoding.bytes_per_sample());
            for sample in buf.chan(ch) {
                write(sample, plane);
            }
        }
    }

    nb_samples > 0
}
