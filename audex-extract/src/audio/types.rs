//! Core audio data types
//!
//! Stream metadata, compressed packets and decoded frames as they move from the
//! container through the decoder to the PCM sink.

use std::fmt;

/// Kind of elementary stream carried by a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Audio,
    Video,
    Other,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Audio => write!(f, "audio"),
            MediaType::Video => write!(f, "video"),
            MediaType::Other => write!(f, "other"),
        }
    }
}

/// Read-only description of one stream in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Position of the stream in the container's stream list
    pub index: usize,

    /// Container-assigned stream identifier
    pub id: u32,

    pub media_type: MediaType,

    /// Codec short name (e.g. "flac", "pcm_s16le")
    pub codec: String,

    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
    pub bits_per_sample: Option<u32>,

    /// Total length in frames, when the container records it
    pub frames: Option<u64>,
}

impl StreamDescriptor {
    /// Descriptor with only the identifying fields set.
    pub fn new(index: usize, media_type: MediaType, codec: impl Into<String>) -> Self {
        Self {
            index,
            id: index as u32,
            media_type,
            codec: codec.into(),
            sample_rate: None,
            channels: None,
            bits_per_sample: None,
            frames: None,
        }
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stream #{} (id {}): {}, {}",
            self.index, self.id, self.media_type, self.codec
        )?;
        if let Some(rate) = self.sample_rate {
            write!(f, ", {} Hz", rate)?;
        }
        if let Some(channels) = self.channels {
            write!(f, ", {} channels", channels)?;
        }
        if let Some(bits) = self.bits_per_sample {
            write!(f, ", {} bits", bits)?;
        }
        if let Some(frames) = self.frames {
            write!(f, ", {} frames", frames)?;
        }
        Ok(())
    }
}

/// A chunk of compressed bytes read from the container.
///
/// Owned by whoever holds it; dropping the packet releases it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Index of the originating stream
    pub stream_index: usize,

    /// Presentation timestamp in the stream's time base
    pub ts: u64,

    /// Duration in the stream's time base
    pub dur: u64,

    pub data: Box<[u8]>,
}

impl Packet {
    pub fn new(stream_index: usize, data: impl Into<Box<[u8]>>) -> Self {
        Self {
            stream_index,
            ts: 0,
            dur: 0,
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Numeric encoding of a single sample.
///
/// Multi-byte encodings are little-endian; 24-bit encodings are packed into 3 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    U8,
    U16,
    U24,
    U32,
    S8,
    S16,
    S24,
    S32,
    F32,
    F64,
}

impl SampleEncoding {
    /// Width of one sample in bytes
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleEncoding::U8 | SampleEncoding::S8 => 1,
            SampleEncoding::U16 | SampleEncoding::S16 => 2,
            SampleEncoding::U24 | SampleEncoding::S24 => 3,
            SampleEncoding::U32 | SampleEncoding::S32 | SampleEncoding::F32 => 4,
            SampleEncoding::F64 => 8,
        }
    }

    /// Raw PCM format name as understood by common players (`-f <name>`)
    pub fn name(self) -> &'static str {
        match self {
            SampleEncoding::U8 => "u8",
            SampleEncoding::U16 => "u16le",
            SampleEncoding::U24 => "u24le",
            SampleEncoding::U32 => "u32le",
            SampleEncoding::S8 => "s8",
            SampleEncoding::S16 => "s16le",
            SampleEncoding::S24 => "s24le",
            SampleEncoding::S32 => "s32le",
            SampleEncoding::F32 => "f32le",
            SampleEncoding::F64 => "f64le",
        }
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sample encoding plus buffer layout of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleFormat {
    pub encoding: SampleEncoding,

    /// One buffer per channel when true, a single interleaved buffer otherwise
    pub planar: bool,
}

impl SampleFormat {
    pub fn planar(encoding: SampleEncoding) -> Self {
        Self {
            encoding,
            planar: true,
        }
    }

    pub fn interleaved(encoding: SampleEncoding) -> Self {
        Self {
            encoding,
            planar: false,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        self.encoding.bytes_per_sample()
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = if self.planar { "planar" } else { "interleaved" };
        write!(f, "{} ({})", self.encoding, layout)
    }
}

/// One unit of decoder output.
///
/// The frame is a scratch owned by the decoder: its contents are only valid
/// until the next decode call, which overwrites it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Samples per channel
    pub nb_samples: usize,
    pub channels: usize,
    pub format: SampleFormat,
    planes: Vec<Vec<u8>>,
}

impl DecodedFrame {
    /// Empty scratch frame
    pub fn empty() -> Self {
        Self {
            nb_samples: 0,
            channels: 0,
            format: SampleFormat::interleaved(SampleEncoding::S16),
            planes: Vec::new(),
        }
    }

    /// Build a frame from fully populated buffers.
    pub fn from_planes(
        nb_samples: usize,
        channels: usize,
        format: SampleFormat,
        planes: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            nb_samples,
            channels,
            format,
            planes,
        }
    }

    /// Raw byte size of the frame: `nb_samples * channels * bytes_per_sample`.
    pub fn data_size(&self) -> usize {
        self.nb_samples * self.channels * self.format.bytes_per_sample()
    }

    pub fn planes(&self) -> &[Vec<u8>] {
        &self.planes
    }

    /// Prepare the scratch for a new frame, keeping plane allocations.
    pub fn reset(&mut self, nb_samples: usize, channels: usize, format: SampleFormat) {
        let plane_count = if format.planar { channels } else { 1 };
        self.planes.resize_with(plane_count, Vec::new);
        for plane in &mut self.planes {
            plane.clear();
        }
        self.nb_samples = nb_samples;
        self.channels = channels;
        self.format = format;
    }

    /// Mutable access to a buffer allocated by the last [`reset`](Self::reset).
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut Vec<u8>> {
        self.planes.get_mut(index)
    }
}

impl Default for DecodedFrame {
    fn default() -> Self {
        Self::empty()
    }
}
