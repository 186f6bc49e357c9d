//! WAV fixture generation
//!
//! Builds small PCM WAV files with known sample values so the extracted raw
//! output can be compared byte for byte.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Interleaved integer samples plus the WAV spec to store them with
pub struct WavFixture {
    pub spec: WavSpec,
    pub samples: Vec<i32>,
}

impl WavFixture {
    /// 8-bit fixture from the unsigned byte values that should end up on disk
    pub fn unsigned_8bit(channels: u16, sample_rate: u32, stored: &[u8]) -> Self {
        Self {
            spec: WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 8,
                sample_format: SampleFormat::Int,
            },
            // hound stores 8-bit samples offset by 128
            samples: stored.iter().map(|&b| b as i32 - 128).collect(),
        }
    }

    /// 16-bit sine wave, identical on every channel except for a per-channel offset
    pub fn sine_16bit(channels: u16, sample_rate: u32, frames: usize) -> Self {
        let mut samples = Vec::with_capacity(frames * channels as usize);
        for frame_idx in 0..frames {
            let t = frame_idx as f32 / sample_rate as f32;
            let value = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 12000.0;
            for ch in 0..channels {
                samples.push(value as i32 + ch as i32 * 100);
            }
        }
        Self {
            spec: WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            samples,
        }
    }

    /// 24-bit ramp covering negative and positive values
    pub fn ramp_24bit(channels: u16, sample_rate: u32, frames: usize) -> Self {
        let total = frames * channels as usize;
        let samples = (0..total)
            .map(|i| (i as i32 - total as i32 / 2) * 4099)
            .collect();
        Self {
            spec: WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 24,
                sample_format: SampleFormat::Int,
            },
            samples,
        }
    }

    /// Raw little-endian interleaved bytes the extractor should produce
    pub fn expected_pcm(&self) -> Vec<u8> {
        match self.spec.bits_per_sample {
            8 => self.samples.iter().map(|&s| (s + 128) as u8).collect(),
            16 => self
                .samples
                .iter()
                .flat_map(|&s| (s as i16).to_le_bytes())
                .collect(),
            24 => self
                .samples
                .iter()
                .flat_map(|&s| {
                    let b = s.to_le_bytes();
                    [b[0], b[1], b[2]]
                })
                .collect(),
            bits => panic!("unsupported fixture width {}", bits),
        }
    }
}

/// Write `fixture` as a WAV file at `path`.
pub fn write_wav<P: AsRef<Path>>(path: P, fixture: &WavFixture) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, fixture.spec)?;
    for &sample in &fixture.samples {
        match fixture.spec.bits_per_sample {
            8 => writer.write_sample(sample as i8)?,
            16 => writer.write_sample(sample as i16)?,
            _ => writer.write_sample(sample)?,
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Bytes per IMA ADPCM mono block in [`write_ima_adpcm_wav`] files
pub const IMA_BLOCK_ALIGN: usize = 580;

/// Samples decoded from one block: the header sample plus two per data byte
pub const IMA_FRAMES_PER_BLOCK: usize = (IMA_BLOCK_ALIGN - 4) * 2 + 1;

/// Mono IMA ADPCM block that decodes to silence
pub fn ima_silent_block() -> Vec<u8> {
    // predictor 0, step index 0, reserved, then all-zero nibbles
    vec![0u8; IMA_BLOCK_ALIGN]
}

/// Mono IMA ADPCM block whose header carries an out-of-range step index
pub fn ima_corrupt_block() -> Vec<u8> {
    let mut block = ima_silent_block();
    block[2] = 0xff;
    block
}

/// Write a mono IMA ADPCM WAV holding `blocks`.
///
/// hound only writes PCM, so the RIFF chunks are assembled by hand.
/// `declared_blocks` sets the data chunk length, which may exceed the blocks
/// actually written to model a truncated file.
pub fn write_ima_adpcm_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    blocks: &[Vec<u8>],
    declared_blocks: usize,
) -> std::io::Result<()> {
    let data_len = (declared_blocks * IMA_BLOCK_ALIGN) as u32;
    let avg_bytes_per_sec =
        (sample_rate as usize * IMA_BLOCK_ALIGN / IMA_FRAMES_PER_BLOCK) as u32;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(4 + 8 + 20 + 8 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&20u32.to_le_bytes());
    bytes.extend_from_slice(&0x0011u16.to_le_bytes()); // WAVE_FORMAT_IMA_ADPCM
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&avg_bytes_per_sec.to_le_bytes());
    bytes.extend_from_slice(&(IMA_BLOCK_ALIGN as u16).to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&(IMA_FRAMES_PER_BLOCK as u16).to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for block in blocks {
        bytes.extend_from_slice(block);
    }

    std::fs::write(path, bytes)
}
