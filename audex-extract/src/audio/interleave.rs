//! Planar to interleaved sample conversion
//!
//! Output layout is `[ch0_s0, ch1_s0, ..., chN_s0, ch0_s1, ch1_s1, ...]`, with
//! each sample copied as `bytes_per_sample` opaque bytes (no format conversion).

use super::types::SampleFormat;
use crate::error::{Error, Result};

/// Interleave `channels` planar buffers into `out`.
///
/// `data_bytes` is the total frame size across all channels; each plane must
/// hold at least `data_bytes / channels` bytes and `out` must be exactly
/// `data_bytes` long.
///
/// # Errors
/// [`Error::Internal`] when the format is not planar, when `data_bytes` is not a
/// whole number of samples for every channel, or when a buffer is too short.
/// These indicate a frame-size computation bug in the caller, not bad input.
pub fn interleave<P: AsRef<[u8]>>(
    planes: &[P],
    out: &mut [u8],
    channels: usize,
    format: SampleFormat,
    data_bytes: usize,
) -> Result<()> {
    if !format.planar {
        return Err(Error::Internal(format!(
            "interleave called with non-planar format {}",
            format
        )));
    }

    let sample_bytes = format.bytes_per_sample();
    let stride = channels * sample_bytes;
    if channels == 0 || data_bytes % stride != 0 {
        return Err(Error::Internal(format!(
            "{} bytes is not a whole number of {}-channel {} samples",
            data_bytes, channels, format.encoding
        )));
    }
    if out.len() != data_bytes {
        return Err(Error::Internal(format!(
            "interleave destination is {} bytes, frame is {} bytes",
            out.len(),
            data_bytes
        )));
    }
    if planes.len() < channels {
        return Err(Error::Internal(format!(
            "frame has {} planes for {} channels",
            planes.len(),
            channels
        )));
    }

    let chn_bytes = data_bytes / channels;
    let planes: Vec<&[u8]> = planes[..channels].iter().map(|p| p.as_ref()).collect();
    if let Some((ch, short)) = planes.iter().enumerate().find(|(_, p)| p.len() < chn_bytes) {
        return Err(Error::Internal(format!(
            "channel {} holds {} bytes, expected {}",
            ch,
            short.len(),
            chn_bytes
        )));
    }

    for (frame_idx, frame_out) in out.chunks_exact_mut(stride).enumerate() {
        let offset = frame_idx * sample_bytes;
        for (plane, slot) in planes.iter().zip(frame_out.chunks_exact_mut(sample_bytes)) {
            slot.copy_from_slice(&plane[offset..offset + sample_bytes]);
        }
    }

    Ok(())
}
