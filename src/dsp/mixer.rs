//! Output channel layout
//!
//! Synthesis engines deliver mono PCM. Stereo output is a plain duplicate
//! upmix: both channels carry the same sample, no panning or decorrelation.

use crate::{Result, StreamError};
use std::borrow::Cow;
use std::fmt;

/// Channel layout of the audio handed to the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// Single channel
    Mono,
    /// Two interleaved channels (L, R, L, R, ...)
    Stereo,
}

impl OutputLayout {
    /// Number of channels in this layout
    pub fn channel_count(&self) -> u16 {
        match self {
            OutputLayout::Mono => 1,
            OutputLayout::Stereo => 2,
        }
    }
}

impl TryFrom<u16> for OutputLayout {
    type Error = StreamError;

    fn try_from(channels: u16) -> Result<Self> {
        match channels {
            1 => Ok(OutputLayout::Mono),
            2 => Ok(OutputLayout::Stereo),
            other => Err(StreamError::ConfigError(format!(
                "Unsupported output channel count {other} (expected 1 or 2)"
            ))),
        }
    }
}

impl fmt::Display for OutputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputLayout::Mono => f.write_str("mono"),
            OutputLayout::Stereo => f.write_str("stereo"),
        }
    }
}

/// Convert mono samples to the requested layout
///
/// Mono input is returned unchanged for [`OutputLayout::Mono`]; for
/// [`OutputLayout::Stereo`] the result holds `2 * samples.len()` interleaved values.
pub fn to_output_channels(samples: &[i16], layout: OutputLayout) -> Cow<'_, [i16]> {
    match layout {
        OutputLayout::Mono => Cow::Borrowed(samples),
        OutputLayout::Stereo => Cow::Owned(mono_to_stereo(samples)),
    }
}

/// Convert mono samples to stereo (duplicate each sample)
pub fn mono_to_stereo(mono: &[i16]) -> Vec<i16> {
    let mut stereo = Vec::with_capacity(mono.len() * 2);
    for &sample in mono {
        stereo.push(sample);
        stereo.push(sample);
    }
    stereo
}

/// Encode interleaved i16 PCM as little-endian bytes
pub fn pcm_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}
