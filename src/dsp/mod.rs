//! Sample-rate and channel-layout conversion
//!
//! Every chunk is converted independently, so nothing here keeps state between calls.

pub mod mixer;
pub mod resample;

pub use mixer::{mono_to_stereo, pcm_to_le_bytes, to_output_channels, OutputLayout};
pub use resample::{resample, resampled_len};

/// Scale used to normalize i16 samples into [-1.0, 1.0]
pub const I16_NORMALIZE: f32 = 32768.0;

/// Scale used to convert normalized samples back to i16
pub const I16_SCALE: f32 = 32767.0;
