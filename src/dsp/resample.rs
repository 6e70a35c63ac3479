//! Linear-interpolation resampler
//!
//! Source and destination index sets are both mapped onto the normalized time
//! range [0, 1] and the amplitude is interpolated at each destination point.
//! Not band-limited: each chunk is resampled on its own and latency matters
//! more than quality here.

use super::{I16_NORMALIZE, I16_SCALE};
use std::borrow::Cow;

/// Number of samples `resample` produces for `len` input samples
///
/// `round(len * dst_rate / src_rate)`; zero when either rate is zero.
pub fn resampled_len(len: usize, src_rate: u32, dst_rate: u32) -> usize {
    if src_rate == 0 || dst_rate == 0 {
        return 0;
    }
    if src_rate == dst_rate {
        return len;
    }
    ((len as f64) * f64::from(dst_rate) / f64::from(src_rate)).round() as usize
}

/// Resample mono i16 PCM from `src_rate` to `dst_rate`
///
/// Returns the input unchanged (borrowed) when the rates match or the input is
/// empty. Interpolated values are clamped to [-1.0, 1.0] before being scaled
/// back to i16, so the output never wraps.
///
/// # Examples
///
/// ```
/// use speech_stream::dsp::resample;
///
/// let samples = vec![0i16; 160];
/// assert_eq!(resample(&samples, 16_000, 48_000).len(), 480);
/// assert_eq!(resample(&samples, 16_000, 16_000).as_ref(), &samples[..]);
/// ```
pub fn resample(samples: &[i16], src_rate: u32, dst_rate: u32) -> Cow<'_, [i16]> {
    if src_rate == dst_rate || samples.is_empty() {
        return Cow::Borrowed(samples);
    }

    let out_len = resampled_len(samples.len(), src_rate, dst_rate);
    let last_src = samples.len() - 1;
    // Distance between the first and last destination point; a single point sits at t = 0
    let span = out_len.saturating_sub(1).max(1) as f64;

    let mut output = Vec::with_capacity(out_len);
    for j in 0..out_len {
        let pos = j as f64 * last_src as f64 / span;
        let i0 = (pos.floor() as usize).min(last_src);
        let i1 = (i0 + 1).min(last_src);
        let frac = (pos - i0 as f64) as f32;

        let a = f32::from(samples[i0]) / I16_NORMALIZE;
        let b = f32::from(samples[i1]) / I16_NORMALIZE;
        let value = (a + (b - a) * frac).clamp(-1.0, 1.0);

        output.push((value * I16_SCALE) as i16);
    }

    Cow::Owned(output)
}
