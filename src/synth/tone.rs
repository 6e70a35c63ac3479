//! Deterministic tone synthesizer
//!
//! Stands in for a real acoustic model in the demo binary and in tests: each
//! sentence becomes a sine tone whose length is proportional to the number of
//! non-whitespace characters.

use super::{SpeechSynthesizer, SynthesisResult};
use std::f32::consts::TAU;
use std::time::Instant;

/// Sine-tone engine with a fixed output rate
#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    sample_rate: u32,
    ms_per_char: u32,
    frequency: f32,
    amplitude: f32,
}

impl ToneSynthesizer {
    /// Default tone length per character
    pub const DEFAULT_MS_PER_CHAR: u32 = 120;
    /// Default tone frequency in Hz
    pub const DEFAULT_FREQUENCY: f32 = 220.0;
    /// Default peak amplitude (0.0..=1.0)
    pub const DEFAULT_AMPLITUDE: f32 = 0.3;
    /// Fade applied at both ends of each tone to avoid clicks
    const FADE_MS: u32 = 5;

    /// Create a tone engine producing audio at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        ToneSynthesizer {
            sample_rate,
            ms_per_char: Self::DEFAULT_MS_PER_CHAR,
            frequency: Self::DEFAULT_FREQUENCY,
            amplitude: Self::DEFAULT_AMPLITUDE,
        }
    }

    /// Set the tone length per character
    pub fn with_ms_per_char(mut self, ms_per_char: u32) -> Self {
        self.ms_per_char = ms_per_char;
        self
    }

    /// Set the tone frequency
    pub fn with_frequency(mut self, frequency: f32) -> Self {
        self.frequency = frequency;
        self
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples produced for `text`
    pub fn samples_for(&self, text: &str) -> usize {
        let chars = text.chars().filter(|c| !c.is_whitespace()).count() as u64;
        let samples = chars
            .saturating_mul(u64::from(self.ms_per_char))
            .saturating_mul(u64::from(self.sample_rate))
            / 1000;
        usize::try_from(samples).unwrap_or(usize::MAX)
    }

    fn fade_len(&self, len: usize) -> usize {
        let fade = u64::from(self.sample_rate) * u64::from(Self::FADE_MS) / 1000;
        usize::try_from(fade).unwrap_or(usize::MAX).min(len / 2)
    }

    fn render(&self, len: usize) -> Vec<i16> {
        let fade_len = self.fade_len(len);
        let step = TAU * self.frequency / self.sample_rate as f32;

        (0..len)
            .map(|i| {
                let edge = i.min(len - 1 - i);
                let gain = if edge < fade_len {
                    edge as f32 / fade_len as f32
                } else {
                    1.0
                };
                let value = (step * i as f32).sin() * self.amplitude * gain;
                (value.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
            })
            .collect()
    }
}

impl SpeechSynthesizer for ToneSynthesizer {
    fn synthesize(&mut self, text: &str) -> SynthesisResult {
        if self.sample_rate == 0 {
            return SynthesisResult::failure("Tone synthesizer has no sample rate");
        }

        let started = Instant::now();
        let len = self.samples_for(text);
        if len == 0 {
            return SynthesisResult::failure("Nothing to synthesize");
        }

        let samples = self.render(len);
        SynthesisResult::success(samples, self.sample_rate, started.elapsed().as_millis() as u64)
    }

    fn name(&self) -> &str {
        "tone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_proportional_to_characters() {
        let mut engine = ToneSynthesizer::new(16_000);
        let result = engine.synthesize("你好。");
        assert!(result.is_success());
        // 3 chars * 120 ms = 360 ms at 16 kHz
        assert_eq!(result.samples.len(), 5_760);
        assert_eq!(result.duration_ms, 360);
        assert_eq!(result.sample_rate, 16_000);
    }

    #[test]
    fn test_whitespace_not_voiced() {
        let engine = ToneSynthesizer::new(8_000).with_ms_per_char(10);
        assert_eq!(engine.samples_for(" a b "), 160);
    }

    #[test]
    fn test_extreme_rate_does_not_overflow() {
        let engine = ToneSynthesizer::new(u32::MAX);
        assert_eq!(engine.fade_len(10), 5);
        assert!(engine.samples_for("abc") > 0);
    }

    #[test]
    fn test_blank_text_fails() {
        let mut engine = ToneSynthesizer::new(22_050);
        let result = engine.synthesize("   ");
        assert!(!result.is_success());
        assert_eq!(result.message, "Nothing to synthesize");
    }

    #[test]
    fn test_amplitude_bounded_and_faded() {
        let mut engine = ToneSynthesizer::new(24_000).with_frequency(1_000.0);
        let samples = engine.synthesize("Hello!").samples;
        let peak = (ToneSynthesizer::DEFAULT_AMPLITUDE * i16::MAX as f32) as i16;
        assert!(samples.iter().all(|s| s.abs() <= peak));
        assert_eq!(samples[0], 0);
        assert_eq!(*samples.last().unwrap(), 0);
    }

    #[test]
    fn test_deterministic_output() {
        let mut a = ToneSynthesizer::new(16_000);
        let mut b = ToneSynthesizer::new(16_000);
        assert_eq!(a.synthesize("Same text.").samples, b.synthesize("Same text.").samples);
    }
}
