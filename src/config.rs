//! Pipeline configuration
//!
//! Captured once before the pipeline starts and never mutated afterwards.
//! The idle timeout and discard pacing are tuning knobs, not real-time guarantees.

use crate::dsp::OutputLayout;
use crate::{Result, StreamError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default output sample rate (48 kHz)
pub const DEFAULT_OUTPUT_SAMPLE_RATE: u32 = 48_000;

/// Default simulated upstream generation delay, in milliseconds per character
pub const DEFAULT_SYNTHESIS_DELAY_MS_PER_CHAR: u64 = 5;

/// Default time the consumer waits for the next chunk before declaring a stall
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 10_000;

/// Default delay per chunk when playback is disabled
pub const DEFAULT_DISCARD_PACING_MS: u64 = 50;

/// Lowest accepted output sample rate
pub const MIN_OUTPUT_SAMPLE_RATE: u32 = 8_000;

/// Highest accepted output sample rate
pub const MAX_OUTPUT_SAMPLE_RATE: u32 = 384_000;

/// Configuration for one streaming run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sample rate handed to the audio sink, in Hz
    pub output_sample_rate: u32,

    /// Output channel count (1 = mono, 2 = duplicated stereo)
    pub output_channels: u16,

    /// Whether chunks are written to an audio sink or drained and discarded
    pub playback_enabled: bool,

    /// Simulated upstream latency per sentence character (0 disables pacing)
    pub synthesis_delay_ms_per_char: u64,

    /// Idle timeout of the consumer's dequeue, in milliseconds
    pub idle_timeout_ms: u64,

    /// Pacing delay per chunk when no sink is active, in milliseconds
    pub discard_pacing_ms: u64,
}

impl PipelineConfig {
    /// Configuration without audio output, for headless runs and tests
    pub fn headless() -> Self {
        PipelineConfig {
            playback_enabled: false,
            synthesis_delay_ms_per_char: 0,
            ..Self::default()
        }
    }

    /// Stereo playback at the given output rate
    pub fn stereo(output_sample_rate: u32) -> Self {
        PipelineConfig {
            output_sample_rate,
            output_channels: 2,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| StreamError::ConfigError(format!("Malformed pipeline config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Set the output sample rate
    pub fn with_output_sample_rate(mut self, rate: u32) -> Self {
        self.output_sample_rate = rate;
        self
    }

    /// Set the output channel count
    pub fn with_output_channels(mut self, channels: u16) -> Self {
        self.output_channels = channels;
        self
    }

    /// Enable or disable playback
    pub fn with_playback(mut self, enabled: bool) -> Self {
        self.playback_enabled = enabled;
        self
    }

    /// Set the simulated synthesis delay per character
    pub fn with_synthesis_delay_ms_per_char(mut self, delay_ms: u64) -> Self {
        self.synthesis_delay_ms_per_char = delay_ms;
        self
    }

    /// Set the consumer idle timeout
    pub fn with_idle_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }

    /// Set the pacing delay used when playback is inactive
    pub fn with_discard_pacing_ms(mut self, pacing_ms: u64) -> Self {
        self.discard_pacing_ms = pacing_ms;
        self
    }

    /// Check the configuration before any thread is started
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the channel count is not 1 or 2
    /// - the output sample rate is outside 8 kHz..=384 kHz
    /// - the idle timeout is zero
    pub fn validate(&self) -> Result<()> {
        self.layout()?;

        if !(MIN_OUTPUT_SAMPLE_RATE..=MAX_OUTPUT_SAMPLE_RATE).contains(&self.output_sample_rate) {
            return Err(StreamError::ConfigError(format!(
                "Output sample rate {} Hz outside supported range {}..={} Hz",
                self.output_sample_rate, MIN_OUTPUT_SAMPLE_RATE, MAX_OUTPUT_SAMPLE_RATE
            )));
        }

        if self.idle_timeout_ms == 0 {
            return Err(StreamError::ConfigError(
                "Idle timeout must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Typed channel layout
    pub fn layout(&self) -> Result<OutputLayout> {
        OutputLayout::try_from(self.output_channels)
    }

    /// Idle timeout as a `Duration`
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Discard pacing as a `Duration`
    pub fn discard_pacing(&self) -> Duration {
        Duration::from_millis(self.discard_pacing_ms)
    }

    /// Simulated synthesis delay per character as a `Duration`
    pub fn synthesis_delay_per_char(&self) -> Duration {
        Duration::from_millis(self.synthesis_delay_ms_per_char)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            output_sample_rate: DEFAULT_OUTPUT_SAMPLE_RATE,
            output_channels: 1,
            playback_enabled: true,
            synthesis_delay_ms_per_char: DEFAULT_SYNTHESIS_DELAY_MS_PER_CHAR,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            discard_pacing_ms: DEFAULT_DISCARD_PACING_MS,
        }
    }
}
