//! Synthesis engine boundary
//!
//! The acoustic model itself lives outside this crate. Engines are plugged in
//! through [`SpeechSynthesizer`]; results are delivered through the
//! [`SynthesisCallback`] event chain driven by [`synthesize_sentences`].

pub mod callback;
pub mod tone;

pub use callback::{synthesize_sentences, CollectCallback, SynthesisCallback, SynthesisSummary};
pub use tone::ToneSynthesizer;

/// Outcome of one synthesis call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisResult {
    /// Whether the engine produced audio
    pub success: bool,
    /// Mono i16 PCM at `sample_rate`
    pub samples: Vec<i16>,
    /// Engine output rate in Hz
    pub sample_rate: u32,
    /// Audio duration in milliseconds
    pub duration_ms: u64,
    /// Time spent synthesizing in milliseconds
    pub processing_time_ms: u64,
    /// Real-time factor: processing time / audio duration
    pub rtf: f32,
    /// Engine message (failure reason on error)
    pub message: String,
}

impl SynthesisResult {
    /// Successful result; duration and RTF are derived from the samples
    pub fn success(samples: Vec<i16>, sample_rate: u32, processing_time_ms: u64) -> Self {
        let duration_ms = if sample_rate == 0 {
            0
        } else {
            samples.len() as u64 * 1000 / u64::from(sample_rate)
        };
        let rtf = if duration_ms == 0 {
            0.0
        } else {
            processing_time_ms as f32 / duration_ms as f32
        };

        SynthesisResult {
            success: true,
            samples,
            sample_rate,
            duration_ms,
            processing_time_ms,
            rtf,
            message: "OK".to_string(),
        }
    }

    /// Failed result carrying the engine's reason
    pub fn failure(message: impl Into<String>) -> Self {
        SynthesisResult {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    /// Check whether the call succeeded
    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// A text-to-speech engine
///
/// Called sequentially from the synthesis thread; calls are independent of
/// each other.
pub trait SpeechSynthesizer: Send {
    /// Synthesize one sentence
    fn synthesize(&mut self, text: &str) -> SynthesisResult;

    /// Engine name for diagnostics
    fn name(&self) -> &str {
        "synthesizer"
    }
}

impl<S: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Box<S> {
    fn synthesize(&mut self, text: &str) -> SynthesisResult {
        (**self).synthesize(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Adapter turning a closure into a [`SpeechSynthesizer`]
pub struct FnSynthesizer<F> {
    name: String,
    synthesize: F,
}

impl<F> FnSynthesizer<F>
where
    F: FnMut(&str) -> SynthesisResult + Send,
{
    /// Wrap `synthesize` under the given engine name
    pub fn new(name: impl Into<String>, synthesize: F) -> Self {
        FnSynthesizer {
            name: name.into(),
            synthesize,
        }
    }
}

impl<F> SpeechSynthesizer for FnSynthesizer<F>
where
    F: FnMut(&str) -> SynthesisResult + Send,
{
    fn synthesize(&mut self, text: &str) -> SynthesisResult {
        (self.synthesize)(text)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
