//! Synthesis event chain
//!
//! Sentences are synthesized one after another and reported through a
//! [`SynthesisCallback`] in a fixed order:
//!
//! ```text
//! on_open
//!   ├─ on_event   (per successful sentence)
//!   └─ on_error   (per failed sentence, the stream continues)
//! on_complete     (skipped when cancelled)
//! on_close        (always last)
//! ```

use super::{SpeechSynthesizer, SynthesisResult};
use crate::text::Sentence;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Receiver of synthesis events
///
/// The streaming producer is one implementation (enqueue each result); others
/// collect results in memory or persist them to a file.
pub trait SynthesisCallback {
    /// Session started
    fn on_open(&mut self) {}

    /// One sentence synthesized successfully
    fn on_event(&mut self, sentence: &Sentence, result: SynthesisResult);

    /// All sentences processed
    fn on_complete(&mut self) {}

    /// One sentence failed; synthesis continues with the next
    fn on_error(&mut self, _sentence: &Sentence, _message: &str) {}

    /// Session closed, on every path
    fn on_close(&mut self) {}

    /// Checked before each sentence; returning true stops the session
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared callback, so the caller can still reach it after handing a clone
/// to another thread
impl<C: SynthesisCallback + ?Sized> SynthesisCallback for Arc<Mutex<C>> {
    fn on_open(&mut self) {
        self.lock().on_open();
    }

    fn on_event(&mut self, sentence: &Sentence, result: SynthesisResult) {
        self.lock().on_event(sentence, result);
    }

    fn on_complete(&mut self) {
        self.lock().on_complete();
    }

    fn on_error(&mut self, sentence: &Sentence, message: &str) {
        self.lock().on_error(sentence, message);
    }

    fn on_close(&mut self) {
        self.lock().on_close();
    }

    fn is_cancelled(&self) -> bool {
        self.lock().is_cancelled()
    }
}

/// Counters of one synthesis session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisSummary {
    /// Sentences handed to the engine
    pub attempted: usize,
    /// Sentences reported through `on_event`
    pub succeeded: usize,
    /// Sentences reported through `on_error`
    pub failed: usize,
    /// Whether the session stopped early
    pub cancelled: bool,
}

/// Synthesize `sentences` in order and report each result to `callback`
///
/// `delay_per_char` simulates upstream generation latency: before each
/// sentence the driver sleeps for the delay times the sentence's character
/// count. Pass `Duration::ZERO` to disable it.
pub fn synthesize_sentences<S, C>(
    engine: &mut S,
    sentences: &[Sentence],
    callback: &mut C,
    delay_per_char: Duration,
) -> SynthesisSummary
where
    S: SpeechSynthesizer + ?Sized,
    C: SynthesisCallback + ?Sized,
{
    let mut summary = SynthesisSummary::default();

    info!(
        target: "synthesis",
        engine = engine.name(),
        sentences = sentences.len(),
        "Starting synthesis"
    );
    callback.on_open();

    for sentence in sentences {
        if callback.is_cancelled() {
            summary.cancelled = true;
            info!(target: "synthesis", index = sentence.index, "Synthesis cancelled");
            break;
        }

        let chars = sentence.char_count();
        info!(
            target: "synthesis",
            index = sentence.index,
            chars,
            text = %sentence.text,
            "Generating sentence"
        );
        if !delay_per_char.is_zero() {
            std::thread::sleep(sentence_delay(delay_per_char, chars));
        }

        let started = Instant::now();
        let result = engine.synthesize(&sentence.text);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        summary.attempted += 1;

        if result.is_success() {
            info!(
                target: "synthesis",
                index = sentence.index,
                samples = result.samples.len(),
                duration_ms = result.duration_ms,
                elapsed_ms,
                rtf = result.rtf,
                "Sentence synthesized"
            );
            summary.succeeded += 1;
            callback.on_event(sentence, result);
        } else {
            warn!(
                target: "synthesis",
                index = sentence.index,
                reason = %result.message,
                "Sentence synthesis failed"
            );
            summary.failed += 1;
            callback.on_error(sentence, &result.message);
        }
    }

    if !summary.cancelled {
        callback.on_complete();
    }
    callback.on_close();

    info!(
        target: "synthesis",
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Synthesis finished"
    );
    summary
}

/// Simulated generation delay for a sentence of `chars` characters
fn sentence_delay(delay_per_char: Duration, chars: usize) -> Duration {
    delay_per_char.saturating_mul(u32::try_from(chars).unwrap_or(u32::MAX))
}

/// Callback that keeps every result in memory
#[derive(Debug, Default)]
pub struct CollectCallback {
    /// Successful results with their sentence index, in order
    pub results: Vec<(usize, SynthesisResult)>,
    /// Failed sentences with the engine's reason
    pub errors: Vec<(usize, String)>,
    /// Whether `on_complete` was called
    pub completed: bool,
    /// Whether `on_close` was called
    pub closed: bool,
}

impl CollectCallback {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate all collected samples (assumes a single engine rate)
    pub fn samples(&self) -> Vec<i16> {
        self.results
            .iter()
            .flat_map(|(_, result)| result.samples.iter().copied())
            .collect()
    }
}

impl SynthesisCallback for CollectCallback {
    fn on_event(&mut self, sentence: &Sentence, result: SynthesisResult) {
        self.results.push((sentence.index, result));
    }

    fn on_complete(&mut self) {
        self.completed = true;
    }

    fn on_error(&mut self, sentence: &Sentence, message: &str) {
        self.errors.push((sentence.index, message.to_string()));
    }

    fn on_close(&mut self) {
        self.closed = true;
    }
}
