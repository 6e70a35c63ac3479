//! Synthesis side of the pipeline
//!
//! [`ChunkProducer`] turns each synthesized sentence into an [`AudioChunk`] and
//! pushes it onto the shared queue. It never waits for the playback thread.

use super::{AudioChunk, ChunkQueue};
use crate::synth::{synthesize_sentences, SpeechSynthesizer, SynthesisCallback, SynthesisResult};
use crate::text::Sentence;
use crate::StreamError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A sentence the engine could not synthesize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisFailure {
    /// Index of the failed sentence
    pub sentence_index: usize,
    /// Reason reported by the engine
    pub message: String,
}

/// Outcome of the synthesis thread
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerReport {
    /// Sentences handed to the producer
    pub sentences: usize,
    /// Data chunks placed on the queue (end marker excluded)
    pub chunks_enqueued: usize,
    /// Sentences skipped because synthesis failed
    pub failures: Vec<SynthesisFailure>,
    /// Whether synthesis stopped early
    pub cancelled: bool,
}

/// Secondary callback receiving a copy of every synthesis event
pub type SynthesisTap = Box<dyn SynthesisCallback + Send>;

/// Synthesis callback that enqueues audio chunks
pub struct ChunkProducer {
    queue: Arc<ChunkQueue>,
    report: ProducerReport,
    end_sent: bool,
    tap: Option<SynthesisTap>,
}

impl ChunkProducer {
    /// Create a producer feeding `queue`
    pub fn new(queue: Arc<ChunkQueue>) -> Self {
        ChunkProducer {
            queue,
            report: ProducerReport::default(),
            end_sent: false,
            tap: None,
        }
    }

    /// Forward every event to `tap` as well, for example a WAV export of the
    /// audio being streamed
    pub fn with_tap(mut self, tap: SynthesisTap) -> Self {
        self.tap = Some(tap);
        self
    }

    /// Synthesize `sentences` with `engine` and return the report
    pub fn run<S>(
        mut self,
        engine: &mut S,
        sentences: &[Sentence],
        delay_per_char: Duration,
    ) -> ProducerReport
    where
        S: SpeechSynthesizer + ?Sized,
    {
        self.report.sentences = sentences.len();
        let summary = synthesize_sentences(engine, sentences, &mut self, delay_per_char);

        let mut report = self.into_report();
        report.cancelled |= summary.cancelled;
        report
    }

    /// Counters collected so far
    pub fn report(&self) -> &ProducerReport {
        &self.report
    }

    /// Consume the producer, returning its report
    pub fn into_report(self) -> ProducerReport {
        self.report
    }

    fn record_failure(&mut self, sentence_index: usize, message: impl Into<String>) {
        self.report.failures.push(SynthesisFailure {
            sentence_index,
            message: message.into(),
        });
    }
}

impl SynthesisCallback for ChunkProducer {
    fn on_open(&mut self) {
        if let Some(tap) = self.tap.as_mut() {
            tap.on_open();
        }
    }

    fn on_event(&mut self, sentence: &Sentence, result: SynthesisResult) {
        if let Some(tap) = self.tap.as_mut() {
            tap.on_event(sentence, result.clone());
        }
        if result.sample_rate == 0 {
            warn!(
                target: "synthesis",
                index = sentence.index,
                "Engine reported success with a zero sample rate"
            );
            self.record_failure(sentence.index, "zero sample rate");
            return;
        }

        let chunk = AudioChunk::data(result.samples, result.sample_rate, sentence.index);
        match self.queue.enqueue(chunk) {
            Ok(()) => self.report.chunks_enqueued += 1,
            Err(StreamError::QueueClosed) => {
                debug!(target: "synthesis", index = sentence.index, "Queue closed, chunk dropped");
                self.report.cancelled = true;
            }
            Err(e) => warn!(target: "synthesis", index = sentence.index, error = %e, "Enqueue failed"),
        }
    }

    fn on_complete(&mut self) {
        if let Some(tap) = self.tap.as_mut() {
            tap.on_complete();
        }
    }

    fn on_error(&mut self, sentence: &Sentence, message: &str) {
        if let Some(tap) = self.tap.as_mut() {
            tap.on_error(sentence, message);
        }
        warn!(
            target: "synthesis",
            index = sentence.index,
            reason = message,
            "Skipping sentence"
        );
        self.record_failure(sentence.index, message);
    }

    fn on_close(&mut self) {
        if self.end_sent {
            return;
        }
        if let Some(tap) = self.tap.as_mut() {
            tap.on_close();
        }
        self.end_sent = true;
        if self.queue.enqueue(AudioChunk::end_marker()).is_err() {
            debug!(target: "synthesis", "Queue closed before the end marker");
        }
    }

    fn is_cancelled(&self) -> bool {
        self.queue.is_closed()
    }
}

/// Synthesize `sentences` with `engine`, feeding `queue`
///
/// Exactly one end marker is enqueued when the run ends, unless the queue was
/// closed first.
pub fn run_producer<S>(
    engine: &mut S,
    sentences: &[Sentence],
    queue: Arc<ChunkQueue>,
    delay_per_char: Duration,
) -> ProducerReport
where
    S: SpeechSynthesizer + ?Sized,
{
    ChunkProducer::new(queue).run(engine, sentences, delay_per_char)
}
