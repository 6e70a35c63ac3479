//! Two-thread streaming pipeline
//!
//! ```text
//! text ─▶ split ─▶ [synthesis thread] ─▶ ChunkQueue ─▶ [playback thread] ─▶ AudioSink
//!                   ChunkProducer                      PlaybackConsumer
//! ```
//!
//! The playback thread starts first and acquires its sink; the synthesis thread
//! is spawned once playback signals that it is ready. The threads share nothing
//! but the queue, and audio starts playing as soon as the first sentence is ready.

pub mod chunk;
pub mod consumer;
pub mod producer;
pub mod queue;

pub use chunk::{AudioChunk, END_MARKER_INDEX};
pub use consumer::{ConsumerState, PlaybackConsumer, PlaybackReport};
pub use producer::{run_producer, ChunkProducer, ProducerReport, SynthesisFailure, SynthesisTap};
pub use queue::{ChunkQueue, Dequeued};

use crate::config::PipelineConfig;
use crate::sink::{AudioSink, SinkFactory};
use crate::synth::{SpeechSynthesizer, SynthesisCallback};
use crate::text::{split, Sentence};
use crate::{Result, StreamError};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use tracing::info;

/// Combined outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Sentences found in the input
    pub sentences: usize,
    /// Synthesis thread report
    pub producer: ProducerReport,
    /// Playback thread report
    pub playback: PlaybackReport,
}

impl PipelineReport {
    /// Check whether every synthesized sentence reached the consumer
    ///
    /// Failed sentences and silent chunks do not make a run incomplete; a stall
    /// or cancellation does.
    pub fn is_complete(&self) -> bool {
        self.playback.state == ConsumerState::Completed
            && !self.producer.cancelled
            && self.playback.chunks_played + self.playback.chunks_skipped
                == self.producer.chunks_enqueued
    }
}

/// Cancels a running pipeline from another thread
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    queue: Arc<ChunkQueue>,
}

impl PipelineHandle {
    /// Stop synthesis before its next sentence and end playback
    pub fn cancel(&self) {
        info!(target: "synthesis", "Cancellation requested");
        self.queue.close();
    }

    /// Check whether `cancel` was called
    pub fn is_cancelled(&self) -> bool {
        self.queue.is_closed()
    }
}

/// Streaming text-to-speech pipeline
pub struct StreamingPipeline {
    config: PipelineConfig,
    queue: Arc<ChunkQueue>,
    sink_factory: Option<SinkFactory>,
    tap: Option<SynthesisTap>,
}

impl StreamingPipeline {
    /// Create a pipeline
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid; no thread is started.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(StreamingPipeline {
            config,
            queue: Arc::new(ChunkQueue::new()),
            sink_factory: None,
            tap: None,
        })
    }

    /// Build the audio sink with `factory` on the playback thread
    pub fn with_sink_factory(mut self, factory: SinkFactory) -> Self {
        self.sink_factory = Some(factory);
        self
    }

    /// Play through an already constructed sink
    pub fn with_sink<S>(self, sink: S) -> Self
    where
        S: AudioSink + Send + 'static,
    {
        self.with_sink_factory(Box::new(move || Ok(Box::new(sink) as Box<dyn AudioSink>)))
    }

    /// Also report every synthesis event to `callback` on the synthesis thread
    ///
    /// Pass an `Arc<Mutex<_>>` to read the callback back after the run.
    pub fn with_tap<C>(mut self, callback: C) -> Self
    where
        C: SynthesisCallback + Send + 'static,
    {
        self.tap = Some(Box::new(callback));
        self
    }

    /// Handle for cancelling the run
    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Configuration of this pipeline
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Split `text` into sentences and stream them through `engine`
    ///
    /// Blocks until playback finishes.
    ///
    /// # Errors
    ///
    /// Returns `Io` if a thread cannot be spawned and `ThreadPanicked` if one panics.
    pub fn run<S>(self, text: &str, engine: S) -> Result<PipelineReport>
    where
        S: SpeechSynthesizer + 'static,
    {
        self.run_sentences(split(text), engine)
    }

    /// Stream pre-split sentences through `engine`
    pub fn run_sentences<S>(self, sentences: Vec<Sentence>, mut engine: S) -> Result<PipelineReport>
    where
        S: SpeechSynthesizer + 'static,
    {
        let StreamingPipeline {
            config,
            queue,
            sink_factory,
            tap,
        } = self;

        let sentence_count = sentences.len();
        info!(
            target: "synthesis",
            sentences = sentence_count,
            output_rate = config.output_sample_rate,
            channels = config.output_channels,
            "Starting streaming pipeline"
        );

        let (ready_tx, ready_rx) = mpsc::channel();
        let mut consumer =
            PlaybackConsumer::new(Arc::clone(&queue), config)?.with_ready_signal(ready_tx);
        if let Some(factory) = sink_factory {
            consumer = consumer.with_sink_factory(factory);
        }

        let playback = thread::Builder::new()
            .name("playback".into())
            .spawn(move || consumer.run())?;

        // Wait for the sink before synthesis starts
        if ready_rx.recv().is_err() {
            queue.close();
            let _ = playback.join();
            return Err(StreamError::ThreadPanicked("playback"));
        }

        let delay = config.synthesis_delay_per_char();
        let producer_queue = Arc::clone(&queue);
        let synthesis = thread::Builder::new()
            .name("synthesis".into())
            .spawn(move || {
                let mut producer = ChunkProducer::new(producer_queue);
                if let Some(tap) = tap {
                    producer = producer.with_tap(tap);
                }
                producer.run(&mut engine, &sentences, delay)
            });

        let synthesis = match synthesis {
            Ok(handle) => handle,
            Err(e) => {
                queue.close();
                let _ = playback.join();
                return Err(StreamError::Io(e));
            }
        };

        let producer = synthesis.join();
        if producer.is_err() {
            // Nobody will send the end marker
            queue.close();
        }
        let playback = playback
            .join()
            .map_err(|_| StreamError::ThreadPanicked("playback"))?;
        let producer = producer.map_err(|_| StreamError::ThreadPanicked("synthesis"))?;

        info!(
            target: "playback",
            state = ?playback.state,
            played = playback.chunks_played,
            failed = producer.failures.len(),
            "Streaming pipeline finished"
        );

        Ok(PipelineReport {
            sentences: sentence_count,
            producer,
            playback,
        })
    }
}
