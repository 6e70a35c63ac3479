//! Streaming speech synthesis pipeline
//!
//! Plays synthesized speech while synthesis is still running: the input text is
//! split into sentences, a producer thread synthesizes them one by one, and a
//! playback thread resamples and upmixes each sentence's audio before handing it
//! to an audio sink. The two threads only share a FIFO [`ChunkQueue`].
//!
//! # Features
//! - Sentence segmentation on CJK full-width and ASCII terminators
//! - Sequential synthesis with a callback interface (open, event, complete, error, close)
//! - Unbounded chunk queue with blocking, timed dequeue
//! - Linear-interpolation resampling to a fixed output rate
//! - Mono to stereo upmix
//! - Stall detection via idle timeout and scoped release of the audio sink
//! - WAV export of synthesized sentences
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output through rodio (`RodioSink`)
//!
//! # Quick start
//! ```no_run
//! use speech_stream::{MemorySink, PipelineConfig, StreamingPipeline, ToneSynthesizer};
//!
//! let (sink, _log) = MemorySink::new();
//! let pipeline = StreamingPipeline::new(PipelineConfig::default())
//!     .unwrap()
//!     .with_sink(sink);
//! let report = pipeline
//!     .run("你好。World! 测试？", ToneSynthesizer::new(16_000))
//!     .unwrap();
//! assert!(report.is_complete());
//! ```

#![warn(missing_docs)]

pub mod config; // Pipeline Configuration
pub mod dsp; // Resampling & Channel Mixing
pub mod export; // WAV Export
pub mod pipeline; // Producer, Queue & Consumer
pub mod sink; // Audio Sink Boundary
pub mod synth; // Synthesis Engine Boundary
pub mod text; // Sentence Segmentation

/// Error types for streaming pipeline operations
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// IO error from filesystem or thread spawning
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Synthesis engine reported a failure
    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    /// The chunk queue was closed before the item could be delivered
    #[error("Chunk queue closed")]
    QueueClosed,

    /// A pipeline thread panicked
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for StreamError {
    /// Converts a String into `StreamError::Other`.
    ///
    /// Prefer the specific variants (`ConfigError`, `AudioDeviceError`, ...) where the
    /// failure category is known.
    fn from(msg: String) -> Self {
        StreamError::Other(msg)
    }
}

impl From<&str> for StreamError {
    /// Converts a string slice into `StreamError::Other`.
    fn from(msg: &str) -> Self {
        StreamError::Other(msg.to_string())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, StreamError>;

// Public API exports
pub use config::PipelineConfig;
pub use dsp::{resample, to_output_channels, OutputLayout};
pub use export::WavExportCallback;
pub use pipeline::{
    AudioChunk, ChunkQueue, ConsumerState, Dequeued, PipelineHandle, PipelineReport,
    PlaybackConsumer, PlaybackReport, ProducerReport, StreamingPipeline,
};
#[cfg(feature = "streaming")]
pub use sink::RodioSink;
pub use sink::{AudioSink, MemorySink, SinkFactory, SinkLog, SinkSession};
pub use synth::{
    synthesize_sentences, CollectCallback, FnSynthesizer, SpeechSynthesizer, SynthesisCallback,
    SynthesisResult, ToneSynthesizer,
};
pub use text::{split, Sentence, SentenceSplitter};
