//! Playback side of the pipeline
//!
//! The consumer drains the chunk queue in order. Each data chunk is resampled
//! to the output rate, upmixed to the output layout, encoded to little-endian
//! PCM and written synchronously to the sink; the blocking write paces the
//! loop to real time.
//!
//! ```text
//! AwaitingChunk ──chunk──▶ ProcessingChunk ──▶ AwaitingChunk
//!      │
//!      ├─ end marker ─▶ Completed
//!      ├─ timeout ────▶ Stalled
//!      └─ closed ─────▶ Cancelled
//! ```

use super::{ChunkQueue, Dequeued};
use crate::config::PipelineConfig;
use crate::dsp::{pcm_to_le_bytes, resample, to_output_channels, OutputLayout};
use crate::sink::{SinkFactory, SinkSession};
use crate::Result;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Playback state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// Waiting on the queue
    AwaitingChunk,
    /// Converting and writing one chunk
    ProcessingChunk,
    /// End marker received
    Completed,
    /// No chunk arrived within the idle timeout
    Stalled,
    /// Queue closed before the end marker
    Cancelled,
}

impl ConsumerState {
    /// Check whether the consumer has stopped
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConsumerState::Completed | ConsumerState::Stalled | ConsumerState::Cancelled
        )
    }
}

/// Outcome of the playback thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Terminal state
    pub state: ConsumerState,
    /// Data chunks taken off the queue and played or discarded
    pub chunks_played: usize,
    /// Data chunks dropped without playback (no samples or zero sample rate)
    pub chunks_skipped: usize,
    /// Sentence indices in the order they were received
    pub sentence_indices: Vec<usize>,
    /// Output frames handed to the sink
    pub frames_written: usize,
    /// Whether a sink was acquired for this run
    pub playback_active: bool,
    /// First sink error, after which playback continued in discard mode
    pub sink_error: Option<String>,
}

impl PlaybackReport {
    fn new() -> Self {
        PlaybackReport {
            state: ConsumerState::AwaitingChunk,
            chunks_played: 0,
            chunks_skipped: 0,
            sentence_indices: Vec::new(),
            frames_written: 0,
            playback_active: false,
            sink_error: None,
        }
    }
}

/// Queue consumer driving the audio sink
pub struct PlaybackConsumer {
    queue: Arc<ChunkQueue>,
    config: PipelineConfig,
    layout: OutputLayout,
    sink_factory: Option<SinkFactory>,
    ready: Option<Sender<()>>,
}

impl PlaybackConsumer {
    /// Create a consumer for `queue`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn new(queue: Arc<ChunkQueue>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(PlaybackConsumer {
            queue,
            layout: config.layout()?,
            config,
            sink_factory: None,
            ready: None,
        })
    }

    /// Acquire the sink from `factory` when the run starts
    pub fn with_sink_factory(mut self, factory: SinkFactory) -> Self {
        self.sink_factory = Some(factory);
        self
    }

    /// Signal `ready` once the sink is acquired, before the first dequeue
    ///
    /// If acquisition panics the sender is dropped unsent, so the receiver
    /// observes a disconnect instead of waiting forever.
    pub fn with_ready_signal(mut self, ready: Sender<()>) -> Self {
        self.ready = Some(ready);
        self
    }

    /// Run until the end marker, a stall or cancellation
    pub fn run(self) -> PlaybackReport {
        let PlaybackConsumer {
            queue,
            config,
            layout,
            sink_factory,
            ready,
        } = self;

        let mut report = PlaybackReport::new();
        let mut session = acquire_sink(sink_factory, &config, layout);
        report.playback_active = session.is_some();

        if let Some(ready) = ready {
            // The pipeline may already have given up waiting
            let _ = ready.send(());
        }

        let idle_timeout = config.idle_timeout();
        let started = Instant::now();

        while !report.state.is_terminal() {
            report.state = ConsumerState::AwaitingChunk;

            let chunk = match queue.dequeue(idle_timeout) {
                Dequeued::Chunk(chunk) => chunk,
                Dequeued::TimedOut => {
                    warn!(
                        target: "playback",
                        timeout_ms = config.idle_timeout_ms,
                        played = report.chunks_played,
                        "No audio within the idle timeout, stream incomplete"
                    );
                    report.state = ConsumerState::Stalled;
                    break;
                }
                Dequeued::Closed => {
                    info!(target: "playback", played = report.chunks_played, "Playback cancelled");
                    report.state = ConsumerState::Cancelled;
                    break;
                }
            };

            if chunk.is_end_marker {
                info!(
                    target: "playback",
                    played = report.chunks_played,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "End of stream"
                );
                report.state = ConsumerState::Completed;
                break;
            }
            if chunk.is_empty() {
                debug!(target: "playback", index = chunk.sentence_index, "Skipping empty chunk");
                report.chunks_skipped += 1;
                continue;
            }
            if chunk.sample_rate == 0 {
                warn!(target: "playback", index = chunk.sentence_index, "Skipping chunk with zero sample rate");
                report.chunks_skipped += 1;
                continue;
            }

            report.state = ConsumerState::ProcessingChunk;
            info!(
                target: "playback",
                index = chunk.sentence_index,
                samples = chunk.samples.len(),
                sample_rate = chunk.sample_rate,
                duration_ms = chunk.duration_ms(),
                "Playing sentence"
            );

            match session.as_mut() {
                Some(active) => {
                    let resampled = resample(&chunk.samples, chunk.sample_rate, config.output_sample_rate);
                    let frames = resampled.len();
                    let output = to_output_channels(&resampled, layout);
                    let pcm = pcm_to_le_bytes(&output);

                    match active.write(&pcm) {
                        Ok(()) => report.frames_written += frames,
                        Err(e) => {
                            warn!(
                                target: "playback",
                                index = chunk.sentence_index,
                                error = %e,
                                "Audio sink failed, continuing without playback"
                            );
                            if let Err(release_err) = active.release() {
                                debug!(target: "playback", error = %release_err, "Sink release after failure");
                            }
                            report.sink_error = Some(e.to_string());
                            session = None;
                        }
                    }
                }
                None => {
                    let pacing = config.discard_pacing();
                    if !pacing.is_zero() {
                        std::thread::sleep(pacing);
                    }
                }
            }

            report.chunks_played += 1;
            report.sentence_indices.push(chunk.sentence_index.max(0) as usize);
        }

        if let Some(mut active) = session.take() {
            if let Err(e) = active.release() {
                warn!(target: "playback", error = %e, "Failed to release audio sink");
            }
        }
        report
    }
}

/// Acquire the sink, falling back to discard mode on any failure
fn acquire_sink(
    factory: Option<SinkFactory>,
    config: &PipelineConfig,
    layout: OutputLayout,
) -> Option<SinkSession> {
    if !config.playback_enabled {
        info!(target: "playback", "Playback disabled, chunks are drained without output");
        return None;
    }
    let Some(factory) = factory else {
        warn!(target: "playback", "No audio sink available, continuing without playback");
        return None;
    };

    let opened = factory().and_then(|sink| SinkSession::open(sink, config.output_sample_rate, layout));
    match opened {
        Ok(session) => {
            info!(
                target: "playback",
                sample_rate = config.output_sample_rate,
                channels = %layout,
                "Audio sink ready"
            );
            Some(session)
        }
        Err(e) => {
            warn!(target: "playback", error = %e, "Audio sink unavailable, continuing without playback");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::AudioChunk;
    use crate::sink::{MemorySink, SinkEvent};
    use std::time::Duration;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
            .with_output_sample_rate(16_000)
            .with_idle_timeout_ms(200)
            .with_discard_pacing_ms(0)
    }

    fn queue_with(chunks: Vec<AudioChunk>) -> Arc<ChunkQueue> {
        let queue = Arc::new(ChunkQueue::new());
        for chunk in chunks {
            queue.enqueue(chunk).unwrap();
        }
        queue
    }

    #[test]
    fn test_plays_until_end_marker() {
        let queue = queue_with(vec![
            AudioChunk::data(vec![1; 160], 16_000, 1),
            AudioChunk::data(vec![2; 80], 8_000, 2),
            AudioChunk::end_marker(),
        ]);
        let (sink, log) = MemorySink::new();

        let report = PlaybackConsumer::new(queue, config())
            .unwrap()
            .with_sink_factory(sink.into_factory())
            .run();

        assert_eq!(report.state, ConsumerState::Completed);
        assert_eq!(report.sentence_indices, [1, 2]);
        assert_eq!(report.frames_written, 320);
        assert!(report.playback_active);

        let log = log.lock();
        assert_eq!(log.writes(), 2);
        assert_eq!(log.samples().len(), 320);
        assert_eq!(log.count(&SinkEvent::Stop), 1);
        assert_eq!(log.count(&SinkEvent::Close), 1);
    }

    #[test]
    fn test_stereo_doubles_samples() {
        let queue = queue_with(vec![
            AudioChunk::data(vec![100, -200, 300], 16_000, 1),
            AudioChunk::end_marker(),
        ]);
        let (sink, log) = MemorySink::new();

        let report = PlaybackConsumer::new(queue, config().with_output_channels(2))
            .unwrap()
            .with_sink_factory(sink.into_factory())
            .run();

        assert_eq!(report.frames_written, 3);
        assert_eq!(log.lock().samples(), vec![100, 100, -200, -200, 300, 300]);
    }

    #[test]
    fn test_skips_empty_and_zero_rate_chunks() {
        let queue = queue_with(vec![
            AudioChunk::data(Vec::new(), 16_000, 1),
            AudioChunk::data(vec![5; 10], 0, 2),
            AudioChunk::data(vec![5; 10], 16_000, 3),
            AudioChunk::end_marker(),
        ]);
        let (sink, log) = MemorySink::new();

        let report = PlaybackConsumer::new(queue, config())
            .unwrap()
            .with_sink_factory(sink.into_factory())
            .run();

        assert_eq!(report.state, ConsumerState::Completed);
        assert_eq!(report.sentence_indices, [3]);
        assert_eq!(report.chunks_played, 1);
        assert_eq!(report.chunks_skipped, 2);
        assert_eq!(log.lock().writes(), 1);
    }

    #[test]
    fn test_stalls_after_idle_timeout() {
        let queue = queue_with(vec![AudioChunk::data(vec![1; 16], 16_000, 1)]);
        let (sink, log) = MemorySink::new();

        let started = Instant::now();
        let report = PlaybackConsumer::new(queue, config())
            .unwrap()
            .with_sink_factory(sink.into_factory())
            .run();

        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(report.state, ConsumerState::Stalled);
        assert_eq!(report.chunks_played, 1);
        let log = log.lock();
        assert_eq!(log.count(&SinkEvent::Stop), 1);
        assert_eq!(log.count(&SinkEvent::Close), 1);
    }

    #[test]
    fn test_closed_queue_cancels() {
        let queue = queue_with(vec![AudioChunk::data(vec![1; 16], 16_000, 1)]);
        queue.close();

        let report = PlaybackConsumer::new(queue, config()).unwrap().run();
        assert_eq!(report.state, ConsumerState::Cancelled);
        assert_eq!(report.chunks_played, 1);
    }

    #[test]
    fn test_unavailable_sink_falls_back_to_discard() {
        let queue = queue_with(vec![
            AudioChunk::data(vec![1; 16], 16_000, 1),
            AudioChunk::end_marker(),
        ]);
        let (sink, log) = MemorySink::new();

        let report = PlaybackConsumer::new(queue, config())
            .unwrap()
            .with_sink_factory(sink.fail_on_start().into_factory())
            .run();

        assert_eq!(report.state, ConsumerState::Completed);
        assert!(!report.playback_active);
        assert_eq!(report.chunks_played, 1);
        assert_eq!(report.frames_written, 0);
        let log = log.lock();
        assert_eq!(log.writes(), 0);
        assert_eq!(log.count(&SinkEvent::Close), 1);
    }

    #[test]
    fn test_write_failure_releases_and_discards() {
        let queue = queue_with(vec![
            AudioChunk::data(vec![1; 16], 16_000, 1),
            AudioChunk::data(vec![1; 16], 16_000, 2),
            AudioChunk::data(vec![1; 16], 16_000, 3),
            AudioChunk::end_marker(),
        ]);
        let (sink, log) = MemorySink::new();

        let report = PlaybackConsumer::new(queue, config())
            .unwrap()
            .with_sink_factory(sink.fail_on_write(2).into_factory())
            .run();

        assert_eq!(report.state, ConsumerState::Completed);
        assert_eq!(report.sentence_indices, [1, 2, 3]);
        assert_eq!(report.frames_written, 16);
        assert!(report.sink_error.is_some());

        let log = log.lock();
        assert_eq!(log.writes(), 1);
        assert_eq!(log.count(&SinkEvent::Stop), 1);
        assert_eq!(log.count(&SinkEvent::Close), 1);
    }

    #[test]
    fn test_playback_disabled_ignores_factory() {
        let queue = queue_with(vec![AudioChunk::end_marker()]);
        let (sink, log) = MemorySink::new();

        let report = PlaybackConsumer::new(queue, config().with_playback(false))
            .unwrap()
            .with_sink_factory(sink.into_factory())
            .run();

        assert_eq!(report.state, ConsumerState::Completed);
        assert!(!report.playback_active);
        assert!(log.lock().events.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let queue = Arc::new(ChunkQueue::new());
        assert!(PlaybackConsumer::new(Arc::clone(&queue), config().with_output_channels(3)).is_err());
        assert!(PlaybackConsumer::new(queue, config().with_idle_timeout_ms(0)).is_err());
    }
}
