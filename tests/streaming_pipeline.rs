use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use speech_stream::pipeline::{run_producer, ConsumerState};
use speech_stream::sink::SinkEvent;
use speech_stream::{
    split, AudioChunk, AudioSink, ChunkQueue, FnSynthesizer, MemorySink, PipelineConfig,
    PlaybackConsumer, StreamError, StreamingPipeline, SynthesisResult, ToneSynthesizer,
    WavExportCallback,
};

fn test_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_output_sample_rate(16_000)
        .with_synthesis_delay_ms_per_char(0)
        .with_idle_timeout_ms(2_000)
        .with_discard_pacing_ms(0)
}

/// Engine that fails every sentence containing "fail"
fn flaky_engine(sample_rate: u32) -> impl speech_stream::SpeechSynthesizer {
    FnSynthesizer::new("flaky", move |text: &str| {
        if text.contains("fail") {
            SynthesisResult::failure("synthetic failure")
        } else {
            SynthesisResult::success(vec![1_000; text.chars().count() * 10], sample_rate, 0)
        }
    })
}

#[test]
fn sentences_play_in_order_with_one_end_marker() {
    let (sink, log) = MemorySink::new();
    let text = "你好。World! 测试？One more; last.";

    let report = StreamingPipeline::new(test_config())
        .unwrap()
        .with_sink(sink)
        .run(text, ToneSynthesizer::new(22_050).with_ms_per_char(10))
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.sentences, 5);
    assert_eq!(report.playback.sentence_indices, [1, 2, 3, 4, 5]);
    assert_eq!(report.playback.state, ConsumerState::Completed);

    let log = log.lock();
    assert_eq!(log.writes(), 5);
    assert_eq!(log.count(&SinkEvent::Stop), 1);
    assert_eq!(log.count(&SinkEvent::Close), 1);
    assert_eq!(log.events.last(), Some(&SinkEvent::Close));
}

#[test]
fn failed_sentences_are_skipped() {
    let report = StreamingPipeline::new(test_config().with_playback(false))
        .unwrap()
        .run("first. fail here. third. fail again. fifth.", flaky_engine(16_000))
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.playback.sentence_indices, [1, 3, 5]);
    let failed: Vec<usize> = report
        .producer
        .failures
        .iter()
        .map(|f| f.sentence_index)
        .collect();
    assert_eq!(failed, [2, 4]);
}

#[test]
fn stereo_output_doubles_resampled_length() {
    let (sink, log) = MemorySink::new();
    let config = test_config().with_output_channels(2).with_output_sample_rate(48_000);

    let report = StreamingPipeline::new(config)
        .unwrap()
        .with_sink(sink)
        .run("abcd.", flaky_engine(16_000))
        .unwrap();

    // 5 chars * 10 samples at 16 kHz -> 150 frames at 48 kHz
    assert_eq!(report.playback.frames_written, 150);
    let samples = log.lock().samples();
    assert_eq!(samples.len(), 300);
    assert!(samples.chunks_exact(2).all(|frame| frame[0] == frame[1]));
}

#[test]
fn missing_end_marker_stalls_after_timeout() {
    let queue = Arc::new(ChunkQueue::new());
    queue.enqueue(AudioChunk::data(vec![0; 160], 16_000, 1)).unwrap();
    let (sink, log) = MemorySink::new();

    let consumer = PlaybackConsumer::new(Arc::clone(&queue), test_config().with_idle_timeout_ms(300))
        .unwrap()
        .with_sink_factory(sink.into_factory());

    let started = Instant::now();
    let handle = thread::spawn(move || consumer.run());

    thread::sleep(Duration::from_millis(100));
    assert!(!handle.is_finished(), "consumer stalled before the idle timeout");

    let report = handle.join().unwrap();
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(report.state, ConsumerState::Stalled);
    assert_eq!(report.chunks_played, 1);

    let log = log.lock();
    assert_eq!(log.count(&SinkEvent::Stop), 1);
    assert_eq!(log.count(&SinkEvent::Close), 1);
}

#[test]
fn slow_producer_within_timeout_completes() {
    let queue = Arc::new(ChunkQueue::new());
    let consumer = PlaybackConsumer::new(Arc::clone(&queue), test_config().with_idle_timeout_ms(500))
        .unwrap();
    let playback = thread::spawn(move || consumer.run());

    let mut engine = FnSynthesizer::new("slow", |_: &str| {
        thread::sleep(Duration::from_millis(100));
        SynthesisResult::success(vec![0; 16], 16_000, 100)
    });
    let producer = run_producer(&mut engine, &split("a.b.c."), queue, Duration::ZERO);

    let report = playback.join().unwrap();
    assert_eq!(producer.chunks_enqueued, 3);
    assert_eq!(report.state, ConsumerState::Completed);
    assert_eq!(report.sentence_indices, [1, 2, 3]);
}

#[test]
fn unavailable_sink_falls_back_to_discard() {
    let (sink, log) = MemorySink::new();

    let report = StreamingPipeline::new(test_config())
        .unwrap()
        .with_sink(sink.fail_on_start())
        .run("one. two.", flaky_engine(16_000))
        .unwrap();

    assert!(report.is_complete());
    assert!(!report.playback.playback_active);
    assert_eq!(report.playback.chunks_played, 2);

    let log = log.lock();
    assert_eq!(log.writes(), 0);
    assert_eq!(log.count(&SinkEvent::Close), 1);
}

#[test]
fn sink_write_error_is_recorded_and_released_once() {
    let (sink, log) = MemorySink::new();

    let report = StreamingPipeline::new(test_config())
        .unwrap()
        .with_sink(sink.fail_on_write(1))
        .run("one. two. three.", flaky_engine(16_000))
        .unwrap();

    assert!(report.is_complete());
    assert!(report.playback.sink_error.is_some());
    assert_eq!(report.playback.chunks_played, 3);

    let log = log.lock();
    assert_eq!(log.count(&SinkEvent::Stop), 1);
    assert_eq!(log.count(&SinkEvent::Close), 1);
}

#[test]
fn invalid_configuration_rejected_before_start() {
    for config in [
        test_config().with_output_channels(0),
        test_config().with_output_channels(3),
        test_config().with_output_sample_rate(0),
        test_config().with_idle_timeout_ms(0),
    ] {
        assert!(matches!(
            StreamingPipeline::new(config),
            Err(StreamError::ConfigError(_))
        ));
    }
}

#[test]
fn cancel_stops_synthesis_and_playback() {
    let (sink, log) = MemorySink::new();
    let pipeline = StreamingPipeline::new(test_config())
        .unwrap()
        .with_sink(sink.with_write_delay(Duration::from_millis(20)));
    let handle = pipeline.handle();

    let engine = FnSynthesizer::new("slow", |_: &str| {
        thread::sleep(Duration::from_millis(30));
        SynthesisResult::success(vec![0; 160], 16_000, 30)
    });
    let text = "s.".repeat(50);

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        handle.cancel();
    });

    let started = Instant::now();
    let report = pipeline.run(&text, engine).unwrap();
    canceller.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(report.producer.cancelled);
    assert_eq!(report.playback.state, ConsumerState::Cancelled);
    assert!(report.playback.chunks_played < 50);
    assert!(!report.is_complete());

    let log = log.lock();
    assert_eq!(log.count(&SinkEvent::Stop), 1);
    assert_eq!(log.count(&SinkEvent::Close), 1);
}

#[test]
fn empty_text_completes_immediately() {
    let report = StreamingPipeline::new(test_config().with_playback(false))
        .unwrap()
        .run("   ", ToneSynthesizer::new(16_000))
        .unwrap();

    assert_eq!(report.sentences, 0);
    assert!(report.is_complete());
    assert!(report.playback.sentence_indices.is_empty());
}

#[test]
fn panicking_sink_factory_is_reported_not_hung() {
    let pipeline = StreamingPipeline::new(test_config().with_idle_timeout_ms(500))
        .unwrap()
        .with_sink_factory(Box::new(|| -> speech_stream::Result<Box<dyn AudioSink>> {
            panic!("device driver crashed")
        }));

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    thread::spawn(move || {
        let result = pipeline.run("a.", ToneSynthesizer::new(16_000));
        let _ = done_tx.send(matches!(result, Err(StreamError::ThreadPanicked("playback"))));
    });

    let reported = done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("run() did not return after the playback thread panicked");
    assert!(reported);
}

#[test]
fn silent_sentence_does_not_mark_run_incomplete() {
    let engine = FnSynthesizer::new("silent", |text: &str| {
        let samples = if text.contains("silent") { Vec::new() } else { vec![10; 64] };
        SynthesisResult::success(samples, 16_000, 0)
    });

    let report = StreamingPipeline::new(test_config().with_playback(false))
        .unwrap()
        .run("hello. silent. bye.", engine)
        .unwrap();

    assert_eq!(report.playback.state, ConsumerState::Completed);
    assert_eq!(report.playback.sentence_indices, [1, 3]);
    assert_eq!(report.playback.chunks_skipped, 1);
    assert!(report.is_complete());
}

#[test]
fn saved_wav_matches_streamed_audio() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamed.wav");
    let export = Arc::new(Mutex::new(WavExportCallback::create(&path)));
    let calls = Arc::new(Mutex::new(0usize));

    let engine = {
        let calls = Arc::clone(&calls);
        FnSynthesizer::new("counting", move |text: &str| {
            *calls.lock() += 1;
            SynthesisResult::success(vec![500; text.chars().count() * 10], 16_000, 0)
        })
    };

    let report = StreamingPipeline::new(test_config().with_playback(false))
        .unwrap()
        .with_tap(Arc::clone(&export))
        .run("one. two. three.", engine)
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(*calls.lock(), 3);

    let export = Arc::try_unwrap(export).ok().unwrap().into_inner();
    // "one." (4 chars) + " two." (5) + " three." (7), 10 samples each
    assert_eq!(export.finish().unwrap(), 160);

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().sample_rate, 16_000);
    assert_eq!(reader.len(), 160);
}
