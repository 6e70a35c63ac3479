//! Streaming speech demo
//!
//! Splits a passage into sentences, synthesizes them with the built-in tone
//! engine and plays each one as soon as it is ready.

mod args;

use anyhow::Context;
use args::CliArgs;
use parking_lot::Mutex;
use speech_stream::config::{MAX_OUTPUT_SAMPLE_RATE, MIN_OUTPUT_SAMPLE_RATE};
use speech_stream::{split, PipelineConfig, StreamingPipeline, ToneSynthesizer, WavExportCallback};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_ENGINE_SAMPLE_RATE: u32 = 22_050;

const DEFAULT_TEXT: &str = concat!(
    "大家好，今天我们来讨论一下人工智能的发展。",
    "AI技术在recent years取得了remarkable progress。",
    "特别是在Natural Language Processing领域，",
    "像ChatGPT这样的large language models已经能够进行流畅的对话。",
    "这些技术正在改变我们的生活方式。",
    "比如说，语音助手可以帮助我们控制smart home devices。",
    "Machine Learning可以帮助医生诊断疾病。",
    "未来，AI将会更加intelligent，更加helpful。",
    "让我们一起期待这个exciting的未来吧！",
);

fn build_config(args: &CliArgs) -> anyhow::Result<PipelineConfig> {
    let mut config = match &args.config_path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(rate) = args.output_rate {
        config = config.with_output_sample_rate(rate);
    }
    if let Some(channels) = args.channels {
        config = config.with_output_channels(channels);
    }
    if let Some(delay) = args.delay_ms {
        config = config.with_synthesis_delay_ms_per_char(delay);
    }
    if let Some(timeout) = args.idle_timeout_ms {
        config = config.with_idle_timeout_ms(timeout);
    }
    if args.no_play {
        config = config.with_playback(false);
    }

    config.validate().context("Invalid pipeline configuration")?;
    Ok(config)
}

#[cfg(feature = "streaming")]
fn attach_sink(pipeline: StreamingPipeline) -> StreamingPipeline {
    pipeline.with_sink_factory(speech_stream::RodioSink::factory())
}

#[cfg(not(feature = "streaming"))]
fn attach_sink(pipeline: StreamingPipeline) -> StreamingPipeline {
    if pipeline.config().playback_enabled {
        warn!("Built without the \"streaming\" feature; rebuild with `--features streaming` for audio output");
    }
    pipeline
}

fn main() -> anyhow::Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = CliArgs::parse();
    if args.show_help {
        CliArgs::print_help();
        return Ok(());
    }

    let config = build_config(&args)?;
    let text = args.text.clone().unwrap_or_else(|| DEFAULT_TEXT.to_string());
    let engine_rate = args.engine_rate.unwrap_or(DEFAULT_ENGINE_SAMPLE_RATE);
    if !(MIN_OUTPUT_SAMPLE_RATE..=MAX_OUTPUT_SAMPLE_RATE).contains(&engine_rate) {
        anyhow::bail!(
            "Engine sample rate {} Hz outside supported range {}..={} Hz",
            engine_rate,
            MIN_OUTPUT_SAMPLE_RATE,
            MAX_OUTPUT_SAMPLE_RATE
        );
    }
    let sentences = split(&text);

    info!(
        sentences = sentences.len(),
        output_rate = config.output_sample_rate,
        channels = config.output_channels,
        playback = config.playback_enabled,
        "Input: {}",
        text
    );

    // The WAV receives the same results that are streamed
    let export = args
        .save_path
        .as_ref()
        .map(|path| Arc::new(Mutex::new(WavExportCallback::create(path))));

    let mut pipeline = attach_sink(StreamingPipeline::new(config)?);
    if let Some(export) = &export {
        pipeline = pipeline.with_tap(Arc::clone(export));
    }
    let report = pipeline
        .run_sentences(sentences, ToneSynthesizer::new(engine_rate))
        .context("Streaming pipeline failed")?;

    println!("\nStreaming summary");
    println!("=================");
    println!("Sentences:        {}", report.sentences);
    println!("Synthesized:      {}", report.producer.chunks_enqueued);
    println!("Failed:           {}", report.producer.failures.len());
    println!("Played:           {}", report.playback.chunks_played);
    println!("Skipped:          {}", report.playback.chunks_skipped);
    println!("Frames written:   {}", report.playback.frames_written);
    println!("Final state:      {:?}", report.playback.state);
    if let Some(error) = &report.playback.sink_error {
        println!("Sink error:       {}", error);
    }

    if let Some(export) = export {
        let export = Arc::try_unwrap(export)
            .map_err(|_| anyhow::anyhow!("WAV export still in use after the run"))?
            .into_inner();
        let path = export.path().to_path_buf();
        let samples = export
            .finish()
            .with_context(|| format!("Failed to export {}", path.display()))?;
        println!("Saved:            {} ({} samples)", path.display(), samples);
    }

    if !report.is_complete() {
        warn!("Stream did not complete");
        std::process::exit(1);
    }
    Ok(())
}
