//! Audio device integration using rodio
//!
//! Each write becomes one `SamplesBuffer` appended to a rodio `Sink`. A write
//! returns once at most [`MAX_QUEUED_BUFFERS`] buffers are waiting, which keeps
//! one sentence queued ahead of the one playing and paces the caller to real time.

use super::{AudioSink, SinkFactory, BUFFER_BACKOFF_MICROS};
use crate::{Result, StreamError};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;

/// Buffers allowed to wait in the rodio sink before `write` blocks
pub const MAX_QUEUED_BUFFERS: usize = 1;

struct DeviceOutput {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

/// Audio playback device using rodio
pub struct RodioSink {
    sample_rate: u32,
    channels: u16,
    output: Option<DeviceOutput>,
}

impl RodioSink {
    /// Create an unconfigured, stopped sink
    pub fn new() -> Self {
        RodioSink {
            sample_rate: 0,
            channels: 0,
            output: None,
        }
    }

    /// Factory opening the default output device on the playback thread
    pub fn factory() -> SinkFactory {
        Box::new(|| Ok(Box::new(RodioSink::new()) as Box<dyn AudioSink>))
    }

    fn device(&self) -> Result<&DeviceOutput> {
        self.output
            .as_ref()
            .ok_or_else(|| StreamError::AudioDeviceError("Audio device not started".into()))
    }
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for RodioSink {
    fn configure(&mut self, sample_rate: u32, channels: u16) -> Result<()> {
        if sample_rate == 0 || channels == 0 {
            return Err(StreamError::ConfigError(format!(
                "Unsupported device format: {sample_rate} Hz, {channels} channels"
            )));
        }
        self.sample_rate = sample_rate;
        self.channels = channels;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if self.output.is_some() {
            return Ok(());
        }
        if self.sample_rate == 0 {
            return Err(StreamError::AudioDeviceError(
                "Audio device started before configure".into(),
            ));
        }

        let (stream, handle) = OutputStream::try_default().map_err(|e| {
            StreamError::AudioDeviceError(format!("Failed to create audio stream: {e}"))
        })?;
        let sink = Sink::try_new(&handle).map_err(|e| {
            StreamError::AudioDeviceError(format!("Failed to create audio sink: {e}"))
        })?;
        sink.play();

        self.output = Some(DeviceOutput {
            _stream: stream,
            _handle: handle,
            sink,
        });
        Ok(())
    }

    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        let (channels, sample_rate) = (self.channels, self.sample_rate);
        let device = self.device()?;

        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        device
            .sink
            .append(SamplesBuffer::new(channels, sample_rate, samples));

        while device.sink.len() > MAX_QUEUED_BUFFERS {
            std::thread::sleep(Duration::from_micros(BUFFER_BACKOFF_MICROS));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(device) = self.output.as_ref() {
            // Let the queued audio finish before stopping
            device.sink.sleep_until_end();
            device.sink.stop();
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.output = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_started_sink(sample_rate: u32, channels: u16) -> Option<RodioSink> {
        let mut sink = RodioSink::new();
        sink.configure(sample_rate, channels).ok()?;
        match sink.start() {
            Ok(()) => Some(sink),
            Err(err) => {
                eprintln!("Skipping rodio sink test (audio backend unavailable): {err}");
                None
            }
        }
    }

    #[test]
    fn test_write_before_start_fails() {
        let mut sink = RodioSink::new();
        sink.configure(48_000, 1).unwrap();
        assert!(sink.write(&[0, 0]).is_err());
    }

    #[test]
    fn test_invalid_format_rejected() {
        let mut sink = RodioSink::new();
        assert!(sink.configure(0, 1).is_err());
        assert!(sink.configure(48_000, 0).is_err());
        assert!(sink.start().is_err());
    }

    #[test]
    fn test_start_write_stop_close() {
        let Some(mut sink) = try_started_sink(48_000, 2) else {
            return;
        };
        sink.write(&vec![0u8; 960 * 4]).unwrap();
        sink.stop().unwrap();
        sink.close().unwrap();
        assert!(sink.output.is_none());
    }
}
