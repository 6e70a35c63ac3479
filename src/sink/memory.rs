//! In-memory audio sink
//!
//! Records every call and the written PCM into a shared [`SinkLog`]. Used for
//! headless runs and tests; failures can be injected at start or at a given write.

use super::{AudioSink, SinkFactory};
use crate::{Result, StreamError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// One call received by a [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// `configure` with its arguments
    Configure {
        /// Requested sample rate
        sample_rate: u32,
        /// Requested channel count
        channels: u16,
    },
    /// `start`
    Start,
    /// `write` with the number of bytes accepted
    Write(usize),
    /// `stop`
    Stop,
    /// `close`
    Close,
}

/// Everything a [`MemorySink`] received
#[derive(Debug, Default)]
pub struct SinkLog {
    /// Calls in order
    pub events: Vec<SinkEvent>,
    /// Concatenated PCM bytes
    pub bytes: Vec<u8>,
}

impl SinkLog {
    /// Number of occurrences of `event`
    pub fn count(&self, event: &SinkEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    /// Number of `write` calls
    pub fn writes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Write(_)))
            .count()
    }

    /// Written PCM decoded back to i16
    pub fn samples(&self) -> Vec<i16> {
        self.bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }
}

/// Log shared between a [`MemorySink`] and its observer
pub type SharedSinkLog = Arc<Mutex<SinkLog>>;

/// Sink that keeps written audio in memory
#[derive(Debug)]
pub struct MemorySink {
    log: SharedSinkLog,
    fail_on_start: bool,
    fail_on_write: Option<usize>,
    write_delay: Duration,
}

impl MemorySink {
    /// Create a sink and the handle to its log
    pub fn new() -> (Self, SharedSinkLog) {
        let log = Arc::new(Mutex::new(SinkLog::default()));
        let sink = MemorySink {
            log: Arc::clone(&log),
            fail_on_start: false,
            fail_on_write: None,
            write_delay: Duration::ZERO,
        };
        (sink, log)
    }

    /// Make `start` fail, as an unavailable device would
    pub fn fail_on_start(mut self) -> Self {
        self.fail_on_start = true;
        self
    }

    /// Make the `nth` write (1-based) fail
    pub fn fail_on_write(mut self, nth: usize) -> Self {
        self.fail_on_write = Some(nth);
        self
    }

    /// Block each write for `delay`, imitating device buffering
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Wrap this sink into a [`SinkFactory`]
    pub fn into_factory(self) -> SinkFactory {
        Box::new(move || Ok(Box::new(self) as Box<dyn AudioSink>))
    }
}

impl AudioSink for MemorySink {
    fn configure(&mut self, sample_rate: u32, channels: u16) -> Result<()> {
        self.log.lock().events.push(SinkEvent::Configure {
            sample_rate,
            channels,
        });
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.log.lock().events.push(SinkEvent::Start);
        if self.fail_on_start {
            return Err(StreamError::AudioDeviceError(
                "Memory sink configured to fail on start".into(),
            ));
        }
        Ok(())
    }

    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        let mut log = self.log.lock();
        if self.fail_on_write == Some(log.writes() + 1) {
            return Err(StreamError::AudioDeviceError(
                "Memory sink configured to fail on write".into(),
            ));
        }
        log.events.push(SinkEvent::Write(pcm.len()));
        log.bytes.extend_from_slice(pcm);
        drop(log);

        if !self.write_delay.is_zero() {
            std::thread::sleep(self.write_delay);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.log.lock().events.push(SinkEvent::Stop);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.log.lock().events.push(SinkEvent::Close);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_writes() {
        let (mut sink, log) = MemorySink::new();
        sink.write(&[1, 0, 2, 0]).unwrap();
        sink.write(&[0xFF, 0xFF]).unwrap();

        let log = log.lock();
        assert_eq!(log.writes(), 2);
        assert_eq!(log.samples(), vec![1, 2, -1]);
    }

    #[test]
    fn test_injected_write_failure() {
        let (sink, log) = MemorySink::new();
        let mut sink = sink.fail_on_write(2);
        assert!(sink.write(&[0, 0]).is_ok());
        assert!(sink.write(&[0, 0]).is_err());
        assert_eq!(log.lock().writes(), 1);
    }

    #[test]
    fn test_factory_builds_sink() {
        let (sink, log) = MemorySink::new();
        let mut built = (sink.into_factory())().unwrap();
        built.start().unwrap();
        assert_eq!(log.lock().events, vec![SinkEvent::Start]);
    }
}
