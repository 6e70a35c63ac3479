//! Audio sink boundary
//!
//! The playback thread hands finished PCM to an [`AudioSink`]. The sink is a
//! scoped resource: it is acquired once per run through a [`SinkFactory`],
//! wrapped in a [`SinkSession`], and released (stop, then close) exactly once
//! on every exit path.

pub mod memory;
#[cfg(feature = "streaming")]
pub mod audio_device;

pub use memory::{MemorySink, SharedSinkLog, SinkEvent, SinkLog};
#[cfg(feature = "streaming")]
pub use audio_device::RodioSink;

use crate::dsp::OutputLayout;
use crate::{Result, StreamError};
use tracing::{debug, warn};

/// Buffer backoff time in microseconds while waiting for a sink to accept data
pub const BUFFER_BACKOFF_MICROS: u64 = 1_000;

/// Output device contract
///
/// `write` blocks until the device has accepted the data; this is what paces
/// the playback thread to real time.
pub trait AudioSink {
    /// Set the PCM format before starting
    fn configure(&mut self, sample_rate: u32, channels: u16) -> Result<()>;

    /// Open the device and begin playback
    fn start(&mut self) -> Result<()>;

    /// Write interleaved little-endian i16 PCM
    fn write(&mut self, pcm: &[u8]) -> Result<()>;

    /// Stop playback
    fn stop(&mut self) -> Result<()>;

    /// Release the device
    fn close(&mut self) -> Result<()>;
}

/// Deferred sink constructor, invoked on the playback thread
///
/// The sink itself never crosses threads, so device handles that are not
/// `Send` are fine.
pub type SinkFactory = Box<dyn FnOnce() -> Result<Box<dyn AudioSink>> + Send>;

/// An acquired sink, released exactly once
pub struct SinkSession {
    sink: Option<Box<dyn AudioSink>>,
}

impl SinkSession {
    /// Configure and start `sink`
    ///
    /// On failure the partially acquired sink is released before the error is
    /// returned.
    pub fn open(sink: Box<dyn AudioSink>, sample_rate: u32, layout: OutputLayout) -> Result<Self> {
        let mut session = SinkSession { sink: Some(sink) };
        if let Some(sink) = session.sink.as_mut() {
            sink.configure(sample_rate, layout.channel_count())?;
            sink.start()?;
        }
        debug!(target: "playback", sample_rate, channels = %layout, "Audio sink started");
        Ok(session)
    }

    /// Write PCM to the sink, blocking until it is accepted
    pub fn write(&mut self, pcm: &[u8]) -> Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.write(pcm),
            None => Err(StreamError::AudioDeviceError(
                "Audio sink already released".into(),
            )),
        }
    }

    /// Check whether the sink is still held
    pub fn is_active(&self) -> bool {
        self.sink.is_some()
    }

    /// Stop and close the sink; later calls do nothing
    ///
    /// `close` runs even when `stop` fails; the first error is returned.
    pub fn release(&mut self) -> Result<()> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        let stopped = sink.stop();
        let closed = sink.close();
        debug!(target: "playback", "Audio sink released");
        stopped.and(closed)
    }
}

impl Drop for SinkSession {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(target: "playback", error = %e, "Failed to release audio sink");
        }
    }
}
