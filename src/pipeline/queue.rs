//! Chunk queue between the synthesis and playback threads
//!
//! Unbounded FIFO: the producer never waits for the consumer, the queue absorbs
//! the rate mismatch. Chunks are bounded in size and a spoken passage is finite,
//! so memory stays bounded by the passage length.
//!
//! # Thread Safety
//! - Any number of producers and consumers may share it through `Arc`
//! - `parking_lot::Mutex` guards the items, a `Condvar` wakes waiting consumers

use super::AudioChunk;
use crate::{Result, StreamError};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Outcome of a timed dequeue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    /// Next chunk in enqueue order
    Chunk(AudioChunk),
    /// Nothing arrived before the timeout (idle, not end of stream)
    TimedOut,
    /// The queue was closed and holds no more items
    Closed,
}

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<AudioChunk>,
    closed: bool,
}

/// Thread-safe FIFO of audio chunks
#[derive(Debug, Default)]
pub struct ChunkQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl ChunkQueue {
    /// Create an empty, open queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk; never blocks
    ///
    /// # Errors
    ///
    /// Returns `QueueClosed` if the queue was closed.
    pub fn enqueue(&self, chunk: AudioChunk) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(StreamError::QueueClosed);
        }
        state.items.push_back(chunk);
        drop(state);

        self.available.notify_one();
        Ok(())
    }

    /// Remove the oldest chunk, waiting up to `timeout` for one to arrive
    ///
    /// Items enqueued before `close` are still delivered; `Closed` is returned
    /// only once the queue is drained.
    pub fn dequeue(&self, timeout: Duration) -> Dequeued {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        loop {
            if let Some(chunk) = state.items.pop_front() {
                return Dequeued::Chunk(chunk);
            }
            if state.closed {
                return Dequeued::Closed;
            }
            // Re-check the items after every wakeup, spurious or not
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return match state.items.pop_front() {
                    Some(chunk) => Dequeued::Chunk(chunk),
                    None if state.closed => Dequeued::Closed,
                    None => Dequeued::TimedOut,
                };
            }
        }
    }

    /// Reject further chunks and wake every waiting consumer
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    /// Check whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of chunks waiting
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Check whether no chunk is waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
