//! Audio chunk passed from the synthesis thread to the playback thread

/// Sentence index carried by the end marker
pub const END_MARKER_INDEX: i64 = -1;

/// One sentence of synthesized audio, or the end-of-stream marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Mono i16 PCM at `sample_rate`
    pub samples: Vec<i16>,
    /// Source sample rate reported by the engine (0 for the end marker)
    pub sample_rate: u32,
    /// 1-based index of the originating sentence; non-positive for the end marker
    pub sentence_index: i64,
    /// No further chunks follow this one
    pub is_end_marker: bool,
}

impl AudioChunk {
    /// Data chunk for one synthesized sentence
    pub fn data(samples: Vec<i16>, sample_rate: u32, sentence_index: usize) -> Self {
        AudioChunk {
            samples,
            sample_rate,
            sentence_index: sentence_index as i64,
            is_end_marker: false,
        }
    }

    /// Terminal marker of a stream
    pub fn end_marker() -> Self {
        AudioChunk {
            samples: Vec::new(),
            sample_rate: 0,
            sentence_index: END_MARKER_INDEX,
            is_end_marker: true,
        }
    }

    /// Chunk length in milliseconds at its source rate
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / u64::from(self.sample_rate)
    }

    /// Check whether the chunk carries no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_marker_shape() {
        let marker = AudioChunk::end_marker();
        assert!(marker.is_end_marker);
        assert!(marker.is_empty());
        assert!(marker.sentence_index <= 0);
        assert_eq!(marker.duration_ms(), 0);
    }

    #[test]
    fn test_data_chunk_duration() {
        let chunk = AudioChunk::data(vec![0; 22_050], 22_050, 4);
        assert!(!chunk.is_end_marker);
        assert_eq!(chunk.sentence_index, 4);
        assert_eq!(chunk.duration_ms(), 1000);
    }
}
