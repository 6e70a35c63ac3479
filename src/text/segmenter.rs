//! Sentence segmenter
//!
//! Splits text at sentence-final punctuation so each sentence can be
//! synthesized as soon as it is complete. Recognized terminators are the
//! CJK full-width period, exclamation mark, question mark and semicolon, plus
//! their ASCII equivalents.
//!
//! Emitted sentences keep their text as written (leading spaces included);
//! buffers holding only whitespace are dropped.

/// Sentence-final punctuation
pub const SENTENCE_TERMINATORS: [char; 8] = ['。', '！', '？', '；', '.', '!', '?', ';'];

/// Check whether `c` ends a sentence
pub fn is_sentence_terminator(c: char) -> bool {
    SENTENCE_TERMINATORS.contains(&c)
}

/// One unit of text to synthesize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// 1-based position in the original ordering
    pub index: usize,
    /// Sentence text, including its terminator when present
    pub text: String,
}

impl Sentence {
    /// Number of characters (Unicode scalar values)
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Incremental sentence splitter
///
/// Text can arrive in arbitrary pieces (for example tokens from a language
/// model); sentences are emitted as soon as their terminator is seen.
#[derive(Debug, Default)]
pub struct SentenceSplitter {
    buffer: String,
    emitted: usize,
}

impl SentenceSplitter {
    /// Create an empty splitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more text, returning the sentences it completes
    pub fn push(&mut self, text: &str) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        for c in text.chars() {
            self.buffer.push(c);
            if is_sentence_terminator(c) {
                if let Some(sentence) = self.take_buffer() {
                    sentences.push(sentence);
                }
            }
        }
        sentences
    }

    /// Flush the trailing text that has no terminator
    pub fn finish(&mut self) -> Option<Sentence> {
        self.take_buffer()
    }

    /// Text received but not yet emitted
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Number of sentences emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn take_buffer(&mut self) -> Option<Sentence> {
        let text = std::mem::take(&mut self.buffer);
        if text.trim().is_empty() {
            return None;
        }
        self.emitted += 1;
        Some(Sentence {
            index: self.emitted,
            text,
        })
    }
}

/// Split a complete text into sentences
///
/// # Examples
///
/// ```
/// use speech_stream::text::split;
///
/// let sentences: Vec<String> = split("你好。World! 测试？")
///     .into_iter()
///     .map(|s| s.text)
///     .collect();
/// assert_eq!(sentences, ["你好。", "World!", " 测试？"]);
/// ```
pub fn split(text: &str) -> Vec<Sentence> {
    let mut splitter = SentenceSplitter::new();
    let mut sentences = splitter.push(text);
    sentences.extend(splitter.finish());
    sentences
}
