//! Text segmentation into sentence units

pub mod segmenter;

pub use segmenter::{is_sentence_terminator, split, Sentence, SentenceSplitter};
