//! Audio export of synthesized speech
//!
//! A [`WavExportCallback`] plugs into [`synthesize_sentences`] like the
//! streaming producer does, but persists every sentence to a single WAV file.
//!
//! # Examples
//!
//! ```no_run
//! use speech_stream::export::WavExportCallback;
//! use speech_stream::synth::{synthesize_sentences, ToneSynthesizer};
//! use speech_stream::text::split;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = ToneSynthesizer::new(22_050);
//! let mut export = WavExportCallback::create("speech.wav");
//! synthesize_sentences(&mut engine, &split("你好。World!"), &mut export, Duration::ZERO);
//! let samples = export.finish()?;
//! println!("wrote {samples} samples");
//! # Ok(())
//! # }
//! ```
//!
//! [`synthesize_sentences`]: crate::synth::synthesize_sentences

mod wav;

pub use wav::WavExportCallback;
