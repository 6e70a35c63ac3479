//! WAV file export

use crate::dsp::resample;
use crate::synth::{SynthesisCallback, SynthesisResult};
use crate::text::Sentence;
use crate::{Result, StreamError};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Synthesis callback writing all sentences into one 16-bit mono WAV file
///
/// The file is created at the sample rate of the first successful sentence;
/// later sentences at another rate are resampled to it. Nothing is written
/// when no sentence succeeds.
pub struct WavExportCallback {
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
    sample_rate: u32,
    samples_written: usize,
    error: Option<StreamError>,
}

impl WavExportCallback {
    /// Export to `path`; the file is created on the first sentence
    pub fn create<P: AsRef<Path>>(path: P) -> Self {
        WavExportCallback {
            path: path.as_ref().to_path_buf(),
            writer: None,
            sample_rate: 0,
            samples_written: 0,
            error: None,
        }
    }

    /// Output path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Samples written so far
    pub fn samples_written(&self) -> usize {
        self.samples_written
    }

    /// Finalize the file and return the number of samples written
    ///
    /// # Errors
    ///
    /// Returns the first `AudioFileError` met while exporting.
    pub fn finish(mut self) -> Result<usize> {
        self.finalize();
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(self.samples_written),
        }
    }

    fn write_result(&mut self, result: &SynthesisResult) -> Result<()> {
        if self.writer.is_none() {
            let spec = WavSpec {
                channels: 1,
                sample_rate: result.sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            };
            let writer = WavWriter::create(&self.path, spec).map_err(|e| {
                StreamError::AudioFileError(format!("Failed to create WAV file: {}", e))
            })?;
            self.writer = Some(writer);
            self.sample_rate = result.sample_rate;
            debug!(target: "synthesis", path = %self.path.display(), sample_rate = self.sample_rate, "WAV export started");
        }

        let samples = resample(&result.samples, result.sample_rate, self.sample_rate);
        if let Some(writer) = self.writer.as_mut() {
            for &sample in samples.iter() {
                writer.write_sample(sample).map_err(|e| {
                    StreamError::AudioFileError(format!("Failed to write sample: {}", e))
                })?;
            }
        }
        self.samples_written += samples.len();
        Ok(())
    }

    fn finalize(&mut self) {
        let Some(writer) = self.writer.take() else {
            return;
        };
        match writer.finalize() {
            Ok(()) => info!(
                target: "synthesis",
                path = %self.path.display(),
                samples = self.samples_written,
                "WAV export complete"
            ),
            Err(e) => self.record_error(StreamError::AudioFileError(format!(
                "Failed to finalize WAV file: {}",
                e
            ))),
        }
    }

    fn record_error(&mut self, error: StreamError) {
        warn!(target: "synthesis", error = %error, "WAV export error");
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

impl SynthesisCallback for WavExportCallback {
    fn on_event(&mut self, sentence: &Sentence, result: SynthesisResult) {
        if self.error.is_some() {
            return;
        }
        if result.sample_rate == 0 {
            warn!(target: "synthesis", index = sentence.index, "Not exporting sentence with zero sample rate");
            return;
        }
        if let Err(e) = self.write_result(&result) {
            self.record_error(e);
        }
    }

    fn on_close(&mut self) {
        self.finalize();
    }
}
