//! Recorder seam used by the recording session.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::buffer::CaptureBuffer;
use super::wav::encode_wav;

/// Errors raised when starting or stopping a recording.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// No input stream: no microphone, or access was refused.
    #[error("Microphone unavailable. Check that a microphone is connected and that this app may use it.")]
    Unavailable,

    #[error("recorder is not recording")]
    NotRecording,

    #[error("cannot encode recording: {0}")]
    Encode(#[from] hound::Error),
}

/// One finished recording, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    /// Length of the audio itself.
    pub duration: Duration,
}

impl CapturedAudio {
    /// A WAV recording named `recording.wav`.
    pub fn wav(bytes: Vec<u8>, duration: Duration) -> Self {
        Self {
            bytes,
            mime_type: "audio/wav".into(),
            file_name: "recording.wav".into(),
            duration,
        }
    }
}

/// Starts and stops audio capture.
pub trait AudioRecorder: Send {
    fn start(&mut self) -> Result<(), RecorderError>;
    fn stop(&mut self) -> Result<CapturedAudio, RecorderError>;
}

/// [`AudioRecorder`] over the process-wide microphone stream.
pub struct MicRecorder {
    buffer: Arc<CaptureBuffer>,
}

impl MicRecorder {
    pub fn new(buffer: Arc<CaptureBuffer>) -> Self {
        Self { buffer }
    }
}

impl AudioRecorder for MicRecorder {
    fn start(&mut self) -> Result<(), RecorderError> {
        if !self.buffer.is_live() {
            return Err(RecorderError::Unavailable);
        }
        self.buffer.arm();
        Ok(())
    }

    fn stop(&mut self) -> Result<CapturedAudio, RecorderError> {
        if !self.buffer.is_armed() {
            return Err(RecorderError::NotRecording);
        }
        let samples = self.buffer.disarm();
        let rate = self.buffer.sample_rate().max(1);
        let duration = Duration::from_secs_f64(samples.len() as f64 / f64::from(rate));
        let bytes = encode_wav(&samples, rate)?;
        Ok(CapturedAudio::wav(bytes, duration))
    }
}
