//! Audio capture for push-to-talk.
//!
//! ```text
//! Microphone → cpal callback → downmix_to_mono → CaptureBuffer (while armed)
//!                                              ↘ LevelMeter (live bars)
//! MicRecorder::stop → encode_wav → CapturedAudio → transcription upload
//! ```

pub mod buffer;
pub mod capture;
pub mod levels;
pub mod recorder;
pub mod wav;

pub use buffer::CaptureBuffer;
pub use capture::{AudioCapture, CaptureError, StreamHandle};
pub use levels::{db_to_level, LevelMeter};
pub use recorder::{AudioRecorder, CapturedAudio, MicRecorder, RecorderError};
pub use wav::{downmix_to_mono, encode_wav, save_recording};
