//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] opens the default input device and streams mono blocks
//! into a [`CaptureBuffer`].  The returned [`StreamHandle`] keeps the stream
//! alive; dropping it stops capture.  `cpal::Stream` is not `Send` on every
//! platform, so the handle stays on the thread that created it.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::buffer::CaptureBuffer;
use super::wav::downmix_to_mono;

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while opening the input stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Default input device plus its preferred stream configuration.
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl AudioCapture {
    /// Open the system default input device.
    pub fn new() -> Result<Self, CaptureError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;
        let config: cpal::StreamConfig = device.default_input_config()?.into();
        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Start streaming into `buffer` and mark it live.
    pub fn start(&self, buffer: Arc<CaptureBuffer>) -> Result<StreamHandle, CaptureError> {
        let channels = self.channels();
        let sink = Arc::clone(&buffer);

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if sink.is_armed() {
                    sink.push(&downmix_to_mono(data, channels));
                }
            },
            |err: cpal::StreamError| {
                log::error!("audio: stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        buffer.mark_live(self.sample_rate());
        log::info!(
            "audio: capturing at {} Hz, {} channel(s)",
            self.sample_rate(),
            channels
        );
        Ok(StreamHandle { _stream: stream })
    }
}
