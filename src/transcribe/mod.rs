//! Speech-to-text over an OpenAI-compatible audio API.
//!
//! * [`Transcriber`]: async trait the pipeline depends on.
//! * [`WhisperApiClient`]: multipart `POST /v1/audio/transcriptions`.
//! * [`TranscribeError`]: credential, transport and empty-result failures.

pub mod client;

pub use client::WhisperApiClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::CapturedAudio;

// ---------------------------------------------------------------------------
// TranscribeError
// ---------------------------------------------------------------------------

/// Errors that can occur while transcribing one recording.
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// No API key configured and none in the environment.
    #[error("Please set OpenAI API Key in Settings.")]
    MissingCredential,

    /// Network failure or non-2xx status.  Carries the response body when
    /// the server sent one.
    #[error("{0}")]
    Transport(String),

    /// The service answered without any text.
    #[error("transcription returned no text")]
    EmptyTranscript,
}

impl From<reqwest::Error> for TranscribeError {
    fn from(e: reqwest::Error) -> Self {
        TranscribeError::Transport(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Transcriber trait
// ---------------------------------------------------------------------------

/// Converts one captured utterance into text.
///
/// Exactly one attempt per call; implementations never retry.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &CapturedAudio) -> Result<String, TranscribeError>;
}
