//! `WhisperApiClient`: multipart upload to `/v1/audio/transcriptions`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{TranscribeError, Transcriber};
use crate::audio::CapturedAudio;
use crate::config::TranscriptionConfig;

/// Upper bound on how much of an error body ends up in a log entry.
const ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Calls an OpenAI-compatible speech-to-text endpoint.
///
/// The API key is resolved on every call so a key added to the environment
/// or settings after start-up is picked up without a restart.
pub struct WhisperApiClient {
    client: reqwest::Client,
    config: TranscriptionConfig,
}

impl WhisperApiClient {
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn form(&self, audio: &CapturedAudio) -> Result<Form, TranscribeError> {
        let file = Part::bytes(audio.bytes.clone())
            .file_name(audio.file_name.clone())
            .mime_str(&audio.mime_type)?;

        let mut form = Form::new().text("model", self.config.model.clone());
        if let Some(language) = self.config.language_hint() {
            form = form.text("language", language.to_string());
        }
        Ok(form.part("file", file))
    }
}

#[async_trait]
impl Transcriber for WhisperApiClient {
    async fn transcribe(&self, audio: &CapturedAudio) -> Result<String, TranscribeError> {
        let key = self
            .config
            .resolved_api_key()
            .ok_or(TranscribeError::MissingCredential)?;

        log::info!(
            "transcribe: uploading {} bytes ({:.2}s)",
            audio.bytes.len(),
            audio.duration.as_secs_f32()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .multipart(self.form(audio)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Transport(error_message(status, &body)));
        }

        let parsed: TranscriptionResponse = response.json().await?;
        extract_text(parsed)
    }
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("transcription failed with HTTP {status}");
    }
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

fn extract_text(response: TranscriptionResponse) -> Result<String, TranscribeError> {
    match response.text {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(TranscribeError::EmptyTranscript),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn audio() -> CapturedAudio {
        CapturedAudio {
            bytes: vec![0u8; 64],
            mime_type: "audio/wav".into(),
            file_name: "recording.wav".into(),
            duration: Duration::from_millis(900),
        }
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = WhisperApiClient::from_config(&TranscriptionConfig {
            base_url: "http://localhost:9000/".into(),
            ..Default::default()
        });
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1/audio/transcriptions"
        );
    }

    #[test]
    fn form_builds_for_wav() {
        let client = WhisperApiClient::from_config(&TranscriptionConfig {
            languages: vec!["en".into()],
            ..Default::default()
        });
        assert!(client.form(&audio()).is_ok());
    }

    #[test]
    fn error_body_becomes_message() {
        let msg = error_message(reqwest::StatusCode::UNAUTHORIZED, " {\"error\":\"bad key\"} ");
        assert_eq!(msg, "{\"error\":\"bad key\"}");

        let msg = error_message(reqwest::StatusCode::BAD_GATEWAY, "");
        assert!(msg.contains("502"));
    }

    #[test]
    fn blank_or_missing_text_is_empty_transcript() {
        let blank: TranscriptionResponse = serde_json::from_str(r#"{"text":"  "}"#).unwrap();
        assert!(matches!(extract_text(blank), Err(TranscribeError::EmptyTranscript)));

        let missing: TranscriptionResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(extract_text(missing), Err(TranscribeError::EmptyTranscript)));

        let ok: TranscriptionResponse = serde_json::from_str(r#"{"text":" hi "}"#).unwrap();
        assert_eq!(extract_text(ok).unwrap(), "hi");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        // A blank configured key does not fall back to the environment.
        let client = WhisperApiClient::from_config(&TranscriptionConfig {
            base_url: "http://127.0.0.1:9".into(),
            api_key: Some("   ".into()),
            ..Default::default()
        });
        let err = client.transcribe(&audio()).await.unwrap_err();
        assert!(matches!(err, TranscribeError::MissingCredential));
    }
}
