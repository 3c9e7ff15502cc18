//! Recording session state machine.

use std::time::{Duration, Instant};

use crate::audio::{AudioRecorder, CapturedAudio, RecorderError};

use super::state::SessionState;

/// Result of [`RecordingSession::stop`].
#[derive(Debug)]
pub enum StopOutcome {
    /// The session was not recording.
    Ignored,
    /// Shorter than the minimum; discarded and back to Idle.
    TooShort(Duration),
    /// Long enough; the session is now Processing.
    Ready(CapturedAudio),
}

/// Owns the recorder and enforces the Idle → Recording → Processing → Done
/// → Idle cycle.
pub struct RecordingSession {
    recorder: Box<dyn AudioRecorder>,
    state: SessionState,
    started_at: Option<Instant>,
    min_duration: Duration,
}

impl RecordingSession {
    pub fn new(recorder: Box<dyn AudioRecorder>, min_duration: Duration) -> Self {
        Self {
            recorder,
            state: SessionState::Idle,
            started_at: None,
            min_duration,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Begin capturing.  `Ok(false)` when not Idle; nothing changes then.
    ///
    /// On a recorder error the session stays Idle.
    pub fn start(&mut self) -> Result<bool, RecorderError> {
        if self.state != SessionState::Idle {
            return Ok(false);
        }
        self.recorder.start()?;
        self.state = SessionState::Recording;
        self.started_at = Some(Instant::now());
        Ok(true)
    }

    /// Stop capturing and decide whether the utterance is processed.
    ///
    /// On a recorder error the session returns to Idle.
    pub fn stop(&mut self) -> Result<StopOutcome, RecorderError> {
        if self.state != SessionState::Recording {
            return Ok(StopOutcome::Ignored);
        }
        let elapsed = self
            .started_at
            .take()
            .map(|t| t.elapsed())
            .unwrap_or_default();

        let audio = match self.recorder.stop() {
            Ok(audio) => audio,
            Err(e) => {
                self.state = SessionState::Idle;
                return Err(e);
            }
        };

        if elapsed < self.min_duration {
            self.state = SessionState::Done;
            self.reset();
            return Ok(StopOutcome::TooShort(elapsed));
        }

        self.state = SessionState::Processing;
        Ok(StopOutcome::Ready(audio))
    }

    /// Processing → Done.
    pub fn finish(&mut self) {
        if self.state == SessionState::Processing {
            self.state = SessionState::Done;
        }
    }

    /// Done → Idle.
    pub fn reset(&mut self) {
        if self.state == SessionState::Done {
            self.state = SessionState::Idle;
        }
    }
}
