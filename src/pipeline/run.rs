//! One utterance: transcribe → route → execute.
//!
//! [`execute_run`] is spawned once per accepted recording.  It never touches
//! the session or the chat log directly; it reports through [`RunUpdate`]s
//! and the coordinator applies them.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::actions::{ActionOutcome, ToolExecutor};
use crate::audio::{save_recording, CapturedAudio, RecorderError};
use crate::context::ContextSource;
use crate::inject::Delivery;
use crate::router::{CommandRouter, RouteError};
use crate::tool::{ToolArguments, ToolCall};
use crate::transcribe::{TranscribeError, Transcriber};

use super::state::{ChatMessage, Notice};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Failures that end a run before a tool is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Microphone unavailable or access refused.
    PermissionDenied(String),
    /// An API key is not configured.  The message says which.
    MissingCredential(String),
    /// Network failure, non-2xx status, or an empty transcript.
    Transport(String),
    /// A blocking task panicked or was cancelled.
    Internal(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::PermissionDenied(msg) | PipelineError::MissingCredential(msg) => {
                write!(f, "{msg}")
            }
            PipelineError::Transport(msg) | PipelineError::Internal(msg) => {
                write!(f, "Error: {msg}")
            }
        }
    }
}

impl From<TranscribeError> for PipelineError {
    fn from(e: TranscribeError) -> Self {
        match e {
            TranscribeError::MissingCredential => PipelineError::MissingCredential(e.to_string()),
            TranscribeError::Transport(_) | TranscribeError::EmptyTranscript => {
                PipelineError::Transport(e.to_string())
            }
        }
    }
}

impl From<RouteError> for PipelineError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::MissingCredential => PipelineError::MissingCredential(e.to_string()),
            RouteError::Transport(_) => PipelineError::Transport(e.to_string()),
        }
    }
}

impl From<RecorderError> for PipelineError {
    fn from(e: RecorderError) -> Self {
        match e {
            RecorderError::Unavailable => PipelineError::PermissionDenied(e.to_string()),
            RecorderError::NotRecording | RecorderError::Encode(_) => {
                PipelineError::Internal(e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Run results
// ---------------------------------------------------------------------------

/// How a run ended.  Exactly one per run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Executed {
        call: ToolCall,
        outcome: ActionOutcome,
    },
    /// The router produced nothing usable.
    NoToolCall,
    ToolFailed {
        tool_name: String,
        reason: String,
    },
    Failed(PipelineError),
}

impl RunOutcome {
    /// Notice to show for this outcome, if any.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            RunOutcome::Executed {
                outcome: ActionOutcome::Typed(Delivery::CopiedToClipboard),
                ..
            } => Some(Notice::CopiedToClipboard),
            _ => None,
        }
    }
}

/// Progress reported from a run to the coordinator.
#[derive(Debug, Clone)]
pub enum RunUpdate {
    Message(ChatMessage),
    Finished(RunOutcome),
}

// ---------------------------------------------------------------------------
// PipelineServices
// ---------------------------------------------------------------------------

/// Collaborators a run needs.  Cheap to clone.
#[derive(Clone)]
pub struct PipelineServices {
    pub transcriber: Arc<dyn Transcriber>,
    pub router: Arc<dyn CommandRouter>,
    pub context: Arc<dyn ContextSource>,
    pub executor: ToolExecutor,
    /// Where accepted recordings are kept; `None` disables keeping them.
    pub recordings_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// execute_run
// ---------------------------------------------------------------------------

struct Reporter(mpsc::Sender<RunUpdate>);

impl Reporter {
    async fn message(&self, message: ChatMessage) {
        if self.0.send(RunUpdate::Message(message)).await.is_err() {
            log::warn!("pipeline: coordinator gone, dropping message");
        }
    }

    async fn finish(&self, outcome: RunOutcome) {
        if self.0.send(RunUpdate::Finished(outcome)).await.is_err() {
            log::warn!("pipeline: coordinator gone, dropping outcome");
        }
    }

    /// Report a failure as one system entry and end the run.
    async fn fail(&self, error: PipelineError) {
        log::warn!("pipeline: run failed: {error}");
        self.message(ChatMessage::system(error.to_string())).await;
        self.finish(RunOutcome::Failed(error)).await;
    }
}

/// Process one accepted recording, reporting on `updates`.
pub async fn execute_run(
    services: PipelineServices,
    audio: CapturedAudio,
    updates: mpsc::Sender<RunUpdate>,
) {
    let report = Reporter(updates);

    if let Some(dir) = services.recordings_dir.clone() {
        keep_recording(dir, audio.clone()).await;
    }

    // ── 1. Transcribe ──────────────────────────────────────────────────────
    let transcript = match services.transcriber.transcribe(&audio).await {
        Ok(text) => text,
        Err(e) => return report.fail(e.into()).await,
    };
    report.message(ChatMessage::user(transcript.clone())).await;

    // ── 2. Route ───────────────────────────────────────────────────────────
    let source = Arc::clone(&services.context);
    let context = match tokio::task::spawn_blocking(move || source.routing_context()).await {
        Ok(context) => context,
        Err(e) => return report.fail(PipelineError::Internal(e.to_string())).await,
    };

    let call = match services.router.route(&transcript, &context).await {
        Ok(Some(call)) => call,
        Ok(None) => {
            report
                .message(ChatMessage::system("Could not understand the command."))
                .await;
            return report.finish(RunOutcome::NoToolCall).await;
        }
        Err(e) => return report.fail(e.into()).await,
    };

    // ── 3. Execute ─────────────────────────────────────────────────────────
    report.message(ChatMessage::tool_call(&call)).await;
    let outcome = dispatch(&services.executor, call).await;
    if let RunOutcome::ToolFailed { tool_name, reason } = &outcome {
        report
            .message(ChatMessage::system(format!(
                "Tool '{tool_name}' failed: {reason}"
            )))
            .await;
    }
    report.finish(outcome).await;
}

/// The single catch boundary around tool execution.  Handler errors and
/// panics both become [`RunOutcome::ToolFailed`].
pub async fn dispatch(executor: &ToolExecutor, call: ToolCall) -> RunOutcome {
    let executor = executor.clone();
    let tool_name = call.tool_name.clone();
    let task_call = call.clone();

    match tokio::task::spawn_blocking(move || executor.dispatch(&task_call)).await {
        Ok(Ok(outcome)) => {
            log::info!("pipeline: {tool_name} → {outcome:?}");
            RunOutcome::Executed { call, outcome }
        }
        Ok(Err(e)) => RunOutcome::ToolFailed {
            tool_name,
            reason: e.to_string(),
        },
        Err(e) => RunOutcome::ToolFailed {
            tool_name,
            reason: format!("internal error: {e}"),
        },
    }
}

/// Re-type `text` as if the router had chosen `type`.
pub async fn paste_text(executor: &ToolExecutor, text: &str) -> RunOutcome {
    dispatch(
        executor,
        ToolCall::new("type", ToolArguments::Text(text.to_string())),
    )
    .await
}

async fn keep_recording(dir: PathBuf, audio: CapturedAudio) {
    match tokio::task::spawn_blocking(move || save_recording(&dir, &audio)).await {
        Ok(Ok(path)) => log::info!("pipeline: kept recording at {}", path.display()),
        Ok(Err(e)) => log::warn!("pipeline: cannot keep recording: {e}"),
        Err(e) => log::warn!("pipeline: cannot keep recording: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionError, PlayerCommand, SystemActions};
    use crate::config::{ActionsConfig, InjectConfig};
    use crate::focus::{FixedFocus, FocusState};
    use crate::inject::{InjectError, MemoryClipboard, PasteKeystroke, TextDelivery};

    /// Panics on every URL it is asked to open.
    struct PanickingSystem;

    impl SystemActions for PanickingSystem {
        fn open_url(&self, url: &str) -> Result<(), ActionError> {
            panic!("handler blew up on {url}");
        }
        fn launch_bundle(&self, _: &str) -> Result<bool, ActionError> {
            Ok(true)
        }
        fn launch_by_name(&self, _: &str) -> Result<(), ActionError> {
            Ok(())
        }
        fn running_apps(&self) -> Result<Vec<String>, ActionError> {
            Ok(Vec::new())
        }
        fn activate(&self, _: &str) -> Result<(), ActionError> {
            Ok(())
        }
        fn control_player(&self, _: PlayerCommand) -> Result<(), ActionError> {
            Ok(())
        }
    }

    struct NoPaste;

    impl PasteKeystroke for NoPaste {
        fn paste(&self) -> Result<(), InjectError> {
            Ok(())
        }
    }

    fn executor(system: Arc<dyn SystemActions>) -> ToolExecutor {
        let delivery = TextDelivery::new(
            Arc::new(MemoryClipboard::default()),
            Arc::new(NoPaste),
            &InjectConfig {
                paste_settle_ms: 0,
                restore_delay_ms: 1,
            },
        );
        ToolExecutor::new(
            system,
            delivery,
            Arc::new(FixedFocus(FocusState::FocusedTextInput)),
            &ActionsConfig::default(),
        )
    }

    #[tokio::test]
    async fn panicking_handler_becomes_tool_failure() {
        let executor = executor(Arc::new(PanickingSystem));

        let outcome = dispatch(&executor, ToolCall::text("open_app", "github.com")).await;

        match outcome {
            RunOutcome::ToolFailed { tool_name, reason } => {
                assert_eq!(tool_name, "open_app");
                assert!(reason.starts_with("internal error"), "{reason}");
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn handler_error_becomes_tool_failure() {
        let executor = executor(Arc::new(PanickingSystem));

        let outcome = dispatch(&executor, ToolCall::text("spotify", "rewind")).await;

        assert_eq!(
            outcome,
            RunOutcome::ToolFailed {
                tool_name: "spotify".into(),
                reason: "Unknown Spotify action: rewind. Use play, pause, or next.".into(),
            }
        );
    }

    #[test]
    fn credential_errors_show_their_message_only() {
        let e: PipelineError = TranscribeError::MissingCredential.into();
        assert_eq!(e.to_string(), "Please set OpenAI API Key in Settings.");

        let e: PipelineError = RouteError::MissingCredential.into();
        assert_eq!(e.to_string(), "Please set Hugging Face Token in Settings.");
    }

    #[test]
    fn transport_errors_are_prefixed() {
        let e: PipelineError = TranscribeError::Transport("HTTP 500".into()).into();
        assert_eq!(e, PipelineError::Transport("HTTP 500".into()));
        assert_eq!(e.to_string(), "Error: HTTP 500");

        let e: PipelineError = TranscribeError::EmptyTranscript.into();
        assert!(matches!(e, PipelineError::Transport(_)));
    }

    #[test]
    fn missing_microphone_is_permission_denied() {
        let e: PipelineError = RecorderError::Unavailable.into();
        assert!(matches!(e, PipelineError::PermissionDenied(_)));

        let e: PipelineError = RecorderError::NotRecording.into();
        assert!(matches!(e, PipelineError::Internal(_)));
    }

    #[test]
    fn only_clipboard_delivery_raises_notice() {
        let copied = RunOutcome::Executed {
            call: ToolCall::text("type", "x"),
            outcome: ActionOutcome::Typed(Delivery::CopiedToClipboard),
        };
        assert_eq!(copied.notice(), Some(Notice::CopiedToClipboard));

        let pasted = RunOutcome::Executed {
            call: ToolCall::text("type", "x"),
            outcome: ActionOutcome::Typed(Delivery::Pasted),
        };
        assert_eq!(pasted.notice(), None);
        assert_eq!(RunOutcome::NoToolCall.notice(), None);
    }
}
