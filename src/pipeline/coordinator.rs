//! The coordinator loop: the only writer of the session and the chat log.
//!
//! ```text
//! HotkeyEvent (mpsc) ──▶ PipelineCoordinator::run ◀── RunUpdate (mpsc)
//!                               │                          ▲
//!                               ├─ Press   → session.start │
//!                               ├─ Release → session.stop ─┴─ tokio::spawn(execute_run)
//!                               └─ PasteLast (Idle only) → type last transcript
//! ```

use std::sync::PoisonError;

use tokio::sync::mpsc;

use crate::hotkey::HotkeyEvent;

use super::run::{execute_run, paste_text, PipelineError, PipelineServices, RunOutcome, RunUpdate};
use super::session::{RecordingSession, StopOutcome};
use super::state::{AppState, ChatMessage, Notice, SessionState, SharedState};

/// Drives [`RecordingSession`] from hotkey events and applies run results.
pub struct PipelineCoordinator {
    state: SharedState,
    session: RecordingSession,
    services: PipelineServices,
}

impl PipelineCoordinator {
    pub fn new(state: SharedState, session: RecordingSession, services: PipelineServices) -> Self {
        Self {
            state,
            session,
            services,
        }
    }

    /// Run until `events` closes and any in-flight run has finished.
    pub async fn run(mut self, mut events: mpsc::Receiver<HotkeyEvent>) {
        let (run_tx, mut run_rx) = mpsc::channel::<RunUpdate>(32);
        let mut events_open = true;

        loop {
            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event, &run_tx).await,
                    None => {
                        log::info!("pipeline: event channel closed");
                        events_open = false;
                    }
                },
                Some(update) = run_rx.recv() => self.apply_update(update),
            }

            if !events_open && self.session.state() != SessionState::Processing {
                break;
            }
        }

        log::info!("pipeline: coordinator stopped");
    }

    async fn handle_event(&mut self, event: HotkeyEvent, run_tx: &mpsc::Sender<RunUpdate>) {
        match event {
            HotkeyEvent::Press => self.handle_press(),
            HotkeyEvent::Release => self.handle_release(run_tx),
            HotkeyEvent::PasteLast => self.handle_paste_last().await,
        }
    }

    fn handle_press(&mut self) {
        match self.session.start() {
            Ok(true) => {
                log::debug!("pipeline: Press → Recording");
                self.sync_session();
            }
            Ok(false) => log::debug!("pipeline: Press ignored while {:?}", self.session.state()),
            Err(e) => {
                let error = PipelineError::from(e);
                log::warn!("pipeline: cannot start recording: {error}");
                self.push(ChatMessage::system(error.to_string()));
            }
        }
    }

    fn handle_release(&mut self, run_tx: &mpsc::Sender<RunUpdate>) {
        match self.session.stop() {
            Ok(StopOutcome::Ignored) => {}
            Ok(StopOutcome::TooShort(elapsed)) => {
                log::info!("pipeline: recording too short ({:.2}s)", elapsed.as_secs_f32());
                self.with_state(|st| {
                    st.set_notice(Notice::RecordingTooShort {
                        duration_secs: elapsed.as_secs_f32(),
                    })
                });
                self.sync_session();
            }
            Ok(StopOutcome::Ready(audio)) => {
                log::debug!("pipeline: Release → Processing");
                self.sync_session();
                tokio::spawn(execute_run(self.services.clone(), audio, run_tx.clone()));
            }
            Err(e) => {
                self.push(ChatMessage::system(PipelineError::from(e).to_string()));
                self.sync_session();
            }
        }
    }

    async fn handle_paste_last(&mut self) {
        if self.session.state() != SessionState::Idle {
            log::debug!("pipeline: PasteLast ignored while {:?}", self.session.state());
            return;
        }
        let Some(text) = self.with_state(|st| st.last_transcript().map(str::to_string)) else {
            log::info!("pipeline: nothing to paste yet");
            return;
        };

        match paste_text(&self.services.executor, &text).await {
            RunOutcome::ToolFailed { tool_name, reason } => {
                self.push(ChatMessage::system(format!("Tool '{tool_name}' failed: {reason}")));
            }
            outcome => {
                if let Some(notice) = outcome.notice() {
                    self.with_state(|st| st.set_notice(notice));
                }
            }
        }
    }

    fn apply_update(&mut self, update: RunUpdate) {
        match update {
            RunUpdate::Message(message) => self.push(message),
            RunUpdate::Finished(outcome) => {
                log::debug!("pipeline: run finished: {outcome:?}");
                if let Some(notice) = outcome.notice() {
                    self.with_state(|st| st.set_notice(notice));
                }
                self.session.finish();
                self.sync_session();
                self.session.reset();
                self.sync_session();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Shared-state helpers
    // -----------------------------------------------------------------------

    fn with_state<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut st)
    }

    fn push(&self, message: ChatMessage) {
        self.with_state(|st| st.push_message(message));
    }

    fn sync_session(&self) {
        let session = self.session.state();
        self.with_state(|st| st.session = session);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionError, PlayerCommand, SystemActions, ToolExecutor};
    use crate::audio::{AudioRecorder, CapturedAudio, RecorderError};
    use crate::config::{ActionsConfig, InjectConfig};
    use crate::context::{RoutingContext, StaticContext};
    use crate::focus::{FixedFocus, FocusState};
    use crate::inject::{InjectError, MemoryClipboard, PasteKeystroke, TextDelivery};
    use crate::pipeline::state::{new_shared_state, MessageRole};
    use crate::router::{CommandRouter, RouteError};
    use crate::tool::ToolCall;
    use crate::transcribe::{TranscribeError, Transcriber};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::Notify;

    // ---- doubles ----------------------------------------------------------

    struct FakeRecorder {
        starts: Arc<AtomicUsize>,
        fail: bool,
    }

    impl AudioRecorder for FakeRecorder {
        fn start(&mut self) -> Result<(), RecorderError> {
            if self.fail {
                return Err(RecorderError::Unavailable);
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn stop(&mut self) -> Result<CapturedAudio, RecorderError> {
            Ok(CapturedAudio::wav(vec![0; 32], Duration::from_secs(1)))
        }
    }

    /// Returns a fixed transcript; optionally waits for `gate` first.
    struct FakeTranscriber {
        result: Result<String, fn() -> TranscribeError>,
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _audio: &CapturedAudio) -> Result<String, TranscribeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.result.clone().map_err(|make| make())
        }
    }

    struct FakeRouter {
        reply: Option<ToolCall>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandRouter for FakeRouter {
        async fn route(
            &self,
            _transcript: &str,
            _context: &RoutingContext,
        ) -> Result<Option<ToolCall>, RouteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    #[derive(Default)]
    struct FakeSystem {
        activated: Mutex<Vec<String>>,
        panic_on_open: bool,
    }

    impl SystemActions for FakeSystem {
        fn open_url(&self, url: &str) -> Result<(), ActionError> {
            if self.panic_on_open {
                panic!("cannot open {url}");
            }
            Ok(())
        }
        fn launch_bundle(&self, _: &str) -> Result<bool, ActionError> {
            Ok(true)
        }
        fn launch_by_name(&self, _: &str) -> Result<(), ActionError> {
            Ok(())
        }
        fn running_apps(&self) -> Result<Vec<String>, ActionError> {
            Ok(vec!["Google Chrome".into()])
        }
        fn activate(&self, app: &str) -> Result<(), ActionError> {
            self.activated.lock().unwrap().push(app.to_string());
            Ok(())
        }
        fn control_player(&self, _: PlayerCommand) -> Result<(), ActionError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingPaste(AtomicUsize);

    impl PasteKeystroke for CountingPaste {
        fn paste(&self) -> Result<(), InjectError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    // ---- harness ----------------------------------------------------------

    struct Setup {
        transcript: Result<String, fn() -> TranscribeError>,
        reply: Option<ToolCall>,
        min: Duration,
        focus: FocusState,
        recorder_fails: bool,
        panic_on_open: bool,
        gate: Option<Arc<Notify>>,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                transcript: Ok("hello world".into()),
                reply: Some(ToolCall::text("type", "Hello world.")),
                min: Duration::ZERO,
                focus: FocusState::FocusedTextInput,
                recorder_fails: false,
                panic_on_open: false,
                gate: None,
            }
        }
    }

    struct Harness {
        state: SharedState,
        tx: Option<mpsc::Sender<HotkeyEvent>>,
        handle: Option<tokio::task::JoinHandle<()>>,
        starts: Arc<AtomicUsize>,
        transcriber: Arc<FakeTranscriber>,
        router: Arc<FakeRouter>,
        system: Arc<FakeSystem>,
        paste: Arc<CountingPaste>,
        clipboard: Arc<MemoryClipboard>,
    }

    impl Harness {
        async fn send(&self, events: &[HotkeyEvent]) {
            let tx = self.tx.as_ref().unwrap();
            for ev in events {
                tx.send(*ev).await.unwrap();
            }
        }

        /// Close the event channel and wait for the coordinator to drain.
        async fn shutdown(mut self) -> Self {
            self.tx.take();
            if let Some(handle) = self.handle.take() {
                handle.await.unwrap();
            }
            self
        }

        fn roles(&self) -> Vec<MessageRole> {
            self.state.lock().unwrap().messages().iter().map(|m| m.role).collect()
        }

        fn contents(&self) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .messages()
                .iter()
                .map(|m| m.content.clone())
                .collect()
        }

        fn session(&self) -> SessionState {
            self.state.lock().unwrap().session
        }

        fn notice(&self) -> Option<Notice> {
            self.state.lock().unwrap().notice()
        }
    }

    fn harness(setup: Setup) -> Harness {
        let starts = Arc::new(AtomicUsize::new(0));
        let recorder = FakeRecorder {
            starts: Arc::clone(&starts),
            fail: setup.recorder_fails,
        };
        let transcriber = Arc::new(FakeTranscriber {
            result: setup.transcript,
            calls: AtomicUsize::new(0),
            gate: setup.gate,
        });
        let router = Arc::new(FakeRouter {
            reply: setup.reply,
            calls: AtomicUsize::new(0),
        });
        let system = Arc::new(FakeSystem {
            panic_on_open: setup.panic_on_open,
            ..Default::default()
        });
        let paste = Arc::new(CountingPaste::default());
        let clipboard = Arc::new(MemoryClipboard::default());

        let delivery = TextDelivery::new(
            clipboard.clone(),
            paste.clone(),
            &InjectConfig {
                paste_settle_ms: 0,
                restore_delay_ms: 1,
            },
        );
        let executor = ToolExecutor::new(
            system.clone(),
            delivery,
            Arc::new(FixedFocus(setup.focus)),
            &ActionsConfig::default(),
        );
        let services = PipelineServices {
            transcriber: transcriber.clone(),
            router: router.clone(),
            context: Arc::new(StaticContext::default()),
            executor,
            recordings_dir: None,
        };

        let state = new_shared_state();
        let session = RecordingSession::new(Box::new(recorder), setup.min);
        let coordinator = PipelineCoordinator::new(state.clone(), session, services);
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(coordinator.run(rx));

        Harness {
            state,
            tx: Some(tx),
            handle: Some(handle),
            starts,
            transcriber,
            router,
            system,
            paste,
            clipboard,
        }
    }

    use HotkeyEvent::{PasteLast, Press, Release};

    // ---- tests ------------------------------------------------------------

    #[tokio::test]
    async fn dictation_is_transcribed_routed_and_pasted() {
        let h = harness(Setup::default());
        h.send(&[Press, Release]).await;
        let h = h.shutdown().await;

        assert_eq!(h.roles(), vec![MessageRole::User, MessageRole::Tool]);
        assert_eq!(h.contents(), vec!["hello world", "Hello world."]);
        assert_eq!(h.paste.0.load(Ordering::SeqCst), 1);
        assert_eq!(h.session(), SessionState::Idle);
        assert_eq!(h.notice(), None);
    }

    #[tokio::test]
    async fn short_recording_makes_no_calls() {
        let h = harness(Setup {
            min: Duration::from_secs(60),
            ..Default::default()
        });
        h.send(&[Press, Release]).await;
        let h = h.shutdown().await;

        assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.router.calls.load(Ordering::SeqCst), 0);
        assert!(h.roles().is_empty());
        assert_eq!(h.session(), SessionState::Idle);
        assert!(matches!(h.notice(), Some(Notice::RecordingTooShort { .. })));
    }

    #[tokio::test]
    async fn unusable_reply_is_reported_once() {
        let h = harness(Setup {
            reply: None,
            ..Default::default()
        });
        h.send(&[Press, Release]).await;
        let h = h.shutdown().await;

        assert_eq!(h.roles(), vec![MessageRole::User, MessageRole::System]);
        assert_eq!(h.contents()[1], "Could not understand the command.");
        assert_eq!(h.session(), SessionState::Idle);
    }

    #[tokio::test]
    async fn handler_error_is_one_system_entry_and_does_not_block() {
        let h = harness(Setup {
            reply: Some(ToolCall::text("switch_to", "zzz")),
            ..Default::default()
        });
        h.send(&[Press, Release]).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.send(&[Press, Release]).await;
        let h = h.shutdown().await;

        let system: Vec<String> = h
            .state
            .lock()
            .unwrap()
            .messages()
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone())
            .collect();
        assert_eq!(system.len(), 2);
        assert_eq!(system[0], "Tool 'switch_to' failed: No running app found: zzz");
        assert_eq!(h.starts.load(Ordering::SeqCst), 2);
        assert_eq!(h.session(), SessionState::Idle);
    }

    #[tokio::test]
    async fn panicking_handler_is_one_system_entry_then_idle() {
        let h = harness(Setup {
            reply: Some(ToolCall::text("open_app", "github.com")),
            panic_on_open: true,
            ..Default::default()
        });
        h.send(&[Press, Release]).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.send(&[Press, Release]).await;
        let h = h.shutdown().await;

        let messages = h.state.lock().unwrap().messages().to_vec();
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();
        // One entry per utterance; the second run was not blocked.
        assert_eq!(system.len(), 2);
        assert!(system[0].starts_with("Tool 'open_app' failed: internal error"));
        assert_eq!(h.starts.load(Ordering::SeqCst), 2);
        assert_eq!(h.session(), SessionState::Idle);
    }

    #[tokio::test]
    async fn switch_to_activates_matching_app() {
        let h = harness(Setup {
            reply: Some(ToolCall::text("switch_to", "chrom")),
            ..Default::default()
        });
        h.send(&[Press, Release]).await;
        let h = h.shutdown().await;
        assert_eq!(*h.system.activated.lock().unwrap(), vec!["Google Chrome"]);
    }

    #[tokio::test]
    async fn press_while_processing_is_ignored() {
        let gate = Arc::new(Notify::new());
        let h = harness(Setup {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        h.send(&[Press, Release]).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.session(), SessionState::Processing);

        h.send(&[Press, Release]).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.session(), SessionState::Processing);
        assert_eq!(h.starts.load(Ordering::SeqCst), 1);

        gate.notify_one();
        let h = h.shutdown().await;
        assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.session(), SessionState::Idle);
    }

    #[tokio::test]
    async fn missing_key_is_reported_without_routing() {
        let h = harness(Setup {
            transcript: Err(|| TranscribeError::MissingCredential),
            ..Default::default()
        });
        h.send(&[Press, Release]).await;
        let h = h.shutdown().await;

        assert_eq!(h.contents(), vec!["Please set OpenAI API Key in Settings."]);
        assert_eq!(h.router.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.session(), SessionState::Idle);
    }

    #[tokio::test]
    async fn transport_error_is_prefixed() {
        let h = harness(Setup {
            transcript: Err(|| TranscribeError::Transport("quota exceeded".into())),
            ..Default::default()
        });
        h.send(&[Press, Release]).await;
        let h = h.shutdown().await;
        assert_eq!(h.contents(), vec!["Error: quota exceeded"]);
    }

    #[tokio::test]
    async fn microphone_failure_keeps_session_idle() {
        let h = harness(Setup {
            recorder_fails: true,
            ..Default::default()
        });
        h.send(&[Press, Release]).await;
        let h = h.shutdown().await;

        assert_eq!(h.roles(), vec![MessageRole::System]);
        assert!(h.contents()[0].starts_with("Microphone unavailable"));
        assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.session(), SessionState::Idle);
    }

    #[tokio::test]
    async fn unfocused_dictation_is_copied_with_notice() {
        let h = harness(Setup {
            focus: FocusState::NoFocusedTextInput,
            ..Default::default()
        });
        h.send(&[Press, Release]).await;
        let h = h.shutdown().await;

        assert_eq!(h.paste.0.load(Ordering::SeqCst), 0);
        assert_eq!(h.notice(), Some(Notice::CopiedToClipboard));
        assert_eq!(
            crate::inject::Clipboard::text(h.clipboard.as_ref()).unwrap().as_deref(),
            Some("Hello world.")
        );
    }

    #[tokio::test]
    async fn paste_last_types_previous_transcript() {
        let h = harness(Setup::default());
        h.send(&[PasteLast]).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(h.paste.0.load(Ordering::SeqCst), 0);

        h.send(&[Press, Release]).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.send(&[PasteLast]).await;
        let h = h.shutdown().await;

        assert_eq!(h.paste.0.load(Ordering::SeqCst), 2);
        // Paste-last adds nothing to the log on success.
        assert_eq!(h.roles().len(), 2);
    }
}
