//! Pipeline module: recording session, per-utterance runs, and the loop that
//! ties them to hotkey events.
//!
//! # Architecture
//!
//! ```text
//! HotkeyEvent (mpsc)
//!        │
//!        ▼
//! PipelineCoordinator::run()  ← async tokio task, sole writer of AppState
//!        │
//!        ├─ Press     → RecordingSession::start           → Recording
//!        │
//!        ├─ Release   → RecordingSession::stop
//!        │                ├─ too short → notice            → Idle
//!        │                └─ ready     → spawn execute_run → Processing
//!        │                       │
//!        │                       ├─ Transcriber::transcribe
//!        │                       ├─ spawn_blocking(ContextSource::routing_context)
//!        │                       ├─ CommandRouter::route
//!        │                       └─ spawn_blocking(ToolExecutor::dispatch)
//!        │                       ▼
//!        │                  RunUpdate (mpsc) → chat log, then → Done → Idle
//!        │
//!        └─ PasteLast → type the last transcript (Idle only)
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by any front end
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//! use voice_command::audio::{CaptureBuffer, MicRecorder};
//! use voice_command::pipeline::{
//!     new_shared_state, PipelineCoordinator, PipelineServices, RecordingSession,
//! };
//!
//! # fn services() -> PipelineServices { unimplemented!() }
//! #[tokio::main]
//! async fn main() {
//!     let buffer = Arc::new(CaptureBuffer::new(24));
//!     let session = RecordingSession::new(
//!         Box::new(MicRecorder::new(buffer)),
//!         Duration::from_millis(300),
//!     );
//!
//!     let (hotkey_tx, hotkey_rx) = mpsc::channel(16);
//!     let coordinator = PipelineCoordinator::new(new_shared_state(), session, services());
//!     tokio::spawn(coordinator.run(hotkey_rx));
//!
//!     // hotkey_tx is passed to HotkeyListener::start(...)
//!     # drop(hotkey_tx);
//! }
//! ```

pub mod coordinator;
pub mod run;
pub mod session;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use coordinator::PipelineCoordinator;
pub use run::{
    dispatch, execute_run, paste_text, PipelineError, PipelineServices, RunOutcome, RunUpdate,
};
pub use session::{RecordingSession, StopOutcome};
pub use state::{
    new_shared_state, AppState, ChatMessage, MessageRole, Notice, SessionState, SharedState,
    ToolPayload,
};
