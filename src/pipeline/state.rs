//! Session state, chat log and the state shared with the UI.
//!
//! [`AppState`] is what a UI collaborator renders: the session phase, the
//! append-only chat log and the latest transient [`Notice`].  It is only
//! written by the coordinator; everything else reads it through
//! [`SharedState`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::tool::ToolCall;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Phases of one push-to-talk utterance.
///
/// ```text
/// Idle ──press──▶ Recording ──release──▶ Processing ──▶ Done ──▶ Idle
///                           ──too short──────────────▶ Done ──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Processing,
    Done,
}

impl SessionState {
    /// `true` while a new press must be ignored.
    ///
    /// ```
    /// use voice_command::pipeline::SessionState;
    ///
    /// assert!(!SessionState::Idle.is_busy());
    /// assert!(SessionState::Recording.is_busy());
    /// assert!(SessionState::Processing.is_busy());
    /// ```
    pub fn is_busy(self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Processing)
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
            SessionState::Processing => "Processing",
            SessionState::Done => "Done",
        }
    }
}

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
}

/// Tool name and display arguments attached to a tool-role message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolPayload {
    pub name: String,
    pub arguments: String,
}

/// One entry of the chat log.  Never changed once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolPayload>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            tool: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Tool-role entry for a routed call.  The content is the argument, or
    /// the tool name when there is no argument.
    pub fn tool_call(call: &ToolCall) -> Self {
        let arguments = call.tool_arguments.display().to_string();
        let content = if arguments.is_empty() {
            call.tool_name.clone()
        } else {
            arguments.clone()
        };
        Self {
            tool: Some(ToolPayload {
                name: call.tool_name.clone(),
                arguments,
            }),
            ..Self::new(MessageRole::Tool, content)
        }
    }
}

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// Transient signal for the UI that does not belong in the chat log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    RecordingTooShort { duration_secs: f32 },
    CopiedToClipboard,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Everything the UI needs.
#[derive(Debug, Default)]
pub struct AppState {
    pub session: SessionState,
    messages: Vec<ChatMessage>,
    notice: Option<Notice>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chat log, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append to the chat log.  The only way to change it.
    pub fn push_message(&mut self, message: ChatMessage) {
        log::info!("chat: [{:?}] {}", message.role, message.content);
        self.messages.push(message);
    }

    /// The most recent user transcript.
    pub fn last_transcript(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// The pending notice, if any; the UI takes it once it has shown it.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].  Do not hold the lock across `.await`.
pub type SharedState = Arc<Mutex<AppState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(AppState::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolArguments;

    #[test]
    fn done_and_idle_are_not_busy() {
        assert!(!SessionState::Done.is_busy());
        assert!(!SessionState::Idle.is_busy());
        assert_eq!(SessionState::default(), SessionState::Idle);
        assert_eq!(SessionState::Processing.label(), "Processing");
    }

    #[test]
    fn tool_message_uses_argument_or_name() {
        let msg = ChatMessage::tool_call(&ToolCall::text("open_app", "Notes"));
        assert_eq!(msg.role, MessageRole::Tool);
        assert_eq!(msg.content, "Notes");
        assert_eq!(
            msg.tool,
            Some(ToolPayload {
                name: "open_app".into(),
                arguments: "Notes".into()
            })
        );

        let msg = ChatMessage::tool_call(&ToolCall::new("spotify", ToolArguments::None));
        assert_eq!(msg.content, "spotify");
        assert_eq!(msg.tool.unwrap().arguments, "");
    }

    #[test]
    fn messages_get_distinct_ids() {
        let a = ChatMessage::user("a");
        let b = ChatMessage::user("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn last_transcript_is_latest_user_message() {
        let mut state = AppState::new();
        assert_eq!(state.last_transcript(), None);
        state.push_message(ChatMessage::user("first"));
        state.push_message(ChatMessage::user("second"));
        state.push_message(ChatMessage::system("Could not understand the command."));
        assert_eq!(state.last_transcript(), Some("second"));
        assert_eq!(state.messages().len(), 3);
    }

    #[test]
    fn notice_is_taken_once() {
        let mut state = AppState::new();
        state.set_notice(Notice::CopiedToClipboard);
        assert_eq!(state.take_notice(), Some(Notice::CopiedToClipboard));
        assert_eq!(state.take_notice(), None);
    }

    #[test]
    fn message_serializes_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::system("hi")).unwrap();
        assert_eq!(json["role"], "system");
        assert!(json.get("tool").is_none());
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }
}
