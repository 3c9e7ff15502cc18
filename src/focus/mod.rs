//! Focused-text-input probe.
//!
//! Before pasting dictated text we ask the OS whether the foreground
//! application has an editable control focused.  The answer is a heuristic,
//! so it is tri-state: when introspection fails the caller gets
//! [`FocusState::Unknown`] and is expected to paste anyway.
//!
//! | Platform | Implementation |
//! |----------|----------------|
//! | macOS    | [`AccessibilityInspector`] (AX API) |
//! | others   | [`UnknownFocus`]: always `Unknown` |

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "macos")]
pub use macos::AccessibilityInspector;

use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// FocusState
// ---------------------------------------------------------------------------

/// Result of probing the currently focused UI element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    /// An editable text control has keyboard focus.
    FocusedTextInput,
    /// Something is focused, and it is not editable.
    NoFocusedTextInput,
    /// The probe could not tell.
    Unknown,
}

impl FocusState {
    /// Whether a synthesized paste should be attempted.
    ///
    /// `Unknown` is treated like a focused text input so that ordinary
    /// dictation is never blocked by an introspection failure.
    ///
    /// ```
    /// use voice_command::focus::FocusState;
    ///
    /// assert!(FocusState::FocusedTextInput.should_paste());
    /// assert!(FocusState::Unknown.should_paste());
    /// assert!(!FocusState::NoFocusedTextInput.should_paste());
    /// ```
    pub fn should_paste(self) -> bool {
        !matches!(self, FocusState::NoFocusedTextInput)
    }
}

impl fmt::Display for FocusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FocusState::FocusedTextInput => "focused text input",
            FocusState::NoFocusedTextInput => "no focused text input",
            FocusState::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Role classification
// ---------------------------------------------------------------------------

/// Accessibility roles that always accept typed text.
pub const TEXT_INPUT_ROLES: [&str; 5] = [
    "AXTextField",
    "AXTextArea",
    "AXComboBox",
    "AXSearchField",
    "AXWebArea",
];

/// Classify a focused element from what could be read about it.
///
/// * `role`: `None` when the role attribute could not be read.
/// * `value_settable`: lazily evaluated; only consulted when the role is
///   not a known text role.
pub fn classify_element(role: Option<&str>, value_settable: impl FnOnce() -> bool) -> FocusState {
    let Some(role) = role else {
        return FocusState::Unknown;
    };

    if TEXT_INPUT_ROLES.contains(&role) || value_settable() {
        FocusState::FocusedTextInput
    } else {
        FocusState::NoFocusedTextInput
    }
}

// ---------------------------------------------------------------------------
// FocusInspector
// ---------------------------------------------------------------------------

/// Capability: report the current [`FocusState`].
///
/// Implementations must have no side effects and must not cache; every call
/// reflects the UI at that instant.
pub trait FocusInspector: Send + Sync {
    fn inspect(&self) -> FocusState;
}

/// Stub for platforms without an accessibility probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnknownFocus;

impl FocusInspector for UnknownFocus {
    fn inspect(&self) -> FocusState {
        FocusState::Unknown
    }
}

/// Always reports the same answer.  Used by tests and as a manual override.
#[derive(Debug, Clone, Copy)]
pub struct FixedFocus(pub FocusState);

impl FocusInspector for FixedFocus {
    fn inspect(&self) -> FocusState {
        self.0
    }
}

/// The best inspector available on this platform.
pub fn platform_inspector() -> Arc<dyn FocusInspector> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(AccessibilityInspector)
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(UnknownFocus)
    }
}
