//! Text delivery: clipboard-based injection of dictated text.
//!
//! # Overview
//!
//! Dictated text is delivered through the clipboard rather than as raw key
//! events, which keeps accented and combining characters intact:
//!
//! 1. **Save** the current clipboard text.
//! 2. **Set** the dictated text into the clipboard.
//! 3. **Simulate** ⌘V / Ctrl+V in the focused window.
//! 4. **Restore** the saved text after a short delay (best-effort).
//!
//! When the focus probe says no text input is focused, steps 3–4 are skipped
//! and the text is simply left on the clipboard for the user to paste.
//!
//! The restore is not synchronised with the target application: a second
//! paste landing inside the restore window may read the restored contents.

pub mod clipboard;
pub mod keyboard;

pub use clipboard::SystemClipboard;
pub use keyboard::EnigoPaste;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;

use crate::config::InjectConfig;
use crate::focus::FocusState;

// ---------------------------------------------------------------------------
// InjectError
// ---------------------------------------------------------------------------

/// All errors that can surface during text delivery.
#[derive(Debug, Error)]
pub enum InjectError {
    /// Could not open or read the system clipboard.
    #[error("cannot access clipboard: {0}")]
    ClipboardAccess(String),

    /// Could not write text to the system clipboard.
    #[error("cannot set clipboard text: {0}")]
    ClipboardSet(String),

    /// Could not simulate a key press/release event.
    #[error("cannot simulate key press: {0}")]
    KeySimulation(String),
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Plain-text clipboard.
pub trait Clipboard: Send + Sync {
    /// Current text, or `None` when empty or non-text.
    fn text(&self) -> Result<Option<String>, InjectError>;
    fn set_text(&self, text: &str) -> Result<(), InjectError>;
}

/// Synthesizes the platform paste shortcut.
pub trait PasteKeystroke: Send + Sync {
    fn paste(&self) -> Result<(), InjectError>;
}

/// In-process clipboard for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn with_text(text: &str) -> Self {
        Self {
            contents: Mutex::new(Some(text.to_string())),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn text(&self) -> Result<Option<String>, InjectError> {
        Ok(self
            .contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set_text(&self, text: &str) -> Result<(), InjectError> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// How dictated text reached the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Pasted into the focused window; the old clipboard was restored.
    Pasted,
    /// Left on the clipboard because no text input had focus.
    CopiedToClipboard,
}

// ---------------------------------------------------------------------------
// TextDelivery
// ---------------------------------------------------------------------------

/// Focus-aware clipboard-paste delivery.
///
/// Blocking: sleeps for the configured delays.  Call from
/// `tokio::task::spawn_blocking` inside async code.
#[derive(Clone)]
pub struct TextDelivery {
    clipboard: Arc<dyn Clipboard>,
    keystroke: Arc<dyn PasteKeystroke>,
    /// Wait after setting the clipboard before pasting.
    settle_delay: Duration,
    /// Wait after pasting before restoring the old clipboard.
    restore_delay: Duration,
}

impl TextDelivery {
    pub fn new(
        clipboard: Arc<dyn Clipboard>,
        keystroke: Arc<dyn PasteKeystroke>,
        config: &InjectConfig,
    ) -> Self {
        Self {
            clipboard,
            keystroke,
            settle_delay: Duration::from_millis(config.paste_settle_ms),
            restore_delay: Duration::from_millis(config.restore_delay_ms),
        }
    }

    /// Delivery through the OS clipboard and `enigo`.
    pub fn system(config: &InjectConfig) -> Self {
        Self::new(Arc::new(SystemClipboard), Arc::new(EnigoPaste), config)
    }

    /// Deliver `text` according to `focus`.
    ///
    /// # Errors
    ///
    /// Returns the first [`InjectError`] from reading or setting the clipboard
    /// or from the paste chord.  The previous clipboard text is put back even
    /// when the paste chord fails; restore failures are only logged.
    pub fn deliver(&self, text: &str, focus: FocusState) -> Result<Delivery, InjectError> {
        if !focus.should_paste() {
            log::info!("inject: no focused text input, leaving text on the clipboard");
            self.clipboard.set_text(text)?;
            return Ok(Delivery::CopiedToClipboard);
        }

        let saved = self.clipboard.text()?;
        self.clipboard.set_text(text)?;

        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }
        let pasted = self.keystroke.paste();

        // Restore even when the paste failed.
        if pasted.is_ok() {
            std::thread::sleep(self.restore_delay);
        }
        if let Some(previous) = saved {
            if let Err(e) = self.clipboard.set_text(&previous) {
                log::warn!("inject: clipboard restore failed: {e}");
            }
        }

        pasted.map(|()| Delivery::Pasted)
    }
}
