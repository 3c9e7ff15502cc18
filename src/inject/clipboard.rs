//! Clipboard access backed by the `arboard` crate.
//!
//! [`SystemClipboard`] creates a short-lived [`arboard::Clipboard`] handle for
//! each call rather than sharing one, because `arboard::Clipboard` is not
//! `Send` on all platforms and the handle is cheap to create.

use arboard::Clipboard as Arboard;

use super::{Clipboard, InjectError};

/// The OS clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    /// Returns `Ok(None)` when the clipboard is empty or holds non-text data.
    fn text(&self) -> Result<Option<String>, InjectError> {
        let mut clipboard = open_clipboard()?;
        Ok(clipboard.get_text().ok())
    }

    fn set_text(&self, text: &str) -> Result<(), InjectError> {
        let mut clipboard = open_clipboard()?;
        clipboard
            .set_text(text)
            .map_err(|e| InjectError::ClipboardSet(e.to_string()))
    }
}

fn open_clipboard() -> Result<Arboard, InjectError> {
    Arboard::new().map_err(|e| InjectError::ClipboardAccess(e.to_string()))
}
