//! Paste-chord synthesis backed by the `enigo` crate.
//!
//! | Platform | Shortcut |
//! |----------|----------|
//! | macOS    | ⌘V (Meta + V) |
//! | Windows  | Ctrl+V |
//! | Linux    | Ctrl+V |

use enigo::{Direction, Enigo, Key, Keyboard, Settings};

use super::{InjectError, PasteKeystroke};

#[cfg(target_os = "macos")]
const PASTE_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
const PASTE_MODIFIER: Key = Key::Control;

/// Sends the platform paste shortcut to the focused window.
///
/// A new [`Enigo`] instance is created for each call because `Enigo` is not
/// `Send` and the handle is cheap to construct.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnigoPaste;

impl PasteKeystroke for EnigoPaste {
    fn paste(&self) -> Result<(), InjectError> {
        let mut enigo = Enigo::new(&Settings::default()).map_err(key_error)?;

        enigo
            .key(PASTE_MODIFIER, Direction::Press)
            .map_err(key_error)?;
        let clicked = enigo.key(Key::Unicode('v'), Direction::Click);
        // Always release the modifier, even if the click failed.
        let released = enigo.key(PASTE_MODIFIER, Direction::Release);

        clicked.map_err(key_error)?;
        released.map_err(key_error)
    }
}

fn key_error(e: impl std::fmt::Display) -> InjectError {
    InjectError::KeySimulation(e.to_string())
}
