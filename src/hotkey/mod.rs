//! Global hotkeys backed by `rdev`.
//!
//! A binding is a chord written as `"F9"`, `"Shift+Space"` or
//! `"Ctrl+Alt+K"`: zero or more modifiers followed by one key, joined with
//! `+`, case-insensitive.  [`HotkeyListener`] watches the chords on a
//! dedicated OS thread and forwards [`HotkeyEvent`]s into a tokio channel.
//!
//! ```
//! use voice_command::hotkey::{Hotkey, Modifier};
//!
//! let chord: Hotkey = "shift+space".parse().unwrap();
//! assert_eq!(chord.key, rdev::Key::Space);
//! assert!(chord.requires(Modifier::Shift));
//! ```

pub mod listener;

pub use listener::{ChordTracker, HotkeyListener};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// HotkeyEvent
// ---------------------------------------------------------------------------

/// Events the coordinator receives from the listener thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// Push-to-talk chord went down.
    Press,
    /// Push-to-talk key came up.
    Release,
    /// Paste-last chord went down.
    PasteLast,
}

// ---------------------------------------------------------------------------
// Modifier
// ---------------------------------------------------------------------------

/// Modifier keys, without left/right distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Meta,
}

impl Modifier {
    const ALL: [Modifier; 4] = [Modifier::Shift, Modifier::Control, Modifier::Alt, Modifier::Meta];

    fn bit(self) -> u8 {
        match self {
            Modifier::Shift => 1,
            Modifier::Control => 1 << 1,
            Modifier::Alt => 1 << 2,
            Modifier::Meta => 1 << 3,
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "shift" => Some(Modifier::Shift),
            "ctrl" | "control" => Some(Modifier::Control),
            "alt" | "option" | "opt" => Some(Modifier::Alt),
            "cmd" | "command" | "meta" | "super" | "win" => Some(Modifier::Meta),
            _ => None,
        }
    }

    /// The modifier a physical key belongs to, if it is one.
    pub fn of_key(key: rdev::Key) -> Option<Self> {
        use rdev::Key::*;
        match key {
            ShiftLeft | ShiftRight => Some(Modifier::Shift),
            ControlLeft | ControlRight => Some(Modifier::Control),
            Alt | AltGr => Some(Modifier::Alt),
            MetaLeft | MetaRight => Some(Modifier::Meta),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Modifier::Shift => "Shift",
            Modifier::Control => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Meta => "Cmd",
        })
    }
}

/// A set of held or required modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers(u8);

impl Modifiers {
    pub fn insert(&mut self, m: Modifier) {
        self.0 |= m.bit();
    }

    pub fn remove(&mut self, m: Modifier) {
        self.0 &= !m.bit();
    }

    pub fn contains(self, m: Modifier) -> bool {
        self.0 & m.bit() != 0
    }

    /// Every modifier in `self` is also in `other`.
    pub fn is_subset_of(self, other: Modifiers) -> bool {
        self.0 & !other.0 == 0
    }
}

// ---------------------------------------------------------------------------
// Hotkey
// ---------------------------------------------------------------------------

/// Errors from parsing a chord string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HotkeyParseError {
    #[error("empty hotkey")]
    Empty,

    #[error("unknown key {0:?}")]
    UnknownKey(String),

    #[error("unknown modifier {0:?}")]
    UnknownModifier(String),
}

/// A key plus the modifiers that must be held with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hotkey {
    pub key: rdev::Key,
    pub modifiers: Modifiers,
}

impl Hotkey {
    pub fn new(key: rdev::Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn requires(&self, m: Modifier) -> bool {
        self.modifiers.contains(m)
    }

    /// Whether the chord is satisfied by `held`.  Extra held modifiers are
    /// allowed.
    pub fn matches(&self, key: rdev::Key, held: Modifiers) -> bool {
        key == self.key && self.modifiers.is_subset_of(held)
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<String> = s
            .split('+')
            .map(|p| p.trim().to_lowercase())
            .collect();

        let Some((key_name, modifier_names)) = parts.split_last() else {
            return Err(HotkeyParseError::Empty);
        };
        if key_name.is_empty() {
            return Err(HotkeyParseError::Empty);
        }

        let key = parse_key(key_name).ok_or_else(|| HotkeyParseError::UnknownKey(key_name.clone()))?;
        let mut modifiers = Modifiers::default();
        for name in modifier_names {
            let m = Modifier::parse(name)
                .ok_or_else(|| HotkeyParseError::UnknownModifier(name.clone()))?;
            modifiers.insert(m);
        }
        Ok(Self { key, modifiers })
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in Modifier::ALL {
            if self.requires(m) {
                write!(f, "{m}+")?;
            }
        }
        write!(f, "{:?}", self.key)
    }
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse one key name, case-insensitively, into an [`rdev::Key`].
///
/// Supports F1–F12, common named keys, letters and digits.
///
/// ```
/// use voice_command::hotkey::parse_key;
///
/// assert_eq!(parse_key("f9"), Some(rdev::Key::F9));
/// assert_eq!(parse_key("ESC"), Some(rdev::Key::Escape));
/// assert_eq!(parse_key("xyz"), None);
/// ```
pub fn parse_key(name: &str) -> Option<rdev::Key> {
    use rdev::Key::*;

    let name = name.trim().to_lowercase();
    let key = match name.as_str() {
        "f1" => F1,
        "f2" => F2,
        "f3" => F3,
        "f4" => F4,
        "f5" => F5,
        "f6" => F6,
        "f7" => F7,
        "f8" => F8,
        "f9" => F9,
        "f10" => F10,
        "f11" => F11,
        "f12" => F12,

        "escape" | "esc" => Escape,
        "space" => Space,
        "return" | "enter" => Return,
        "tab" => Tab,
        "backspace" => Backspace,
        "delete" | "del" => Delete,
        "home" => Home,
        "end" => End,
        "pageup" => PageUp,
        "pagedown" => PageDown,
        "up" | "uparrow" => UpArrow,
        "down" | "downarrow" => DownArrow,
        "left" | "leftarrow" => LeftArrow,
        "right" | "rightarrow" => RightArrow,
        "capslock" => CapsLock,
        "pause" => Pause,

        single if single.chars().count() == 1 => return single.chars().next().and_then(char_key),
        _ => return None,
    };
    Some(key)
}

fn char_key(c: char) -> Option<rdev::Key> {
    use rdev::Key::*;
    const LETTERS: [rdev::Key; 26] = [
        KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO,
        KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
    ];
    const DIGITS: [rdev::Key; 10] = [Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9];

    match c {
        'a'..='z' => Some(LETTERS[(c as u8 - b'a') as usize]),
        '0'..='9' => Some(DIGITS[(c as u8 - b'0') as usize]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
