//! Dedicated OS-thread hotkey listener using `rdev::listen`.
//!
//! `rdev::listen` blocks forever and has no shutdown API, so the thread lives
//! until the process exits.  Dropping [`HotkeyListener`] sets a stop flag and
//! the callback discards everything after that.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use super::{Hotkey, HotkeyEvent, Modifier, Modifiers};

// ---------------------------------------------------------------------------
// ChordTracker
// ---------------------------------------------------------------------------

/// Edge produced by [`ChordTracker::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordEdge {
    Down,
    Up,
}

/// Turns raw key events into chord down/up edges.
///
/// Holding a key makes the OS repeat `KeyPress` events; only the first one
/// yields [`ChordEdge::Down`].  The chord ends when its key is released,
/// regardless of the modifiers at that moment.
#[derive(Debug, Clone)]
pub struct ChordTracker {
    chord: Hotkey,
    held_modifiers: Modifiers,
    active: bool,
}

impl ChordTracker {
    pub fn new(chord: Hotkey) -> Self {
        Self {
            chord,
            held_modifiers: Modifiers::default(),
            active: false,
        }
    }

    pub fn handle(&mut self, event: &rdev::EventType) -> Option<ChordEdge> {
        match *event {
            rdev::EventType::KeyPress(key) => {
                if let Some(m) = Modifier::of_key(key) {
                    self.held_modifiers.insert(m);
                }
                if !self.active && self.chord.matches(key, self.held_modifiers) {
                    self.active = true;
                    return Some(ChordEdge::Down);
                }
                None
            }
            rdev::EventType::KeyRelease(key) => {
                if let Some(m) = Modifier::of_key(key) {
                    self.held_modifiers.remove(m);
                }
                if self.active && key == self.chord.key {
                    self.active = false;
                    return Some(ChordEdge::Up);
                }
                None
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyListener
// ---------------------------------------------------------------------------

/// Handle to a running hotkey listener thread.
pub struct HotkeyListener {
    stop: Arc<AtomicBool>,
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyListener {
    /// Spawn the listener thread.
    ///
    /// `push_to_talk` yields [`HotkeyEvent::Press`] / [`HotkeyEvent::Release`];
    /// `paste_last`, when set, yields [`HotkeyEvent::PasteLast`] on press.
    /// Events go out with `blocking_send` since the thread is not async.
    pub fn start(
        push_to_talk: Hotkey,
        paste_last: Option<Hotkey>,
        tx: mpsc::Sender<HotkeyEvent>,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let mut talk = ChordTracker::new(push_to_talk);
        let mut paste = paste_last.map(ChordTracker::new);

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    if stop_flag.load(Ordering::Relaxed) {
                        return;
                    }

                    let forwarded = match talk.handle(&event.event_type) {
                        Some(ChordEdge::Down) => Some(HotkeyEvent::Press),
                        Some(ChordEdge::Up) => Some(HotkeyEvent::Release),
                        None => None,
                    };
                    let pasted = paste
                        .as_mut()
                        .and_then(|p| p.handle(&event.event_type))
                        .filter(|edge| *edge == ChordEdge::Down)
                        .map(|_| HotkeyEvent::PasteLast);

                    for ev in forwarded.into_iter().chain(pasted) {
                        if tx.blocking_send(ev).is_err() {
                            log::debug!("hotkey: receiver gone, dropping {ev:?}");
                        }
                    }
                });

                if let Err(e) = result {
                    log::error!("hotkey: rdev::listen exited with error: {e:?}");
                }
            })?;

        log::info!("hotkey: push-to-talk on {push_to_talk}");
        Ok(Self {
            stop,
            _thread: thread,
        })
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdev::EventType::{KeyPress, KeyRelease};
    use rdev::Key;

    fn tracker(chord: &str) -> ChordTracker {
        ChordTracker::new(chord.parse().unwrap())
    }

    #[test]
    fn auto_repeat_yields_single_down() {
        let mut t = tracker("F9");
        assert_eq!(t.handle(&KeyPress(Key::F9)), Some(ChordEdge::Down));
        assert_eq!(t.handle(&KeyPress(Key::F9)), None);
        assert_eq!(t.handle(&KeyPress(Key::F9)), None);
        assert_eq!(t.handle(&KeyRelease(Key::F9)), Some(ChordEdge::Up));
        assert_eq!(t.handle(&KeyRelease(Key::F9)), None);
    }

    #[test]
    fn modifier_must_be_held_first() {
        let mut t = tracker("Shift+Space");
        assert_eq!(t.handle(&KeyPress(Key::Space)), None);
        assert_eq!(t.handle(&KeyRelease(Key::Space)), None);

        assert_eq!(t.handle(&KeyPress(Key::ShiftRight)), None);
        assert_eq!(t.handle(&KeyPress(Key::Space)), Some(ChordEdge::Down));
        // Letting go of Shift first does not end the chord.
        assert_eq!(t.handle(&KeyRelease(Key::ShiftRight)), None);
        assert_eq!(t.handle(&KeyRelease(Key::Space)), Some(ChordEdge::Up));
    }

    #[test]
    fn other_events_are_ignored() {
        let mut t = tracker("F9");
        assert_eq!(t.handle(&KeyPress(Key::KeyA)), None);
        assert_eq!(
            t.handle(&rdev::EventType::MouseMove { x: 1.0, y: 2.0 }),
            None
        );
    }
}
