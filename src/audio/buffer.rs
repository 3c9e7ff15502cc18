//! Shared accumulation buffer between the cpal callback and the recorder.
//!
//! The input stream runs for the whole process lifetime; the callback only
//! keeps samples while the buffer is armed.  Arming clears old samples,
//! disarming hands them over and clears the level meter.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use super::levels::LevelMeter;

/// Thread-shared capture state.  Wrap in `Arc` and give one clone to the
/// capture callback and one to the recorder.
#[derive(Debug)]
pub struct CaptureBuffer {
    /// Set once an input stream is running.
    live: AtomicBool,
    armed: AtomicBool,
    sample_rate: AtomicU32,
    samples: Mutex<Vec<f32>>,
    levels: Mutex<LevelMeter>,
}

impl CaptureBuffer {
    pub fn new(level_bars: usize) -> Self {
        Self {
            live: AtomicBool::new(false),
            armed: AtomicBool::new(false),
            sample_rate: AtomicU32::new(0),
            samples: Mutex::new(Vec::new()),
            levels: Mutex::new(LevelMeter::new(level_bars)),
        }
    }

    /// Record that a stream at `sample_rate` now feeds this buffer.
    pub fn mark_live(&self, sample_rate: u32) {
        self.sample_rate.store(sample_rate, Ordering::SeqCst);
        self.live.store(true, Ordering::SeqCst);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::SeqCst)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Start keeping samples, discarding anything left from before.
    pub fn arm(&self) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Stop keeping samples and return everything kept since [`arm`](Self::arm).
    pub fn disarm(&self) -> Vec<f32> {
        self.armed.store(false, Ordering::SeqCst);
        self.levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        std::mem::take(&mut *self.samples.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Called from the audio thread with one block of mono samples.
    ///
    /// The level meter is only updated when its lock is free; a missed bar
    /// is preferable to stalling the audio callback.
    pub fn push(&self, mono: &[f32]) {
        if !self.is_armed() {
            return;
        }
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(mono);
        if let Ok(mut meter) = self.levels.try_lock() {
            meter.push_block(mono);
        }
    }

    /// Snapshot of the live levels for display.  Empty when the lock is busy.
    pub fn levels(&self) -> Vec<f32> {
        self.levels
            .try_lock()
            .map(|meter| meter.levels())
            .unwrap_or_default()
    }
}
