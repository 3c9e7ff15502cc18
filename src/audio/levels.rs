//! Live input level meter for the recording indicator.
//!
//! Each capture callback contributes one bar: the block's RMS in dBFS mapped
//! linearly from a −60 dB floor to 0 dB onto `[0, 1]`.  The meter keeps the
//! most recent `capacity` bars and evicts the oldest first.
//!
//! ```rust
//! use voice_command::audio::LevelMeter;
//!
//! let mut meter = LevelMeter::new(2);
//! meter.push_level(0.1);
//! meter.push_level(0.2);
//! meter.push_level(0.3);
//! assert_eq!(meter.levels(), vec![0.2, 0.3]);
//! ```

use std::collections::VecDeque;

/// Level shown for silence and anything quieter.
pub const FLOOR_DB: f32 = -60.0;

/// Map a dBFS value to `[0, 1]`: `FLOOR_DB` and below → 0, 0 dB and above → 1.
pub fn db_to_level(db: f32) -> f32 {
    if !db.is_finite() || db <= FLOOR_DB {
        return 0.0;
    }
    ((db - FLOOR_DB) / -FLOOR_DB).min(1.0)
}

/// RMS of `samples` in dBFS; `-inf` for silence or an empty block.
pub fn rms_dbfs(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }
    let mean_square = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    10.0 * mean_square.log10()
}

/// Bounded history of input levels.
#[derive(Debug, Clone)]
pub struct LevelMeter {
    bars: VecDeque<f32>,
    capacity: usize,
}

impl LevelMeter {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            bars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a level in `[0, 1]`, evicting the oldest bar when full.
    pub fn push_level(&mut self, level: f32) {
        if self.bars.len() == self.capacity {
            self.bars.pop_front();
        }
        self.bars.push_back(level.clamp(0.0, 1.0));
    }

    /// Append the level of one block of mono samples.
    pub fn push_block(&mut self, samples: &[f32]) {
        self.push_level(db_to_level(rms_dbfs(samples)));
    }

    /// Bars oldest first.
    pub fn levels(&self) -> Vec<f32> {
        self.bars.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.bars.clear();
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_mapping_is_linear_between_floor_and_zero() {
        assert_eq!(db_to_level(-60.0), 0.0);
        assert_eq!(db_to_level(-90.0), 0.0);
        assert_eq!(db_to_level(f32::NEG_INFINITY), 0.0);
        assert!((db_to_level(-30.0) - 0.5).abs() < 1e-6);
        assert_eq!(db_to_level(0.0), 1.0);
        assert_eq!(db_to_level(6.0), 1.0);
    }

    #[test]
    fn full_scale_square_wave_is_zero_db() {
        let block = [1.0_f32, -1.0, 1.0, -1.0];
        assert!(rms_dbfs(&block).abs() < 1e-4);
        assert_eq!(rms_dbfs(&[0.0; 8]), f32::NEG_INFINITY);
        assert_eq!(rms_dbfs(&[]), f32::NEG_INFINITY);
    }

    #[test]
    fn oldest_bar_is_evicted() {
        let mut meter = LevelMeter::new(30);
        for i in 0..35 {
            meter.push_level(i as f32 / 100.0);
        }
        let levels = meter.levels();
        assert_eq!(levels.len(), 30);
        assert!((levels[0] - 0.05).abs() < 1e-6);
        assert!((levels[29] - 0.34).abs() < 1e-6);
    }

    #[test]
    fn clear_empties_meter() {
        let mut meter = LevelMeter::new(4);
        meter.push_block(&[0.5; 16]);
        assert_eq!(meter.len(), 1);
        meter.clear();
        assert!(meter.is_empty());
        assert_eq!(meter.capacity(), 4);
    }
}
