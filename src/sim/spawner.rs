//! Timed spawning helpers and difficulty ramps

use serde::{Deserialize, Serialize};

use super::random::RandomSource;
use crate::{fraction, lerp};

/// Interval accumulator that keeps fractional overflow between spawns
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpawnTimer {
    elapsed: f32,
}

impl SpawnTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `dt` and fire at most once. The interval is subtracted on
    /// fire rather than resetting to zero.
    pub fn tick(&mut self, dt: f32, interval: f32) -> bool {
        self.elapsed += dt.max(0.0);
        if interval <= 0.0 {
            self.elapsed = 0.0;
            return true;
        }
        if self.elapsed >= interval {
            self.elapsed -= interval;
            // A huge dt should not queue a burst on the next ticks
            if self.elapsed >= interval {
                self.elapsed %= interval;
            }
            return true;
        }
        false
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

/// Countdown that fires once when it crosses zero
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    /// Returns true on the tick the countdown reaches zero
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        self.remaining <= 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.remaining > 0.0
    }
}

/// Linear difficulty ramp between `start` and `end`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ramp {
    pub start: f32,
    pub end: f32,
}

impl Ramp {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Value at progress `p`, clamped to `[0, 1]`
    pub fn at(&self, p: f32) -> f32 {
        let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        lerp(self.start, self.end, p)
    }

    /// Value keyed on `done / total`
    pub fn at_ratio(&self, done: f32, total: f32) -> f32 {
        self.at(fraction(done, total))
    }
}

/// Pick a category from cumulative probability bands.
///
/// `bands` holds increasing upper thresholds; the first band whose threshold
/// is strictly greater than `roll` wins, and rolls past the last threshold fall
/// into the final band.
pub fn pick_band(roll: f32, bands: &[f32]) -> usize {
    bands
        .iter()
        .position(|&upper| roll < upper)
        .unwrap_or(bands.len().saturating_sub(1))
}

/// Resample-or-skip placement: draw up to `attempts` candidates and return the
/// first one `is_fair` accepts.
pub fn place_with_retry<T, R>(
    rng: &mut R,
    attempts: usize,
    mut propose: impl FnMut(&mut R) -> T,
    mut is_fair: impl FnMut(&T) -> bool,
) -> Option<T>
where
    R: RandomSource + ?Sized,
{
    for _ in 0..attempts {
        let candidate = propose(rng);
        if is_fair(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::random::ScriptedRandom;
    use proptest::prelude::*;

    #[test]
    fn test_timer_preserves_overflow() {
        let mut timer = SpawnTimer::new();
        let fired: Vec<bool> = (0..3).map(|_| timer.tick(0.7, 1.0)).collect();
        assert_eq!(fired, vec![false, true, true]);
        assert!((timer.elapsed() - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_countdown_fires_once() {
        let mut c = Countdown::new(0.5);
        assert!(!c.tick(0.3));
        assert!(c.tick(0.3));
        assert!(!c.tick(0.3));
        assert_eq!(c.remaining(), 0.0);
    }

    #[test]
    fn test_ramp_clamps() {
        let ramp = Ramp::new(3.0, 0.25);
        assert_eq!(ramp.at(-1.0), 3.0);
        assert_eq!(ramp.at(2.0), 0.25);
        assert!((ramp.at(0.5) - 1.625).abs() < 1e-6);
        assert_eq!(ramp.at(f32::NAN), 3.0);
    }

    #[test]
    fn test_pick_band_boundaries() {
        let bands = [0.5, 0.8, 1.0];
        assert_eq!(pick_band(0.0, &bands), 0);
        assert_eq!(pick_band(0.49, &bands), 0);
        assert_eq!(pick_band(0.5, &bands), 1);
        assert_eq!(pick_band(0.8, &bands), 2);
        assert_eq!(pick_band(1.5, &bands), 2);
    }

    #[test]
    fn test_place_with_retry_skips() {
        let mut rng = ScriptedRandom::new([0.1, 0.2, 0.3, 0.9]);
        let none = place_with_retry(&mut rng, 3, |r| r.uniform(), |v| *v > 0.5);
        assert_eq!(none, None);
        let some = place_with_retry(&mut rng, 3, |r| r.uniform(), |v| *v > 0.5);
        assert_eq!(some, Some(0.9));
    }

    proptest! {
        #[test]
        fn prop_ramp_stays_between_endpoints(p in -10.0f32..10.0, a in -100.0f32..100.0, b in -100.0f32..100.0) {
            let v = Ramp::new(a, b).at(p);
            prop_assert!(v >= a.min(b) - 1e-3 && v <= a.max(b) + 1e-3);
        }

        #[test]
        fn prop_timer_fires_once_per_interval(steps in proptest::collection::vec(0.0f32..0.1, 1..400)) {
            let mut timer = SpawnTimer::new();
            let total: f32 = steps.iter().sum();
            let fired = steps.iter().filter(|&&dt| timer.tick(dt, 0.5)).count();
            let expected = (total / 0.5).floor() as usize;
            prop_assert!(fired + 1 >= expected && fired <= expected + 1);
        }
    }
}
