//! Frame clock and loop ownership
//!
//! The host hands the engine a monotonic timestamp each animation frame; the
//! clock turns that into one clamped delta consumed by every stage of the tick.

use crate::consts::{DELTA_CAP, MIN_DELTA};

/// Derives a bounded per-tick delta from successive timestamps (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    last: Option<f64>,
    cap: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DELTA_CAP)
    }
}

impl FrameClock {
    pub fn new(cap: f32) -> Self {
        Self {
            last: None,
            cap: cap.max(MIN_DELTA),
        }
    }

    /// Reset the reference timestamp (level start or retry)
    pub fn start(&mut self, now: f64) {
        self.last = now.is_finite().then_some(now);
    }

    /// Delta since the previous call, clamped to `[MIN_DELTA, cap]`.
    ///
    /// The reference timestamp advances even when the delta is clamped, so a
    /// stalled tab never produces a burst of catch-up frames. A clock that was
    /// never started returns 0 on its first advance.
    pub fn advance(&mut self, now: f64) -> f32 {
        if !now.is_finite() {
            return MIN_DELTA;
        }
        let raw = match self.last {
            Some(last) => (now - last) as f32,
            None => 0.0,
        };
        self.last = Some(now);
        if !raw.is_finite() {
            return MIN_DELTA;
        }
        raw.clamp(MIN_DELTA, self.cap)
    }
}

/// Proof of ownership of the running loop. Only the token issued by the most
/// recent [`LoopSlot::start`] keeps ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopToken(u64);

/// Guarantees at most one live frame loop per screen
#[derive(Debug, Default, Clone)]
pub struct LoopSlot {
    generation: u64,
    live: bool,
}

impl LoopSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new loop, invalidating any previously issued token
    pub fn start(&mut self) -> LoopToken {
        self.generation = self.generation.wrapping_add(1);
        self.live = true;
        log::debug!("frame loop {} started", self.generation);
        LoopToken(self.generation)
    }

    /// Stop the live loop. Its token fails the next [`LoopSlot::is_current`]
    /// check, so no further tick runs.
    pub fn cancel(&mut self) {
        if self.live {
            log::debug!("frame loop {} cancelled", self.generation);
        }
        self.live = false;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_current(&self, token: LoopToken) -> bool {
        self.live && token.0 == self.generation
    }

    pub fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_advance_is_zero() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance(12.5), 0.0);
        assert!((clock.advance(12.516) - 0.016).abs() < 1e-4);
    }

    #[test]
    fn test_delta_capped_after_stall() {
        let mut clock = FrameClock::default();
        clock.start(0.0);
        assert_eq!(clock.advance(5.0), DELTA_CAP);
        // Reference moved to 5.0, not stuck at 0.0
        assert!((clock.advance(5.02) - 0.02).abs() < 1e-4);
    }

    #[test]
    fn test_backwards_time_clamped_to_zero() {
        let mut clock = FrameClock::default();
        clock.start(10.0);
        assert_eq!(clock.advance(9.0), 0.0);
        assert!((clock.advance(9.05) - 0.05).abs() < 1e-4);
    }

    #[test]
    fn test_non_finite_timestamp_yields_zero() {
        let mut clock = FrameClock::default();
        clock.start(1.0);
        assert_eq!(clock.advance(f64::NAN), 0.0);
        assert_eq!(clock.advance(f64::INFINITY), 0.0);
        assert!((clock.advance(1.05) - 0.05).abs() < 1e-4);
    }

    #[test]
    fn test_restart_replaces_token() {
        let mut slot = LoopSlot::new();
        let first = slot.start();
        assert!(slot.is_current(first));
        let second = slot.start();
        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));
    }

    #[test]
    fn test_cancel_invalidates_token() {
        let mut slot = LoopSlot::new();
        let token = slot.start();
        slot.cancel();
        assert!(!slot.is_current(token));
        assert!(!slot.is_live());
    }
}
