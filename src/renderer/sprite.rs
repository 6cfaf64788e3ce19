//! Player sprite frame selection
//!
//! Pure function of facing and time spent moving; the simulation never
//! advances animation state itself.

use crate::consts::{SPRITE_FRAME_SECS, SPRITE_FRAMES};
use crate::sim::state::Facing;

/// Running frame index in `0..SPRITE_FRAMES`. Idle always shows frame 0.
pub fn frame(facing: Facing, moving_for: f32) -> u32 {
    if facing == Facing::Idle || !moving_for.is_finite() || moving_for <= 0.0 {
        return 0;
    }
    ((moving_for / SPRITE_FRAME_SECS).floor() as u32) % SPRITE_FRAMES
}
