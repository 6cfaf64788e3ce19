//! Birthday Quest - a hub of five arcade minigames
//!
//! Core modules:
//! - `sim`: Delta-time simulation core (clock, collision, spawning, physics, lives, outcome)
//! - `levels`: The five minigames, each a `Level` strategy plugged into the engine
//! - `tuning`: Data-driven game balance
//! - `hub`/`progress`: Thin top-level router and persisted progress
//! - `renderer`/`audio`: Browser presentation adapters (best effort)

pub mod audio;
pub mod hub;
pub mod levels;
pub mod progress;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use hub::{Hub, Screen};
pub use levels::{AnyLevel, LevelId};
pub use progress::Progress;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Largest delta a single tick may consume (stalled tab protection)
    pub const DELTA_CAP: f32 = 0.1;
    /// Smallest delta a tick may consume
    pub const MIN_DELTA: f32 = 0.0;

    /// Lives granted at level start and after a retry
    pub const START_LIVES: u8 = 3;
    /// Invincibility window after a hit (seconds)
    pub const INVINCIBILITY_SECS: f32 = 2.0;

    /// Frame rate the original per-frame constants were tuned for
    pub const LEGACY_FPS: f32 = 60.0;

    /// Default viewport
    pub const VIEWPORT_WIDTH: f32 = 1280.0;
    pub const VIEWPORT_HEIGHT: f32 = 720.0;

    /// Seconds a sprite frame is shown while running (12 frames at 60 Hz)
    pub const SPRITE_FRAME_SECS: f32 = 0.2;
    /// Number of running sprite frames
    pub const SPRITE_FRAMES: u32 = 3;
}

/// Linear interpolation between `start` and `end`
#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + t * (end - start)
}

/// Ratio `done / total` clamped to [0, 1] (0 when `total` is not positive)
#[inline]
pub fn fraction(done: f32, total: f32) -> f32 {
    if total <= 0.0 || !done.is_finite() {
        return 0.0;
    }
    (done / total).clamp(0.0, 1.0)
}
