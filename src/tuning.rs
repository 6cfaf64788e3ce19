//! Game balance
//!
//! Every gameplay constant lives here so a JSON document can override any of
//! them. Per-frame values from the first prototype were converted to per-second
//! values at 60 Hz.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::motion::PlatformPhysics;
use crate::sim::spawner::Ramp;

/// Failure to parse a tuning document
#[derive(Debug)]
pub enum TuningError {
    Parse(serde_json::Error),
    /// Parsed fine but a value is unusable
    Invalid(&'static str),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "tuning parse error: {}", e),
            TuningError::Invalid(what) => write!(f, "invalid tuning: {}", what),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

/// Shared engine settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    pub delta_cap: f32,
    pub invincibility_secs: f32,
    pub start_lives: u8,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            delta_cap: DELTA_CAP,
            invincibility_secs: INVINCIBILITY_SECS,
            start_lives: START_LIVES,
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
        }
    }
}

impl EngineTuning {
    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.viewport_width, self.viewport_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformerTuning {
    pub physics: PlatformPhysics,
    /// Level width in viewport widths
    pub width_screens: f32,
    pub player_size: Vec2,
    /// Start position offset from the bottom-left (x, H - y)
    pub start_x: f32,
    pub start_height: f32,
    pub heart_hitbox: f32,
    pub hearts_needed: u32,
    /// Fraction of the level width the player must pass to finish
    pub goal_fraction: f32,
    /// Patrol block angular rate (rad/s)
    pub patrol_rate: f32,
    pub reward_delay: f32,
}

impl Default for PlatformerTuning {
    fn default() -> Self {
        Self {
            physics: PlatformPhysics::default(),
            width_screens: 3.0,
            player_size: Vec2::new(50.0, 80.0),
            start_x: 100.0,
            start_height: 200.0,
            heart_hitbox: 20.0,
            hearts_needed: 20,
            goal_fraction: 0.9,
            patrol_rate: 0.02 * LEGACY_FPS,
            reward_delay: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmTuning {
    /// Lane centres as fractions of the viewport width
    pub lane_fractions: [f32; 4],
    /// Hit zone distance from the bottom edge
    pub hit_zone_offset: f32,
    pub beat_size: f32,
    pub beats_per_minute: f32,
    pub fall_speed: f32,
    pub hit_tolerance: f32,
    pub miss_penalty: f32,
    pub hits_needed: f32,
    pub time_limit: f32,
    pub double_chance: Ramp,
    /// Chance a double note uses an adjacent lane pair
    pub adjacent_pair_chance: f32,
    pub reward_delay: f32,
}

impl Default for RhythmTuning {
    fn default() -> Self {
        Self {
            lane_fractions: [0.25, 0.40, 0.55, 0.70],
            hit_zone_offset: 100.0,
            beat_size: 60.0,
            beats_per_minute: 135.0,
            fall_speed: 400.0,
            hit_tolerance: 80.0,
            miss_penalty: 0.5,
            hits_needed: 75.0,
            time_limit: 60.0,
            double_chance: Ramp::new(0.10, 0.30),
            adjacent_pair_chance: 0.5,
            reward_delay: 0.5,
        }
    }
}

impl RhythmTuning {
    pub fn beat_interval(&self) -> f32 {
        60.0 / self.beats_per_minute.max(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleTuning {
    pub grid: u16,
    /// Board size as fractions of (height, width); the smaller wins
    pub board_height_fraction: f32,
    pub board_width_fraction: f32,
    /// Snap distance as a fraction of the tile size
    pub snap_fraction: f32,
    pub left_workspace_chance: f32,
    pub right_workspace_chance: f32,
    pub lock_particles: usize,
    pub reward_delay: f32,
}

impl Default for PuzzleTuning {
    fn default() -> Self {
        Self {
            grid: 5,
            board_height_fraction: 0.8,
            board_width_fraction: 0.5,
            snap_fraction: 0.3,
            left_workspace_chance: 0.3,
            right_workspace_chance: 0.3,
            lock_particles: 15,
            reward_delay: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorTuning {
    pub player_size: f32,
    /// Player top distance from the bottom edge
    pub player_offset: f32,
    pub player_speed: f32,
    pub item_size: f32,
    pub total_stars: u32,
    pub stars_needed: i32,
    pub star_interval_min: f32,
    pub star_interval_max: f32,
    pub obstacle_interval: Ramp,
    pub fall_speed: Ramp,
    /// Obstacles keep this far (horizontally) from stars near the top
    pub safe_zone_x: f32,
    pub safe_zone_y: f32,
    pub placement_attempts: usize,
    /// Items are culled this far below the bottom edge
    pub cull_margin: f32,
    pub reward_delay: f32,
}

impl Default for CollectorTuning {
    fn default() -> Self {
        Self {
            player_size: 80.0,
            player_offset: 140.0,
            player_speed: 700.0,
            item_size: 50.0,
            total_stars: 25,
            stars_needed: 20,
            star_interval_min: 1.5,
            star_interval_max: 2.5,
            obstacle_interval: Ramp::new(3.0, 0.25),
            fall_speed: Ramp::new(3.0 * LEGACY_FPS, 10.0 * LEGACY_FPS),
            safe_zone_x: 50.0,
            safe_zone_y: 150.0,
            placement_attempts: 3,
            cull_margin: 100.0,
            reward_delay: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub lane_height: f32,
    /// Lane tops measured from the bottom edge
    pub bottom_lane_offset: f32,
    pub top_lane_offset: f32,
    pub player_size: f32,
    pub player_speed: f32,
    pub fire_cooldown: f32,
    pub projectile_size: Vec2,
    pub projectile_speed: f32,
    pub boss_size: Vec2,
    pub boss_y: f32,
    pub boss_speed: f32,
    pub boss_margin: f32,
    pub boss_health: u32,
    /// Seconds between attacks in phase 1 and phase 2
    pub attack_interval: [f32; 2],
    /// Cumulative bands: taxi below the first, pigeons below the second
    pub attack_bands: [f32; 2],
    pub taxi_speed: [f32; 2],
    pub taxi_count: [u32; 2],
    pub taxi_size: Vec2,
    pub taxi_warmup: f32,
    pub taxi_spacing: f32,
    pub pigeon_count: [u32; 2],
    pub pigeon_size: f32,
    pub pigeon_fall: [f32; 2],
    pub pigeon_drift: f32,
    pub shockwave_warning: f32,
    pub shockwave_active: f32,
    pub reward_delay: f32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            lane_height: 80.0,
            bottom_lane_offset: 80.0,
            top_lane_offset: 160.0,
            player_size: 50.0,
            player_speed: 375.0,
            fire_cooldown: 0.2,
            projectile_size: Vec2::new(10.0, 20.0),
            projectile_speed: 700.0,
            boss_size: Vec2::new(200.0, 150.0),
            boss_y: 50.0,
            boss_speed: 150.0,
            boss_margin: 50.0,
            boss_health: 50,
            attack_interval: [1.8, 1.2],
            attack_bands: [0.5, 0.8],
            taxi_speed: [350.0, 450.0],
            taxi_count: [1, 2],
            taxi_size: Vec2::new(100.0, 40.0),
            taxi_warmup: 1.5,
            taxi_spacing: 250.0,
            pigeon_count: [2, 3],
            pigeon_size: 30.0,
            pigeon_fall: [200.0, 300.0],
            pigeon_drift: 200.0,
            shockwave_warning: 2.0,
            shockwave_active: 0.5,
            reward_delay: 2.5,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub engine: EngineTuning,
    pub platformer: PlatformerTuning,
    pub rhythm: RhythmTuning,
    pub puzzle: PuzzleTuning,
    pub collector: CollectorTuning,
    pub boss: BossTuning,
}

impl Tuning {
    /// Parse a (possibly partial) JSON document over the defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), TuningError> {
        if !(self.engine.delta_cap > 0.0) {
            return Err(TuningError::Invalid("engine.delta_cap must be positive"));
        }
        if self.engine.start_lives == 0 {
            return Err(TuningError::Invalid("engine.start_lives must be at least 1"));
        }
        if self.engine.viewport_width <= 0.0 || self.engine.viewport_height <= 0.0 {
            return Err(TuningError::Invalid("engine viewport must be positive"));
        }
        if self.puzzle.grid == 0 {
            return Err(TuningError::Invalid("puzzle.grid must be at least 1"));
        }
        if self.collector.star_interval_min > self.collector.star_interval_max {
            return Err(TuningError::Invalid("collector star interval min exceeds max"));
        }
        Ok(())
    }
}
