//! Lives, invincibility and checkpoint anchors

use glam::Vec2;

use super::aabb::Aabb;

/// Offset from a checkpoint's top-left to its respawn anchor
pub const CHECKPOINT_ANCHOR_OFFSET: Vec2 = Vec2::new(10.0, -20.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    Alive,
    Invincible,
    /// Out of lives; only a retry leaves this state
    Dead,
}

/// Result of a hit that was actually applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub lives_left: u8,
    /// Where the player should be placed, if the level has a spatial anchor
    pub respawn: Option<Vec2>,
}

/// Per-attempt life bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct Vitals {
    lives: u8,
    invincible_for: f32,
    invincibility_secs: f32,
    anchor: Option<Vec2>,
}

impl Vitals {
    pub fn new(lives: u8, invincibility_secs: f32) -> Self {
        Self {
            lives,
            invincible_for: 0.0,
            invincibility_secs: invincibility_secs.max(0.0),
            anchor: None,
        }
    }

    /// Same, with a respawn anchor (level start position)
    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn state(&self) -> LifeState {
        if self.lives == 0 {
            LifeState::Dead
        } else if self.invincible_for > 0.0 {
            LifeState::Invincible
        } else {
            LifeState::Alive
        }
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn is_invincible(&self) -> bool {
        self.state() == LifeState::Invincible
    }

    pub fn can_be_hit(&self) -> bool {
        self.state() == LifeState::Alive
    }

    pub fn is_dead(&self) -> bool {
        self.lives == 0
    }

    /// Seconds of invincibility left
    pub fn invincibility_left(&self) -> f32 {
        self.invincible_for
    }

    pub fn anchor(&self) -> Option<Vec2> {
        self.anchor
    }

    /// Count the invincibility window down
    pub fn tick(&mut self, dt: f32) {
        if self.invincible_for > 0.0 {
            self.invincible_for = (self.invincible_for - dt.max(0.0)).max(0.0);
        }
    }

    /// Apply one damage event. Ignored while invincible or dead.
    pub fn take_hit(&mut self) -> Option<Hit> {
        if !self.can_be_hit() {
            return None;
        }
        self.lives -= 1;
        self.invincible_for = self.invincibility_secs;
        log::info!("life lost, {} left", self.lives);
        Some(Hit {
            lives_left: self.lives,
            respawn: self.anchor,
        })
    }

    /// Move the respawn anchor forward
    pub fn set_anchor(&mut self, anchor: Vec2) {
        self.anchor = Some(anchor);
    }
}

/// Respawn flag. Activation is one-way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub bounds: Aabb,
    pub activated: bool,
}

impl Checkpoint {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            activated: false,
        }
    }

    /// Anchor just above and beside the flag
    pub fn anchor(&self) -> Vec2 {
        self.bounds.pos + CHECKPOINT_ANCHOR_OFFSET
    }

    /// Activate if `player` overlaps and this flag is still inactive.
    /// Returns the new anchor on activation.
    pub fn try_activate(&mut self, player: &Aabb) -> Option<Vec2> {
        if self.activated || !self.bounds.intersects(player) {
            return None;
        }
        self.activated = true;
        log::debug!("checkpoint at {:?} activated", self.bounds.pos);
        Some(self.anchor())
    }
}

/// Activate every newly-touched checkpoint, advancing the anchor to the last one
pub fn activate_checkpoints(checkpoints: &mut [Checkpoint], player: &Aabb, vitals: &mut Vitals) -> usize {
    let mut activated = 0;
    for checkpoint in checkpoints.iter_mut() {
        if let Some(anchor) = checkpoint.try_activate(player) {
            vitals.set_anchor(anchor);
            activated += 1;
        }
    }
    activated
}
