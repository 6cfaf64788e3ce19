//! Shared simulation types
//!
//! Entity identity, pickup bookkeeping, cosmetic particles, events emitted by a
//! tick, and the render snapshot handed to the presentation layer.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::outcome::{Outcome, Reward};
use super::random::{RandomSource, SeededRandom};

/// Stable identity of a spawned entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Monotonic id source. Ids are never reused within an attempt.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next.max(1));
        self.next = id.0 + 1;
        id
    }
}

/// Records which entities already paid out progress
#[derive(Debug, Clone, Default)]
pub struct PickupLedger {
    claimed: HashSet<EntityId>,
}

impl PickupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time `id` is claimed, false ever after
    pub fn claim(&mut self, id: EntityId) -> bool {
        self.claimed.insert(id)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    pub fn clear(&mut self) {
        self.claimed.clear();
    }
}

/// Audio cues the simulation can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Jump,
    Pickup,
    Death,
    Checkpoint,
    BeatHit,
    BeatMiss,
    TileLock,
    Shoot,
    BossHit,
    BossPhase,
    Warning,
    Victory,
    GameOver,
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A hit cost a life
    LifeLost { lives_left: u8 },
    /// Reward delay elapsed after a win
    LevelComplete(Reward),
    GameOver,
    Sound(SoundCue),
    /// Rhythm press landed on a beat
    HitFeedback { lane: usize },
    /// Rhythm press or missed beat
    MissFeedback { lane: usize },
}

/// Colour role of a drawn rectangle. The renderer owns the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Paint {
    Sky,
    Player,
    Platform,
    Spike,
    PatrolBlock,
    Heart,
    Checkpoint,
    CheckpointActive,
    Lane,
    HitZone,
    Beat,
    Tile { index: u16 },
    TileLocked { index: u16 },
    BoardSlot,
    Star,
    Obstacle,
    Boss,
    BossEnraged,
    Projectile,
    Taxi,
    Pigeon,
    Warning,
    Shockwave,
    Particle,
    Flash,
}

/// One filled rectangle in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub rect: Aabb,
    pub paint: Paint,
    pub alpha: f32,
}

impl Shape {
    pub fn new(rect: Aabb, paint: Paint) -> Self {
        Self {
            rect,
            paint,
            alpha: 1.0,
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Idle,
    Left,
    Right,
}

/// Player sprite inputs for frame selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avatar {
    pub rect: Aabb,
    pub facing: Facing,
    /// Seconds spent moving in the current direction
    pub moving_for: f32,
    /// Blink while invincible
    pub visible: bool,
}

/// Numbers shown in the heads-up display
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hud {
    pub lives: u8,
    pub score: f32,
    pub target: f32,
    pub time_left: Option<f32>,
    pub caption: String,
}

/// Read-only snapshot for the render adapter
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Visible area size
    pub viewport: Vec2,
    /// World offset of the viewport's top-left corner
    pub camera: Vec2,
    pub shapes: Vec<Shape>,
    pub avatar: Option<Avatar>,
    pub hud: Hud,
    pub outcome: Outcome,
}

impl Scene {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            camera: Vec2::ZERO,
            shapes: Vec::new(),
            avatar: None,
            hud: Hud::default(),
            outcome: Outcome::InProgress,
        }
    }

    pub fn push(&mut self, rect: Aabb, paint: Paint) {
        self.shapes.push(Shape::new(rect, paint));
    }
}

/// A cosmetic particle. Never affects gameplay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 1 at spawn, removed at 0
    pub life: f32,
    pub size: f32,
}

/// Maximum live particles per level
pub const MAX_PARTICLES: usize = 256;

const PARTICLE_SEED: u64 = 0x5eed_f00d;

/// Cosmetic particle pool. Draws from its own generator so effects never
/// shift the gameplay random stream.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    rng: SeededRandom,
}

impl Default for ParticleField {
    fn default() -> Self {
        Self {
            particles: Vec::new(),
            rng: SeededRandom::new(PARTICLE_SEED),
        }
    }
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scatter `count` particles outward from `origin`
    pub fn burst(&mut self, origin: Vec2, count: usize) {
        for _ in 0..count {
            if self.particles.len() >= MAX_PARTICLES {
                break;
            }
            let angle = self.rng.range(0.0, std::f32::consts::TAU);
            let speed = self.rng.range(60.0, 240.0);
            self.particles.push(Particle {
                pos: origin,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life: 1.0,
                size: self.rng.range(3.0, 7.0),
            });
        }
    }

    pub fn update(&mut self, dt: f32) {
        for p in self.particles.iter_mut() {
            p.pos += p.vel * dt;
            p.vel.y += 300.0 * dt;
            p.life -= dt * 1.5;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Drop every particle and restart the effect stream (level reset)
    pub fn clear(&mut self) {
        self.particles.clear();
        self.rng = SeededRandom::new(PARTICLE_SEED);
    }

    pub fn draw(&self, scene: &mut Scene) {
        for p in &self.particles {
            let half = Vec2::splat(p.size * 0.5);
            scene.shapes.push(
                Shape::new(Aabb::from_pos_size(p.pos - half, Vec2::splat(p.size)), Paint::Particle)
                    .with_alpha(p.life),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut ids = IdAllocator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert_eq!(a, EntityId(1));
    }

    #[test]
    fn test_ledger_pays_once() {
        let mut ledger = PickupLedger::new();
        assert!(ledger.claim(EntityId(7)));
        assert!(!ledger.claim(EntityId(7)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_particles_fade_out() {
        let mut field = ParticleField::new();
        field.burst(Vec2::new(10.0, 10.0), 15);
        assert_eq!(field.len(), 15);
        for _ in 0..60 {
            field.update(1.0 / 60.0);
        }
        assert!(field.is_empty());
    }

    #[test]
    fn test_burst_respects_cap() {
        let mut field = ParticleField::new();
        field.burst(Vec2::ZERO, MAX_PARTICLES + 40);
        assert_eq!(field.len(), MAX_PARTICLES);
    }

    #[test]
    fn test_burst_leaves_gameplay_stream_alone() {
        let mut plain = SeededRandom::new(42);
        let mut busy = SeededRandom::new(42);
        let mut field = ParticleField::new();
        field.burst(Vec2::ZERO, 15);
        assert_eq!(plain.uniform(), busy.uniform());
    }

    #[test]
    fn test_clear_replays_effects() {
        let mut field = ParticleField::new();
        field.burst(Vec2::ZERO, 3);
        let first = field.particles.clone();
        field.clear();
        field.burst(Vec2::ZERO, 3);
        assert_eq!(field.particles, first);
    }
}
