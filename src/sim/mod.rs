//! Delta-time simulation core
//!
//! Everything gameplay-relevant lives here and in `levels`. This module must stay
//! free of rendering and platform dependencies:
//! - One clamped delta per tick, shared by every stage
//! - Injected randomness only
//! - Stable stage order (timers, spawn, integrate, resolve, evaluate)

pub mod aabb;
pub mod clock;
pub mod engine;
pub mod input;
pub mod motion;
pub mod outcome;
pub mod random;
pub mod spawner;
pub mod state;
pub mod vitals;

pub use aabb::{Aabb, intersects};
pub use clock::{FrameClock, LoopSlot, LoopToken};
pub use engine::{Host, Level, SimulationEngine, TickContext, dispatch};
pub use input::{InputState, Key};
pub use motion::{Body, Motion, PlatformPhysics, Walker};
pub use outcome::{Outcome, OutcomeLatch, Reward, RewardKind, Verdict};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use spawner::{Countdown, Ramp, SpawnTimer, pick_band, place_with_retry};
pub use state::{
    Avatar, EntityId, Facing, GameEvent, Hud, IdAllocator, Paint, ParticleField, PickupLedger,
    Scene, Shape, SoundCue,
};
pub use vitals::{Checkpoint, Hit, LifeState, Vitals};
