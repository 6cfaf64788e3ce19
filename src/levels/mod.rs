//! The five minigames
//!
//! Each level is a [`Level`] strategy; [`AnyLevel`] lets the hub hold whichever
//! one is running without boxing.

pub mod boss;
pub mod collector;
pub mod platformer;
pub mod puzzle;
pub mod rhythm;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::engine::{Level, TickContext};
use crate::sim::outcome::{Reward, Verdict};
use crate::sim::random::RandomSource;
use crate::sim::state::Scene;
use crate::sim::vitals::Vitals;
use crate::tuning::Tuning;

pub use boss::BossFight;
pub use collector::Collector;
pub use platformer::Platformer;
pub use puzzle::Puzzle;
pub use rhythm::Rhythm;

/// Hub numbering of the minigames (1-based, unlocked in order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LevelId {
    Platformer = 1,
    Rhythm = 2,
    Puzzle = 3,
    Collector = 4,
    Boss = 5,
}

impl LevelId {
    pub const ALL: [LevelId; 5] = [
        LevelId::Platformer,
        LevelId::Rhythm,
        LevelId::Puzzle,
        LevelId::Collector,
        LevelId::Boss,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    /// Level that must be finished before this one unlocks
    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            LevelId::Platformer => "How We Met",
            LevelId::Rhythm => "Moulin Rouge",
            LevelId::Puzzle => "Puzzle of Us",
            LevelId::Collector => "Twenty Stars",
            LevelId::Boss => "Chaos Subsided",
        }
    }
}

impl TryFrom<u8> for LevelId {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        LevelId::from_number(n).ok_or_else(|| format!("unknown level {}", n))
    }
}

impl From<LevelId> for u8 {
    fn from(id: LevelId) -> u8 {
        id.number()
    }
}

/// Any one of the minigames
pub enum AnyLevel {
    Platformer(Platformer),
    Rhythm(Rhythm),
    Puzzle(Puzzle),
    Collector(Collector),
    Boss(BossFight),
}

impl AnyLevel {
    pub fn new(id: LevelId, tuning: &Tuning) -> Self {
        let viewport = tuning.engine.viewport();
        match id {
            LevelId::Platformer => AnyLevel::Platformer(Platformer::new(tuning.platformer, viewport)),
            LevelId::Rhythm => AnyLevel::Rhythm(Rhythm::new(tuning.rhythm, viewport)),
            LevelId::Puzzle => AnyLevel::Puzzle(Puzzle::new(tuning.puzzle, viewport)),
            LevelId::Collector => AnyLevel::Collector(Collector::new(tuning.collector, viewport)),
            LevelId::Boss => AnyLevel::Boss(BossFight::new(tuning.boss, viewport)),
        }
    }

    pub fn id(&self) -> LevelId {
        match self {
            AnyLevel::Platformer(_) => LevelId::Platformer,
            AnyLevel::Rhythm(_) => LevelId::Rhythm,
            AnyLevel::Puzzle(_) => LevelId::Puzzle,
            AnyLevel::Collector(_) => LevelId::Collector,
            AnyLevel::Boss(_) => LevelId::Boss,
        }
    }

    fn inner(&self) -> &dyn Level {
        match self {
            AnyLevel::Platformer(l) => l,
            AnyLevel::Rhythm(l) => l,
            AnyLevel::Puzzle(l) => l,
            AnyLevel::Collector(l) => l,
            AnyLevel::Boss(l) => l,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Level {
        match self {
            AnyLevel::Platformer(l) => l,
            AnyLevel::Rhythm(l) => l,
            AnyLevel::Puzzle(l) => l,
            AnyLevel::Collector(l) => l,
            AnyLevel::Boss(l) => l,
        }
    }
}

impl Level for AnyLevel {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn reward(&self) -> Reward {
        self.inner().reward()
    }

    fn reward_delay(&self) -> f32 {
        self.inner().reward_delay()
    }

    fn spawn_anchor(&self) -> Option<Vec2> {
        self.inner().spawn_anchor()
    }

    fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.inner_mut().reset(rng)
    }

    fn advance_timers(&mut self, ctx: &mut TickContext) {
        self.inner_mut().advance_timers(ctx)
    }

    fn spawn(&mut self, ctx: &mut TickContext) {
        self.inner_mut().spawn(ctx)
    }

    fn integrate(&mut self, ctx: &mut TickContext) {
        self.inner_mut().integrate(ctx)
    }

    fn resolve(&mut self, ctx: &mut TickContext) {
        self.inner_mut().resolve(ctx)
    }

    fn evaluate(&self, vitals: &Vitals) -> Verdict {
        self.inner().evaluate(vitals)
    }

    fn update_cosmetics(&mut self, dt: f32) {
        self.inner_mut().update_cosmetics(dt)
    }

    fn scene(&self, vitals: &Vitals) -> Scene {
        self.inner().scene(vitals)
    }
}

/// Blink phase for an invincible avatar (visible half the time at 6 Hz)
pub(crate) fn blink_visible(vitals: &Vitals) -> bool {
    !vitals.is_invincible() || ((vitals.invincibility_left() * 6.0) as u32) % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_numbers() {
        for (i, id) in LevelId::ALL.iter().enumerate() {
            assert_eq!(id.number() as usize, i + 1);
            assert_eq!(LevelId::from_number(id.number()), Some(*id));
        }
        assert_eq!(LevelId::from_number(0), None);
        assert_eq!(LevelId::from_number(6), None);
        assert_eq!(LevelId::Platformer.previous(), None);
        assert_eq!(LevelId::Boss.previous(), Some(LevelId::Collector));
    }

    #[test]
    fn test_level_id_serializes_as_number() {
        let json = serde_json::to_string(&LevelId::Puzzle).expect("serialize");
        assert_eq!(json, "3");
        let back: LevelId = serde_json::from_str("3").expect("parse");
        assert_eq!(back, LevelId::Puzzle);
        assert!(serde_json::from_str::<LevelId>("9").is_err());
    }

    #[test]
    fn test_any_level_reports_id() {
        let tuning = Tuning::default();
        for id in LevelId::ALL {
            let level = AnyLevel::new(id, &tuning);
            assert_eq!(level.id(), id);
            assert!(!level.reward().title.is_empty());
        }
    }
}
