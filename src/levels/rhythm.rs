//! Level 2: four-lane rhythm game
//!
//! Beats fall toward a hit zone at a fixed tempo. Pressing the lane key while a
//! beat's bottom edge is within tolerance of the zone scores a hit; a wrong
//! press or a beat that slips past costs half a hit.

use glam::Vec2;

use crate::sim::aabb::Aabb;
use crate::sim::engine::{Level, TickContext};
use crate::sim::input::Key;
use crate::sim::outcome::{Reward, RewardKind, Verdict};
use crate::sim::random::RandomSource;
use crate::sim::spawner::SpawnTimer;
use crate::sim::state::{EntityId, GameEvent, IdAllocator, Paint, Scene, Shape, SoundCue};
use crate::sim::vitals::Vitals;
use crate::tuning::RhythmTuning;

pub const LANE_KEYS: [Key; 4] = [Key::KeyA, Key::KeyS, Key::KeyD, Key::KeyF];

const ADJACENT_PAIRS: [(usize, usize); 3] = [(0, 1), (1, 2), (2, 3)];

/// Seconds a lane flash stays visible after a hit
const FLASH_SECS: f32 = 0.2;
/// Seconds the miss popup stays visible
const MISS_SECS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beat {
    pub id: EntityId,
    pub lane: usize,
    pub y: f32,
    pub double: bool,
}

pub struct Rhythm {
    tuning: RhythmTuning,
    viewport: Vec2,
    beats: Vec<Beat>,
    ids: IdAllocator,
    spawn_timer: SpawnTimer,
    hits: f32,
    time_left: f32,
    total_beats: u32,
    lane_flash: [f32; 4],
    miss_flash: f32,
}

impl Rhythm {
    pub fn new(tuning: RhythmTuning, viewport: Vec2) -> Self {
        Self {
            tuning,
            viewport,
            beats: Vec::new(),
            ids: IdAllocator::new(),
            spawn_timer: SpawnTimer::new(),
            hits: 0.0,
            time_left: tuning.time_limit,
            total_beats: 0,
            lane_flash: [0.0; 4],
            miss_flash: 0.0,
        }
    }

    pub fn hits(&self) -> f32 {
        self.hits
    }

    pub fn time_left(&self) -> f32 {
        self.time_left
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn total_beats(&self) -> u32 {
        self.total_beats
    }

    pub fn hit_zone_y(&self) -> f32 {
        self.viewport.y - self.tuning.hit_zone_offset
    }

    pub fn lane_x(&self, lane: usize) -> f32 {
        self.tuning.lane_fractions[lane.min(3)] * self.viewport.x
    }

    /// Drop a beat into `lane` at the top of the screen
    pub fn push_beat(&mut self, lane: usize, y: f32, double: bool) -> EntityId {
        let id = self.ids.next_id();
        self.beats.push(Beat {
            id,
            lane: lane.min(3),
            y,
            double,
        });
        self.total_beats += 1;
        id
    }

    fn beat_rect(&self, beat: &Beat) -> Aabb {
        let size = self.tuning.beat_size;
        Aabb::new(self.lane_x(beat.lane) - size / 2.0, beat.y, size, size)
    }

    fn penalize(&mut self, lane: usize, ctx: &mut TickContext) {
        self.hits = (self.hits - self.tuning.miss_penalty).max(0.0);
        self.miss_flash = MISS_SECS;
        ctx.emit(GameEvent::MissFeedback { lane });
        ctx.sound(SoundCue::BeatMiss);
    }

    /// Resolve one lane key press against the beats currently falling
    fn press(&mut self, lane: usize, ctx: &mut TickContext) {
        let zone = self.hit_zone_y();
        let size = self.tuning.beat_size;
        let tolerance = self.tuning.hit_tolerance;
        let target = self
            .beats
            .iter()
            .position(|b| b.lane == lane && (b.y + size - zone).abs() <= tolerance);
        match target {
            Some(index) => {
                let beat = self.beats.remove(index);
                if ctx.ledger.claim(beat.id) {
                    self.hits += 1.0;
                }
                self.lane_flash[lane] = FLASH_SECS;
                ctx.emit(GameEvent::HitFeedback { lane });
                ctx.sound(SoundCue::BeatHit);
            }
            None => self.penalize(lane, ctx),
        }
    }
}

impl Level for Rhythm {
    fn name(&self) -> &'static str {
        "rhythm"
    }

    fn reward(&self) -> Reward {
        Reward::new(
            "Moulin Rouge Memory",
            RewardKind::Photo,
            "/photos/level_2_win.jpeg",
        )
    }

    fn reward_delay(&self) -> f32 {
        self.tuning.reward_delay
    }

    fn reset(&mut self, _rng: &mut dyn RandomSource) {
        self.beats.clear();
        self.ids = IdAllocator::new();
        self.spawn_timer.reset();
        self.hits = 0.0;
        self.time_left = self.tuning.time_limit;
        self.total_beats = 0;
        self.lane_flash = [0.0; 4];
        self.miss_flash = 0.0;
    }

    fn advance_timers(&mut self, ctx: &mut TickContext) {
        self.time_left = (self.time_left - ctx.dt).max(0.0);
    }

    fn spawn(&mut self, ctx: &mut TickContext) {
        if !self.spawn_timer.tick(ctx.dt, self.tuning.beat_interval()) {
            return;
        }
        let elapsed = self.tuning.time_limit - self.time_left;
        let chance = self
            .tuning
            .double_chance
            .at_ratio(elapsed, self.tuning.time_limit);
        let top = -self.tuning.beat_size;

        if ctx.rng.chance(chance) {
            let (a, b) = if ctx.rng.chance(self.tuning.adjacent_pair_chance) {
                ADJACENT_PAIRS[ctx.rng.index(ADJACENT_PAIRS.len())]
            } else {
                let a = ctx.rng.index(4);
                // Any of the other three lanes
                let b = (a + 1 + ctx.rng.index(3)) % 4;
                (a, b)
            };
            self.push_beat(a, top, true);
            self.push_beat(b, top, true);
        } else {
            let lane = ctx.rng.index(4);
            self.push_beat(lane, top, false);
        }
    }

    fn integrate(&mut self, ctx: &mut TickContext) {
        let dy = self.tuning.fall_speed * ctx.dt;
        for beat in self.beats.iter_mut() {
            beat.y += dy;
        }
    }

    fn resolve(&mut self, ctx: &mut TickContext) {
        let input = ctx.input;
        for &key in input.pressed() {
            if let Some(lane) = LANE_KEYS.iter().position(|&k| k == key) {
                self.press(lane, ctx);
            }
        }

        let limit = self.hit_zone_y() + self.tuning.hit_tolerance * 2.0;
        let size = self.tuning.beat_size;
        let (missed, kept): (Vec<Beat>, Vec<Beat>) = std::mem::take(&mut self.beats)
            .into_iter()
            .partition(|b| b.y + size > limit);
        self.beats = kept;
        for beat in missed {
            self.penalize(beat.lane, ctx);
        }
    }

    fn evaluate(&self, _vitals: &Vitals) -> Verdict {
        if self.hits >= self.tuning.hits_needed {
            Verdict::Win
        } else if self.time_left <= 0.0 {
            Verdict::Lose
        } else {
            Verdict::Continue
        }
    }

    fn update_cosmetics(&mut self, dt: f32) {
        for flash in self.lane_flash.iter_mut() {
            *flash = (*flash - dt).max(0.0);
        }
        self.miss_flash = (self.miss_flash - dt).max(0.0);
    }

    fn scene(&self, _vitals: &Vitals) -> Scene {
        let mut scene = Scene::new(self.viewport);
        scene.push(Aabb::new(0.0, 0.0, self.viewport.x, self.viewport.y), Paint::Sky);
        let zone = self.hit_zone_y();
        let size = self.tuning.beat_size;
        for lane in 0..LANE_KEYS.len() {
            let x = self.lane_x(lane);
            scene.push(Aabb::new(x - 2.0, 0.0, 4.0, self.viewport.y), Paint::Lane);
            scene.push(Aabb::new(x - size / 2.0, zone - size / 2.0, size, size), Paint::HitZone);
            if self.lane_flash[lane] > 0.0 {
                let alpha = self.lane_flash[lane] / FLASH_SECS;
                let glow = Aabb::new(
                    x - size / 2.0 - 5.0,
                    zone - size / 2.0 - 5.0,
                    size + 10.0,
                    size + 10.0,
                );
                scene.shapes.push(Shape::new(glow, Paint::Flash).with_alpha(alpha));
            }
        }
        for beat in &self.beats {
            scene.push(self.beat_rect(beat), Paint::Beat);
        }
        scene.hud.score = self.hits;
        scene.hud.target = self.tuning.hits_needed;
        scene.hud.time_left = Some(self.time_left);
        scene.hud.caption = if self.miss_flash > 0.0 {
            "Miss!".to_string()
        } else {
            String::new()
        };
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::engine::SimulationEngine;
    use crate::sim::input::InputState;
    use crate::sim::outcome::Outcome;
    use crate::sim::random::ScriptedRandom;
    use crate::tuning::EngineTuning;

    fn engine(rng: ScriptedRandom) -> SimulationEngine<Rhythm, ScriptedRandom> {
        SimulationEngine::new(
            Rhythm::new(RhythmTuning::default(), Vec2::new(1280.0, 720.0)),
            rng,
            EngineTuning::default(),
        )
    }

    fn press(key: Key) -> InputState {
        let mut input = InputState::new();
        input.key_down(key);
        input
    }

    #[test]
    fn test_hit_within_window() {
        let mut e = engine(ScriptedRandom::constant(0.99));
        let zone = e.level().hit_zone_y();
        // Bottom edge 50 px above the zone
        e.level_mut().push_beat(1, zone - 50.0 - 60.0, false);

        let events = e.step(0.0, &press(Key::KeyS));
        assert_eq!(e.level().hits(), 1.0);
        assert!(e.level().beats().is_empty());
        assert!(events.contains(&GameEvent::HitFeedback { lane: 1 }));
    }

    #[test]
    fn test_press_without_beat_costs_half() {
        let mut e = engine(ScriptedRandom::constant(0.99));
        e.level_mut().hits = 3.0;
        let events = e.step(0.0, &press(Key::KeyF));
        assert_eq!(e.level().hits(), 2.5);
        assert!(events.contains(&GameEvent::MissFeedback { lane: 3 }));
    }

    #[test]
    fn test_miss_penalty_floors_at_zero() {
        let mut e = engine(ScriptedRandom::constant(0.99));
        e.step(0.0, &press(Key::KeyA));
        assert_eq!(e.level().hits(), 0.0);
    }

    #[test]
    fn test_beat_in_other_lane_does_not_count() {
        let mut e = engine(ScriptedRandom::constant(0.99));
        let zone = e.level().hit_zone_y();
        e.level_mut().push_beat(0, zone - 60.0, false);
        e.step(0.0, &press(Key::KeyD));
        assert_eq!(e.level().hits(), 0.0);
        assert_eq!(e.level().beats().len(), 1);
    }

    #[test]
    fn test_beat_past_zone_is_a_miss() {
        let mut e = engine(ScriptedRandom::constant(0.99));
        e.level_mut().hits = 2.0;
        let zone = e.level().hit_zone_y();
        e.level_mut().push_beat(2, zone + 160.0 - 60.0 - 1.0, false);
        let events = e.step(0.01, &InputState::new());
        assert!(e.level().beats().iter().all(|b| b.lane != 2 || b.y < zone));
        assert_eq!(e.level().hits(), 1.5);
        assert!(events.contains(&GameEvent::MissFeedback { lane: 2 }));
    }

    #[test]
    fn test_spawn_follows_tempo() {
        // 0.99 never rolls a double
        let mut e = engine(ScriptedRandom::constant(0.99));
        let input = InputState::new();
        for _ in 0..60 {
            e.step(1.0 / 60.0, &input);
        }
        // 1 s at 135 bpm
        assert_eq!(e.level().total_beats(), 2);
        assert!(e.level().beats().iter().all(|b| !b.double && b.lane == 3));
    }

    #[test]
    fn test_double_note_lanes_distinct() {
        // chance roll, adjacent roll (fails), first lane, offset
        let mut e = engine(ScriptedRandom::new([0.0, 0.9, 0.6, 0.1]));
        // Five capped ticks cross the first beat interval
        for _ in 0..5 {
            e.step(0.1, &InputState::new());
        }
        let beats = e.level().beats();
        assert_eq!(beats.len(), 2);
        assert!(beats.iter().all(|b| b.double));
        assert_ne!(beats[0].lane, beats[1].lane);
        assert_eq!((beats[0].lane, beats[1].lane), (2, 3));
    }

    #[test]
    fn test_adjacent_pair() {
        let mut e = engine(ScriptedRandom::new([0.0, 0.1, 0.5]));
        // Five capped ticks cross the first beat interval
        for _ in 0..5 {
            e.step(0.1, &InputState::new());
        }
        let lanes: Vec<usize> = e.level().beats().iter().map(|b| b.lane).collect();
        assert_eq!(lanes, vec![1, 2]);
    }

    #[test]
    fn test_timeout_is_game_over() {
        let mut e = engine(ScriptedRandom::constant(0.99));
        let input = InputState::new();
        for _ in 0..700 {
            e.step(0.1, &input);
        }
        assert_eq!(e.outcome(), Outcome::GameOver);
        assert_eq!(e.level().time_left(), 0.0);
    }

    #[test]
    fn test_target_hits_win_immediately() {
        let mut e = engine(ScriptedRandom::constant(0.99));
        e.level_mut().hits = 74.0;
        let zone = e.level().hit_zone_y();
        e.level_mut().push_beat(0, zone - 60.0, false);
        e.step(0.0, &press(Key::KeyA));
        assert_eq!(e.outcome(), Outcome::Completed);
    }
}
