//! Level 5: two-lane boss fight
//!
//! The player runs along one of two lanes at the bottom of the screen and
//! shoots upward at a boss that strafes across the top. The boss answers with
//! taxis, pigeons and shockwaves, faster once it is down to half health.

use glam::Vec2;

use super::blink_visible;
use crate::sim::aabb::Aabb;
use crate::sim::engine::{Level, TickContext};
use crate::sim::input::Key;
use crate::sim::outcome::{Reward, RewardKind, Verdict};
use crate::sim::random::RandomSource;
use crate::sim::spawner::{Countdown, pick_band};
use crate::sim::state::{Avatar, Facing, Paint, ParticleField, Scene, SoundCue};
use crate::sim::vitals::Vitals;
use crate::tuning::BossTuning;

const UP: [Key; 2] = [Key::ArrowUp, Key::KeyW];
const DOWN: [Key; 2] = [Key::ArrowDown, Key::KeyS];

/// Draw forced when a lane blocker is already on screen (pigeon band)
const BLOCKER_REROLL: f32 = 0.6;
/// Taxis queue this far outside the screen edge
const TAXI_QUEUE_OFFSET: f32 = 150.0;
/// Hazards are dropped once this far off either side
const CULL_MARGIN_X: f32 = 400.0;
const CULL_MARGIN_Y: f32 = 50.0;
const PLAYER_LANE_INSET: f32 = 15.0;
const TAXI_LANE_INSET: f32 = 20.0;
const HIT_PARTICLES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Bottom,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HazardKind {
    /// Parked off screen until `warmup` runs out
    Taxi { lane: Lane, warmup: Countdown, speed: f32 },
    Pigeon { vel: Vec2 },
    /// Telegraphed for `warning`, then dangerous for `active`
    Shockwave { lane: Lane, warning: Countdown, active: Countdown },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hazard {
    /// Attack that produced this hazard
    pub wave: u32,
    pub bounds: Aabb,
    pub kind: HazardKind,
}

impl Hazard {
    /// Taxis and shockwaves close a lane; never two attacks of them at once
    pub fn is_blocker(&self) -> bool {
        matches!(self.kind, HazardKind::Taxi { .. } | HazardKind::Shockwave { .. })
    }

    fn hits(&self, player: &Aabb, player_lane: Lane) -> bool {
        match self.kind {
            HazardKind::Taxi { lane, .. } => lane == player_lane && self.bounds.intersects(player),
            HazardKind::Pigeon { .. } => self.bounds.intersects(player),
            HazardKind::Shockwave { lane, warning, active } => {
                !warning.is_running() && active.is_running() && lane == player_lane
            }
        }
    }

    fn is_spent(&self, viewport: Vec2) -> bool {
        if let HazardKind::Shockwave { warning, active, .. } = self.kind {
            return !warning.is_running() && !active.is_running();
        }
        let x = self.bounds.left();
        x < -CULL_MARGIN_X || x > viewport.x + CULL_MARGIN_X || self.bounds.top() >= viewport.y + CULL_MARGIN_Y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boss {
    pub bounds: Aabb,
    /// +1 right, -1 left
    pub dir: f32,
    pub health: u32,
    pub enraged: bool,
}

pub struct BossFight {
    tuning: BossTuning,
    viewport: Vec2,
    player_x: f32,
    lane: Lane,
    facing: Facing,
    moving_for: f32,
    fire_cooldown: f32,
    projectiles: Vec<Aabb>,
    pub boss: Boss,
    attack_timer: f32,
    hazards: Vec<Hazard>,
    waves: u32,
    particles: ParticleField,
}

impl BossFight {
    pub fn new(tuning: BossTuning, viewport: Vec2) -> Self {
        Self {
            tuning,
            viewport,
            player_x: viewport.x / 2.0,
            lane: Lane::Bottom,
            facing: Facing::Idle,
            moving_for: 0.0,
            fire_cooldown: 0.0,
            projectiles: Vec::new(),
            boss: fresh_boss(&tuning, viewport),
            attack_timer: 0.0,
            hazards: Vec::new(),
            waves: 0,
            particles: ParticleField::new(),
        }
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    pub fn projectiles(&self) -> &[Aabb] {
        &self.projectiles
    }

    /// 1 until the boss drops to half health, then 2 for good
    pub fn phase(&self) -> u8 {
        if self.boss.enraged { 2 } else { 1 }
    }

    pub fn lane_y(&self, lane: Lane) -> f32 {
        match lane {
            Lane::Bottom => self.viewport.y - self.tuning.bottom_lane_offset,
            Lane::Top => self.viewport.y - self.tuning.top_lane_offset,
        }
    }

    pub fn player_rect(&self) -> Aabb {
        Aabb::new(
            self.player_x,
            self.lane_y(self.lane) + PLAYER_LANE_INSET,
            self.tuning.player_size,
            self.tuning.player_size,
        )
    }

    fn phase_index(&self) -> usize {
        usize::from(self.boss.enraged)
    }

    fn random_lane(rng: &mut dyn RandomSource) -> Lane {
        if rng.uniform() > 0.5 { Lane::Bottom } else { Lane::Top }
    }

    /// Launch one boss attack
    pub fn attack(&mut self, rng: &mut dyn RandomSource) {
        let bands = [self.tuning.attack_bands[0], self.tuning.attack_bands[1], f32::INFINITY];
        let mut roll = rng.uniform();
        if self.hazards.iter().any(Hazard::is_blocker) {
            roll = BLOCKER_REROLL;
        }
        self.waves += 1;
        match pick_band(roll, &bands) {
            0 => self.send_taxis(rng),
            1 => self.send_pigeons(rng),
            _ => self.send_shockwave(rng),
        }
    }

    fn send_taxis(&mut self, rng: &mut dyn RandomSource) {
        let phase = self.phase_index();
        let lane = Self::random_lane(rng);
        let from_left = rng.chance(0.5);
        let speed = self.tuning.taxi_speed[phase];
        let y = self.lane_y(lane) + TAXI_LANE_INSET;
        for i in 0..self.tuning.taxi_count[phase] {
            let queue = TAXI_QUEUE_OFFSET + i as f32 * self.tuning.taxi_spacing;
            let (x, speed) = if from_left {
                (-queue, speed)
            } else {
                (self.viewport.x + queue, -speed)
            };
            self.hazards.push(Hazard {
                wave: self.waves,
                bounds: Aabb::from_pos_size(Vec2::new(x, y), self.tuning.taxi_size),
                kind: HazardKind::Taxi {
                    lane,
                    warmup: Countdown::new(self.tuning.taxi_warmup),
                    speed,
                },
            });
        }
        log::debug!("taxi attack on {:?} lane", lane);
    }

    fn send_pigeons(&mut self, rng: &mut dyn RandomSource) {
        let phase = self.phase_index();
        let size = Vec2::splat(self.tuning.pigeon_size);
        for _ in 0..self.tuning.pigeon_count[phase] {
            let pos = Vec2::new(rng.uniform() * self.viewport.x, -50.0 - rng.uniform() * 200.0);
            let vel = Vec2::new(
                (rng.uniform() - 0.5) * self.tuning.pigeon_drift,
                self.tuning.pigeon_fall[phase],
            );
            self.hazards.push(Hazard {
                wave: self.waves,
                bounds: Aabb::from_pos_size(pos, size),
                kind: HazardKind::Pigeon { vel },
            });
        }
    }

    fn send_shockwave(&mut self, rng: &mut dyn RandomSource) {
        let lane = Self::random_lane(rng);
        self.hazards.push(Hazard {
            wave: self.waves,
            bounds: Aabb::new(0.0, self.lane_y(lane), self.viewport.x, self.tuning.lane_height),
            kind: HazardKind::Shockwave {
                lane,
                warning: Countdown::new(self.tuning.shockwave_warning),
                active: Countdown::new(self.tuning.shockwave_active),
            },
        });
        log::debug!("shockwave warning on {:?} lane", lane);
    }

    fn fire(&mut self) {
        let size = self.tuning.projectile_size;
        let x = self.player_x + self.tuning.player_size / 2.0 - size.x / 2.0;
        let y = self.lane_y(self.lane) + PLAYER_LANE_INSET;
        self.projectiles.push(Aabb::from_pos_size(Vec2::new(x, y), size));
        self.fire_cooldown = self.tuning.fire_cooldown;
    }

    fn damage_boss(&mut self, ctx: &mut TickContext) {
        self.boss.health = self.boss.health.saturating_sub(1);
        ctx.sound(SoundCue::BossHit);
        let centre = self.boss.bounds.center();
        self.particles.burst(centre, HIT_PARTICLES);
        if !self.boss.enraged && self.boss.health <= self.tuning.boss_health / 2 {
            self.boss.enraged = true;
            ctx.sound(SoundCue::BossPhase);
            log::info!("boss enraged at {} health", self.boss.health);
        }
    }
}

fn fresh_boss(tuning: &BossTuning, viewport: Vec2) -> Boss {
    Boss {
        bounds: Aabb::from_pos_size(
            Vec2::new(viewport.x / 2.0 - tuning.boss_size.x / 2.0, tuning.boss_y),
            tuning.boss_size,
        ),
        dir: 1.0,
        health: tuning.boss_health,
        enraged: false,
    }
}

impl Level for BossFight {
    fn name(&self) -> &'static str {
        "boss"
    }

    fn reward(&self) -> Reward {
        Reward::new(
            "Chaos Subsided",
            RewardKind::Text,
            "NYC is crazy, but we conquered it together!",
        )
    }

    fn reward_delay(&self) -> f32 {
        self.tuning.reward_delay
    }

    fn reset(&mut self, _rng: &mut dyn RandomSource) {
        self.player_x = self.viewport.x / 2.0;
        self.lane = Lane::Bottom;
        self.facing = Facing::Idle;
        self.moving_for = 0.0;
        self.fire_cooldown = 0.0;
        self.projectiles.clear();
        self.boss = fresh_boss(&self.tuning, self.viewport);
        self.attack_timer = 0.0;
        self.hazards.clear();
        self.waves = 0;
        self.particles.clear();
    }

    fn advance_timers(&mut self, ctx: &mut TickContext) {
        let dt = ctx.dt;
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        self.attack_timer -= dt;
        for hazard in self.hazards.iter_mut() {
            match &mut hazard.kind {
                HazardKind::Taxi { warmup, .. } => {
                    warmup.tick(dt);
                }
                HazardKind::Shockwave { warning, active, .. } => {
                    if warning.is_running() {
                        warning.tick(dt);
                    } else {
                        active.tick(dt);
                    }
                }
                HazardKind::Pigeon { .. } => {}
            }
        }
    }

    fn spawn(&mut self, ctx: &mut TickContext) {
        if self.attack_timer <= 0.0 {
            self.attack_timer = self.tuning.attack_interval[self.phase_index()];
            self.attack(&mut *ctx.rng);
        }
        if ctx.input.is_held(Key::Space) && self.fire_cooldown <= 0.0 {
            self.fire();
            ctx.sound(SoundCue::Shoot);
        }
    }

    fn integrate(&mut self, ctx: &mut TickContext) {
        let dt = ctx.dt;
        let input = ctx.input;

        let axis = input.horizontal();
        let max_x = (self.viewport.x - self.tuning.player_size).max(0.0);
        self.player_x = (self.player_x + axis * self.tuning.player_speed * dt).clamp(0.0, max_x);
        let facing = match axis {
            a if a < 0.0 => Facing::Left,
            a if a > 0.0 => Facing::Right,
            _ => Facing::Idle,
        };
        self.moving_for = if facing == self.facing && facing != Facing::Idle {
            self.moving_for + dt
        } else {
            0.0
        };
        self.facing = facing;

        if input.any_held(&UP) {
            self.lane = Lane::Top;
        } else if input.any_held(&DOWN) {
            self.lane = Lane::Bottom;
        }

        let rise = self.tuning.projectile_speed * dt;
        for shot in self.projectiles.iter_mut() {
            shot.pos.y -= rise;
        }

        let margin = self.tuning.boss_margin;
        let boss = &mut self.boss;
        boss.bounds.pos.x += self.tuning.boss_speed * boss.dir * dt;
        if boss.bounds.left() <= margin {
            boss.dir = 1.0;
        } else if boss.bounds.right() >= self.viewport.x - margin {
            boss.dir = -1.0;
        }

        for hazard in self.hazards.iter_mut() {
            match hazard.kind {
                HazardKind::Taxi { warmup, speed, .. } if !warmup.is_running() => {
                    hazard.bounds.pos.x += speed * dt;
                }
                HazardKind::Pigeon { vel } => hazard.bounds.pos += vel * dt,
                _ => {}
            }
        }
    }

    fn resolve(&mut self, ctx: &mut TickContext) {
        let boss = self.boss.bounds;
        let before = self.projectiles.len();
        self.projectiles.retain(|shot| !shot.intersects(&boss));
        for _ in self.projectiles.len()..before {
            if self.boss.health > 0 {
                self.damage_boss(ctx);
            }
        }
        self.projectiles.retain(|shot| shot.top() > -CULL_MARGIN_Y);

        let player = self.player_rect();
        if self.hazards.iter().any(|h| h.hits(&player, self.lane)) {
            ctx.hit();
        }

        let viewport = self.viewport;
        self.hazards.retain(|h| !h.is_spent(viewport));
    }

    fn evaluate(&self, vitals: &Vitals) -> Verdict {
        if self.boss.health == 0 {
            Verdict::Win
        } else if vitals.is_dead() {
            Verdict::Lose
        } else {
            Verdict::Continue
        }
    }

    fn update_cosmetics(&mut self, dt: f32) {
        self.particles.update(dt);
    }

    fn scene(&self, vitals: &Vitals) -> Scene {
        let mut scene = Scene::new(self.viewport);
        scene.push(Aabb::new(0.0, 0.0, self.viewport.x, self.viewport.y), Paint::Sky);
        for lane in [Lane::Bottom, Lane::Top] {
            scene.push(
                Aabb::new(0.0, self.lane_y(lane), self.viewport.x, self.tuning.lane_height),
                Paint::Lane,
            );
        }
        let boss_paint = if self.boss.enraged { Paint::BossEnraged } else { Paint::Boss };
        scene.push(self.boss.bounds, boss_paint);
        for shot in &self.projectiles {
            scene.push(*shot, Paint::Projectile);
        }
        for hazard in &self.hazards {
            let paint = match hazard.kind {
                HazardKind::Taxi { .. } => Paint::Taxi,
                HazardKind::Pigeon { .. } => Paint::Pigeon,
                HazardKind::Shockwave { warning, .. } if warning.is_running() => Paint::Warning,
                HazardKind::Shockwave { .. } => Paint::Shockwave,
            };
            scene.push(hazard.bounds, paint);
        }
        scene.avatar = Some(Avatar {
            rect: self.player_rect(),
            facing: self.facing,
            moving_for: self.moving_for,
            visible: blink_visible(vitals),
        });
        self.particles.draw(&mut scene);
        scene.hud.score = self.boss.health as f32;
        scene.hud.target = self.tuning.boss_health as f32;
        scene.hud.caption = format!("Phase {}", self.phase());
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::engine::SimulationEngine;
    use crate::sim::input::InputState;
    use crate::sim::outcome::Outcome;
    use crate::sim::random::{ScriptedRandom, SeededRandom};
    use crate::sim::state::GameEvent;
    use crate::tuning::EngineTuning;
    use proptest::prelude::*;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    fn engine<R: RandomSource>(rng: R) -> SimulationEngine<BossFight, R> {
        SimulationEngine::new(BossFight::new(BossTuning::default(), VIEWPORT), rng, EngineTuning::default())
    }

    /// A projectile already overlapping the boss
    fn shot_on_boss(e: &mut SimulationEngine<BossFight, ScriptedRandom>) {
        let boss = e.level().boss.bounds;
        let shot = Aabb::from_pos_size(boss.center(), Vec2::new(10.0, 20.0));
        e.level_mut().projectiles.push(shot);
    }

    fn quiet(e: &mut SimulationEngine<BossFight, ScriptedRandom>) {
        e.level_mut().hazards.clear();
        e.level_mut().attack_timer = 100.0;
    }

    #[test]
    fn test_projectile_deals_one_damage() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        quiet(&mut e);
        shot_on_boss(&mut e);
        let events = e.step(0.0, &InputState::new());
        assert_eq!(e.level().boss.health, 49);
        assert!(e.level().projectiles().is_empty());
        assert!(events.contains(&GameEvent::Sound(SoundCue::BossHit)));
    }

    #[test]
    fn test_phase_two_latches_at_half_health() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        quiet(&mut e);
        e.level_mut().boss.health = 27;
        shot_on_boss(&mut e);
        e.step(0.0, &InputState::new());
        assert_eq!(e.level().phase(), 1);
        assert_eq!(e.level().boss.health, 26);
        shot_on_boss(&mut e);
        let events = e.step(0.0, &InputState::new());
        assert_eq!(e.level().phase(), 2);
        assert!(events.contains(&GameEvent::Sound(SoundCue::BossPhase)));

        // Never flips back
        e.level_mut().boss.health = 40;
        e.step(0.0, &InputState::new());
        assert_eq!(e.level().phase(), 2);
    }

    #[test]
    fn test_fire_rate_limited() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        quiet(&mut e);
        let mut input = InputState::new();
        input.key_down(Key::Space);
        let shots = |events: Vec<GameEvent>| {
            events
                .iter()
                .filter(|ev| **ev == GameEvent::Sound(SoundCue::Shoot))
                .count()
        };
        let mut fired = shots(e.step(0.05, &input));
        fired += shots(e.step(0.05, &input));
        assert_eq!(fired, 1);
        for _ in 0..4 {
            fired += shots(e.step(0.1, &input));
        }
        assert!((2..=3).contains(&fired));
    }

    #[test]
    fn test_lane_switch() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        quiet(&mut e);
        let mut input = InputState::new();
        input.key_down(Key::KeyW);
        e.step(0.0, &input);
        assert_eq!(e.level().lane(), Lane::Top);
        assert_eq!(e.level().player_rect().top(), 720.0 - 160.0 + 15.0);
        let mut input = InputState::new();
        input.key_down(Key::ArrowDown);
        e.step(0.0, &input);
        assert_eq!(e.level().lane(), Lane::Bottom);
    }

    #[test]
    fn test_shockwave_hits_only_its_lane_once_active() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        quiet(&mut e);
        let top = e.level().lane_y(Lane::Top);
        e.level_mut().hazards.push(Hazard {
            wave: 1,
            bounds: Aabb::new(0.0, top, 1280.0, 80.0),
            kind: HazardKind::Shockwave {
                lane: Lane::Top,
                warning: Countdown::new(0.0),
                active: Countdown::new(0.5),
            },
        });
        e.step(0.01, &InputState::new());
        assert_eq!(e.vitals().lives(), 3);

        let bottom = e.level().lane_y(Lane::Bottom);
        e.level_mut().hazards.push(Hazard {
            wave: 2,
            bounds: Aabb::new(0.0, bottom, 1280.0, 80.0),
            kind: HazardKind::Shockwave {
                lane: Lane::Bottom,
                warning: Countdown::new(1.0),
                active: Countdown::new(0.5),
            },
        });
        e.step(0.1, &InputState::new());
        assert_eq!(e.vitals().lives(), 3);
        for _ in 0..10 {
            e.step(0.1, &InputState::new());
        }
        assert_eq!(e.vitals().lives(), 2);
        // Player stays put on a lane hit
        assert_eq!(e.level().player_rect().left(), 640.0);
    }

    #[test]
    fn test_blocker_forces_pigeons() {
        let mut level = BossFight::new(BossTuning::default(), VIEWPORT);
        let mut rng = ScriptedRandom::constant(0.1);
        level.attack(&mut rng);
        assert_eq!(level.hazards().len(), 1);
        assert!(matches!(level.hazards()[0].kind, HazardKind::Taxi { .. }));
        level.attack(&mut rng);
        let pigeons = level
            .hazards()
            .iter()
            .filter(|h| matches!(h.kind, HazardKind::Pigeon { .. }))
            .count();
        assert_eq!(pigeons, 2);
        assert_eq!(level.hazards().iter().filter(|h| h.is_blocker()).count(), 1);
    }

    #[test]
    fn test_phase_two_sends_more_taxis() {
        let mut level = BossFight::new(BossTuning::default(), VIEWPORT);
        level.boss.enraged = true;
        // Taxi band, top lane, from the right
        let mut rng = ScriptedRandom::new([0.1, 0.2, 0.9]);
        level.attack(&mut rng);
        let taxis: Vec<&Hazard> = level.hazards().iter().collect();
        assert_eq!(taxis.len(), 2);
        assert_eq!(taxis[0].bounds.left(), 1280.0 + 150.0);
        assert_eq!(taxis[1].bounds.left(), 1280.0 + 400.0);
        assert!(matches!(taxis[0].kind, HazardKind::Taxi { lane: Lane::Top, speed, .. } if speed == -450.0));
    }

    #[test]
    fn test_boss_bounces_off_margin() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        quiet(&mut e);
        e.level_mut().boss.bounds.pos.x = 1280.0 - 50.0 - 200.0 - 1.0;
        e.step(0.1, &InputState::new());
        assert_eq!(e.level().boss.dir, -1.0);
        e.level_mut().boss.bounds.pos.x = 51.0;
        e.step(0.1, &InputState::new());
        assert_eq!(e.level().boss.dir, 1.0);
    }

    #[test]
    fn test_last_hit_wins_and_delivers_reward() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        quiet(&mut e);
        e.level_mut().boss.health = 1;
        shot_on_boss(&mut e);
        let completions = |events: Vec<GameEvent>| {
            events
                .iter()
                .filter(|ev| matches!(ev, GameEvent::LevelComplete(_)))
                .count()
        };
        let mut rewards = completions(e.step(0.0, &InputState::new()));
        assert_eq!(e.outcome(), Outcome::Completed);
        // Run long past the reward delay
        for _ in 0..80 {
            rewards += completions(e.step(0.1, &InputState::new()));
        }
        assert_eq!(rewards, 1);
        assert_eq!(e.outcome(), Outcome::Completed);
    }

    #[test]
    fn test_three_hits_game_over() {
        let mut e = engine(ScriptedRandom::constant(0.5));
        quiet(&mut e);
        let player = e.level().player_rect();
        e.level_mut().hazards.push(Hazard {
            wave: 1,
            bounds: player,
            kind: HazardKind::Pigeon { vel: Vec2::ZERO },
        });
        for _ in 0..100 {
            e.step(0.1, &InputState::new());
        }
        assert_eq!(e.vitals().lives(), 0);
        assert_eq!(e.outcome(), Outcome::GameOver);
    }

    proptest! {
        #[test]
        fn prop_never_two_blocker_waves(seed in any::<u64>()) {
            let mut e = engine(SeededRandom::new(seed));
            let input = InputState::new();
            for _ in 0..300 {
                e.step(0.1, &input);
                let mut waves: Vec<u32> = e
                    .level()
                    .hazards()
                    .iter()
                    .filter(|h| h.is_blocker())
                    .map(|h| h.wave)
                    .collect();
                waves.dedup();
                prop_assert!(waves.len() <= 1);
            }
        }
    }
}
