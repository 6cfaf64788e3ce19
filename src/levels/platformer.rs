//! Level 1: side-scrolling platformer
//!
//! Collect every heart and reach the goal tower. Spikes, patrol blocks and
//! falling off the world cost a life and respawn the player at the last
//! checkpoint.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;

use super::blink_visible;
use crate::sim::aabb::Aabb;
use crate::sim::engine::{Level, TickContext};
use crate::sim::input::Key;
use crate::sim::motion::{Body, Motion, Walker};
use crate::sim::outcome::{Reward, RewardKind, Verdict};
use crate::sim::random::RandomSource;
use crate::sim::state::{Avatar, EntityId, Facing, Paint, Scene, SoundCue};
use crate::sim::vitals::{Checkpoint, Vitals, activate_checkpoints};
use crate::tuning::PlatformerTuning;

const LEFT: [Key; 2] = [Key::ArrowLeft, Key::KeyA];
const RIGHT: [Key; 2] = [Key::ArrowRight, Key::KeyD];
const JUMP: [Key; 3] = [Key::Space, Key::ArrowUp, Key::KeyW];

/// Heart motion rates (rad/s)
const FLOAT_RATE: f32 = 3.0;
const SWAY_RATE: f32 = 1.8;
const ORBIT_RATE: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    Spike,
    PatrolBlock,
}

#[derive(Debug, Clone, Copy)]
pub struct Hazard {
    pub kind: HazardKind,
    base: Aabb,
    motion: Motion,
    pub bounds: Aabb,
}

#[derive(Debug, Clone, Copy)]
pub struct Heart {
    pub id: EntityId,
    base: Vec2,
    motion: Motion,
    pub pos: Vec2,
}

impl Heart {
    fn hitbox(&self, size: f32) -> Aabb {
        Aabb::from_pos_size(self.pos, Vec2::splat(size))
    }
}

pub struct Platformer {
    tuning: PlatformerTuning,
    viewport: Vec2,
    width: f32,
    height: f32,
    pub player: Walker,
    facing: Facing,
    moving_for: f32,
    platforms: Vec<Aabb>,
    checkpoints: Vec<Checkpoint>,
    hazards: Vec<Hazard>,
    hearts: Vec<Heart>,
    hearts_collected: u32,
    /// Seconds since the attempt started (drives motion patterns)
    time: f32,
}

impl Platformer {
    pub fn new(tuning: PlatformerTuning, viewport: Vec2) -> Self {
        let width = viewport.x * tuning.width_screens;
        let height = viewport.y;
        Self {
            tuning,
            viewport,
            width,
            height,
            player: Walker::default(),
            facing: Facing::Idle,
            moving_for: 0.0,
            platforms: Vec::new(),
            checkpoints: Vec::new(),
            hazards: Vec::new(),
            hearts: Vec::new(),
            hearts_collected: 0,
            time: 0.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn hearts_collected(&self) -> u32 {
        self.hearts_collected
    }

    pub fn hearts_left(&self) -> usize {
        self.hearts.len()
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    fn start_position(&self) -> Vec2 {
        Vec2::new(self.tuning.start_x, self.height - self.tuning.start_height)
    }

    /// Camera follows the player, clamped to the level
    pub fn camera_x(&self) -> f32 {
        let max = (self.width - self.viewport.x).max(0.0);
        (self.player.body.pos.x - self.viewport.x / 2.0).clamp(0.0, max)
    }

    fn build_layout(&mut self) {
        let lw = self.width;
        let h = self.height;
        let plat = |fx: f32, dy: f32, fw: f32, ph: f32| Aabb::new(lw * fx, h - dy, lw * fw, ph);

        self.platforms = vec![
            plat(0.00, 100.0, 0.10, 100.0),
            // The climb
            plat(0.13, 210.0, 0.05, 30.0),
            plat(0.08, 320.0, 0.05, 30.0),
            plat(0.15, 430.0, 0.04, 30.0),
            // The descent
            plat(0.25, 350.0, 0.04, 30.0),
            plat(0.30, 250.0, 0.08, 30.0),
            // The grid
            plat(0.42, 250.0, 0.04, 30.0),
            plat(0.49, 200.0, 0.04, 30.0),
            plat(0.56, 280.0, 0.04, 30.0),
            // The gauntlet
            plat(0.65, 200.0, 0.10, 40.0),
            plat(0.78, 200.0, 0.05, 30.0),
            // Final ascent and goal tower
            plat(0.85, 280.0, 0.04, 30.0),
            plat(0.89, 360.0, 0.04, 30.0),
            plat(0.93, 440.0, 0.07, 440.0),
        ];

        self.checkpoints = vec![
            Checkpoint::new(Aabb::new(lw * 0.31, h - 270.0, 40.0, 20.0)),
            Checkpoint::new(Aabb::new(lw * 0.66, h - 220.0, 40.0, 20.0)),
        ];

        let spike = |fx: f32, dy: f32, w: f32, sh: f32| {
            let base = Aabb::new(lw * fx, h - dy, w, sh);
            Hazard {
                kind: HazardKind::Spike,
                base,
                motion: Motion::Static,
                bounds: base,
            }
        };
        let rate = self.tuning.patrol_rate;
        let patrol = |fx: f32, dy: f32, size: f32, motion: Motion| {
            let base = Aabb::new(lw * fx, h - dy, size, size);
            Hazard {
                kind: HazardKind::PatrolBlock,
                base,
                motion,
                bounds: base,
            }
        };
        let vertical = |range: f32, phase: f32| Motion::Float {
            amplitude: range,
            rate,
            phase,
        };
        let horizontal = |range: f32, phase: f32| Motion::Horizontal {
            amplitude: range,
            rate,
            phase,
        };

        self.hazards = vec![
            spike(0.12, 40.0, 20.0, 40.0),
            spike(0.14, 40.0, 20.0, 40.0),
            spike(0.18, 430.0, 16.0, 16.0),
            patrol(0.22, 300.0, 40.0, vertical(80.0, 0.0)),
            spike(0.45, 40.0, 20.0, 40.0),
            spike(0.52, 40.0, 20.0, 40.0),
            patrol(0.52, 240.0, 30.0, horizontal(50.0, 0.0)),
            spike(0.70, 40.0, 20.0, 40.0),
            spike(0.72, 40.0, 20.0, 40.0),
            spike(0.74, 40.0, 20.0, 40.0),
            patrol(0.87, 320.0, 30.0, horizontal(40.0, 0.0)),
            patrol(0.34, 320.0, 30.0, vertical(60.0, PI)),
            patrol(0.59, 240.0, 30.0, horizontal(50.0, 0.0)),
            patrol(0.17, 400.0, 30.0, horizontal(40.0, FRAC_PI_2)),
        ];

        let fixed = Motion::Static;
        let float = |phase: f32| Motion::Float {
            amplitude: 30.0,
            rate: FLOAT_RATE,
            phase,
        };
        let sway = Motion::Horizontal {
            amplitude: 50.0,
            rate: SWAY_RATE,
            phase: 0.0,
        };
        let orbit = Motion::Orbit {
            radius: Vec2::new(40.0, 25.0),
            rate: ORBIT_RATE,
            phase: 0.0,
        };
        let layout: [(f32, f32, Motion); 20] = [
            (0.05, 150.0, fixed),
            (0.13, 270.0, fixed),
            (0.09, 370.0, float(0.0)),
            (0.16, 450.0, fixed),
            (0.27, 380.0, fixed),
            (0.32, 290.0, sway),
            (0.43, 300.0, fixed),
            (0.51, 260.0, fixed),
            (0.57, 330.0, fixed),
            (0.62, 250.0, sway),
            (0.68, 250.0, orbit),
            (0.74, 250.0, orbit),
            (0.86, 320.0, fixed),
            (0.89, 410.0, float(PI)),
            (0.94, 460.0, fixed),
            (0.22, 300.0, fixed),
            (0.46, 280.0, fixed),
            (0.52, 350.0, float(0.0)),
            (0.80, 240.0, fixed),
            (0.91, 380.0, fixed),
        ];
        self.hearts = layout
            .iter()
            .enumerate()
            .map(|(i, &(fx, dy, motion))| {
                let base = Vec2::new(lw * fx, h - dy);
                Heart {
                    id: EntityId(i as u32 + 1),
                    base,
                    motion,
                    pos: base,
                }
            })
            .collect();
    }

    fn respawn(&mut self, at: Option<Vec2>) {
        let anchor = at.unwrap_or_else(|| self.start_position());
        self.player.body.teleport(anchor);
        self.player.grounded = false;
    }
}

impl Level for Platformer {
    fn name(&self) -> &'static str {
        "platformer"
    }

    fn reward(&self) -> Reward {
        Reward::new(
            "How We Met",
            RewardKind::Text,
            "Every moment with you started right here.",
        )
    }

    fn reward_delay(&self) -> f32 {
        self.tuning.reward_delay
    }

    fn spawn_anchor(&self) -> Option<Vec2> {
        Some(self.start_position())
    }

    fn reset(&mut self, _rng: &mut dyn RandomSource) {
        self.build_layout();
        self.player = Walker {
            body: Body::new(self.start_position(), self.tuning.player_size),
            grounded: false,
        };
        self.facing = Facing::Idle;
        self.moving_for = 0.0;
        self.hearts_collected = 0;
        self.time = 0.0;
    }

    fn advance_timers(&mut self, ctx: &mut TickContext) {
        self.time += ctx.dt;
    }

    fn integrate(&mut self, ctx: &mut TickContext) {
        let input = ctx.input;
        // Left wins when both directions are held
        let axis = if input.any_held(&LEFT) {
            -1.0
        } else if input.any_held(&RIGHT) {
            1.0
        } else {
            0.0
        };
        let physics = self.tuning.physics;
        if physics.steer(&mut self.player, axis, input.any_held(&JUMP), ctx.dt) {
            ctx.sound(SoundCue::Jump);
        }
        physics.integrate(&mut self.player, ctx.dt);

        let facing = match axis {
            a if a < 0.0 => Facing::Left,
            a if a > 0.0 => Facing::Right,
            _ => Facing::Idle,
        };
        if facing != self.facing {
            self.facing = facing;
            self.moving_for = 0.0;
        } else if facing != Facing::Idle {
            self.moving_for += ctx.dt;
        }

        let t = self.time;
        for heart in self.hearts.iter_mut() {
            heart.pos = heart.motion.position(heart.base, t);
        }
        for hazard in self.hazards.iter_mut() {
            hazard.bounds.pos = hazard.motion.position(hazard.base.pos, t);
        }
    }

    fn resolve(&mut self, ctx: &mut TickContext) {
        self.tuning
            .physics
            .resolve(&mut self.player, &self.platforms, self.width);

        if self.player.body.pos.y > self.height {
            if let Some(hit) = ctx.hit() {
                self.respawn(hit.respawn);
            }
        }

        let bounds = self.player.body.bounds();
        if activate_checkpoints(&mut self.checkpoints, &bounds, ctx.vitals) > 0 {
            ctx.sound(SoundCue::Checkpoint);
        }

        let hitbox = self.tuning.heart_hitbox;
        let mut picked = 0;
        self.hearts.retain(|heart| {
            if !heart.hitbox(hitbox).intersects(&bounds) {
                return true;
            }
            if ctx.ledger.claim(heart.id) {
                picked += 1;
            }
            false
        });
        if picked > 0 {
            self.hearts_collected += picked;
            ctx.sound(SoundCue::Pickup);
        }

        if ctx.vitals.can_be_hit() {
            let bounds = self.player.body.bounds();
            if self.hazards.iter().any(|hz| hz.bounds.intersects(&bounds)) {
                if let Some(hit) = ctx.hit() {
                    self.respawn(hit.respawn);
                }
            }
        }
    }

    fn evaluate(&self, vitals: &Vitals) -> Verdict {
        if vitals.is_dead() {
            Verdict::Lose
        } else if self.hearts_collected >= self.tuning.hearts_needed
            && self.player.body.pos.x > self.width * self.tuning.goal_fraction
        {
            Verdict::Win
        } else {
            Verdict::Continue
        }
    }

    fn scene(&self, vitals: &Vitals) -> Scene {
        let mut scene = Scene::new(self.viewport);
        scene.camera = Vec2::new(self.camera_x(), 0.0);
        scene.push(Aabb::new(0.0, 0.0, self.width, self.height), Paint::Sky);
        for p in &self.platforms {
            scene.push(*p, Paint::Platform);
        }
        for c in &self.checkpoints {
            let paint = if c.activated {
                Paint::CheckpointActive
            } else {
                Paint::Checkpoint
            };
            scene.push(c.bounds, paint);
        }
        for hz in &self.hazards {
            let paint = match hz.kind {
                HazardKind::Spike => Paint::Spike,
                HazardKind::PatrolBlock => Paint::PatrolBlock,
            };
            scene.push(hz.bounds, paint);
        }
        for heart in &self.hearts {
            scene.push(heart.hitbox(self.tuning.heart_hitbox), Paint::Heart);
        }
        scene.avatar = Some(Avatar {
            rect: self.player.body.bounds(),
            facing: self.facing,
            moving_for: self.moving_for,
            visible: blink_visible(vitals),
        });
        scene.hud.score = self.hearts_collected as f32;
        scene.hud.target = self.tuning.hearts_needed as f32;
        scene.hud.caption = format!(
            "Checkpoints {}/{}",
            self.checkpoints.iter().filter(|c| c.activated).count(),
            self.checkpoints.len()
        );
        scene
    }
}
