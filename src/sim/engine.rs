//! Generic per-frame simulation engine
//!
//! A minigame is a [`Level`] strategy. The engine owns the clock, lives,
//! outcome latch and randomness, and runs the stages of every tick in a fixed
//! order with a single delta:
//!
//! 1. timers (invincibility, level countdowns)
//! 2. spawning
//! 3. movement integration
//! 4. collision resolution
//! 5. win/loss evaluation
//!
//! Once an outcome latches only cosmetic updates run.

use glam::Vec2;

use super::clock::FrameClock;
use super::input::InputState;
use super::outcome::{Announce, Outcome, OutcomeLatch, Reward, Verdict};
use super::random::{RandomSource, SeededRandom};
use super::state::{GameEvent, PickupLedger, Scene, SoundCue};
use super::vitals::{Hit, Vitals};
use crate::tuning::EngineTuning;

/// Everything a stage may read or touch during one tick
pub struct TickContext<'a> {
    pub dt: f32,
    pub input: &'a InputState,
    pub rng: &'a mut dyn RandomSource,
    pub vitals: &'a mut Vitals,
    pub ledger: &'a mut PickupLedger,
    events: &'a mut Vec<GameEvent>,
}

impl TickContext<'_> {
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn sound(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    /// Apply a damage event through the life state machine. Emits `LifeLost`
    /// and the death cue only when the hit actually landed.
    pub fn hit(&mut self) -> Option<Hit> {
        let hit = self.vitals.take_hit()?;
        self.events.push(GameEvent::Sound(SoundCue::Death));
        self.events.push(GameEvent::LifeLost {
            lives_left: hit.lives_left,
        });
        Some(hit)
    }
}

/// A minigame plugged into [`SimulationEngine`]
pub trait Level {
    /// Display name for logs
    fn name(&self) -> &'static str;

    /// Payload delivered when the level is won
    fn reward(&self) -> Reward;

    /// Seconds between the win latching and the reward callback
    fn reward_delay(&self) -> f32;

    /// Initial respawn anchor, for levels that respawn spatially
    fn spawn_anchor(&self) -> Option<Vec2> {
        None
    }

    /// Rebuild the session from scratch (level entry and retry)
    fn reset(&mut self, rng: &mut dyn RandomSource);

    fn advance_timers(&mut self, _ctx: &mut TickContext) {}

    fn spawn(&mut self, _ctx: &mut TickContext) {}

    fn integrate(&mut self, ctx: &mut TickContext);

    fn resolve(&mut self, ctx: &mut TickContext);

    /// Win/loss predicate pair, evaluated after resolution
    fn evaluate(&self, vitals: &Vitals) -> Verdict;

    /// Particles, flashes and other effects that never touch gameplay
    fn update_cosmetics(&mut self, _dt: f32) {}

    fn scene(&self, vitals: &Vitals) -> Scene;
}

/// Runs one [`Level`] attempt
pub struct SimulationEngine<L, R = SeededRandom> {
    level: L,
    rng: R,
    tuning: EngineTuning,
    clock: FrameClock,
    vitals: Vitals,
    latch: OutcomeLatch,
    ledger: PickupLedger,
    /// Gameplay seconds simulated in this attempt
    elapsed: f32,
}

impl<L: Level, R: RandomSource> SimulationEngine<L, R> {
    pub fn new(mut level: L, mut rng: R, tuning: EngineTuning) -> Self {
        level.reset(&mut rng);
        let vitals = fresh_vitals(&level, &tuning);
        log::info!("level '{}' started with {} lives", level.name(), vitals.lives());
        Self {
            level,
            rng,
            clock: FrameClock::new(tuning.delta_cap),
            tuning,
            vitals,
            latch: OutcomeLatch::new(),
            ledger: PickupLedger::new(),
            elapsed: 0.0,
        }
    }

    /// Define the clock's reference timestamp (loop start)
    pub fn start_clock(&mut self, now: f64) {
        self.clock.start(now);
    }

    /// One animation frame: derive the delta once, then step
    pub fn frame(&mut self, now: f64, input: &InputState) -> Vec<GameEvent> {
        let dt = self.clock.advance(now);
        self.step(dt, input)
    }

    /// One tick with an explicit delta (clamped like a frame delta)
    pub fn step(&mut self, dt: f32, input: &InputState) -> Vec<GameEvent> {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.tuning.delta_cap)
        } else {
            log::debug!("non-finite delta ignored");
            0.0
        };
        let mut events = Vec::new();

        if self.latch.is_terminal() {
            self.level.update_cosmetics(dt);
            let announce = self.latch.tick(dt);
            self.deliver(announce, &mut events);
            return events;
        }

        self.elapsed += dt;
        self.vitals.tick(dt);
        {
            let mut ctx = TickContext {
                dt,
                input,
                rng: &mut self.rng,
                vitals: &mut self.vitals,
                ledger: &mut self.ledger,
                events: &mut events,
            };
            self.level.advance_timers(&mut ctx);
            self.level.spawn(&mut ctx);
            self.level.integrate(&mut ctx);
            self.level.resolve(&mut ctx);
        }
        self.level.update_cosmetics(dt);

        let verdict = self.level.evaluate(&self.vitals);
        let announce = self.latch.observe(verdict, self.level.reward_delay());
        self.deliver(announce, &mut events);
        if announce == Announce::Won {
            // A zero delay delivers in the same tick
            let immediate = self.latch.tick(0.0);
            self.deliver(immediate, &mut events);
        }
        events
    }

    fn deliver(&mut self, announce: Announce, events: &mut Vec<GameEvent>) {
        match announce {
            Announce::Nothing => {}
            Announce::Won => {
                log::info!("level '{}' completed after {:.1}s", self.level.name(), self.elapsed);
                events.push(GameEvent::Sound(SoundCue::Victory));
            }
            Announce::Lost => {
                log::info!("level '{}' game over after {:.1}s", self.level.name(), self.elapsed);
                events.push(GameEvent::Sound(SoundCue::GameOver));
                events.push(GameEvent::GameOver);
            }
            Announce::DeliverReward => {
                events.push(GameEvent::LevelComplete(self.level.reward()));
            }
        }
    }

    /// Start the attempt over: fresh layout, full lives, cleared outcome
    pub fn retry(&mut self) {
        self.level.reset(&mut self.rng);
        self.vitals = fresh_vitals(&self.level, &self.tuning);
        self.latch = OutcomeLatch::new();
        self.ledger.clear();
        self.clock = FrameClock::new(self.tuning.delta_cap);
        self.elapsed = 0.0;
        log::info!("level '{}' retried", self.level.name());
    }

    pub fn scene(&self) -> Scene {
        let mut scene = self.level.scene(&self.vitals);
        scene.outcome = self.latch.outcome();
        scene.hud.lives = self.vitals.lives();
        scene
    }

    pub fn outcome(&self) -> Outcome {
        self.latch.outcome()
    }

    /// Terminal and nothing left to announce
    pub fn is_settled(&self) -> bool {
        match self.latch.outcome() {
            Outcome::InProgress => false,
            Outcome::Completed => self.latch.reward_delivered(),
            Outcome::GameOver => true,
        }
    }

    pub fn level(&self) -> &L {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut L {
        &mut self.level
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

fn fresh_vitals<L: Level>(level: &L, tuning: &EngineTuning) -> Vitals {
    let vitals = Vitals::new(tuning.start_lives, tuning.invincibility_secs);
    match level.spawn_anchor() {
        Some(anchor) => vitals.with_anchor(anchor),
        None => vitals,
    }
}

/// Outbound collaborator. Every call is fire-and-forget.
pub trait Host {
    fn on_life_lost(&mut self);

    fn on_level_complete(&mut self, reward: &Reward);

    fn on_game_over(&mut self) {}

    fn play_sound(&mut self, _cue: SoundCue) {}

    fn draw_frame(&mut self, _scene: &Scene) {}
}

/// Forward a tick's events to the host
pub fn dispatch<H: Host + ?Sized>(host: &mut H, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::LifeLost { .. } => host.on_life_lost(),
            GameEvent::LevelComplete(reward) => host.on_level_complete(reward),
            GameEvent::GameOver => host.on_game_over(),
            GameEvent::Sound(cue) => host.play_sound(*cue),
            // Lane flashes are drawn from the scene
            GameEvent::HitFeedback { .. } | GameEvent::MissFeedback { .. } => {}
        }
    }
}
