//! Top-level router between the hub, a running level and the reward screen
//!
//! The hub owns the persisted [`Progress`], the hub-side life counter and the
//! running level session. It is the [`Host`] the engine reports to.

use std::fmt;

use crate::levels::{AnyLevel, LevelId};
use crate::progress::Progress;
use crate::sim::engine::{Host, SimulationEngine, dispatch};
use crate::sim::input::{InputState, Key};
use crate::sim::outcome::{Outcome, Reward};
use crate::sim::random::SeededRandom;
use crate::sim::state::GameEvent;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Hub,
    Level(LevelId),
    /// Showing the memory just unlocked
    Reward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubError {
    /// The previous level has not been finished yet
    Locked(LevelId),
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubError::Locked(id) => write!(f, "level {} is still locked", id.number()),
        }
    }
}

impl std::error::Error for HubError {}

pub type Session = SimulationEngine<AnyLevel, SeededRandom>;

pub struct Hub {
    tuning: Tuning,
    progress: Progress,
    screen: Screen,
    lives: u8,
    current_reward: Option<Reward>,
    session: Option<Session>,
    seed: u64,
    attempts: u64,
}

impl Hub {
    pub fn new(tuning: Tuning, progress: Progress, seed: u64) -> Self {
        let lives = tuning.engine.start_lives;
        Self {
            tuning,
            progress,
            screen: Screen::Hub,
            lives,
            current_reward: None,
            session: None,
            seed,
            attempts: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    /// Lives every attempt begins with, as tuned
    pub fn start_lives(&self) -> u8 {
        self.tuning.engine.start_lives
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn current_reward(&self) -> Option<&Reward> {
        self.current_reward.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Enter a level with full lives and a fresh layout
    pub fn start_level(&mut self, id: LevelId) -> Result<(), HubError> {
        if !self.progress.is_available(id) {
            return Err(HubError::Locked(id));
        }
        self.attempts += 1;
        let rng = SeededRandom::new(self.seed.wrapping_add(self.attempts));
        let level = AnyLevel::new(id, &self.tuning);
        self.session = Some(SimulationEngine::new(level, rng, self.tuning.engine));
        self.lives = self.start_lives();
        self.screen = Screen::Level(id);
        log::info!("entering level {} ({})", id.number(), id.title());
        Ok(())
    }

    /// Record the running level as won and show its reward
    pub fn complete_level(&mut self, reward: Reward) {
        let Screen::Level(id) = self.screen else {
            log::warn!("level completion outside a level ignored");
            return;
        };
        if self.progress.record_completion(id, reward.clone()) {
            log::info!("level {} completed, progress {}%", id.number(), self.progress.percentage());
        }
        self.progress.save();
        self.session = None;
        self.current_reward = Some(reward);
        self.lives = self.start_lives();
        self.screen = Screen::Reward;
    }

    /// Hub-side life bookkeeping. The platformer shows its own game-over
    /// dialog at zero lives; every other level drops back to the hub.
    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives > 0 {
            return;
        }
        match self.screen {
            Screen::Level(LevelId::Platformer) => {}
            _ => {
                log::info!("out of lives, back to the hub");
                self.lives = self.start_lives();
                self.return_to_hub();
            }
        }
    }

    pub fn reset_lives(&mut self) {
        self.lives = self.start_lives();
    }

    /// Retry the running level from scratch
    pub fn retry(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.retry();
            self.lives = self.start_lives();
        }
    }

    /// Leave whatever is running. Always safe to call.
    pub fn return_to_hub(&mut self) {
        self.session = None;
        self.screen = Screen::Hub;
    }

    pub fn close_reward(&mut self) {
        self.current_reward = None;
        self.screen = Screen::Hub;
    }

    /// Forget all progress
    pub fn reset_game(&mut self) {
        self.progress.clear();
        self.progress.save();
        self.session = None;
        self.current_reward = None;
        self.lives = self.start_lives();
        self.screen = Screen::Hub;
        log::info!("game reset");
    }

    /// Keyboard shortcuts: H leaves the level, R retries after a game over
    pub fn apply_shortcuts(&mut self, input: &InputState) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if input.was_pressed(Key::KeyH) {
            self.return_to_hub();
        } else if input.was_pressed(Key::KeyR) && session.outcome() == Outcome::GameOver {
            self.retry();
        }
    }

    /// One animation frame of the running level
    pub fn frame(&mut self, now: f64, input: &InputState) -> Vec<GameEvent> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let events = session.frame(now, input);
        dispatch(self, &events);
        events
    }

    /// One tick with an explicit delta
    pub fn step(&mut self, dt: f32, input: &InputState) -> Vec<GameEvent> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let events = session.step(dt, input);
        dispatch(self, &events);
        events
    }
}

impl Host for Hub {
    fn on_life_lost(&mut self) {
        self.lose_life();
    }

    fn on_level_complete(&mut self, reward: &Reward) {
        self.complete_level(reward.clone());
    }

    fn on_game_over(&mut self) {
        log::info!("game over on {:?}", self.screen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::outcome::RewardKind;

    fn hub() -> Hub {
        Hub::new(Tuning::default(), Progress::new(), 7)
    }

    fn unlocked_through(last: LevelId) -> Progress {
        let mut progress = Progress::new();
        for id in LevelId::ALL.into_iter().filter(|id| *id < last) {
            progress.record_completion(id, Reward::new(id.title(), RewardKind::Text, ""));
        }
        progress
    }

    #[test]
    fn test_locked_level_refused() {
        let mut hub = hub();
        assert_eq!(hub.start_level(LevelId::Rhythm), Err(HubError::Locked(LevelId::Rhythm)));
        assert_eq!(hub.screen(), Screen::Hub);
        assert!(hub.session().is_none());
        assert!(hub.start_level(LevelId::Platformer).is_ok());
        assert_eq!(hub.screen(), Screen::Level(LevelId::Platformer));
        assert_eq!(hub.session().map(|s| s.level().id()), Some(LevelId::Platformer));
    }

    #[test]
    fn test_platformer_keeps_zero_lives() {
        let mut hub = hub();
        hub.start_level(LevelId::Platformer).expect("open");
        for _ in 0..3 {
            hub.lose_life();
        }
        assert_eq!(hub.lives(), 0);
        assert_eq!(hub.screen(), Screen::Level(LevelId::Platformer));
        hub.reset_lives();
        assert_eq!(hub.lives(), 3);
    }

    #[test]
    fn test_other_levels_return_to_hub() {
        let mut hub = Hub::new(Tuning::default(), unlocked_through(LevelId::Rhythm), 7);
        hub.start_level(LevelId::Rhythm).expect("open");
        hub.lose_life();
        hub.lose_life();
        assert_eq!(hub.screen(), Screen::Level(LevelId::Rhythm));
        hub.lose_life();
        assert_eq!(hub.screen(), Screen::Hub);
        assert_eq!(hub.lives(), 3);
        assert!(hub.session().is_none());
    }

    #[test]
    fn test_tuned_start_lives() {
        let tuning = Tuning::from_json(r#"{"engine": {"start_lives": 5}}"#).expect("tuning");
        let mut hub = Hub::new(tuning, unlocked_through(LevelId::Rhythm), 7);
        hub.start_level(LevelId::Rhythm).expect("open");
        assert_eq!(hub.lives(), 5);
        assert_eq!(hub.session().map(|s| s.vitals().lives()), Some(5));

        for _ in 0..3 {
            hub.on_life_lost();
        }
        assert_eq!(hub.lives(), 2);
        assert_eq!(hub.screen(), Screen::Level(LevelId::Rhythm));

        hub.on_life_lost();
        hub.on_life_lost();
        assert_eq!(hub.screen(), Screen::Hub);
        assert_eq!(hub.lives(), 5);
    }

    #[test]
    fn test_complete_shows_reward_then_hub() {
        let mut hub = hub();
        hub.start_level(LevelId::Platformer).expect("open");
        hub.lose_life();
        let reward = Reward::new("How We Met", RewardKind::Text, "memory");
        hub.complete_level(reward.clone());
        assert_eq!(hub.screen(), Screen::Reward);
        assert_eq!(hub.current_reward(), Some(&reward));
        assert_eq!(hub.lives(), 3);
        assert!(hub.progress().is_complete(LevelId::Platformer));
        assert!(hub.progress().is_available(LevelId::Rhythm));
        hub.close_reward();
        assert_eq!(hub.screen(), Screen::Hub);
    }

    #[test]
    fn test_completion_outside_level_ignored() {
        let mut hub = hub();
        hub.complete_level(Reward::new("x", RewardKind::Text, ""));
        assert_eq!(hub.screen(), Screen::Hub);
        assert_eq!(hub.progress().percentage(), 0);
    }

    #[test]
    fn test_reset_game() {
        let mut hub = Hub::new(Tuning::default(), unlocked_through(LevelId::Boss), 7);
        hub.start_level(LevelId::Boss).expect("open");
        hub.reset_game();
        assert_eq!(hub.screen(), Screen::Hub);
        assert_eq!(hub.progress().percentage(), 0);
        assert!(hub.start_level(LevelId::Boss).is_err());
    }

    #[test]
    fn test_boss_win_flows_through_host() {
        let mut hub = Hub::new(Tuning::default(), unlocked_through(LevelId::Boss), 7);
        hub.start_level(LevelId::Boss).expect("open");
        if let Some(AnyLevel::Boss(boss)) = hub.session_mut().map(|s| s.level_mut()) {
            boss.boss.health = 1;
        }
        let mut input = InputState::new();
        input.key_down(Key::Space);
        let mut outcome = Outcome::InProgress;
        for _ in 0..60 {
            if let Some(session) = hub.session() {
                outcome = session.outcome();
            }
            hub.step(0.1, &input);
            input.clear_edges();
        }
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(hub.screen(), Screen::Reward);
        assert_eq!(hub.current_reward().map(|r| r.title.as_str()), Some("Chaos Subsided"));
        assert!(hub.progress().all_complete());
    }

    #[test]
    fn test_shortcuts() {
        let mut hub = Hub::new(Tuning::default(), unlocked_through(LevelId::Boss), 7);
        hub.start_level(LevelId::Boss).expect("open");
        let mut input = InputState::new();
        input.key_down(Key::KeyR);
        hub.apply_shortcuts(&input);
        assert_eq!(hub.session().map(|s| s.outcome()), Some(Outcome::InProgress));

        if let Some(session) = hub.session_mut() {
            for _ in 0..3 {
                session.vitals_mut().take_hit();
                session.vitals_mut().tick(5.0);
            }
        }
        hub.step(0.01, &InputState::new());
        assert_eq!(hub.session().map(|s| s.outcome()), Some(Outcome::GameOver));
        hub.apply_shortcuts(&input);
        assert_eq!(hub.session().map(|s| s.outcome()), Some(Outcome::InProgress));

        let mut input = InputState::new();
        input.key_down(Key::KeyH);
        hub.apply_shortcuts(&input);
        assert_eq!(hub.screen(), Screen::Hub);
    }
}
