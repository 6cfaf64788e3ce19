//! Win/loss latch and reward payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Text,
    Photo,
    Video,
}

/// Memory unlocked by finishing a level. Opaque to the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub title: String,
    pub kind: RewardKind,
    pub content: String,
}

impl Reward {
    pub fn new(title: impl Into<String>, kind: RewardKind, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind,
            content: content.into(),
        }
    }
}

/// Per-tick predicate result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Win,
    Lose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    InProgress,
    Completed,
    GameOver,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::InProgress
    }
}

/// What the latch wants the engine to announce this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announce {
    Nothing,
    /// Win just latched; reward follows after the delay
    Won,
    Lost,
    /// Reward delay elapsed
    DeliverReward,
}

/// Monotonic outcome holder. The first terminal verdict sticks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutcomeLatch {
    outcome: Outcome,
    reward_delay: f32,
    reward_delivered: bool,
}

impl OutcomeLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == Outcome::Completed
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome == Outcome::GameOver
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }

    pub fn reward_delivered(&self) -> bool {
        self.reward_delivered
    }

    /// Feed a verdict. Ignored once terminal.
    pub fn observe(&mut self, verdict: Verdict, reward_delay: f32) -> Announce {
        if self.is_terminal() {
            return Announce::Nothing;
        }
        match verdict {
            Verdict::Continue => Announce::Nothing,
            Verdict::Win => {
                self.outcome = Outcome::Completed;
                self.reward_delay = reward_delay.max(0.0);
                Announce::Won
            }
            Verdict::Lose => {
                self.outcome = Outcome::GameOver;
                Announce::Lost
            }
        }
    }

    /// Count down the reward display delay; fires once
    pub fn tick(&mut self, dt: f32) -> Announce {
        if self.outcome != Outcome::Completed || self.reward_delivered {
            return Announce::Nothing;
        }
        self.reward_delay -= dt.max(0.0);
        if self.reward_delay <= 0.0 {
            self.reward_delivered = true;
            return Announce::DeliverReward;
        }
        Announce::Nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_verdict_wins() {
        let mut latch = OutcomeLatch::new();
        assert_eq!(latch.observe(Verdict::Continue, 0.5), Announce::Nothing);
        assert_eq!(latch.observe(Verdict::Lose, 0.5), Announce::Lost);
        assert_eq!(latch.observe(Verdict::Win, 0.5), Announce::Nothing);
        assert!(latch.is_game_over());
        assert!(!latch.is_completed());
    }

    #[test]
    fn test_reward_after_delay_once() {
        let mut latch = OutcomeLatch::new();
        assert_eq!(latch.observe(Verdict::Win, 0.5), Announce::Won);
        assert_eq!(latch.tick(0.3), Announce::Nothing);
        assert_eq!(latch.tick(0.3), Announce::DeliverReward);
        assert_eq!(latch.tick(0.3), Announce::Nothing);
        assert!(latch.reward_delivered());
    }

    #[test]
    fn test_reward_kind_serializes_lowercase() {
        let reward = Reward::new("Puzzle of Us", RewardKind::Text, "hello");
        let json = serde_json::to_string(&reward).expect("serialize");
        assert!(json.contains("\"text\""));
    }

    proptest! {
        #[test]
        fn prop_never_both_terminal(verdicts in proptest::collection::vec(0u8..3, 0..50)) {
            let mut latch = OutcomeLatch::new();
            let mut first = None;
            for v in verdicts {
                let verdict = match v { 0 => Verdict::Continue, 1 => Verdict::Win, _ => Verdict::Lose };
                latch.observe(verdict, 0.5);
                latch.tick(0.1);
                if first.is_none() && latch.is_terminal() {
                    first = Some(latch.outcome());
                }
                prop_assert!(!(latch.is_completed() && latch.is_game_over()));
                if let Some(f) = first {
                    prop_assert_eq!(latch.outcome(), f);
                }
            }
        }
    }
}
