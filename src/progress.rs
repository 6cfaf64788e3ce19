//! Persisted player progress
//!
//! Which minigames are done and which memories have been unlocked. Stored as
//! JSON in LocalStorage on the web; native builds keep it in memory only.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::levels::LevelId;
use crate::sim::outcome::Reward;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Progress {
    pub completed_levels: BTreeSet<LevelId>,
    /// Rewards in the order they were earned
    pub unlocked_rewards: Vec<Reward>,
}

impl Progress {
    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "birthday_quest_progress";

    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `level` finished and keep its reward. Returns false when the level
    /// had already been completed.
    pub fn record_completion(&mut self, level: LevelId, reward: Reward) -> bool {
        let first = self.completed_levels.insert(level);
        if !self.unlocked_rewards.contains(&reward) {
            self.unlocked_rewards.push(reward);
        }
        first
    }

    pub fn is_complete(&self, level: LevelId) -> bool {
        self.completed_levels.contains(&level)
    }

    /// Level 1 is always open; every other level needs its predecessor
    pub fn is_available(&self, level: LevelId) -> bool {
        match level.previous() {
            None => true,
            Some(prev) => self.is_complete(prev),
        }
    }

    pub fn all_complete(&self) -> bool {
        LevelId::ALL.iter().all(|id| self.is_complete(*id))
    }

    /// Completion in whole percent
    pub fn percentage(&self) -> u8 {
        let total = LevelId::ALL.len();
        let done = LevelId::ALL.iter().filter(|id| self.is_complete(**id)).count();
        ((done * 100 + total / 2) / total) as u8
    }

    /// First level that is open but not yet finished
    pub fn next_level(&self) -> Option<LevelId> {
        LevelId::ALL
            .into_iter()
            .find(|id| self.is_available(*id) && !self.is_complete(*id))
    }

    pub fn clear(&mut self) {
        self.completed_levels.clear();
        self.unlocked_rewards.clear();
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Load progress from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(progress) => {
                        log::info!(
                            "Loaded progress: {} levels complete",
                            progress.completed_levels.len()
                        );
                        return progress;
                    }
                    Err(e) => log::warn!("Ignoring unreadable progress: {}", e),
                }
            }
        }

        log::info!("No saved progress, starting fresh");
        Self::new()
    }

    /// Save progress to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Progress saved ({}%)", self.percentage());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
