//! Per-tick input snapshot
//!
//! DOM handlers write into [`InputState`] between frames; the engine reads it
//! during a tick and clears the edge-triggered fields afterwards.

use std::collections::HashSet;

use glam::Vec2;

/// Keys the minigames react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    KeyA,
    KeyS,
    KeyD,
    KeyF,
    KeyW,
    Space,
    KeyR,
    KeyH,
}

impl Key {
    /// Map a `KeyboardEvent.code` string
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "KeyA" => Key::KeyA,
            "KeyS" => Key::KeyS,
            "KeyD" => Key::KeyD,
            "KeyF" => Key::KeyF,
            "KeyW" => Key::KeyW,
            "Space" => Key::Space,
            "KeyR" => Key::KeyR,
            "KeyH" => Key::KeyH,
            _ => return None,
        })
    }
}

/// Held keys, edge presses since the last tick, and pointer state
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    pressed: Vec<Key>,
    /// Pointer position in world coordinates
    pub pointer: Option<Vec2>,
    pub pointer_down: bool,
    pub pointer_pressed: bool,
    pub pointer_released: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key going down. Auto-repeat of an already-held key is not an edge.
    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.pressed.push(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
    }

    pub fn pointer_press(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
        self.pointer_down = true;
        self.pointer_pressed = true;
    }

    pub fn pointer_release(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
        self.pointer_down = false;
        self.pointer_released = true;
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.held.contains(k))
    }

    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Edge presses in arrival order
    pub fn pressed(&self) -> &[Key] {
        &self.pressed
    }

    /// Horizontal axis from arrows or A/D: -1, 0 or 1. Opposite keys cancel.
    pub fn horizontal(&self) -> f32 {
        let mut axis = 0.0;
        if self.any_held(&[Key::ArrowLeft, Key::KeyA]) {
            axis -= 1.0;
        }
        if self.any_held(&[Key::ArrowRight, Key::KeyD]) {
            axis += 1.0;
        }
        axis
    }

    /// Drop edge events once a tick has consumed them
    pub fn clear_edges(&mut self) {
        self.pressed.clear();
        self.pointer_pressed = false;
        self.pointer_released = false;
    }

    /// Forget everything (screen change)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
