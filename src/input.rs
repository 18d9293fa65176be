//! Movement intent, polled once per frame
//!
//! The simulation only asks yes/no questions about what the player wants to
//! do. Hosts answer them from whatever device they poll.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Per-frame player intent
pub trait MovementIntent {
    fn going_left(&self) -> bool;
    fn going_right(&self) -> bool;
    fn jumping(&self) -> bool;
    fn going_down(&self) -> bool {
        false
    }
    fn activating(&self) -> bool {
        false
    }

    /// Unit vector of the held directions in screen space (jump is up),
    /// zero when nothing or only opposites are held
    fn direction(&self) -> Vec2 {
        let mut direction = Vec2::ZERO;
        if self.jumping() {
            direction.y -= 1.0;
        }
        if self.going_down() {
            direction.y += 1.0;
        }
        if self.going_left() {
            direction.x -= 1.0;
        }
        if self.going_right() {
            direction.x += 1.0;
        }
        direction.normalize_or_zero()
    }
}

/// Raw button state for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub down: bool,
    pub activate: bool,
}

impl MovementIntent for InputFrame {
    /// Opposite directions cancel out
    fn going_left(&self) -> bool {
        self.left && !self.right
    }

    fn going_right(&self) -> bool {
        self.right && !self.left
    }

    fn jumping(&self) -> bool {
        self.jump
    }

    fn going_down(&self) -> bool {
        self.down
    }

    fn activating(&self) -> bool {
        self.activate
    }
}

/// Key codes (DOM `KeyboardEvent.code` names) per logical action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub jump: Vec<String>,
    pub down: Vec<String>,
    pub activate: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        fn keys(codes: &[&str]) -> Vec<String> {
            codes.iter().map(|c| c.to_string()).collect()
        }
        Self {
            left: keys(&["KeyA", "ArrowLeft"]),
            right: keys(&["KeyD", "ArrowRight"]),
            jump: keys(&["KeyW", "ArrowUp", "Space"]),
            down: keys(&["KeyS", "ArrowDown"]),
            activate: keys(&["KeyE"]),
        }
    }
}

/// Tracks held keys and maps them to intent through [`KeyBindings`]
#[derive(Debug, Clone, Default)]
pub struct MovementController {
    bindings: KeyBindings,
    pressed: HashSet<String>,
}

impl MovementController {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            pressed: HashSet::new(),
        }
    }

    pub fn key_down(&mut self, code: &str) {
        self.pressed.insert(code.to_string());
    }

    pub fn key_up(&mut self, code: &str) {
        self.pressed.remove(code);
    }

    /// Drop all held keys, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.pressed.clear();
    }

    pub fn is_pressed(&self, code: &str) -> bool {
        self.pressed.contains(code)
    }

    fn any_pressed(&self, codes: &[String]) -> bool {
        codes.iter().any(|code| self.pressed.contains(code))
    }

    /// Snapshot of the current state
    pub fn frame(&self) -> InputFrame {
        InputFrame {
            left: self.any_pressed(&self.bindings.left),
            right: self.any_pressed(&self.bindings.right),
            jump: self.any_pressed(&self.bindings.jump),
            down: self.any_pressed(&self.bindings.down),
            activate: self.any_pressed(&self.bindings.activate),
        }
    }
}

impl MovementIntent for MovementController {
    fn going_left(&self) -> bool {
        self.frame().going_left()
    }

    fn going_right(&self) -> bool {
        self.frame().going_right()
    }

    fn jumping(&self) -> bool {
        self.any_pressed(&self.bindings.jump)
    }

    fn going_down(&self) -> bool {
        self.any_pressed(&self.bindings.down)
    }

    fn activating(&self) -> bool {
        self.any_pressed(&self.bindings.activate)
    }
}
