//! Data-driven game balance
//!
//! Every physics and session constant lives here so levels can be tuned
//! without recompiling. Missing JSON fields fall back to the defaults.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts;

/// Player physics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterTuning {
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    pub air_resistance: Vec2,
    pub max_speed: Vec2,
    pub walk_acceleration: f32,
    /// Braking factor applied to horizontal speed with no walk input
    pub stop_coefficient: f32,
    /// Jump apex height in pixels
    pub jump_height: f32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            gravity: 1000.0,
            air_resistance: Vec2::new(-10.0, 0.0),
            max_speed: Vec2::new(400.0, 9000.0),
            walk_acceleration: 5000.0,
            stop_coefficient: 10.0,
            jump_height: 72.0,
        }
    }
}

/// Pushable box physics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxTuning {
    pub gravity: f32,
    pub air_resistance: Vec2,
    pub max_speed: Option<Vec2>,
}

impl Default for BoxTuning {
    fn default() -> Self {
        Self {
            gravity: 2500.0,
            air_resistance: Vec2::new(-10.0, 0.0),
            max_speed: None,
        }
    }
}

/// All tunable values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub character: CharacterTuning,
    #[serde(rename = "box")]
    pub boxes: BoxTuning,
    /// Piston progress per second (full extension takes 1/speed seconds)
    pub piston_speed: f32,
    /// Platform progress per second
    pub platform_speed: f32,
    /// Lives at session start
    pub lives: u32,
    /// Level loaded first
    pub first_level: String,
    /// Frame deltas are clamped to `1 / min_fps`
    pub min_fps: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            character: CharacterTuning::default(),
            boxes: BoxTuning::default(),
            piston_speed: 1.0,
            platform_speed: 1.0 / 7.0,
            lives: consts::DEFAULT_LIVES,
            first_level: consts::FIRST_LEVEL.to_string(),
            min_fps: consts::MIN_FPS,
        }
    }
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Longest frame delta fed to the simulation
    pub fn max_frame_delta(&self) -> f32 {
        if self.min_fps > 0.0 {
            1.0 / self.min_fps
        } else {
            1.0 / consts::MIN_FPS
        }
    }
}
