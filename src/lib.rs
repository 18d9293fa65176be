//! Lever Works - a tile-based puzzle platformer runtime
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rectangles, collision, signal network, world)
//! - `level`: Tiled level files and where they come from
//! - `session`: Level sequencing, lives and retry
//! - `input`: Movement intent
//! - `render`: What the renderer gets to see
//! - `tuning`: Data-driven game balance

pub mod input;
pub mod level;
pub mod render;
pub mod session;
pub mod sim;
pub mod timer;
pub mod tuning;

pub use session::{GameSession, GameStatus};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Lives at the start of a session
    pub const DEFAULT_LIVES: u32 = 5;
    /// Frame deltas are clamped to `1 / MIN_FPS` seconds
    pub const MIN_FPS: f32 = 30.0;
    /// Level a session starts on unless told otherwise
    pub const FIRST_LEVEL: &str = "level_1";
    /// Strips the flip/rotation flags Tiled stores in the top bits of a GID
    pub const TILE_GID_MASK: u32 = 0x1FFF_FFFF;
}
