//! Deterministic simulation module
//!
//! All gameplay logic lives here. Given the same level, tuning, frame
//! deltas and input it always produces the same world:
//! - Objects update and collide in insertion order
//! - Network elements are visited in registration order
//! - No rendering or platform dependencies

pub mod collision;
pub mod factory;
pub mod network;
pub mod objects;
pub mod rect;
pub mod state;
pub mod tick;

pub use collision::{Direction, Push, bump, collision_direction, half_bump};
pub use factory::{LevelError, WorldFactory};
pub use network::{Combiner, ElementId, NetworkBuilder, NetworkError, SignalListener, SignalNetwork};
pub use objects::{Body, Character, GameObject, Kind, Motion, ObjectType, UnknownObjectType};
pub use rect::{Edge, Rect};
pub use state::{World, WorldStatus};
pub use tick::SimError;
