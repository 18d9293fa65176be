//! Game object kinds, motion integration and the per-kind collision table

use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::{self, Direction};
use super::network::{ElementId, NetworkError, SignalListener, SignalNetwork};
use super::rect::{Edge, Rect};
use crate::input::MovementIntent;
use crate::tuning::{BoxTuning, CharacterTuning};

/// Stable per-kind tag, used for collision dispatch and texture lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Character,
    Box,
    Wall,
    Spikes,
    Gate,
    Plate,
    Lever,
    Lamp,
    Piston,
    Platform,
    Connector,
}

impl ObjectType {
    pub const ALL: [ObjectType; 11] = [
        ObjectType::Character,
        ObjectType::Box,
        ObjectType::Wall,
        ObjectType::Spikes,
        ObjectType::Gate,
        ObjectType::Plate,
        ObjectType::Lever,
        ObjectType::Lamp,
        ObjectType::Piston,
        ObjectType::Platform,
        ObjectType::Connector,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Character => "Character",
            ObjectType::Box => "Box",
            ObjectType::Wall => "Wall",
            ObjectType::Spikes => "Spikes",
            ObjectType::Gate => "Gate",
            ObjectType::Plate => "Plate",
            ObjectType::Lever => "Lever",
            ObjectType::Lamp => "Lamp",
            ObjectType::Piston => "Piston",
            ObjectType::Platform => "Platform",
            ObjectType::Connector => "Connector",
        }
    }

    /// Kinds bound to an element of the signal network
    pub fn is_network_element(&self) -> bool {
        matches!(
            self,
            ObjectType::Plate
                | ObjectType::Lever
                | ObjectType::Lamp
                | ObjectType::Piston
                | ObjectType::Platform
                | ObjectType::Connector
        )
    }

    /// Kinds that force their element from contacts and so must be manual
    pub fn is_switch(&self) -> bool {
        matches!(self, ObjectType::Plate | ObjectType::Lever)
    }

    /// Connectors are drawn only
    pub fn collides(&self) -> bool {
        !matches!(self, ObjectType::Connector)
    }

    /// Kinds that push movables out with a full bump
    fn is_solid(&self) -> bool {
        matches!(
            self,
            ObjectType::Wall | ObjectType::Piston | ObjectType::Platform
        )
    }

    fn presses_switches(&self) -> bool {
        matches!(self, ObjectType::Character | ObjectType::Box)
    }
}

/// Name matching no [`ObjectType`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown object type `{0}`")]
pub struct UnknownObjectType(pub String);

/// Level-file kind name, case-insensitive
impl FromStr for ObjectType {
    type Err = UnknownObjectType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownObjectType(s.to_string()))
    }
}

/// Position, size and the rectangle derived from them.
///
/// Every mutation goes through a method that rebuilds the rectangle, so it
/// can never be stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    position: Vec2,
    size: Vec2,
    rect: Rect,
}

impl Body {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            rect: Rect::new(position, size),
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.rect = Rect::new(self.position, self.size);
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
        self.rect = Rect::new(self.position, self.size);
    }

    pub fn translate(&mut self, shift: Vec2) {
        self.set_position(self.position + shift);
    }

    /// Move a single edge, keeping the others in place
    pub fn set_edge(&mut self, edge: Edge, value: f32) {
        self.rect.set_edge(edge, value);
        self.position = self.rect.position();
        self.size = self.rect.size();
    }
}

/// Velocity and the forces acting on a movable body
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Motion {
    pub speed: Vec2,
    pub free_fall_acceleration: Vec2,
    /// Per-axis coefficient; drag is `speed * air_resistance`, so negative
    /// values slow the body down
    pub air_resistance: Vec2,
    /// Per-axis speed limit
    pub max_speed: Option<Vec2>,
}

impl Motion {
    pub fn drag_acceleration(&self) -> Vec2 {
        self.speed * self.air_resistance
    }

    /// Total acceleration for the current speed, never cached
    pub fn acceleration(&self, extra: Vec2) -> Vec2 {
        self.free_fall_acceleration + self.drag_acceleration() + extra
    }

    /// Explicit Euler: position moves with the old speed, then the speed
    /// is updated and clamped
    pub fn integrate(&mut self, body: &mut Body, extra: Vec2, dt: f32) {
        let acceleration = self.acceleration(extra);
        body.translate(self.speed * dt);
        self.speed += acceleration * dt;
        if let Some(max) = self.max_speed {
            self.speed.x = bound(self.speed.x, max.x.abs());
            self.speed.y = bound(self.speed.y, max.y.abs());
        }
    }
}

#[inline]
fn bound(value: f32, limit: f32) -> f32 {
    value.max(-limit).min(limit)
}

/// The player
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub motion: Motion,
    pub dead: bool,
    pub can_jump: bool,
    pub jump_height: f32,
    pub walk_acceleration: f32,
    pub stop_coefficient: f32,
}

impl Character {
    pub fn new(tuning: &CharacterTuning) -> Self {
        Self {
            motion: Motion {
                speed: Vec2::ZERO,
                free_fall_acceleration: Vec2::new(0.0, tuning.gravity),
                air_resistance: tuning.air_resistance,
                max_speed: Some(tuning.max_speed),
            },
            dead: false,
            can_jump: true,
            jump_height: tuning.jump_height,
            walk_acceleration: tuning.walk_acceleration,
            stop_coefficient: tuning.stop_coefficient,
        }
    }

    /// Walking pushes along X; with no walk intent the character brakes
    pub fn walk_acceleration(&self, intent: &dyn MovementIntent) -> Vec2 {
        if intent.going_left() {
            Vec2::new(-self.walk_acceleration, 0.0)
        } else if intent.going_right() {
            Vec2::new(self.walk_acceleration, 0.0)
        } else {
            Vec2::new(-self.motion.speed.x * self.stop_coefficient, 0.0)
        }
    }

    /// Impulse reaching `jump_height` against gravity
    pub fn jump_speed(&self) -> Vec2 {
        let gravity = self.motion.free_fall_acceleration;
        -gravity.normalize_or_zero() * (2.0 * gravity.length() * self.jump_height).sqrt()
    }

    pub fn die(&mut self) {
        self.dead = true;
    }

    /// Integrate, spend the jump if allowed, then drop the ground contact.
    /// The collision pass that follows restores `can_jump` on landing.
    pub fn update(&mut self, body: &mut Body, dt: f32, intent: &dyn MovementIntent) {
        let walk = self.walk_acceleration(intent);
        self.motion.integrate(body, walk, dt);
        if self.can_jump && intent.jumping() {
            self.motion.speed += self.jump_speed();
        }
        self.can_jump = false;
    }

    fn touch(&mut self, direction: Direction) {
        if direction == Direction::Up {
            self.can_jump = true;
        }
    }
}

/// Level exit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gate {
    pub next_level: Option<String>,
    /// Sticky once set
    pub entered: bool,
}

/// Pressure plate: active only on frames where something stands on it
#[derive(Debug, Clone, PartialEq)]
pub struct Plate {
    pub element: ElementId,
    was_activated: bool,
}

impl Plate {
    pub fn new(element: ElementId) -> Self {
        Self {
            element,
            was_activated: false,
        }
    }
}

/// Piston travel: one edge slides by `delta_length` as progress goes 0 → 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PistonTravel {
    pub edge: Edge,
    pub delta_length: f32,
    pub start_coordinate: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Piston {
    pub element: ElementId,
    pub progress: f32,
    /// Progress per second; sign follows the element's activation
    pub speed: f32,
    /// `None` leaves the piston inert
    pub travel: Option<PistonTravel>,
}

impl Piston {
    pub fn new(element: ElementId, body: &Body, travel: Option<(Edge, f32)>, speed: f32) -> Self {
        Self {
            element,
            progress: 0.0,
            speed: -speed.abs(),
            travel: travel.map(|(edge, delta_length)| PistonTravel {
                edge,
                delta_length,
                start_coordinate: body.rect().edge(edge),
            }),
        }
    }

    pub fn set_progress(&mut self, body: &mut Body, progress: f32) {
        if let Some(travel) = self.travel {
            self.progress = progress.clamp(0.0, 1.0);
            body.set_edge(
                travel.edge,
                travel.start_coordinate + travel.delta_length * self.progress,
            );
        }
    }
}

/// Moving platform: the whole body slides by `shift` as progress goes 0 → 1
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub element: ElementId,
    pub progress: f32,
    pub speed: f32,
    pub start_position: Vec2,
    pub shift: Option<Vec2>,
}

impl Platform {
    pub fn new(element: ElementId, body: &Body, shift: Option<Vec2>, speed: f32) -> Self {
        Self {
            element,
            progress: 0.0,
            speed: -speed.abs(),
            start_position: body.position(),
            shift,
        }
    }

    pub fn set_progress(&mut self, body: &mut Body, progress: f32) {
        if let Some(shift) = self.shift {
            self.progress = progress.clamp(0.0, 1.0);
            body.set_position(self.start_position + shift * self.progress);
        }
    }
}

/// Visual wire between network elements
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub element: ElementId,
    /// Points relative to the body's position
    pub polyline: Vec<Vec2>,
}

impl Connector {
    /// Takes points relative to the body's position and fits the body to
    /// their bounding box (which always includes the origin point)
    pub fn new(element: ElementId, body: &mut Body, points: &[Vec2]) -> Self {
        let min = points.iter().fold(Vec2::ZERO, |acc, p| acc.min(*p));
        let max = points.iter().fold(Vec2::ZERO, |acc, p| acc.max(*p));
        body.set_position(body.position() + min);
        body.set_size(max - min);
        Self {
            element,
            polyline: points.iter().map(|p| *p - min).collect(),
        }
    }
}

/// Per-kind state
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Character(Character),
    Box(Motion),
    Wall,
    Spikes,
    Gate(Gate),
    Plate(Plate),
    Lever(ElementId),
    Lamp(ElementId),
    Piston(Piston),
    Platform(Platform),
    Connector(Connector),
}

impl Kind {
    pub fn new_box(tuning: &BoxTuning) -> Self {
        Kind::Box(Motion {
            speed: Vec2::ZERO,
            free_fall_acceleration: Vec2::new(0.0, tuning.gravity),
            air_resistance: tuning.air_resistance,
            max_speed: tuning.max_speed,
        })
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Kind::Character(_) => ObjectType::Character,
            Kind::Box(_) => ObjectType::Box,
            Kind::Wall => ObjectType::Wall,
            Kind::Spikes => ObjectType::Spikes,
            Kind::Gate(_) => ObjectType::Gate,
            Kind::Plate(_) => ObjectType::Plate,
            Kind::Lever(_) => ObjectType::Lever,
            Kind::Lamp(_) => ObjectType::Lamp,
            Kind::Piston(_) => ObjectType::Piston,
            Kind::Platform(_) => ObjectType::Platform,
            Kind::Connector(_) => ObjectType::Connector,
        }
    }

    pub fn element(&self) -> Option<ElementId> {
        match self {
            Kind::Plate(plate) => Some(plate.element),
            Kind::Lever(element) | Kind::Lamp(element) => Some(*element),
            Kind::Piston(piston) => Some(piston.element),
            Kind::Platform(platform) => Some(platform.element),
            Kind::Connector(connector) => Some(connector.element),
            _ => None,
        }
    }

    pub fn motion_mut(&mut self) -> Option<&mut Motion> {
        match self {
            Kind::Character(character) => Some(&mut character.motion),
            Kind::Box(motion) => Some(motion),
            _ => None,
        }
    }
}

/// A live object in the world
#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    pub body: Body,
    pub kind: Kind,
}

impl GameObject {
    pub fn new(body: Body, kind: Kind) -> Self {
        Self { body, kind }
    }

    pub fn object_type(&self) -> ObjectType {
        self.kind.object_type()
    }

    pub fn element(&self) -> Option<ElementId> {
        self.kind.element()
    }

    pub fn rect(&self) -> &Rect {
        self.body.rect()
    }

    pub fn as_character(&self) -> Option<&Character> {
        match &self.kind {
            Kind::Character(character) => Some(character),
            _ => None,
        }
    }

    pub fn as_character_mut(&mut self) -> Option<&mut Character> {
        match &mut self.kind {
            Kind::Character(character) => Some(character),
            _ => None,
        }
    }

    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            Kind::Gate(gate) => Some(gate),
            _ => None,
        }
    }

    /// Advance one frame: motion, progress, or the per-frame reset of
    /// momentary switches
    pub fn update(
        &mut self,
        dt: f32,
        intent: &dyn MovementIntent,
        network: &mut SignalNetwork,
        listener: &mut impl SignalListener,
    ) -> Result<(), NetworkError> {
        let body = &mut self.body;
        match &mut self.kind {
            Kind::Character(character) => character.update(body, dt, intent),
            Kind::Box(motion) => motion.integrate(body, Vec2::ZERO, dt),
            Kind::Plate(plate) => {
                if !plate.was_activated {
                    network.force_active(plate.element, false, listener)?;
                }
                plate.was_activated = false;
            }
            Kind::Lever(element) => network.force_active(*element, false, listener)?,
            Kind::Piston(piston) => {
                let progress = piston.progress + piston.speed * dt;
                piston.set_progress(body, progress);
            }
            Kind::Platform(platform) => {
                let progress = platform.progress + platform.speed * dt;
                platform.set_progress(body, progress);
            }
            Kind::Wall | Kind::Spikes | Kind::Gate(_) | Kind::Lamp(_) | Kind::Connector(_) => {}
        }
        Ok(())
    }

    /// Respond to touching `other`, from this object's side only.
    /// Pairs the table does not list are ignored.
    pub fn collide(
        &mut self,
        other: &mut GameObject,
        network: &mut SignalNetwork,
        listener: &mut impl SignalListener,
    ) -> Result<(), NetworkError> {
        let other_type = other.object_type();
        let body = &mut self.body;
        match &mut self.kind {
            Kind::Character(character) => {
                if other_type.is_solid() {
                    let direction = collision::bump(body, &mut character.motion, other.body.rect());
                    character.touch(direction);
                } else if other_type == ObjectType::Spikes {
                    character.die();
                } else if let (ObjectType::Box, Some(other_motion)) =
                    (other_type, other.kind.motion_mut())
                {
                    let direction = collision::half_bump(
                        body,
                        &mut character.motion,
                        &mut other.body,
                        other_motion,
                    );
                    character.touch(direction);
                }
            }
            Kind::Box(motion) => {
                if other_type.is_solid() {
                    collision::bump(body, motion, other.body.rect());
                } else if let (ObjectType::Box | ObjectType::Character, Some(other_motion)) =
                    (other_type, other.kind.motion_mut())
                {
                    collision::half_bump(body, motion, &mut other.body, other_motion);
                }
            }
            Kind::Plate(plate) => {
                if other_type.presses_switches() {
                    network.force_active(plate.element, true, listener)?;
                    plate.was_activated = true;
                }
            }
            Kind::Lever(element) => {
                if other_type.presses_switches() {
                    network.force_active(*element, true, listener)?;
                }
            }
            Kind::Gate(gate) => {
                if other_type == ObjectType::Character {
                    gate.entered = true;
                }
            }
            Kind::Wall
            | Kind::Spikes
            | Kind::Lamp(_)
            | Kind::Piston(_)
            | Kind::Platform(_)
            | Kind::Connector(_) => {}
        }
        Ok(())
    }

    /// Reaction to this object's element changing state
    pub fn on_signal_update(&mut self, is_active: bool) {
        let direction = if is_active { 1.0 } else { -1.0 };
        match &mut self.kind {
            Kind::Piston(piston) if piston.travel.is_some() => {
                piston.speed = piston.speed.abs() * direction;
            }
            Kind::Platform(platform) if platform.shift.is_some() => {
                platform.speed = platform.speed.abs() * direction;
            }
            _ => {}
        }
    }
}
