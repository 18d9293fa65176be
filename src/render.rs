//! Render-facing view of a world
//!
//! The core never draws. Hosts either walk [`World::drawables`] or upload
//! the flat [`DrawInstance`] buffer from [`instances`] and texture each
//! instance by its kind index.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::sim::objects::{GameObject, Kind, ObjectType};
use crate::sim::rect::Rect;
use crate::sim::state::World;

/// One object as the renderer sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable<'a> {
    pub object_type: ObjectType,
    pub rect: Rect,
    /// Activation of the bound network element
    pub is_active: Option<bool>,
    /// Connector points, relative to `rect`'s top-left corner
    pub polyline: Option<&'a [Vec2]>,
}

impl Drawable<'_> {
    pub fn color(&self) -> [f32; 4] {
        colors::for_kind(self.object_type, self.is_active.unwrap_or(false))
    }
}

impl World {
    /// Every object in update order
    pub fn drawables(&self) -> impl Iterator<Item = Drawable<'_>> + '_ {
        self.objects().iter().map(|object| self.drawable(object))
    }

    fn drawable<'a>(&self, object: &'a GameObject) -> Drawable<'a> {
        let polyline = match &object.kind {
            Kind::Connector(connector) => Some(connector.polyline.as_slice()),
            _ => None,
        };
        Drawable {
            object_type: object.object_type(),
            rect: *object.rect(),
            is_active: self.is_active(object),
            polyline,
        }
    }
}

/// Per-object instance data for GPU upload
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawInstance {
    pub position: [f32; 2],
    pub size: [f32; 2],
    pub color: [f32; 4],
    /// Index into [`ObjectType::ALL`]
    pub kind: u32,
    /// 1 when the bound element is active
    pub active: u32,
}

impl DrawInstance {
    pub fn from_drawable(drawable: &Drawable<'_>) -> Self {
        let kind = ObjectType::ALL
            .iter()
            .position(|k| *k == drawable.object_type)
            .unwrap_or_default() as u32;
        Self {
            position: drawable.rect.position().to_array(),
            size: drawable.rect.size().to_array(),
            color: drawable.color(),
            kind,
            active: u32::from(drawable.is_active.unwrap_or(false)),
        }
    }
}

/// Flat instance buffer for the whole world
pub fn instances(world: &World) -> Vec<DrawInstance> {
    world
        .drawables()
        .map(|drawable| DrawInstance::from_drawable(&drawable))
        .collect()
}

/// Placeholder colors per kind, for hosts without sprites
pub mod colors {
    use crate::sim::objects::ObjectType;

    pub const CHARACTER: [f32; 4] = [0.2, 0.8, 0.4, 1.0];
    pub const BOX: [f32; 4] = [0.6, 0.4, 0.2, 1.0];
    pub const WALL: [f32; 4] = [0.3, 0.3, 0.4, 1.0];
    pub const SPIKES: [f32; 4] = [0.9, 0.2, 0.2, 1.0];
    pub const GATE: [f32; 4] = [0.6, 0.2, 0.8, 1.0];
    pub const SWITCH: [f32; 4] = [0.7, 0.7, 0.8, 1.0];
    pub const SWITCH_ON: [f32; 4] = [0.9, 0.85, 0.3, 1.0];
    pub const LAMP: [f32; 4] = [0.25, 0.25, 0.2, 1.0];
    pub const LAMP_ON: [f32; 4] = [1.0, 0.95, 0.5, 1.0];
    pub const MACHINE: [f32; 4] = [0.45, 0.45, 0.5, 1.0];
    pub const CONNECTOR: [f32; 4] = [1.0, 1.0, 1.0, 0.25];
    pub const CONNECTOR_ON: [f32; 4] = [0.0, 1.0, 1.0, 0.25];

    pub fn for_kind(kind: ObjectType, active: bool) -> [f32; 4] {
        match (kind, active) {
            (ObjectType::Character, _) => CHARACTER,
            (ObjectType::Box, _) => BOX,
            (ObjectType::Wall, _) => WALL,
            (ObjectType::Spikes, _) => SPIKES,
            (ObjectType::Gate, _) => GATE,
            (ObjectType::Plate | ObjectType::Lever, false) => SWITCH,
            (ObjectType::Plate | ObjectType::Lever, true) => SWITCH_ON,
            (ObjectType::Lamp, false) => LAMP,
            (ObjectType::Lamp, true) => LAMP_ON,
            (ObjectType::Piston | ObjectType::Platform, _) => MACHINE,
            (ObjectType::Connector, false) => CONNECTOR,
            (ObjectType::Connector, true) => CONNECTOR_ON,
        }
    }
}
