//! Level data → live `World`
//!
//! Tile layers spawn one object per mapped cell; object layers spawn one
//! object per named entry. Network bindings are resolved after every
//! object is known, so a `signals` list may reference elements placed
//! later in the file.

use std::collections::HashMap;

use glam::Vec2;
use thiserror::Error;

use super::network::{Combiner, ElementId, NetworkBuilder, NetworkError};
use super::objects::{Body, Character, Connector, Gate, GameObject, Kind, ObjectType, Piston, Plate, Platform};
use super::rect::Edge;
use super::state::World;
use crate::consts;
use crate::level::{Layer, LevelData, ObjectData, Properties};
use crate::tuning::Tuning;

/// Malformed level content
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelError {
    #[error("unknown object type `{0}`")]
    UnknownObjectType(String),
    #[error("network element `{0}` has no combiner")]
    MissingCombiner(String),
    #[error("{kind} `{id}` must use the manual combiner, not `{combiner}`")]
    SwitchNotManual {
        kind: &'static str,
        id: String,
        combiner: &'static str,
    },
    #[error("a level may contain at most one character")]
    MultipleCharacters,
    #[error("{object}: invalid `{property}` value {value}")]
    InvalidProperty {
        object: &'static str,
        property: &'static str,
        value: String,
    },
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Builds worlds with the physics constants from a [`Tuning`]
#[derive(Debug, Clone, Default)]
pub struct WorldFactory {
    tuning: Tuning,
}

impl WorldFactory {
    pub fn new(tuning: Tuning) -> Self {
        Self { tuning }
    }

    /// Global tile id → kind, for tiles whose type names a known kind.
    /// Other typed tiles are decoration and spawn nothing.
    pub fn tile_mapping(level: &LevelData) -> Result<HashMap<u32, ObjectType>, LevelError> {
        let mut mapping = HashMap::new();
        for tileset in &level.tilesets {
            for (index, tile) in tileset.tiles.iter().enumerate() {
                let Some(name) = tile.kind.as_deref() else {
                    continue;
                };
                let Ok(kind) = name.parse::<ObjectType>() else {
                    log::debug!("Tile type `{name}` spawns nothing");
                    continue;
                };
                let local = match tile.id {
                    Some(id) => Some(id),
                    None => u32::try_from(index).ok(),
                };
                let gid = local
                    .and_then(|local| tileset.firstgid.checked_add(local))
                    .ok_or_else(|| LevelError::InvalidProperty {
                        object: "Tileset",
                        property: "firstgid",
                        value: tileset.firstgid.to_string(),
                    })?;
                mapping.insert(gid, kind);
            }
        }
        Ok(mapping)
    }

    pub fn build(&self, level: &LevelData) -> Result<World, LevelError> {
        let mapping = Self::tile_mapping(level)?;
        let tile_size = Vec2::new(level.tilewidth as f32, level.tileheight as f32);
        let mut size = Vec2::ZERO;
        let mut builder = NetworkBuilder::new();
        let mut objects = Vec::new();

        for layer in &level.layers {
            match layer {
                Layer::TileLayer(tiles) => {
                    // The last tile layer defines the level bounds
                    size = Vec2::new(tiles.width as f32, tiles.height as f32) * tile_size;
                    let width = (tiles.width as usize).max(1);
                    let cells = (tiles.width as usize)
                        .checked_mul(tiles.height as usize)
                        .ok_or_else(|| LevelError::InvalidProperty {
                            object: "TileLayer",
                            property: "height",
                            value: tiles.height.to_string(),
                        })?;
                    // Missing cells are empty; extra ones are ignored
                    for (index, gid) in tiles.data.iter().take(cells).enumerate() {
                        let Some(kind) = mapping.get(&(gid & consts::TILE_GID_MASK)) else {
                            continue;
                        };
                        let position = Vec2::new((index % width) as f32, (index / width) as f32) * tile_size;
                        let body = Body::new(position, tile_size);
                        objects.push(self.spawn(&mut builder, *kind, body, None)?);
                    }
                }
                Layer::ObjectGroup(group) => {
                    for data in &group.objects {
                        if data.name.trim().is_empty() {
                            continue;
                        }
                        let kind: ObjectType = data
                            .name
                            .parse()
                            .map_err(|_| LevelError::UnknownObjectType(data.name.clone()))?;
                        let body = object_body(kind, data);
                        objects.push(self.spawn(&mut builder, kind, body, Some(data))?);
                    }
                }
                Layer::Other => {}
            }
        }

        let characters = objects
            .iter()
            .filter(|o| o.object_type() == ObjectType::Character)
            .count();
        if characters > 1 {
            return Err(LevelError::MultipleCharacters);
        }
        if characters == 0 {
            log::warn!("Level has no character");
        }

        let network = builder.build()?;
        log::info!(
            "Built level: {} objects, {} network elements, {}x{} px",
            objects.len(),
            network.len(),
            size.x,
            size.y
        );
        let mut world = World::new(size.x, size.y, network);
        for object in objects {
            world.add_object(object);
        }
        world.settle_network()?;
        Ok(world)
    }

    /// Construct one object, registering its network element if it has one
    fn spawn(
        &self,
        builder: &mut NetworkBuilder,
        kind: ObjectType,
        mut body: Body,
        data: Option<&ObjectData>,
    ) -> Result<GameObject, LevelError> {
        let empty = Properties::default();
        let props = data.map_or(&empty, |d| &d.properties);
        if !kind.is_network_element() {
            if let Some(id) = props.get_str("id") {
                log::warn!("Ignoring network id `{id}` on {}", kind.as_str());
            }
        }
        let kind = match kind {
            ObjectType::Character => Kind::Character(Character::new(&self.tuning.character)),
            ObjectType::Box => Kind::new_box(&self.tuning.boxes),
            ObjectType::Wall => Kind::Wall,
            ObjectType::Spikes => Kind::Spikes,
            ObjectType::Gate => Kind::Gate(Gate {
                next_level: props.get_str("nextLevel"),
                entered: false,
            }),
            ObjectType::Plate => Kind::Plate(Plate::new(bind_element(builder, kind, props)?)),
            ObjectType::Lever => Kind::Lever(bind_element(builder, kind, props)?),
            ObjectType::Lamp => Kind::Lamp(bind_element(builder, kind, props)?),
            ObjectType::Piston => {
                let element = bind_element(builder, kind, props)?;
                let travel = piston_travel(props)?;
                Kind::Piston(Piston::new(element, &body, travel, self.tuning.piston_speed))
            }
            ObjectType::Platform => {
                let element = bind_element(builder, kind, props)?;
                let shift = platform_shift(props)?;
                Kind::Platform(Platform::new(element, &body, shift, self.tuning.platform_speed))
            }
            ObjectType::Connector => {
                let element = bind_element(builder, kind, props)?;
                let points: Vec<Vec2> = data
                    .and_then(|d| d.polyline.as_ref())
                    .map(|line| line.iter().map(|p| Vec2::new(p.x, p.y)).collect())
                    .unwrap_or_default();
                Kind::Connector(Connector::new(element, &mut body, &points))
            }
        };
        Ok(GameObject::new(body, kind))
    }
}

/// Tiled anchors tile objects at their bottom-left corner; gates are
/// placed as plain rectangles
fn object_body(kind: ObjectType, data: &ObjectData) -> Body {
    let size = Vec2::new(data.width, data.height);
    let y = if kind == ObjectType::Gate {
        data.y
    } else {
        data.y - size.y
    };
    Body::new(Vec2::new(data.x, y), size)
}

/// Register a network kind's element from its `id`/`signals`/`combiner`
/// properties. Without an id it gets an anonymous element: manual for
/// switches, any-of otherwise.
fn bind_element(
    builder: &mut NetworkBuilder,
    kind: ObjectType,
    props: &Properties,
) -> Result<ElementId, LevelError> {
    let Some(id) = props.get_str("id") else {
        let combiner = if kind.is_switch() {
            Combiner::Manual
        } else {
            Combiner::AnyOf
        };
        return Ok(builder.add_anonymous(kind.as_str(), combiner));
    };

    let name = props
        .get_str("combiner")
        .ok_or_else(|| LevelError::MissingCombiner(id.clone()))?;
    let combiner: Combiner = name.parse()?;
    if kind.is_switch() && combiner != Combiner::Manual {
        return Err(LevelError::SwitchNotManual {
            kind: kind.as_str(),
            id,
            combiner: combiner.as_str(),
        });
    }

    let signals: Vec<String> = props
        .get_str("signals")
        .map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    Ok(builder.add_element_with(&id, &signals, combiner)?)
}

fn number(props: &Properties, object: &'static str, property: &'static str) -> Result<Option<f32>, LevelError> {
    props
        .get_f32(property)
        .transpose()
        .map_err(|value| LevelError::InvalidProperty {
            object,
            property,
            value,
        })
}

/// Moving edge and travel; both must be present for the piston to move
fn piston_travel(props: &Properties) -> Result<Option<(Edge, f32)>, LevelError> {
    let edge = match props.get_str("direction") {
        Some(name) => Some(name.parse::<Edge>().map_err(|_| LevelError::InvalidProperty {
            object: "Piston",
            property: "direction",
            value: name.clone(),
        })?),
        None => None,
    };
    let delta = number(props, "Piston", "deltaLength")?;
    Ok(edge.zip(delta))
}

fn platform_shift(props: &Properties) -> Result<Option<Vec2>, LevelError> {
    let x = number(props, "Platform", "shiftX")?;
    let y = number(props, "Platform", "shiftY")?;
    if x.is_none() && y.is_none() {
        return Ok(None);
    }
    Ok(Some(Vec2::new(x.unwrap_or(0.0), y.unwrap_or(0.0))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputFrame;
    use crate::sim::state::WorldStatus;

    fn level(objects: &str) -> LevelData {
        LevelData::from_json(&format!(
            r#"{{
                "tilewidth": 10,
                "tileheight": 10,
                "tilesets": [
                    {{ "firstgid": 1, "tiles": [
                        {{ "id": 0, "type": "Wall" }},
                        {{ "id": 1, "type": "Spikes" }},
                        {{ "id": 3, "type": "Grass" }}
                    ] }}
                ],
                "layers": [
                    {{ "type": "tilelayer", "width": 4, "height": 3,
                       "data": [0, 0, 0, 0,
                                0, 0, 4, 0,
                                1, 1, 2, 2147483649] }},
                    {{ "type": "objectgroup", "objects": [{objects}] }}
                ]
            }}"#
        ))
        .unwrap()
    }

    fn factory() -> WorldFactory {
        WorldFactory::new(Tuning::default())
    }

    #[test]
    fn test_tiles_spawn_by_gid() {
        let world = factory().build(&level("")).unwrap();
        assert_eq!(world.width(), 40.0);
        assert_eq!(world.height(), 30.0);

        let kinds: Vec<ObjectType> = world.objects().iter().map(|o| o.object_type()).collect();
        // Grass is decoration; the flipped gid still maps to a wall
        assert_eq!(
            kinds,
            vec![ObjectType::Wall, ObjectType::Wall, ObjectType::Spikes, ObjectType::Wall]
        );
        let spikes = world.objects()[2].rect();
        assert_eq!((spikes.left(), spikes.up()), (20.0, 20.0));
        assert_eq!((spikes.width(), spikes.height()), (10.0, 10.0));
    }

    #[test]
    fn test_object_anchoring() {
        let world = factory()
            .build(&level(
                r#"{ "name": "Character", "x": 5, "y": 20, "width": 8, "height": 10 },
                   { "name": "Gate", "x": 30, "y": 0, "width": 10, "height": 20,
                     "properties": { "nextLevel": "level_2" } }"#,
            ))
            .unwrap();
        let character = world.character_object().unwrap();
        assert_eq!(character.body.position(), Vec2::new(5.0, 10.0));
        let gate = world.objects().iter().find(|o| o.object_type() == ObjectType::Gate).unwrap();
        assert_eq!(gate.body.position(), Vec2::new(30.0, 0.0));
        assert_eq!(gate.as_gate().unwrap().next_level.as_deref(), Some("level_2"));
    }

    #[test]
    fn test_network_wiring_from_properties() {
        let world = factory()
            .build(&level(
                r#"{ "name": "Lamp", "x": 0, "y": 10, "width": 5, "height": 5,
                     "properties": [ { "name": "id", "value": "lamp1" },
                                     { "name": "signals", "value": "lever2, plate3" },
                                     { "name": "combiner", "value": "any-of" } ] },
                   { "name": "Lever", "x": 10, "y": 10, "width": 5, "height": 5,
                     "properties": { "id": "lever2", "combiner": "manual" } },
                   { "name": "Plate", "x": 20, "y": 10, "width": 5, "height": 2,
                     "properties": { "id": "plate3", "combiner": "Manual" } },
                   { "name": "Lamp", "x": 30, "y": 10, "width": 5, "height": 5,
                     "properties": { "id": "inverted", "signals": "lamp1", "combiner": "noneof" } }"#,
            ))
            .unwrap();
        let network = world.network();
        let lamp = network.id("lamp1").unwrap();
        assert_eq!(network.emitters(lamp).count(), 2);
        assert_eq!(network.combiner(lamp), Combiner::AnyOf);
        // Settled at build: the none-of lamp over an idle input is lit
        assert!(network.is_active(network.id("inverted").unwrap()));
        assert!(!network.is_active(lamp));
    }

    #[test]
    fn test_unbound_network_kinds_get_anonymous_elements() {
        let world = factory()
            .build(&level(
                r#"{ "name": "Lever", "x": 0, "y": 10, "width": 5, "height": 5 },
                   { "name": "Lamp", "x": 10, "y": 10, "width": 5, "height": 5 }"#,
            ))
            .unwrap();
        let network = world.network();
        assert_eq!(network.len(), 2);
        let lever = world.objects().iter().find(|o| o.object_type() == ObjectType::Lever).unwrap();
        assert_eq!(network.combiner(lever.element().unwrap()), Combiner::Manual);
        let lamp = world.objects().iter().find(|o| o.object_type() == ObjectType::Lamp).unwrap();
        assert_eq!(world.is_active(lamp), Some(false));
    }

    #[test]
    fn test_id_on_plain_kind_is_ignored() {
        let world = factory()
            .build(&level(
                r#"{ "name": "Box", "x": 0, "y": 10, "width": 5, "height": 5,
                     "properties": { "id": "box1", "combiner": "manual" } }"#,
            ))
            .unwrap();
        assert!(world.network().is_empty());
    }

    #[test]
    fn test_configuration_errors() {
        let f = factory();
        assert_eq!(
            f.build(&level(r#"{ "name": "Dragon", "x": 0, "y": 0, "width": 1, "height": 1 }"#))
                .unwrap_err(),
            LevelError::UnknownObjectType("Dragon".into())
        );
        assert_eq!(
            f.build(&level(
                r#"{ "name": "Lamp", "x": 0, "y": 0, "width": 1, "height": 1, "properties": { "id": "l" } }"#
            ))
            .unwrap_err(),
            LevelError::MissingCombiner("l".into())
        );
        assert_eq!(
            f.build(&level(
                r#"{ "name": "Lamp", "x": 0, "y": 0, "width": 1, "height": 1,
                     "properties": { "id": "l", "combiner": "xor" } }"#
            ))
            .unwrap_err(),
            LevelError::Network(NetworkError::UnknownCombiner("xor".into()))
        );
        assert!(matches!(
            f.build(&level(
                r#"{ "name": "Lever", "x": 0, "y": 0, "width": 1, "height": 1,
                     "properties": { "id": "l", "combiner": "anyof" } }"#
            )),
            Err(LevelError::SwitchNotManual { .. })
        ));
        assert!(matches!(
            f.build(&level(
                r#"{ "name": "Lamp", "x": 0, "y": 0, "width": 1, "height": 1,
                     "properties": { "id": "l", "combiner": "anyof", "signals": "ghost" } }"#
            )),
            Err(LevelError::Network(NetworkError::UnregisteredElement { .. }))
        ));
        assert_eq!(
            f.build(&level(
                r#"{ "name": "Character", "x": 0, "y": 0, "width": 1, "height": 1 },
                   { "name": "Character", "x": 5, "y": 0, "width": 1, "height": 1 }"#
            ))
            .unwrap_err(),
            LevelError::MultipleCharacters
        );
        assert!(matches!(
            f.build(&level(
                r#"{ "name": "Piston", "x": 0, "y": 0, "width": 1, "height": 1,
                     "properties": { "direction": "sideways", "deltaLength": 4 } }"#
            )),
            Err(LevelError::InvalidProperty { property: "direction", .. })
        ));
    }

    #[test]
    fn test_oversized_tile_layer_is_bounded_by_its_data() {
        let level = LevelData::from_json(
            r#"{
                "tilewidth": 10, "tileheight": 10,
                "tilesets": [ { "firstgid": 1, "tiles": [ { "id": 0, "type": "Wall" } ] } ],
                "layers": [
                    { "type": "tilelayer", "width": 70000, "height": 70000, "data": [1, 0, 1] }
                ]
            }"#,
        )
        .unwrap();
        let world = factory().build(&level).unwrap();
        assert_eq!(world.objects().len(), 2);
        assert_eq!(world.width(), 700_000.0);
        assert_eq!(world.objects()[1].rect().left(), 20.0);
    }

    #[test]
    fn test_tile_id_past_gid_range_is_rejected() {
        let level = LevelData::from_json(&format!(
            r#"{{
                "tilewidth": 10, "tileheight": 10,
                "tilesets": [ {{ "firstgid": {}, "tiles": [ {{ "id": 5, "type": "Wall" }} ] }} ],
                "layers": []
            }}"#,
            u32::MAX
        ))
        .unwrap();
        assert!(matches!(
            factory().build(&level),
            Err(LevelError::InvalidProperty { property: "firstgid", .. })
        ));
    }

    #[test]
    fn test_lever_opens_piston_door() {
        // A held lever drives a piston whose bottom edge retracts upward.
        // The lever resets every update, so the piston must update first.
        let mut world = factory()
            .build(&level(
                r#"{ "name": "Piston", "x": 30, "y": 20, "width": 10, "height": 20,
                     "properties": { "id": "door", "signals": "lever", "combiner": "anyof",
                                     "direction": "down", "deltaLength": -15 } },
                   { "name": "Lever", "x": 0, "y": 20, "width": 10, "height": 10,
                     "properties": { "id": "lever", "combiner": "manual" } },
                   { "name": "Character", "x": 2, "y": 18, "width": 6, "height": 8 }"#,
            ))
            .unwrap();
        let door = world
            .objects()
            .iter()
            .position(|o| o.object_type() == ObjectType::Piston)
            .unwrap();
        assert_eq!(world.objects()[door].rect().down(), 20.0);

        for _ in 0..20 {
            world.update(1.0 / 60.0, &InputFrame::default()).unwrap();
        }
        let rect = world.objects()[door].rect();
        assert_eq!(rect.up(), 0.0);
        assert!(rect.down() < 20.0);
        assert_eq!(world.status(), WorldStatus::InProgress);
    }
}
