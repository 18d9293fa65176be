//! Tiled JSON level model and level sources
//!
//! Only the parts of the Tiled format the factory reads are modelled; every
//! other field is ignored. Tile layers must use the CSV (plain array)
//! encoding.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::sim::factory::LevelError;

/// Failure to produce a playable level
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed level data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid level: {0}")]
    Level(#[from] LevelError),
}

/// One exported Tiled map
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LevelData {
    pub tilewidth: u32,
    pub tileheight: u32,
    #[serde(default)]
    pub tilesets: Vec<Tileset>,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl LevelData {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tileset {
    pub firstgid: u32,
    #[serde(default)]
    pub tiles: Vec<TileData>,
}

/// Per-tile metadata; the type names the object kind the tile spawns
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileData {
    /// Local tile id; older exports omit it and rely on list position
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default, rename = "type", alias = "class")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Layer {
    TileLayer(TileLayer),
    ObjectGroup(ObjectGroup),
    /// Image and group layers
    #[serde(other)]
    Other,
}

/// Row-major grid of global tile ids, 0 for empty cells
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileLayer {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub data: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectGroup {
    #[serde(default)]
    pub objects: Vec<ObjectData>,
}

/// A placed object. `name` holds the kind; objects without one are skipped.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ObjectData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub properties: Properties,
    /// Points relative to (x, y)
    #[serde(default)]
    pub polyline: Option<Vec<Point>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Custom object properties.
///
/// Tiled writes them as `[{ "name", "type", "value" }]`; hand-written
/// levels often use a plain map. Both are accepted.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "RawProperties")]
pub struct Properties(BTreeMap<String, Value>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProperties {
    Map(BTreeMap<String, Value>),
    List(Vec<PropertyEntry>),
}

#[derive(Deserialize)]
struct PropertyEntry {
    name: String,
    #[serde(default)]
    value: Value,
}

impl From<RawProperties> for Properties {
    fn from(raw: RawProperties) -> Self {
        match raw {
            RawProperties::Map(map) => Properties(map),
            RawProperties::List(entries) => Properties(
                entries
                    .into_iter()
                    .map(|entry| (entry.name, entry.value))
                    .collect(),
            ),
        }
    }
}

impl Properties {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// String form of a property; numbers and booleans are stringified,
    /// empty strings count as absent
    pub fn get_str(&self, key: &str) -> Option<String> {
        let text = match self.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    /// Numeric property; numeric strings are parsed. `Some(Err(raw))` when
    /// the property is present but not a number.
    pub fn get_f32(&self, key: &str) -> Option<Result<f32, String>> {
        let value = self.get(key)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64().map(|n| n as f32),
            Value::String(s) => s.trim().parse::<f32>().ok(),
            _ => None,
        };
        Some(parsed.ok_or_else(|| value.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }
}

/// Where level data comes from, by level name
#[allow(async_fn_in_trait)]
pub trait LevelSource {
    async fn load(&self, name: &str) -> Result<LevelData, LoadError>;
}

/// Reads `{root}/{name}.json`
#[derive(Debug, Clone)]
pub struct DirectoryLevelSource {
    root: PathBuf,
}

impl DirectoryLevelSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

impl LevelSource for DirectoryLevelSource {
    async fn load(&self, name: &str) -> Result<LevelData, LoadError> {
        let path = self.path_for(name);
        log::debug!("Reading level {}", path.display());
        let json = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        LevelData::from_json(&json)
    }
}

/// Levels held in memory, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemoryLevelSource {
    levels: BTreeMap<String, String>,
}

impl MemoryLevelSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, name: impl Into<String>, json: impl Into<String>) -> Self {
        self.levels.insert(name.into(), json.into());
        self
    }
}

impl LevelSource for MemoryLevelSource {
    async fn load(&self, name: &str) -> Result<LevelData, LoadError> {
        let json = self.levels.get(name).ok_or_else(|| LoadError::Io {
            path: PathBuf::from(name),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such level"),
        })?;
        LevelData::from_json(json)
    }
}
