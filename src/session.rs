//! Game session: level sequencing, lives, retry
//!
//! The session owns at most one `World`. Levels are fetched through a
//! [`LevelSource`] and cached by name, so restarting a level or revisiting
//! one never touches the source again.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::input::MovementIntent;
use crate::level::{LevelData, LevelSource, LoadError};
use crate::sim::factory::{LevelError, WorldFactory};
use crate::sim::state::World;
use crate::timer;
use crate::tuning::Tuning;

/// Session-level status shown by the UI overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// No playable world yet
    Loading,
    InProgress,
    /// Out of lives, or the last level was passed
    GameOver,
}

pub struct GameSession {
    factory: WorldFactory,
    levels: HashMap<String, LevelData>,
    /// Level the current world was built from
    level: Option<String>,
    /// Level requested but not cached yet
    pending: Option<String>,
    world: Option<World>,
    status: GameStatus,
    lives: u32,
    completed: bool,
    max_frame_delta: f32,
}

impl GameSession {
    /// A session waiting for the tuning's first level
    pub fn new(tuning: Tuning) -> Self {
        let first = tuning.first_level.clone();
        Self::starting_at(tuning, first)
    }

    pub fn starting_at(tuning: Tuning, level: impl Into<String>) -> Self {
        Self {
            lives: tuning.lives,
            max_frame_delta: tuning.max_frame_delta(),
            factory: WorldFactory::new(tuning),
            levels: HashMap::new(),
            level: None,
            pending: Some(level.into()),
            world: None,
            status: GameStatus::Loading,
            completed: false,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// True once a gate without a next level was passed
    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn level_name(&self) -> Option<&str> {
        self.level.as_deref()
    }

    /// Level the host must load before play can continue
    pub fn pending_level(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.levels.contains_key(name)
    }

    /// Fetch the pending level, if any, and start it
    pub async fn load_pending(&mut self, source: &impl LevelSource) -> Result<(), LoadError> {
        match self.pending.clone() {
            Some(name) => self.load_level(source, &name).await,
            None => Ok(()),
        }
    }

    /// Start `name`, fetching it from `source` unless cached. Only data
    /// that builds a world is cached.
    pub async fn load_level(
        &mut self,
        source: &impl LevelSource,
        name: &str,
    ) -> Result<(), LoadError> {
        if self.levels.contains_key(name) {
            self.start_level(name)?;
            return Ok(());
        }
        self.world = None;
        self.status = GameStatus::Loading;
        self.pending = Some(name.to_string());
        log::info!("Loading level `{name}`");
        let data = source.load(name).await?;
        let world = self.factory.build(&data)?;
        self.levels.insert(name.to_string(), data);
        self.enter(name, world);
        Ok(())
    }

    /// Validate level data obtained elsewhere, cache it and start it
    pub fn level_loaded(&mut self, name: &str, data: LevelData) -> Result<(), LevelError> {
        let world = self.factory.build(&data)?;
        self.levels.insert(name.to_string(), data);
        self.enter(name, world);
        Ok(())
    }

    /// Build a fresh world for `name`. Returns `false` when the level is
    /// not cached; it then becomes the pending level.
    pub fn start_level(&mut self, name: &str) -> Result<bool, LevelError> {
        let Some(data) = self.levels.get(name) else {
            self.world = None;
            self.status = GameStatus::Loading;
            self.pending = Some(name.to_string());
            return Ok(false);
        };
        let world = self.factory.build(data)?;
        self.enter(name, world);
        Ok(true)
    }

    fn enter(&mut self, name: &str, world: World) {
        log::info!("Started level `{name}` with {} lives", self.lives);
        self.world = Some(world);
        self.level = Some(name.to_string());
        self.pending = None;
    }

    /// Drop the world and leave `name` pending so the host can retry
    fn start_failed(&mut self, name: &str, err: &LevelError) {
        log::error!("Cannot start level `{name}`: {err}");
        self.world = None;
        self.status = GameStatus::Loading;
        self.pending = Some(name.to_string());
    }

    /// Replace the current world with a fresh one from the cached data
    pub fn restart(&mut self) -> Result<(), LevelError> {
        self.status = GameStatus::Loading;
        if let Some(name) = self.level.clone() {
            self.start_level(&name)?;
        }
        Ok(())
    }

    /// Advance one host frame. `dt` is clamped to the tuning's maximum.
    pub fn update(&mut self, dt: f32, intent: &dyn MovementIntent) {
        if self.status == GameStatus::GameOver {
            return;
        }
        let Some(world) = self.world.as_mut() else {
            self.status = GameStatus::Loading;
            return;
        };

        if world.level_passed() {
            match world.next_level().map(str::to_string) {
                Some(next) => {
                    log::info!("Level passed, next is `{next}`");
                    if let Err(err) = self.start_level(&next) {
                        self.start_failed(&next, &err);
                    }
                }
                None => {
                    log::info!("Final level passed");
                    self.completed = true;
                    self.status = GameStatus::GameOver;
                }
            }
        } else if world.level_lost() {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                log::info!("Out of lives");
                self.status = GameStatus::GameOver;
            } else {
                log::info!("Level lost, {} lives left", self.lives);
                if let Err(err) = self.restart() {
                    if let Some(name) = self.level.clone() {
                        self.start_failed(&name, &err);
                    }
                }
            }
        } else {
            self.status = GameStatus::InProgress;
            let dt = timer::clamp_frame_delta(dt, self.max_frame_delta);
            if let Err(err) = world.update(dt, intent) {
                log::error!("Skipping frame: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::input::InputFrame;
    use crate::level::MemoryLevelSource;

    /// 100x50 px of empty tiles plus the given objects
    fn level_json(objects: &str) -> String {
        format!(
            r#"{{
                "tilewidth": 10,
                "tileheight": 10,
                "tilesets": [],
                "layers": [
                    {{ "type": "tilelayer", "width": 10, "height": 5, "data": [] }},
                    {{ "type": "objectgroup", "objects": [{objects}] }}
                ]
            }}"#
        )
    }

    fn gate_level(next: Option<&str>) -> String {
        let props = next
            .map(|n| format!(r#", "properties": {{ "nextLevel": "{n}" }}"#))
            .unwrap_or_default();
        level_json(&format!(
            r#"{{ "name": "Gate", "x": 0, "y": 0, "width": 20, "height": 20{props} }},
               {{ "name": "Character", "x": 5, "y": 15, "width": 5, "height": 5 }}"#
        ))
    }

    fn spikes_level() -> String {
        level_json(
            r#"{ "name": "Spikes", "x": 0, "y": 20, "width": 20, "height": 20 },
               { "name": "Character", "x": 5, "y": 15, "width": 5, "height": 5 }"#,
        )
    }

    fn source() -> MemoryLevelSource {
        MemoryLevelSource::new()
            .with_level("level_1", gate_level(Some("level_2")))
            .with_level("level_2", gate_level(None))
            .with_level("deadly", spikes_level())
            .with_level("floating", level_json(r#"{ "name": "Character", "x": 5, "y": 15, "width": 5, "height": 5 }"#))
    }

    const IDLE: InputFrame = InputFrame {
        left: false,
        right: false,
        jump: false,
        down: false,
        activate: false,
    };

    #[test]
    fn test_waits_for_loading() {
        let mut session = GameSession::new(Tuning::default());
        assert_eq!(session.pending_level(), Some("level_1"));
        session.update(0.016, &IDLE);
        assert_eq!(session.status(), GameStatus::Loading);
        assert!(session.world().is_none());

        block_on(session.load_pending(&source())).unwrap();
        assert_eq!(session.pending_level(), None);
        assert_eq!(session.level_name(), Some("level_1"));
        session.update(0.016, &IDLE);
        assert_eq!(session.status(), GameStatus::InProgress);
    }

    #[test]
    fn test_gate_advances_to_next_level() {
        let source = source();
        let mut session = GameSession::new(Tuning::default());
        block_on(session.load_pending(&source)).unwrap();

        // Frame 1 enters the gate, frame 2 sees the pass
        session.update(0.016, &IDLE);
        session.update(0.016, &IDLE);
        assert_eq!(session.pending_level(), Some("level_2"));
        assert_eq!(session.status(), GameStatus::Loading);

        block_on(session.load_pending(&source)).unwrap();
        assert_eq!(session.level_name(), Some("level_2"));

        // level_2's gate has no target: the game is won
        session.update(0.016, &IDLE);
        session.update(0.016, &IDLE);
        assert_eq!(session.status(), GameStatus::GameOver);
        assert!(session.completed());
        assert_eq!(session.lives(), 5);
    }

    #[test]
    fn test_losing_costs_a_life_and_restarts() {
        let tuning = Tuning {
            lives: 2,
            ..Tuning::default()
        };
        let mut session = GameSession::starting_at(tuning, "deadly");
        block_on(session.load_pending(&source())).unwrap();

        session.update(0.016, &IDLE);
        assert!(session.world().unwrap().level_lost());
        session.update(0.016, &IDLE);
        assert_eq!(session.lives(), 1);
        // Rebuilt from cache: the new world has a live character again
        assert!(!session.world().unwrap().level_lost());
        assert_eq!(session.status(), GameStatus::Loading);

        session.update(0.016, &IDLE);
        assert_eq!(session.status(), GameStatus::InProgress);
        session.update(0.016, &IDLE);
        assert_eq!(session.lives(), 0);
        assert_eq!(session.status(), GameStatus::GameOver);
        assert!(!session.completed());

        // Nothing moves after game over
        let frame = session.world().unwrap().frame();
        session.update(0.016, &IDLE);
        assert_eq!(session.world().unwrap().frame(), frame);
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let mut session = GameSession::starting_at(Tuning::default(), "floating");
        block_on(session.load_pending(&source())).unwrap();
        session.update(5.0, &IDLE);
        let speed = session.world().unwrap().character().unwrap().motion.speed.y;
        assert!((speed - 1000.0 / 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_load_failure_keeps_loading() {
        let mut session = GameSession::starting_at(Tuning::default(), "missing");
        let err = block_on(session.load_pending(&source())).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(session.status(), GameStatus::Loading);
        assert_eq!(session.pending_level(), Some("missing"));
    }

    #[test]
    fn test_level_loaded_from_host_data() {
        let mut session = GameSession::new(Tuning::default());
        let data = LevelData::from_json(&gate_level(None)).unwrap();
        session.level_loaded("level_1", data).unwrap();
        assert!(session.is_cached("level_1"));
        assert!(session.world().is_some());

        let bad = LevelData::from_json(&level_json(
            r#"{ "name": "Dragon", "x": 0, "y": 0, "width": 1, "height": 1 }"#,
        ))
        .unwrap();
        assert_eq!(
            session.level_loaded("broken", bad).unwrap_err(),
            LevelError::UnknownObjectType("Dragon".into())
        );
        assert!(!session.is_cached("broken"));
        // The running level is untouched
        assert_eq!(session.level_name(), Some("level_1"));
        assert!(session.world().is_some());
    }

    #[test]
    fn test_broken_next_level_stays_pending() {
        let dragon = r#"{ "name": "Dragon", "x": 0, "y": 0, "width": 1, "height": 1 }"#;
        let source = MemoryLevelSource::new()
            .with_level("level_1", gate_level(Some("broken")))
            .with_level("broken", level_json(dragon));
        let mut session = GameSession::new(Tuning::default());
        block_on(session.load_pending(&source)).unwrap();

        let bad = LevelData::from_json(&level_json(dragon)).unwrap();
        assert!(session.level_loaded("broken", bad).is_err());

        for _ in 0..5 {
            session.update(0.016, &IDLE);
        }
        assert_eq!(session.status(), GameStatus::Loading);
        assert!(session.world().is_none());
        assert_eq!(session.pending_level(), Some("broken"));
        assert!(!session.is_cached("broken"));

        // Every retry reports the bad level and keeps it pending
        let err = block_on(session.load_pending(&source)).unwrap_err();
        assert!(matches!(err, LoadError::Level(LevelError::UnknownObjectType(_))));
        assert_eq!(session.pending_level(), Some("broken"));
        assert!(!session.is_cached("broken"));
    }

    #[test]
    fn test_miswired_frame_is_skipped() {
        use glam::Vec2;

        use crate::sim::network::NetworkBuilder;
        use crate::sim::objects::{Body, Character, GameObject, Kind};

        let mut builder = NetworkBuilder::new();
        let lamp = builder.add_element("lamp", &[] as &[&str], "anyof").unwrap();
        let mut world = World::new(100.0, 50.0, builder.build().unwrap());
        // A lever driving a computed element fails on its first reset
        world.add_object(GameObject::new(
            Body::new(Vec2::ZERO, Vec2::new(5.0, 5.0)),
            Kind::Lever(lamp),
        ));
        world.add_object(GameObject::new(
            Body::new(Vec2::new(20.0, 10.0), Vec2::new(5.0, 5.0)),
            Kind::Character(Character::new(&Tuning::default().character)),
        ));

        let mut session = GameSession::new(Tuning::default());
        session.world = Some(world);
        session.level = Some("level_1".into());
        session.pending = None;

        session.update(0.016, &IDLE);
        session.update(0.016, &IDLE);
        assert_eq!(session.status(), GameStatus::InProgress);
        let world = session.world().unwrap();
        assert_eq!(world.frame(), 2);
        // The character never got its turn
        let character = world.character_object().unwrap();
        assert_eq!(character.body.position(), Vec2::new(20.0, 10.0));
        assert_eq!(session.lives(), 5);
    }
}
