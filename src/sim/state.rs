//! Live world state for one level instance
//!
//! A `World` is built fresh by the factory for every (re)load and thrown
//! away on restart; nothing in it is ever reset in place.

use serde::{Deserialize, Serialize};

use super::network::{ElementId, NetworkError, SignalNetwork};
use super::objects::{Character, Gate, GameObject, ObjectType};

/// Outcome of the level so far. Passed and Lost are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldStatus {
    InProgress,
    Lost,
    Passed,
}

/// All objects of the current level plus the network wiring them
#[derive(Debug, Clone)]
pub struct World {
    pub(super) objects: Vec<GameObject>,
    pub(super) character: Option<usize>,
    pub(super) gates: Vec<usize>,
    pub(super) width: f32,
    pub(super) height: f32,
    pub(super) status: WorldStatus,
    pub(super) network: SignalNetwork,
    /// Element index → index of the object bound to it
    pub(super) element_owners: Vec<Option<usize>>,
    /// Activation changes not yet delivered to their objects
    pub(super) signals: Vec<(ElementId, bool)>,
    /// Simulated frames
    pub(super) frame: u64,
}

impl World {
    pub fn new(width: f32, height: f32, network: SignalNetwork) -> Self {
        let element_owners = vec![None; network.len()];
        Self {
            objects: Vec::new(),
            character: None,
            gates: Vec::new(),
            width,
            height,
            status: WorldStatus::InProgress,
            network,
            element_owners,
            signals: Vec::new(),
            frame: 0,
        }
    }

    /// Take ownership of an object and return its index. A later character
    /// replaces the tracked one; the factory rejects levels with two.
    pub fn add_object(&mut self, object: GameObject) -> usize {
        let index = self.objects.len();
        match object.object_type() {
            ObjectType::Character => self.character = Some(index),
            ObjectType::Gate => self.gates.push(index),
            _ => {}
        }
        if let Some(element) = object.element() {
            if let Some(owner) = self.element_owners.get_mut(element.index()) {
                *owner = Some(index);
            }
        }
        self.objects.push(object);
        index
    }

    /// Evaluate every computed element once and let the bound objects react
    pub fn settle_network(&mut self) -> Result<(), NetworkError> {
        self.network.settle(&mut self.signals)?;
        self.dispatch_signals();
        Ok(())
    }

    pub fn objects(&self) -> &[GameObject] {
        &self.objects
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn status(&self) -> WorldStatus {
        self.status
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn network(&self) -> &SignalNetwork {
        &self.network
    }

    pub fn character_object(&self) -> Option<&GameObject> {
        self.character.map(|index| &self.objects[index])
    }

    pub fn character(&self) -> Option<&Character> {
        self.character_object().and_then(GameObject::as_character)
    }

    pub fn character_mut(&mut self) -> Option<&mut Character> {
        let index = self.character?;
        self.objects[index].as_character_mut()
    }

    pub fn gates(&self) -> impl Iterator<Item = &Gate> + '_ {
        self.gates
            .iter()
            .filter_map(|index| self.objects[*index].as_gate())
    }

    /// Activation of an object's network element, `None` for plain objects
    pub fn is_active(&self, object: &GameObject) -> Option<bool> {
        object.element().map(|id| self.network.is_active(id))
    }

    /// Target of the first entered gate
    pub fn next_level(&self) -> Option<&str> {
        self.gates()
            .find(|gate| gate.entered)
            .and_then(|gate| gate.next_level.as_deref())
    }

    pub fn level_passed(&self) -> bool {
        self.status == WorldStatus::Passed || self.gates().any(|gate| gate.entered)
    }

    pub fn level_lost(&self) -> bool {
        self.status == WorldStatus::Lost || self.character().is_some_and(|c| c.dead)
    }

    /// Latch Passed or Lost; once latched nothing changes it
    pub fn update_status(&mut self) {
        if self.status != WorldStatus::InProgress {
            return;
        }
        if self.level_passed() {
            self.status = WorldStatus::Passed;
            log::info!("Level passed after {} frames", self.frame);
        } else if self.level_lost() {
            self.status = WorldStatus::Lost;
            log::info!("Level lost after {} frames", self.frame);
        }
    }

    /// Deliver queued activation changes to the bound objects
    pub(super) fn dispatch_signals(&mut self) {
        for (element, is_active) in self.signals.drain(..) {
            if let Some(Some(owner)) = self.element_owners.get(element.index()) {
                self.objects[*owner].on_signal_update(is_active);
            }
        }
    }
}
