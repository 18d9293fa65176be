//! Logical signal network
//!
//! Levers, plates, lamps, pistons and platforms are wired into a small
//! combinational graph. Each element owns an activation bit; emitters feed
//! receivers, and a receiver recomputes its bit from its emitters through a
//! stateless combiner whenever one of them changes.
//!
//! Elements live in an arena indexed by [`ElementId`]. Emitter/receiver
//! edges are id sets, so no element owns another.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or driving the network
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("unknown combiner `{0}`")]
    UnknownCombiner(String),
    #[error("network element `{0}` registered twice")]
    DuplicateElement(String),
    #[error("element `{element}` listens to unregistered element `{signal}`")]
    UnregisteredElement { element: String, signal: String },
    #[error("manual element `{0}` cannot have emitters")]
    ManualWithEmitters(String),
    #[error("cannot force activation of non-manual element `{0}`")]
    NotManual(String),
    #[error("manual element `{0}` cannot be evaluated from emitters")]
    ManualEvaluated(String),
}

/// How an element derives its activation from its emitters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combiner {
    /// Only changed by forcing; never computed from emitters
    Manual,
    /// Active iff at least one emitter is active
    AnyOf,
    /// Active iff every emitter is active (vacuously true with no emitters)
    AllOf,
    /// Active iff no emitter is active (true with no emitters)
    NoneOf,
}

/// Level-file combiner names: `anyof`, `any-of`, `any_of` in any case
impl FromStr for Combiner {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "manual" => Ok(Combiner::Manual),
            "anyof" => Ok(Combiner::AnyOf),
            "allof" => Ok(Combiner::AllOf),
            "noneof" => Ok(Combiner::NoneOf),
            _ => Err(NetworkError::UnknownCombiner(s.to_string())),
        }
    }
}

impl Combiner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combiner::Manual => "manual",
            Combiner::AnyOf => "anyof",
            Combiner::AllOf => "allof",
            Combiner::NoneOf => "noneof",
        }
    }

    /// Only manual elements may be forced
    pub fn can_force_activation(&self) -> bool {
        matches!(self, Combiner::Manual)
    }

    /// Desired activation for the given emitter states, `None` for manual
    pub fn should_be_active<I>(&self, emitters: I) -> Option<bool>
    where
        I: IntoIterator<Item = bool>,
    {
        let mut states = emitters.into_iter();
        match self {
            Combiner::Manual => None,
            Combiner::AnyOf => Some(states.any(|active| active)),
            Combiner::AllOf => Some(states.all(|active| active)),
            Combiner::NoneOf => Some(!states.any(|active| active)),
        }
    }
}

/// Index of an element in a [`SignalNetwork`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl ElementId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Hook invoked once per actual activation change, before receivers
/// are re-evaluated
pub trait SignalListener {
    fn on_signal_update(&mut self, id: ElementId, is_active: bool);
}

/// Discards notifications
impl SignalListener for () {
    fn on_signal_update(&mut self, _id: ElementId, _is_active: bool) {}
}

/// Records notifications in order
impl SignalListener for Vec<(ElementId, bool)> {
    fn on_signal_update(&mut self, id: ElementId, is_active: bool) {
        self.push((id, is_active));
    }
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    is_active: bool,
    combiner: Combiner,
    emitters: BTreeSet<ElementId>,
    receivers: BTreeSet<ElementId>,
}

/// A built signal network
#[derive(Debug, Clone, Default)]
pub struct SignalNetwork {
    elements: Vec<Element>,
    names: HashMap<String, ElementId>,
}

impl SignalNetwork {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn id(&self, name: &str) -> Option<ElementId> {
        self.names.get(name).copied()
    }

    pub fn name(&self, id: ElementId) -> &str {
        &self.elements[id.index()].name
    }

    pub fn is_active(&self, id: ElementId) -> bool {
        self.elements[id.index()].is_active
    }

    pub fn combiner(&self, id: ElementId) -> Combiner {
        self.elements[id.index()].combiner
    }

    pub fn emitters(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.elements[id.index()].emitters.iter().copied()
    }

    pub fn receivers(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.elements[id.index()].receivers.iter().copied()
    }

    /// Set a manual element's activation and propagate the change
    pub fn force_active(
        &mut self,
        id: ElementId,
        is_active: bool,
        listener: &mut impl SignalListener,
    ) -> Result<(), NetworkError> {
        let element = &self.elements[id.index()];
        if !element.combiner.can_force_activation() {
            return Err(NetworkError::NotManual(element.name.clone()));
        }
        self.set_active(id, is_active, listener)
    }

    /// Re-evaluate an element from its emitters (called when one changes)
    pub fn signal(
        &mut self,
        id: ElementId,
        listener: &mut impl SignalListener,
    ) -> Result<(), NetworkError> {
        let element = &self.elements[id.index()];
        let states = element
            .emitters
            .iter()
            .map(|emitter| self.elements[emitter.index()].is_active);
        let Some(active) = element.combiner.should_be_active(states) else {
            return Err(NetworkError::ManualEvaluated(element.name.clone()));
        };
        self.set_active(id, active, listener)
    }

    /// Bring every computed element in line with its emitters.
    ///
    /// Right after construction all elements are inactive, which is wrong
    /// for e.g. a none-of gate over inactive inputs. Elements are visited in
    /// registration order; each change propagates depth-first as usual.
    pub fn settle(&mut self, listener: &mut impl SignalListener) -> Result<(), NetworkError> {
        for index in 0..self.elements.len() {
            let id = ElementId(index as u32);
            if !self.elements[index].combiner.can_force_activation() {
                self.signal(id, listener)?;
            }
        }
        Ok(())
    }

    /// Depth-first propagation; no-op when the value is unchanged, which is
    /// also what terminates feedback loops
    fn set_active(
        &mut self,
        id: ElementId,
        is_active: bool,
        listener: &mut impl SignalListener,
    ) -> Result<(), NetworkError> {
        let element = &mut self.elements[id.index()];
        if element.is_active == is_active {
            return Ok(());
        }
        element.is_active = is_active;
        listener.on_signal_update(id, is_active);

        let receivers: Vec<ElementId> = element.receivers.iter().copied().collect();
        for receiver in receivers {
            self.signal(receiver, listener)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct PendingElement {
    name: String,
    signals: Vec<String>,
    combiner: Combiner,
}

/// Collects named elements, then resolves their input names in one pass
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    pending: Vec<PendingElement>,
    names: HashMap<String, ElementId>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element under a unique name. `signals` names the
    /// elements feeding it; they may be registered later, before `build`.
    pub fn add_element<S: AsRef<str>>(
        &mut self,
        name: &str,
        signals: &[S],
        combiner: &str,
    ) -> Result<ElementId, NetworkError> {
        let combiner: Combiner = combiner.parse()?;
        self.add_element_with(name, signals, combiner)
    }

    pub fn add_element_with<S: AsRef<str>>(
        &mut self,
        name: &str,
        signals: &[S],
        combiner: Combiner,
    ) -> Result<ElementId, NetworkError> {
        let name = name.trim();
        if self.names.contains_key(name) {
            return Err(NetworkError::DuplicateElement(name.to_string()));
        }
        let id = ElementId(self.pending.len() as u32);
        self.names.insert(name.to_string(), id);
        self.pending.push(PendingElement {
            name: name.to_string(),
            signals: signals
                .iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            combiner,
        });
        Ok(id)
    }

    /// Register an element nothing can name: it has no inputs and no
    /// other element can listen to it. `label` is only used in errors.
    pub fn add_anonymous(&mut self, label: &str, combiner: Combiner) -> ElementId {
        let id = ElementId(self.pending.len() as u32);
        self.pending.push(PendingElement {
            name: label.to_string(),
            signals: Vec::new(),
            combiner,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Resolve every input name into emitter → receiver edges
    pub fn build(self) -> Result<SignalNetwork, NetworkError> {
        let mut elements: Vec<Element> = self
            .pending
            .iter()
            .map(|p| Element {
                name: p.name.clone(),
                is_active: false,
                combiner: p.combiner,
                emitters: BTreeSet::new(),
                receivers: BTreeSet::new(),
            })
            .collect();

        for (index, pending) in self.pending.iter().enumerate() {
            let receiver = ElementId(index as u32);
            for signal in &pending.signals {
                let emitter = self.names.get(signal).copied().ok_or_else(|| {
                    NetworkError::UnregisteredElement {
                        element: pending.name.clone(),
                        signal: signal.clone(),
                    }
                })?;
                elements[index].emitters.insert(emitter);
                elements[emitter.index()].receivers.insert(receiver);
            }
        }

        if let Some(manual) = elements
            .iter()
            .find(|e| e.combiner == Combiner::Manual && !e.emitters.is_empty())
        {
            return Err(NetworkError::ManualWithEmitters(manual.name.clone()));
        }

        log::debug!("Signal network built with {} elements", elements.len());
        Ok(SignalNetwork {
            elements,
            names: self.names,
        })
    }
}
