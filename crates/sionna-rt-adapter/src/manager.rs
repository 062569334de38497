//! Simulation manager: the single mutation entry point for the host
//!
//! The host reports selections and edits as plain values; the manager
//! resolves tree paths, applies [`Command`]s and tells the host which
//! property panel to show.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::adapter::UpdateEffect;
use crate::error::{Error, Result};
use crate::model::{ActiveModel, GeometryOwner, GeometryRef, Simulation};
use crate::navigation::{self, NodeRef, TreeItem};
use crate::property::{PropertyEvent, PropertyGroup, PropertyValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    NewMaterial,
    NewTransmitter,
    NewReceiver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub name: &'static str,
    pub description: &'static str,
    pub enabled: bool,
}

impl Action {
    fn new(kind: ActionKind, name: &'static str, description: &'static str) -> Self {
        Self {
            kind,
            name,
            description,
            enabled: false,
        }
    }
}

/// An edit requested by the host
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set field `field` (dotted for nested adapters) of the node at `path`
    SetProperty {
        path: Vec<usize>,
        field: String,
        event: PropertyEvent,
    },
    Trigger(ActionKind),
    AddGeometry {
        path: Vec<usize>,
        entity_id: String,
        description: String,
    },
    /// Remove a material, transmitter, receiver or geometry
    Remove { path: Vec<usize> },
}

#[derive(Debug)]
pub struct SimulationManager<M: ActiveModel> {
    simulation: Simulation,
    model: M,
    actions: Vec<Action>,
}

impl<M: ActiveModel> SimulationManager<M> {
    pub fn new(simulation: Simulation, model: M) -> Self {
        Self {
            simulation,
            model,
            actions: vec![
                Action::new(ActionKind::NewMaterial, "Material", "Add new material property"),
                Action::new(
                    ActionKind::NewTransmitter,
                    "Transmitter",
                    "Add new transmitter property",
                ),
                Action::new(ActionKind::NewReceiver, "Receiver", "Add new receiver property"),
            ],
        }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Actions for the current selection; enabled for a single selected item
    /// below the document root
    pub fn collect_actions(&mut self, selection: &[Vec<usize>]) -> &[Action] {
        let enabled = matches!(selection, [path] if path.len() > 1);
        for action in &mut self.actions {
            action.enabled = enabled;
        }
        &self.actions
    }

    /// Property panel for the selected path; a geometry shows its owner's
    pub fn properties_for(&self, path: &[usize]) -> Option<PropertyGroup> {
        let mut node = navigation::resolve(&self.simulation, path)?;
        if let NodeRef::Geometry { .. } = node {
            node = navigation::parent(node)?;
        }
        TreeItem::lookup(&self.simulation, node)?.properties()
    }

    pub fn apply(&mut self, command: Command) -> Result<UpdateEffect> {
        let result = match command {
            Command::SetProperty { path, field, event } => self.set_property(&path, &field, &event),
            Command::Trigger(kind) => {
                self.trigger(kind);
                Ok(UpdateEffect::Redraw)
            }
            Command::AddGeometry {
                path,
                entity_id,
                description,
            } => self.add_geometry(&path, GeometryRef::new(&entity_id, &description)),
            Command::Remove { path } => self.remove(&path),
        };
        if let Err(err) = &result {
            warn!("Rejected edit: {}", err);
        }
        result
    }

    /// Add a new element for the action; returns the new element's address
    pub fn trigger(&mut self, kind: ActionKind) -> NodeRef {
        debug!("Action {:?} triggered", kind);
        match kind {
            ActionKind::NewMaterial => NodeRef::Material(self.simulation.materials.add()),
            ActionKind::NewTransmitter => {
                NodeRef::Transmitter(self.simulation.antennas.transmitters.add())
            }
            ActionKind::NewReceiver => NodeRef::Receiver(self.simulation.antennas.receivers.add()),
        }
    }

    /// Validate and write the solver input below `results_dir`
    pub fn export(&mut self, results_dir: &Path) -> Result<PathBuf> {
        crate::export_simulation(&mut self.simulation, results_dir, &self.model)
    }

    fn resolve(&self, path: &[usize]) -> Result<NodeRef> {
        navigation::resolve(&self.simulation, path).ok_or_else(|| Error::InvalidPath(path.to_vec()))
    }

    fn set_property(
        &mut self,
        path: &[usize],
        field: &str,
        event: &PropertyEvent,
    ) -> Result<UpdateEffect> {
        let mut node = self.resolve(path)?;
        if let NodeRef::Geometry { .. } = node {
            node = navigation::parent(node).ok_or_else(|| Error::InvalidPath(path.to_vec()))?;
        }

        if node == NodeRef::Simulation {
            return self.set_simulation_field(field, event);
        }
        let settings = navigation::settings_mut(&mut self.simulation, node)
            .ok_or_else(|| Error::InvalidPath(path.to_vec()))?;
        settings.apply(field, event)
    }

    fn set_simulation_field(&mut self, field: &str, event: &PropertyEvent) -> Result<UpdateEffect> {
        if field != "notes" {
            return Err(Error::UnknownField(field.to_string()));
        }
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match &event.value {
            PropertyValue::Text(notes) => {
                self.simulation.notes = notes.clone();
                Ok(UpdateEffect::Value)
            }
            _ => Err(Error::ValueMismatch {
                field: field.to_string(),
                expected: "string",
            }),
        }
    }

    fn owner_at(&self, path: &[usize]) -> Result<GeometryOwner> {
        match self.resolve(path)? {
            NodeRef::Material(i) => Ok(GeometryOwner::Material(i)),
            NodeRef::Transmitter(i) => Ok(GeometryOwner::Transmitter(i)),
            NodeRef::Receiver(i) => Ok(GeometryOwner::Receiver(i)),
            _ => Err(Error::InvalidPath(path.to_vec())),
        }
    }

    fn add_geometry(&mut self, path: &[usize], geometry: GeometryRef) -> Result<UpdateEffect> {
        let owner = self.owner_at(path)?;
        self.simulation.add_geometry(owner, geometry, &self.model)?;
        Ok(UpdateEffect::Redraw)
    }

    fn remove(&mut self, path: &[usize]) -> Result<UpdateEffect> {
        let node = self.resolve(path)?;
        let sim = &mut self.simulation;
        let removed = match node {
            NodeRef::Material(i) => sim.materials.remove(i).is_some(),
            NodeRef::Transmitter(i) => sim.antennas.transmitters.remove(i).is_some(),
            NodeRef::Receiver(i) => sim.antennas.receivers.remove(i).is_some(),
            NodeRef::Geometry { owner, index } => {
                let entity_id = sim
                    .geometries(owner)
                    .and_then(|g| g.get(index))
                    .map(|g| g.entity_id.clone());
                entity_id.is_some_and(|id| sim.remove_geometry(owner, &id).is_some())
            }
            _ => false,
        };
        if !removed {
            return Err(Error::InvalidPath(path.to_vec()));
        }
        Ok(UpdateEffect::Redraw)
    }
}
