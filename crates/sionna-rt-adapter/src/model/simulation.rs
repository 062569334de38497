//! The simulation aggregate and its solver payload

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::antennas::Antennas;
use super::group::{Group, GroupElement};
use super::material::MaterialSettings;
use super::settings::{BackgroundScene, RenderSettings, SetupSettings, SolverSettings};
use super::{ActiveModel, GeometryRef, Geometries, SettingsNode};
use crate::error::{Error, Result};
use crate::property::{PropertyGroup, Widget};

/// The element of the tree that owns a geometry list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryOwner {
    Material(usize),
    Transmitter(usize),
    Receiver(usize),
}

/// Solver input: the flattened scene mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPayload {
    #[serde(flatten)]
    pub scene: Map<String, Value>,
}

#[derive(Debug)]
pub struct Simulation {
    pub description: String,
    pub notes: String,
    pub setup: SetupSettings,
    pub render: RenderSettings,
    pub materials: Group<MaterialSettings>,
    pub background: BackgroundScene,
    pub antennas: Antennas,
    pub solver: SolverSettings,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new("Simulation")
    }
}

impl Simulation {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            notes: "Solves for the radio propagation maps".to_string(),
            setup: SetupSettings::new("Setup Settings"),
            render: RenderSettings::new("Render Settings"),
            materials: Group::new("Materials"),
            background: BackgroundScene::new("Background scene"),
            antennas: Antennas::default(),
            solver: SolverSettings::new("Solver Settings"),
        }
    }

    /// Controls of the simulation node itself
    pub fn properties(&self) -> PropertyGroup {
        let mut group = PropertyGroup::with_description(self.description.clone());
        group.add("notes", Widget::Text(self.notes.clone())).description =
            Some("Notes".to_string());
        group
    }

    pub fn clear_status_recursively(&mut self) {
        self.setup.clear_status();
        self.render.clear_status();
        self.materials.clear_status_recursively();
        self.background.clear_status();
        self.antennas.clear_status_recursively();
        self.solver.clear_status();
    }

    /// Clear every status, then validate until the first failure; the
    /// failing node carries the message
    pub fn validate(&mut self) -> bool {
        self.clear_status_recursively();
        self.antennas.validate()
            && self.setup.validate()
            && self.render.validate()
            && self.materials.validate()
            && self.background.validate()
            && self.solver.validate()
    }

    /// The first status message set anywhere in the tree
    pub fn first_failure(&self) -> Option<&str> {
        let nodes: [&dyn SettingsNode; 5] = [
            &self.antennas,
            &self.setup,
            &self.render,
            &self.background,
            &self.solver,
        ];
        self.antennas
            .transmitters
            .status
            .message()
            .or_else(|| nodes.iter().find_map(|n| n.status().message()))
            .or_else(|| self.materials.iter().find_map(|m| m.status().message()))
            .or_else(|| self.antennas.transmitters.iter().find_map(|t| t.status().message()))
            .or_else(|| self.antennas.receivers.iter().find_map(|r| r.status().message()))
    }

    /// Serialize the whole simulation for the solver
    ///
    /// Fails with [`Error::ValidationFailed`] unless the simulation validates.
    pub fn as_api_model(
        &mut self,
        results_dir: &Path,
        model: &dyn ActiveModel,
    ) -> Result<SimulationPayload> {
        if !self.validate() {
            let reason = self.first_failure().unwrap_or("unknown reason").to_string();
            return Err(Error::ValidationFailed(reason));
        }

        let mut scene = Map::new();
        scene.insert("Setup_settings".into(), Value::Object(self.setup.to_map(results_dir)?));
        scene.insert("Render_Settings".into(), Value::Object(self.render.to_map(results_dir)?));

        let mut materials = Map::new();
        for (key, material) in self.materials.keyed("mat_") {
            materials.insert(key, Value::Object(material.to_map(results_dir, model)?));
        }
        scene.insert("Materials".into(), Value::Object(materials));

        scene.insert("Antennas".into(), Value::Object(self.antennas.to_map(results_dir)?));
        scene.insert("Solver_Settings".into(), Value::Object(self.solver.to_map(results_dir)?));
        scene.extend(self.background.to_map(results_dir)?);

        info!(
            "Serialized simulation '{}' with {} materials, {} transmitters, {} receivers",
            self.description,
            self.materials.len(),
            self.antennas.transmitters.len(),
            self.antennas.receivers.len()
        );
        Ok(SimulationPayload { scene })
    }

    pub fn geometries(&self, owner: GeometryOwner) -> Option<&Geometries> {
        match owner {
            GeometryOwner::Material(i) => self.materials.get(i).map(|m| m.geometries()),
            GeometryOwner::Transmitter(i) => self.antennas.transmitters.get(i).map(|t| t.geometries()),
            GeometryOwner::Receiver(i) => self.antennas.receivers.get(i).map(|r| r.geometries()),
        }
    }

    fn geometries_mut(&mut self, owner: GeometryOwner) -> Option<&mut Geometries> {
        match owner {
            GeometryOwner::Material(i) => self.materials.get_mut(i).map(|m| m.geometries_mut()),
            GeometryOwner::Transmitter(i) => self
                .antennas
                .transmitters
                .get_mut(i)
                .map(|t| t.geometries_mut()),
            GeometryOwner::Receiver(i) => {
                self.antennas.receivers.get_mut(i).map(|r| r.geometries_mut())
            }
        }
    }

    /// Whether `entity_id` is already assigned anywhere in the simulation
    pub fn references(&self, entity_id: &str) -> bool {
        self.materials.references(entity_id)
            || self.antennas.transmitters.references(entity_id)
            || self.antennas.receivers.references(entity_id)
    }

    /// An entity can be added when it exists with an allowed kind, the owner
    /// has room for it, and nothing else in the simulation references it
    pub fn can_add_geometry(
        &self,
        owner: GeometryOwner,
        entity_id: &str,
        model: &dyn ActiveModel,
    ) -> bool {
        let Some(geometries) = self.geometries(owner) else {
            return false;
        };
        let Some(entity) = model.lookup_entity(entity_id) else {
            return false;
        };
        geometries.allows(entity.kind) && !geometries.is_full() && !self.references(entity_id)
    }

    pub fn add_geometry(
        &mut self,
        owner: GeometryOwner,
        geometry: GeometryRef,
        model: &dyn ActiveModel,
    ) -> Result<()> {
        if !self.can_add_geometry(owner, &geometry.entity_id, model) {
            return Err(Error::GeometryRejected(geometry.entity_id));
        }
        let geometries = self
            .geometries_mut(owner)
            .ok_or_else(|| Error::GeometryRejected(geometry.entity_id.clone()))?;
        debug!("Adding geometry '{}' to {:?}", geometry.description, owner);
        geometries.push(geometry);
        Ok(())
    }

    pub fn remove_geometry(&mut self, owner: GeometryOwner, entity_id: &str) -> Option<GeometryRef> {
        self.geometries_mut(owner)?.remove(entity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, MemoryModel, TriangleMesh};
    use crate::property::{PropertyEvent, PropertyValue};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn model() -> MemoryModel {
        let mut model = MemoryModel::new();
        model.insert("mesh-a", Entity::mesh("Floor", TriangleMesh::default()));
        model.insert("mesh-b", Entity::mesh("Wall", TriangleMesh::default()));
        model.insert("point-a", Entity::vertex("Tx point"));
        model.insert("point-b", Entity::vertex("Rx point"));
        model
    }

    #[test]
    fn test_zero_transmitters_fails_serialization() {
        let mut sim = Simulation::default();
        assert!(!sim.validate());
        assert_eq!(sim.first_failure(), Some("No transmitters defined"));

        let results = tempfile::tempdir().unwrap();
        let err = sim.as_api_model(results.path(), &model()).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(msg) if msg == "No transmitters defined"));
    }

    #[test]
    fn test_validation_clears_stale_status() {
        let mut sim = Simulation::default();
        sim.antennas.transmitters.add();
        sim.setup.config.temperature.min = 0.0;
        sim.setup.config.temperature.value = -5.0;
        assert!(!sim.validate());
        assert!(sim.setup.status().is_set());

        sim.setup.config.temperature.value = 293.0;
        sim.render.config.fov.max = 10.0;
        assert!(!sim.validate());
        assert!(!sim.setup.status().is_set());
        assert!(sim.render.status().is_set());
    }

    #[test]
    fn test_payload_layout() {
        let mut sim = Simulation::default();
        sim.antennas.transmitters.add();
        sim.antennas.receivers.add();
        sim.materials.add();
        sim.add_geometry(GeometryOwner::Material(0), GeometryRef::new("mesh-a", "Floor"), &model())
            .unwrap();

        let results = tempfile::tempdir().unwrap();
        let payload = sim.as_api_model(results.path(), &model()).unwrap();
        let keys: Vec<&str> = payload.scene.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "Setup_settings",
                "Render_Settings",
                "Materials",
                "Antennas",
                "Solver_Settings",
                "base_scene"
            ]
        );
        assert_eq!(payload.scene["base_scene"], json!("Blank"));
        assert_eq!(
            payload.scene["Materials"]["mat_0"]["geometries"],
            json!([{"fname": "input_files/mesh-a.ply", "name": "Floor"}])
        );
        assert!(payload.scene["Antennas"]["receivers"]["rv_0"].is_object());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["Solver_Settings"]["type"], json!("RadioMap"));
    }

    #[test]
    fn test_geometry_uniqueness_across_owners() {
        let model = model();
        let mut sim = Simulation::default();
        sim.materials.add();
        sim.materials.add();
        sim.antennas.transmitters.add();
        sim.antennas.receivers.add();

        sim.add_geometry(GeometryOwner::Material(0), GeometryRef::new("mesh-a", "Floor"), &model)
            .unwrap();
        assert!(!sim.can_add_geometry(GeometryOwner::Material(0), "mesh-a", &model));
        assert!(!sim.can_add_geometry(GeometryOwner::Material(1), "mesh-a", &model));
        assert!(sim.can_add_geometry(GeometryOwner::Material(1), "mesh-b", &model));

        sim.add_geometry(GeometryOwner::Transmitter(0), GeometryRef::new("point-a", "Tx"), &model)
            .unwrap();
        assert!(!sim.can_add_geometry(GeometryOwner::Receiver(0), "point-a", &model));
        assert!(matches!(
            sim.add_geometry(GeometryOwner::Transmitter(0), GeometryRef::new("point-b", "Rx"), &model),
            Err(Error::GeometryRejected(_))
        ));

        sim.remove_geometry(GeometryOwner::Material(0), "mesh-a").unwrap();
        assert!(sim.can_add_geometry(GeometryOwner::Material(1), "mesh-a", &model));
    }

    #[test]
    fn test_entity_kind_is_checked() {
        let model = model();
        let mut sim = Simulation::default();
        sim.materials.add();
        sim.antennas.transmitters.add();
        assert!(!sim.can_add_geometry(GeometryOwner::Material(0), "point-a", &model));
        assert!(!sim.can_add_geometry(GeometryOwner::Transmitter(0), "mesh-a", &model));
        assert!(!sim.can_add_geometry(GeometryOwner::Transmitter(3), "point-a", &model));
        assert!(!sim.can_add_geometry(GeometryOwner::Transmitter(0), "unknown", &model));
    }

    #[test]
    fn test_path_solver_payload() {
        let mut sim = Simulation::default();
        sim.antennas.transmitters.add();
        sim.solver
            .apply("type", &PropertyEvent::modified(PropertyValue::Choice(1)))
            .unwrap();
        let results = tempfile::tempdir().unwrap();
        let payload = sim.as_api_model(results.path(), &model()).unwrap();
        assert_eq!(payload.scene["Solver_Settings"]["type"], json!("Path"));
        assert_eq!(payload.scene["Solver_Settings"]["num_subcarriers"], json!(1024));
    }
}
