//! Antenna arrays, transmitters and receivers

use std::path::Path;

use serde_json::{Map, Value};

use super::group::{Group, GroupElement};
use super::settings::Settings;
use super::{EntityKind, Geometries, SettingsNode, Status};
use crate::adapter::UpdateEffect;
use crate::catalog::{AntennaConfig, ReceiverConfig, TransmitterConfig};
use crate::error::Result;
use crate::property::{PropertyEvent, PropertyGroup};
use crate::schema::Schema;

const STATION_ENTITIES: &[EntityKind] = &[EntityKind::Vertex];

pub type Transmitter = Station<TransmitterConfig>;
pub type Receiver = Station<ReceiverConfig>;

/// Naming of one kind of station in the tree
pub trait StationKind: Schema + Default {
    const BASE_DESCRIPTION: &'static str;
    const PANEL_DESCRIPTION: &'static str;
}

impl StationKind for TransmitterConfig {
    const BASE_DESCRIPTION: &'static str = "Transmitter";
    const PANEL_DESCRIPTION: &'static str = "Transmitter Settings";
}

impl StationKind for ReceiverConfig {
    const BASE_DESCRIPTION: &'static str = "Receiver";
    const PANEL_DESCRIPTION: &'static str = "Receiver Settings";
}

/// A transmitter or receiver, placed at most at one vertex of the model
#[derive(Debug)]
pub struct Station<S: StationKind> {
    pub settings: Settings<S>,
    pub geometries: Geometries,
}

impl<S: StationKind> Station<S> {
    pub fn new(description: &str) -> Self {
        Self {
            settings: Settings::new(description),
            geometries: Geometries::new(STATION_ENTITIES, Some(1)),
        }
    }

    pub fn to_map(&self, results_dir: &Path) -> Result<Map<String, Value>> {
        self.settings.to_map(results_dir)
    }
}

impl<S: StationKind> SettingsNode for Station<S> {
    fn description(&self) -> &str {
        &self.settings.description
    }

    fn properties(&self) -> PropertyGroup {
        let mut group = self.settings.properties();
        group.description = Some(S::PANEL_DESCRIPTION.to_string());
        group
    }

    fn apply(&mut self, field: &str, event: &PropertyEvent) -> Result<UpdateEffect> {
        self.settings.apply(field, event)
    }

    fn validate(&mut self) -> bool {
        if self.geometries.exceeds_limit() {
            self.settings.status.set(format!(
                "A {} can only be placed at one geometry",
                S::BASE_DESCRIPTION.to_lowercase()
            ));
            return false;
        }
        self.settings.validate()
    }

    fn status(&self) -> &Status {
        &self.settings.status
    }

    fn clear_status(&mut self) {
        self.settings.clear_status();
    }
}

impl<S: StationKind> GroupElement for Station<S> {
    const BASE_DESCRIPTION: &'static str = S::BASE_DESCRIPTION;

    fn create(description: String) -> Self {
        Self::new(&description)
    }

    fn geometries(&self) -> &Geometries {
        &self.geometries
    }

    fn geometries_mut(&mut self) -> &mut Geometries {
        &mut self.geometries
    }
}

/// Array configuration shared by all stations, plus the stations themselves
#[derive(Debug)]
pub struct Antennas {
    pub settings: Settings<AntennaConfig>,
    pub transmitters: Group<Transmitter>,
    pub receivers: Group<Receiver>,
}

impl Default for Antennas {
    fn default() -> Self {
        Self {
            settings: Settings::new("Antennas"),
            transmitters: Group::new("Transmitters"),
            receivers: Group::new("Receivers"),
        }
    }
}

impl Antennas {
    /// Array fields, then `transmitters` keyed `tr_<n>` and `receivers`
    /// keyed `rv_<n>`
    pub fn to_map(&self, results_dir: &Path) -> Result<Map<String, Value>> {
        let mut output = self.settings.to_map(results_dir)?;

        let mut transmitters = Map::new();
        for (key, transmitter) in self.transmitters.keyed("tr_") {
            transmitters.insert(key, Value::Object(transmitter.to_map(results_dir)?));
        }
        output.insert("transmitters".to_string(), Value::Object(transmitters));

        let mut receivers = Map::new();
        for (key, receiver) in self.receivers.keyed("rv_") {
            receivers.insert(key, Value::Object(receiver.to_map(results_dir)?));
        }
        output.insert("receivers".to_string(), Value::Object(receivers));

        Ok(output)
    }

    pub fn clear_status_recursively(&mut self) {
        self.settings.clear_status();
        self.transmitters.clear_status_recursively();
        self.receivers.clear_status_recursively();
    }
}

impl SettingsNode for Antennas {
    fn description(&self) -> &str {
        &self.settings.description
    }

    fn properties(&self) -> PropertyGroup {
        self.settings.properties()
    }

    fn apply(&mut self, field: &str, event: &PropertyEvent) -> Result<UpdateEffect> {
        self.settings.apply(field, event)
    }

    /// Requires at least one transmitter, then checks the arrays and every
    /// station
    fn validate(&mut self) -> bool {
        if self.transmitters.is_empty() {
            self.transmitters.status.set("No transmitters defined");
            return false;
        }
        self.settings.validate() && self.transmitters.validate() && self.receivers.validate()
    }

    fn status(&self) -> &Status {
        &self.settings.status
    }

    fn clear_status(&mut self) {
        self.settings.clear_status();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeometryRef;
    use crate::property::PropertyValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_requires_a_transmitter() {
        let mut antennas = Antennas::default();
        assert!(!antennas.validate());
        assert_eq!(antennas.transmitters.status.message(), Some("No transmitters defined"));

        antennas.transmitters.add();
        antennas.clear_status_recursively();
        assert!(antennas.validate());
        assert!(!antennas.transmitters.status.is_set());
    }

    #[test]
    fn test_station_keys_and_fields() {
        let mut antennas = Antennas::default();
        let index = antennas.transmitters.add();
        antennas.receivers.add();
        antennas
            .transmitters
            .get_mut(index)
            .unwrap()
            .apply("power_dbm", &PropertyEvent::modified(PropertyValue::Real(30.0)))
            .unwrap();

        let out = antennas.to_map(Path::new("/tmp")).unwrap();
        let keys: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["tx_array", "rx_array", "transmitters", "receivers"]);
        assert_eq!(
            out["transmitters"]["tr_0"],
            json!({
                "position": [0.0, 0.0, 0.0],
                "power_dbm": 30.0,
                "localization": {"orientation": [0.0, 0.0, 0.0]},
                "velocity": [0.0, 0.0, 0.0]
            })
        );
        assert!(out["receivers"]["rv_0"].get("power_dbm").is_none());
    }

    #[test]
    fn test_station_with_two_geometries_is_invalid() {
        let mut transmitter = Transmitter::new("Transmitter 1");
        transmitter.geometries.push(GeometryRef::new("a", "A"));
        assert!(transmitter.validate());
        transmitter.geometries.push(GeometryRef::new("b", "B"));
        assert!(!transmitter.validate());
        assert_eq!(
            transmitter.status().message(),
            Some("A transmitter can only be placed at one geometry")
        );
    }

    #[test]
    fn test_new_stations_are_numbered() {
        let mut antennas = Antennas::default();
        antennas.receivers.add();
        antennas.receivers.add();
        antennas.receivers.remove(0);
        antennas.receivers.add();
        let names: Vec<&str> = antennas.receivers.iter().map(|r| r.description()).collect();
        assert_eq!(names, vec!["Receiver 2", "Receiver 3"]);
    }
}
