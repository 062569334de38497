//! Typed view of the solver input file
//!
//! Mirrors the mapping produced by [`Simulation::as_api_model`]. Sections
//! keyed by generated names (`mat_0`, `tr_0`, ...) keep their file order.
//!
//! [`Simulation::as_api_model`]: crate::model::Simulation::as_api_model

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Ordered `(key, value)` pairs of a JSON object
pub type Entries<T> = Vec<(String, T)>;

fn entries<'de, D, T>(deserializer: D) -> std::result::Result<Entries<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let map = Map::<String, Value>::deserialize(deserializer)?;
    map.into_iter()
        .map(|(key, value)| {
            serde_json::from_value(value)
                .map(|item| (key, item))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    #[serde(rename = "Setup_settings")]
    pub setup: SetupInput,
    #[serde(rename = "Render_Settings")]
    pub render: RenderInput,
    #[serde(rename = "Materials", deserialize_with = "entries")]
    pub materials: Entries<MaterialInput>,
    #[serde(rename = "Antennas")]
    pub antennas: AntennasInput,
    #[serde(rename = "Solver_Settings")]
    pub solver: SolverInput,
    pub base_scene: String,
    /// Top-level keys this version does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SimulationInput {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupInput {
    pub frequency: f64,
    pub bandwidth: f64,
    pub temperature: f64,
}

/// Either `{"look_at": [...]}` or `{"orientation": [...]}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Localization {
    LookAt([f64; 3]),
    Orientation([f64; 3]),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInput {
    pub position: [f64; 3],
    pub localization: Localization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderInput {
    pub fov: f64,
    pub lighting_scale: f64,
    pub resolution: [f64; 2],
    pub clip_at: Option<f64>,
    pub clip_plane_orientation: [f64; 3],
    pub return_bitmap: bool,
    pub num_samples: i64,
    pub envmap: Option<String>,
    pub camera: CameraInput,
}

/// A built-in option name, or `{"custom": <value>}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection<T> {
    Builtin(String),
    Custom { custom: T },
}

impl<T> Selection<T> {
    pub fn custom(&self) -> Option<&T> {
        match self {
            Selection::Builtin(_) => None,
            Selection::Custom { custom } => Some(custom),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayInput {
    pub num_rows: i64,
    pub num_cols: i64,
    pub vertical_spacing: f64,
    pub horizontal_spacing: f64,
    /// Built-in pattern or a factory source file
    pub pattern: Selection<String>,
    /// Built-in polarization or custom slant angles
    pub polarization: Selection<[f64; 2]>,
    /// Built-in model or a model source file
    pub polarization_model: Selection<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmitterInput {
    pub position: [f64; 3],
    pub power_dbm: f64,
    pub localization: Localization,
    pub velocity: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverInput {
    pub position: [f64; 3],
    pub localization: Localization,
    pub velocity: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennasInput {
    pub tx_array: ArrayInput,
    pub rx_array: ArrayInput,
    #[serde(deserialize_with = "entries")]
    pub transmitters: Entries<TransmitterInput>,
    #[serde(deserialize_with = "entries")]
    pub receivers: Entries<ReceiverInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryInput {
    pub fname: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MaterialKind {
    #[serde(rename = "ITUMaterials")]
    Itu {
        #[serde(rename = "ITU_name")]
        itu_name: String,
    },
    #[serde(rename = "CustomMaterials")]
    Custom {
        thickness: f64,
        relative_permittivity: f64,
        conductivity: f64,
        scattering_coefficient: f64,
        xpd_coefficient: f64,
        scattering_pattern: Selection<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialInput {
    #[serde(flatten)]
    pub kind: MaterialKind,
    #[serde(default)]
    pub geometries: Vec<GeometryInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizingInput {
    pub activate: bool,
    pub center: [f64; 3],
    pub orientation: [f64; 3],
    pub size: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescalingInput {
    pub activate: bool,
    pub rm_vmax: f64,
    pub rm_vmin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePositionsInput {
    pub activate: bool,
    pub num_positions: i64,
    pub metric: String,
    pub min_val_db: f64,
    pub max_val_db: f64,
    pub min_dist: f64,
    pub max_dist: f64,
    pub tx_association: bool,
    pub center_pos: bool,
    pub seed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioMapInput {
    pub samples: i64,
    pub los: bool,
    pub specular_reflection: bool,
    pub diffuse_reflection: bool,
    pub refraction: bool,
    pub max_depth: i64,
    pub seed: i64,
    pub stop_threshold: i64,
    pub cell_size: [f64; 2],
    pub rr_depth: i64,
    pub rr_prob: f64,
    pub rm_db_scale: bool,
    pub rm_metric: String,
    pub rm_show_color_bar: bool,
    pub resizing: ResizingInput,
    pub rescaling: RescalingInput,
    pub sample_positions: SamplePositionsInput,
}

/// `"Nyquist"` or `{"Custom": <seconds>}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SamplingFrequency {
    Nyquist,
    Custom(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathInput {
    pub max_depth: i64,
    pub max_number_paths_per_src: i64,
    pub samples: i64,
    pub synthetic_array: bool,
    pub los: bool,
    pub specular_reflection: bool,
    pub diffuse_reflection: bool,
    pub refraction: bool,
    pub seed: i64,
    pub num_subcarriers: i64,
    pub subcarrier_spacing: f64,
    pub low_pass_bandwidth: f64,
    pub l_min: f64,
    pub l_max: f64,
    pub normalize_energy: bool,
    pub normalize_delays: bool,
    pub sampling_frequency: SamplingFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SolverInput {
    RadioMap(RadioMapInput),
    Path(PathInput),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemoryModel, Simulation};
    use pretty_assertions::assert_eq;

    fn exported(simulation: &mut Simulation) -> SimulationInput {
        let results = tempfile::tempdir().unwrap();
        let payload = simulation.as_api_model(results.path(), &MemoryModel::new()).unwrap();
        let json = serde_json::to_string(&payload).unwrap();
        SimulationInput::from_json(&json).unwrap()
    }

    #[test]
    fn test_reads_default_simulation() {
        let mut simulation = Simulation::default();
        simulation.antennas.transmitters.add();
        simulation.antennas.receivers.add();

        let input = exported(&mut simulation);
        assert_eq!(input.setup.frequency, 3.5e9);
        assert_eq!(input.base_scene, "Blank");
        assert_eq!(input.render.clip_at, None);
        assert_eq!(input.render.envmap, None);
        assert_eq!(
            input.render.camera.localization,
            Localization::LookAt([-15.0, 30.0, 28.0])
        );
        assert_eq!(input.antennas.tx_array.pattern, Selection::Builtin("iso".to_string()));
        assert_eq!(input.antennas.transmitters.len(), 1);
        assert_eq!(input.antennas.transmitters[0].0, "tr_0");
        assert_eq!(input.antennas.receivers[0].0, "rv_0");
        assert!(input.materials.is_empty());
        assert!(matches!(input.solver, SolverInput::RadioMap(_)));
        assert!(input.extra.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let mut simulation = Simulation::default();
        simulation.antennas.transmitters.add();
        let results = tempfile::tempdir().unwrap();
        let mut payload = simulation.as_api_model(results.path(), &MemoryModel::new()).unwrap();
        payload.scene.insert("plugin_version".into(), Value::from("1.2"));

        let json = serde_json::to_string(&payload).unwrap();
        let input = SimulationInput::from_json(&json).unwrap();
        assert_eq!(input.extra.get("plugin_version"), Some(&Value::from("1.2")));
    }

    #[test]
    fn test_custom_selections() {
        let pattern: Selection<String> =
            serde_json::from_str(r#"{"custom": "input_files/patterns.py"}"#).unwrap();
        assert_eq!(pattern.custom().map(String::as_str), Some("input_files/patterns.py"));

        let polarization: Selection<[f64; 2]> =
            serde_json::from_str(r#"{"custom": [45.0, -45.0]}"#).unwrap();
        assert_eq!(polarization.custom(), Some(&[45.0, -45.0]));

        let nyquist: SamplingFrequency = serde_json::from_str(r#""Nyquist""#).unwrap();
        assert_eq!(nyquist, SamplingFrequency::Nyquist);
        let custom: SamplingFrequency = serde_json::from_str(r#"{"Custom": 1e-8}"#).unwrap();
        assert_eq!(custom, SamplingFrequency::Custom(1e-8));
    }

    #[test]
    fn test_material_kinds() {
        let itu: MaterialInput = serde_json::from_str(
            r#"{"type": "ITUMaterials", "ITU_name": "glass",
                "geometries": [{"fname": "input_files/a.ply", "name": "A"}]}"#,
        )
        .unwrap();
        assert_eq!(
            itu.kind,
            MaterialKind::Itu {
                itu_name: "glass".to_string()
            }
        );
        assert_eq!(itu.geometries[0].fname, "input_files/a.ply");

        let custom: MaterialInput = serde_json::from_str(
            r#"{"type": "CustomMaterials", "thickness": 0.2, "relative_permittivity": 4,
                "conductivity": 0.01, "scattering_coefficient": 0.0, "xpd_coefficient": 0.0,
                "scattering_pattern": "lambertian", "geometries": []}"#,
        )
        .unwrap();
        assert!(matches!(
            custom.kind,
            MaterialKind::Custom { relative_permittivity, .. } if relative_permittivity == 4.0
        ));
    }
}
