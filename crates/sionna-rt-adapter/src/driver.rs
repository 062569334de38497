//! Sionna RT solver script generation
//!
//! The driver turns a [`SimulationInput`] into a self-contained Python
//! script that builds the scene, runs the selected solver, renders the
//! scene and writes `summary.json` for the result extractor.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{context, Environment, ErrorKind};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::SimulationInput;
use crate::catalog::PRELOADED_SCENES;
use crate::error::Result;
use crate::INPUT_FILES_DIR;

pub const SUMMARY_FILE: &str = "summary.json";

const SOLVER_TEMPLATE: &str = r##"#!/usr/bin/env python3
"""
Sionna RT simulation - generated by sionna-rt-driver
{{ header_comment }}

Generated: {{ timestamp }}
Solver: {{ solver.type }}
"""

import importlib.util
import inspect
import json
import logging
import os
import sys

import mitsuba as mi
import numpy as np
import sionna.rt as rt
from sionna.rt import (
    ScatteringPattern,
    register_antenna_pattern,
    register_polarization,
    register_polarization_model,
    register_scattering_pattern,
)

INPUT_ROOT = {{ input_root|py }}
OUTPUT_DIR = {{ output_dir|py }}
SUMMARY_FILE = os.path.join(OUTPUT_DIR, {{ summary_file|py }})
RENDER_FILE = os.path.join(OUTPUT_DIR, {{ render_file|py }})
LOG_FILE = os.path.join(OUTPUT_DIR, {{ log_file|py }})
PREFIX = {{ prefix|py }}

os.makedirs(OUTPUT_DIR, exist_ok=True)
logging.basicConfig(
    level=logging.DEBUG,
    format="%(asctime)s [%(levelname)s] %(message)s",
    handlers=[logging.FileHandler(LOG_FILE), logging.StreamHandler(sys.stdout)],
)
logger = logging.getLogger("sionna-rt-solver")


# =============================================================================
# Custom pattern registration
# =============================================================================

def load_module(path):
    spec = importlib.util.spec_from_file_location("user_patterns", os.path.join(INPUT_ROOT, path))
    module = importlib.util.module_from_spec(spec)
    spec.loader.exec_module(module)
    return module


def register_antenna_patterns(path):
    """Register factories accepting polarization and polarization_model."""
    registered = []
    for name, obj in inspect.getmembers(load_module(path), inspect.isfunction):
        params = inspect.signature(obj).parameters
        if "polarization" in params and "polarization_model" in params:
            register_antenna_pattern(PREFIX + name, obj)
            registered.append(PREFIX + name)
            logger.debug("Registered antenna pattern: %s", PREFIX + name)
    return registered


def register_polarization_slants(name, slant_angles):
    """Register a polarization given by one or two slant angles."""
    if not (
        isinstance(slant_angles, list)
        and len(slant_angles) in (1, 2)
        and all(isinstance(x, float) for x in slant_angles)
    ):
        raise ValueError(f"Invalid slant angles for {name}: {slant_angles}")
    register_polarization(PREFIX + name, slant_angles)
    logger.debug("Registered polarization: %s", PREFIX + name)
    return PREFIX + name


def register_polarization_models(path):
    """Register functions shaped like (theta, phi, c_tilde_theta, slant_angle)."""
    registered = []
    for name, obj in inspect.getmembers(load_module(path), inspect.isfunction):
        if len(inspect.signature(obj).parameters) == 4:
            register_polarization_model(PREFIX + name, obj)
            registered.append(PREFIX + name)
            logger.debug("Registered polarization model: %s", PREFIX + name)
    return registered


def register_scattering_patterns(path):
    """Register ScatteringPattern subclasses."""
    registered = []
    for name, obj in inspect.getmembers(load_module(path), inspect.isclass):
        if issubclass(obj, ScatteringPattern) and obj is not ScatteringPattern:
            register_scattering_pattern(PREFIX + name, obj)
            registered.append(PREFIX + name)
            logger.debug("Registered scattering pattern: %s", PREFIX + name)
    return registered


def finite(array):
    """Real array as nested lists with non-finite values as None."""
    return np.where(np.isfinite(array), array, None).tolist()


def encode(obj):
    if isinstance(obj, complex):
        return {"real": obj.real, "imag": obj.imag}
    raise TypeError(f"Object of type {type(obj).__name__} is not JSON serializable")


def write_summary(summary):
    with open(SUMMARY_FILE, "w") as f:
        json.dump(summary, f, indent=2, default=encode)
    logger.info("Summary written to %s", SUMMARY_FILE)


# =============================================================================
# Scene
# =============================================================================

{% if scene_attr %}
scene = rt.load_scene(rt.scene.{{ scene_attr }})
{% else %}
scene = rt.load_scene()
{% endif %}
scene.frequency = {{ setup.frequency|py }}
scene.bandwidth = {{ setup.bandwidth|py }}
scene.temperature = {{ setup.temperature|py }}


# =============================================================================
# Antennas
# =============================================================================

{% macro planar_array(attr, array) %}
scene.{{ attr }} = rt.PlanarArray(
    num_rows={{ array.num_rows|py }},
    num_cols={{ array.num_cols|py }},
    vertical_spacing={{ array.vertical_spacing|py }},
    horizontal_spacing={{ array.horizontal_spacing|py }},
{% if array.pattern is string %}
    pattern={{ array.pattern|py }},
{% else %}
    pattern=register_antenna_patterns({{ array.pattern.custom|py }})[0],
{% endif %}
{% if array.polarization is string %}
    polarization={{ array.polarization|py }},
{% else %}
    polarization=register_polarization_slants({{ attr|py }}, {{ array.polarization.custom|py }}),
{% endif %}
{% if array.polarization_model is string %}
    polarization_model={{ array.polarization_model|py }},
{% else %}
    polarization_model=register_polarization_models({{ array.polarization_model.custom|py }})[0],
{% endif %}
)
{% endmacro %}
{% macro placement(station) %}
    position={{ station.position|py }},
{% if station.localization.look_at is defined %}
    look_at={{ station.localization.look_at|py }},
{% else %}
    orientation={{ station.localization.orientation|py }},
{% endif %}
{% if station.velocity is zero %}
    velocity=None,
{% else %}
    velocity={{ station.velocity|py }},
{% endif %}
{% endmacro %}
{{ planar_array("tx_array", antennas.tx_array) }}
{{ planar_array("rx_array", antennas.rx_array) }}
{% for name, transmitter in antennas.transmitters %}
scene.add(rt.Transmitter(
    {{ name|py }},
{{ placement(transmitter) }}    power_dbm={{ transmitter.power_dbm|py }},
))
{% endfor %}
{% for name, receiver in antennas.receivers %}
scene.add(rt.Receiver(
    {{ name|py }},
{{ placement(receiver) }}))
{% endfor %}


# =============================================================================
# Materials and objects
# =============================================================================

objects = []
{% for name, material in materials %}
{% if material.type == "ITUMaterials" %}
material = rt.ITURadioMaterial(
    name={{ name|py }},
    itu_type={{ material.ITU_name|py }},
    thickness=0.1,
    color=(0.8, 0.1, 0.1),
)
{% else %}
material = rt.RadioMaterial(
    name={{ name|py }},
    thickness={{ material.thickness|py }},
    relative_permittivity={{ material.relative_permittivity|py }},
    conductivity={{ material.conductivity|py }},
    scattering_coefficient={{ material.scattering_coefficient|py }},
    xpd_coefficient={{ material.xpd_coefficient|py }},
{% if material.scattering_pattern is string %}
    scattering_pattern={{ material.scattering_pattern|py }},
{% else %}
    scattering_pattern=register_scattering_patterns({{ material.scattering_pattern.custom|py }})[0],
{% endif %}
)
{% endif %}
{% for geometry in material.geometries %}
objects.append(rt.SceneObject(
    fname=os.path.join(INPUT_ROOT, {{ geometry.fname|py }}),
    name={{ geometry.name|py }},
    radio_material=material,
))
{% endfor %}
{% endfor %}
if objects:
    scene.edit(add=objects)


# =============================================================================
# Solver
# =============================================================================

camera = rt.Camera(
    position={{ render.camera.position|py }},
{% if render.camera.localization.look_at is defined %}
    look_at={{ render.camera.localization.look_at|py }},
{% else %}
    orientation={{ render.camera.localization.orientation|py }},
{% endif %}
)

{% macro render_options(render) %}
    fov={{ render.fov|py }},
    lighting_scale={{ render.lighting_scale|py }},
    clip_at={{ render.clip_at|py }},
    clip_plane_orientation={{ render.clip_plane_orientation|py }},
{% if render.envmap %}
    envmap=os.path.join(INPUT_ROOT, {{ render.envmap|py }}),
{% endif %}
    num_samples={{ render.num_samples|py }},
    resolution=({{ render.resolution[0]|int }}, {{ render.resolution[1]|int }}),
{% endmacro %}
{% if solver.type == "RadioMap" %}
radio_map = rt.RadioMapSolver()(
    scene=scene,
{% if solver.resizing.activate %}
    center=mi.Point3f({{ solver.resizing.center|py }}),
    orientation=mi.Point3f({{ solver.resizing.orientation|py }}),
    size=mi.Point2f({{ solver.resizing.size|py }}),
{% endif %}
    cell_size=mi.Point2f({{ solver.cell_size|py }}),
    samples_per_tx={{ solver.samples|py }},
    max_depth={{ solver.max_depth|py }},
    los={{ solver.los|py }},
    specular_reflection={{ solver.specular_reflection|py }},
    diffuse_reflection={{ solver.diffuse_reflection|py }},
    refraction={{ solver.refraction|py }},
    seed={{ solver.seed|py }},
    rr_depth={{ solver.rr_depth|py }},
    rr_prob={{ solver.rr_prob|py }},
    stop_threshold={{ solver.stop_threshold|py }},
)

summary = {
    "type": "RadioMap",
    "path_gain": finite(radio_map.path_gain.numpy()),
    "rss": finite(radio_map.rss.numpy()),
    "sinr": finite(radio_map.sinr.numpy()),
    "image": RENDER_FILE,
}
{% if solver.sample_positions.activate %}

positions, cell_ids = radio_map.sample_positions(
    num_pos={{ solver.sample_positions.num_positions|py }},
    metric={{ solver.sample_positions.metric|py }},
    min_val_db={{ solver.sample_positions.min_val_db|py }},
    max_val_db={{ solver.sample_positions.max_val_db|py }},
    min_dist={{ solver.sample_positions.min_dist|py }},
    max_dist={{ solver.sample_positions.max_dist|py }},
    tx_association={{ solver.sample_positions.tx_association|py }},
    center_pos={{ solver.sample_positions.center_pos|py }},
    seed={{ solver.sample_positions.seed|py }},
)
positions = positions.numpy()
summary["positions"] = positions.tolist()
summary["cell_ids"] = cell_ids.numpy().tolist()
for t, tx_positions in enumerate(positions):
    for p, position in enumerate(tx_positions):
        scene.add(rt.Receiver(f"rx-{t * len(tx_positions) + p}", position=position.tolist(), orientation=[0, 0, 0]))
{% endif %}

scene.render_to_file(
    camera=camera,
    filename=RENDER_FILE,
    radio_map=radio_map,
{{ render_options(render) }}    rm_db_scale={{ solver.rm_db_scale|py }},
{% if solver.rescaling.activate %}
    rm_vmin={{ solver.rescaling.rm_vmin|py }},
    rm_vmax={{ solver.rescaling.rm_vmax|py }},
{% endif %}
    rm_metric={{ solver.rm_metric|py }},
    rm_show_color_bar={{ solver.rm_show_color_bar|py }},
)
{% else %}
paths = rt.PathSolver()(
    scene=scene,
    max_depth={{ solver.max_depth|py }},
    max_num_paths_per_src={{ solver.max_number_paths_per_src|py }},
    samples_per_src={{ solver.samples|py }},
    synthetic_array={{ solver.synthetic_array|py }},
    los={{ solver.los|py }},
    specular_reflection={{ solver.specular_reflection|py }},
    diffuse_reflection={{ solver.diffuse_reflection|py }},
    refraction={{ solver.refraction|py }},
    seed={{ solver.seed|py }},
)

scene.render_to_file(
    camera=camera,
    filename=RENDER_FILE,
    paths=paths,
{{ render_options(render) }})

# a: [num_rx, num_rx_ant, num_tx, num_tx_ant, num_paths, num_time_steps]
# tau: [num_rx, num_rx_ant, num_tx, num_tx_ant, num_paths], in ns
a, tau = paths.cir(normalize_delays=True, out_type="numpy")
tau = tau / 1e-9

frequencies = rt.subcarrier_frequencies({{ solver.num_subcarriers|py }}, {{ solver.subcarrier_spacing|py }})

# h_freq: [num_rx, num_rx_ant, num_tx, num_tx_ant, num_time_steps, num_subcarriers]
h_freq = paths.cfr(
    frequencies=frequencies,
    normalize={{ solver.normalize_energy|py }},
    normalize_delays={{ solver.normalize_delays|py }},
    out_type="numpy",
)

taps = paths.taps(
    bandwidth={{ solver.low_pass_bandwidth|py }},
    l_min={{ solver.l_min|py }},
    l_max={{ solver.l_max|py }},
{% if solver.sampling_frequency is string %}
    sampling_frequency=None,
{% else %}
    sampling_frequency={{ solver.sampling_frequency.Custom|py }},
{% endif %}
    normalize={{ solver.normalize_energy|py }},
    normalize_delays={{ solver.normalize_delays|py }},
    out_type="numpy",
)

summary = {
    "type": "Path",
    "a": a.tolist(),
    "tau": finite(tau),
    "h_freq": h_freq.tolist(),
    "taps": taps.tolist(),
    "image": RENDER_FILE,
}
{% endif %}

write_summary(summary)
"##;

/// Configuration for script generation
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Directory relative input paths (`input_files/...`) resolve against
    pub input_root: PathBuf,
    /// Directory the solver writes its results into
    pub output_dir: PathBuf,
    pub summary_file: String,
    pub render_file: String,
    pub log_file: String,
    pub script_file: String,
    /// Name prefix for registered custom patterns
    pub custom_prefix: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("."),
            output_dir: PathBuf::from(crate::OUTPUT_FILES_DIR),
            summary_file: SUMMARY_FILE.to_string(),
            render_file: "render_file.png".to_string(),
            log_file: "solver.log".to_string(),
            script_file: "solver.py".to_string(),
            custom_prefix: "custom_".to_string(),
        }
    }
}

impl DriverConfig {
    /// Configuration for an input file inside `<results>/input_files/`
    pub fn for_input(input_file: &Path, output_dir: &Path) -> Self {
        let parent = input_file.parent().unwrap_or_else(|| Path::new("."));
        let input_root = match parent.file_name() {
            Some(name) if name == INPUT_FILES_DIR => parent.parent().unwrap_or(parent),
            _ => parent,
        };
        Self {
            input_root: input_root.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            ..Self::default()
        }
    }
}

/// Render a value as a Python literal
fn python_literal(value: minijinja::Value) -> std::result::Result<String, minijinja::Error> {
    let json = serde_json::to_value(&value).map_err(|err| {
        minijinja::Error::new(ErrorKind::InvalidOperation, "value has no Python form")
            .with_source(err)
    })?;
    let mut out = String::new();
    write_python(&json, &mut out);
    Ok(out)
}

fn write_python(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::String(text) => out.push_str(&Value::String(text.clone()).to_string()),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_python(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push_str(": ");
                write_python(item, out);
            }
            out.push('}');
        }
    }
}

fn is_zero(values: Vec<f64>) -> bool {
    values.iter().all(|v| *v == 0.0)
}

/// `rt.scene` attribute of a preloaded scene; `None` loads an empty scene
fn scene_attribute(base_scene: &str) -> Option<String> {
    if base_scene == "Blank" {
        return None;
    }
    if !PRELOADED_SCENES.contains(&base_scene) {
        warn!("Unknown base scene '{}', loading an empty scene", base_scene);
        return None;
    }
    Some(base_scene.to_lowercase().replace(' ', "_"))
}

/// Generate the solver script for a simulation input
pub fn generate_solver_script(input: &SimulationInput, config: &DriverConfig) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("py", python_literal);
    env.add_test("zero", is_zero);
    env.add_template("solver", SOLVER_TEMPLATE)?;

    let template = env.get_template("solver")?;
    let output = template.render(context! {
        header_comment => "Sionna RT ray-tracing run",
        timestamp => chrono::Utc::now().to_rfc3339(),
        input_root => config.input_root.to_string_lossy(),
        output_dir => config.output_dir.to_string_lossy(),
        summary_file => config.summary_file,
        render_file => config.render_file,
        log_file => config.log_file,
        prefix => config.custom_prefix,
        scene_attr => scene_attribute(&input.base_scene),
        setup => input.setup,
        render => input.render,
        antennas => input.antennas,
        materials => input.materials,
        solver => input.solver,
    })?;

    Ok(output)
}

/// Read `input_file`, write the solver script into `output_dir` and return
/// the script's path
pub fn prepare(input_file: &Path, output_dir: &Path) -> Result<PathBuf> {
    let input = SimulationInput::load(input_file)?;
    if !input.extra.is_empty() {
        let keys: Vec<&str> = input.extra.keys().map(String::as_str).collect();
        warn!("Ignoring unknown input sections: {}", keys.join(", "));
    }

    let config = DriverConfig::for_input(input_file, output_dir);
    let script = generate_solver_script(&input, &config)?;

    fs::create_dir_all(output_dir)?;
    let script_path = output_dir.join(&config.script_file);
    fs::write(&script_path, script)?;
    info!(
        "Generated {} solver script {:?} for {} transmitters",
        solver_name(&input),
        script_path,
        input.antennas.transmitters.len()
    );
    Ok(script_path)
}

fn solver_name(input: &SimulationInput) -> &'static str {
    match input.solver {
        crate::api::SolverInput::RadioMap(_) => "RadioMap",
        crate::api::SolverInput::Path(_) => "Path",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MaterialKind, Selection, SolverInput};
    use crate::model::{MemoryModel, SettingsNode, Simulation};
    use crate::property::{PropertyEvent, PropertyValue};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn input(configure: impl FnOnce(&mut Simulation)) -> SimulationInput {
        let mut simulation = Simulation::default();
        simulation.antennas.transmitters.add();
        configure(&mut simulation);
        let results = tempfile::tempdir().unwrap();
        let payload = simulation.as_api_model(results.path(), &MemoryModel::new()).unwrap();
        let json = serde_json::to_string(&payload).unwrap();
        SimulationInput::from_json(&json).unwrap()
    }

    #[test]
    fn test_python_literals() {
        let mut out = String::new();
        write_python(&json!({"a": [1.5, null, true], "b": "x\"y"}), &mut out);
        assert_eq!(out, r#"{"a": [1.5, None, True], "b": "x\"y"}"#);
    }

    #[test]
    fn test_scene_attribute() {
        assert_eq!(scene_attribute("Blank"), None);
        assert_eq!(scene_attribute("Munich").as_deref(), Some("munich"));
        assert_eq!(
            scene_attribute("Simple street canyon with cars").as_deref(),
            Some("simple_street_canyon_with_cars")
        );
        assert_eq!(scene_attribute("Atlantis"), None);
    }

    #[test]
    fn test_radio_map_script() {
        let script = generate_solver_script(&input(|_| {}), &DriverConfig::default()).unwrap();
        assert!(script.contains("scene = rt.load_scene()"));
        assert!(script.contains("scene.temperature = 293.0"));
        assert!(script.contains("rt.RadioMapSolver()("));
        assert!(!script.contains("rt.PathSolver()"));
        assert!(script.contains(r#""tr_0","#));
        assert!(script.contains("velocity=None,"));
        assert!(script.contains("look_at=[-15.0, 30.0, 28.0],"));
        assert!(script.contains(r#"pattern="iso","#));
        assert!(!script.contains("rm_vmin="));
        assert!(!script.contains("radio_map.sample_positions("));
        assert!(script.contains(r#"SUMMARY_FILE = os.path.join(OUTPUT_DIR, "summary.json")"#));
    }

    #[test]
    fn test_path_script() {
        let input = input(|sim| {
            sim.solver
                .apply("type", &PropertyEvent::modified(PropertyValue::Choice(1)))
                .unwrap();
        });
        assert!(matches!(input.solver, SolverInput::Path(_)));

        let script = generate_solver_script(&input, &DriverConfig::default()).unwrap();
        assert!(script.contains("rt.PathSolver()("));
        assert!(!script.contains("RadioMapSolver"));
        assert!(script.contains("sampling_frequency=None,"));
        assert!(script.contains("h_freq = paths.cfr("));
    }

    #[test]
    fn test_custom_registrations() {
        let mut input = input(|_| {});
        input.antennas.tx_array.pattern = Selection::Custom {
            custom: "input_files/patterns.py".to_string(),
        };
        input.antennas.rx_array.polarization = Selection::Custom {
            custom: [45.0, -45.0],
        };
        input.materials.push((
            "mat_0".to_string(),
            crate::api::MaterialInput {
                kind: MaterialKind::Custom {
                    thickness: 0.2,
                    relative_permittivity: 4.0,
                    conductivity: 0.01,
                    scattering_coefficient: 0.3,
                    xpd_coefficient: 0.0,
                    scattering_pattern: Selection::Custom {
                        custom: "input_files/scatter.py".to_string(),
                    },
                },
                geometries: vec![crate::api::GeometryInput {
                    fname: "input_files/wall.ply".to_string(),
                    name: "Wall".to_string(),
                }],
            },
        ));

        let script = generate_solver_script(&input, &DriverConfig::default()).unwrap();
        assert!(script.contains(r#"pattern=register_antenna_patterns("input_files/patterns.py")[0],"#));
        assert!(script.contains(r#"register_polarization_slants("rx_array", [45.0, -45.0])"#));
        assert!(script.contains(r#"register_scattering_patterns("input_files/scatter.py")[0]"#));
        assert!(script.contains(r#"fname=os.path.join(INPUT_ROOT, "input_files/wall.ply"),"#));
        assert!(script.contains("rt.RadioMaterial("));
    }

    #[test]
    fn test_config_for_input_file() {
        let config = DriverConfig::for_input(
            Path::new("/results/input_files/input_file.json"),
            Path::new("/results/output_files"),
        );
        assert_eq!(config.input_root, PathBuf::from("/results"));
        assert_eq!(config.output_dir, PathBuf::from("/results/output_files"));

        let config = DriverConfig::for_input(Path::new("/tmp/run.json"), Path::new("/tmp/out"));
        assert_eq!(config.input_root, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_prepare_writes_script() {
        let results = tempfile::tempdir().unwrap();
        let mut simulation = Simulation::default();
        simulation.antennas.transmitters.add();
        let input_file =
            crate::export_simulation(&mut simulation, results.path(), &MemoryModel::new())
                .unwrap();

        let output_dir = results.path().join(crate::OUTPUT_FILES_DIR);
        let script = prepare(&input_file, &output_dir).unwrap();
        assert_eq!(script, output_dir.join("solver.py"));
        let text = fs::read_to_string(script).unwrap();
        assert!(text.contains("import sionna.rt as rt"));
    }
}
