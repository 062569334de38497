//! Configuration schemas and their defaults
//!
//! Every settings object in the simulation tree owns one of the structs
//! below. Field order is the order of the property panel and of the
//! serialized output.

use std::fmt;

use crate::adapter::composite::{AntennaArray, Gate, Gated, SamplePositions, Section};
use crate::adapter::{
    Boolean, Camera, File, Integer, Marker, Real, Rescaling, Resizing, Text, Toggle,
    ToggleOption, Vec2, Vec3,
};
use crate::error::ValidationError;
use crate::impl_schema;
use crate::schema::Schema;

pub const IMAGE_FILTERS: &str = concat!(
    "EXR Files (*.exr)|*.exr|",
    "PNG Files (*.png;*.PNG)|*.png;*.PNG|",
    "JPEG Files (*.jpeg;*.jpg)|*.jpeg;*.jpg|",
    "BMP Files (*.bmp)|*.bmp|",
    "TGA Files (*.tga)|*.tga|",
    "All Image Files (*.exr;*.png;*.PNG;*.jpeg;*.jpg;*.bmp;*.tga)|*.exr;*.png;*.PNG;*.jpeg;*.jpg;*.bmp;*.tga|",
);

pub const PY_FILTERS: &str = "Python Files (*.py)|*.py|";

pub const ITU_MATERIALS: &[&str] = &[
    "concrete",
    "brick",
    "plasterboard",
    "wood",
    "glass",
    "ceiling_board",
    "chipboard",
    "plywood",
    "marble",
    "floorboard",
    "metal",
    "very_dry_ground",
    "medium_dry_ground",
    "wet_ground",
];

pub const PRELOADED_SCENES: &[&str] = &[
    "Blank",
    "Box",
    "Box one screen",
    "Box two screens",
    "Double reflector",
    "Etoile",
    "Floor wall",
    "Florence",
    "Munich",
    "Simple reflector",
    "Simple street canyon",
    "Simple street canyon with cars",
    "Simple wedge",
    "Triple reflector",
];

pub const RADIO_MAP_METRICS: &[&str] = &["path_gain", "rss", "sinr"];
pub const SAMPLING_METRICS: &[&str] = &["path_gain", "rss", "SINR"];

const FACTORY_PROMPT: &str = "Select factory source file:";

/// A closed set of alternative schemas, chosen through a `type` control
pub trait ConfigType: Copy + PartialEq + fmt::Debug + 'static {
    const ALL: &'static [Self];

    /// Name shown in the `type` control and serialized as `"type"`
    fn name(self) -> &'static str;

    /// A fresh schema with this type's defaults
    fn schema(self) -> Box<dyn Schema>;

    fn names() -> Vec<String> {
        Self::ALL.iter().map(|t| t.name().to_string()).collect()
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

// Setup

#[derive(Debug)]
pub struct SetupConfig {
    pub frequency: Real,
    pub bandwidth: Real,
    pub temperature: Real,
}

impl_schema!(SetupConfig { frequency, bandwidth, temperature });

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            frequency: Real::labeled(3.5e9, "Frequency"),
            bandwidth: Real::labeled(1e6, "Bandwidth"),
            temperature: Real::labeled(293.0, "Temperature"),
        }
    }
}

#[derive(Debug)]
pub struct BackgroundSceneConfig {
    pub base_scene: Text,
}

impl_schema!(BackgroundSceneConfig { base_scene });

impl Default for BackgroundSceneConfig {
    fn default() -> Self {
        Self {
            base_scene: Text::dropdown(PRELOADED_SCENES, 0, "Base scene"),
        }
    }
}

// Render

#[derive(Debug)]
pub struct CameraConfig {
    pub position: Vec3,
    pub localization: Toggle,
}

impl_schema!(CameraConfig { position, localization });

pub fn camera() -> Camera {
    let schema = CameraConfig {
        position: Vec3::labeled(-250.0, 250.0, 150.0, "Position"),
        localization: Toggle::new(
            "Localization",
            vec![
                ToggleOption::new("look_at", Vec3::new(-15.0, 30.0, 28.0)),
                ToggleOption::new("orientation", Vec3::new(0.0, 0.0, 0.0)),
            ],
        ),
    };
    Section::new(schema, "Camera", "Camera: ")
}

#[derive(Debug)]
pub struct RenderConfig {
    pub fov: Real,
    pub lighting_scale: Real,
    pub resolution: Vec2,
    pub clip_at: Real,
    pub clip_plane_orientation: Vec3,
    pub return_bitmap: Boolean,
    pub num_samples: Integer,
    pub envmap: File,
    pub camera: Camera,
}

impl_schema!(RenderConfig {
    fov,
    lighting_scale,
    resolution,
    clip_at,
    clip_plane_orientation,
    return_bitmap,
    num_samples,
    envmap,
    camera,
});

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov: Real::labeled(45.0, "Field of view"),
            lighting_scale: Real::labeled(1.0, "Lighting scale"),
            resolution: Vec2::labeled(655.0, 500.0, "Resolution"),
            clip_at: Real::labeled(-1.0, "Clip at").extra_case(-1.0),
            clip_plane_orientation: Vec3::labeled(0.0, 0.0, -1.0, "Clip plane orientation"),
            return_bitmap: Boolean::labeled(false, "Return bitmap"),
            num_samples: Integer::labeled(512, "Number of samples"),
            envmap: File::labeled(IMAGE_FILTERS, "Envmap"),
            camera: camera(),
        }
    }
}

// Antennas

#[derive(Debug)]
pub struct AntennaArrayConfig {
    pub num_rows: Integer,
    pub num_cols: Integer,
    pub vertical_spacing: Real,
    pub horizontal_spacing: Real,
    pub pattern: Toggle,
    pub polarization: Toggle,
    pub polarization_model: Toggle,
}

impl_schema!(AntennaArrayConfig {
    num_rows,
    num_cols,
    vertical_spacing,
    horizontal_spacing,
    pattern,
    polarization,
    polarization_model,
});

pub fn antenna_array(label: &str) -> AntennaArray {
    let markers = |names: &[&str]| -> Vec<ToggleOption> {
        names.iter().map(|n| ToggleOption::new(n, Marker)).collect()
    };

    let mut patterns = markers(&["iso", "dipole", "hw_dipole", "tr38901"]);
    let source = File::new(PY_FILTERS).required();
    patterns.push(ToggleOption::new("custom", source).prompt(FACTORY_PROMPT));

    let mut polarizations = markers(&["V", "H", "VH", "cross"]);
    polarizations
        .push(ToggleOption::new("custom", Vec2::new(0.0, 0.0)).prompt("Select slant angles:"));

    let mut models = markers(&["tr38901_1", "tr38902_2"]);
    let source = File::new(PY_FILTERS).required();
    models.push(ToggleOption::new("custom", source).prompt("Select source file:"));

    let schema = AntennaArrayConfig {
        num_rows: Integer::labeled(1, "Number of rows"),
        num_cols: Integer::labeled(1, "Number of columns"),
        vertical_spacing: Real::labeled(0.5, "Vertical spacing").min(0.0),
        horizontal_spacing: Real::labeled(0.5, "Horizontal spacing").min(0.0),
        pattern: Toggle::new("Pattern", patterns),
        polarization: Toggle::new("Polarization", polarizations),
        polarization_model: Toggle::new("Polarization model", models),
    };
    Section::new(schema, label, &format!("{}: ", label))
}

#[derive(Debug)]
pub struct AntennaConfig {
    pub tx_array: AntennaArray,
    pub rx_array: AntennaArray,
}

impl_schema!(AntennaConfig { tx_array, rx_array });

impl Default for AntennaConfig {
    fn default() -> Self {
        Self {
            tx_array: antenna_array("Transmitter array"),
            rx_array: antenna_array("Receiver array"),
        }
    }
}

fn localization() -> Toggle {
    Toggle::new(
        "Localization",
        vec![
            ToggleOption::new("orientation", Vec3::new(0.0, 0.0, 0.0)),
            ToggleOption::new("look_at", Vec3::new(0.0, 0.0, 0.0)),
        ],
    )
}

#[derive(Debug)]
pub struct TransmitterConfig {
    pub position: Vec3,
    pub power_dbm: Real,
    pub localization: Toggle,
    pub velocity: Vec3,
}

impl_schema!(TransmitterConfig { position, power_dbm, localization, velocity });

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            position: Vec3::labeled(0.0, 0.0, 0.0, "Position"),
            power_dbm: Real::labeled(44.0, "Power dBm"),
            localization: localization(),
            velocity: Vec3::labeled(0.0, 0.0, 0.0, "Velocity"),
        }
    }
}

#[derive(Debug)]
pub struct ReceiverConfig {
    pub position: Vec3,
    pub localization: Toggle,
    pub velocity: Vec3,
}

impl_schema!(ReceiverConfig { position, localization, velocity });

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            position: Vec3::labeled(0.0, 0.0, 0.0, "Position"),
            localization: localization(),
            velocity: Vec3::labeled(0.0, 0.0, 0.0, "Velocity"),
        }
    }
}

// Materials

#[derive(Debug)]
pub struct ItuMaterialConfig {
    #[allow(non_snake_case)]
    pub ITU_name: Text,
}

impl_schema!(ItuMaterialConfig { ITU_name });

impl Default for ItuMaterialConfig {
    fn default() -> Self {
        Self {
            ITU_name: Text::dropdown(ITU_MATERIALS, 0, "ITU name"),
        }
    }
}

#[derive(Debug)]
pub struct CustomMaterialConfig {
    pub thickness: Real,
    pub relative_permittivity: Real,
    pub conductivity: Real,
    pub scattering_coefficient: Real,
    pub xpd_coefficient: Real,
    pub scattering_pattern: Toggle,
}

impl_schema!(CustomMaterialConfig {
    thickness,
    relative_permittivity,
    conductivity,
    scattering_coefficient,
    xpd_coefficient,
    scattering_pattern,
});

impl Default for CustomMaterialConfig {
    fn default() -> Self {
        let patterns = vec![
            ToggleOption::new("lambertian", Marker),
            ToggleOption::new("directive", Marker),
            ToggleOption::new("backscattering", Marker),
            ToggleOption::new("custom", File::new(PY_FILTERS).required()).prompt(FACTORY_PROMPT),
        ];
        Self {
            thickness: Real::labeled(0.1, "Thickness"),
            relative_permittivity: Real::labeled(1.0, "Relative Permittivity"),
            conductivity: Real::labeled(0.0, "Conductivity"),
            scattering_coefficient: Real::labeled(0.0, "Scattering coefficient"),
            xpd_coefficient: Real::labeled(0.0, "XPD coefficient"),
            scattering_pattern: Toggle::new("Scattering pattern", patterns),
        }
    }
}

/// Material models selectable through the material's `type` control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialType {
    ItuMaterials,
    CustomMaterials,
}

impl ConfigType for MaterialType {
    const ALL: &'static [Self] = &[MaterialType::ItuMaterials, MaterialType::CustomMaterials];

    fn name(self) -> &'static str {
        match self {
            MaterialType::ItuMaterials => "ITUMaterials",
            MaterialType::CustomMaterials => "CustomMaterials",
        }
    }

    fn schema(self) -> Box<dyn Schema> {
        match self {
            MaterialType::ItuMaterials => Box::new(ItuMaterialConfig::default()),
            MaterialType::CustomMaterials => Box::new(CustomMaterialConfig::default()),
        }
    }
}

// Solver

#[derive(Debug)]
pub struct ResizingConfig {
    pub activate: Boolean,
    pub center: Vec3,
    pub orientation: Vec3,
    pub size: Vec2,
}

impl_schema!(ResizingConfig { activate, center, orientation, size });

impl Gated for ResizingConfig {
    fn active(&self) -> bool {
        self.activate.value
    }

    fn check_active(&self) -> Result<(), ValidationError> {
        if self.size.value.iter().any(|s| *s < 0.0) {
            return Err(ValidationError::new("Size cannot be negative"));
        }
        Ok(())
    }
}

pub fn resizing() -> Resizing {
    let schema = ResizingConfig {
        activate: Boolean::new(false),
        center: Vec3::labeled(0.0, 0.0, 0.0, "Center"),
        orientation: Vec3::labeled(0.0, 0.0, 0.0, "Orientation"),
        size: Vec2::labeled(400.0, 400.0, "Size"),
    };
    Gate::new(schema, "Resizing", "Resizing: ")
}

#[derive(Debug)]
pub struct RescalingConfig {
    pub activate: Boolean,
    pub rm_vmax: Real,
    pub rm_vmin: Real,
}

impl_schema!(RescalingConfig { activate, rm_vmax, rm_vmin });

impl Gated for RescalingConfig {
    fn active(&self) -> bool {
        self.activate.value
    }

    fn check_active(&self) -> Result<(), ValidationError> {
        if self.rm_vmin.value > self.rm_vmax.value {
            return Err(ValidationError::new("VMin cannot be higher than VMax"));
        }
        Ok(())
    }
}

pub fn rescaling() -> Rescaling {
    let schema = RescalingConfig {
        activate: Boolean::new(false),
        rm_vmax: Real::labeled(-1.0, "Vmax"),
        rm_vmin: Real::labeled(-1.0, "Vmin"),
    };
    Gate::new(schema, "Rescaling", "Rescaling: ")
}

#[derive(Debug)]
pub struct SamplePositionsConfig {
    pub activate: Boolean,
    pub num_positions: Integer,
    pub metric: Text,
    pub min_val_db: Real,
    pub max_val_db: Real,
    pub min_dist: Real,
    pub max_dist: Real,
    pub tx_association: Boolean,
    pub center_pos: Boolean,
    pub seed: Integer,
}

impl_schema!(SamplePositionsConfig {
    activate,
    num_positions,
    metric,
    min_val_db,
    max_val_db,
    min_dist,
    max_dist,
    tx_association,
    center_pos,
    seed,
});

impl Gated for SamplePositionsConfig {
    fn active(&self) -> bool {
        self.activate.value
    }

    fn check_active(&self) -> Result<(), ValidationError> {
        if self.min_val_db.value > self.max_val_db.value {
            return Err(ValidationError::new(
                "Min. dB value cannot be higher than Max. dB value",
            ));
        }
        if self.min_dist.value > self.max_dist.value {
            return Err(ValidationError::new(
                "Min. distance cannot be higher than Max. distance",
            ));
        }
        Ok(())
    }
}

pub fn sample_positions() -> SamplePositions {
    let schema = SamplePositionsConfig {
        activate: Boolean::new(false),
        num_positions: Integer::labeled(100, "Number of positions").range(1, Integer::DEFAULT_MAX),
        metric: Text::dropdown(SAMPLING_METRICS, 0, "Sampling metric"),
        min_val_db: Real::labeled(-100.0, "Min. dB value"),
        max_val_db: Real::labeled(200.0, "Max. dB value"),
        min_dist: Real::labeled(50.0, "Min. distance"),
        max_dist: Real::labeled(1000.0, "Max. distance"),
        tx_association: Boolean::labeled(true, "Transmitter association"),
        center_pos: Boolean::labeled(false, "Center position"),
        seed: Integer::labeled(1, "Seed"),
    };
    Gate::new(schema, "Sample positions", "Sample positions: ")
}

#[derive(Debug)]
pub struct RadioMapConfig {
    pub samples: Integer,
    pub los: Boolean,
    pub specular_reflection: Boolean,
    pub diffuse_reflection: Boolean,
    pub refraction: Boolean,
    pub max_depth: Integer,
    pub seed: Integer,
    pub stop_threshold: Integer,
    pub cell_size: Vec2,
    pub rr_depth: Integer,
    pub rr_prob: Real,
    pub rm_db_scale: Boolean,
    pub rm_metric: Text,
    pub rm_show_color_bar: Boolean,
    pub resizing: Resizing,
    pub rescaling: Rescaling,
    pub sample_positions: SamplePositions,
}

impl_schema!(RadioMapConfig {
    samples,
    los,
    specular_reflection,
    diffuse_reflection,
    refraction,
    max_depth,
    seed,
    stop_threshold,
    cell_size,
    rr_depth,
    rr_prob,
    rm_db_scale,
    rm_metric,
    rm_show_color_bar,
    resizing,
    rescaling,
    sample_positions,
});

impl Default for RadioMapConfig {
    fn default() -> Self {
        Self {
            samples: Integer::labeled(1_000_000, "Samples"),
            los: Boolean::labeled(true, "Line of Sight"),
            specular_reflection: Boolean::labeled(true, "Specular reflection"),
            diffuse_reflection: Boolean::labeled(false, "Diffuse reflection"),
            refraction: Boolean::labeled(true, "Refraction"),
            max_depth: Integer::labeled(3, "Max depth"),
            seed: Integer::labeled(42, "Seed"),
            stop_threshold: Integer::labeled(-20000, "Stop threshold"),
            cell_size: Vec2::labeled(5.0, 5.0, "Cell size"),
            rr_depth: Integer::labeled(-1, "Russian roulette depth"),
            rr_prob: Real::labeled(0.95, "Russian roulette probability"),
            rm_db_scale: Boolean::labeled(true, "dB scale"),
            rm_metric: Text::dropdown(RADIO_MAP_METRICS, 0, "Metric to show"),
            rm_show_color_bar: Boolean::labeled(false, "Show colorbar"),
            resizing: resizing(),
            rescaling: rescaling(),
            sample_positions: sample_positions(),
        }
    }
}

#[derive(Debug)]
pub struct PathConfig {
    pub max_depth: Integer,
    pub max_number_paths_per_src: Integer,
    pub samples: Integer,
    pub synthetic_array: Boolean,
    pub los: Boolean,
    pub specular_reflection: Boolean,
    pub diffuse_reflection: Boolean,
    pub refraction: Boolean,
    pub seed: Integer,
    pub num_subcarriers: Integer,
    pub subcarrier_spacing: Real,
    pub low_pass_bandwidth: Real,
    pub l_min: Real,
    pub l_max: Real,
    pub normalize_energy: Boolean,
    pub normalize_delays: Boolean,
    pub sampling_frequency: Toggle,
}

impl_schema!(PathConfig {
    max_depth,
    max_number_paths_per_src,
    samples,
    synthetic_array,
    los,
    specular_reflection,
    diffuse_reflection,
    refraction,
    seed,
    num_subcarriers,
    subcarrier_spacing,
    low_pass_bandwidth,
    l_min,
    l_max,
    normalize_energy,
    normalize_delays,
    sampling_frequency,
});

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_depth: Integer::labeled(10, "Max depth"),
            max_number_paths_per_src: Integer::labeled(1_000_000, "Max # paths per source"),
            samples: Integer::labeled(1_000_000, "Samples"),
            synthetic_array: Boolean::labeled(true, "Synthetic array"),
            los: Boolean::labeled(false, "Line of Sight"),
            specular_reflection: Boolean::labeled(false, "Specular reflection"),
            diffuse_reflection: Boolean::labeled(false, "Diffuse reflection"),
            refraction: Boolean::labeled(false, "Refraction"),
            seed: Integer::labeled(10, "Seed"),
            num_subcarriers: Integer::labeled(1024, "Number of subcarriers"),
            subcarrier_spacing: Real::labeled(30e3, "Subcarrier spacing"),
            low_pass_bandwidth: Real::labeled(100e6, "Low pass bandwidth").min(0.0),
            l_min: Real::labeled(0.0, "Minimum time lag"),
            l_max: Real::labeled(100.0, "Maximum time lag"),
            normalize_energy: Boolean::labeled(true, "Normalize energy"),
            normalize_delays: Boolean::labeled(true, "Normalize delays"),
            sampling_frequency: Toggle::new(
                "Sampling frequency",
                vec![
                    ToggleOption::new("Nyquist", Marker),
                    ToggleOption::new("Custom", Real::new(1.0 / 100e6)),
                ],
            ),
        }
    }
}

/// Solver modes selectable through the solver's `type` control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverType {
    RadioMap,
    Path,
}

impl ConfigType for SolverType {
    const ALL: &'static [Self] = &[SolverType::RadioMap, SolverType::Path];

    fn name(self) -> &'static str {
        match self {
            SolverType::RadioMap => "RadioMap",
            SolverType::Path => "Path",
        }
    }

    fn schema(self) -> Box<dyn Schema> {
        match self {
            SolverType::RadioMap => Box::new(RadioMapConfig::default()),
            SolverType::Path => Box::new(PathConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{format_fields, validate_fields};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::path::Path;

    fn names(schema: &dyn Schema) -> Vec<&'static str> {
        schema.fields().into_iter().map(|(n, _)| n).collect()
    }

    #[test]
    fn test_defaults_validate() {
        for ty in MaterialType::ALL {
            assert!(validate_fields(ty.schema().as_ref()).is_ok(), "{}", ty.name());
        }
        for ty in SolverType::ALL {
            assert!(validate_fields(ty.schema().as_ref()).is_ok(), "{}", ty.name());
        }
        assert!(validate_fields(&RenderConfig::default()).is_ok());
        assert!(validate_fields(&AntennaConfig::default()).is_ok());
    }

    #[test]
    fn test_radio_map_field_order() {
        assert_eq!(
            names(&RadioMapConfig::default()),
            vec![
                "samples",
                "los",
                "specular_reflection",
                "diffuse_reflection",
                "refraction",
                "max_depth",
                "seed",
                "stop_threshold",
                "cell_size",
                "rr_depth",
                "rr_prob",
                "rm_db_scale",
                "rm_metric",
                "rm_show_color_bar",
                "resizing",
                "rescaling",
                "sample_positions",
            ]
        );
    }

    #[test]
    fn test_setup_serialization() {
        let out = format_fields(&SetupConfig::default(), Path::new("/tmp")).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({"frequency": 3.5e9, "bandwidth": 1e6, "temperature": 293.0})
        );
    }

    #[test]
    fn test_antenna_array_defaults_serialize_markers_as_names() {
        let out = format_fields(&AntennaConfig::default(), Path::new("/tmp")).unwrap();
        assert_eq!(
            out["tx_array"],
            json!({
                "num_rows": 1,
                "num_cols": 1,
                "vertical_spacing": 0.5,
                "horizontal_spacing": 0.5,
                "pattern": "iso",
                "polarization": "V",
                "polarization_model": "tr38901_1"
            })
        );
    }

    #[test]
    fn test_render_clip_at_sentinel_serializes_null() {
        let out = format_fields(&RenderConfig::default(), Path::new("/tmp")).unwrap();
        assert_eq!(out["clip_at"], Value::Null);
        assert_eq!(out["envmap"], Value::Null);
        assert_eq!(out["resolution"], json!([655.0, 500.0]));
    }

    #[test]
    fn test_negative_spacing_fails_with_array_prefix() {
        let mut antennas = AntennaConfig::default();
        antennas.tx_array.schema.vertical_spacing.value = -0.5;
        let err = validate_fields(&antennas).unwrap_err();
        assert!(err.message().starts_with("Transmitter array: Select a real value"));
    }

    #[test]
    fn test_sample_positions_distance_order() {
        let mut radio_map = RadioMapConfig::default();
        radio_map.sample_positions.schema.activate.value = true;
        radio_map.sample_positions.schema.min_dist.value = 2000.0;
        assert_eq!(
            validate_fields(&radio_map).unwrap_err().message(),
            "Sample positions: Min. distance cannot be higher than Max. distance"
        );
    }
}
