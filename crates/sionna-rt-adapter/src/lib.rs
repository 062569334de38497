//! sionna-rt-adapter: Sionna RT ray-tracing simulations for a host CAD application
//!
//! This crate provides:
//! - Typed property adapters that draw, edit, validate and serialize settings
//! - The simulation aggregate and its tree navigation for the host explorer
//! - Export of the solver input (`input_files/input_file.json` plus meshes)
//! - Generation of the Sionna RT Python solver script
//! - Result extraction from `summary.json` into plot descriptions

pub mod adapter;
pub mod api;
pub mod catalog;
pub mod driver;
pub mod error;
pub mod manager;
pub mod model;
pub mod navigation;
pub mod property;
pub mod results;
pub mod schema;

pub use adapter::{Adapter, UpdateEffect};
pub use api::SimulationInput;
pub use driver::{generate_solver_script, DriverConfig};
pub use error::{Error, Result, ValidationError};
pub use manager::{Command, SimulationManager};
pub use model::{ActiveModel, Simulation};
pub use results::ResultExtractor;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

/// Solver inputs below the results directory
pub const INPUT_FILES_DIR: &str = "input_files";
/// Solver outputs below the results directory
pub const OUTPUT_FILES_DIR: &str = "output_files";
pub const INPUT_FILE_NAME: &str = "input_file.json";

/// Validate `simulation` and write its solver input below `results_dir`;
/// returns the path of the written `input_file.json`
pub fn export_simulation(
    simulation: &mut Simulation,
    results_dir: &Path,
    model: &dyn ActiveModel,
) -> Result<PathBuf> {
    let input_dir = results_dir.join(INPUT_FILES_DIR);
    fs::create_dir_all(&input_dir)?;

    let payload = simulation.as_api_model(results_dir, model)?;
    let path = input_dir.join(INPUT_FILE_NAME);
    fs::write(&path, serde_json::to_string_pretty(&payload)?)?;

    info!("Exported simulation '{}' to {:?}", simulation.description, path);
    Ok(path)
}
