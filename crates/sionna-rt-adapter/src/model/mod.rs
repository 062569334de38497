//! Simulation tree model
//!
//! Settings objects own one schema each and report validation failures
//! through a [`Status`] marker instead of an error, so the host can show a
//! warning on the offending tree node.

pub mod antennas;
pub mod geometry;
pub mod group;
pub mod material;
pub mod settings;
pub mod simulation;

pub use antennas::{Antennas, Receiver, Station, Transmitter};
pub use geometry::{ActiveModel, Entity, EntityKind, GeometryRef, Geometries, MemoryModel, TriangleMesh};
pub use group::{Group, GroupElement};
pub use material::MaterialSettings;
pub use settings::{BackgroundScene, RenderSettings, Settings, SetupSettings, SolverSettings, TypedSettings};
pub use simulation::{GeometryOwner, Simulation, SimulationPayload};

use std::fmt;

use tracing::warn;

use crate::adapter::UpdateEffect;
use crate::error::{Result, ValidationError};
use crate::property::{PropertyEvent, PropertyGroup};

/// Warning marker attached to a tree node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    message: Option<String>,
}

impl Status {
    pub fn set(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("Validation failed: {}", message);
        self.message = Some(message);
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.message.is_some()
    }

    /// Record `result` on the marker; true when it passed
    pub(crate) fn record(&mut self, result: std::result::Result<(), ValidationError>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                self.set(err.0);
                false
            }
        }
    }
}

/// A node of the simulation tree that has a property panel
pub trait SettingsNode: fmt::Debug {
    fn description(&self) -> &str;

    /// The controls shown when this node is selected
    fn properties(&self) -> PropertyGroup;

    /// Apply an edit to the field addressed by a dotted path
    fn apply(&mut self, field: &str, event: &PropertyEvent) -> Result<UpdateEffect>;

    /// Validate and mark the node on failure
    fn validate(&mut self) -> bool;

    fn status(&self) -> &Status;

    fn clear_status(&mut self);
}
