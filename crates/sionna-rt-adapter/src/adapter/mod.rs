//! Property adapters
//!
//! Every configurable value is wrapped in an adapter that can:
//! - draw itself into a headless [`PropertyGroup`]
//! - apply edit events coming back from the host UI
//! - validate its current value
//! - serialize itself to a single-key JSON mapping `{field: value}`
//!
//! Composite adapters (toggles, camera, gated sections) own nested schemas
//! and recurse for each of these operations.

pub mod composite;
pub mod file;
pub mod scalar;
pub mod toggle;
pub mod vector;

pub use composite::{Camera, Rescaling, Resizing, Section};
pub use file::File;
pub use scalar::{Boolean, Integer, Marker, Real, Text};
pub use toggle::{Toggle, ToggleOption};
pub use vector::{Rgb, Vec2, Vec3};

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result, ValidationError};
use crate::property::{PropertyEvent, PropertyGroup, PropertyNode};

/// What the host has to do after an edit was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEffect {
    /// The event was not a value modification and was dropped
    Ignored,
    /// The stored value changed, the layout did not
    Value,
    /// The set of visible controls changed; the panel must be drawn again
    Redraw,
}

pub trait Adapter: fmt::Debug {
    /// Add this adapter's control(s) to `parent` under `name`
    fn draw(&self, parent: &mut PropertyGroup, name: &str);

    /// Apply an edit event; events that are not modifications are ignored
    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect>;

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        Ok(())
    }

    /// Serialize as `{name: value}`, copying referenced files below `results_dir`
    fn to_format(&self, name: &str, results_dir: &Path) -> Result<Map<String, Value>>;

    /// Nested adapter addressed by `name`, for composites
    fn field(&self, _name: &str) -> Option<&dyn Adapter> {
        None
    }

    /// Route an edit to the adapter addressed by `path` below this one.
    /// Composites override this to forward to their children and react to
    /// the outcome; leaves only accept an empty path.
    fn apply(&mut self, path: &[&str], event: &PropertyEvent) -> Result<UpdateEffect> {
        match path {
            [] => self.update(event),
            [head, ..] => Err(Error::UnknownField(head.to_string())),
        }
    }

    /// True for branches that carry no data of their own
    fn is_marker(&self) -> bool {
        false
    }
}

pub(crate) fn single(name: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(name.to_string(), value);
    map
}

pub(crate) fn mismatch(expected: &'static str) -> Error {
    Error::ValueMismatch {
        field: String::new(),
        expected,
    }
}

/// Attach the field name to a mismatch raised by a leaf adapter
pub(crate) fn in_field(err: Error, field: &str) -> Error {
    match err {
        Error::ValueMismatch { field: f, expected } if f.is_empty() => Error::ValueMismatch {
            field: field.to_string(),
            expected,
        },
        other => other,
    }
}

pub(crate) fn describe(node: &mut PropertyNode, label: &Option<String>) {
    if let Some(label) = label {
        node.description = Some(label.clone());
    }
}

/// Serialize a float; non-finite values have no JSON form and become null
pub(crate) fn real_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
