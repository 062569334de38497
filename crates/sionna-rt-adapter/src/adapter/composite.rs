//! Composite adapters wrapping a nested schema
//!
//! [`Section`] is a named sub-schema drawn as a group (camera, antenna
//! arrays). [`Gate`] is a section whose controls are only shown and checked
//! while its `activate` flag is set (rescaling, resizing, sample positions).

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::{mismatch, single, Adapter, UpdateEffect};
use crate::catalog::{
    AntennaArrayConfig, CameraConfig, RescalingConfig, ResizingConfig, SamplePositionsConfig,
};
use crate::error::{Result, ValidationError};
use crate::property::{PropertyEvent, PropertyGroup, Widget};
use crate::schema::{self, Schema};

pub const ACTIVATE_FIELD: &str = "activate";

pub type Camera = Section<CameraConfig>;
pub type AntennaArray = Section<AntennaArrayConfig>;
pub type Rescaling = Gate<RescalingConfig>;
pub type Resizing = Gate<ResizingConfig>;
pub type SamplePositions = Gate<SamplePositionsConfig>;

#[derive(Debug)]
pub struct Section<S: Schema> {
    pub schema: S,
    pub label: Option<String>,
    /// Prepended to child validation messages, e.g. `"Camera: "`
    pub prefix: String,
}

impl<S: Schema> Section<S> {
    pub fn new(schema: S, label: &str, prefix: &str) -> Self {
        Self {
            schema,
            label: Some(label.to_string()),
            prefix: prefix.to_string(),
        }
    }
}

impl<S: Schema> Adapter for Section<S> {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let mut group = PropertyGroup::new();
        group.description = self.label.clone();
        schema::draw_properties(&self.schema, &mut group);
        parent.add(name, Widget::Group(group)).description = self.label.clone();
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        Err(mismatch("nested field"))
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        schema::validate_fields(&self.schema).map_err(|err| err.prefixed(&self.prefix))
    }

    fn to_format(&self, name: &str, results_dir: &Path) -> Result<Map<String, Value>> {
        let fields = schema::format_fields(&self.schema, results_dir)?;
        Ok(single(name, Value::Object(fields)))
    }

    fn field(&self, name: &str) -> Option<&dyn Adapter> {
        schema::field(&self.schema, name)
    }

    fn apply(&mut self, path: &[&str], event: &PropertyEvent) -> Result<UpdateEffect> {
        if path.is_empty() {
            return self.update(event);
        }
        schema::apply_segments(&mut self.schema, path, event)
    }
}

/// A schema whose controls are switched on by an `activate` field
pub trait Gated: Schema {
    fn active(&self) -> bool;

    /// Cross-field checks that only apply while the section is active
    fn check_active(&self) -> std::result::Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct Gate<S: Gated> {
    pub schema: S,
    pub label: Option<String>,
    pub prefix: String,
}

impl<S: Gated> Gate<S> {
    pub fn new(schema: S, label: &str, prefix: &str) -> Self {
        Self {
            schema,
            label: Some(label.to_string()),
            prefix: prefix.to_string(),
        }
    }

    pub fn active(&self) -> bool {
        self.schema.active()
    }
}

impl<S: Gated> Adapter for Gate<S> {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let mut group = PropertyGroup::new();
        group.description = self.label.clone();
        schema::draw_properties(&self.schema, &mut group);
        if !self.active() {
            for node in group.iter_mut().filter(|n| n.name != ACTIVATE_FIELD) {
                node.visible = false;
            }
        }
        parent.add(name, Widget::Group(group)).description = self.label.clone();
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        Err(mismatch("nested field"))
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if !self.active() {
            return Ok(());
        }
        schema::validate_fields(&self.schema)
            .and_then(|_| self.schema.check_active())
            .map_err(|err| err.prefixed(&self.prefix))
    }

    fn to_format(&self, name: &str, results_dir: &Path) -> Result<Map<String, Value>> {
        let fields = schema::format_fields(&self.schema, results_dir)?;
        Ok(single(name, Value::Object(fields)))
    }

    fn field(&self, name: &str) -> Option<&dyn Adapter> {
        schema::field(&self.schema, name)
    }

    fn apply(&mut self, path: &[&str], event: &PropertyEvent) -> Result<UpdateEffect> {
        if path.is_empty() {
            return self.update(event);
        }
        let was_active = self.active();
        let effect = schema::apply_segments(&mut self.schema, path, event)?;
        if self.active() != was_active {
            debug!("{:?} activation set to {}", self.label, self.active());
            return Ok(UpdateEffect::Redraw);
        }
        Ok(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::property::PropertyValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn set(adapter: &mut dyn Adapter, path: &[&str], value: PropertyValue) -> UpdateEffect {
        adapter.apply(path, &PropertyEvent::modified(value)).unwrap()
    }

    #[test]
    fn test_camera_serializes_nested_schema() {
        let camera = catalog::camera();
        let out = camera.to_format("camera", Path::new("/tmp")).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({
                "camera": {
                    "position": [-250.0, 250.0, 150.0],
                    "localization": {"look_at": [-15.0, 30.0, 28.0]}
                }
            })
        );
    }

    #[test]
    fn test_camera_routes_nested_edits() {
        let mut camera = catalog::camera();
        let effect = set(&mut camera, &["localization"], PropertyValue::Choice(1));
        assert_eq!(effect, UpdateEffect::Redraw);
        set(&mut camera, &["localization", "orientation"], PropertyValue::Vec3([0.0, 1.0, 0.0]));

        let out = camera.to_format("camera", Path::new("/tmp")).unwrap();
        assert_eq!(out["camera"]["localization"], json!({"orientation": [0.0, 1.0, 0.0]}));
    }

    #[test]
    fn test_inactive_gate_hides_controls_and_skips_checks() {
        let mut rescaling = catalog::rescaling();
        rescaling.schema.rm_vmin.value = 10.0;
        rescaling.schema.rm_vmax.value = 5.0;
        assert!(rescaling.validate().is_ok());

        let mut parent = PropertyGroup::new();
        rescaling.draw(&mut parent, "rescaling");
        let group = parent.get("rescaling").unwrap().as_group().unwrap();
        assert_eq!(group.visible_names(), vec![ACTIVATE_FIELD]);
    }

    #[test]
    fn test_activating_gate_redraws_and_validates() {
        let mut rescaling = catalog::rescaling();
        let effect = set(&mut rescaling, &[ACTIVATE_FIELD], PropertyValue::Bool(true));
        assert_eq!(effect, UpdateEffect::Redraw);

        set(&mut rescaling, &["rm_vmin"], PropertyValue::Real(10.0));
        set(&mut rescaling, &["rm_vmax"], PropertyValue::Real(5.0));
        assert_eq!(
            rescaling.validate().unwrap_err().message(),
            "Rescaling: VMin cannot be higher than VMax"
        );

        let mut parent = PropertyGroup::new();
        rescaling.draw(&mut parent, "rescaling");
        let group = parent.get("rescaling").unwrap().as_group().unwrap();
        assert_eq!(group.visible_names(), vec![ACTIVATE_FIELD, "rm_vmax", "rm_vmin"]);
    }

    #[test]
    fn test_resizing_rejects_negative_size_when_active() {
        let mut resizing = catalog::resizing();
        set(&mut resizing, &["size"], PropertyValue::Vec2([-1.0, 10.0]));
        assert!(resizing.validate().is_ok());

        set(&mut resizing, &[ACTIVATE_FIELD], PropertyValue::Bool(true));
        assert!(resizing.validate().is_err());
    }

    #[test]
    fn test_section_rejects_direct_value() {
        let mut camera = catalog::camera();
        assert!(camera
            .update(&PropertyEvent::modified(PropertyValue::Bool(true)))
            .is_err());
    }
}
