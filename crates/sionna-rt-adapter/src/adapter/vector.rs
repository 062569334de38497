//! Vector-valued adapters backed by nalgebra

use std::path::Path;

use nalgebra::{Vector2, Vector3};
use serde_json::{Map, Value};
use tracing::debug;

use super::{describe, mismatch, real_value, single, Adapter, UpdateEffect};
use crate::error::{Result, ValidationError};
use crate::property::{PropertyEvent, PropertyGroup, PropertyValue, Widget};

#[derive(Debug, Clone)]
pub struct Vec2 {
    pub value: Vector2<f64>,
    pub label: Option<String>,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            value: Vector2::new(x, y),
            label: None,
        }
    }

    pub fn labeled(x: f64, y: f64, label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::new(x, y)
        }
    }
}

impl Adapter for Vec2 {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let node = parent.add(name, Widget::RealTuple([self.value.x, self.value.y]));
        describe(node, &self.label);
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match event.value {
            PropertyValue::Vec2([x, y]) => {
                self.value = Vector2::new(x, y);
                Ok(UpdateEffect::Value)
            }
            _ => Err(mismatch("vec2")),
        }
    }

    fn to_format(&self, name: &str, _results_dir: &Path) -> Result<Map<String, Value>> {
        let items = self.value.iter().map(|v| real_value(*v)).collect();
        Ok(single(name, Value::Array(items)))
    }
}

#[derive(Debug, Clone)]
pub struct Vec3 {
    pub value: Vector3<f64>,
    pub label: Option<String>,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            value: Vector3::new(x, y, z),
            label: None,
        }
    }

    pub fn labeled(x: f64, y: f64, z: f64, label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::new(x, y, z)
        }
    }
}

impl Adapter for Vec3 {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let v = self.value;
        let node = parent.add(name, Widget::Vec3([v.x, v.y, v.z]));
        describe(node, &self.label);
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match event.value {
            PropertyValue::Vec3([x, y, z]) => {
                self.value = Vector3::new(x, y, z);
                Ok(UpdateEffect::Value)
            }
            _ => Err(mismatch("vec3")),
        }
    }

    fn to_format(&self, name: &str, _results_dir: &Path) -> Result<Map<String, Value>> {
        let items = self.value.iter().map(|v| real_value(*v)).collect();
        Ok(single(name, Value::Array(items)))
    }
}

/// Normalized RGB color, each channel in [0, 1]
#[derive(Debug, Clone)]
pub struct Rgb {
    pub value: Vector3<f64>,
    pub label: Option<String>,
}

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            value: Vector3::new(r, g, b),
            label: None,
        }
    }

    pub fn labeled(r: f64, g: f64, b: f64, label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::new(r, g, b)
        }
    }
}

impl Adapter for Rgb {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let v = self.value;
        let node = parent.add(name, Widget::Vec3([v.x, v.y, v.z]));
        describe(node, &self.label);
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match event.value {
            PropertyValue::Vec3([r, g, b]) => {
                self.value = Vector3::new(r, g, b);
                if self.validate().is_ok() {
                    debug!("Values color: {} {} {}", r, g, b);
                }
                Ok(UpdateEffect::Value)
            }
            _ => Err(mismatch("vec3")),
        }
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.value.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ValidationError::new("Color values must be between 0 and 1"));
        }
        Ok(())
    }

    fn to_format(&self, name: &str, _results_dir: &Path) -> Result<Map<String, Value>> {
        let items = self.value.iter().map(|v| real_value(*v)).collect();
        Ok(single(name, Value::Array(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vec3_update_and_format() {
        let mut position = Vec3::labeled(0.0, 0.0, 0.0, "Position");
        position
            .update(&PropertyEvent::modified(PropertyValue::Vec3([1.5, -2.0, 10.0])))
            .unwrap();
        let out = position.to_format("position", Path::new("/tmp")).unwrap();
        assert_eq!(out["position"], json!([1.5, -2.0, 10.0]));
    }

    #[test]
    fn test_vec2_update_and_format() {
        let mut size = Vec2::new(400.0, 400.0);
        size.update(&PropertyEvent::modified(PropertyValue::Vec2([640.0, 480.0])))
            .unwrap();
        let out = size.to_format("resolution", Path::new("/tmp")).unwrap();
        assert_eq!(out["resolution"], json!([640.0, 480.0]));
    }

    #[test]
    fn test_vec2_rejects_vec3_event() {
        let mut size = Vec2::new(400.0, 400.0);
        let event = PropertyEvent::modified(PropertyValue::Vec3([1.0, 2.0, 3.0]));
        assert!(size.update(&event).is_err());
        assert_eq!(size.value, Vector2::new(400.0, 400.0));
    }

    #[test]
    fn test_rgb_channel_range() {
        let mut color = Rgb::new(0.8, 0.1, 0.1);
        assert!(color.validate().is_ok());
        color.value.y = 1.2;
        assert_eq!(
            color.validate().unwrap_err().message(),
            "Color values must be between 0 and 1"
        );
    }

    #[test]
    fn test_rgb_round_trip() {
        let mut color = Rgb::labeled(0.8, 0.1, 0.1, "Color");
        color
            .update(&PropertyEvent::modified(PropertyValue::Vec3([0.25, 0.5, 0.75])))
            .unwrap();
        let out = color.to_format("color", Path::new("/tmp")).unwrap();
        assert_eq!(out["color"], json!([0.25, 0.5, 0.75]));
        assert_eq!(color.value, Vector3::new(0.25, 0.5, 0.75));
    }
}
