//! Scalar adapters: booleans, integers, reals, strings and empty markers

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::{describe, mismatch, real_value, single, Adapter, UpdateEffect};
use crate::error::{Result, ValidationError};
use crate::property::{PropertyEvent, PropertyGroup, PropertyValue, Widget};

/// A branch with no data, e.g. the non-custom antenna patterns
#[derive(Debug, Clone, Default)]
pub struct Marker;

impl Adapter for Marker {
    fn draw(&self, _parent: &mut PropertyGroup, _name: &str) {}

    fn update(&mut self, _event: &PropertyEvent) -> Result<UpdateEffect> {
        Ok(UpdateEffect::Ignored)
    }

    fn to_format(&self, name: &str, _results_dir: &Path) -> Result<Map<String, Value>> {
        Ok(single(name, Value::Null))
    }

    fn is_marker(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct Boolean {
    pub value: bool,
    pub label: Option<String>,
}

impl Boolean {
    pub fn new(value: bool) -> Self {
        Self { value, label: None }
    }

    pub fn labeled(value: bool, label: &str) -> Self {
        Self {
            value,
            label: Some(label.to_string()),
        }
    }
}

impl Adapter for Boolean {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let node = parent.add(name, Widget::Bool(self.value));
        describe(node, &self.label);
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match event.value {
            PropertyValue::Bool(value) => {
                self.value = value;
                Ok(UpdateEffect::Value)
            }
            _ => Err(mismatch("boolean")),
        }
    }

    fn to_format(&self, name: &str, _results_dir: &Path) -> Result<Map<String, Value>> {
        Ok(single(name, Value::Bool(self.value)))
    }
}

#[derive(Debug, Clone)]
pub struct Integer {
    pub value: i64,
    pub min: i64,
    pub max: i64,
    /// Sentinel accepted regardless of range, e.g. "auto"
    pub extra_case: Option<i64>,
    pub label: Option<String>,
}

impl Integer {
    pub const DEFAULT_MIN: i64 = -2_147_483_647;
    pub const DEFAULT_MAX: i64 = 2_147_483_647;

    pub fn new(value: i64) -> Self {
        Self {
            value,
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
            extra_case: None,
            label: None,
        }
    }

    pub fn labeled(value: i64, label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::new(value)
        }
    }

    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn extra_case(mut self, extra_case: i64) -> Self {
        self.extra_case = Some(extra_case);
        self
    }
}

impl Adapter for Integer {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let node = parent.add(
            name,
            Widget::Int {
                value: self.value,
                min: self.min,
                max: self.max,
            },
        );
        describe(node, &self.label);
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match event.value {
            PropertyValue::Int(value) => {
                self.value = value;
                debug!("[Integer] Update - New value : {}", self.value);
                Ok(UpdateEffect::Value)
            }
            _ => Err(mismatch("integer")),
        }
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if Some(self.value) == self.extra_case || (self.min..=self.max).contains(&self.value) {
            Ok(())
        } else {
            Err(ValidationError::new(format!(
                "Select an integer between {} and {} or the extra case {}",
                self.min,
                self.max,
                extra_case_text(self.extra_case)
            )))
        }
    }

    fn to_format(&self, name: &str, _results_dir: &Path) -> Result<Map<String, Value>> {
        Ok(single(name, Value::from(self.value)))
    }
}

#[derive(Debug, Clone)]
pub struct Real {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    /// Sentinel accepted regardless of range; serialized as `null`
    pub extra_case: Option<f64>,
    pub label: Option<String>,
}

impl Real {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            min: f64::MIN,
            max: f64::MAX,
            extra_case: None,
            label: None,
        }
    }

    pub fn labeled(value: f64, label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::new(value)
        }
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = min;
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn extra_case(mut self, extra_case: f64) -> Self {
        self.extra_case = Some(extra_case);
        self
    }

    pub fn is_extra_case(&self) -> bool {
        self.extra_case == Some(self.value)
    }
}

impl Adapter for Real {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let node = parent.add(name, Widget::Real(self.value));
        describe(node, &self.label);
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match event.value {
            PropertyValue::Real(value) => {
                self.value = value;
                debug!("[Real] Update - New value : {}", self.value);
                Ok(UpdateEffect::Value)
            }
            PropertyValue::Int(value) => {
                self.value = value as f64;
                Ok(UpdateEffect::Value)
            }
            _ => Err(mismatch("real")),
        }
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.is_extra_case() || (self.value >= self.min && self.value <= self.max) {
            Ok(())
        } else {
            Err(ValidationError::new(format!(
                "Select a real value between {:?} and {:?} or the extra case {}",
                self.min,
                self.max,
                match self.extra_case {
                    Some(extra) => format!("{:?}", extra),
                    None => "None".to_string(),
                }
            )))
        }
    }

    fn to_format(&self, name: &str, _results_dir: &Path) -> Result<Map<String, Value>> {
        if self.is_extra_case() {
            return Ok(single(name, Value::Null));
        }
        Ok(single(name, real_value(self.value)))
    }
}

fn extra_case_text(extra_case: Option<i64>) -> String {
    match extra_case {
        Some(extra) => extra.to_string(),
        None => "None".to_string(),
    }
}

/// A free-text value, or a dropdown over a fixed list of options
#[derive(Debug, Clone)]
pub struct Text {
    pub value: String,
    pub options: Vec<String>,
    pub chosen: usize,
    pub label: Option<String>,
}

impl Text {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            options: Vec::new(),
            chosen: 0,
            label: None,
        }
    }

    pub fn labeled(value: &str, label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::new(value)
        }
    }

    /// Dropdown; the value is the text of the chosen option
    pub fn dropdown(options: &[&str], chosen: usize, label: &str) -> Self {
        let options: Vec<String> = options.iter().map(|o| o.to_string()).collect();
        let chosen = chosen.min(options.len().saturating_sub(1));
        Self {
            value: options.get(chosen).cloned().unwrap_or_default(),
            options,
            chosen,
            label: Some(label.to_string()),
        }
    }

    pub fn is_dropdown(&self) -> bool {
        !self.options.is_empty()
    }
}

impl Adapter for Text {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let widget = if self.is_dropdown() {
            Widget::Enum {
                options: self.options.clone(),
                chosen: self.chosen,
            }
        } else {
            Widget::Text(self.value.clone())
        };
        let node = parent.add(name, widget);
        describe(node, &self.label);
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match (&event.value, self.is_dropdown()) {
            (PropertyValue::Choice(index), true) => match self.options.get(*index) {
                Some(option) => {
                    self.value = option.clone();
                    self.chosen = *index;
                    Ok(UpdateEffect::Value)
                }
                None => Err(mismatch("choice within the option list")),
            },
            (PropertyValue::Text(text), false) => {
                self.value = text.clone();
                Ok(UpdateEffect::Value)
            }
            (_, true) => Err(mismatch("choice")),
            (_, false) => Err(mismatch("string")),
        }
    }

    fn to_format(&self, name: &str, _results_dir: &Path) -> Result<Map<String, Value>> {
        Ok(single(name, Value::String(self.value.clone())))
    }
}
