//! Toggle: exactly one of several named branches is active at a time
//!
//! Selecting another branch swaps the controls shown below the selector, so
//! the selection change reports [`UpdateEffect::Redraw`]. Only the active
//! branch is validated and serialized, keyed by the branch name.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::{describe, mismatch, single, Adapter, UpdateEffect};
use crate::error::{Error, Result, ValidationError};
use crate::property::{PropertyEvent, PropertyGroup, PropertyValue, Widget};

pub const SELECTOR_NAME: &str = "Change type of input";

#[derive(Debug)]
pub struct ToggleOption {
    pub name: String,
    /// Prompt shown next to the branch's control
    pub prompt: Option<String>,
    pub adapter: Box<dyn Adapter>,
}

impl ToggleOption {
    pub fn new(name: &str, adapter: impl Adapter + 'static) -> Self {
        Self {
            name: name.to_string(),
            prompt: None,
            adapter: Box::new(adapter),
        }
    }

    pub fn prompt(mut self, prompt: &str) -> Self {
        self.prompt = Some(prompt.to_string());
        self
    }
}

#[derive(Debug)]
pub struct Toggle {
    pub value: usize,
    pub options: Vec<ToggleOption>,
    pub label: Option<String>,
}

impl Toggle {
    pub fn new(label: &str, options: Vec<ToggleOption>) -> Self {
        Self {
            value: 0,
            options,
            label: Some(label.to_string()),
        }
    }

    pub fn selected(mut self, index: usize) -> Self {
        if index < self.options.len() {
            self.value = index;
        }
        self
    }

    pub fn active(&self) -> &ToggleOption {
        &self.options[self.value]
    }

    pub fn active_name(&self) -> &str {
        &self.active().name
    }

    pub fn option_names(&self) -> Vec<String> {
        self.options.iter().map(|o| o.name.clone()).collect()
    }

    /// Select a branch by index; returns whether the selection changed
    pub fn select(&mut self, index: usize) -> Result<bool> {
        if index >= self.options.len() {
            return Err(mismatch("choice within the option list"));
        }
        let changed = index != self.value;
        self.value = index;
        Ok(changed)
    }
}

impl Adapter for Toggle {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let mut group = PropertyGroup::new();
        group.description = self.label.clone();
        group.add(
            SELECTOR_NAME,
            Widget::Enum {
                options: self.option_names(),
                chosen: self.value,
            },
        );

        let active = self.active();
        let before = group.len();
        active.adapter.draw(&mut group, &active.name);
        if let (Some(prompt), Some(node)) = (&active.prompt, group.iter_mut().nth(before)) {
            node.description = Some(prompt.clone());
        }

        let node = parent.add(name, Widget::Group(group));
        describe(node, &self.label);
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match event.value {
            PropertyValue::Choice(index) => {
                if self.select(index)? {
                    debug!("Toggle switched to '{}'", self.active_name());
                    Ok(UpdateEffect::Redraw)
                } else {
                    Ok(UpdateEffect::Value)
                }
            }
            _ => Err(mismatch("choice")),
        }
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.active().adapter.validate()
    }

    fn to_format(&self, name: &str, results_dir: &Path) -> Result<Map<String, Value>> {
        let active = self.active();
        if active.adapter.is_marker() {
            return Ok(single(name, Value::String(active.name.clone())));
        }
        let branch = active.adapter.to_format(&active.name, results_dir)?;
        Ok(single(name, Value::Object(branch)))
    }

    fn field(&self, name: &str) -> Option<&dyn Adapter> {
        let active = self.active();
        (active.name == name).then(|| active.adapter.as_ref())
    }

    fn apply(&mut self, path: &[&str], event: &PropertyEvent) -> Result<UpdateEffect> {
        match path {
            [] => self.update(event),
            [head, rest @ ..] => {
                // Inactive branches are not shown, so they cannot be edited
                let active = &mut self.options[self.value];
                if active.name != *head {
                    return Err(Error::UnknownField(head.to_string()));
                }
                active.adapter.apply(rest, event)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{Marker, Vec3};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn localization() -> Toggle {
        Toggle::new(
            "Localization",
            vec![
                ToggleOption::new("orientation", Vec3::new(0.0, 0.0, 0.0)),
                ToggleOption::new("look_at", Vec3::new(1.0, 2.0, 3.0)),
            ],
        )
    }

    #[test]
    fn test_serializes_only_active_branch() {
        let mut toggle = localization();
        let effect = toggle
            .update(&PropertyEvent::modified(PropertyValue::Choice(1)))
            .unwrap();
        assert_eq!(effect, UpdateEffect::Redraw);

        let out = toggle.to_format("localization", Path::new("/tmp")).unwrap();
        assert_eq!(Value::Object(out), json!({"localization": {"look_at": [1.0, 2.0, 3.0]}}));
    }

    #[test]
    fn test_reselecting_same_branch_does_not_redraw() {
        let mut toggle = localization();
        let effect = toggle
            .update(&PropertyEvent::modified(PropertyValue::Choice(0)))
            .unwrap();
        assert_eq!(effect, UpdateEffect::Value);
    }

    #[test]
    fn test_marker_branch_serializes_as_name() {
        let toggle = Toggle::new(
            "Pattern",
            vec![ToggleOption::new("iso", Marker), ToggleOption::new("dipole", Marker)],
        )
        .selected(1);
        let out = toggle.to_format("pattern", Path::new("/tmp")).unwrap();
        assert_eq!(out["pattern"], json!("dipole"));
    }

    #[test]
    fn test_draw_shows_selector_and_active_branch() {
        let mut parent = PropertyGroup::new();
        localization().selected(1).draw(&mut parent, "localization");
        let group = parent.get("localization").unwrap().as_group().unwrap();
        assert_eq!(group.visible_names(), vec![SELECTOR_NAME, "look_at"]);
    }

    #[test]
    fn test_edit_routes_to_active_branch_only() {
        let mut toggle = localization();
        let event = PropertyEvent::modified(PropertyValue::Vec3([9.0, 9.0, 9.0]));
        assert!(toggle.apply(&["look_at"], &event).is_err());
        toggle.apply(&["orientation"], &event).unwrap();

        let out = toggle.to_format("localization", Path::new("/tmp")).unwrap();
        assert_eq!(out["localization"]["orientation"], json!([9.0, 9.0, 9.0]));
    }

    #[test]
    fn test_out_of_range_selection_is_rejected() {
        let mut toggle = localization();
        assert!(toggle
            .update(&PropertyEvent::modified(PropertyValue::Choice(5)))
            .is_err());
        assert_eq!(toggle.value, 0);
    }
}
