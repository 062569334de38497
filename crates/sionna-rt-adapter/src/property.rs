//! Headless property tree
//!
//! Adapters draw themselves into a [`PropertyGroup`]: a plain description of
//! the controls the host's property panel should show. The host turns user
//! edits back into [`PropertyEvent`]s which are routed to the owning adapter.

use std::path::PathBuf;

/// What happened to a property in the host UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationKind {
    /// The user changed the value
    Modified,
    /// Only the display metadata (description, visibility) changed
    Appearance,
    /// The property was attached to a parent
    Attached,
}

/// A value delivered by the host when a control is edited
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    File(Option<PathBuf>),
    Vec2([f64; 2]),
    Vec3([f64; 3]),
    /// Index into an enumerated list of options
    Choice(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEvent {
    pub kind: ModificationKind,
    pub value: PropertyValue,
}

impl PropertyEvent {
    pub fn new(kind: ModificationKind, value: PropertyValue) -> Self {
        Self { kind, value }
    }

    /// A "value changed" event, the only kind adapters react to
    pub fn modified(value: PropertyValue) -> Self {
        Self::new(ModificationKind::Modified, value)
    }

    pub fn is_modification(&self) -> bool {
        self.kind == ModificationKind::Modified
    }
}

/// The control a property is rendered with
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Bool(bool),
    Int { value: i64, min: i64, max: i64 },
    Real(f64),
    Text(String),
    Enum { options: Vec<String>, chosen: usize },
    File { filter: String, value: Option<PathBuf> },
    RealTuple([f64; 2]),
    Vec3([f64; 3]),
    Group(PropertyGroup),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyNode {
    pub name: String,
    pub description: Option<String>,
    pub visible: bool,
    pub widget: Widget,
}

impl PropertyNode {
    pub fn as_group(&self) -> Option<&PropertyGroup> {
        match &self.widget {
            Widget::Group(group) => Some(group),
            _ => None,
        }
    }
}

/// An ordered, named collection of property nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyGroup {
    pub description: Option<String>,
    nodes: Vec<PropertyNode>,
}

impl PropertyGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            nodes: Vec::new(),
        }
    }

    /// Append a control; returns it so callers can set description or visibility
    pub fn add(&mut self, name: impl Into<String>, widget: Widget) -> &mut PropertyNode {
        self.nodes.push(PropertyNode {
            name: name.into(),
            description: None,
            visible: true,
            widget,
        });
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    pub fn get(&self, name: &str) -> Option<&PropertyNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyNode> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyNode> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PropertyNode> {
        self.nodes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Names of the controls currently shown
    pub fn visible_names(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.visible)
            .map(|n| n.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut group = PropertyGroup::with_description("Setup Settings");
        group.add("frequency", Widget::Real(3.5e9)).description = Some("Frequency".into());
        group.add("hidden", Widget::Bool(false)).visible = false;

        assert_eq!(group.len(), 2);
        assert_eq!(group.get("frequency").unwrap().widget, Widget::Real(3.5e9));
        assert_eq!(group.visible_names(), vec!["frequency"]);
    }

    #[test]
    fn test_only_modified_counts_as_modification() {
        assert!(PropertyEvent::modified(PropertyValue::Bool(true)).is_modification());
        let event = PropertyEvent::new(ModificationKind::Appearance, PropertyValue::Bool(true));
        assert!(!event.is_modification());
    }
}
