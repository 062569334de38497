use tracing::debug;

use super::{Geometries, SettingsNode, Status};

/// An element that can live in a [`Group`]
pub trait GroupElement: SettingsNode {
    /// Base name of new elements, e.g. "Material"
    const BASE_DESCRIPTION: &'static str;

    fn create(description: String) -> Self;

    fn geometries(&self) -> &Geometries;

    fn geometries_mut(&mut self) -> &mut Geometries;
}

/// Insertion-ordered collection of settings objects of one kind
#[derive(Debug)]
pub struct Group<T: GroupElement> {
    /// Text of the group node, e.g. "Materials"
    pub description: String,
    pub status: Status,
    elements: Vec<T>,
    /// Number used for the next element's default description
    next_number: usize,
}

impl<T: GroupElement> Group<T> {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            status: Status::default(),
            elements: Vec::new(),
            next_number: 1,
        }
    }

    /// Append a new element with a default description; returns its index
    pub fn add(&mut self) -> usize {
        let description = format!("{} {}", T::BASE_DESCRIPTION, self.next_number);
        self.next_number += 1;
        debug!("Adding '{}' to {}", description, self.description);
        self.elements.push(T::create(description));
        self.elements.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        (index < self.elements.len()).then(|| self.elements.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.elements.get_mut(index)
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Any element already references `entity_id`
    pub fn references(&self, entity_id: &str) -> bool {
        self.elements.iter().any(|e| e.geometries().contains(entity_id))
    }

    /// Validate elements in order, stopping at the first failure
    pub fn validate(&mut self) -> bool {
        self.elements.iter_mut().all(|e| e.validate())
    }

    pub fn clear_status_recursively(&mut self) {
        self.status.clear();
        for element in &mut self.elements {
            element.clear_status();
        }
    }

    /// Serialize every element under `<prefix><index>` keys
    pub(crate) fn keyed<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (String, &'a T)> {
        self.elements
            .iter()
            .enumerate()
            .map(move |(i, e)| (format!("{}{}", prefix, i), e))
    }
}
