//! Geometry references and the host's active 3D model
//!
//! Settings objects never own geometry. They keep entity identifiers and
//! resolve them through an [`ActiveModel`] when they need the mesh data.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use nalgebra::Point3;
use tracing::debug;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    TriangleMesh,
    Vertex,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub points: Vec<Point3<f64>>,
    pub triangles: Vec<[u32; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    /// Present for triangle meshes
    pub mesh: Option<TriangleMesh>,
}

impl Entity {
    pub fn mesh(name: &str, mesh: TriangleMesh) -> Self {
        Self {
            kind: EntityKind::TriangleMesh,
            name: name.to_string(),
            mesh: Some(mesh),
        }
    }

    pub fn vertex(name: &str) -> Self {
        Self {
            kind: EntityKind::Vertex,
            name: name.to_string(),
            mesh: None,
        }
    }
}

/// Lookup interface onto the host document's entities
pub trait ActiveModel {
    fn lookup_entity(&self, entity_id: &str) -> Option<&Entity>;
}

/// An in-memory entity table
#[derive(Debug, Clone, Default)]
pub struct MemoryModel {
    entities: HashMap<String, Entity>,
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity_id: &str, entity: Entity) {
        self.entities.insert(entity_id.to_string(), entity);
    }
}

impl ActiveModel for MemoryModel {
    fn lookup_entity(&self, entity_id: &str) -> Option<&Entity> {
        self.entities.get(entity_id)
    }
}

/// Association between a settings object and a host entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryRef {
    pub entity_id: String,
    pub description: String,
}

impl GeometryRef {
    pub fn new(entity_id: &str, description: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            description: description.to_string(),
        }
    }
}

/// The geometry list of one material, transmitter or receiver
#[derive(Debug, Clone)]
pub struct Geometries {
    items: Vec<GeometryRef>,
    allowed: &'static [EntityKind],
    /// Upper bound on how many geometries may be assigned
    limit: Option<usize>,
}

impl Geometries {
    pub fn new(allowed: &'static [EntityKind], limit: Option<usize>) -> Self {
        Self {
            items: Vec::new(),
            allowed,
            limit,
        }
    }

    pub fn allows(&self, kind: EntityKind) -> bool {
        self.allowed.contains(&kind)
    }

    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.items.len() >= limit)
    }

    pub fn exceeds_limit(&self) -> bool {
        self.limit.is_some_and(|limit| self.items.len() > limit)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.items.iter().any(|g| g.entity_id == entity_id)
    }

    pub fn push(&mut self, geometry: GeometryRef) {
        debug!("Assigned geometry {}", geometry.entity_id);
        self.items.push(geometry);
    }

    pub fn remove(&mut self, entity_id: &str) -> Option<GeometryRef> {
        let index = self.items.iter().position(|g| g.entity_id == entity_id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&GeometryRef> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeometryRef> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Render a mesh as ASCII PLY
pub fn ply_string(mesh: &TriangleMesh) -> String {
    let mut out = String::new();
    out.push_str("ply\n");
    out.push_str("format ascii 1.0\n");
    let _ = writeln!(out, "element vertex {}", mesh.points.len());
    out.push_str("property float x\n");
    out.push_str("property float y\n");
    out.push_str("property float z\n");
    let _ = writeln!(out, "element face {}", mesh.triangles.len());
    out.push_str("property list uchar uint vertex_indices\n");
    out.push_str("end_header\n");

    for p in &mesh.points {
        let _ = writeln!(out, "{} {} {}", p.x, p.y, p.z);
    }
    for [a, b, c] in &mesh.triangles {
        let _ = writeln!(out, "3 {} {} {}", a, b, c);
    }
    out
}

pub fn write_ply(mesh: &TriangleMesh, path: &Path) -> Result<()> {
    fs::write(path, ply_string(mesh))?;
    debug!(
        "Wrote {} vertices, {} faces to {:?}",
        mesh.points.len(),
        mesh.triangles.len(),
        path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn triangle() -> TriangleMesh {
        TriangleMesh {
            points: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.5, 0.0),
            ],
            triangles: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn test_ply_layout() {
        let expected = "ply\n\
            format ascii 1.0\n\
            element vertex 3\n\
            property float x\n\
            property float y\n\
            property float z\n\
            element face 1\n\
            property list uchar uint vertex_indices\n\
            end_header\n\
            0 0 0\n\
            1 0 0\n\
            0 1.5 0\n\
            3 0 1 2\n";
        assert_eq!(ply_string(&triangle()), expected);
    }

    #[test]
    fn test_geometry_limit() {
        let mut single = Geometries::new(&[EntityKind::Vertex], Some(1));
        assert!(!single.is_full());
        single.push(GeometryRef::new("a", "Tx point"));
        assert!(single.is_full());
        assert!(!single.exceeds_limit());
        assert!(single.allows(EntityKind::Vertex));
        assert!(!single.allows(EntityKind::TriangleMesh));

        assert_eq!(single.remove("a").map(|g| g.description), Some("Tx point".to_string()));
        assert!(single.is_empty());
    }

    #[test]
    fn test_write_ply_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.ply");
        write_ply(&triangle(), &path).unwrap();
        assert!(fs::read_to_string(path).unwrap().ends_with("3 0 1 2\n"));
    }
}
