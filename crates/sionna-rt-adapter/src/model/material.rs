//! Materials assigned to triangle meshes of the host model

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};

use super::geometry::write_ply;
use super::group::GroupElement;
use super::settings::TypedSettings;
use super::{ActiveModel, EntityKind, Geometries, SettingsNode, Status};
use crate::adapter::UpdateEffect;
use crate::catalog::MaterialType;
use crate::error::{Error, Result};
use crate::property::{PropertyEvent, PropertyGroup};
use crate::INPUT_FILES_DIR;

const MATERIAL_ENTITIES: &[EntityKind] = &[EntityKind::TriangleMesh];

#[derive(Debug)]
pub struct MaterialSettings {
    pub settings: TypedSettings<MaterialType>,
    pub geometries: Geometries,
}

impl MaterialSettings {
    pub fn new(description: &str) -> Self {
        Self {
            settings: TypedSettings::new(description),
            geometries: Geometries::new(MATERIAL_ENTITIES, None),
        }
    }

    /// Serialize the material, writing each assigned mesh to
    /// `input_files/<entity_id>.ply`
    pub fn to_map(&self, results_dir: &Path, model: &dyn ActiveModel) -> Result<Map<String, Value>> {
        let mut output = self.settings.to_map(results_dir)?;

        let mut geometries = Vec::with_capacity(self.geometries.len());
        if !self.geometries.is_empty() {
            fs::create_dir_all(results_dir.join(INPUT_FILES_DIR))?;
        }
        for geometry in self.geometries.iter() {
            let mesh = model
                .lookup_entity(&geometry.entity_id)
                .and_then(|entity| entity.mesh.as_ref())
                .ok_or_else(|| Error::MissingResource {
                    what: "mesh entity",
                    path: geometry.entity_id.clone().into(),
                })?;
            let fname = format!("{}/{}.ply", INPUT_FILES_DIR, ply_stem(&geometry.entity_id)?);
            write_ply(mesh, &results_dir.join(&fname))?;
            geometries.push(json!({"fname": fname, "name": geometry.description}));
        }
        output.insert("geometries".to_string(), Value::Array(geometries));
        Ok(output)
    }
}

/// Entity ids become file names below `input_files/` and must stay there
fn ply_stem(entity_id: &str) -> Result<&str> {
    let special = matches!(entity_id, "" | "." | "..");
    if special || entity_id.contains(['/', '\\']) {
        return Err(Error::GeometryRejected(entity_id.to_string()));
    }
    Ok(entity_id)
}

impl SettingsNode for MaterialSettings {
    fn description(&self) -> &str {
        &self.settings.description
    }

    fn properties(&self) -> PropertyGroup {
        let mut group = PropertyGroup::with_description("Material Settings");
        self.settings.draw_into(&mut group);
        group
    }

    fn apply(&mut self, field: &str, event: &PropertyEvent) -> Result<UpdateEffect> {
        self.settings.apply(field, event)
    }

    fn validate(&mut self) -> bool {
        self.settings.validate()
    }

    fn status(&self) -> &Status {
        self.settings.status()
    }

    fn clear_status(&mut self) {
        self.settings.clear_status();
    }
}

impl GroupElement for MaterialSettings {
    const BASE_DESCRIPTION: &'static str = "Material";

    fn create(description: String) -> Self {
        Self::new(&description)
    }

    fn geometries(&self) -> &Geometries {
        &self.geometries
    }

    fn geometries_mut(&mut self) -> &mut Geometries {
        &mut self.geometries
    }
}
