//! Settings objects backed by a single schema

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::{SettingsNode, Status};
use crate::adapter::UpdateEffect;
use crate::catalog::{BackgroundSceneConfig, ConfigType, RenderConfig, SetupConfig, SolverType};
use crate::error::{Error, Result};
use crate::property::{PropertyEvent, PropertyGroup, PropertyValue, Widget};
use crate::schema::{self, Schema};

pub const TYPE_FIELD: &str = "type";

pub type SetupSettings = Settings<SetupConfig>;
pub type RenderSettings = Settings<RenderConfig>;
pub type BackgroundScene = Settings<BackgroundSceneConfig>;
pub type SolverSettings = TypedSettings<SolverType>;

/// A settings object with a fixed schema
#[derive(Debug)]
pub struct Settings<S: Schema> {
    pub description: String,
    pub config: S,
    pub status: Status,
}

impl<S: Schema + Default> Settings<S> {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            config: S::default(),
            status: Status::default(),
        }
    }
}

impl<S: Schema> Settings<S> {
    /// Field mappings of the schema merged into one object
    pub fn to_map(&self, results_dir: &Path) -> Result<Map<String, Value>> {
        schema::format_fields(&self.config, results_dir)
    }
}

impl<S: Schema> SettingsNode for Settings<S> {
    fn description(&self) -> &str {
        &self.description
    }

    fn properties(&self) -> PropertyGroup {
        let mut group = PropertyGroup::with_description(self.description.clone());
        schema::draw_properties(&self.config, &mut group);
        group
    }

    fn apply(&mut self, field: &str, event: &PropertyEvent) -> Result<UpdateEffect> {
        schema::apply_field(&mut self.config, field, event)
    }

    fn validate(&mut self) -> bool {
        self.status.record(schema::validate_fields(&self.config))
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn clear_status(&mut self) {
        self.status.clear();
    }
}

/// A settings object whose schema is picked by a `type` control
///
/// Changing the type replaces the schema with the new type's defaults.
#[derive(Debug)]
pub struct TypedSettings<T: ConfigType> {
    pub description: String,
    pub kind: T,
    pub config: Box<dyn Schema>,
    pub status: Status,
}

impl<T: ConfigType> TypedSettings<T> {
    pub fn new(description: &str) -> Self {
        let kind = T::ALL[0];
        Self {
            description: description.to_string(),
            kind,
            config: kind.schema(),
            status: Status::default(),
        }
    }

    /// Switch type; returns whether the schema was rebuilt
    pub fn set_kind(&mut self, kind: T) -> bool {
        if kind == self.kind {
            return false;
        }
        debug!("{} type changed to {}", self.description, kind.name());
        self.kind = kind;
        self.config = kind.schema();
        true
    }

    /// `{"type": name}` followed by the schema's fields
    pub fn to_map(&self, results_dir: &Path) -> Result<Map<String, Value>> {
        let mut output = Map::new();
        output.insert(TYPE_FIELD.to_string(), Value::String(self.kind.name().to_string()));
        output.extend(schema::format_fields(self.config.as_ref(), results_dir)?);
        Ok(output)
    }

    pub(crate) fn draw_into(&self, group: &mut PropertyGroup) {
        group.add(
            TYPE_FIELD,
            Widget::Enum {
                options: T::names(),
                chosen: self.kind.index(),
            },
        );
        schema::draw_properties(self.config.as_ref(), group);
    }
}

impl<T: ConfigType> SettingsNode for TypedSettings<T> {
    fn description(&self) -> &str {
        &self.description
    }

    fn properties(&self) -> PropertyGroup {
        let mut group = PropertyGroup::with_description(self.description.clone());
        self.draw_into(&mut group);
        group
    }

    fn apply(&mut self, field: &str, event: &PropertyEvent) -> Result<UpdateEffect> {
        if field != TYPE_FIELD {
            return schema::apply_field(self.config.as_mut(), field, event);
        }
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match event.value {
            PropertyValue::Choice(index) => {
                let kind = T::ALL.get(index).copied().ok_or(Error::ValueMismatch {
                    field: TYPE_FIELD.to_string(),
                    expected: "choice within the type list",
                })?;
                Ok(if self.set_kind(kind) {
                    UpdateEffect::Redraw
                } else {
                    UpdateEffect::Value
                })
            }
            _ => Err(Error::ValueMismatch {
                field: TYPE_FIELD.to_string(),
                expected: "choice",
            }),
        }
    }

    fn validate(&mut self) -> bool {
        self.status.record(schema::validate_fields(self.config.as_ref()))
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn clear_status(&mut self) {
        self.status.clear();
    }
}
