//! Statically declared configuration schemas
//!
//! A schema is a plain struct whose fields are adapters. [`Schema`] exposes
//! them as an ordered list of `(field name, adapter)` pairs, and the helpers
//! below draw, validate, serialize and edit any schema through that list.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};

use crate::adapter::{in_field, Adapter, UpdateEffect};
use crate::error::{Error, Result, ValidationError};
use crate::property::{PropertyEvent, PropertyGroup};

pub trait Schema: fmt::Debug {
    /// Fields in declaration order
    fn fields(&self) -> Vec<(&'static str, &dyn Adapter)>;

    fn fields_mut(&mut self) -> Vec<(&'static str, &mut dyn Adapter)>;
}

/// Implement [`Schema`] for a struct by listing its adapter fields in order
#[macro_export]
macro_rules! impl_schema {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::schema::Schema for $ty {
            fn fields(&self) -> Vec<(&'static str, &dyn $crate::adapter::Adapter)> {
                vec![$((stringify!($field), &self.$field as &dyn $crate::adapter::Adapter)),+]
            }

            fn fields_mut(&mut self) -> Vec<(&'static str, &mut dyn $crate::adapter::Adapter)> {
                vec![$((stringify!($field), &mut self.$field as &mut dyn $crate::adapter::Adapter)),+]
            }
        }
    };
}

/// Draw every field of `schema` into `group`
pub fn draw_properties(schema: &dyn Schema, group: &mut PropertyGroup) {
    for (name, adapter) in schema.fields() {
        adapter.draw(group, name);
    }
}

/// First validation failure among the fields, in declaration order
pub fn validate_fields(schema: &dyn Schema) -> std::result::Result<(), ValidationError> {
    for (_, adapter) in schema.fields() {
        adapter.validate()?;
    }
    Ok(())
}

/// Merge the single-key mappings of every field into one mapping
pub fn format_fields(schema: &dyn Schema, results_dir: &Path) -> Result<Map<String, Value>> {
    let mut output = Map::new();
    for (name, adapter) in schema.fields() {
        output.extend(adapter.to_format(name, results_dir)?);
    }
    Ok(output)
}

pub fn field<'a>(schema: &'a dyn Schema, name: &str) -> Option<&'a dyn Adapter> {
    schema
        .fields()
        .into_iter()
        .find(|(field, _)| *field == name)
        .map(|(_, adapter)| adapter)
}

/// Apply an edit to the field addressed by a dotted path such as
/// `camera.localization.look_at`
pub fn apply_field(
    schema: &mut dyn Schema,
    path: &str,
    event: &PropertyEvent,
) -> Result<UpdateEffect> {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    apply_segments(schema, &segments, event).map_err(|err| match err {
        Error::UnknownField(_) => Error::UnknownField(path.to_string()),
        other => in_field(other, path),
    })
}

/// Route an edit to the field named by the first segment; the rest of the
/// path is resolved by that field's adapter
pub fn apply_segments(
    schema: &mut dyn Schema,
    path: &[&str],
    event: &PropertyEvent,
) -> Result<UpdateEffect> {
    let Some((head, rest)) = path.split_first() else {
        return Err(Error::UnknownField(String::new()));
    };

    let adapter = schema
        .fields_mut()
        .into_iter()
        .find(|(field, _)| field == head)
        .map(|(_, adapter)| adapter)
        .ok_or_else(|| Error::UnknownField(head.to_string()))?;

    adapter.apply(rest, event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{Boolean, Real};
    use crate::property::PropertyValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug)]
    struct Sample {
        gain: Real,
        enabled: Boolean,
    }

    crate::impl_schema!(Sample { gain, enabled });

    fn sample() -> Sample {
        Sample {
            gain: Real::labeled(1.0, "Gain").range(0.0, 2.0),
            enabled: Boolean::new(true),
        }
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let names: Vec<_> = sample().fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["gain", "enabled"]);
    }

    #[test]
    fn test_format_merges_fields() {
        let out = format_fields(&sample(), Path::new("/tmp")).unwrap();
        assert_eq!(Value::Object(out), json!({"gain": 1.0, "enabled": true}));
    }

    #[test]
    fn test_apply_and_validate() {
        let mut schema = sample();
        apply_field(&mut schema, "gain", &PropertyEvent::modified(PropertyValue::Real(3.0)))
            .unwrap();
        assert!(validate_fields(&schema).is_err());

        let err = apply_field(&mut schema, "missing", &PropertyEvent::modified(PropertyValue::Real(1.0)))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownField(f) if f == "missing"));
    }

    #[test]
    fn test_mismatch_names_the_field() {
        let mut schema = sample();
        let err = apply_field(&mut schema, "enabled", &PropertyEvent::modified(PropertyValue::Real(1.0)))
            .unwrap_err();
        assert!(matches!(err, Error::ValueMismatch { field, .. } if field == "enabled"));
    }

    #[test]
    fn test_draw_helper_adds_every_field() {
        let mut group = PropertyGroup::new();
        draw_properties(&sample(), &mut group);
        assert_eq!(group.visible_names(), vec!["gain", "enabled"]);
    }
}
