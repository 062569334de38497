//! File adapter: a user-selected input file that travels with the run
//!
//! On serialization the file is copied into `<results_dir>/input_files/` and
//! referenced by a path relative to the results directory, so the solver
//! process never depends on the user's original location.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{describe, mismatch, single, Adapter, UpdateEffect};
use crate::error::{Result, ValidationError};
use crate::property::{PropertyEvent, PropertyGroup, PropertyValue, Widget};
use crate::INPUT_FILES_DIR;

#[derive(Debug, Clone)]
pub struct File {
    pub value: Option<PathBuf>,
    /// Host file-dialog filter, e.g. `"Python Files (*.py)|*.py|"`
    pub filter: String,
    pub allow_none: bool,
    pub label: Option<String>,
}

impl File {
    pub fn new(filter: &str) -> Self {
        Self {
            value: None,
            filter: filter.to_string(),
            allow_none: true,
            label: None,
        }
    }

    pub fn labeled(filter: &str, label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::new(filter)
        }
    }

    pub fn required(mut self) -> Self {
        self.allow_none = false;
        self
    }

    fn existing(&self) -> Option<&Path> {
        self.value.as_deref().filter(|p| p.is_file())
    }
}

impl Adapter for File {
    fn draw(&self, parent: &mut PropertyGroup, name: &str) {
        let node = parent.add(
            name,
            Widget::File {
                filter: self.filter.clone(),
                value: self.value.clone(),
            },
        );
        describe(node, &self.label);
    }

    fn update(&mut self, event: &PropertyEvent) -> Result<UpdateEffect> {
        if !event.is_modification() {
            return Ok(UpdateEffect::Ignored);
        }
        match &event.value {
            PropertyValue::File(path) => {
                self.value = path.clone();
                Ok(UpdateEffect::Value)
            }
            PropertyValue::Text(text) if text.is_empty() => {
                self.value = None;
                Ok(UpdateEffect::Value)
            }
            PropertyValue::Text(text) => {
                self.value = Some(PathBuf::from(text));
                Ok(UpdateEffect::Value)
            }
            _ => Err(mismatch("file")),
        }
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if !self.allow_none && self.existing().is_none() {
            return Err(ValidationError::new("File selection required"));
        }
        Ok(())
    }

    fn to_format(&self, name: &str, results_dir: &Path) -> Result<Map<String, Value>> {
        let Some((source, filename)) = self
            .existing()
            .and_then(|p| p.file_name().map(|f| (p, f)))
        else {
            return Ok(single(name, Value::Null));
        };

        let input_dir = results_dir.join(INPUT_FILES_DIR);
        fs::create_dir_all(&input_dir)?;
        let dest = input_dir.join(filename);
        if dest.is_file() && fs::canonicalize(source)? == fs::canonicalize(&dest)? {
            debug!("{:?} already lives in {:?}", source, input_dir);
        } else {
            if dest.is_file() && fs::read(&dest)? != fs::read(source)? {
                warn!("Overwriting {:?} with {:?}", dest, source);
            }
            fs::copy(source, &dest)?;
            debug!("Copied {:?} into {:?}", source, input_dir);
        }

        let relative = format!("{}/{}", INPUT_FILES_DIR, filename.to_string_lossy());
        Ok(single(name, Value::String(relative)))
    }
}
