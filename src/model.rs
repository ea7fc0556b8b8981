//! Weight models: the thresholds and multipliers used to score a file.
//!
//! Models are YAML documents. A model directory holds one model per
//! extension plus an optional fallback:
//!
//! ```text
//! models/
//!   cs.yaml
//!   py.yaml
//!   default.yaml
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::debug;

use crate::registry::extension_key;

/// File name of the fallback model inside a model directory.
pub const DEFAULT_MODEL_FILE: &str = "default.yaml";

/// Errors from loading or validating weight models.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("cannot read weight model {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid weight model {}: {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("weight model {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

/// Thresholds and multipliers for one file.
///
/// Every field defaults to zero, so `WeightModel::default()` is the
/// zero-valued model attached to files without an analyzer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightModel {
    pub base_length_weight: f64,
    pub base_class_weight: f64,
    pub base_function_weight: f64,
    pub base_property_or_field_weight: f64,

    pub length_upper_limit: f64,
    pub length_upper_limit_multiplier: f64,
    pub length_lower_limit: f64,
    pub length_lower_limit_multiplier: f64,

    pub class_upper_limit: f64,
    pub class_upper_limit_multiplier: f64,

    pub function_upper_limit: f64,
    pub function_upper_limit_multiplier: f64,
    pub function_lower_limit: f64,
    pub function_lower_limit_multiplier: f64,

    pub property_field_upper_limit: f64,
    pub property_field_upper_limit_multiplier: f64,
    pub property_field_lower_limit: f64,
    pub property_field_lower_limit_multiplier: f64,
}

impl WeightModel {
    /// Built-in model used when no model file applies to a file.
    pub fn standard() -> Self {
        Self {
            base_length_weight: 10.0,
            base_class_weight: 10.0,
            base_function_weight: 10.0,
            base_property_or_field_weight: 8.0,

            length_upper_limit: 5000.0,
            length_upper_limit_multiplier: 1.5,
            length_lower_limit: 200.0,
            length_lower_limit_multiplier: 0.5,

            class_upper_limit: 1.0,
            class_upper_limit_multiplier: 1.0,

            function_upper_limit: 20.0,
            function_upper_limit_multiplier: 1.0,
            function_lower_limit: 4.0,
            function_lower_limit_multiplier: 1.0,

            property_field_upper_limit: 20.0,
            property_field_upper_limit_multiplier: 1.0,
            property_field_lower_limit: 4.0,
            property_field_lower_limit_multiplier: 1.0,
        }
    }

    /// Parse a model from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model: WeightModel =
            serde_yaml::from_str(&content).map_err(|source| ModelError::Syntax {
                path: path.to_path_buf(),
                source,
            })?;
        model.validate().map_err(|message| ModelError::Invalid {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(model)
    }

    /// Whether every field is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Check that limits are usable. Multipliers and base weights are not
    /// constrained; negative values are a legitimate way to penalize.
    pub fn validate(&self) -> Result<(), String> {
        let limits = [
            ("length_upper_limit", self.length_upper_limit),
            ("length_lower_limit", self.length_lower_limit),
            ("class_upper_limit", self.class_upper_limit),
            ("function_upper_limit", self.function_upper_limit),
            ("function_lower_limit", self.function_lower_limit),
            ("property_field_upper_limit", self.property_field_upper_limit),
            ("property_field_lower_limit", self.property_field_lower_limit),
        ];
        for (name, value) in limits {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, value));
            }
        }

        let ranges = [
            ("length", self.length_lower_limit, self.length_upper_limit),
            ("function", self.function_lower_limit, self.function_upper_limit),
            (
                "property_field",
                self.property_field_lower_limit,
                self.property_field_upper_limit,
            ),
        ];
        for (name, lower, upper) in ranges {
            if lower > upper {
                return Err(format!(
                    "{}_lower_limit ({}) exceeds {}_upper_limit ({})",
                    name, lower, name, upper
                ));
            }
        }

        Ok(())
    }
}

/// Supplies the weight model for a file.
pub trait ModelSource: Send + Sync {
    fn model_for(&self, file: &Path) -> Result<WeightModel, ModelError>;
}

/// Returns the same model for every file.
#[derive(Debug, Clone)]
pub struct FixedModel(pub WeightModel);

impl ModelSource for FixedModel {
    fn model_for(&self, _file: &Path) -> Result<WeightModel, ModelError> {
        Ok(self.0.clone())
    }
}

impl Default for FixedModel {
    fn default() -> Self {
        FixedModel(WeightModel::standard())
    }
}

/// Loads models from `<dir>/<extension>.yaml`, falling back to
/// `<dir>/default.yaml` and then to `WeightModel::standard()`.
///
/// Each model file is parsed once.
pub struct ModelDirectory {
    dir: PathBuf,
    loaded: Mutex<HashMap<PathBuf, WeightModel>>,
}

impl ModelDirectory {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The model file that applies to `file`, if any exists.
    pub fn model_path(&self, file: &Path) -> Option<PathBuf> {
        let specific = extension_key(file).map(|key| self.dir.join(format!("{}.yaml", key)));
        specific
            .into_iter()
            .chain(std::iter::once(self.dir.join(DEFAULT_MODEL_FILE)))
            .find(|candidate| candidate.is_file())
    }

    fn load(&self, path: &Path) -> Result<WeightModel, ModelError> {
        {
            let loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(model) = loaded.get(path) {
                return Ok(model.clone());
            }
        }

        debug!(model = %path.display(), "loading weight model");
        let model = WeightModel::parse_file(path)?;

        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        loaded.insert(path.to_path_buf(), model.clone());
        Ok(model)
    }
}

impl ModelSource for ModelDirectory {
    fn model_for(&self, file: &Path) -> Result<WeightModel, ModelError> {
        match self.model_path(file) {
            Some(path) => self.load(&path),
            None => Ok(WeightModel::standard()),
        }
    }
}
