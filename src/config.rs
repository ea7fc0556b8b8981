//! Run settings for semweight.
//!
//! Settings come from an optional YAML file; command-line flags override
//! individual fields.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::files::build_globset;
use crate::registry::DEFAULT_ANALYZER_ROOT;

/// Settings file names searched for in the working directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["semweight.yaml", ".semweight.yaml"];

/// Top-level settings document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one analyzer subdirectory per extension
    pub analyzers: PathBuf,
    /// Directory of weight model files; built-in model when unset
    pub models: Option<PathBuf>,
    /// Glob patterns, relative to the scanned root, to leave out
    pub excluded_paths: Vec<String>,
    /// Analyze files concurrently
    pub parallel: bool,
    /// Descend into hidden directories
    pub include_hidden: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            analyzers: PathBuf::from(DEFAULT_ANALYZER_ROOT),
            models: None,
            excluded_paths: Vec::new(),
            parallel: false,
            include_hidden: false,
        }
    }
}

impl Settings {
    /// Parse settings from a YAML file.
    ///
    /// Relative `analyzers` and `models` paths are resolved against the
    /// settings file's directory.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut settings: Settings = serde_yaml::from_str(&content)?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            settings.analyzers = base.join(&settings.analyzers);
            settings.models = settings.models.map(|m| base.join(m));
        }

        Ok(settings)
    }

    /// Settings from the first default file found in `dir`, if any.
    pub fn discover(dir: &Path) -> anyhow::Result<Option<(PathBuf, Self)>> {
        for name in DEFAULT_CONFIG_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                let settings = Self::parse_file(&path)?;
                return Ok(Some((path, settings)));
            }
        }
        Ok(None)
    }
}

/// Validate settings and return a descriptive error.
pub fn validate(settings: &Settings) -> anyhow::Result<()> {
    if settings.analyzers.as_os_str().is_empty() {
        anyhow::bail!("analyzers must name a directory");
    }
    build_globset(&settings.excluded_paths)?;
    Ok(())
}
