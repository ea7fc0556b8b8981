//! Analyzer registry: maps file extensions to external structural analyzers.
//!
//! Analyzers live under a root directory with one subdirectory per
//! supported extension:
//!
//! ```text
//! declarations.json        shared by every analyzer
//! lang-semantics/
//!   cs/target              command line, e.g. "dotnet CsSemantics.dll"
//!   py/target
//! ```
//!
//! A registry is constructed once per run and handed to the batch runner by
//! reference. Resolved configurations stay cached for the registry's whole
//! lifetime; changes to the directory layout mid-run are not picked up.

mod cache;

pub use cache::AnalyzerCache;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::files::absolute_path;

/// Default analyzer root, relative to the working directory.
pub const DEFAULT_ANALYZER_ROOT: &str = "lang-semantics";

/// Name of the descriptor file holding an analyzer's command line.
pub const DESCRIPTOR_FILE: &str = "target";

/// Shared declarations file, located next to the analyzer root.
pub const DECLARATIONS_FILE: &str = "declarations.json";

/// Errors raised while loading an analyzer that is present on disk.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("cannot read analyzer descriptor {}: {source}", path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("analyzer descriptor {} names no command", path.display())]
    EmptyCommand { path: PathBuf },
}

/// How to run the analyzer for one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Extension key this analyzer was resolved for (e.g. "cs", ".gitignore").
    pub extension: String,
    /// Directory the analyzer process runs in.
    pub working_directory: PathBuf,
    /// Raw command line from the descriptor file.
    pub command: String,
}

impl AnalyzerConfig {
    /// Whitespace-separated tokens of the command line. The first token is
    /// the program to execute.
    pub fn command_tokens(&self) -> impl Iterator<Item = &str> {
        self.command.split_whitespace()
    }
}

/// Resolves and caches analyzer configurations by extension.
pub struct AnalyzerRegistry {
    root: PathBuf,
    declarations: PathBuf,
    cache: AnalyzerCache,
}

impl AnalyzerRegistry {
    /// Create a registry rooted at the given analyzer directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        // Analyzers run inside their own directory, so every path handed to
        // them must be absolute.
        let root = absolute_path(root.as_ref());
        let declarations = root
            .parent()
            .map(|parent| parent.join(DECLARATIONS_FILE))
            .unwrap_or_else(|| PathBuf::from(DECLARATIONS_FILE));

        Self {
            root,
            declarations,
            cache: AnalyzerCache::new(),
        }
    }

    /// The analyzer root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the declarations file passed to every analyzer.
    pub fn declarations_path(&self) -> &Path {
        &self.declarations
    }

    /// Find the analyzer for a file.
    ///
    /// Returns `Ok(None)` when the file has no usable extension or no
    /// analyzer directory exists for it. An existing directory with a
    /// missing or empty descriptor is a configuration error.
    pub fn resolve(&self, file: &Path) -> Result<Option<Arc<AnalyzerConfig>>, RegistryError> {
        let Some(key) = extension_key(file) else {
            return Ok(None);
        };

        if let Some(config) = self.cache.get(&key) {
            return Ok(Some(config));
        }

        let lang_dir = self.root.join(&key);
        if !lang_dir.is_dir() {
            debug!(extension = %key, dir = %lang_dir.display(), "no analyzer directory");
            return Ok(None);
        }

        let config = self
            .cache
            .get_or_try_load(&key, || load_config(&key, &lang_dir))?;
        Ok(Some(config))
    }

    /// Whether an analyzer exists for the file.
    pub fn has_analyzer(&self, file: &Path) -> Result<bool, RegistryError> {
        Ok(self.resolve(file)?.is_some())
    }

    /// Extensions resolved so far, sorted.
    pub fn cached_extensions(&self) -> Vec<String> {
        self.cache.keys()
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ANALYZER_ROOT)
    }
}

/// Derive the registry key for a file.
///
/// The key is the extension without its dot. Dotfiles without a further
/// extension (".editorconfig") use their full file name.
pub fn extension_key(file: &Path) -> Option<String> {
    if let Some(ext) = file.extension().and_then(|e| e.to_str()) {
        if !ext.is_empty() {
            return Some(ext.to_string());
        }
    }

    let name = file.file_name().and_then(|n| n.to_str())?;
    if name.starts_with('.') {
        Some(name.to_string())
    } else {
        None
    }
}

/// Read the descriptor of an analyzer directory.
fn load_config(key: &str, lang_dir: &Path) -> Result<AnalyzerConfig, RegistryError> {
    let descriptor = lang_dir.join(DESCRIPTOR_FILE);
    let raw = fs::read_to_string(&descriptor).map_err(|source| RegistryError::Descriptor {
        path: descriptor.clone(),
        source,
    })?;

    let command = raw.trim_start_matches('\u{feff}').trim();
    if command.is_empty() {
        return Err(RegistryError::EmptyCommand { path: descriptor });
    }

    debug!(extension = %key, command = %command, "loaded analyzer");

    Ok(AnalyzerConfig {
        extension: key.to_string(),
        working_directory: lang_dir.to_path_buf(),
        command: command.to_string(),
    })
}
