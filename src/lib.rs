//! semweight - semantic weight engine.
//!
//! semweight estimates how much structural substance a source file carries.
//! An external analyzer per file extension reports the file's classes,
//! functions, fields, properties and comments as offset ranges; semweight
//! rebuilds them into an element tree and scores the tree with a weight
//! model.
//!
//! # Architecture
//!
//! - `registry`: extension to analyzer lookup, cached per run
//! - `analysis`: analyzer invocation, tree reconstruction, batch runner
//! - `score`: weight calculation from a tree and a model
//! - `model`: weight models and where they come from
//! - `config`: run settings (YAML)
//! - `files`: file discovery and grouping
//! - `report`: output formatting (text, JSON)
//!
//! # Adding a Language
//!
//! Create `<analyzers>/<ext>/target` holding the analyzer's command line.
//! The analyzer is called with the declarations file and the target file
//! as its last two arguments and must print one `kind - [start-end]` line
//! per element.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod files;
pub mod model;
pub mod registry;
pub mod report;
pub mod score;

pub use analysis::{
    AnalysisError, CodeElement, CodeTree, ElementKind, FileAnalysis, Invoker, ProcessInvoker,
    Runner,
};
pub use config::Settings;
pub use files::FileGroup;
pub use model::{FixedModel, ModelDirectory, ModelSource, WeightModel};
pub use registry::{AnalyzerConfig, AnalyzerRegistry};
pub use score::WeightBreakdown;
