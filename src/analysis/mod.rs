//! Structural analysis of source files through external analyzers.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐     ┌─────────────┐
//! │ Registry     │────▶│ Invoker      │────▶│ Structure    │────▶│ Scorer      │
//! │ (ext lookup) │     │ (subprocess) │     │ (CodeTree)   │     │ (weights)   │
//! └──────────────┘     └──────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! `Runner` drives the pipeline over ordered groups of files. Files without
//! an analyzer get a zero-weight fallback instead of an error.

mod element;
mod invoke;
mod runner;
pub mod structure;

pub use element::{CodeElement, CodeTree, ElementId, ElementKind};
pub use invoke::{invoke, InvokeError, Invoker, ProcessInvoker};
pub use runner::{AnalysisError, FileAnalysis, FileError, Runner};
pub use structure::{parse, parse_output, ParseError};
