//! Batch runner that scores ordered groups of files.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use super::element::CodeTree;
use super::invoke::{InvokeError, Invoker, ProcessInvoker};
use super::structure::{self, ParseError};
use crate::files::{absolute_path, FileGroup};
use crate::model::{ModelError, ModelSource, WeightModel};
use crate::registry::{AnalyzerRegistry, RegistryError};
use crate::score::{self, WeightBreakdown};

/// Failure in one stage of a file's analysis.
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    #[error("malformed analyzer output: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A file whose analysis failed. Aborts the batch.
#[derive(Error, Debug)]
#[error("semantic analysis of {} failed: {source}", path.display())]
pub struct AnalysisError {
    pub path: PathBuf,
    #[source]
    pub source: FileError,
}

/// Result of analyzing one file.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub model: WeightModel,
    pub tree: CodeTree,
    pub weight: WeightBreakdown,
    /// False when no analyzer exists and the fallback artifact was used.
    pub analyzed: bool,
}

impl FileAnalysis {
    /// Zero model and a root-only tree, for files no analyzer handles.
    pub fn fallback<P: AsRef<Path>>(path: P) -> Self {
        let model = WeightModel::default();
        let tree = CodeTree::new();
        let weight = score::breakdown(tree.root(), &model);
        Self {
            path: path.as_ref().to_path_buf(),
            model,
            tree,
            weight,
            analyzed: false,
        }
    }

    pub fn is_fallback(&self) -> bool {
        !self.analyzed
    }

    pub fn total_weight(&self) -> f64 {
        self.weight.total()
    }

    /// The `(model, tree)` pair consumed by ownership aggregation.
    pub fn pair(&self) -> (&WeightModel, &CodeTree) {
        (&self.model, &self.tree)
    }

    pub fn into_pair(self) -> (WeightModel, CodeTree) {
        (self.model, self.tree)
    }
}

/// Drives registry lookup, analyzer invocation, parsing and scoring for
/// every file of every group.
pub struct Runner<'a> {
    registry: &'a AnalyzerRegistry,
    models: &'a dyn ModelSource,
    invoker: Box<dyn Invoker + 'a>,
    parallel: bool,
    progress: bool,
}

impl<'a> Runner<'a> {
    /// Create a runner that spawns analyzer processes.
    pub fn new(registry: &'a AnalyzerRegistry, models: &'a dyn ModelSource) -> Self {
        Self {
            registry,
            models,
            invoker: Box::new(ProcessInvoker),
            parallel: false,
            progress: false,
        }
    }

    /// Replace the analyzer invoker.
    pub fn invoker<I: Invoker + 'a>(mut self, invoker: I) -> Self {
        self.invoker = Box::new(invoker);
        self
    }

    /// Analyze files concurrently. Results keep input order either way.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Show a progress bar and log per-group timing.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Analyze a single file.
    pub fn analyze_file(&self, path: &Path) -> Result<FileAnalysis, AnalysisError> {
        self.try_analyze(path).map_err(|source| AnalysisError {
            path: path.to_path_buf(),
            source,
        })
    }

    fn try_analyze(&self, path: &Path) -> Result<FileAnalysis, FileError> {
        let Some(config) = self.registry.resolve(path)? else {
            debug!(file = %path.display(), "no analyzer, using fallback");
            return Ok(FileAnalysis::fallback(path));
        };

        let target = absolute_path(path);
        let output = self
            .invoker
            .invoke(&config, self.registry.declarations_path(), &target)?;
        let tree = structure::parse_output(&output)?;
        let model = self.models.model_for(path)?;
        let weight = score::breakdown(tree.root(), &model);

        Ok(FileAnalysis {
            path: path.to_path_buf(),
            model,
            tree,
            weight,
            analyzed: true,
        })
    }

    /// Analyze every group. The outer and inner vectors mirror the order of
    /// `groups` and of each group's files. The first failure aborts the run.
    pub fn run(&self, groups: &[FileGroup]) -> Result<Vec<Vec<FileAnalysis>>, AnalysisError> {
        let start = Instant::now();
        let bar = self.progress_bar(groups.len());

        let results = if self.parallel {
            self.run_parallel(groups, &bar)?
        } else {
            self.run_sequential(groups, start, &bar)?
        };

        bar.finish_and_clear();
        if self.progress {
            info!(
                groups = groups.len(),
                "semantic analysis done in {:.2}s",
                start.elapsed().as_secs_f64()
            );
        }
        Ok(results)
    }

    fn run_sequential(
        &self,
        groups: &[FileGroup],
        start: Instant,
        bar: &ProgressBar,
    ) -> Result<Vec<Vec<FileAnalysis>>, AnalysisError> {
        let total = groups.len();
        let mut results = Vec::with_capacity(total);

        for (i, group) in groups.iter().enumerate() {
            let analyzed = group
                .files
                .iter()
                .map(|file| self.analyze_file(file))
                .collect::<Result<Vec<_>, _>>()?;
            results.push(analyzed);

            bar.inc(1);
            if self.progress {
                info!(
                    "semantic analysis: {:.2}s => {}/{}",
                    start.elapsed().as_secs_f64(),
                    i + 1,
                    total
                );
            }
        }

        Ok(results)
    }

    fn run_parallel(
        &self,
        groups: &[FileGroup],
        bar: &ProgressBar,
    ) -> Result<Vec<Vec<FileAnalysis>>, AnalysisError> {
        let files: Vec<&Path> = groups
            .iter()
            .flat_map(|group| group.files.iter().map(PathBuf::as_path))
            .collect();

        // rayon's indexed collect keeps input positions regardless of
        // completion order.
        let flat = files
            .par_iter()
            .map(|file| self.analyze_file(file))
            .collect::<Result<Vec<_>, _>>()?;

        let mut flat = flat.into_iter();
        let results = groups
            .iter()
            .map(|group| {
                bar.inc(1);
                flat.by_ref().take(group.files.len()).collect()
            })
            .collect();
        Ok(results)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} groups {msg}")
        {
            bar.set_style(style.progress_chars("█▓▒░  "));
        }
        bar
    }
}
