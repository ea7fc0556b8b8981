//! Command-line interface for semweight.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analysis::Runner;
use crate::config::{self, Settings, DEFAULT_CONFIG_NAMES};
use crate::files;
use crate::model::{FixedModel, ModelDirectory, ModelSource};
use crate::registry::AnalyzerRegistry;
use crate::report::{self, ScoreReport};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Semantic weight engine - score source files by their structure.
///
/// semweight runs an external structural analyzer per file extension,
/// rebuilds the reported classes, functions and members into a tree, and
/// turns the tree into a weight using a configurable model.
#[derive(Parser)]
#[command(name = "semweight")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log progress and per-file decisions
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score every file under a path
    Score(ScoreArgs),
    /// Print the element tree and weight breakdown of one file
    Tree(TreeArgs),
    /// Create a settings file or weight model from a template
    Init(InitArgs),
}

/// Options shared by commands that run analyzers.
#[derive(Parser)]
pub struct SourceArgs {
    /// Path to settings YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Analyzer root directory (overrides settings)
    #[arg(short, long)]
    pub analyzers: Option<PathBuf>,

    /// Weight model directory (overrides settings)
    #[arg(short, long)]
    pub models: Option<PathBuf>,
}

/// Arguments for the score command.
#[derive(Parser)]
pub struct ScoreArgs {
    /// Path to score (file or directory)
    pub path: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Run analyzers concurrently
    #[arg(short, long)]
    pub parallel: bool,
}

/// Arguments for the tree command.
#[derive(Parser)]
pub struct TreeArgs {
    /// File to analyze
    pub file: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path (default depends on the template)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Template to use
    #[arg(short, long, default_value = "config")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Available templates.
struct Template {
    name: &'static str,
    description: &'static str,
    default_output: &'static str,
    content: &'static str,
}

static TEMPLATES: &[Template] = &[
    Template {
        name: "config",
        description: "Run settings: analyzer root, models, exclusions",
        default_output: "semweight.yaml",
        content: include_str!("templates/config.yaml"),
    },
    Template {
        name: "model",
        description: "Weight model with the built-in limits and multipliers",
        default_output: "models/default.yaml",
        content: include_str!("templates/model.yaml"),
    },
];

/// Load settings from `--config` or the working directory, then apply
/// command-line overrides.
fn load_settings(args: &SourceArgs) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::parse_file(path)
            .map_err(|e| anyhow::anyhow!("cannot load settings {}: {}", path.display(), e))?,
        None => match Settings::discover(Path::new("."))? {
            Some((path, settings)) => {
                info!(settings = %path.display(), "using settings file");
                settings
            }
            None => {
                info!(
                    "no settings file found (looked for {}), using defaults",
                    DEFAULT_CONFIG_NAMES.join(", ")
                );
                Settings::default()
            }
        },
    };

    if let Some(analyzers) = &args.analyzers {
        settings.analyzers = analyzers.clone();
    }
    if let Some(models) = &args.models {
        settings.models = Some(models.clone());
    }

    config::validate(&settings)?;
    Ok(settings)
}

fn model_source(settings: &Settings) -> Box<dyn ModelSource> {
    match &settings.models {
        Some(dir) => Box::new(ModelDirectory::new(dir)),
        None => Box::new(FixedModel::default()),
    }
}

fn open_registry(settings: &Settings) -> AnalyzerRegistry {
    let registry = AnalyzerRegistry::new(&settings.analyzers);
    if !registry.root().is_dir() {
        warn!(
            root = %registry.root().display(),
            "analyzer root does not exist; every file will use the fallback weight"
        );
    }
    registry
}

/// Run the score command.
pub fn run_score(args: &ScoreArgs, verbose: bool) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let settings = match load_settings(&args.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'semweight init' to create a settings file");
            return Ok(EXIT_ERROR);
        }
    };

    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let groups = files::collect_groups(&abs_path, &settings)?;
    if groups.iter().all(|g| g.is_empty()) {
        eprintln!("Warning: no files to score");
        return Ok(EXIT_SUCCESS);
    }

    let registry = open_registry(&settings);
    let models = model_source(&settings);
    let runner = Runner::new(&registry, models.as_ref())
        .parallel(args.parallel || settings.parallel)
        .progress(args.format == "pretty" || verbose);

    let results = match runner.run(&groups) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_FAILED);
        }
    };

    let report = ScoreReport::new(
        &args.path.to_string_lossy(),
        &registry.root().to_string_lossy(),
        &groups,
        &results,
    );

    match args.format.as_str() {
        "json" => report::write_json(&report)?,
        _ => report::write_pretty(&report),
    }

    Ok(EXIT_SUCCESS)
}

/// Run the tree command.
pub fn run_tree(args: &TreeArgs) -> anyhow::Result<i32> {
    let settings = match load_settings(&args.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if !args.file.is_file() {
        eprintln!("Error: not a file: {}", args.file.display());
        return Ok(EXIT_ERROR);
    }

    let registry = open_registry(&settings);
    let models = model_source(&settings);
    let runner = Runner::new(&registry, models.as_ref());

    match runner.analyze_file(&args.file) {
        Ok(analysis) => {
            report::write_tree(&analysis);
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(EXIT_FAILED)
        }
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.list {
        return list_templates();
    }

    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'semweight init --list' to see available templates");
            return Ok(EXIT_ERROR);
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(template.default_output));

    if output.exists() {
        eprintln!("Error: file already exists: {}", output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&output, template.content) {
        eprintln!("Error: failed to write {}: {}", template.name, e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {} from template '{}'", output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to suit your analyzers", output.display());
    match template.name {
        "model" => println!(
            "  2. Run: semweight score . --models {}",
            output.parent().unwrap_or(Path::new(".")).display()
        ),
        _ => println!("  2. Run: semweight score . --config {}", output.display()),
    }

    Ok(EXIT_SUCCESS)
}

fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "config" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  semweight init --template <name>");

    Ok(EXIT_SUCCESS)
}
