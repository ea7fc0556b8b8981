//! Output formatting for semweight results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::analysis::{CodeElement, FileAnalysis};
use crate::files::FileGroup;
use crate::score::WeightBreakdown;

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON report.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreReport {
    pub version: String,
    pub path: String,
    pub analyzers: String,
    pub files_scanned: usize,
    pub files_analyzed: usize,
    pub groups: Vec<GroupReport>,
    pub total_weight: f64,
}

/// One file group in the JSON report.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupReport {
    pub name: String,
    pub files: Vec<FileReport>,
    pub total_weight: f64,
}

/// One file in the JSON report.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub analyzed: bool,
    pub elements: usize,
    pub weight: WeightBreakdown,
    pub total_weight: f64,
}

impl ScoreReport {
    /// Assemble a report from batch results. `results` mirrors `groups`.
    pub fn new(
        path: &str,
        analyzers: &str,
        groups: &[FileGroup],
        results: &[Vec<FileAnalysis>],
    ) -> Self {
        let groups: Vec<GroupReport> = groups
            .iter()
            .zip(results)
            .map(|(group, analyses)| {
                let files: Vec<FileReport> = analyses.iter().map(file_report).collect();
                let total_weight = files.iter().map(|f| f.total_weight).sum();
                GroupReport {
                    name: group.name.clone(),
                    files,
                    total_weight,
                }
            })
            .collect();

        let files_scanned = groups.iter().map(|g| g.files.len()).sum();
        let files_analyzed = groups
            .iter()
            .flat_map(|g| g.files.iter())
            .filter(|f| f.analyzed)
            .count();
        let total_weight = groups.iter().map(|g| g.total_weight).sum();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            path: path.to_string(),
            analyzers: analyzers.to_string(),
            files_scanned,
            files_analyzed,
            groups,
            total_weight,
        }
    }
}

fn file_report(analysis: &FileAnalysis) -> FileReport {
    FileReport {
        path: analysis.path.display().to_string(),
        analyzed: analysis.analyzed,
        elements: analysis.tree.element_count(),
        weight: analysis.weight,
        total_weight: analysis.total_weight(),
    }
}

/// Write the report as pretty-printed JSON.
pub fn write_json(report: &ScoreReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write the report in human-readable form.
pub fn write_pretty(report: &ScoreReport) {
    write_header();

    print!("  {}", "Scanning:  ".dimmed());
    println!("{}", report.path);
    print!("  {}", "Analyzers: ".dimmed());
    println!("{}", report.analyzers);
    println!();

    for group in &report.groups {
        write_group(group);
        println!();
    }

    print!("  {}", "Files: ".dimmed());
    print!("{} scanned, {} analyzed", report.files_scanned, report.files_analyzed);
    let skipped = report.files_scanned - report.files_analyzed;
    if skipped > 0 {
        print!("  {}", format!("({} without analyzer)", skipped).dimmed());
    }
    println!();

    print!("  {}", "Total weight: ".bold());
    println!("{}", colored_weight(report.total_weight).bold());
    println!();
}

fn write_header() {
    println!();
    print!("  ");
    print!("{}", "semweight".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
}

fn write_group(group: &GroupReport) {
    println!(
        "  {}  {}",
        group.name.bold(),
        format!("{:.2}", group.total_weight).dimmed()
    );

    for file in &group.files {
        let name = std::path::Path::new(&file.path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.path.clone());

        if !file.analyzed {
            println!(
                "    {:<40} {:>10}  {}",
                name,
                format!("{:.2}", file.total_weight).dimmed(),
                "no analyzer".dimmed()
            );
            continue;
        }

        let w = &file.weight;
        println!(
            "    {:<40} {:>10}  {}",
            name,
            colored_weight(file.total_weight),
            format!(
                "len {}  cls {}  fn {}  prop {}",
                w.length, w.class_count, w.function_count, w.property_or_field_count
            )
            .dimmed()
        );
    }
}

fn colored_weight(weight: f64) -> ColoredString {
    let text = format!("{:.2}", weight);
    if weight < 0.0 {
        text.red()
    } else if weight == 0.0 {
        text.dimmed()
    } else {
        text.green()
    }
}

// =============================================================================
// Tree Format
// =============================================================================

/// Write one file's element tree followed by its weight breakdown.
pub fn write_tree(analysis: &FileAnalysis) {
    write_header();

    print!("  {}", "File: ".dimmed());
    println!("{}", analysis.path.display());
    if !analysis.analyzed {
        println!("  {}", "no analyzer for this file type".yellow());
    }
    println!();

    print!("{}", render_tree(analysis.tree.root()));
    println!();

    write_breakdown(&analysis.weight);
    println!();
}

/// Indented outline of `element` and its descendants, one per line.
pub fn render_tree(element: CodeElement<'_>) -> String {
    let mut out = String::new();
    render_into(&mut out, element, 1);
    out
}

fn render_into(out: &mut String, element: CodeElement<'_>, indent: usize) {
    let _ = writeln!(
        out,
        "{:width$}{} [{}-{}]",
        "",
        element.kind(),
        element.start(),
        element.end(),
        width = indent * 2
    );
    for child in element.children() {
        render_into(out, child, indent + 1);
    }
}

fn write_breakdown(w: &WeightBreakdown) {
    println!("  {}", "Breakdown:".bold());
    let rows = [
        ("length", w.length as f64, w.length_multiplier, w.length_weight),
        ("class", w.class_count as f64, w.class_multiplier, w.class_weight),
        (
            "function",
            w.function_count as f64,
            w.function_multiplier,
            w.function_weight,
        ),
        (
            "property/field",
            w.property_or_field_count as f64,
            w.property_or_field_multiplier,
            w.property_or_field_weight,
        ),
    ];
    for (name, count, multiplier, weight) in rows {
        println!(
            "    {:<16} {:>8}  x{:<6.2} {:>10}",
            name,
            count,
            multiplier,
            colored_weight(weight)
        );
    }
    print!("    {:<16} {:>8}  {:<7} ", "total", "", "");
    println!("{:>10}", colored_weight(w.total()).bold());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{parse_output, CodeTree};
    use crate::model::WeightModel;
    use crate::score;
    use std::path::PathBuf;

    fn analyzed(path: &str, output: &str) -> FileAnalysis {
        let tree = parse_output(output).unwrap();
        let model = WeightModel::standard();
        let weight = score::breakdown(tree.root(), &model);
        FileAnalysis {
            path: PathBuf::from(path),
            model,
            tree,
            weight,
            analyzed: true,
        }
    }

    #[test]
    fn test_report_totals() {
        let a = analyzed("src/a.cs", "class - [0-100]\nfunction - [10-20]\n");
        let b = FileAnalysis::fallback("src/b.bin");
        let expected = a.total_weight();

        let groups = vec![FileGroup::new(
            "src",
            vec![PathBuf::from("src/a.cs"), PathBuf::from("src/b.bin")],
        )];
        let report = ScoreReport::new(".", "lang-semantics", &groups, &[vec![a, b]]);

        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.files_analyzed, 1);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].files[1].total_weight, 0.0);
        assert!((report.total_weight - expected).abs() < 1e-9);
    }

    #[test]
    fn test_json_shape() {
        let groups = vec![FileGroup::new("lib", vec![PathBuf::from("lib/x.bin")])];
        let results = vec![vec![FileAnalysis::fallback("lib/x.bin")]];
        let report = ScoreReport::new("repo", "lang-semantics", &groups, &results);

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["path"], "repo");
        assert_eq!(json["groups"][0]["name"], "lib");
        assert_eq!(json["groups"][0]["files"][0]["analyzed"], false);
        assert_eq!(json["groups"][0]["files"][0]["weight"]["length"], 0);
    }

    #[test]
    fn test_render_tree() {
        let tree = parse_output("class - [0-100]\nfunction - [10-20]\nclass - [200-300]\n").unwrap();
        let rendered = render_tree(tree.root());
        assert_eq!(
            rendered,
            "  root [0-300]\n    class [0-100]\n      function [10-20]\n    class [200-300]\n"
        );
    }

    #[test]
    fn test_render_empty_tree() {
        let tree = CodeTree::new();
        assert_eq!(render_tree(tree.root()), "  root [0-0]\n");
    }
}
