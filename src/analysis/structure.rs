//! Rebuilds a `CodeTree` from the line-oriented analyzer output.
//!
//! Every output line describes one element:
//!
//! ```text
//! class - [0-100]
//! function - [10-20]
//! ```
//!
//! Elements are attached to the current anchor when their range fits inside
//! it, otherwise to the root. A class attached to the root becomes the new
//! anchor. Once an anchor is replaced its subtree is closed, so classes
//! nested below an already superseded anchor end up as root children.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::element::{CodeTree, ElementId, ElementKind};

lazy_static! {
    /// `<kind> - [<start>-<end>]`, whitespace tolerated around separators.
    static ref LINE_PATTERN: Regex =
        Regex::new(r"^\s*(\w+)\s*-\s*\[\s*(\d+)\s*-\s*(\d+)\s*\]\s*$").unwrap();
}

/// Errors for analyzer output that does not follow the line grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line_number}: expected `<kind> - [<start>-<end>]`, got {line:?}")]
    Malformed { line_number: usize, line: String },
    #[error("line {line_number}: range [{start}-{end}] ends before it starts")]
    InvertedRange {
        line_number: usize,
        start: u64,
        end: u64,
    },
}

/// One parsed output record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    pub kind: ElementKind,
    pub start: u64,
    pub end: u64,
}

/// Parse a single output line. `line_number` is 1-based and only used for
/// error reporting.
pub fn parse_line(line: &str, line_number: usize) -> Result<ElementRecord, ParseError> {
    let malformed = || ParseError::Malformed {
        line_number,
        line: line.to_string(),
    };

    let caps = LINE_PATTERN.captures(line).ok_or_else(malformed)?;
    let start: u64 = caps[2].parse().map_err(|_| malformed())?;
    let end: u64 = caps[3].parse().map_err(|_| malformed())?;

    if start > end {
        return Err(ParseError::InvertedRange {
            line_number,
            start,
            end,
        });
    }

    Ok(ElementRecord {
        kind: ElementKind::parse(&caps[1]),
        start,
        end,
    })
}

/// Build the element tree from output lines in emission order.
pub fn parse<I, S>(lines: I) -> Result<CodeTree, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tree = CodeTree::new();
    let mut anchor = ElementId::ROOT;

    for (index, line) in lines.into_iter().enumerate() {
        let record = parse_line(line.as_ref(), index + 1)?;

        // Containment is judged against the anchor as it stood before this
        // record widened the root.
        let fits_anchor = tree
            .get(anchor)
            .map(|a| a.contains(record.start, record.end))
            .unwrap_or(false);
        tree.extend_root(record.end);

        if fits_anchor {
            tree.attach(anchor, record.kind, record.start, record.end);
        } else {
            let is_class = record.kind == ElementKind::Class;
            let id = tree.attach(ElementId::ROOT, record.kind, record.start, record.end);
            if is_class {
                anchor = id;
            }
        }
    }

    Ok(tree)
}

/// Build the element tree from raw analyzer stdout.
pub fn parse_output(output: &str) -> Result<CodeTree, ParseError> {
    parse(output.lines())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tree: &CodeTree) -> Vec<String> {
        tree.root()
            .children()
            .map(|c| format!("{:?}/{}", c, c.child_count()))
            .collect()
    }

    #[test]
    fn test_parse_line_tolerates_whitespace() {
        let record = parse_line("  function  -  [ 10 - 20 ]  ", 1).unwrap();
        assert_eq!(record.kind, ElementKind::Function);
        assert_eq!((record.start, record.end), (10, 20));

        let record = parse_line("property-[5-5]", 1).unwrap();
        assert_eq!(record.kind, ElementKind::Property);
    }

    #[test]
    fn test_parse_line_rejects_missing_separator() {
        let err = parse_line("class [0-100]", 3).unwrap_err();
        assert_eq!(
            err,
            ParseError::Malformed {
                line_number: 3,
                line: "class [0-100]".to_string()
            }
        );
    }

    #[test]
    fn test_parse_line_rejects_bad_ranges() {
        assert!(parse_line("class - [0-]", 1).is_err());
        assert!(parse_line("class - [a-b]", 1).is_err());
        assert!(parse_line("class - 0-100", 1).is_err());
        assert!(parse_line("", 1).is_err());
        assert!(matches!(
            parse_line("class - [50-10]", 1),
            Err(ParseError::InvertedRange { start: 50, end: 10, .. })
        ));
    }

    #[test]
    fn test_functions_nest_under_anchor_class() {
        let tree = parse([
            "class - [0-100]",
            "function - [10-20]",
            "function - [30-40]",
            "class - [110-120]",
        ])
        .unwrap();

        let root = tree.root();
        assert_eq!(root.end(), 120);
        assert_eq!(kinds(&tree), vec!["class [0-100]/2", "class [110-120]/0"]);

        let first = root.children().next().unwrap();
        let ranges: Vec<_> = first.functions().map(|f| (f.start(), f.end())).collect();
        assert_eq!(ranges, vec![(10, 20), (30, 40)]);
    }

    #[test]
    fn test_superseded_anchor_is_closed() {
        // The second outer class replaces the anchor; an element lexically
        // inside the first class that arrives afterwards lands on the root.
        let tree = parse([
            "class - [0-100]",
            "class - [10-50]",
            "class - [200-300]",
            "function - [20-30]",
            "function - [210-220]",
        ])
        .unwrap();

        assert_eq!(
            kinds(&tree),
            vec!["class [0-100]/1", "class [200-300]/1", "function [20-30]/0"]
        );
    }

    #[test]
    fn test_nested_class_does_not_become_anchor() {
        let tree = parse([
            "class - [0-100]",
            "class - [10-50]",
            "function - [20-30]",
        ])
        .unwrap();

        // The inner class fits the anchor, so it is attached there and the
        // anchor stays on the outer class.
        let outer = tree.root().children().next().unwrap();
        assert_eq!(outer.child_count(), 2);
        assert_eq!(outer.classes().count(), 2);
        assert_eq!(outer.functions().count(), 1);
    }

    #[test]
    fn test_non_class_outside_anchor_goes_to_root() {
        let tree = parse(["function - [0-10]", "field - [5-8]", "field - [20-30]"]).unwrap();

        // Root was [0-0] when the first function arrived, so it did not fit
        // and went to the root without becoming an anchor.
        assert_eq!(tree.root().child_count(), 3);
        assert_eq!(tree.root().end(), 30);
    }

    #[test]
    fn test_root_end_is_maximum_end() {
        let tree = parse([
            "class - [0-100]",
            "function - [10-500]",
            "comment - [0-5]",
        ])
        .unwrap();
        assert_eq!(tree.root().end(), 500);
        assert_eq!(tree.element_count(), 3);
    }

    #[test]
    fn test_malformed_line_fails_whole_parse() {
        let err = parse(["class - [0-100]", "class [0-100]"]).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { line_number: 2, .. }));
    }

    #[test]
    fn test_parse_output_handles_line_endings() {
        let tree = parse_output("class - [0-10]\r\nfunction - [1-2]\n").unwrap();
        assert_eq!(tree.element_count(), 2);

        let empty = parse_output("").unwrap();
        assert!(!empty.has_elements());
        assert_eq!(empty.root().end(), 0);
    }

    #[test]
    fn test_blank_line_is_malformed() {
        assert!(parse_output("class - [0-10]\n\nfunction - [1-2]\n").is_err());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let output = "class - [0-100]\nfunction - [10-20]\nproperty - [22-25]\nclass - [110-120]\n";
        assert_eq!(parse_output(output).unwrap(), parse_output(output).unwrap());
    }
}
