//! File discovery: turns a path into ordered groups of files.

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Settings;

/// An ordered list of files analyzed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    /// Display name, the group's directory relative to the scanned root.
    pub name: String,
    pub files: Vec<PathBuf>,
}

impl FileGroup {
    pub fn new<S: Into<String>>(name: S, files: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Collect the files under `root`, one group per directory.
///
/// Groups are ordered by directory path and files by name. Hidden
/// directories are skipped unless `include_hidden` is set; hidden files are
/// always kept. A file root yields a single group.
pub fn collect_groups(root: &Path, settings: &Settings) -> anyhow::Result<Vec<FileGroup>> {
    if root.is_file() {
        let name = root
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        return Ok(vec![FileGroup::new(name, vec![root.to_path_buf()])]);
    }

    let excluded = build_globset(&settings.excluded_paths)?;
    let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            settings.include_hidden || !name.starts_with('.')
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("cannot walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if excluded.is_match(relative) {
            continue;
        }

        let dir = relative.parent().map(Path::to_path_buf).unwrap_or_default();
        by_dir.entry(dir).or_default().push(path.to_path_buf());
    }

    Ok(by_dir
        .into_iter()
        .map(|(dir, files)| {
            let name = if dir.as_os_str().is_empty() {
                ".".to_string()
            } else {
                dir.display().to_string()
            };
            FileGroup::new(name, files)
        })
        .collect())
}

/// Compile exclusion patterns, rejecting invalid globs.
pub fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern {:?}", pattern))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Absolute form of `path`, resolving symlinks when the path exists.
pub fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
