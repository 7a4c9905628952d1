//! Fragment discovery and parallel loading

use crate::index::reader::read_fragment;
use crate::index::types::Fragment;
use crate::utils::progress::{ProgressBar, ProgressStyle};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name patterns of generated fragments
pub const DEFAULT_FRAGMENT_PATTERNS: &[&str] = &["*_[0-9]*.js"];

/// Support scripts that live next to fragments but are not fragments
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["search.js", "searchdata.js", "nomatches*"];

/// Options for fragment discovery
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Honour .gitignore files (generated docs are often ignored, so off by default)
    pub respect_ignore: bool,
    /// Show a spinner while loading
    pub progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include: DEFAULT_FRAGMENT_PATTERNS.iter().map(|s| s.to_string()).collect(),
            exclude: DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            respect_ignore: false,
            progress: false,
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("Invalid pattern: {}", pattern))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Find fragment files under `root`, sorted by path.
///
/// A file path is returned as-is without pattern matching.
pub fn discover_fragments(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        anyhow::bail!("No such file or directory: {}", root.display());
    }

    let include = build_globset(&options.include)?;
    let exclude = build_globset(&options.exclude)?;

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(options.respect_ignore)
        .git_global(options.respect_ignore)
        .git_exclude(options.respect_ignore)
        .parents(options.respect_ignore)
        .ignore(options.respect_ignore)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !matches!(name.as_ref(), ".git" | "node_modules" | "target")
        })
        .build();

    let mut paths: Vec<PathBuf> = walker
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| {
            let name = entry.file_name();
            include.is_match(name) && !exclude.is_match(name)
        })
        .map(|entry| entry.into_path())
        .collect();

    paths.sort();
    debug!(root = %root.display(), count = paths.len(), "Discovered fragments");
    Ok(paths)
}

/// Parse fragment files in parallel, keeping input order
pub fn load_fragments(paths: &[PathBuf], progress: bool) -> Vec<Result<Fragment>> {
    let bar = if progress && paths.len() > 1 {
        let bar = ProgressBar::new(paths.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message("Parsing fragments");
        Some(bar)
    } else {
        None
    };

    let results: Vec<Result<Fragment>> = paths
        .par_iter()
        .map(|path| {
            let result = read_fragment(path);
            if let Some(bar) = &bar {
                bar.inc(1);
            }
            result
        })
        .collect();

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    results
}

/// Discover and load everything under `root`
pub fn scan(root: &Path, options: &ScanOptions) -> Result<Vec<Result<Fragment>>> {
    let paths = discover_fragments(root, options)?;
    Ok(load_fragments(&paths, options.progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const FRAGMENT: &str = "var searchData=[['a',['A',['../a.html',1,'']]]];";

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_discover_filters_support_files() {
        let dir = tempfile::tempdir().unwrap();
        let search = dir.path().join("html").join("search");
        fs::create_dir_all(&search).unwrap();
        for name in ["all_1.js", "all_0.js", "functions_0.js", "search.js", "searchdata.js", "nomatches.html", "all_0.html"] {
            fs::write(search.join(name), FRAGMENT).unwrap();
        }

        let paths = discover_fragments(dir.path(), &ScanOptions::default()).unwrap();
        assert_eq!(names(&paths), vec!["all_0.js", "all_1.js", "functions_0.js"]);
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.js");
        fs::write(&path, FRAGMENT).unwrap();

        let paths = discover_fragments(&path, &ScanOptions::default()).unwrap();
        assert_eq!(paths, vec![path]);
    }

    #[test]
    fn test_discover_ignores_gitignore_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".gitignore"), "html/\n").unwrap();
        let search = dir.path().join("html").join("search");
        fs::create_dir_all(&search).unwrap();
        fs::write(search.join("all_0.js"), FRAGMENT).unwrap();

        let found = discover_fragments(dir.path(), &ScanOptions::default()).unwrap();
        assert_eq!(found.len(), 1);

        let options = ScanOptions {
            respect_ignore: true,
            ..ScanOptions::default()
        };
        assert!(discover_fragments(dir.path(), &options).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_fragments(&dir.path().join("nope"), &ScanOptions::default()).is_err());
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let options = ScanOptions {
            include: vec!["[".to_string()],
            ..ScanOptions::default()
        };
        assert!(discover_fragments(dir.path(), &options).is_err());
    }

    #[test]
    fn test_load_keeps_order_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("all_0.js");
        let bad = dir.path().join("all_1.js");
        fs::write(&good, FRAGMENT).unwrap();
        fs::write(&bad, "var searchData=[").unwrap();

        let results = load_fragments(&[good.clone(), bad], false);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().path, good);
        assert!(results[1].is_err());
    }
}
