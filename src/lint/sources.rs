//! The documented source tree, used to resolve owning files

use ahash::AHashSet;
use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions scanned when none are configured
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &[
    "c", "h", "cc", "cpp", "cxx", "hh", "hpp", "hxx", "inl", "m", "mm", "md", "dox",
];

/// Set of files under a source root, addressable by relative path or base name
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    root: PathBuf,
    rel_paths: AHashSet<String>,
    names: AHashSet<String>,
}

impl SourceTree {
    /// Walk `root`, honouring .gitignore, and record every file whose
    /// extension is in `extensions` (all files when `extensions` is empty).
    pub fn scan(root: &Path, extensions: &[String]) -> Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("Source root is not a directory: {}", root.display());
        }

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !matches!(name.as_ref(), ".git" | "node_modules" | "target")
            })
            .build();

        let mut paths = Vec::new();
        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if !extensions.is_empty() {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if !extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
                    continue;
                }
            }
            if let Ok(rel) = path.strip_prefix(root) {
                paths.push(rel.to_path_buf());
            }
        }

        let tree = Self::from_paths(root, paths);
        debug!(root = %root.display(), files = tree.len(), "Scanned source tree");
        Ok(tree)
    }

    /// Build a tree from already known relative paths
    pub fn from_paths(root: &Path, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut tree = SourceTree {
            root: root.to_path_buf(),
            ..Default::default()
        };
        for rel in paths {
            let rel = normalize_separators(&rel.to_string_lossy());
            if let Some(name) = rel.rsplit('/').next() {
                tree.names.insert(name.to_string());
            }
            tree.rel_paths.insert(rel);
        }
        tree
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.rel_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rel_paths.is_empty()
    }

    /// Whether a file named in the index exists in the tree.
    ///
    /// Bare names match any file with that base name; names with directories
    /// must match a relative path or a trailing part of one.
    pub fn contains(&self, file: &str) -> bool {
        let file = normalize_separators(file.trim());
        let file = file.trim_start_matches("./");
        if file.is_empty() {
            return false;
        }

        if !file.contains('/') {
            return self.names.contains(file);
        }

        if self.rel_paths.contains(file) {
            return true;
        }
        let suffix = format!("/{}", file);
        self.rel_paths.iter().any(|p| p.ends_with(&suffix))
    }
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
