//! Cache of documentation pages referenced by anchors

use crate::index::Fragment;
use ahash::RandomState;
use memchr::memmem;
use memmap2::Mmap;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

type PageMap = HashMap<PathBuf, PageState, RandomState>;

#[derive(Debug)]
pub enum PageState {
    Missing,
    /// Page exists; body is mapped only when anchors are checked
    Present(Option<Mmap>),
}

/// Pages resolved from every local anchor in a set of fragments
#[derive(Debug, Default)]
pub struct PageCache {
    pages: PageMap,
}

impl PageCache {
    /// Resolve and read all referenced pages in parallel
    pub fn load(fragments: &[Fragment], with_bodies: bool) -> Self {
        let wanted: BTreeSet<PathBuf> = fragments
            .iter()
            .flat_map(|fragment| {
                let base = fragment.base_dir();
                fragment
                    .index
                    .entries
                    .iter()
                    .flat_map(|e| e.records.iter())
                    .filter_map(move |r| r.anchor.resolve_page(&base))
            })
            .collect();

        let pages: PageMap = wanted
            .into_par_iter()
            .map(|path| {
                let state = if !path.is_file() {
                    PageState::Missing
                } else if with_bodies {
                    PageState::Present(map_page(&path))
                } else {
                    PageState::Present(None)
                };
                (path, state)
            })
            .collect();

        debug!(pages = pages.len(), with_bodies, "Loaded page cache");
        PageCache { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&PageState> {
        self.pages.get(path)
    }

    pub fn exists(&self, path: &Path) -> bool {
        matches!(self.pages.get(path), Some(PageState::Present(_)))
    }

    /// Whether the page declares `id` or `name` equal to `anchor`.
    ///
    /// Returns `None` when the page is missing or its body was not loaded.
    pub fn has_anchor(&self, path: &Path, anchor: &str) -> Option<bool> {
        match self.pages.get(path)? {
            PageState::Present(Some(body)) => Some(contains_anchor(body, anchor)),
            _ => None,
        }
    }
}

fn map_page(path: &Path) -> Option<Mmap> {
    let file = File::open(path).ok()?;
    // SAFETY: generated pages are not modified while a lint run reads them
    match unsafe { Mmap::map(&file) } {
        Ok(map) => Some(map),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Failed to map page");
            None
        }
    }
}

/// Look for `id="anchor"` or `name="anchor"` with either quote style
pub fn contains_anchor(body: &[u8], anchor: &str) -> bool {
    ["id", "name"].iter().any(|attr| {
        ['"', '\''].iter().any(|q| {
            let needle = format!("{}={}{}{}", attr, q, anchor, q);
            memmem::find(body, needle.as_bytes()).is_some()
        })
    })
}
