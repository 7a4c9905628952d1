use crate::index::types::Fragment;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate counts over a set of fragments
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub fragments: usize,
    pub entries: usize,
    pub records: usize,
    /// Distinct documentation pages referenced by anchors
    pub pages: usize,
    pub records_with_file: usize,
    pub records_without_file: usize,
    /// Records per section name
    pub sections: BTreeMap<String, usize>,
    /// Records per owning file
    pub files: BTreeMap<String, usize>,
}

impl IndexStats {
    pub fn collect(fragments: &[Fragment]) -> Self {
        let mut stats = IndexStats {
            fragments: fragments.len(),
            ..Default::default()
        };
        let mut pages = BTreeSet::new();

        for fragment in fragments {
            stats.entries += fragment.index.len();

            for entry in &fragment.index.entries {
                let count = entry.records.len();
                stats.records += count;
                *stats.sections.entry(fragment.section.clone()).or_insert(0) += count;

                for record in &entry.records {
                    if !record.anchor.page().is_empty() {
                        pages.insert(record.anchor.page().to_string());
                    }
                    match record.owning_file() {
                        Some(file) => {
                            stats.records_with_file += 1;
                            *stats.files.entry(file).or_insert(0) += 1;
                        }
                        None => stats.records_without_file += 1,
                    }
                }
            }
        }

        stats.pages = pages.len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::SearchIndex;
    use std::path::PathBuf;

    fn fragment(section: &str, src: &str) -> Fragment {
        Fragment {
            path: PathBuf::from(format!("{}_0.js", section)),
            section: section.to_string(),
            number: Some(0),
            index: SearchIndex::parse(src).unwrap(),
        }
    }

    #[test]
    fn test_collect() {
        let fragments = vec![
            fragment(
                "all",
                "var s=[['f',['f',['../g.html#a',1,'f():&#160;a.c'],['../g.html#b',1,'f():&#160;a.h']]],['t',['t',['../structt.html',1,'']]]];",
            ),
            fragment("functions", "var s=[['f',['f',['../g.html#a',1,'f():&#160;a.c']]]];"),
        ];

        let stats = IndexStats::collect(&fragments);
        assert_eq!(stats.fragments, 2);
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.records, 4);
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.records_with_file, 3);
        assert_eq!(stats.records_without_file, 1);
        assert_eq!(stats.sections["all"], 3);
        assert_eq!(stats.sections["functions"], 1);
        assert_eq!(stats.files["a.c"], 2);
        assert_eq!(stats.files["a.h"], 1);
    }

    #[test]
    fn test_empty() {
        let stats = IndexStats::collect(&[]);
        assert_eq!(stats.fragments, 0);
        assert_eq!(stats.records, 0);
        assert!(stats.sections.is_empty());
    }
}
