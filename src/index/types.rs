use crate::index::anchor::{file_from_page, AnchorRef};
use crate::index::key::escape_key;
use crate::index::parser::Value;
use crate::utils::decode_entities;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Variable name generators assign the fragment array to
pub const DEFAULT_VAR_NAME: &str = "searchData";

/// A parsed search-index fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchIndex {
    pub var_name: String,
    pub entries: Vec<IndexEntry>,
}

/// How an entry's records were laid out in the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryLayout {
    /// `[key, [displayName, [anchor, flag, extra], ...]]`
    Grouped,
    /// `[key, [[displayName, anchor, extra], ...]]`
    Records,
}

/// One key of the index with all records filed under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub key: String,
    pub layout: EntryLayout,
    pub records: Vec<SymbolRecord>,
    /// Optional third element of the entry array, carried through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing: Option<Value>,
}

/// A single search hit: display name, link target and description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SymbolRecord {
    pub display_name: String,
    pub anchor: AnchorRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<i64>,
    /// Scope or signature text (may contain HTML character references)
    pub extra: String,
}

impl SymbolRecord {
    /// Source file the documented symbol belongs to.
    ///
    /// Taken from the `signature:&#160;File.c` suffix of the description when
    /// present, otherwise decoded from a file page name. Records scoped to a
    /// compound (struct members, groups) have no owning file.
    pub fn owning_file(&self) -> Option<String> {
        static FILE_SUFFIX: OnceLock<Regex> = OnceLock::new();
        let re = FILE_SUFFIX.get_or_init(|| {
            Regex::new(r":\x{a0}\s*([^\x{a0}]*\S)\s*$").expect("valid owning-file pattern")
        });

        let extra = decode_entities(&self.extra);
        if let Some(caps) = re.captures(&extra) {
            return Some(caps[1].to_string());
        }

        file_from_page(self.anchor.page())
    }

    /// Description with character references decoded
    pub fn description(&self) -> String {
        decode_entities(&self.extra)
    }
}

impl IndexEntry {
    /// Display name shown for the entry (the first record's name)
    pub fn display_name(&self) -> &str {
        self.records
            .first()
            .map(|r| r.display_name.as_str())
            .unwrap_or("")
    }
}

impl SearchIndex {
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.entries.iter().map(|e| e.records.len()).sum()
    }

    /// Find the entry with exactly this key
    pub fn get(&self, key: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Match a user query the way the search widget does: the query is
    /// normalized with the key scheme and compared as a key prefix.
    pub fn lookup(&self, query: &str) -> Vec<&IndexEntry> {
        let needle = escape_key(query.trim());
        if needle.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.key.starts_with(&needle))
            .collect()
    }
}

/// A fragment file on disk together with its parsed index
#[derive(Debug, Clone, Serialize)]
pub struct Fragment {
    pub path: PathBuf,
    /// Section from the file name (`all`, `functions`, ...)
    pub section: String,
    /// Number from the file name (`all_1.js` is 1)
    pub number: Option<u32>,
    pub index: SearchIndex,
}

impl Fragment {
    /// Directory anchor URLs are resolved against
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Split a fragment file name into (section, number)
///
/// `all_1.js` gives `("all", Some(1))`, `functions_a.js` gives
/// `("functions_a", None)`.
pub fn split_fragment_name(file_name: &str) -> (String, Option<u32>) {
    let stem = file_name.strip_suffix(".js").unwrap_or(file_name);
    if let Some((section, num)) = stem.rsplit_once('_') {
        if !section.is_empty() && !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = num.parse::<u32>() {
                return (section.to_string(), Some(n));
            }
        }
    }
    (stem.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, url: &str, extra: &str) -> SymbolRecord {
        SymbolRecord {
            display_name: name.to_string(),
            anchor: AnchorRef::Url(url.to_string()),
            flag: Some(1),
            extra: extra.to_string(),
        }
    }

    fn entry(name: &str) -> IndexEntry {
        IndexEntry {
            key: escape_key(name),
            layout: EntryLayout::Grouped,
            records: vec![record(name, "../a.html", "")],
            trailing: None,
        }
    }

    #[test]
    fn test_owning_file_from_description() {
        let r = record(
            "list_push",
            "../group__linked__list.html#ga64f8",
            "list_push(list_t *list, int value):&#160;Linked_list.c",
        );
        assert_eq!(r.owning_file().as_deref(), Some("Linked_list.c"));
    }

    #[test]
    fn test_owning_file_takes_last_separator() {
        let r = record(
            "cb",
            "../group__linked__list.html#ga01",
            "cb(int tag:&#160;x):&#160;Linked_list.c",
        );
        assert_eq!(r.owning_file().as_deref(), Some("Linked_list.c"));

        let r = record("cb", "../a.html#b", "cb():&#160;Linked_list.c&#160;");
        assert_eq!(r.owning_file().as_deref(), Some("Linked_list.c"));
    }

    #[test]
    fn test_owning_file_from_page() {
        let r = record("Linked_list.h", "../Linked__list_8h.html", "");
        assert_eq!(r.owning_file().as_deref(), Some("Linked_list.h"));
    }

    #[test]
    fn test_owning_file_scoped_member() {
        let r = record("lock", "../structlist__t.html#a236a", "list_t");
        assert_eq!(r.owning_file(), None);
    }

    #[test]
    fn test_description_decoded() {
        let r = record("f", "../a.html", "f():&#160;a.c");
        assert_eq!(r.description(), "f():\u{a0}a.c");
    }

    #[test]
    fn test_lookup_prefix() {
        let mut index = SearchIndex::new(DEFAULT_VAR_NAME);
        for name in ["list_pop", "list_push", "list_size", "lock"] {
            index.entries.push(entry(name));
        }

        let hits: Vec<_> = index.lookup("List_P").iter().map(|e| e.display_name()).collect();
        assert_eq!(hits, vec!["list_pop", "list_push"]);
        assert_eq!(index.lookup("lo").len(), 1);
        assert!(index.lookup("  ").is_empty());
        assert!(index.lookup("zzz").is_empty());
    }

    #[test]
    fn test_get_and_counts() {
        let mut index = SearchIndex::new("x");
        index.entries.push(entry("a"));
        index.entries.push(entry("b"));
        assert_eq!(index.len(), 2);
        assert_eq!(index.record_count(), 2);
        assert!(index.get("b").is_some());
        assert!(index.get("c").is_none());
    }

    #[test]
    fn test_split_fragment_name() {
        assert_eq!(split_fragment_name("all_1.js"), ("all".to_string(), Some(1)));
        assert_eq!(split_fragment_name("functions_10.js"), ("functions".to_string(), Some(10)));
        assert_eq!(split_fragment_name("functions_a.js"), ("functions_a".to_string(), None));
        assert_eq!(split_fragment_name("searchData.js"), ("searchData".to_string(), None));
    }
}
