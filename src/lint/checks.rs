use crate::index::key::{escape_key, validate_key};
use crate::index::{Fragment, IndexEntry};
use crate::lint::{violation, CheckContext, Location, Violation};
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DUPLICATE_KEY: &str = "SIDX_DUPLICATE_KEY";
pub const EMPTY_ANCHOR: &str = "SIDX_EMPTY_ANCHOR";
pub const EMPTY_ENTRY: &str = "SIDX_EMPTY_ENTRY";
pub const BAD_KEY_ESCAPE: &str = "SIDX_BAD_KEY_ESCAPE";
pub const KEY_MISMATCH: &str = "SIDX_KEY_MISMATCH";
pub const KEY_ORDER: &str = "SIDX_KEY_ORDER";
pub const FRAGMENT_GROUP: &str = "SIDX_FRAGMENT_GROUP";
pub const DUPLICATE_RECORD: &str = "SIDX_DUPLICATE_RECORD";
pub const MISSING_SOURCE: &str = "SIDX_MISSING_SOURCE";
pub const MISSING_PAGE: &str = "SIDX_MISSING_PAGE";
pub const MISSING_ANCHOR: &str = "SIDX_MISSING_ANCHOR";

fn at(fragment: &Fragment, i: usize, entry: &IndexEntry) -> Location {
    Location {
        file: fragment.path.clone(),
        entry: Some(i),
        key: Some(entry.key.clone()),
    }
}

fn entries<'c>(
    ctx: &CheckContext<'c>,
) -> impl Iterator<Item = (&'c Fragment, usize, &'c IndexEntry)> + use<'c> {
    let fragments: &'c [Fragment] = ctx.fragments;
    fragments.iter().flat_map(|fragment| {
        fragment
            .index
            .entries
            .iter()
            .enumerate()
            .map(move |(i, entry)| (fragment, i, entry))
    })
}

pub(super) fn check_duplicate_keys(ctx: &CheckContext<'_>) -> Vec<Violation> {
    // One index per section of one documentation tree
    let mut seen: BTreeMap<(PathBuf, &str), AHashMap<&str, (&Fragment, usize)>> = BTreeMap::new();
    let mut violations = Vec::new();

    for (fragment, i, entry) in entries(ctx) {
        if entry.key.is_empty() {
            continue;
        }
        let section = seen
            .entry((fragment.base_dir(), fragment.section.as_str()))
            .or_default();

        match section.get(entry.key.as_str()) {
            Some((first, first_idx)) => violations.push(violation(
                DUPLICATE_KEY,
                format!(
                    "key `{}` already defined at {} entry {}",
                    entry.key,
                    first.path.display(),
                    first_idx
                ),
                "merge the records into the first entry; keys must be unique within the index",
                at(fragment, i, entry),
            )),
            None => {
                section.insert(entry.key.as_str(), (fragment, i));
            }
        }
    }
    violations
}

pub(super) fn check_empty_anchors(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (fragment, i, entry) in entries(ctx) {
        for (j, record) in entry.records.iter().enumerate() {
            if record.anchor.url().trim().is_empty() {
                violations.push(violation(
                    EMPTY_ANCHOR,
                    format!("record {} of `{}` has an empty anchor", j, record.display_name),
                    "regenerate the documentation or drop the record",
                    at(fragment, i, entry),
                ));
            }
        }
    }
    violations
}

pub(super) fn check_empty_entries(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (fragment, i, entry) in entries(ctx) {
        let problem = if entry.key.is_empty() {
            Some("entry has an empty key".to_string())
        } else if entry.records.is_empty() {
            Some(format!("entry `{}` has no records", entry.key))
        } else {
            entry
                .records
                .iter()
                .position(|r| r.display_name.trim().is_empty())
                .map(|j| format!("record {} of `{}` has an empty display name", j, entry.key))
        };

        if let Some(message) = problem {
            violations.push(violation(
                EMPTY_ENTRY,
                message,
                "every entry needs a key and at least one named record",
                at(fragment, i, entry),
            ));
        }
    }
    violations
}

pub(super) fn check_key_escapes(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (fragment, i, entry) in entries(ctx) {
        if let Err(e) = validate_key(&entry.key) {
            violations.push(violation(
                BAD_KEY_ESCAPE,
                format!("key `{}` is malformed: {}", entry.key, e),
                "keys are lowercase alphanumerics with `_xx` hex escapes",
                at(fragment, i, entry),
            ));
        }
    }
    violations
}

pub(super) fn check_key_matches_name(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (fragment, i, entry) in entries(ctx) {
        // Malformed keys are reported by the escape check
        if entry.key.is_empty() || validate_key(&entry.key).is_err() {
            continue;
        }

        let mut reported = AHashSet::new();
        for record in &entry.records {
            let expected = escape_key(&record.display_name);
            if expected != entry.key && reported.insert(expected.clone()) {
                violations.push(violation(
                    KEY_MISMATCH,
                    format!(
                        "key `{}` does not match display name `{}` (expected `{}`)",
                        entry.key, record.display_name, expected
                    ),
                    "file the record under the key derived from its display name",
                    at(fragment, i, entry),
                ));
            }
        }
    }
    violations
}

pub(super) fn check_key_order(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for fragment in ctx.fragments {
        for (i, pair) in fragment.index.entries.windows(2).enumerate() {
            let (prev, entry) = (&pair[0], &pair[1]);
            if entry.key < prev.key {
                violations.push(violation(
                    KEY_ORDER,
                    format!("key `{}` sorts before preceding key `{}`", entry.key, prev.key),
                    "emit entries in ascending key order",
                    at(fragment, i + 1, entry),
                ));
            }
        }
    }
    violations
}

/// Leading character of a key, keeping a `_xx` escape together
fn first_unit(key: &str) -> &str {
    let len = if key.starts_with('_') { 3 } else { 1 };
    key.get(..len).unwrap_or(key)
}

pub(super) fn check_fragment_grouping(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for fragment in ctx.fragments {
        let Some(first) = fragment.index.entries.iter().find(|e| !e.key.is_empty()) else {
            continue;
        };
        let group = first_unit(&first.key);

        for (i, entry) in fragment.index.entries.iter().enumerate() {
            if entry.key.is_empty() {
                continue;
            }
            let unit = first_unit(&entry.key);
            if unit != group {
                violations.push(violation(
                    FRAGMENT_GROUP,
                    format!(
                        "key `{}` starts with `{}` but the fragment groups keys starting with `{}`",
                        entry.key, unit, group
                    ),
                    "move the entry into the fragment for its first character",
                    at(fragment, i, entry),
                ));
            }
        }
    }
    violations
}

pub(super) fn check_duplicate_records(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (fragment, i, entry) in entries(ctx) {
        let mut seen = AHashSet::with_capacity(entry.records.len());
        let duplicates = entry
            .records
            .iter()
            .filter(|record| !seen.insert(*record))
            .count();

        if duplicates > 0 {
            violations.push(violation(
                DUPLICATE_RECORD,
                format!(
                    "entry `{}` repeats {} identical record{}",
                    entry.key,
                    duplicates,
                    if duplicates == 1 { "" } else { "s" }
                ),
                "declaration and definition resolved to the same anchor; deduplicate the records",
                at(fragment, i, entry),
            ));
        }
    }
    violations
}

pub(super) fn check_source_files(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let Some(sources) = ctx.sources else {
        return Vec::new();
    };

    let mut violations = Vec::new();
    for (fragment, i, entry) in entries(ctx) {
        let mut reported = AHashSet::new();
        for record in &entry.records {
            let Some(file) = record.owning_file() else {
                continue;
            };
            if !sources.contains(&file) && reported.insert(file.clone()) {
                violations.push(violation(
                    MISSING_SOURCE,
                    format!(
                        "`{}` references `{}`, which is not in {}",
                        record.display_name,
                        file,
                        sources.root().display()
                    ),
                    "regenerate the documentation from the current source tree",
                    at(fragment, i, entry),
                ));
            }
        }
    }
    violations
}

pub(super) fn check_pages_exist(ctx: &CheckContext<'_>) -> Vec<Violation> {
    if !ctx.options.check_pages {
        return Vec::new();
    }

    let pages = ctx.pages();
    let mut violations = Vec::new();
    for (fragment, i, entry) in entries(ctx) {
        let base = fragment.base_dir();
        let mut reported = AHashSet::new();
        for record in &entry.records {
            let Some(page) = record.anchor.resolve_page(&base) else {
                continue;
            };
            if !pages.exists(&page) && reported.insert(page.clone()) {
                violations.push(violation(
                    MISSING_PAGE,
                    format!(
                        "anchor `{}` points to missing page {}",
                        record.anchor.url(),
                        page.display()
                    ),
                    "regenerate the HTML output or fix the anchor URL",
                    at(fragment, i, entry),
                ));
            }
        }
    }
    violations
}

pub(super) fn check_anchors_exist(ctx: &CheckContext<'_>) -> Vec<Violation> {
    if !ctx.options.check_pages || !ctx.options.check_anchors {
        return Vec::new();
    }

    let pages = ctx.pages();
    let mut violations = Vec::new();
    for (fragment, i, entry) in entries(ctx) {
        let base = fragment.base_dir();
        let mut reported = AHashSet::new();
        for record in &entry.records {
            let (Some(page), Some(anchor)) =
                (record.anchor.resolve_page(&base), record.anchor.fragment())
            else {
                continue;
            };
            if anchor.is_empty() {
                continue;
            }
            if pages.has_anchor(&page, anchor) == Some(false)
                && reported.insert(record.anchor.url().to_string())
            {
                violations.push(violation(
                    MISSING_ANCHOR,
                    format!("page {} has no anchor `{}`", page.display(), anchor),
                    "the symbol moved or was removed; regenerate the documentation",
                    at(fragment, i, entry),
                ));
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SearchIndex;
    use crate::lint::sources::SourceTree;
    use crate::lint::{CheckOptions, Severity};
    use std::fs;
    use std::path::Path;

    fn fragment_at(path: &Path, section: &str, src: &str) -> Fragment {
        Fragment {
            path: path.to_path_buf(),
            section: section.to_string(),
            number: Some(0),
            index: SearchIndex::parse(src).unwrap(),
        }
    }

    fn fragment(src: &str) -> Fragment {
        fragment_at(Path::new("/docs/html/search/all_0.js"), "all", src)
    }

    fn run(check: fn(&CheckContext<'_>) -> Vec<Violation>, fragments: &[Fragment]) -> Vec<Violation> {
        let options = CheckOptions::default();
        check(&CheckContext::new(fragments, None, &options))
    }

    #[test]
    fn test_duplicate_keys_within_section() {
        let a = fragment("var s=[['ab',['ab',['../a.html',1,'']]],['ab',['AB',['../b.html',1,'']]]];");
        let v = run(check_duplicate_keys, &[a]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].code, DUPLICATE_KEY);
        assert_eq!(v[0].severity, Severity::Error);
        assert_eq!(v[0].location.entry, Some(1));
    }

    #[test]
    fn test_duplicate_keys_across_fragments_and_sections() {
        let a = fragment_at(Path::new("/d/search/all_0.js"), "all", "var s=[['a',['a',['../a.html',1,'']]]];");
        let b = fragment_at(Path::new("/d/search/all_1.js"), "all", "var s=[['a',['a',['../a.html',1,'']]]];");
        let c = fragment_at(
            Path::new("/d/search/functions_0.js"),
            "functions",
            "var s=[['a',['a',['../a.html',1,'']]]];",
        );
        let v = run(check_duplicate_keys, &[a, b, c]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].location.file, PathBuf::from("/d/search/all_1.js"));
    }

    #[test]
    fn test_empty_anchor() {
        let f = fragment("var s=[['a',['a',['  ',1,''],['../a.html',1,'']]],['b',[['b',['','t'],'']]]];");
        let v = run(check_empty_anchors, &[f]);
        assert_eq!(v.len(), 2);
        assert!(v.iter().all(|x| x.code == EMPTY_ANCHOR));
    }

    #[test]
    fn test_empty_entries() {
        let f = fragment("var s=[['',['x',['../a.html',1,'']]],['b',[]],['c',['',['../c.html',1,'']]],['d',['d',['../d.html',1,'']]]];");
        let v = run(check_empty_entries, &[f]);
        let entries: Vec<_> = v.iter().map(|x| x.location.entry.unwrap()).collect();
        assert_eq!(entries, vec![0, 1, 2]);
    }

    #[test]
    fn test_bad_key_escape_and_mismatch() {
        let f = fragment(
            "var s=[['List',['List',['../a.html',1,'']]],['list_5ft',['list_t',['../b.html',1,'']]],['lock',['locks',['../c.html',1,'']]]];",
        );
        let bad = run(check_key_escapes, std::slice::from_ref(&f));
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].location.key.as_deref(), Some("List"));

        let mismatch = run(check_key_matches_name, &[f]);
        assert_eq!(mismatch.len(), 1);
        assert_eq!(mismatch[0].location.key.as_deref(), Some("lock"));
        assert_eq!(mismatch[0].severity, Severity::Warning);
    }

    #[test]
    fn test_key_order() {
        let f = fragment("var s=[['la',['la',['../a.html',1,'']]],['lc',['lc',['../a.html',1,'']]],['lb',['lb',['../a.html',1,'']]]];");
        let v = run(check_key_order, &[f]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].location.entry, Some(2));
    }

    #[test]
    fn test_fragment_grouping() {
        let f = fragment(
            "var s=[['_5fa',['_a',['../a.html',1,'']]],['_5fb',['_b',['../a.html',1,'']]],['_7ec',['~c',['../a.html',1,'']]],['d',['d',['../a.html',1,'']]]];",
        );
        let v = run(check_fragment_grouping, &[f]);
        let keys: Vec<_> = v.iter().map(|x| x.location.key.clone().unwrap()).collect();
        assert_eq!(keys, vec!["_7ec", "d"]);
    }

    #[test]
    fn test_duplicate_records() {
        let f = fragment(
            "var s=[['f',['f',['../g.html#a',1,'f():&#160;L.c'],['../g.html#a',1,'f():&#160;L.c'],['../g.html#b',1,'']]]];",
        );
        let v = run(check_duplicate_records, &[f]);
        assert_eq!(v.len(), 1);
        assert!(v[0].message.contains("1 identical record"));
    }

    #[test]
    fn test_source_files() {
        let f = fragment(
            "var s=[['f',['f',['../g.html#a',1,'f():&#160;Linked_list.c'],['../g.html#b',1,'f():&#160;gone.c'],['../g.html#c',1,'f():&#160;gone.c']]],['h',['h.h',['../h_8h.html',1,'']]],['t',['t',['../structt.html',1,'t']]]];",
        );
        let tree = SourceTree::from_paths(Path::new("/src"), [PathBuf::from("Linked_list.c")]);
        let options = CheckOptions::default();
        let fragments = [f];

        let ctx = CheckContext::new(&fragments, Some(&tree), &options);
        let v = check_source_files(&ctx);
        let keys: Vec<_> = v.iter().map(|x| x.location.key.clone().unwrap()).collect();
        assert_eq!(keys, vec!["f", "h"]);

        let without_tree = CheckContext::new(&fragments, None, &options);
        assert!(check_source_files(&without_tree).is_empty());
    }

    #[test]
    fn test_pages_and_anchors() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("html");
        let search = html.join("search");
        fs::create_dir_all(&search).unwrap();
        fs::write(html.join("group.html"), r#"<a id="ga1"></a>"#).unwrap();

        let f = fragment_at(
            &search.join("all_0.js"),
            "all",
            "var s=[['a',['a',['../group.html#ga1',1,''],['../group.html#ga2',1,''],['../gone.html#x',1,''],['https://x.org/y.html',1,'']]]];",
        );
        let fragments = [f];

        let options = CheckOptions::default();
        let ctx = CheckContext::new(&fragments, None, &options);
        let missing_pages = check_pages_exist(&ctx);
        assert_eq!(missing_pages.len(), 1);
        assert!(missing_pages[0].message.contains("gone.html"));

        let missing_anchors = check_anchors_exist(&ctx);
        assert_eq!(missing_anchors.len(), 1);
        assert!(missing_anchors[0].message.contains("ga2"));

        let no_pages = CheckOptions {
            check_pages: false,
            ..Default::default()
        };
        let ctx = CheckContext::new(&fragments, None, &no_pages);
        assert!(check_pages_exist(&ctx).is_empty());
        assert!(check_anchors_exist(&ctx).is_empty());
    }

    #[test]
    fn test_first_unit() {
        assert_eq!(first_unit("list"), "l");
        assert_eq!(first_unit("_5fmain"), "_5f");
        assert_eq!(first_unit("_5"), "_5");
    }
}
