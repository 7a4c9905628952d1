//! Interpretation of parsed fragment values and fragment file loading

use crate::index::anchor::AnchorRef;
use crate::index::parser::{parse_fragment, Value};
use crate::index::types::{
    split_fragment_name, EntryLayout, Fragment, IndexEntry, SearchIndex, SymbolRecord,
};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// The value parsed but does not have the shape of a search index
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("fragment must be an array, found {0}")]
    NotAnArray(&'static str),
    #[error("entry {entry}: {reason}")]
    Entry { entry: usize, reason: String },
}

fn entry_err(entry: usize, reason: impl Into<String>) -> ShapeError {
    ShapeError::Entry {
        entry,
        reason: reason.into(),
    }
}

impl SearchIndex {
    /// Build the index model from a parsed array value
    pub fn from_value(var_name: impl Into<String>, value: Value) -> Result<Self, ShapeError> {
        let Value::Array(items) = value else {
            return Err(ShapeError::NotAnArray(value.kind()));
        };

        let entries = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| parse_entry(i, item))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchIndex {
            var_name: var_name.into(),
            entries,
        })
    }

    /// Parse fragment source text
    pub fn parse(source: &str) -> Result<Self> {
        let (var_name, value) = parse_fragment(source)?;
        Ok(Self::from_value(var_name, value)?)
    }
}

fn parse_entry(i: usize, item: Value) -> Result<IndexEntry, ShapeError> {
    let Value::Array(parts) = item else {
        return Err(entry_err(i, format!("expected array, found {}", item.kind())));
    };
    if parts.len() != 2 && parts.len() != 3 {
        return Err(entry_err(
            i,
            format!("expected 2 or 3 elements, found {}", parts.len()),
        ));
    }

    let mut parts = parts.into_iter();
    let key = match parts.next() {
        Some(Value::Str(key)) => key,
        Some(other) => {
            return Err(entry_err(i, format!("key must be a string, found {}", other.kind())));
        }
        None => return Err(entry_err(i, "missing key")),
    };

    let Some(Value::Array(body)) = parts.next() else {
        return Err(entry_err(i, format!("entry '{}' has no record list", key)));
    };
    let trailing = parts.next();

    let (layout, records) = match body.first() {
        // Grouped: display name followed by links
        Some(Value::Str(_)) => (EntryLayout::Grouped, parse_grouped(i, body)?),
        Some(Value::Array(_)) => (EntryLayout::Records, parse_records(i, body)?),
        Some(other) => {
            return Err(entry_err(
                i,
                format!("entry '{}' starts with {}, expected string or array", key, other.kind()),
            ));
        }
        None => (EntryLayout::Records, Vec::new()),
    };

    Ok(IndexEntry {
        key,
        layout,
        records,
        trailing,
    })
}

fn parse_grouped(i: usize, body: Vec<Value>) -> Result<Vec<SymbolRecord>, ShapeError> {
    let mut body = body.into_iter();
    let display_name = match body.next() {
        Some(Value::Str(name)) => name,
        _ => return Err(entry_err(i, "missing display name")),
    };

    body.enumerate()
        .map(|(j, link)| {
            let Value::Array(link) = link else {
                return Err(entry_err(i, format!("link {} must be an array", j)));
            };
            let mut link = link.into_iter();
            let anchor = parse_anchor(i, link.next())?;
            let flag = match link.next() {
                Some(Value::Int(n)) => Some(n),
                Some(Value::Null) | None => None,
                Some(other) => {
                    return Err(entry_err(
                        i,
                        format!("link {} flag must be an integer, found {}", j, other.kind()),
                    ));
                }
            };
            let extra = parse_extra(i, link.next())?;
            Ok(SymbolRecord {
                display_name: display_name.clone(),
                anchor,
                flag,
                extra,
            })
        })
        .collect()
}

fn parse_records(i: usize, body: Vec<Value>) -> Result<Vec<SymbolRecord>, ShapeError> {
    body.into_iter()
        .enumerate()
        .map(|(j, record)| {
            let Value::Array(record) = record else {
                return Err(entry_err(i, format!("record {} must be an array", j)));
            };
            let mut record = record.into_iter();
            let display_name = match record.next() {
                Some(Value::Str(name)) => name,
                _ => return Err(entry_err(i, format!("record {} has no display name", j))),
            };
            let anchor = parse_anchor(i, record.next())?;
            let extra = parse_extra(i, record.next())?;
            Ok(SymbolRecord {
                display_name,
                anchor,
                flag: None,
                extra,
            })
        })
        .collect()
}

fn parse_anchor(i: usize, value: Option<Value>) -> Result<AnchorRef, ShapeError> {
    match value {
        Some(Value::Str(url)) => Ok(AnchorRef::Url(url)),
        Some(Value::Array(pair)) => match <[Value; 2]>::try_from(pair) {
            Ok([Value::Str(url), Value::Str(title)]) => Ok(AnchorRef::Titled { url, title }),
            _ => Err(entry_err(i, "anchor pair must be [url, title] strings")),
        },
        Some(other) => Err(entry_err(
            i,
            format!("anchor must be a string or [url, title], found {}", other.kind()),
        )),
        None => Err(entry_err(i, "missing anchor")),
    }
}

fn parse_extra(i: usize, value: Option<Value>) -> Result<String, ShapeError> {
    match value {
        Some(Value::Str(s)) => Ok(s),
        Some(Value::Null) | None => Ok(String::new()),
        Some(other) => Err(entry_err(
            i,
            format!("description must be a string, found {}", other.kind()),
        )),
    }
}

/// Read and parse one fragment file
pub fn read_fragment(path: &Path) -> Result<Fragment> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let index = SearchIndex::parse(&source)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let (section, number) = split_fragment_name(file_name);

    debug!(
        path = %path.display(),
        entries = index.len(),
        section = %section,
        "Loaded fragment"
    );

    Ok(Fragment {
        path: path.to_path_buf(),
        section,
        number,
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::parser::parse_value;

    fn index_from(src: &str) -> Result<SearchIndex, ShapeError> {
        SearchIndex::from_value("searchData", parse_value(src).unwrap())
    }

    #[test]
    fn test_grouped_entry() {
        let index = index_from(
            "[['list_5fpush',['list_push',['../g.html#a',1,'list_push():&#160;L.c'],['../g.html#b',1,'']]]]",
        )
        .unwrap();

        let entry = &index.entries[0];
        assert_eq!(entry.key, "list_5fpush");
        assert_eq!(entry.layout, EntryLayout::Grouped);
        assert_eq!(entry.records.len(), 2);
        assert_eq!(entry.records[1].display_name, "list_push");
        assert_eq!(entry.records[0].flag, Some(1));
        assert_eq!(entry.records[0].anchor.fragment(), Some("a"));
    }

    #[test]
    fn test_records_entry_with_titled_anchor() {
        let index = index_from(
            "[['lock',[['lock',['../s.html#x','list_t::lock'],'list_t'],['Lock','../t.html','']]]]",
        )
        .unwrap();

        let entry = &index.entries[0];
        assert_eq!(entry.layout, EntryLayout::Records);
        assert_eq!(entry.records.len(), 2);
        assert_eq!(entry.records[0].anchor.title(), Some("list_t::lock"));
        assert_eq!(entry.records[1].display_name, "Lock");
        assert_eq!(entry.records[1].flag, None);
    }

    #[test]
    fn test_three_element_entry_keeps_trailing() {
        let index = index_from("[['a',['A',['../a.html',1,'']],'extra']]").unwrap();
        assert_eq!(
            index.entries[0].trailing,
            Some(Value::Str("extra".to_string()))
        );
    }

    #[test]
    fn test_empty_record_list() {
        let index = index_from("[['a',[]]]").unwrap();
        assert!(index.entries[0].records.is_empty());
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(
            SearchIndex::from_value("x", Value::Int(3)),
            Err(ShapeError::NotAnArray("integer"))
        );
        assert!(matches!(index_from("[['a']]"), Err(ShapeError::Entry { entry: 0, .. })));
        assert!(matches!(index_from("[['a',[]],[1,[]]]"), Err(ShapeError::Entry { entry: 1, .. })));
        assert!(index_from("[['a',['A',['../a.html','one','']]]]").is_err());
        assert!(index_from("[['a',['A',[['u'],1,'']]]]").is_err());
        assert!(index_from("[['a',[['A']]]]").is_err());
    }

    #[test]
    fn test_parse_source() {
        let index = SearchIndex::parse("var searchData=\n[\n  ['x',['X',['../x.html',1,'']]]\n];\n").unwrap();
        assert_eq!(index.var_name, "searchData");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_read_fragment_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("functions_3.js");
        fs::write(&path, "var searchData=[['x',['X',['../x.html',1,'']]]];").unwrap();

        let fragment = read_fragment(&path).unwrap();
        assert_eq!(fragment.section, "functions");
        assert_eq!(fragment.number, Some(3));
        assert_eq!(fragment.index.len(), 1);
    }

    #[test]
    fn test_read_fragment_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_0.js");
        fs::write(&path, "var searchData=\n[\n  ['x' 'y']\n];").unwrap();

        let err = read_fragment(&path).unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("line 3"), "{}", chain);
    }
}
