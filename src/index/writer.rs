//! Fragment serialization in the generator's own layout

use crate::index::anchor::AnchorRef;
use crate::index::parser::Value;
use crate::index::types::{EntryLayout, IndexEntry, SearchIndex, SymbolRecord};
use std::fmt::Write;

/// Render an index as fragment source (`var name=\n[\n  ...\n];\n`)
pub fn to_js(index: &SearchIndex) -> String {
    let mut out = String::new();
    out.push_str("var ");
    out.push_str(&index.var_name);
    out.push_str("=\n[\n");

    for (i, entry) in index.entries.iter().enumerate() {
        out.push_str("  ");
        write_entry(&mut out, entry);
        if i + 1 < index.entries.len() {
            out.push(',');
        }
        out.push('\n');
    }

    out.push_str("];\n");
    out
}

/// Render an index as pretty JSON
pub fn to_json(index: &SearchIndex) -> serde_json::Result<String> {
    serde_json::to_string_pretty(index)
}

fn write_entry(out: &mut String, entry: &IndexEntry) {
    out.push('[');
    write_str(out, &entry.key);
    out.push_str(",[");

    match entry.layout {
        EntryLayout::Grouped => {
            write_str(out, entry.display_name());
            for record in &entry.records {
                out.push(',');
                write_link(out, record);
            }
        }
        EntryLayout::Records => {
            for (j, record) in entry.records.iter().enumerate() {
                if j > 0 {
                    out.push(',');
                }
                out.push('[');
                write_str(out, &record.display_name);
                out.push(',');
                write_anchor(out, &record.anchor);
                out.push(',');
                write_str(out, &record.extra);
                out.push(']');
            }
        }
    }
    out.push(']');

    if let Some(trailing) = &entry.trailing {
        out.push(',');
        write_value(out, trailing);
    }
    out.push(']');
}

fn write_link(out: &mut String, record: &SymbolRecord) {
    out.push('[');
    write_anchor(out, &record.anchor);
    out.push(',');
    match record.flag {
        Some(flag) => {
            let _ = write!(out, "{}", flag);
        }
        None => out.push_str("null"),
    }
    out.push(',');
    write_str(out, &record.extra);
    out.push(']');
}

fn write_anchor(out: &mut String, anchor: &AnchorRef) {
    match anchor {
        AnchorRef::Url(url) => write_str(out, url),
        AnchorRef::Titled { url, title } => {
            out.push('[');
            write_str(out, url);
            out.push(',');
            write_str(out, title);
            out.push(']');
        }
    }
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Str(s) => write_str(out, s),
        Value::Int(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null => out.push_str("null"),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
    }
}

/// Single-quoted JavaScript string literal
fn write_str(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}
