//! Anchor references and documentation page names

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Target of a search record: a URL, optionally paired with a title
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum AnchorRef {
    Url(String),
    Titled { url: String, title: String },
}

impl AnchorRef {
    pub fn url(&self) -> &str {
        match self {
            AnchorRef::Url(url) | AnchorRef::Titled { url, .. } => url,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            AnchorRef::Url(_) => None,
            AnchorRef::Titled { title, .. } => Some(title),
        }
    }

    /// Page part of the URL (everything before `#`)
    pub fn page(&self) -> &str {
        split_url(self.url()).0
    }

    /// Fragment identifier after `#`, if any
    pub fn fragment(&self) -> Option<&str> {
        split_url(self.url()).1
    }

    /// True for URLs pointing outside the local documentation tree
    pub fn is_external(&self) -> bool {
        let url = self.url();
        url.starts_with("//") || url.contains("://") || url.starts_with("mailto:")
    }

    /// Resolve the page against the directory holding the fragment file.
    ///
    /// Returns `None` for external URLs and for URLs without a page part.
    pub fn resolve_page(&self, base_dir: &Path) -> Option<PathBuf> {
        if self.is_external() {
            return None;
        }
        let page = self.page();
        let page = page.split('?').next().unwrap_or(page);
        if page.is_empty() {
            return None;
        }
        Some(normalize(&base_dir.join(page)))
    }
}

fn split_url(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((page, frag)) => (page, Some(frag)),
        None => (url, None),
    }
}

/// Lexically collapse `.` and `..` so missing intermediate dirs still resolve
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Page-name prefixes of compound (non-file) pages
const COMPOUND_PREFIXES: &[&str] = &[
    "struct",
    "class",
    "union",
    "namespace",
    "group__",
    "dir_",
    "interface",
    "protocol",
    "category",
    "exception",
    "concept",
];

/// Decode a generated page name back into a source file name.
///
/// `Linked__list_8c.html` decodes to `Linked_list.c`. Compound pages
/// (`structlist__t.html`, `group__linked__list.html`) and names that do not
/// describe a file return `None`.
pub fn file_from_page(page: &str) -> Option<String> {
    let name = page.rsplit('/').next().unwrap_or(page);
    let stem = name
        .strip_suffix(".html")
        .or_else(|| name.strip_suffix(".htm"))
        .or_else(|| name.strip_suffix(".xhtml"))?;

    if COMPOUND_PREFIXES.iter().any(|p| stem.starts_with(p)) {
        return None;
    }

    let decoded = decode_page_name(stem)?;
    // A file page always carries an extension
    if decoded.contains('.') {
        Some(decoded)
    } else {
        None
    }
}

/// Reverse the page-name escaping applied to compound and file names
pub fn decode_page_name(stem: &str) -> Option<String> {
    let mut out = String::with_capacity(stem.len());
    let mut chars = stem.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '_' {
            out.push(ch);
            continue;
        }

        let decoded = match chars.next()? {
            '_' => '_',
            '1' => ':',
            '2' => '/',
            '3' => '<',
            '4' => '>',
            '5' => '*',
            '6' => '&',
            '7' => '|',
            '8' => '.',
            '9' => '!',
            '0' => match chars.next()? {
                '0' => ',',
                '1' => ' ',
                '2' => '{',
                '3' => '}',
                '4' => '?',
                '5' => '^',
                '6' => '%',
                '7' => '(',
                '8' => ')',
                '9' => '+',
                'A' => '=',
                'B' => '$',
                'C' => '\\',
                'D' => '@',
                'E' => ']',
                'F' => '[',
                'G' => '#',
                _ => return None,
            },
            // Case-insensitive file systems: uppercase letters become `_` + lowercase
            c if c.is_ascii_lowercase() => c.to_ascii_uppercase(),
            _ => return None,
        };
        out.push(decoded);
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_and_fragment() {
        let a = AnchorRef::Url("../group__linked__list.html#ga9136c8a551ebf255a7219f1ab95e8118".into());
        assert_eq!(a.page(), "../group__linked__list.html");
        assert_eq!(a.fragment(), Some("ga9136c8a551ebf255a7219f1ab95e8118"));

        let b = AnchorRef::Titled {
            url: "../structlist__t.html".into(),
            title: "list_t".into(),
        };
        assert_eq!(b.page(), "../structlist__t.html");
        assert_eq!(b.fragment(), None);
        assert_eq!(b.title(), Some("list_t"));
    }

    #[test]
    fn test_resolve_page() {
        let a = AnchorRef::Url("../structlist__t.html#a236a".into());
        let resolved = a.resolve_page(Path::new("/docs/html/search")).unwrap();
        assert_eq!(resolved, PathBuf::from("/docs/html/structlist__t.html"));
    }

    #[test]
    fn test_resolve_skips_external_and_empty() {
        assert!(AnchorRef::Url("https://example.com/x.html".into())
            .resolve_page(Path::new("/d"))
            .is_none());
        assert!(AnchorRef::Url("#only-fragment".into())
            .resolve_page(Path::new("/d"))
            .is_none());
    }

    #[test]
    fn test_file_from_page() {
        assert_eq!(file_from_page("../Linked__list_8c.html").as_deref(), Some("Linked_list.c"));
        assert_eq!(file_from_page("Linked__list_8h.html").as_deref(), Some("Linked_list.h"));
        assert_eq!(file_from_page("src_2main_8c.html").as_deref(), Some("src/main.c"));
        assert_eq!(file_from_page("../structlist__t.html"), None);
        assert_eq!(file_from_page("../group__linked__list.html"), None);
        assert_eq!(file_from_page("index.html"), None);
        assert_eq!(file_from_page("notes.txt"), None);
    }

    #[test]
    fn test_decode_page_name() {
        assert_eq!(decode_page_name("a_00b_01c").as_deref(), Some("a,b c"));
        assert_eq!(decode_page_name("_my_file_8c").as_deref(), Some("MyFile.c"));
        assert_eq!(decode_page_name("bad_"), None);
        assert_eq!(decode_page_name("bad_0Z"), None);
    }
}
