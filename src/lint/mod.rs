//! Integrity checks over parsed search-index fragments.
//!
//! Every check is a plain function from a [`CheckContext`] to a list of
//! [`Violation`]s. Checks are registered in [`CHECKS`] under a stable code so
//! they can be disabled from the command line or the config file.
//!
//! ```no_run
//! use sidx::index::{scan::scan, ScanOptions};
//! use sidx::lint::{run_checks, CheckContext, CheckOptions};
//! use std::path::Path;
//!
//! let fragments: Vec<_> = scan(Path::new("docs/html/search"), &ScanOptions::default())
//!     .unwrap()
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//! let options = CheckOptions::default();
//! let report = run_checks(&CheckContext::new(&fragments, None, &options));
//! println!("{} errors", report.error_count());
//! ```

pub mod checks;
pub mod pages;
pub mod sources;

use crate::index::Fragment;
use pages::PageCache;
use serde::Serialize;
use sources::SourceTree;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Where a violation was found
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Location {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    pub hint: &'static str,
    pub location: Location,
}

/// Check switches, usually filled from the config file and CLI flags
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Verify that anchor pages exist on disk
    pub check_pages: bool,
    /// Verify that anchor fragments exist inside their pages
    pub check_anchors: bool,
    /// Codes of checks to skip
    pub disabled: BTreeSet<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            check_pages: true,
            check_anchors: true,
            disabled: BTreeSet::new(),
        }
    }
}

impl CheckOptions {
    pub fn is_enabled(&self, code: &str) -> bool {
        !self.disabled.contains(code)
    }
}

/// Inputs shared by all checks
pub struct CheckContext<'a> {
    pub fragments: &'a [Fragment],
    pub sources: Option<&'a SourceTree>,
    pub options: &'a CheckOptions,
    pages: OnceLock<PageCache>,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        fragments: &'a [Fragment],
        sources: Option<&'a SourceTree>,
        options: &'a CheckOptions,
    ) -> Self {
        Self {
            fragments,
            sources,
            options,
            pages: OnceLock::new(),
        }
    }

    /// Documentation pages referenced by the fragments, loaded on first use
    pub fn pages(&self) -> &PageCache {
        self.pages
            .get_or_init(|| PageCache::load(self.fragments, self.options.check_anchors))
    }
}

type CheckFn = fn(&CheckContext<'_>) -> Vec<Violation>;

/// A registered integrity check
pub struct Check {
    pub code: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    run: CheckFn,
}

pub const CHECKS: &[Check] = &[
    Check {
        code: checks::DUPLICATE_KEY,
        severity: Severity::Error,
        description: "keys are unique within a section",
        run: checks::check_duplicate_keys,
    },
    Check {
        code: checks::EMPTY_ANCHOR,
        severity: Severity::Error,
        description: "every anchor reference is a non-empty string",
        run: checks::check_empty_anchors,
    },
    Check {
        code: checks::EMPTY_ENTRY,
        severity: Severity::Error,
        description: "entries have a key, a display name and at least one record",
        run: checks::check_empty_entries,
    },
    Check {
        code: checks::BAD_KEY_ESCAPE,
        severity: Severity::Error,
        description: "keys use the lowercase hex escape scheme",
        run: checks::check_key_escapes,
    },
    Check {
        code: checks::KEY_MISMATCH,
        severity: Severity::Warning,
        description: "keys match their escaped display names",
        run: checks::check_key_matches_name,
    },
    Check {
        code: checks::KEY_ORDER,
        severity: Severity::Warning,
        description: "entries are sorted by key",
        run: checks::check_key_order,
    },
    Check {
        code: checks::FRAGMENT_GROUP,
        severity: Severity::Warning,
        description: "keys in one fragment share their first character",
        run: checks::check_fragment_grouping,
    },
    Check {
        code: checks::DUPLICATE_RECORD,
        severity: Severity::Warning,
        description: "records inside an entry are distinct",
        run: checks::check_duplicate_records,
    },
    Check {
        code: checks::MISSING_SOURCE,
        severity: Severity::Error,
        description: "owning files exist in the documented source tree",
        run: checks::check_source_files,
    },
    Check {
        code: checks::MISSING_PAGE,
        severity: Severity::Error,
        description: "anchor pages exist",
        run: checks::check_pages_exist,
    },
    Check {
        code: checks::MISSING_ANCHOR,
        severity: Severity::Warning,
        description: "anchor fragments exist inside their pages",
        run: checks::check_anchors_exist,
    },
];

/// Look up a registered check by code
pub fn find_check(code: &str) -> Option<&'static Check> {
    CHECKS.iter().find(|c| c.code == code)
}

/// Outcome of a lint run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub fragments: usize,
    pub checks_run: Vec<&'static str>,
    pub violations: Vec<Violation>,
}

impl Report {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Whether the run should fail the build
    pub fn failed(&self, deny_warnings: bool) -> bool {
        self.has_errors() || (deny_warnings && self.warning_count() > 0)
    }

    /// Violations with the given code
    pub fn with_code<'r>(&'r self, code: &'r str) -> impl Iterator<Item = &'r Violation> + 'r {
        self.violations.iter().filter(move |v| v.code == code)
    }

    fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }
}

/// Run every enabled check and collect a sorted report
pub fn run_checks(ctx: &CheckContext<'_>) -> Report {
    let mut report = Report {
        fragments: ctx.fragments.len(),
        ..Default::default()
    };

    for check in CHECKS {
        if !ctx.options.is_enabled(check.code) {
            debug!(code = check.code, "Check disabled");
            continue;
        }

        let found = (check.run)(ctx);
        debug!(code = check.code, violations = found.len(), "Check finished");
        report.checks_run.push(check.code);
        report.violations.extend(found);
    }

    report
        .violations
        .sort_by(|a, b| a.location.cmp(&b.location).then_with(|| a.code.cmp(b.code)));

    info!(
        fragments = report.fragments,
        errors = report.error_count(),
        warnings = report.warning_count(),
        "Lint finished"
    );
    report
}

/// Build a violation with the registered severity for `code`
pub(crate) fn violation(
    code: &'static str,
    message: impl Into<String>,
    hint: &'static str,
    location: Location,
) -> Violation {
    let severity = find_check(code)
        .map(|c| c.severity)
        .unwrap_or(Severity::Error);
    Violation {
        code,
        severity,
        message: message.into(),
        hint,
        location,
    }
}
