//! Terminal and JSON rendering of lint reports, lookups and statistics

use crate::index::{Fragment, IndexEntry, IndexStats, SearchIndex};
use crate::lint::{Report, Severity};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print any serializable value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)
}

/// Print lint findings grouped by fragment file, then a summary line
pub fn print_report(report: &Report, choice: ColorChoice) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(choice);
    write_report(&mut stdout, report)
}

pub fn write_report<W: WriteColor>(out: &mut W, report: &Report) -> io::Result<()> {
    let mut current_file: Option<&Path> = None;

    for v in &report.violations {
        let is_new_file = current_file.map(|p| p != v.location.file).unwrap_or(true);
        if is_new_file {
            if current_file.is_some() {
                writeln!(out)?;
            }
            out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
            writeln!(out, "{}", v.location.file.display())?;
            out.reset()?;
            current_file = Some(&v.location.file);
        }

        write!(out, "  ")?;
        if let Some(entry) = v.location.entry {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(out, "{}", entry)?;
            out.reset()?;
            write!(out, ":")?;
        }
        if let Some(key) = &v.location.key {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
            write!(out, "{}", key)?;
            out.reset()?;
            write!(out, " ")?;
        }

        let color = match v.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };
        out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(out, "{}", v.severity)?;
        out.reset()?;
        writeln!(out, "[{}]: {}", v.code, v.message)?;
        writeln!(out, "      hint: {}", v.hint)?;
    }

    if !report.violations.is_empty() {
        writeln!(out)?;
    }

    let summary_color = if report.has_errors() {
        Color::Red
    } else if report.warning_count() > 0 {
        Color::Yellow
    } else {
        Color::Green
    };
    out.set_color(ColorSpec::new().set_fg(Some(summary_color)).set_bold(true))?;
    write!(
        out,
        "{} fragment{} checked",
        report.fragments,
        plural(report.fragments)
    )?;
    out.reset()?;
    writeln!(
        out,
        ": {} error{}, {} warning{}",
        report.error_count(),
        plural(report.error_count()),
        report.warning_count(),
        plural(report.warning_count())
    )?;

    Ok(())
}

/// A lookup hit with the fragment it came from
#[derive(Debug, Serialize)]
pub struct LookupHit<'a> {
    pub file: &'a Path,
    pub entry: &'a IndexEntry,
}

/// Print lookup hits: display name, then one indented line per record
pub fn print_lookup(hits: &[LookupHit<'_>], choice: ColorChoice) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(choice);

    for hit in hits {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(stdout, "{}", hit.entry.display_name())?;
        stdout.reset()?;
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        writeln!(stdout, "  ({})", hit.file.display())?;
        stdout.reset()?;

        for record in &hit.entry.records {
            write!(stdout, "    ")?;
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(stdout, "{}", record.anchor.url())?;
            stdout.reset()?;
            let description = record.description();
            if description.is_empty() {
                writeln!(stdout)?;
            } else {
                writeln!(stdout, "  {}", description)?;
            }
        }
    }

    Ok(())
}

/// Print a fragment as a table of key, name, anchor and owning file
pub fn print_table(index: &SearchIndex) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let key_width = index
        .entries
        .iter()
        .map(|e| e.key.len())
        .max()
        .unwrap_or(3)
        .clamp(3, 40);

    writeln!(out, "{:key_width$}  {:24}  {:48}  FILE", "KEY", "NAME", "ANCHOR")?;
    for entry in &index.entries {
        if entry.records.is_empty() {
            writeln!(out, "{:key_width$}  {:24}  {:48}  -", entry.key, "", "")?;
            continue;
        }
        for record in &entry.records {
            let file = record.owning_file().unwrap_or_else(|| "-".to_string());
            writeln!(
                out,
                "{:key_width$}  {:24}  {:48}  {}",
                entry.key,
                record.display_name,
                record.anchor.url(),
                file
            )?;
        }
    }
    Ok(())
}

/// Print aggregate statistics in the plain `Label: value` style
pub fn print_stats(root: &Path, stats: &IndexStats, fragments: &[Fragment]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "Search Index Statistics")?;
    writeln!(out, "=======================")?;
    writeln!(out)?;
    writeln!(out, "Root path:        {}", root.display())?;
    writeln!(out, "Fragments:        {}", stats.fragments)?;
    writeln!(out, "Entries:          {}", stats.entries)?;
    writeln!(out, "Records:          {}", stats.records)?;
    writeln!(out, "Pages referenced: {}", stats.pages)?;
    writeln!(out, "With source file: {}", stats.records_with_file)?;
    writeln!(out, "Scoped records:   {}", stats.records_without_file)?;

    if !stats.sections.is_empty() {
        writeln!(out)?;
        writeln!(out, "Records by section:")?;
        for (section, count) in &stats.sections {
            let files = fragments.iter().filter(|f| &f.section == section).count();
            writeln!(out, "  {:15} {:6} ({} fragment{})", section, count, files, plural(files))?;
        }
    }

    if !stats.files.is_empty() {
        writeln!(out)?;
        writeln!(out, "Records by source file:")?;
        let mut sorted: Vec<_> = stats.files.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (file, count) in sorted.iter().take(15) {
            writeln!(out, "  {:30} {}", file, count)?;
        }
        if sorted.len() > 15 {
            writeln!(out, "  ... and {} more", sorted.len() - 15)?;
        }
    }

    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::{Location, Violation};
    use std::path::PathBuf;
    use termcolor::NoColor;

    fn violation(file: &str, entry: usize, severity: Severity) -> Violation {
        Violation {
            code: "SIDX_TEST",
            severity,
            message: "something is off".to_string(),
            hint: "fix it",
            location: Location {
                file: PathBuf::from(file),
                entry: Some(entry),
                key: Some("list_5fpop".to_string()),
            },
        }
    }

    fn render(report: &Report) -> String {
        let mut out = NoColor::new(Vec::new());
        write_report(&mut out, report).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn test_report_grouped_by_file() {
        let report = Report {
            fragments: 2,
            checks_run: vec![],
            violations: vec![
                violation("a/all_0.js", 1, Severity::Error),
                violation("a/all_0.js", 4, Severity::Warning),
                violation("a/all_1.js", 0, Severity::Warning),
            ],
        };

        let text = render(&report);
        assert_eq!(text.matches("a/all_0.js").count(), 1);
        assert!(text.contains("  1:list_5fpop error[SIDX_TEST]: something is off"));
        assert!(text.contains("  4:list_5fpop warning[SIDX_TEST]"));
        assert!(text.contains("hint: fix it"));
        assert!(text.ends_with("2 fragments checked: 1 error, 2 warnings\n"));
    }

    #[test]
    fn test_clean_report_summary() {
        let report = Report {
            fragments: 1,
            ..Default::default()
        };
        assert_eq!(render(&report), "1 fragment checked: 0 errors, 0 warnings\n");
    }
}
