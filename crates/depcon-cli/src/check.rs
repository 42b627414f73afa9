use anyhow::{Context, Result};
use depcon_config::CheckConfig;
use depcon_refactor::{analyze_dependencies, NameCollision};
use depcon_syntax::{line_number, parse_source};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::refactor_apply::display_path;

/// A class whose read-only fields are not all injected by its constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub file: String,
    pub line: usize,
    pub class: String,
    pub has_constructor: bool,
    pub missing_parameters: Vec<String>,
    pub unassigned_fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<NameCollision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub root: PathBuf,
    pub files_scanned: usize,
    pub classes_scanned: usize,
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Checks a single file, or every matching file below a directory.
pub fn check_path(path: &Path, config: &CheckConfig) -> Result<CheckReport> {
    let filter = config.source_filter()?;
    let mut report = CheckReport {
        root: path.to_path_buf(),
        files_scanned: 0,
        classes_scanned: 0,
        findings: Vec::new(),
    };

    if path.is_file() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        check_text(&display_path(path), &text, &mut report);
        return Ok(report);
    }
    if !path.is_dir() {
        anyhow::bail!("{} does not exist", path.display());
    }

    let walker = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || entry
                    .path()
                    .strip_prefix(path)
                    .map_or(true, |relative| !filter.is_excluded(relative))
        });
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(target = "depcon.cli", error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(path) else {
            continue;
        };
        if !filter.accepts(relative) {
            continue;
        }
        let text = match fs::read_to_string(entry.path()) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(
                    target = "depcon.cli",
                    path = %entry.path().display(),
                    error = %err,
                    "skipping file that is not valid UTF-8 text"
                );
                continue;
            }
        };
        check_text(&display_path(relative), &text, &mut report);
    }
    Ok(report)
}

fn check_text(file: &str, text: &str, report: &mut CheckReport) {
    report.files_scanned += 1;
    for class in parse_source(text).classes {
        report.classes_scanned += 1;
        let analysis = analyze_dependencies(&class.node);
        for collision in &analysis.collisions {
            tracing::warn!(
                target = "depcon.cli",
                file,
                class = %analysis.class_name,
                parameter = %collision.parameter_name,
                fields = ?collision.field_names,
                "read-only fields share a parameter name"
            );
        }
        if !analysis.is_applicable() {
            continue;
        }
        report.findings.push(Finding {
            file: file.to_string(),
            line: line_number(text, class.layout.range.start),
            class: analysis.class_name,
            has_constructor: analysis.has_constructor,
            missing_parameters: analysis.missing_parameters,
            unassigned_fields: analysis.unassigned_fields,
            collisions: analysis.collisions,
        });
    }
}

/// Human-readable report, one line per finding plus a summary.
pub fn render_report(report: &CheckReport) -> String {
    let mut out = String::new();
    for finding in &report.findings {
        let what = if finding.has_constructor {
            "constructor is missing dependencies"
        } else {
            "no constructor injects its read-only fields"
        };
        out.push_str(&format!(
            "{}:{}: class {}: {what}\n",
            finding.file, finding.line, finding.class
        ));
        if !finding.missing_parameters.is_empty() {
            out.push_str(&format!(
                "  missing parameters: {}\n",
                finding.missing_parameters.join(", ")
            ));
        }
        if !finding.unassigned_fields.is_empty() {
            out.push_str(&format!(
                "  unassigned fields: {}\n",
                finding.unassigned_fields.join(", ")
            ));
        }
        for collision in &finding.collisions {
            out.push_str(&format!(
                "  warning: fields {} all map to parameter `{}`\n",
                collision.field_names.join(", "),
                collision.parameter_name
            ));
        }
    }
    out.push_str(&format!(
        "checked {} file{} ({} class{}): {} need{} constructor updates\n",
        report.files_scanned,
        plural(report.files_scanned, "", "s"),
        report.classes_scanned,
        plural(report.classes_scanned, "", "es"),
        report.findings.len(),
        plural(report.findings.len(), "s", ""),
    ));
    out
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 {
        one
    } else {
        many
    }
}
