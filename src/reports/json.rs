//! JSON report, printed once when the walk completes

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::{Reporter, Visit};
use crate::scanner::rules::Rules;
use crate::scanner::types::{ExtensionCatalog, Findings, ScanReport, ScanSummary};

#[derive(Debug, Serialize)]
struct FlaggedEntry {
    path: PathBuf,
    findings: Findings,
}

#[derive(Debug, Serialize)]
struct ResourceForkRow<'a> {
    extension: &'a str,
    count: usize,
    types: &'a BTreeSet<String>,
    risk: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    version: &'static str,
    root: &'a Path,
    entries: &'a [FlaggedEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    debug_entries: Option<&'a [FlaggedEntry]>,
    summary: ScanSummary,
    resource_forks: Vec<ResourceForkRow<'a>>,
    extensions: &'a ExtensionCatalog,
    stripped_to: Option<&'a Path>,
}

/// Collects flagged entries and prints a single JSON document at the end
///
/// In debug mode visited paths are echoed to stderr and entries with only
/// informational findings are kept under `debug_entries`.
#[derive(Debug, Default)]
pub struct JsonReporter {
    debug: bool,
    entries: Vec<FlaggedEntry>,
    debug_entries: Vec<FlaggedEntry>,
}

impl JsonReporter {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    /// Render the document without printing it
    pub fn render(&self, report: &ScanReport, rules: &Rules) -> Result<String> {
        let resource_forks = report
            .resource_forks
            .iter()
            .map(|(extension, forks)| ResourceForkRow {
                extension,
                count: forks.count,
                types: &forks.types,
                risk: rules.resource_fork_risk(extension),
            })
            .collect();

        let document = JsonDocument {
            version: crate::VERSION,
            root: &report.root,
            entries: &self.entries,
            debug_entries: self.debug.then_some(self.debug_entries.as_slice()),
            summary: report.summary,
            resource_forks,
            extensions: &report.extensions,
            stripped_to: report.stripped_to.as_deref(),
        };

        serde_json::to_string_pretty(&document).context("Failed to serialize JSON report")
    }
}

impl Reporter for JsonReporter {
    fn visit(&mut self, _position: usize, path: &Path, _visit: Visit) {
        if self.debug {
            eprintln!("Scanning {}", path.display());
        }
    }

    fn flagged(&mut self, path: &Path, findings: &Findings) {
        self.entries.push(FlaggedEntry {
            path: path.to_path_buf(),
            findings: findings.clone(),
        });
    }

    fn debug_entry(&mut self, path: &Path, findings: &Findings) {
        self.debug_entries.push(FlaggedEntry {
            path: path.to_path_buf(),
            findings: findings.clone(),
        });
    }

    fn finish(&mut self, report: &ScanReport, rules: &Rules) -> Result<()> {
        println!("{}", self.render(report, rules)?);
        Ok(())
    }
}
