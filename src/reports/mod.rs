//! Rendering of per-entry findings and the end-of-run summary

use anyhow::Result;
use std::path::Path;

use crate::scanner::rules::Rules;
use crate::scanner::types::{Findings, ScanReport};

pub mod json;
pub mod progress;
pub mod text;

pub use json::JsonReporter;
pub use progress::StatusLine;
pub use text::TextReporter;

/// What the walker did with an entry it reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Classified,
    IgnoredFile,
    IgnoredPath,
    /// Walked over but not classified (symlinks, devices, sockets)
    Skipped,
    Failed,
}

/// Receives scan output as the walk progresses
pub trait Reporter {
    fn begin(&mut self, _root: &Path) {}

    /// Called once for every entry the walker yields, in walk order
    fn visit(&mut self, _position: usize, _path: &Path, _visit: Visit) {}

    /// An entry with at least one warning or error
    fn flagged(&mut self, path: &Path, findings: &Findings);

    /// An entry with only informational findings, reported in debug mode
    fn debug_entry(&mut self, _path: &Path, _findings: &Findings) {}

    fn finish(&mut self, report: &ScanReport, rules: &Rules) -> Result<()>;
}

/// Output formats offered on the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text, streamed as the walk progresses
    #[default]
    Text,
    /// One JSON document printed when the walk completes
    Json,
}

/// Reporter that keeps everything in memory, for library callers and tests
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub visits: Vec<(std::path::PathBuf, Visit)>,
    pub flagged: Vec<(std::path::PathBuf, Findings)>,
    pub debug: Vec<(std::path::PathBuf, Findings)>,
    pub finished: bool,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flagged_findings(&self, path: &Path) -> Option<&Findings> {
        self.flagged
            .iter()
            .find(|(flagged, _)| flagged == path)
            .map(|(_, findings)| findings)
    }

    pub fn visited(&self, path: &Path) -> Option<Visit> {
        self.visits
            .iter()
            .find(|(visited, _)| visited == path)
            .map(|(_, visit)| *visit)
    }
}

impl Reporter for CollectingReporter {
    fn visit(&mut self, _position: usize, path: &Path, visit: Visit) {
        self.visits.push((path.to_path_buf(), visit));
    }

    fn flagged(&mut self, path: &Path, findings: &Findings) {
        self.flagged.push((path.to_path_buf(), findings.clone()));
    }

    fn debug_entry(&mut self, path: &Path, findings: &Findings) {
        self.debug.push((path.to_path_buf(), findings.clone()));
    }

    fn finish(&mut self, _report: &ScanReport, _rules: &Rules) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
