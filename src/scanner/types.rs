use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::Metadata;
use std::path::PathBuf;
use std::time::SystemTime;

/// Sentinel used in place of an extension when a name has no valid one
pub const NO_EXTENSION: &str = "(no extension)";

/// Kind of filesystem node visited by the walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// One filesystem node visited during a walk
#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Only present where the platform records a real birth time
    pub created: Option<SystemTime>,
}

impl ScanEntry {
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        let kind = if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        };

        Self {
            path,
            kind,
            size: metadata.len(),
            modified: metadata.modified().ok(),
            created: metadata.created().ok(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Severity of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A classification result for one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

/// Ordered findings for a single entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Findings(Vec<Finding>);

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.0.push(Finding {
            severity,
            message: message.into(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn extend(&mut self, other: Findings) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Findings of one severity, in insertion order
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.0.iter().filter(move |f| f.severity == severity)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.with_severity(severity).count()
    }

    /// True when anything above informational level was recorded
    pub fn has_problems(&self) -> bool {
        self.0.iter().any(|f| f.severity > Severity::Info)
    }

    /// Errors first, then warnings, then informational findings
    pub fn in_report_order(&self) -> Vec<&Finding> {
        [Severity::Error, Severity::Warn, Severity::Info]
            .into_iter()
            .flat_map(|severity| self.with_severity(severity))
            .collect()
    }

    pub fn messages(&self, severity: Severity) -> Vec<&str> {
        self.with_severity(severity)
            .map(|f| f.message.as_str())
            .collect()
    }
}

/// Resource fork statistics for one normalized extension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionForks {
    pub count: usize,
    pub types: BTreeSet<String>,
}

/// Per-extension histogram of files carrying resource forks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResourceForkReport {
    by_extension: BTreeMap<String, ExtensionForks>,
}

impl ResourceForkReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more file for `extension` and merge its resource types
    pub fn record<I, S>(&mut self, extension: &str, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = if extension.is_empty() {
            NO_EXTENSION
        } else {
            extension
        };
        let entry = self.by_extension.entry(key.to_string()).or_default();
        entry.count += 1;
        entry.types.extend(types.into_iter().map(Into::into));
    }

    pub fn get(&self, extension: &str) -> Option<&ExtensionForks> {
        self.by_extension.get(extension)
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    /// Rows sorted by extension; type codes within a row are sorted and unique
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtensionForks)> {
        self.by_extension.iter().map(|(ext, forks)| (ext.as_str(), forks))
    }
}

/// Distinct normalized extensions seen on regular files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtensionCatalog(BTreeSet<String>);

impl ExtensionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files without a valid extension are not catalogued
    pub fn insert(&mut self, extension: &str) {
        if !extension.is_empty() {
            self.0.insert(extension.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.0.contains(extension)
    }

    pub fn joined(&self) -> String {
        self.0.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }
}

/// Counters for a completed walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub directories: usize,
    pub files: usize,
    pub errors: usize,
    pub stripped_files: usize,
}

/// Where stripped copies go and which extensions are left alone
#[derive(Debug, Clone, Default)]
pub struct StripConfig {
    pub destination: PathBuf,
    pub skip_extensions: BTreeSet<String>,
}

impl StripConfig {
    pub fn new(destination: PathBuf, skip_list: &str) -> Self {
        Self {
            destination,
            skip_extensions: parse_skip_list(skip_list),
        }
    }
}

/// Normalize a comma separated extension list: trimmed, lower-cased, dot-prefixed
pub fn parse_skip_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(|ext| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{ext}")
            }
        })
        .collect()
}

/// Configuration for the scanner, folded from command line flags
#[derive(Debug, Clone, Default)]
pub struct ScannerConfig {
    pub debug: bool,
    pub warn_on_creation_times: bool,
    pub allow_text_missing_extension: bool,
    pub strip: Option<StripConfig>,
}

/// Everything a finished walk produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub root: PathBuf,
    pub summary: ScanSummary,
    pub resource_forks: ResourceForkReport,
    pub extensions: ExtensionCatalog,
    pub stripped_to: Option<PathBuf>,
}
