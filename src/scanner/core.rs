use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use ignore::{DirEntry, WalkBuilder};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::basename::{BasenameValidator, strict_extension};
use super::external::{ContentProbe, DeRez, FileCommand, ResourceDisassembler};
use super::resource_fork::ResourceForkInspector;
use super::rules::Rules;
use super::strip::StrippedCopyWriter;
use super::types::{
    EntryKind, ExtensionCatalog, Findings, ResourceForkReport, ScanEntry, ScanReport, ScanSummary,
    ScannerConfig, Severity,
};
use super::xattrs::{AttributeStore, SystemAttributes, filter_attributes};
use crate::reports::{Reporter, Visit};

const CREATION_TIME_TOLERANCE: Duration = Duration::from_secs(24 * 60 * 60);

/// Walks a tree and classifies every file and directory in it
///
/// Classification is strictly sequential: each entry is fully evaluated,
/// including any external tool invocations, before the next one is visited.
pub struct Scanner<'r> {
    rules: &'r Rules,
    config: ScannerConfig,
    attributes: Box<dyn AttributeStore>,
    disassembler: Box<dyn ResourceDisassembler>,
    probe: Box<dyn ContentProbe>,
}

/// Aggregates owned by one walk
#[derive(Default)]
struct WalkState {
    position: usize,
    /// Directory already reported as unreadable; the walker's own error for it is dropped
    unreadable_dir: Option<PathBuf>,
    summary: ScanSummary,
    resource_forks: ResourceForkReport,
    extensions: ExtensionCatalog,
}

/// Per-entry evaluators, built once per walk
struct Evaluators<'s> {
    validator: BasenameValidator<'s>,
    inspector: ResourceForkInspector<'s>,
    writer: Option<StrippedCopyWriter<'s>>,
}

impl<'r> Scanner<'r> {
    /// Scanner backed by the real filesystem, `DeRez` and `file`
    pub fn new(rules: &'r Rules, config: ScannerConfig) -> Self {
        Self {
            rules,
            config,
            attributes: Box::new(SystemAttributes),
            disassembler: Box::new(DeRez::default()),
            probe: Box::new(FileCommand::default()),
        }
    }

    pub fn with_attribute_store(mut self, store: impl AttributeStore + 'static) -> Self {
        self.attributes = Box::new(store);
        self
    }

    pub fn with_disassembler(mut self, disassembler: impl ResourceDisassembler + 'static) -> Self {
        self.disassembler = Box::new(disassembler);
        self
    }

    pub fn with_content_probe(mut self, probe: impl ContentProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Walk `root`, streaming findings to `reporter`
    ///
    /// Only a root that cannot be resolved or read is an error; everything that
    /// goes wrong below it is reported as a finding on the entry concerned.
    pub fn scan(&self, root: &Path, reporter: &mut dyn Reporter) -> Result<ScanReport> {
        let root = resolve_root(root)?;
        tracing::debug!("Scanning {}", root.display());

        let evaluators = self.evaluators();
        let mut state = WalkState::default();
        reporter.begin(&root);

        for result in self.build_walker(&root).build() {
            state.position += 1;
            match result {
                Ok(entry) => self.visit_entry(&entry, &evaluators, &mut state, reporter),
                Err(err) => self.visit_error(&root, &err, &mut state, reporter),
            }
        }

        let report = ScanReport {
            root,
            summary: state.summary,
            resource_forks: state.resource_forks,
            extensions: state.extensions,
            stripped_to: self.config.strip.as_ref().map(|strip| strip.destination.clone()),
        };

        tracing::debug!(
            "Walk finished: {} entries, {} directories, {} files",
            state.position,
            report.summary.directories,
            report.summary.files
        );

        reporter.finish(&report, self.rules)?;
        Ok(report)
    }

    fn evaluators(&self) -> Evaluators<'_> {
        let mut validator = BasenameValidator::new(self.rules);
        if self.config.allow_text_missing_extension {
            validator = validator.with_text_fallback(self.probe.as_ref());
        }

        Evaluators {
            validator,
            inspector: ResourceForkInspector::new(self.attributes.as_ref(), self.disassembler.as_ref()),
            writer: self
                .config
                .strip
                .as_ref()
                .map(|strip| StrippedCopyWriter::new(self.attributes.as_ref(), strip)),
        }
    }

    /// Deterministic, unfiltered walk that prunes ignored directories
    fn build_walker(&self, root: &Path) -> WalkBuilder {
        let ignored = self.rules.ignored_path_components;
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !ignored.contains(&name))
            });
        builder
    }

    fn visit_entry(
        &self,
        entry: &DirEntry,
        evaluators: &Evaluators<'_>,
        state: &mut WalkState,
        reporter: &mut dyn Reporter,
    ) {
        let path = entry.path();
        let basename = entry.file_name().to_string_lossy().into_owned();

        if self.rules.is_ignored_file(&basename) {
            reporter.visit(state.position, path, Visit::IgnoredFile);
            return;
        }

        if self.rules.is_ignored_path(path) {
            reporter.visit(state.position, path, Visit::IgnoredPath);
            return;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                reporter.visit(state.position, path, Visit::Failed);
                record_walk_error(path, err.to_string(), state, reporter);
                return;
            }
        };

        let scan_entry = ScanEntry::from_metadata(path.to_path_buf(), &metadata);
        if scan_entry.kind == EntryKind::Other {
            reporter.visit(state.position, path, Visit::Skipped);
            return;
        }

        // An unreadable directory is a walk error, not a visited directory
        if scan_entry.kind == EntryKind::Directory {
            if let Err(err) = fs::read_dir(path) {
                reporter.visit(state.position, path, Visit::Failed);
                record_walk_error(path, io_message(&err), state, reporter);
                state.unreadable_dir = Some(path.to_path_buf());
                return;
            }
        }

        reporter.visit(state.position, path, Visit::Classified);
        let findings = self.classify(&scan_entry, &basename, evaluators, state);

        if findings.has_problems() {
            reporter.flagged(path, &findings);
        } else if self.config.debug && findings.count(Severity::Info) > 0 {
            reporter.debug_entry(path, &findings);
        }
    }

    fn visit_error(
        &self,
        root: &Path,
        err: &ignore::Error,
        state: &mut WalkState,
        reporter: &mut dyn Reporter,
    ) {
        let (path, message) = split_walk_error(err);
        let path = path.unwrap_or(root);

        if state.unreadable_dir.as_deref() == Some(path) {
            state.position -= 1;
            return;
        }

        let ignored_file = path
            .file_name()
            .is_some_and(|name| self.rules.is_ignored_file(&name.to_string_lossy()));
        if ignored_file {
            reporter.visit(state.position, path, Visit::IgnoredFile);
            return;
        }
        if self.rules.is_ignored_path(path) {
            reporter.visit(state.position, path, Visit::IgnoredPath);
            return;
        }

        reporter.visit(state.position, path, Visit::Failed);
        record_walk_error(path, message, state, reporter);
    }

    /// Run every evaluator over one file or directory
    fn classify(
        &self,
        entry: &ScanEntry,
        basename: &str,
        evaluators: &Evaluators<'_>,
        state: &mut WalkState,
    ) -> Findings {
        if entry.is_file() {
            state.summary.files += 1;
            state.extensions.insert(&strict_extension(basename));
        } else {
            state.summary.directories += 1;
        }

        let mut findings = evaluators.validator.check(&entry.path, basename, entry.is_file());

        match self.attributes.list(&entry.path) {
            Ok(names) => {
                let attributes = filter_attributes(self.rules, names);
                if !attributes.is_empty() {
                    findings.info(format!("xattrs: {}", attributes.join(", ")));
                }

                findings.extend(evaluators.inspector.inspect(
                    entry,
                    &attributes,
                    &mut state.resource_forks,
                ));

                if let Some(writer) = &evaluators.writer {
                    state.summary.stripped_files += writer.copy(&entry.path, &attributes, &mut findings);
                }
            }
            Err(err) => findings.error(format!("Failed to list extended attributes: {err}")),
        }

        if self.config.warn_on_creation_times {
            if let Some(warning) = creation_time_warning(entry) {
                findings.warn(warning);
            }
        }

        findings
    }
}

fn record_walk_error(path: &Path, message: String, state: &mut WalkState, reporter: &mut dyn Reporter) {
    state.summary.errors += 1;
    tracing::debug!("Walk error at {}: {}", path.display(), message);
    let mut findings = Findings::new();
    findings.error(message);
    reporter.flagged(path, &findings);
}

/// Absolute, lexically cleaned form of `root`, checked for readability
pub fn resolve_root(root: &Path) -> Result<PathBuf> {
    let root = std::path::absolute(root)
        .map(|absolute| clean_path(&absolute))
        .with_context(|| format!("Failed to resolve scan root {}", root.display()))?;

    let metadata = fs::metadata(&root)
        .with_context(|| format!("Cannot access scan root {}", root.display()))?;
    if metadata.is_dir() {
        fs::read_dir(&root)
            .with_context(|| format!("Cannot read scan root {}", root.display()))?;
    }

    Ok(root)
}

/// Drop `.` components and resolve `..` against the preceding component
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => cleaned.push(component),
            },
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// Message for an I/O failure without the path the caller already reports
fn io_message(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => io::Error::from_raw_os_error(code).to_string(),
        None => err.to_string(),
    }
}

/// Path the walker was at when it failed, and the bare error message
fn split_walk_error(err: &ignore::Error) -> (Option<&Path>, String) {
    match err {
        ignore::Error::WithPath { path, err } => {
            let message = err.io_error().map_or_else(|| err.to_string(), io_message);
            (Some(path.as_path()), message)
        }
        ignore::Error::WithDepth { err, .. } => split_walk_error(err),
        ignore::Error::WithLineNumber { err, .. } => split_walk_error(err),
        ignore::Error::Loop { child, .. } => (Some(child.as_path()), err.to_string()),
        other => (None, other.to_string()),
    }
}

/// Warning when the content was modified more than a day after the file was created
///
/// Entries without a recorded birth time are never flagged.
pub fn creation_time_warning(entry: &ScanEntry) -> Option<String> {
    let created = entry.created?;
    let modified = entry.modified?;
    let drift = modified.duration_since(created).ok()?;
    if drift > CREATION_TIME_TOLERANCE {
        Some(format!(
            "Significant creation time: {} vs. {}",
            format_time(created),
            format_time(modified)
        ))
    } else {
        None
    }
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S %z")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::CollectingReporter;
    use std::fs;
    use tempfile::TempDir;

    fn entry_with_times(created: Option<SystemTime>, modified: Option<SystemTime>) -> ScanEntry {
        ScanEntry {
            path: PathBuf::from("/tmp/root/a.txt"),
            kind: EntryKind::File,
            size: 1,
            modified,
            created,
        }
    }

    #[test]
    fn test_creation_time_warning() {
        let created = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);

        let late = created + Duration::from_secs(3 * 24 * 60 * 60);
        let warning = creation_time_warning(&entry_with_times(Some(created), Some(late))).unwrap();
        assert!(warning.starts_with("Significant creation time: "));

        let soon = created + Duration::from_secs(60 * 60);
        assert!(creation_time_warning(&entry_with_times(Some(created), Some(soon))).is_none());

        let earlier = created - Duration::from_secs(3 * 24 * 60 * 60);
        assert!(creation_time_warning(&entry_with_times(Some(created), Some(earlier))).is_none());
    }

    #[test]
    fn test_no_birth_time_never_warns() {
        let modified = SystemTime::now();
        assert!(creation_time_warning(&entry_with_times(None, Some(modified))).is_none());
    }

    #[test]
    fn test_resolve_root_missing() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(resolve_root(&missing).is_err());
    }

    #[test]
    fn test_scan_counts_and_ignores() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), "hello").unwrap();
        fs::write(root.join(".DS_Store"), "junk").unwrap();
        fs::create_dir(root.join("Docs")).unwrap();
        fs::write(root.join("Docs").join("letter.doc"), "dear").unwrap();
        fs::create_dir_all(root.join(".git").join("objects")).unwrap();
        fs::write(root.join(".git").join("HEAD"), "ref").unwrap();

        let rules = Rules::default();
        let scanner = Scanner::new(&rules, ScannerConfig::default());
        let mut reporter = CollectingReporter::new();
        let report = scanner.scan(root, &mut reporter).unwrap();

        assert_eq!(report.summary.directories, 2);
        assert_eq!(report.summary.files, 2);
        assert_eq!(report.summary.errors, 0);
        assert!(report.extensions.contains(".txt"));
        assert!(report.extensions.contains(".doc"));
        assert!(reporter.visited(&root.join(".git").join("HEAD")).is_none());
        assert_eq!(reporter.visited(&root.join(".DS_Store")), Some(Visit::IgnoredFile));
        assert!(reporter.finished);
    }

    fn permission_denied_at(path: &Path) -> ignore::Error {
        ignore::Error::WithDepth {
            depth: 1,
            err: Box::new(ignore::Error::WithPath {
                path: path.to_path_buf(),
                err: Box::new(ignore::Error::Io(io::Error::from_raw_os_error(13))),
            }),
        }
    }

    #[test]
    fn test_walk_error_is_counted_and_flagged() {
        let rules = Rules::default();
        let scanner = Scanner::new(&rules, ScannerConfig::default());
        let mut reporter = CollectingReporter::new();
        let mut state = WalkState {
            position: 1,
            ..WalkState::default()
        };
        let root = Path::new("/tmp/root");
        let locked = root.join("locked");

        scanner.visit_error(root, &permission_denied_at(&locked), &mut state, &mut reporter);

        assert_eq!(state.summary.errors, 1);
        assert_eq!(state.summary.directories, 0);
        assert_eq!(reporter.visited(&locked), Some(Visit::Failed));
        let findings = reporter.flagged_findings(&locked).unwrap();
        let expected = io::Error::from_raw_os_error(13).to_string();
        assert_eq!(findings.messages(Severity::Error), vec![expected.as_str()]);
        assert!(!findings.messages(Severity::Error)[0].contains("/tmp/root"));
    }

    #[test]
    fn test_walk_error_for_reported_directory_is_dropped() {
        let rules = Rules::default();
        let scanner = Scanner::new(&rules, ScannerConfig::default());
        let mut reporter = CollectingReporter::new();
        let locked = PathBuf::from("/tmp/root/locked");
        let mut state = WalkState {
            position: 3,
            unreadable_dir: Some(locked.clone()),
            ..WalkState::default()
        };

        scanner.visit_error(Path::new("/tmp/root"), &permission_denied_at(&locked), &mut state, &mut reporter);

        assert_eq!(state.summary.errors, 0);
        assert_eq!(state.position, 2);
        assert!(reporter.flagged.is_empty());
        assert!(reporter.visits.is_empty());
    }

    #[test]
    fn test_walk_error_under_ignored_path_is_silent() {
        let rules = Rules::default();
        let scanner = Scanner::new(&rules, ScannerConfig::default());
        let mut reporter = CollectingReporter::new();
        let mut state = WalkState::default();
        let hidden = Path::new("/tmp/root/.Trashes/501");

        scanner.visit_error(Path::new("/tmp/root"), &permission_denied_at(hidden), &mut state, &mut reporter);

        assert_eq!(state.summary.errors, 0);
        assert_eq!(reporter.visited(hidden), Some(Visit::IgnoredPath));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_counts_as_one_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), "hello").unwrap();
        let locked = root.join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still read the directory
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let rules = Rules::default();
        let scanner = Scanner::new(&rules, ScannerConfig::default());
        let mut reporter = CollectingReporter::new();
        let report = scanner.scan(root, &mut reporter);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let report = report.unwrap();

        assert_eq!(report.summary.directories, 1);
        assert_eq!(report.summary.files, 1);
        assert_eq!(report.summary.errors, 1);

        let locked = report.root.join("locked");
        let findings = reporter.flagged_findings(&locked).unwrap();
        assert_eq!(findings.count(Severity::Error), 1);
        assert_eq!(reporter.flagged.len(), 1);
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(clean_path(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(clean_path(Path::new("/a/b/..")), PathBuf::from("/a"));
    }

    #[test]
    fn test_resolve_root_removes_parent_segments() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("inner");
        fs::create_dir(&nested).unwrap();

        let resolved = resolve_root(&nested.join("..").join("inner")).unwrap();
        assert_eq!(resolved, clean_path(&std::path::absolute(&nested).unwrap()));
        assert!(!resolved.components().any(|c| c == Component::ParentDir));
    }
}
