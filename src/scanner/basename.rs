//! Name legality and extension checks

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use super::external::{ContentProbe, is_plain_text};
use super::rules::Rules;
use super::types::Findings;

lazy_static! {
    // π shows up in old RealBasic and GoLive project files
    static ref VALID_EXTENSION: Regex = Regex::new(r"^\.[a-z0-9π\-]+$").unwrap();
}

pub const MISSING_EXTENSION: &str = "Missing file extension.";

/// Lower-cased extension of `name` including the dot, or "" when it has no valid one
pub fn strict_extension(name: &str) -> String {
    let raw = name.rfind('.').map(|dot| &name[dot..]).unwrap_or("");
    let lowered = raw.to_lowercase();
    if VALID_EXTENSION.is_match(&lowered) {
        lowered
    } else {
        String::new()
    }
}

/// Strict extension of the last component of `path`
pub fn path_extension(path: &Path) -> String {
    path.file_name()
        .map(|name| strict_extension(&name.to_string_lossy()))
        .unwrap_or_default()
}

/// Checks names against the legacy filesystem hazards
pub struct BasenameValidator<'a> {
    rules: &'a Rules,
    text_probe: Option<&'a dyn ContentProbe>,
}

impl<'a> BasenameValidator<'a> {
    pub fn new(rules: &'a Rules) -> Self {
        Self {
            rules,
            text_probe: None,
        }
    }

    /// Accept extensionless files the probe describes as plain text
    pub fn with_text_fallback(mut self, probe: &'a dyn ContentProbe) -> Self {
        self.text_probe = Some(probe);
        self
    }

    /// Validate `basename` of the entry at `path`
    pub fn check(&self, path: &Path, basename: &str, is_file: bool) -> Findings {
        let mut findings = Findings::new();

        for illegal in self.rules.illegal_chars {
            if basename.contains(*illegal) {
                findings.warn(format!("Name contains illegal character '{illegal}'."));
            }
        }

        if let Some(last) = basename.chars().last() {
            if self.rules.illegal_trailing_chars.contains(&last) {
                findings.warn(format!("Name ends with illegal character '{last}'."));
            }
        }

        if is_file && strict_extension(basename).is_empty() {
            self.check_missing_extension(path, basename, &mut findings);
        }

        findings
    }

    fn check_missing_extension(&self, path: &Path, basename: &str, findings: &mut Findings) {
        if self.rules.is_allowed_without_extension(basename) {
            return;
        }

        if let Some(probe) = self.text_probe {
            match probe.describe(path) {
                Ok(description) if is_plain_text(&description) => return,
                Ok(description) => {
                    tracing::trace!("{} is {}", path.display(), description.trim_end());
                }
                Err(e) => findings.error(format!("Content probe failed: {e:#}")),
            }
        }

        findings.warn(MISSING_EXTENSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::types::Severity;
    use anyhow::{Result, anyhow};

    struct FixedProbe(&'static str);

    impl ContentProbe for FixedProbe {
        fn describe(&self, _path: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenProbe;

    impl ContentProbe for BrokenProbe {
        fn describe(&self, _path: &Path) -> Result<String> {
            Err(anyhow!("file: command not found"))
        }
    }

    fn warnings(findings: &Findings) -> Vec<&str> {
        findings.messages(Severity::Warn)
    }

    #[test]
    fn test_strict_extension() {
        assert_eq!(strict_extension("a.txt"), ".txt");
        assert_eq!(strict_extension("Photo.JPG"), ".jpg");
        assert_eq!(strict_extension("archive.tar.gz"), ".gz");
        assert_eq!(strict_extension("Project.π"), ".π");
        assert_eq!(strict_extension("movie.mp-4"), ".mp-4");
        assert_eq!(strict_extension(".bashrc"), ".bashrc");
        assert_eq!(strict_extension("README"), "");
        assert_eq!(strict_extension("README.txt."), "");
        assert_eq!(strict_extension("notes.t x t"), "");
        assert_eq!(strict_extension("Letter.doc_old"), "");
    }

    #[test]
    fn test_illegal_characters_once_each() {
        let rules = Rules::default();
        let validator = BasenameValidator::new(&rules);
        let findings = validator.check(Path::new("x"), "a:b:c/d\\e/f.txt", true);
        assert_eq!(
            warnings(&findings),
            vec![
                "Name contains illegal character ':'.",
                "Name contains illegal character '/'.",
                "Name contains illegal character '\\'."
            ]
        );
    }

    #[test]
    fn test_trailing_characters() {
        let rules = Rules::default();
        let validator = BasenameValidator::new(&rules);

        let findings = validator.check(Path::new("x"), "Folder ", false);
        assert_eq!(warnings(&findings), vec!["Name ends with illegal character ' '."]);

        let findings = validator.check(Path::new("x"), "Folder.", false);
        assert_eq!(warnings(&findings), vec!["Name ends with illegal character '.'."]);
    }

    #[test]
    fn test_allow_listed_names() {
        let rules = Rules::default();
        let validator = BasenameValidator::new(&rules);
        assert!(validator.check(Path::new("README"), "README", true).is_empty());
        assert!(validator.check(Path::new("Desktop DB"), "Desktop DB", true).is_empty());
        assert_eq!(
            warnings(&validator.check(Path::new("readme"), "readme", true)),
            vec![MISSING_EXTENSION]
        );
    }

    #[test]
    fn test_trailing_period_also_misses_extension() {
        let rules = Rules::default();
        let validator = BasenameValidator::new(&rules);
        let findings = validator.check(Path::new("README.txt."), "README.txt.", true);
        assert_eq!(
            warnings(&findings),
            vec!["Name ends with illegal character '.'.", MISSING_EXTENSION]
        );
    }

    #[test]
    fn test_directories_need_no_extension() {
        let rules = Rules::default();
        let validator = BasenameValidator::new(&rules);
        assert!(validator.check(Path::new("Documents"), "Documents", false).is_empty());
    }

    #[test]
    fn test_text_fallback() {
        let rules = Rules::default();

        let text = FixedProbe("ASCII text\n");
        let validator = BasenameValidator::new(&rules).with_text_fallback(&text);
        assert!(validator.check(Path::new("notes"), "notes", true).is_empty());

        let binary = FixedProbe("data\n");
        let validator = BasenameValidator::new(&rules).with_text_fallback(&binary);
        assert_eq!(
            warnings(&validator.check(Path::new("notes"), "notes", true)),
            vec![MISSING_EXTENSION]
        );
    }

    #[test]
    fn test_probe_failure_is_recorded() {
        let rules = Rules::default();
        let validator = BasenameValidator::new(&rules).with_text_fallback(&BrokenProbe);
        let findings = validator.check(Path::new("notes"), "notes", true);
        assert_eq!(findings.count(Severity::Error), 1);
        assert_eq!(warnings(&findings), vec![MISSING_EXTENSION]);
    }
}
