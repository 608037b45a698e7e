use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::basename::path_extension;
use super::rules::RESOURCE_FORK_ATTR;
use super::types::{Findings, StripConfig};
use super::xattrs::AttributeStore;

/// Prefix of the directory created for stripped copies
pub const STRIP_DIR_PREFIX: &str = "stripped_files";

/// Create a fresh, persistent directory for stripped copies
///
/// Lives under the home directory when one is known, otherwise under the system temp dir.
pub fn create_strip_destination() -> Result<PathBuf> {
    let parent = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    let dir = tempfile::Builder::new()
        .prefix(STRIP_DIR_PREFIX)
        .tempdir_in(&parent)
        .with_context(|| format!("Failed to create strip destination in {}", parent.display()))?;
    Ok(dir.keep())
}

/// Destination for a stripped copy: the source path flattened into one file name
pub fn flattened_destination(destination: &Path, source: &Path) -> PathBuf {
    let flat = source.to_string_lossy().replace('/', "__");
    destination.join(flat)
}

/// Copies the data fork of resource-fork-bearing files out of the scanned tree
pub struct StrippedCopyWriter<'a> {
    attributes: &'a dyn AttributeStore,
    config: &'a StripConfig,
}

impl<'a> StrippedCopyWriter<'a> {
    pub fn new(attributes: &'a dyn AttributeStore, config: &'a StripConfig) -> Self {
        Self { attributes, config }
    }

    /// Copy `path` if it carries a non-empty resource fork; returns the number of copies made
    pub fn copy(&self, path: &Path, attributes: &[String], findings: &mut Findings) -> usize {
        if self.config.skip_extensions.contains(&path_extension(path)) {
            return 0;
        }

        if !attributes.iter().any(|name| name == RESOURCE_FORK_ATTR) {
            return 0;
        }

        match self.attributes.get(path, RESOURCE_FORK_ATTR) {
            Ok(Some(fork)) if !fork.is_empty() => {}
            _ => return 0,
        }

        let dest = flattened_destination(&self.config.destination, path);
        match copy_data_fork(path, &dest) {
            Ok(()) => {
                findings.info(format!("Copied data-only version to {}", dest.display()));
                1
            }
            Err(e) => {
                findings.error(format!("{e:#}"));
                0
            }
        }
    }
}

fn copy_data_fork(source: &Path, dest: &Path) -> Result<()> {
    let data = fs::read(source)
        .with_context(|| format!("Failed to read data fork of {}", source.display()))?;
    fs::write(dest, data).with_context(|| format!("Failed to write {}", dest.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::types::{Severity, parse_skip_list};
    use std::io;
    use tempfile::TempDir;

    struct Fork(Vec<u8>);

    impl AttributeStore for Fork {
        fn list(&self, _path: &Path) -> io::Result<Vec<String>> {
            Ok(vec![RESOURCE_FORK_ATTR.to_string()])
        }

        fn get(&self, _path: &Path, _name: &str) -> io::Result<Option<Vec<u8>>> {
            Ok(Some(self.0.clone()))
        }
    }

    fn fork_attrs() -> Vec<String> {
        vec![RESOURCE_FORK_ATTR.to_string()]
    }

    #[test]
    fn test_flattened_destination() {
        let dest = flattened_destination(Path::new("/home/me/stripped_files1"), Path::new("/tmp/root/a/b.doc"));
        assert_eq!(dest, PathBuf::from("/home/me/stripped_files1/__tmp__root__a__b.doc"));
    }

    #[test]
    fn test_copies_data_fork_only() {
        let tree = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let source = tree.path().join("letter.doc");
        fs::write(&source, b"visible content").unwrap();

        let config = StripConfig {
            destination: out.path().to_path_buf(),
            skip_extensions: parse_skip_list("png,jpg"),
        };
        let store = Fork(vec![9; 64]);
        let writer = StrippedCopyWriter::new(&store, &config);
        let mut findings = Findings::new();

        assert_eq!(writer.copy(&source, &fork_attrs(), &mut findings), 1);

        let dest = flattened_destination(out.path(), &source);
        assert_eq!(fs::read(&dest).unwrap(), b"visible content");
        assert_eq!(findings.count(Severity::Info), 1);
    }

    #[test]
    fn test_skipped_extension() {
        let tree = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let source = tree.path().join("photo.PNG");
        fs::write(&source, b"png").unwrap();

        let config = StripConfig {
            destination: out.path().to_path_buf(),
            skip_extensions: parse_skip_list("png,jpg"),
        };
        let store = Fork(vec![9; 64]);
        let writer = StrippedCopyWriter::new(&store, &config);
        let mut findings = Findings::new();

        assert_eq!(writer.copy(&source, &fork_attrs(), &mut findings), 0);
        assert!(findings.is_empty());
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_fork_not_copied() {
        let tree = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let source = tree.path().join("letter.doc");
        fs::write(&source, b"x").unwrap();

        let config = StripConfig {
            destination: out.path().to_path_buf(),
            skip_extensions: Default::default(),
        };
        let store = Fork(Vec::new());
        let writer = StrippedCopyWriter::new(&store, &config);
        let mut findings = Findings::new();

        assert_eq!(writer.copy(&source, &fork_attrs(), &mut findings), 0);
        assert_eq!(writer.copy(&source, &[], &mut findings), 0);
    }

    #[test]
    fn test_write_failure_is_a_finding() {
        let tree = TempDir::new().unwrap();
        let source = tree.path().join("letter.doc");
        fs::write(&source, b"x").unwrap();

        let config = StripConfig {
            destination: tree.path().join("does-not-exist"),
            skip_extensions: Default::default(),
        };
        let store = Fork(vec![1]);
        let writer = StrippedCopyWriter::new(&store, &config);
        let mut findings = Findings::new();

        assert_eq!(writer.copy(&source, &fork_attrs(), &mut findings), 0);
        assert_eq!(findings.count(Severity::Error), 1);
    }
}
