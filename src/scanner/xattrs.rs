//! Extended attribute access and filtering

use std::io;
use std::path::Path;

use super::rules::Rules;

/// Read access to the extended attributes of a filesystem entry
pub trait AttributeStore {
    /// Names of every attribute on `path`
    fn list(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Raw value of one attribute, `None` when it is not set
    fn get(&self, path: &Path, name: &str) -> io::Result<Option<Vec<u8>>>;
}

/// Attributes read from the real filesystem through the `xattr` crate
///
/// Symlinks are not followed, so a link's attributes are its own. Volumes
/// without attribute support read as having none.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAttributes;

impl AttributeStore for SystemAttributes {
    fn list(&self, path: &Path) -> io::Result<Vec<String>> {
        match xattr::list(path) {
            Ok(names) => Ok(names
                .map(|name| name.to_string_lossy().into_owned())
                .collect()),
            Err(err) if err.kind() == io::ErrorKind::Unsupported => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    fn get(&self, path: &Path, name: &str) -> io::Result<Option<Vec<u8>>> {
        match xattr::get(path, name) {
            Err(err) if err.kind() == io::ErrorKind::Unsupported => Ok(None),
            other => other,
        }
    }
}

/// Drop attributes the rules mark as harmless, preserving order
pub fn filter_attributes(rules: &Rules, attributes: Vec<String>) -> Vec<String> {
    attributes
        .into_iter()
        .filter(|name| !rules.is_ignored_attribute(name))
        .collect()
}
