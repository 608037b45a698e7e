use super::basename::path_extension;
use super::external::ResourceDisassembler;
use super::rules::RESOURCE_FORK_ATTR;
use super::types::{Findings, ResourceForkReport, ScanEntry};
use super::xattrs::AttributeStore;

/// Classifies entries whose attributes include a resource fork
pub struct ResourceForkInspector<'a> {
    attributes: &'a dyn AttributeStore,
    disassembler: &'a dyn ResourceDisassembler,
}

impl<'a> ResourceForkInspector<'a> {
    pub fn new(attributes: &'a dyn AttributeStore, disassembler: &'a dyn ResourceDisassembler) -> Self {
        Self {
            attributes,
            disassembler,
        }
    }

    /// Inspect `entry` if `attributes` names a resource fork, recording its types in `report`
    ///
    /// Forks the disassembler finds no resources in contribute nothing to the report.
    pub fn inspect(
        &self,
        entry: &ScanEntry,
        attributes: &[String],
        report: &mut ResourceForkReport,
    ) -> Findings {
        let mut findings = Findings::new();
        if !attributes.iter().any(|name| name == RESOURCE_FORK_ATTR) {
            return findings;
        }

        let fork_len = match self.attributes.get(&entry.path, RESOURCE_FORK_ATTR) {
            Ok(fork) => fork.map_or(0, |bytes| bytes.len()),
            Err(e) => {
                findings.error(format!("Failed to read resource fork: {e}"));
                0
            }
        };

        let types = match self.disassembler.resource_types(&entry.path) {
            Ok(types) => types,
            Err(e) => {
                findings.error(format!("Failed to list resource types: {e:#}"));
                return findings;
            }
        };

        if types.is_empty() {
            tracing::trace!("{} has a resource fork without resources", entry.path.display());
            return findings;
        }

        report.record(&path_extension(&entry.path), types);

        if entry.size == 0 && fork_len > 0 {
            findings.warn(format!(
                "Data fork is empty; resource fork may contain all data ({fork_len} bytes)."
            ));
        }

        findings
    }
}
