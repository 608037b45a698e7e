pub mod basename;
pub mod core;
pub mod external;
pub mod resource_fork;
pub mod rules;
pub mod strip;
pub mod types;
pub mod xattrs;

// Re-export main types for easier access
pub use basename::{BasenameValidator, strict_extension};
pub use self::core::{Scanner, creation_time_warning, resolve_root};
pub use external::{ContentProbe, DeRez, FileCommand, ResourceDisassembler};
pub use resource_fork::ResourceForkInspector;
pub use rules::{RESOURCE_FORK_ATTR, Rules};
pub use strip::{StrippedCopyWriter, create_strip_destination};
pub use types::{
    EntryKind, ExtensionCatalog, Finding, Findings, ResourceForkReport, ScanEntry, ScanReport,
    ScanSummary, ScannerConfig, Severity, StripConfig,
};
pub use xattrs::{AttributeStore, SystemAttributes, filter_attributes};
