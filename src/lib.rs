//! # forkscan - find what a legacy Mac file hierarchy will lose in migration
//!
//! Walks a directory tree and reports, per file, the hazards that tend to
//! silently destroy data when old Macintosh volumes are copied to a modern
//! filesystem:
//!
//! - **Names**: illegal characters (`:`, `/`, `\`), trailing periods or spaces,
//!   and files with no usable extension
//! - **Extended attributes**: anything beyond the well-known harmless metadata
//! - **Resource forks**: which resource types each extension carries, and
//!   files whose data fork is empty so the fork holds everything
//!
//! ## Quick Start
//!
//! ```bash
//! forkscan /Volumes/OldDisk
//! forkscan --stripResourceForks --stripResourceSkip=jpg,png ~/Archive
//! ```

pub mod cli;
pub mod reports;
pub mod scanner;

pub use cli::Cli;
pub use scanner::{Rules, Scanner, ScannerConfig};

/// Result type alias for forkscan operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
