//! External tools used during classification
//!
//! Both tools sit behind narrow traits so the classification logic can be
//! exercised without `DeRez` or `file` installed.

use anyhow::{Context, Result, bail};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

lazy_static! {
    static ref RESOURCE_TYPE_DECLARATION: Regex = Regex::new(r"(?m)^data '(.{4})'").unwrap();
    static ref PLAIN_TEXT_DESCRIPTION: Regex =
        Regex::new(r"\b((ASCII|Unicode|ISO-8859) text|very short file)\b").unwrap();
}

/// Enumerates the resource type codes stored in a file's resource fork
pub trait ResourceDisassembler {
    /// Distinct four character type codes, sorted
    fn resource_types(&self, path: &Path) -> Result<Vec<String>>;
}

/// Gives a coarse, human readable description of a file's content
pub trait ContentProbe {
    fn describe(&self, path: &Path) -> Result<String>;
}

/// `DeRez` from the Xcode command line tools
#[derive(Debug, Clone)]
pub struct DeRez {
    program: String,
}

impl Default for DeRez {
    fn default() -> Self {
        Self {
            program: "DeRez".to_string(),
        }
    }
}

impl DeRez {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ResourceDisassembler for DeRez {
    fn resource_types(&self, path: &Path) -> Result<Vec<String>> {
        let stdout = run_tool(&self.program, &[], path)?;
        Ok(parse_resource_types(&stdout))
    }
}

/// The `file` utility in brief mode
#[derive(Debug, Clone)]
pub struct FileCommand {
    program: String,
}

impl Default for FileCommand {
    fn default() -> Self {
        Self {
            program: "file".to_string(),
        }
    }
}

impl FileCommand {
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ContentProbe for FileCommand {
    fn describe(&self, path: &Path) -> Result<String> {
        run_tool(&self.program, &["-b"], path)
    }
}

fn run_tool(program: &str, args: &[&str], path: &Path) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .arg(path)
        .output()
        .with_context(|| format!("Failed to run {program}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{program} exited with {}: {}", output.status, stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Pull the distinct resource type codes out of `DeRez` output
pub fn parse_resource_types(output: &str) -> Vec<String> {
    RESOURCE_TYPE_DECLARATION
        .captures_iter(output)
        .map(|caps| caps[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Whether a `file -b` description denotes empty or plain text content
pub fn is_plain_text(description: &str) -> bool {
    let description = description.trim_end_matches('\n');
    description == "empty" || PLAIN_TEXT_DESCRIPTION.is_match(description)
}

/// Warn once if a tool the scan may need is not on PATH
pub fn check_tool_available(program: &str, purpose: &str) -> bool {
    match which::which(program) {
        Ok(path) => {
            tracing::debug!("Using {} at {}", program, path.display());
            true
        }
        Err(_) => {
            tracing::warn!("{} not found in PATH; {} will be reported as errors", program, purpose);
            false
        }
    }
}
