use anyhow::Result;
use console::{StyledObject, style};
use std::path::Path;

use super::progress::StatusLine;
use super::{Reporter, Visit};
use crate::scanner::rules::Rules;
use crate::scanner::types::{ExtensionForks, Finding, Findings, ScanReport, Severity};

/// Streams findings to stdout in the classic indented layout
pub struct TextReporter {
    status: StatusLine,
    debug: bool,
}

impl TextReporter {
    pub fn new(status: StatusLine, debug: bool) -> Self {
        Self { status, debug }
    }

    fn print_findings(&self, findings: &Findings) {
        for finding in findings.in_report_order() {
            println!("{}", finding_line(finding));
        }
    }
}

fn severity_tag(severity: Severity) -> StyledObject<String> {
    let tag = format!("[{}]", severity.tag());
    match severity {
        Severity::Error => style(tag).red().bold(),
        Severity::Warn => style(tag).yellow(),
        Severity::Info => style(tag).dim(),
    }
}

fn finding_line(finding: &Finding) -> String {
    format!("    {} {}", severity_tag(finding.severity), finding.message)
}

/// One summary row: `    .ext: count ('T1', 'T2')   annotation`
pub fn resource_fork_row(extension: &str, forks: &ExtensionForks, annotation: Option<&str>) -> String {
    let types = forks
        .types
        .iter()
        .map(|code| format!("'{code}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "    {}: {} ({})   {}",
        extension,
        forks.count,
        types,
        annotation.unwrap_or("")
    )
    .trim_end()
    .to_string()
}

impl Reporter for TextReporter {
    fn begin(&mut self, root: &Path) {
        println!("Scanning {}", root.display());
    }

    fn visit(&mut self, position: usize, path: &Path, visit: Visit) {
        if self.debug {
            eprintln!("Scanning {}", path.display());
        }
        match visit {
            Visit::Classified => self.status.update(&format!("{}: {}", position, path.display())),
            Visit::IgnoredFile => self.status.update(&format!("{position}: (ignored file)")),
            Visit::IgnoredPath => self.status.update(&format!("{position}: (ignored path)")),
            Visit::Skipped | Visit::Failed => {}
        }
    }

    fn flagged(&mut self, path: &Path, findings: &Findings) {
        self.status.clear();
        println!("{}", path.display());
        self.print_findings(findings);
    }

    fn debug_entry(&mut self, path: &Path, findings: &Findings) {
        self.status.clear();
        eprintln!("{} {}", style("[DEBUG]").dim(), path.display());
        self.print_findings(findings);
    }

    fn finish(&mut self, report: &ScanReport, rules: &Rules) -> Result<()> {
        self.status.clear();

        let summary = &report.summary;
        println!(
            "\nScanned {} directories and {} files. {} scan errors.",
            summary.directories, summary.files, summary.errors
        );

        if !report.resource_forks.is_empty() {
            println!("\n{}", style("Types with resource forks (lowercased):").bold());
            for (extension, forks) in report.resource_forks.iter() {
                let annotation = rules.resource_fork_risk(extension);
                println!("{}", resource_fork_row(extension, forks, annotation));
            }
        }

        if let Some(stripped_to) = &report.stripped_to {
            println!(
                "\nStripped resource forks from {} files in {} for analysis.",
                summary.stripped_files,
                stripped_to.display()
            );
        }

        if !report.extensions.is_empty() {
            println!("\n{}", style("File extensions encountered (lowercased):").bold());
            println!("{}", report.extensions.joined());
        }

        Ok(())
    }
}
