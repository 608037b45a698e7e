//! Command-line interface for forkscan
//!
//! Flags keep the camelCase spellings of the classic scanner so existing
//! scripts continue to work.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::reports::{JsonReporter, OutputFormat, Reporter, StatusLine, TextReporter};
use crate::scanner::external::check_tool_available;
use crate::scanner::{
    DeRez, FileCommand, Rules, Scanner, ScannerConfig, StripConfig, create_strip_destination,
    resolve_root,
};

/// Audit a directory tree for legacy Mac filesystem hazards
#[derive(Parser, Debug)]
#[command(name = "forkscan", author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Output extra debugging info
    #[arg(long)]
    pub debug: bool,

    /// Make a data-only copy of files with resource forks for manual analysis
    #[arg(long = "stripResourceForks")]
    pub strip_resource_forks: bool,

    /// Comma-separated list of file extensions to exclude from stripping, e.g. 'crw,jpg'
    #[arg(long = "stripResourceSkip", value_name = "EXTENSIONS", default_value = "")]
    pub strip_resource_skip: String,

    /// Warn on files modified more than one day after they were created
    #[arg(long = "warnOnCreationTimes")]
    pub warn_on_creation_times: bool,

    /// Allow plain text files without a file extension
    #[arg(long = "allowTextMissingExtension")]
    pub allow_text_missing_extension: bool,

    /// Increase log verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the status line and log output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Do not draw the status line
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let root = match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let root = resolve_root(&root)?;

        let config = self.scanner_config()?;
        if self.debug {
            print_debug_preamble(&root, &config);
        }

        if cfg!(target_os = "macos") {
            check_tool_available(DeRez::default().program(), "resource fork inspection");
        }
        if config.allow_text_missing_extension {
            check_tool_available(FileCommand::default().program(), "plain text detection");
        }

        let rules = Rules::default();
        let scanner = Scanner::new(&rules, config);

        let mut reporter: Box<dyn Reporter> = match self.format {
            OutputFormat::Text => {
                let show_status = !self.quiet && !self.no_progress;
                Box::new(TextReporter::new(StatusLine::stderr(show_status), self.debug))
            }
            OutputFormat::Json => Box::new(JsonReporter::new(self.debug)),
        };

        scanner.scan(&root, reporter.as_mut())?;
        Ok(())
    }

    /// Fold the flags into scanner configuration, creating the strip destination if asked
    fn scanner_config(&self) -> Result<ScannerConfig> {
        let strip = if self.strip_resource_forks {
            let destination = create_strip_destination()?;
            Some(StripConfig::new(destination, &self.strip_resource_skip))
        } else {
            None
        };

        Ok(ScannerConfig {
            debug: self.debug,
            warn_on_creation_times: self.warn_on_creation_times,
            allow_text_missing_extension: self.allow_text_missing_extension,
            strip,
        })
    }
}

fn print_debug_preamble(root: &std::path::Path, config: &ScannerConfig) {
    eprintln!("Scanning {}", root.display());
    if let Some(strip) = &config.strip {
        eprintln!("Copying data forks to {} for analysis", strip.destination.display());
        if !strip.skip_extensions.is_empty() {
            let skipped: Vec<&str> = strip.skip_extensions.iter().map(String::as_str).collect();
            eprintln!("Ignoring extensions: {}", skipped.join(", "));
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
