use anyhow::Result;
use clap::Parser;

use forkscan::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
