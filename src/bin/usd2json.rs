//! Converts a usda file to JSON.
//!
//! # Usage:
//! ```bash
//! usd2json scene.usda scene.json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use usd2json::{Converter, Options};

#[derive(Parser, Debug)]
#[command(version, about = "Convert USDA scene description to JSON")]
struct Args {
    /// Path to the usda file
    input: PathBuf,

    /// Where to write JSON output
    output: PathBuf,

    /// Spaces per indentation level
    #[arg(long, default_value_t = 1)]
    indent: usize,

    /// Keep one array element per line
    #[arg(long)]
    no_compact: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    let converter = Converter::new(Options {
        indent: args.indent,
        compact: !args.no_compact,
    })?;

    log::debug!("Converting with {:?}", converter.options());

    converter.convert_file(&args.input, &args.output)
}
