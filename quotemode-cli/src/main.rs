//! quotemode CLI - batch host for the quote-mode treatment
//!
//! Reads the rules and the document, runs the treatment, and writes the
//! result to stdout, a file, or back over the input. All treatment
//! failures surface as error notifications on stderr and a non-zero exit.

mod io;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use quotemode_core::{Outcome, PathQuery, Treatment};

/// Apply citation markup rules to an XML document
#[derive(Parser, Debug)]
#[command(name = "quotemode")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path or http(s) URL of the XML document to treat
    input: String,

    /// Path to the JSON rules file
    #[arg(long)]
    rules: PathBuf,

    /// Write the treated document to this file instead of stdout
    #[arg(short, long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Rewrite the input file in place (file inputs only)
    #[arg(long)]
    in_place: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let rule_source = io::FileRuleSource::new(cli.rules);
    let store = io::CliDocumentStore::from_args(&cli.input, cli.output.as_deref(), cli.in_place)?;
    let notifier = io::TerminalNotifier;

    let outcome = Treatment::new(&rule_source, &store, &notifier, &PathQuery).run();
    if outcome == Outcome::Failed {
        std::process::exit(1);
    }
    Ok(())
}
