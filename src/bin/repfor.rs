//! CLI and JSON-RPC server for repfor.

use anyhow::{Context, Result};
use clap::Parser;
use repfor::prelude::*;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_ERROR: u8 = 1;
const EXIT_NO_CHANGES: u8 = 2;

#[derive(Parser)]
#[command(name = "repfor")]
#[command(author, version, about = "Exact-string search and replace across files", long_about = None)]
struct Cli {
    /// Run once from the command line instead of serving JSON-RPC on stdin
    #[arg(long)]
    cli: bool,

    /// Comma-separated directories to scan (defaults to the current directory)
    #[arg(long, value_name = "DIRS")]
    dir: Option<String>,

    /// Comma-separated files to process (takes precedence over --dir)
    #[arg(long, value_name = "FILES")]
    file: Option<String>,

    /// Text to search for (required)
    #[arg(long, allow_hyphen_values = true)]
    search: Option<String>,

    /// Replacement text (required, may be empty to delete matches)
    #[arg(long, allow_hyphen_values = true)]
    replace: Option<String>,

    /// Only process files ending with this suffix (e.g. ".go")
    #[arg(long)]
    ext: Option<String>,

    /// Comma-separated strings; lines containing any of them are left alone
    #[arg(long, allow_hyphen_values = true)]
    exclude: Option<String>,

    /// Ignore case when matching
    #[arg(long)]
    case_insensitive: bool,

    /// Match whole words only
    #[arg(long)]
    whole_word: bool,

    /// Preview changes without modifying files
    #[arg(long)]
    dry_run: bool,

    /// Also scan subdirectories
    #[arg(long)]
    recursive: bool,

    /// Include a unified diff for each modified file
    #[arg(long)]
    diff: bool,

    /// Log each modified file to stderr
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = if cli.cli {
        cmd_replace(&cli)
    } else {
        cmd_serve().map(|()| ExitCode::SUCCESS)
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("repfor=info")
        } else {
            EnvFilter::new("repfor=warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn cmd_replace(cli: &Cli) -> Result<ExitCode> {
    let search = cli
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .context("--search is required")?;
    let replace = cli
        .replace
        .as_deref()
        .context("--replace is required (use an empty string to delete matches)")?;

    let request = ReplaceRequest::new(search, replace)
        .files(split_list(cli.file.as_deref()))
        .directories(split_list(cli.dir.as_deref()))
        .extension(cli.ext.clone().unwrap_or_default())
        .exclude(split_list(cli.exclude.as_deref()))
        .case_insensitive(cli.case_insensitive)
        .whole_word(cli.whole_word)
        .dry_run(cli.dry_run)
        .recursive(cli.recursive)
        .diff(cli.diff);

    let result = request.apply()?;
    println!(
        "{}",
        serde_json::to_string(&result).context("Failed to serialize result")?
    );

    Ok(match result.outcome() {
        Outcome::Changed => ExitCode::SUCCESS,
        Outcome::NoMatches => ExitCode::from(EXIT_NO_CHANGES),
    })
}

fn cmd_serve() -> Result<()> {
    let mut server = Server::new(io::stdin().lock(), io::stdout().lock());
    server.run().context("JSON-RPC server failed")
}

/// Splits a comma-separated flag value, trimming each item.
fn split_list(value: Option<&str>) -> Vec<String> {
    match value {
        Some(value) if !value.is_empty() => {
            value.split(',').map(|item| item.trim().to_string()).collect()
        }
        _ => Vec::new(),
    }
}
