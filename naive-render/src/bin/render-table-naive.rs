//! CLI tool to render a SQLite users table after loading it into memory.
//!
//! Usage:
//!   render-table-naive --db users.db
//!   render-table-naive --db users.db -o table.md -v
//!
//! Produces the same markdown as `render-table`, but holds every row in
//! memory before writing the first one.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use naive_render::render_buffered;
use template_streaming::{RowTemplate, SqliteSource};
use tracing_subscriber::EnvFilter;

/// Load every row of a SQLite table, then render it as a markdown table.
#[derive(Parser)]
#[command(name = "render-table-naive")]
struct Cli {
    /// SQLite database file
    #[arg(long, default_value = "users.db")]
    db: PathBuf,

    /// Table to read
    #[arg(long, default_value = "users")]
    table: String,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report row count and materialized size on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut source = match SqliteSource::open(&cli.db) {
        Ok(source) => source.with_table(&cli.table),
        Err(e) => {
            eprintln!("Error opening database '{}': {e}", cli.db.display());
            process::exit(1);
        }
    };

    let mut sink: Box<dyn Write> = match &cli.output {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(e) => {
                eprintln!("Error creating '{}': {e}", path.display());
                process::exit(1);
            }
        },
        None => Box::new(BufWriter::new(io::stdout())),
    };

    match render_buffered(&mut source, &RowTemplate::markdown(), &mut sink) {
        Ok(summary) => {
            if cli.verbose {
                eprintln!(
                    "Rendered {} rows (materialized: {} bytes)",
                    summary.rows, summary.materialized_bytes
                );
            }
        }
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            process::exit(1);
        }
    }
}
