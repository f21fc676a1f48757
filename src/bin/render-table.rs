//! CLI tool to stream a SQLite users table into a markdown table.
//!
//! Usage:
//!   render-table --db users.db
//!   render-table --db users.db --mode lines --capacity 16 -o table.md
//!
//! The table goes to stdout unless an output file is given; logs go to
//! stderr and are filtered with `RUST_LOG`.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use template_streaming::{Coordinator, PipelineConfig, SqliteSource, StreamMode};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Decode each field separately
    Records,
    /// Let SQLite join the fields into one string per row
    Lines,
}

impl From<Mode> for StreamMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Records => StreamMode::Records,
            Mode::Lines => StreamMode::Lines,
        }
    }
}

/// Stream rows from a SQLite database into a markdown table.
///
/// Rows are handed from a reader thread to a renderer thread through a
/// bounded channel, so memory use does not grow with the table size.
#[derive(Parser)]
#[command(name = "render-table")]
struct Cli {
    /// SQLite database file
    #[arg(long, default_value = "users.db")]
    db: PathBuf,

    /// Table to read
    #[arg(long, default_value = "users")]
    table: String,

    /// Unit of data passed between reader and renderer
    #[arg(long, value_enum, default_value_t = Mode::Records)]
    mode: Mode,

    /// Rows buffered between reader and renderer (0 = direct handoff)
    #[arg(long, default_value_t = 0)]
    capacity: usize,

    /// Give up after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log row counts and timings on stderr
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

fn open_sink(output: Option<&Path>) -> io::Result<Box<dyn Write + Send>> {
    let Some(path) = output else {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = PipelineConfig::default()
        .with_mode(cli.mode.into())
        .with_capacity(cli.capacity);
    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }

    let mut source = match SqliteSource::open(&cli.db) {
        Ok(source) => source.with_table(&cli.table),
        Err(e) => {
            eprintln!("Error opening database '{}': {e}", cli.db.display());
            process::exit(1);
        }
    };

    let mut sink = match open_sink(cli.output.as_deref()) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Error opening output: {e}");
            process::exit(1);
        }
    };

    match Coordinator::new(config).run(&mut source, &mut sink) {
        Ok(summary) => {
            if cli.verbose {
                eprintln!(
                    "Rendered {} rows in {:?} (peak buffered: {}/{})",
                    summary.rows_rendered,
                    summary.elapsed,
                    summary.channel.high_water,
                    summary.channel.capacity
                );
            }
        }
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            process::exit(1);
        }
    }
}
