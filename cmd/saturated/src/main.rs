//! saturated - batch newline-delimited input into JSON arrays.
//!
//! Every input line is pushed into a batching queue; each flushed batch is
//! printed to stdout as one JSON array per line. Batches are cut when `--max`
//! lines are queued or `--interval` milliseconds pass since the last batch.

mod config;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use saturated::{Batcher, Options};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use parking_lot::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::Overrides;
use output::BatchWriter;

/// Batch newline-delimited input into JSON arrays.
#[derive(Parser, Debug)]
#[command(name = "saturated")]
#[command(about = "Batch newline-delimited input into JSON arrays")]
#[command(version)]
struct Args {
    /// Flush interval in milliseconds (default: 10000)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Maximum lines per batch (default: unbounded)
    #[arg(short, long)]
    max: Option<usize>,

    /// Options file (YAML or JSON); flags override its values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Input file (default: stdin)
    #[arg(short = 'f', long = "file")]
    input: Option<PathBuf>,

    /// Do not print empty batches from idle intervals
    #[arg(long)]
    skip_empty: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging (stderr, so stdout stays pure JSON)
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = config::resolve(
        args.config.as_deref(),
        Overrides {
            interval_ms: args.interval,
            max: args.max,
        },
    )?;
    let writer = Arc::new(BatchWriter::new(std::io::stdout(), args.skip_empty));

    let count = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            pipe(BufReader::new(file), writer, options).await?
        }
        None => pipe(BufReader::new(tokio::io::stdin()), writer, options).await?,
    };

    debug!("Processed {} lines", count);
    Ok(())
}

/// Push every line of `input` through a batcher writing to `writer`.
///
/// At end of input the queue is drained in batches of at most `max` lines
/// before the batcher is ended. The first write error (such as a closed stdout)
/// stops reading and is returned. Returns the number of lines read.
async fn pipe<R, W>(input: R, writer: Arc<BatchWriter<W>>, options: Options) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: std::io::Write + Send + 'static,
{
    let failed: Arc<Mutex<Option<anyhow::Error>>> = Arc::new(Mutex::new(None));

    let batcher = {
        let failed = Arc::clone(&failed);
        Batcher::new(
            move |batch: Vec<String>| {
                let mut failed = failed.lock();
                if failed.is_some() {
                    return;
                }
                if let Err(e) = writer.write_batch(&batch) {
                    debug!("Failed to write batch of {} lines: {}", batch.len(), e);
                    *failed = Some(e);
                }
            },
            options,
        )?
    };

    let mut count = 0;
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        batcher.push(line);
        count += 1;
        if failed.lock().is_some() {
            break;
        }
    }

    while failed.lock().is_none() && !batcher.is_empty() {
        batcher.flush();
    }
    batcher.end(false);

    if let Some(e) = failed.lock().take() {
        return Err(e.context("failed to write output"));
    }
    Ok(count)
}
