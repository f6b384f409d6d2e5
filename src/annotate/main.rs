//! Record annotation pipeline.
//!
//! Reads newline-delimited JSON records, looks up their admin hierarchy
//! (with optional postal cities) and writes the enriched records to stdout.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use admin_lookup::config::Config;
use admin_lookup::models::Record;
use admin_lookup::{AdminLookup, PostalCityTable, RemoteResolver};

#[derive(Parser, Debug)]
#[command(name = "annotate")]
#[command(about = "Attach admin hierarchies and postal cities to NDJSON place records")]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input NDJSON file (defaults to stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// PIP service URL
    #[arg(long)]
    resolver_url: Option<String>,

    /// Postal cities table (TSV, optionally gzipped)
    #[arg(long)]
    postal_cities_file: Option<PathBuf>,

    /// Augment hierarchies with postal cities
    #[arg(long)]
    use_postal_cities: bool,

    /// Records looked up concurrently
    #[arg(long)]
    concurrency: Option<usize>,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)?,
            None => Config::default(),
        };

        if let Some(url) = &self.resolver_url {
            config.resolver.url = url.clone();
        }
        if let Some(file) = &self.postal_cities_file {
            config.postal_cities.file = Some(file.clone());
        }
        if self.use_postal_cities {
            config.postal_cities.enabled = true;
        }
        if let Some(concurrency) = self.concurrency {
            config.pipeline.concurrency = concurrency;
        }

        if config.postal_cities.enabled && config.postal_cities.file.is_none() {
            anyhow::bail!("Postal cities enabled but no postal cities file configured");
        }

        Ok(config)
    }
}

/// Stream of lines from an async reader. Ends after the first read error.
fn lines_stream<R: AsyncBufRead + Unpin>(
    reader: R,
) -> impl Stream<Item = std::io::Result<String>> {
    futures::stream::unfold(Some(reader.lines()), |lines| async move {
        let mut lines = lines?;
        match lines.next_line().await {
            Ok(Some(line)) => Some((Ok(line), Some(lines))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// Colour log output only when it goes to a terminal
fn use_ansi<W: IsTerminal>(writer: &W) -> bool {
    writer.is_terminal()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries records
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi(&std::io::stderr()))
        .init();

    let args = Args::parse();
    let config = args.config()?;

    info!("Admin Lookup Annotate");
    info!("PIP service: {}", config.resolver.url);

    let resolver = Arc::new(
        RemoteResolver::new(&config.resolver.url).context("Failed to create PIP client")?,
    );

    let table = match (&config.postal_cities.file, config.postal_cities.enabled) {
        (Some(path), true) => Some(Arc::new(PostalCityTable::load(path)?)),
        _ => None,
    };

    let lookup = AdminLookup::from_config(resolver, &config, table);
    info!("Requesting layers: {:?}", lookup.layers());

    let input: Box<dyn tokio::io::AsyncRead + Unpin + Send> = match &args.input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input file: {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template(
        "{spinner:.green} [{elapsed_precise}] {pos} records ({per_sec})",
    )?);

    let read_failed = Arc::new(AtomicBool::new(false));
    let records = {
        let read_failed = Arc::clone(&read_failed);
        lines_stream(BufReader::new(input)).filter_map(move |line| {
            let read_failed = Arc::clone(&read_failed);
            async move {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Error reading input: {}", e);
                        read_failed.store(true, Ordering::Relaxed);
                        return None;
                    }
                };
                if line.trim().is_empty() {
                    return None;
                }
                match serde_json::from_str::<Record>(&line) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("Skipping unparsable record: {}", e);
                        None
                    }
                }
            }
        })
    };

    let mut out = BufWriter::new(tokio::io::stdout());
    let mut results = Box::pin(lookup.process_stream(records, config.pipeline.concurrency));

    while let Some(result) = results.next().await {
        pb.inc(1);
        match result {
            Ok(record) => {
                let mut line = serde_json::to_vec(&record)?;
                line.push(b'\n');
                out.write_all(&line).await?;
            }
            Err(e) => warn!("Skipping record {}: {}", e.record_id(), e),
        }
    }
    out.flush().await?;

    pb.finish_with_message("Processing complete");
    info!("Done: {}", lookup.stats().snapshot());

    if read_failed.load(Ordering::Relaxed) {
        anyhow::bail!("Input was not read completely");
    }

    Ok(())
}
