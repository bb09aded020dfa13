//! Command line driver: loads a corpus into a backend, times the standard
//! filter suite, runs ad-hoc queries and generates synthetic corpora.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use slicestore::{
    bench,
    config::{csv_strings, csv_u32},
    corpus, open_backend, EventStore, Filter, Settings,
};

/// Command line interface entry point.
#[derive(Parser)]
#[command(
    name = "slicestore",
    author,
    version,
    about = "Bounded in-memory Nostr event store"
)]
struct Cli {
    /// Path to the `.env` configuration file.
    #[arg(long, default_value = ".env")]
    env: String,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Load the corpus and time the standard filter suite.
    Bench {
        /// Executions per filter.
        #[arg(long, default_value_t = 1000)]
        iterations: u32,
        /// Skip loading the corpus into the backend.
        #[arg(long)]
        no_load: bool,
        /// Corpus path, overriding `EVENTS_FILE`.
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Load the corpus and print matching events as NDJSON.
    Query {
        /// Full filter as JSON, e.g. `{"kinds":[1],"limit":5}`.
        filter: Option<String>,
        /// Comma-separated author prefixes.
        #[arg(long)]
        authors: Option<String>,
        /// Comma-separated kind numbers.
        #[arg(long)]
        kinds: Option<String>,
        /// Comma-separated id prefixes.
        #[arg(long)]
        ids: Option<String>,
        /// Tag constraint as `name=value1,value2`; repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        since: Option<u64>,
        #[arg(long)]
        until: Option<u64>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        search: Option<String>,
        /// Corpus path, overriding `EVENTS_FILE`.
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Write a deterministic synthetic corpus as NDJSON.
    Generate {
        #[arg(long, default_value_t = 10_000)]
        count: usize,
        #[arg(long, default_value_t = 100)]
        authors: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        out: PathBuf,
    },
}

/// Filter flags of the `query` subcommand.
struct QueryArgs {
    filter: Option<String>,
    authors: Option<String>,
    kinds: Option<String>,
    ids: Option<String>,
    tags: Vec<String>,
    since: Option<u64>,
    until: Option<u64>,
    limit: Option<usize>,
    search: Option<String>,
}

/// Turn command line flags into a [`Filter`]. Flags refine a JSON filter
/// when both are given.
fn args_to_filter(args: QueryArgs) -> anyhow::Result<Filter> {
    let mut filter = match args.filter {
        Some(json) => serde_json::from_str(&json).context("parsing filter JSON")?,
        None => Filter::new(),
    };
    if let Some(a) = args.authors {
        filter = filter.authors(csv_strings(a));
    }
    if let Some(k) = args.kinds {
        filter = filter.kinds(csv_u32(k));
    }
    if let Some(i) = args.ids {
        filter = filter.ids(csv_strings(i));
    }
    for tag in args.tags {
        let Some((name, values)) = tag.split_once('=') else {
            bail!("tag constraint must look like name=value, got {tag}");
        };
        filter = filter.tag(name.trim_start_matches('#'), csv_strings(values));
    }
    if let Some(s) = args.since {
        filter = filter.since(s);
    }
    if let Some(u) = args.until {
        filter = filter.until(u);
    }
    if let Some(l) = args.limit {
        filter = filter.limit(l);
    }
    if let Some(s) = args.search {
        filter = filter.search(s);
    }
    Ok(filter)
}

fn open_loaded(cfg: &Settings, events: Option<PathBuf>) -> anyhow::Result<Box<dyn EventStore>> {
    let path = events.unwrap_or_else(|| cfg.events_file.clone());
    let corpus = corpus::load(&path)?;
    let store = open_backend(cfg)?;
    let report = bench::load_events(store.as_ref(), &corpus);
    info!(
        events = report.events,
        failed = report.failed,
        elapsed = ?report.elapsed,
        "corpus loaded"
    );
    Ok(store)
}

/// Execute the selected CLI subcommand.
fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = Settings::from_env(&cli.env)?;
    match cli.command {
        Commands::Bench {
            iterations,
            no_load,
            events,
        } => {
            let path = events.unwrap_or_else(|| cfg.events_file.clone());
            let corpus = corpus::load(&path)?;
            let store = open_backend(&cfg)?;
            if !no_load {
                println!("Loading events...");
                let report = bench::load_events(store.as_ref(), &corpus);
                println!("Time to load events: {:?}", report.elapsed);
                if report.failed > 0 {
                    println!("Failed saves: {}", report.failed);
                }
            }
            for filter in bench::default_filters(&corpus) {
                let report = bench::run_filter(store.as_ref(), &filter, iterations)?;
                println!("Filter: {}", report.filter);
                println!("Matched: {}", report.matched);
                println!("Average Time: {:?}", report.average());
                println!("Total Time: {:?}", report.total);
            }
            store.close();
        }
        Commands::Query {
            filter,
            authors,
            kinds,
            ids,
            tags,
            since,
            until,
            limit,
            search,
            events,
        } => {
            let filter = args_to_filter(QueryArgs {
                filter,
                authors,
                kinds,
                ids,
                tags,
                since,
                until,
                limit,
                search,
            })?;
            let store = open_loaded(&cfg, events)?;
            for ev in store.query_events(std::slice::from_ref(&filter))? {
                println!("{}", serde_json::to_string(ev.as_ref())?);
            }
            store.close();
        }
        Commands::Generate {
            count,
            authors,
            seed,
            out,
        } => {
            let events = corpus::generate(count, authors, seed);
            corpus::write_ndjson(&out, &events)?;
            info!(count, path = %out.display(), "corpus written");
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    run(Cli::parse())
}
