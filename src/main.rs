//! Tickscope CLI
//!
//! Command-line interface for exploring tick files:
//! - List files
//! - Query ticks in a time range
//! - Histograms, summaries and bid/ask spreads

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tickscope::config::generate_default_config;
use tickscope::{
    Config, CsvLoader, Histogram, LoaderSource, MockLoader, TickField, TickLoader, TickStore,
    TimeRange,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tickscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explore recorded market tick sessions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Tick source (mock, csv)
    #[arg(long, global = true)]
    pub source: Option<LoaderSource>,

    /// Directory of CSV tick files
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available files
    Files,

    /// Print ticks inside a time range
    Query {
        /// File identifier
        #[arg(long)]
        file: String,
        /// Range start (seconds from session start)
        #[arg(long, default_value = "0")]
        min: f64,
        /// Range end (default: end of session)
        #[arg(long)]
        max: Option<f64>,
        /// Print at most this many ticks
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Histogram of one or more fields
    Histogram {
        /// File identifier
        #[arg(long)]
        file: String,
        /// Fields to bin (price, size, seconds_from_start)
        #[arg(long, default_value = "price", value_delimiter = ',')]
        field: Vec<TickField>,
        /// Number of bins (default: from config)
        #[arg(long)]
        bins: Option<usize>,
        /// Range start
        #[arg(long, default_value = "0")]
        min: f64,
        /// Range end (default: end of session)
        #[arg(long)]
        max: Option<f64>,
    },

    /// Summary statistics of a file
    Summary {
        /// File identifier
        #[arg(long)]
        file: String,
    },

    /// Bid/ask spread per time window
    Spread {
        /// File identifier
        #[arg(long)]
        file: String,
        /// Window width in seconds
        #[arg(short, long, default_value = "1")]
        window: f64,
        /// Range start
        #[arg(long, default_value = "0")]
        min: f64,
        /// Range end (default: end of session)
        #[arg(long)]
        max: Option<f64>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };
    if let Some(source) = cli.source {
        config.loader.source = source;
    }
    if let Some(data_dir) = &cli.data_dir {
        config.loader.data_dir = data_dir.clone();
    }

    init_logging(&config);

    let json = cli.format == "json";

    let loader: Arc<dyn TickLoader> = match config.loader.source {
        LoaderSource::Mock => {
            Arc::new(MockLoader::new().with_tick_count(config.loader.mock_tick_count))
        }
        LoaderSource::Csv => Arc::new(CsvLoader::new(&config.loader.data_dir)),
    };
    tracing::debug!("Using {} loader", loader.name());

    let store = TickStore::new(loader, &config);

    match cli.command {
        Commands::Files => {
            let files = store.list_files().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else if files.is_empty() {
                println!("No files found");
            } else {
                println!("{:<32} | {:<20}", "File", "Session start");
                println!("{}", "-".repeat(55));
                for file in files {
                    let start = file
                        .session_start
                        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("{:<32} | {:<20}", file.id, start);
                }
            }
        }

        Commands::Query {
            file,
            min,
            max,
            limit,
        } => {
            let range = TimeRange::new(min, max.unwrap_or(f64::INFINITY));
            let ticks = store.query(&file, &range).await?;
            let shown = &ticks[..limit.unwrap_or(ticks.len()).min(ticks.len())];

            if json {
                println!("{}", serde_json::to_string_pretty(shown)?);
            } else {
                println!("{:>12} | {:>10} | {:>6} | {:<4}", "Seconds", "Price", "Size", "Side");
                println!("{}", "-".repeat(42));
                for tick in shown {
                    println!(
                        "{:>12.3} | {:>10} | {:>6} | {:<4}",
                        tick.seconds_from_start,
                        opt(tick.price.map(|p| format!("{:.2}", p))),
                        opt(tick.size.map(|s| s.to_string())),
                        opt(tick.side.map(|s| s.to_string())),
                    );
                }
                println!();
                println!("{} of {} ticks in range", shown.len(), ticks.len());
            }
        }

        Commands::Histogram {
            file,
            field,
            bins,
            min,
            max,
        } => {
            let range = TimeRange::new(min, max.unwrap_or(f64::INFINITY));
            let bin_count = bins.unwrap_or(config.histogram.bin_count);
            let histograms = store.histograms(&file, &range, &field, bin_count).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&histograms)?);
            } else {
                for f in &field {
                    if let Some(histogram) = histograms.get(f) {
                        print_histogram(*f, histogram);
                    }
                }
            }
        }

        Commands::Summary { file } => {
            let summary = store.summary(&file).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                let num = |v: Option<f64>| opt(v.map(|v| format!("{:.4}", v)));

                println!("File:          {}", file);
                println!("Records:       {}", summary.total_records);
                println!(
                    "Symbols:       {} ({})",
                    summary.unique_symbols,
                    summary.unique_symbol_list.join(", ")
                );
                println!("Ask / Bid:     {} / {}", summary.ask_count, summary.bid_count);
                println!(
                    "Price:         {} .. {} (avg {}, sd {})",
                    num(summary.min_price),
                    num(summary.max_price),
                    num(summary.avg_price),
                    num(summary.price_std_dev)
                );
                println!(
                    "Size:          {} .. {} (avg {})",
                    opt(summary.min_size.map(|s| s.to_string())),
                    opt(summary.max_size.map(|s| s.to_string())),
                    num(summary.avg_size)
                );
                println!(
                    "Time:          {}s .. {}s",
                    num(summary.start_seconds),
                    num(summary.end_seconds)
                );
                if let (Some(start), Some(end)) = (summary.start_time, summary.end_time) {
                    println!("Wall clock:    {} .. {}", start.to_rfc3339(), end.to_rfc3339());
                }
            }
        }

        Commands::Spread {
            file,
            window,
            min,
            max,
        } => {
            let range = TimeRange::new(min, max.unwrap_or(f64::INFINITY));
            let (series, summary) = store.spread(&file, &range, window).await?;

            if json {
                let body = serde_json::json!({
                    "series": series,
                    "summary": summary,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!(
                    "{:>12} | {:>10} | {:>10} | {:>8}",
                    "Window", "Min ask", "Max bid", "Spread"
                );
                println!("{}", "-".repeat(50));
                for point in &series {
                    println!(
                        "{:>12.3} | {:>10.2} | {:>10.2} | {:>8.4}",
                        point.seconds_from_start, point.min_ask, point.max_bid, point.spread
                    );
                }
                println!();
                match summary {
                    Some(s) => println!(
                        "Spread: min {:.4}, q1 {:.4}, median {:.4}, q3 {:.4}, max {:.4} \
                         ({} windows)",
                        s.min, s.q1, s.median, s.q3, s.max, s.count
                    ),
                    None => println!("No window holds both an ask and a bid"),
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("tickscope={}", config.logging.level).into());

    // Logs go to stderr so table and JSON output stay clean
    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn opt(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

fn print_histogram(field: TickField, histogram: &Histogram) {
    println!("{}", field);

    if histogram.is_empty() {
        println!("  No data for the selected time range");
        println!();
        return;
    }

    let max = histogram.max_count().max(1);
    for bin in histogram.bins() {
        let bar = "#".repeat((bin.count * 40 / max) as usize);
        println!("  {:>12} | {:>8} | {}", bin.label, bin.count, bar);
    }

    if histogram.is_sampled() {
        println!("  (counts sampled every {} records)", histogram.stride());
    }
    println!();
}
