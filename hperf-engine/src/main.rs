use std::path::PathBuf;
use std::process;

use clap::Parser;
use hperf_common::{HperfError, RunConfig};
use hperf_engine::report::{render_header, render_report};
use hperf_engine::Dispatcher;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hperf", version, about = "Fire a fixed number of HTTP GETs and report latency statistics")]
struct Args {
    /// Target URL (scheme defaults to http)
    #[arg(short = 'u', long = "url")]
    url: Option<String>,

    /// Total number of connections
    #[arg(short = 'n', long = "num-conns")]
    num_conns: Option<usize>,

    /// Connection rate per second: 0 runs in series, negative runs unpaced in parallel
    #[arg(short = 'r', long, allow_negative_numbers = true)]
    rate: Option<f64>,

    /// Print one line per response
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// JSON run configuration; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the finalized results as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

impl Args {
    fn into_config(self) -> Result<(RunConfig, bool), HperfError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::new(String::new(), 0),
        };
        if let Some(url) = self.url {
            config.target = url;
        }
        if let Some(n) = self.num_conns {
            config.connections = n;
        }
        if let Some(rate) = self.rate {
            config.rate = rate;
        }
        if self.timeout_ms.is_some() {
            config.timeout_ms = self.timeout_ms;
        }
        config.verbose |= self.verbose;
        Ok((config, self.json))
    }
}

#[tokio::main]
async fn main() {
    let (config, json) = Args::parse().into_config().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(3);
    });

    let default_level = if config.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let dispatcher = Dispatcher::new(config.clone()).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(3);
    });

    if !json {
        println!("{}\n", render_header(&config));
    }

    let results = dispatcher.run().await;

    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Failed to encode results: {e}");
                process::exit(1);
            }
        }
    } else {
        print!("{}", render_report(&results));
    }
}
