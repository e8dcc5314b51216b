//! CLI for paris-traceroute.

mod error;
mod runner;
mod simulation;

use clap::Parser;
use error::CliError;
use paris_core::{TracerouteOptions, DEFAULT_MAX_TTL, DEFAULT_MIN_TTL, DEFAULT_NUM_PROBES};
use runner::RunConfig;
use simulation::SimulatedPath;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Paris traceroute - hop discovery with stable probe headers.
#[derive(Parser, Debug)]
#[command(name = "paris-traceroute")]
#[command(version)]
#[command(about = "Paris traceroute - hop discovery with stable probe headers")]
pub struct Args {
    /// Destination IPv4 address.
    #[arg(required = true)]
    pub destination: String,

    /// TTL of the first probed hop.
    #[arg(short = 'f', long = "first", default_value_t = DEFAULT_MIN_TTL)]
    pub first_ttl: u8,

    /// Maximum TTL.
    #[arg(short = 'm', long = "max-hops", default_value_t = DEFAULT_MAX_TTL)]
    pub max_hops: u8,

    /// Number of probes per hop.
    #[arg(short = 'q', long = "queries", default_value_t = DEFAULT_NUM_PROBES)]
    pub queries: u32,

    /// Source IPv4 address stamped into probes.
    #[arg(long, default_value = "127.0.0.1")]
    pub source: String,

    /// JSON description of the simulated path.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Timeout per probe in milliseconds.
    #[arg(long, default_value = "1000")]
    pub timeout: u64,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Convert CLI args to a run configuration.
    fn to_config(&self) -> Result<RunConfig, CliError> {
        let destination: Ipv4Addr = self
            .destination
            .parse()
            .map_err(|_| CliError::InvalidDestination(self.destination.clone()))?;
        let source: Ipv4Addr = self
            .source
            .parse()
            .map_err(|_| CliError::InvalidSource(self.source.clone()))?;

        let options = TracerouteOptions {
            min_ttl: self.first_ttl,
            max_ttl: self.max_hops,
            num_probes: self.queries,
            dst_ip: destination.to_string(),
        };
        options.validate()?;

        let path = match &self.path {
            Some(file) => SimulatedPath::load(file)?,
            None => SimulatedPath::default(),
        };

        Ok(RunConfig {
            options,
            source,
            destination,
            path,
            timeout: Duration::from_millis(self.timeout),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr, stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(if args.verbose { "debug" } else { "info" })
        .with_writer(std::io::stderr)
        .init();

    let config = match args.to_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        destination = %config.destination,
        min_ttl = config.options.min_ttl,
        max_ttl = config.options.max_ttl,
        num_probes = config.options.num_probes,
        "Starting traceroute"
    );

    match runner::run_traceroute(config).await {
        Ok(run) => match run.to_json() {
            Ok(json) => {
                println!("{}", json);
                if run.error.is_some() {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(e) => {
                eprintln!("Failed to serialize results: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Traceroute failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
