// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! redis-compare - verify a destination Redis against a source Redis.
//!
//! Mismatch reports go to stdout, one per line. Logs and the final
//! `Error=<count>` summary go to stderr.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use redis_compare::config::{
    CompareConfig, ConnectionConfig, EndpointsConfig, ScanConfig, WorkerConfig,
};
use redis_compare::{CompareEngine, Verdict, EXIT_FAILURE};

/// redis-compare - check that every source key exists on the destination with the same value
#[derive(Parser, Debug)]
#[command(name = "redis-compare")]
#[command(version, about = "Compare the data in two Redis deployments")]
struct Cli {
    /// Source endpoint (host:port or redis:// URL). Repeat for a cluster.
    #[arg(long = "src", value_name = "ENDPOINT", required = true, env = "REDIS_COMPARE_SRC", value_delimiter = ',')]
    src: Vec<String>,

    /// Destination endpoint (host:port or redis:// URL). Repeat for a cluster.
    #[arg(long = "dst", value_name = "ENDPOINT", required = true, env = "REDIS_COMPARE_DST", value_delimiter = ',')]
    dst: Vec<String>,

    /// Only compare keys matching this glob pattern (SCAN MATCH)
    #[arg(long = "scan", value_name = "PATTERN")]
    scan: Option<String>,

    /// Number of comparison workers
    #[arg(long, default_value = "8")]
    parallel: usize,

    /// COUNT hint for SCAN and HSCAN
    #[arg(long, default_value = "10000")]
    fetch_count: usize,

    /// Per-command read timeout in seconds
    #[arg(long, default_value = "5")]
    read_timeout_sec: u64,

    /// Idle connection timeout in seconds
    #[arg(long, default_value = "100")]
    idle_timeout_sec: u64,

    /// Connections per standalone endpoint
    #[arg(long, default_value = "30")]
    pool_size: usize,

    /// Swap source and destination
    #[arg(long)]
    reverse: bool,

    /// Dispatch queue capacity (defaults to --parallel)
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Connection establishment timeout in seconds
    #[arg(long, default_value = "10")]
    connect_timeout_sec: u64,

    /// Log scan progress every N keys per node (0 disables)
    #[arg(long, default_value = "100000")]
    progress_interval: u64,
}

impl Cli {
    fn into_config(self) -> CompareConfig {
        let config = CompareConfig {
            source: EndpointsConfig::new(self.src),
            destination: EndpointsConfig::new(self.dst),
            scan: ScanConfig {
                pattern: self.scan,
                fetch_count: self.fetch_count,
                progress_interval: self.progress_interval,
            },
            workers: WorkerConfig {
                parallel: self.parallel,
                queue_capacity: self.queue_capacity,
            },
            connection: ConnectionConfig {
                read_timeout_sec: self.read_timeout_sec,
                idle_timeout_sec: self.idle_timeout_sec,
                pool_size: self.pool_size,
                connect_timeout_sec: self.connect_timeout_sec,
            },
        };

        if self.reverse {
            config.reversed()
        } else {
            config
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Exit status 2 is reserved for "reports found".
            let code = if e.use_stderr() { EXIT_FAILURE } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(verdict) => {
            eprintln!("Error={}", verdict.errors());
            ExitCode::from(verdict.exit_code())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Comparison could not run");
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Verdict> {
    let config = cli.into_config();
    config.validate().context("Invalid configuration")?;

    info!(
        source = ?config.source.endpoints,
        destination = ?config.destination.endpoints,
        pattern = ?config.scan.match_pattern(),
        "redis-compare starting"
    );

    let engine = CompareEngine::connect(config)
        .await
        .context("Failed to connect")?;
    let (verdict, _) = engine.run(std::io::stdout()).await?;

    Ok(verdict)
}
