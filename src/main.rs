use std::path::PathBuf;
use std::time::Duration;

use portprobe::ports::PortSet;
use portprobe::scanner::{ScanConfig, ScanOrchestrator};
use portprobe::tasks::TaskGenerator;
use portprobe::{logging, report, targets};

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// portprobe — bounded-concurrency TCP reachability prober with retries and banner capture.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "portprobe",
    version,
    about = "Bounded-concurrency TCP reachability prober with retries and banner capture.",
    long_about = None
)]
struct Cli {
    /// Single target IP address or hostname. Takes precedence over --targets.
    #[arg(long)]
    target: Option<String>,

    /// Comma-separated targets (hostnames, IPs or CIDR blocks).
    #[arg(long)]
    targets: Option<String>,

    /// First port of the inclusive range.
    #[arg(long = "start-port", default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    start_port: u16,

    /// Last port of the inclusive range.
    #[arg(long = "end-port", default_value_t = 22, value_parser = clap::value_parser!(u16).range(1..))]
    end_port: u16,

    /// Extra comma-separated ports or ranges; unparsable entries are skipped.
    #[arg(long)]
    ports: Option<String>,

    /// Path to ports list file (one port or range per line).
    #[arg(long = "ports-file")]
    ports_file: Option<PathBuf>,

    /// Number of concurrent workers.
    #[arg(long, default_value_t = 200)]
    workers: usize,

    /// Per-attempt connect timeout in seconds (0 disables the limit).
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Maximum connect attempts per port.
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Skip reading a banner from open ports.
    #[arg(long = "no-banner", default_value_t = false)]
    no_banner: bool,

    /// Print results as a JSON array instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Also write the JSON results to this path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// List closed ports in the table as well.
    #[arg(long = "show-closed", default_value_t = false)]
    show_closed: bool,

    /// Abort the whole scan after this many seconds.
    #[arg(long = "max-duration")]
    max_duration: Option<u64>,

    /// More log output on stderr: -v adds every connect attempt, -vv everything.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors (hides per-port progress).
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet)?;

    let hosts = targets::resolve_targets(cli.target.as_deref(), cli.targets.as_deref())?;

    let mut ports = PortSet::from_range(cli.start_port, cli.end_port)?;
    if let Some(list) = cli.ports.as_deref() {
        ports.add_list(list);
    }
    if let Some(path) = cli.ports_file.as_deref() {
        ports.add_file(path)?;
    }
    let generator = TaskGenerator::new(&hosts, ports)?;

    let config = ScanConfig {
        workers: cli.workers,
        connect_timeout: Duration::from_secs(cli.timeout),
        max_attempts: cli.retries,
        grab_banner: !cli.no_banner,
        deadline: cli.max_duration.map(Duration::from_secs),
        ..ScanConfig::default()
    };
    let orchestrator = ScanOrchestrator::new(config)?;

    // Ctrl-C cancels the scan; whatever has been probed is still reported.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling scan");
            cancel_ctrlc.cancel();
        }
    });

    let results = orchestrator.run_with_cancel(&generator, cancel).await?;

    if cli.json {
        println!("{}", report::render_json(&results.outcomes)?);
    } else {
        print!("{}", report::render_text(&results, cli.show_closed));
    }

    if let Some(path) = cli.output.as_deref() {
        match report::write_json(path, &results.outcomes) {
            Ok(()) => eprintln!("Wrote JSON results to {}", path.display()),
            Err(e) => eprintln!("Failed to write JSON to {}: {e:#}", path.display()),
        }
    }

    Ok(())
}
