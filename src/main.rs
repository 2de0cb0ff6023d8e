use anyhow::Result;
use clap::{Parser, Subcommand};
use machine_probe::config::AppConfig;
use machine_probe::models::{NetworkEvent, ProbeType, ProbeTypes};
use machine_probe::prober::Prober;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser)]
#[command(name = "machine-probe", version, about = "Probe or replay machine hardware and network state")]
struct Cli {
    /// TOML config file (default: machine-probe.toml if present).
    #[arg(long, global = true, env = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Replay this recorded machine config instead of probing live hardware.
    #[arg(long, global = true)]
    machine_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print network change events as JSON lines.
    Network {
        /// How long to observe a live system.
        #[arg(long, default_value_t = 3000)]
        duration_ms: u64,
    },
    /// Print the storage probe result as JSON.
    Storage {
        /// Comma-separated subsystems: blockdev, partition, filesystem.
        #[arg(long, value_delimiter = ',')]
        types: Vec<ProbeType>,
    },
    /// Record this machine as a replayable machine config.
    Capture {
        #[arg(long)]
        output: PathBuf,
        /// How long to observe the network before recording.
        #[arg(long, default_value_t = 3000)]
        window_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut app_config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    if cli.machine_config.is_some() {
        app_config.prober.snapshot_path = cli.machine_config.clone();
    }

    let prober = Arc::new(
        Prober::new(&app_config.prober_config())
            .map_err(|e| anyhow::anyhow!("prober init failed: {}", e))?,
    );

    match cli.command {
        Command::Network { duration_ms } => {
            let (handle, outcome) = prober.probe_network(|event: NetworkEvent| {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "failed to encode network event"),
                }
            })?;
            if outcome.delivered.is_none() {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(duration_ms)) => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received shutdown signal");
                    }
                }
            }
            handle.stop();
        }
        Command::Storage { types } => {
            let types: ProbeTypes = if types.is_empty() {
                app_config.storage.probe_types.clone()
            } else {
                types.into_iter().collect()
            };
            let scope = (!types.is_empty()).then_some(types);
            let storage = prober.get_storage_in_background(scope).await?;
            println!("{}", serde_json::to_string_pretty(storage.as_ref())?);
        }
        Command::Capture { output, window_ms } => {
            let snapshot = prober
                .capture_snapshot(Duration::from_millis(window_ms))
                .await?;
            snapshot.save(&output)?;
            tracing::info!(path = %output.display(), "machine config written");
        }
    }

    Ok(())
}
