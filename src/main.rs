use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use log_auditor::auditor::{Auditor, HttpLogSource, TracingReporter};
use log_auditor::config::AuditorConfig;
use log_auditor::server;
use log_auditor::snapshot::RootSnapshot;
use log_auditor::store::TrustedRootStore;

#[derive(Parser)]
#[command(name = "log-auditor")]
#[command(about = "Checks that a remote log stays append-only")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the log personality, overrides the configuration
    #[arg(long)]
    log_url: Option<String>,

    /// How often to audit the log, in seconds
    #[arg(long)]
    poll_interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "log_auditor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = AuditorConfig::load(cli.config.as_deref())?;
    if let Some(log_url) = cli.log_url {
        config.log_url = log_url;
    }
    if let Some(secs) = cli.poll_interval_secs {
        config.poll_interval_secs = secs;
    }
    config.validate()?;
    info!("Configuration loaded");

    let snapshot = config.snapshot_path.as_ref().map(RootSnapshot::new);
    let store = match &snapshot {
        Some(snapshot) => match snapshot.load()? {
            Some(root) => TrustedRootStore::with_root(root),
            None => TrustedRootStore::new(),
        },
        None => TrustedRootStore::new(),
    };

    let source = HttpLogSource::new(config.log_url.clone(), config.connect_timeout())
        .context("could not create log client")?;
    let reporter = TracingReporter::new(config.malformed_escalation_threshold);

    let mut auditor = Auditor::new(source, reporter, store)
        .with_poll_interval(config.poll_interval())
        .with_fetch_timeout(config.fetch_timeout());
    if let Some(snapshot) = snapshot {
        auditor = auditor.with_snapshot(snapshot);
    }

    // Read-only trusted root endpoint
    if let Some(addr) = &config.status_addr {
        let addr: SocketAddr = addr.parse().context("invalid status address")?;
        let trusted = auditor.subscribe();
        tokio::spawn(async move {
            if let Err(e) = server::serve(addr, trusted).await {
                error!("Status server stopped: {}", e);
            }
        });
    }

    auditor
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                // Without a signal handler, keep auditing until killed
                std::future::pending::<()>().await;
            }
        })
        .await;

    let trusted = auditor.trusted_root();
    info!(
        "auditor stopped with trusted root revision={} size={}",
        trusted.revision, trusted.tree_size
    );
    Ok(())
}
