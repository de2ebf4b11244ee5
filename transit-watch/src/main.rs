use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tokio::sync::Notify;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transit_watch::alerts::{EventLog, NotificationDispatcher, NotifyError};
use transit_watch::cache::{CacheConfig, CachedItinerarySource};
use transit_watch::config::{AppConfig, ConfigError, verify_stops};
use transit_watch::engine::EngineConfig;
use transit_watch::poller::{AnySource, Poller};
use transit_watch::transport::{MockTransportClient, TransportClient, TransportError};
use transit_watch::web::{AppState, create_router};

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "transit_watch=info,tower_http=info";

#[derive(Parser)]
#[command(name = "transit-watch")]
#[command(about = "Watch commute routes for delays and suggest reroutes", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, env = "TRANSIT_WATCH_CONFIG", default_value = "transit-watch.json")]
    config: PathBuf,

    /// Override the bind address from the configuration
    #[arg(long)]
    bind: Option<String>,

    /// Serve itineraries from JSON fixtures in this directory instead of the live API
    #[arg(long, value_name = "DIR")]
    mock_data: Option<PathBuf>,

    /// Run a single cycle, print the route entities and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Check every configured stop against the API before starting
    #[arg(long, default_value_t = false)]
    verify_stops: bool,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create transport client: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to create notifier: {0}")]
    Notify(#[from] NotifyError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to render entities: {0}")]
    Render(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "transit-watch stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = AppConfig::load(&cli.config)?;

    let source = match &cli.mock_data {
        Some(dir) => {
            info!(dir = %dir.display(), "using mock itineraries");
            AnySource::Mock(MockTransportClient::new(dir)?)
        }
        None => {
            let client = TransportClient::new(config.transport.clone())?;
            AnySource::Live(CachedItinerarySource::new(client, &CacheConfig::default()))
        }
    };

    if cli.verify_stops {
        verify_stops(&source, &config.materialized_routes()).await?;
        info!("all stops verified");
    }

    let notifier = match &config.webhook_url {
        Some(url) => NotificationDispatcher::webhook(url.clone())?,
        None => NotificationDispatcher::log_only(),
    };

    let events = EventLog::default();
    let mut poller = Poller::new(
        &config.routes,
        source,
        notifier,
        events.clone(),
        EngineConfig::default(),
    );
    info!(routes = poller.routes().len(), "watching routes");

    if cli.once {
        poller.run_cycle(Utc::now()).await;
        let snapshots = poller.snapshots();
        let snapshots = snapshots.read().await;
        let entities: Vec<_> = snapshots.values().collect();
        println!("{}", serde_json::to_string_pretty(&entities)?);
        return Ok(());
    }

    let snapshots = poller.snapshots();
    let refresh = Arc::new(Notify::new());

    let polling = tokio::spawn(poller.run(config.poll_interval(), refresh.clone()));

    let app = create_router(AppState::new(snapshots, events, refresh));

    let addr = cli.bind.unwrap_or(config.bind);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            // An error here means no signal handler; serve until killed.
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await
        .map_err(StartupError::Serve)?;

    polling.abort();
    info!("shut down");
    Ok(())
}
