use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use backend_lib::{
    config::{Settings, DEFAULT_CONFIG_PATH},
    counter::MemoryCounterStore,
    create_router,
    metrics::COUNTERS_PURGED,
    storage::open_user_store,
    telemetry::init_tracing,
    AppState,
};
use clap::Parser;
use tokio::{net::TcpListener, signal};
use tracing::{debug, info, warn};

/// How often expired rate-limit counters are swept
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "tradedesk", version, about = "Trading desk API server")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "TRADEDESK_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    init_tracing(&settings.log_level, settings.log_format)
        .context("installing tracing subscriber")?;

    if settings.auth.uses_dev_secrets() {
        warn!("using built-in development signing secrets; set TRADEDESK_AUTH__ACCESS_SECRET and TRADEDESK_AUTH__REFRESH_SECRET");
    }

    let addr = settings.bind_addr()?;

    let users = open_user_store(&settings.storage)
        .await
        .context("opening user store")?;
    let counters = Arc::new(MemoryCounterStore::new());
    spawn_counter_purge(counters.clone());

    let state = AppState::new(settings, users, counters)?;
    let app = create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

fn spawn_counter_purge(counters: Arc<MemoryCounterStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = counters.purge_expired();
            if purged > 0 {
                metrics::counter!(COUNTERS_PURGED).increment(purged as u64);
                debug!(purged, remaining = counters.len(), "purged expired counters");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
