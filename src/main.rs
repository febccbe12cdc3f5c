use std::net::SocketAddr;
use std::time::Duration;

use tokio::signal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use storefront::auth::session;
use storefront::config::{self, Config};
use storefront::store::AppState;
use storefront::{api, fault};

const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("STOREFRONT_LOG").unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().json())
        .init();

    fault::install_panic_hook();
    config::load_dotenv();
    let cfg = Config::load();
    let addr: SocketAddr = cfg.listen.parse()?;

    let state = AppState::from_config(cfg)?;
    tracing::info!(
        environment = state.config.environment(),
        key_vault = state.vault_connected(),
        "state initialized"
    );

    tokio::spawn(session::run_sweeper(
        state.sessions.clone(),
        SESSION_SWEEP_PERIOD,
    ));

    let app = api::app(state);

    tracing::info!(%addr, "starting storefront");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("storefront stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
