use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adminkit_backend::{
    config::Config,
    db::open_store,
    router::router,
    scheduler::Scheduler,
    services::{admin::ensure_admin, session_cache::SessionCache},
    state::AppState,
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(2).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adminkit_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        storage_path = %config.storage_path.display(),
        bind_addr = %config.bind_addr,
        server_name = %config.server_name,
        admin_email = %config.admin_email,
        admin_password = %mask_secret(&config.admin_password),
        page_limit = config.page_limit,
        frontend_url = %config.frontend_url,
        time_zone = %config.time_zone,
        "Loaded configuration from environment/.env"
    );

    // Open storage; a busy file past the open timeout aborts startup
    let store = open_store(&config.storage_path).await?;
    ensure_admin(&store, &config).await?;

    // Restore sessions before anything can touch them
    let cache = Arc::new(SessionCache::new());
    let state = AppState::new(store.clone(), cache, config.clone());
    state.sessions.reconcile_load().await?;

    let scheduler = Scheduler::start(store.clone(), &config);

    let app = router(state.clone());
    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler.shutdown().await;
    if let Err(err) = state.sessions.reconcile_save().await {
        tracing::error!(error = %err, "Failed to checkpoint sessions");
    }
    store.pool().close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
