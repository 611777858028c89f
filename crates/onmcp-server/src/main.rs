mod api;
mod middleware;
mod scheduler;
mod upstream;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
    upstream::UpstreamClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(onmcp_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = onmcp_db::PoolConfig::from_app_config(&config);
    let pool = onmcp_db::connect_pool(&config.database_url, pool_config).await?;
    onmcp_db::run_migrations(&pool).await?;

    if !config.crm.is_configured() {
        tracing::warn!("no CRM agency key or private integration token configured; sync will fail");
    }
    let crm = Arc::new(onmcp_crm::CrmClient::new(&config.crm)?);
    let catalog = Arc::new(onmcp_core::load_catalog()?);
    let upstream = UpstreamClient::new(&config.onmcp_url)?;

    let _scheduler =
        scheduler::build_scheduler(pool.clone(), Arc::clone(&crm), Arc::clone(&config)).await?;

    let auth = AuthState::from_keys(
        &config.api_keys,
        matches!(config.env, onmcp_core::Environment::Development),
    )?;
    let state = AppState {
        pool,
        crm,
        upstream,
        catalog,
        config: Arc::clone(&config),
    };
    let app = build_app(state, auth);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "onmcp-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
