mod api;
mod auth;
mod middleware;
mod storage;

use std::{net::SocketAddr, time::Duration};

use storefront_notify::Mailer;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    auth::TokenKeys,
    middleware::RateLimitState,
    storage::ImageStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = storefront_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = storefront_db::PoolConfig::from_app_config(&config);
    let pool = storefront_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = storefront_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let mailer = Mailer::from_config(config.mail.as_ref())?;
    if !mailer.is_enabled() {
        tracing::warn!("mail relay not configured; order status emails are disabled");
    }

    let state = AppState {
        pool,
        tokens: TokenKeys::new(&config.jwt_secret, config.jwt_ttl_hours),
        mailer,
        images: ImageStore::new(config.upload_dir.clone()),
        store_name: config.store_name.clone().into(),
    };
    let rate_limit = RateLimitState::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    );
    let app = build_app(state, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "storefront server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
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
