mod api;
mod middleware;

use std::{sync::Arc, time::Duration};

use storefront_catalog::{Catalog, PublicationOrchestrator, SessionGate, UploadSigner};
use storefront_core::Environment;
use storefront_db::PgStore;
use storefront_social::Broadcaster;
use tracing_subscriber::EnvFilter;

use crate::api::{
    build_app, default_login_rate_limit_state, default_rate_limit_state, AppState,
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

    let catalog = Catalog::new(
        Arc::new(PgStore::new(pool)),
        Duration::from_secs(config.store_timeout_secs),
    );
    let broadcaster = Broadcaster::from_config(config.social.clone())?;
    let orchestrator =
        PublicationOrchestrator::new(catalog.clone(), Arc::new(broadcaster), &config.public_base_url);

    let state = AppState {
        catalog,
        orchestrator,
        gate: SessionGate::new(&config.admin_password, config.env == Environment::Production),
        uploads: UploadSigner::new(config.upload.clone()),
        public_base_url: config.public_base_url.clone(),
        whatsapp_phone: config.whatsapp_phone.clone(),
    };
    let app = build_app(
        state,
        default_rate_limit_state(),
        default_login_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "storefront server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
