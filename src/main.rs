use std::sync::Arc;

use event_reporting::{
    api, config::AppConfig, db, db::pg::PgReportStore, service::ReportingService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_reporting=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env().map_err(|err| anyhow::anyhow!("invalid configuration: {err}"))?;
    let store =
        PgReportStore::connect(&config.database_url, config.database_max_connections).await?;
    if config.run_migrations {
        db::run_migrations(store.pool()).await?;
        tracing::info!("development schema migrated");
    }

    let service = ReportingService::new(Arc::new(store), config.statistics_channels.clone());
    let app = api::router(api::AppState { service }, &config.cors_allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
