mod app;
mod cache;
mod config;
mod error;
mod pages;
mod query;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use finder_common::booking::MockBookingService;
use finder_common::search_api::SearchApiClient;

use app::AppState;
use cache::PageCache;
use config::Config;
use error::AppError;

fn build_state(config: &Config) -> Result<AppState<SearchApiClient>, AppError> {
    let api = SearchApiClient::new(config.finder.clone())?;
    Ok(AppState {
        api: Arc::new(api),
        booking: Arc::new(MockBookingService::new()),
        per_page: config.finder.per_page,
        fallback_location: Arc::from(config.finder.fallback_location.as_str()),
        pages: PageCache::default(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting hospital finder web client");

    let config = Config::from_env()?;
    info!(
        base_url = %config.finder.base_url,
        per_page = config.finder.per_page,
        listen_addr = %config.listen_addr,
        "configuration loaded"
    );

    let app = app::router(build_state(&config)?);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %config.listen_addr, "web client ready");
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "web server error");
    })?;
    Ok(())
}
