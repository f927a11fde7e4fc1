use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAccountSource, InMemoryAlertPublisher, InMemoryTaskRepository};
use crate::routes::with_portfolio_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use zerochurn::config::{AppConfig, EngineConfig};
use zerochurn::error::AppError;
use zerochurn::telemetry;
use zerochurn::workflows::portfolio::PortfolioService;
use zerochurn::workflows::scoring::ScoringEngine;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(accounts) = args.accounts.take() {
        config.portfolio.accounts_path = Some(accounts);
    }

    telemetry::init(&config.telemetry)?;

    let engine_config = EngineConfig::load(config.portfolio.engine_config_path.as_deref())?;
    let accounts = match config.portfolio.accounts_path.as_deref() {
        Some(path) => InMemoryAccountSource::from_path(path)?,
        None => {
            warn!("no account export configured; account reports will return 404");
            InMemoryAccountSource::default()
        }
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let portfolio_service = Arc::new(PortfolioService::new(
        ScoringEngine::new(engine_config),
        Arc::new(accounts),
        Arc::new(InMemoryTaskRepository::default()),
        Arc::new(InMemoryAlertPublisher::default()),
        &config.portfolio,
    ));

    let app = with_portfolio_routes(portfolio_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "zerochurn scoring service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
