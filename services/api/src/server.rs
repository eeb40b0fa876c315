use crate::cli::ServeArgs;
use crate::infra::{seeded_store, AppState};
use crate::routes::with_dispatch_routes;
use ambulance_dispatch::config::AppConfig;
use ambulance_dispatch::error::AppError;
use ambulance_dispatch::telemetry;
use ambulance_dispatch::workflows::dispatch::DispatchService;
use ambulance_dispatch::workflows::routing::RouteService;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(roster) = args.roster.take() {
        config.dispatch.roster_csv = Some(roster);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = seeded_store(config.dispatch.roster_csv.as_deref())?;
    let dispatch_service = Arc::new(DispatchService::new(store.clone(), config.dispatch.clone()));
    let route_service = Arc::new(RouteService::new(store, config.dispatch.clone()));

    let app = with_dispatch_routes(dispatch_service, route_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ambulance dispatch service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
