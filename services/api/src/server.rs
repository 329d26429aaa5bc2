use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryReportStore};
use crate::routes::with_screening_routes;
use audience_gate::config::AppConfig;
use audience_gate::error::AppError;
use audience_gate::fetcher::WebDriverFetcher;
use audience_gate::screening::ScreeningService;
use audience_gate::telemetry;
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
    args.pipeline.apply(&mut config.pipeline);

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let fetcher = Arc::new(WebDriverFetcher::new(config.pipeline.browser_settings()));
    let store = Arc::new(InMemoryReportStore::default());
    let screening_service = Arc::new(ScreeningService::new(
        fetcher,
        store,
        config.pipeline.pipeline_settings(),
    ));

    let app = with_screening_routes(screening_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        webdriver = %config.pipeline.webdriver_url,
        "audience gate ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
