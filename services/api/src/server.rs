use crate::cli::ServeArgs;
use crate::infra::{AppState, Backend};
use crate::routes::with_survey_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use csat::config::AppConfig;
use csat::error::AppError;
use csat::survey::{AuthGateway, SurveyService, SurveyStore};
use csat::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    telemetry::init(&config.telemetry)?;

    match Backend::from_config(&config) {
        Backend::Hosted(service) => run_with(&config, service).await,
        Backend::Local(service) => run_with(&config, service).await,
    }
}

async fn run_with<S, A>(config: &AppConfig, service: Arc<SurveyService<S, A>>) -> Result<(), AppError>
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_survey_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "customer satisfaction survey service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
