use crate::cli::ServeArgs;
use crate::infra::{build_generator, load_slider_assessment, AppState, InMemorySessionStore};
use crate::routes::with_screening_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use carecheck::collaborators::Responder;
use carecheck::config::AppConfig;
use carecheck::error::AppError;
use carecheck::screening::ScreeningService;
use carecheck::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let slider = load_slider_assessment(&config.predictor)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        slider,
    };

    let store = Arc::new(InMemorySessionStore::default());
    let responder = Responder::new(
        build_generator(&config.responder),
        config.responder.timeout,
    );
    let screening_service = Arc::new(ScreeningService::new(store, responder));

    let app = with_screening_routes(screening_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "screening service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
