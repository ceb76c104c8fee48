use crate::cli::ServeArgs;
use crate::infra::{spawn_feed_logger, AppState, Backends};
use crate::routes::with_app_routes;
use agendate::config::AppConfig;
use agendate::error::AppError;
use agendate::search::HttpGeocoder;
use agendate::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let geocoder = HttpGeocoder::new(
        config.search.geocoder_base_url.clone(),
        &config.search.geocoder_user_agent,
    )?;

    let backends = Backends::default();
    let listings = backends.listing_api(&config);
    let _feed_logger = spawn_feed_logger(backends.listings.clone());

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        geocoder: Arc::new(geocoder),
        profiles: backends.profile_service(),
    };

    let app = with_app_routes(listings)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        geocoder = %config.search.geocoder_base_url,
        "listing service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
