use crate::cli::ServeArgs;
use crate::infra::{
    starter_catalog, AppState, InMemoryAwardLedger, InMemoryBadgeCatalog, InMemoryMetricStore,
    InMemoryNotifier, InMemoryProgressionLedger,
};
use crate::routes::with_achievement_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use forgehub::achievements::{AchievementService, CatalogCsvImporter};
use forgehub::config::AppConfig;
use forgehub::error::AppError;
use forgehub::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let metric_store = Arc::new(InMemoryMetricStore::default());
    let catalog = Arc::new(InMemoryBadgeCatalog::default());
    let seeded = match args.catalog_csv.take() {
        Some(path) => CatalogCsvImporter::from_path(path)?,
        None => starter_catalog(),
    };
    let catalog_size = seeded.len();
    catalog.seed(seeded);

    let achievement_service = Arc::new(AchievementService::new(
        metric_store.clone(),
        catalog,
        Arc::new(InMemoryAwardLedger::default()),
        Arc::new(InMemoryProgressionLedger::default()),
        Arc::new(InMemoryNotifier::default()),
    ));

    let app = with_achievement_routes(achievement_service, metric_store)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, catalog_size, "achievement engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
