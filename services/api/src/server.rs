use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryBuyerRepository, InMemoryLeadRepository};
use crate::routes::with_lead_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dealbot::config::AppConfig;
use dealbot::error::AppError;
use dealbot::evaluation::EvaluationEngine;
use dealbot::leads::{BuyerCsvImporter, LeadService};
use dealbot::sources::SnapshotMerger;
use dealbot::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let lead_service = Arc::new(LeadService::new(
        Arc::new(InMemoryLeadRepository::default()),
        Arc::new(InMemoryBuyerRepository::default()),
        EvaluationEngine::new(config.evaluation.clone()),
        SnapshotMerger::new(config.merge.clone()),
    ));

    if let Some(path) = args.buyers_csv.take() {
        let submissions = BuyerCsvImporter::from_path(&path)?;
        let imported = lead_service.import_buyers(submissions)?;
        info!(imported, path = %path.display(), "buyer directory seeded");
    }

    if config.api_key.is_none() {
        warn!("APP_API_KEY is not set; write endpoints accept unauthenticated requests");
    }

    let app = with_lead_routes(lead_service, config.api_key.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "dealbot lead service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
