//! Webbook listener entry point.

use std::error::Error;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use webbook_api::config::Config;
use webbook_api::metrics::Metrics;
use webbook_api::state::AppState;
use webbook_api::{logging, reporter, routes};
use webbook_core::policy::NonConformingPolicy;
use webbook_event_store::{SqliteEventRepository, open_or_create_store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    logging::init(&config.log_file)?;

    info!(
        db_file = %config.db_file.display(),
        log_file = %config.log_file.display(),
        policy = %config.policy.non_conforming,
        capture_unrecognized = config.policy.capture_unrecognized,
        body_limit = config.body_limit,
        report_interval_secs = config.report_interval.as_secs(),
        gitlab_secret = ?config.gitlab_secret,
        "starting webbook listener"
    );

    if config.policy.non_conforming == NonConformingPolicy::Persist {
        warn!("non-conforming requests are persisted without a token check");
    }

    let pool = open_or_create_store(&config.db_file).await?;

    let metrics = Arc::new(Metrics::new()?);
    let _reporter = reporter::spawn(Arc::clone(&metrics), config.report_interval);

    let app_state = AppState::new(
        Arc::new(SqliteEventRepository::new(pool)),
        metrics,
        config.gitlab_secret.clone(),
        config.policy,
        config.body_limit,
    );

    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = config.socket_addr()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
