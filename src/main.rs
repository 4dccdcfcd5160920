use anyhow::Result;
use resource_watcher::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = resource_watcher::config::AppConfig::load()?;
    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        client_id = %app_config.collection.client_id,
        "starting"
    );

    let sysinfo_repo = Arc::new(sysinfo_repo::SysinfoRepo::new());
    // Docker is optional; an unreachable daemon disables container stats instead of aborting.
    let docker_repo = if app_config.integrations.docker_enabled {
        match docker_repo::DockerRepo::connect() {
            Ok(repo) => Some(Arc::new(repo)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    operation = "docker_connect",
                    "Docker unavailable; container stats disabled"
                );
                None
            }
        }
    } else {
        None
    };
    let source: Arc<dyn collector::SampleSource> = Arc::new(collector::SystemCollector::new(
        sysinfo_repo,
        docker_repo,
        app_config.collection.client_id.clone(),
    ));

    let retention_minutes = app_config.collection.retention_minutes;
    let metrics_store = Arc::new(history_repo::MetricsStore::with_retention_minutes(
        retention_minutes,
    )?);
    let alert_log = Arc::new(history_repo::AlertLog::with_retention_minutes(
        retention_minutes,
    )?);
    let collection_state = Arc::new(worker::CollectionState::default());
    let augmenter = insights::InsightAugmenter::from_config(&app_config.insights)?;
    let http_client = reqwest::Client::builder()
        .user_agent(version::user_agent())
        .build()?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            source: source.clone(),
            metrics_store: metrics_store.clone(),
            alert_log: alert_log.clone(),
            state: collection_state.clone(),
            shutdown_rx,
        },
        worker::WorkerConfig {
            sample_interval: std::time::Duration::from_secs(app_config.collection.interval_secs),
            stats_log_interval_secs: app_config.collection.stats_log_interval_secs,
            thresholds: app_config.thresholds.clone(),
        },
    );

    let app = routes::app(routes::AppState {
        metrics_store,
        alert_log,
        source,
        collection: collection_state,
        insights: augmenter,
        http_client,
        config: app_config.clone(),
    });
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = worker_handle.await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
