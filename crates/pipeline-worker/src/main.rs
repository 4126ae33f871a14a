use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pipeline_orchestrator::Orchestrator;
use pipeline_store::{ArtifactStore, RunRepository, SchemaRegistry, TaskRepository, VideoRepository};
use pipeline_worker::config::WorkerSettings;
use pipeline_worker::pool::WorkerPool;
use pipeline_worker::producer_client::ProducerClient;
use pipeline_worker::task_executor::TaskExecutor;
use pipeline_worker::{reconciler, GpuGate};

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env())
        .init();

    info!("starting pipeline-worker");

    let settings = WorkerSettings::from_env();
    info!(profile = %settings.pipeline.processing_profile, "loaded configuration");

    let pool = match pipeline_store::connect(&settings.pipeline.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = pipeline_store::run_migrations(&pool).await {
        error!(error = %e, "failed to run migrations");
        std::process::exit(1);
    }

    let orchestrator = match Orchestrator::new(pool.clone(), &settings.pipeline.redis_url).await {
        Ok(orchestrator) => Arc::new(orchestrator),
        Err(e) => {
            error!(error = %e, "failed to initialize orchestrator");
            std::process::exit(1);
        }
    };

    let tasks = TaskRepository::new(pool.clone());
    let videos = VideoRepository::new(pool.clone());
    let artifacts = ArtifactStore::new(pool.clone(), SchemaRegistry::with_builtin_schemas());
    let runs = RunRepository::new(pool.clone());
    let producer = ProducerClient::from_env();
    let gpu_gate = GpuGate::new(settings.pipeline.gpu_concurrency);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles = Vec::new();

    for task_type in pipeline_models::TaskType::ALL {
        let worker_config = *settings
            .profile
            .get(task_type)
            .expect("every processing profile covers every task type");

        let executor = Arc::new(TaskExecutor::new(
            Arc::clone(&orchestrator),
            artifacts.clone(),
            runs.clone(),
            producer.clone(),
            Duration::from_secs(worker_config.task_timeout_seconds),
        ));

        let pool_for_type = Arc::new(WorkerPool::new(
            worker_config,
            tasks.clone(),
            videos.clone(),
            executor,
            Some(gpu_gate.clone()),
        ));

        handles.extend(pool_for_type.spawn(shutdown_rx.clone()));
    }

    let stall_threshold = chrono::Duration::from_std(settings.pipeline.stall_threshold)
        .unwrap_or_else(|_| chrono::Duration::hours(1));

    handles.push(reconciler::spawn(
        Arc::clone(&orchestrator),
        settings.pipeline.reconcile_interval,
        stall_threshold,
        shutdown_rx.clone(),
    ));

    tokio::signal::ctrl_c().await.ok();
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        let _ = handle.await;
    }

    info!("pipeline-worker shutdown complete");
}
