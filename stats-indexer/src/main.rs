use envconfig::Envconfig;
use futures::future::join_all;
use sqlx::postgres::PgPoolOptions;
use stats_indexer::{
    config::Config,
    error::IndexerError,
    metrics_consts::PIPELINES_RUNNING,
    pipelines::spawn_pipeline,
    server,
};
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(log_layer).init();
}

async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        ctrl_c = tokio::signal::ctrl_c() => {
            ctrl_c?;
            info!("received SIGINT");
        }
        _ = sigterm.recv() => info!("received SIGTERM"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), IndexerError> {
    setup_tracing();
    info!("Starting up...");

    let config = Config::init_from_env()?;
    let pipeline_config = config.pipeline_config()?;
    let routes = config.topics.routes();
    if routes.is_empty() {
        return Err(IndexerError::NoTopics);
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_pg_connections)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        info!("running migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    // The recorder has to be installed before any pipeline emits metrics.
    let router = server::router()?;
    let listener = TcpListener::bind(config.bind()).await?;

    let shutdown = CancellationToken::new();
    let mut handles = Vec::with_capacity(routes.len());
    for route in &routes {
        match spawn_pipeline(
            route,
            pipeline_config,
            &config.kafka,
            pool.clone(),
            shutdown.clone(),
        ) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                error!(pipeline = %route.record_type, error = %e, "failed to start pipeline");
                shutdown.cancel();
                join_all(handles).await;
                pool.close().await;
                return Err(e);
            }
        }
    }
    metrics::gauge!(PIPELINES_RUNNING).set(handles.len() as f64);

    let server_shutdown = shutdown.clone();
    let server = tokio::spawn(server::serve(listener, router, async move {
        server_shutdown.cancelled().await
    }));
    info!(bind = %config.bind(), pipelines = handles.len(), "indexer running");

    let signal = wait_for_shutdown_signal().await;
    if let Err(e) = &signal {
        error!(error = %e, "failed to listen for shutdown signals, shutting down");
    }
    shutdown.cancel();

    let mut records_lost = 0;
    for (route, result) in routes.iter().zip(join_all(handles).await) {
        match result {
            Ok(stats) => records_lost += stats.records_lost,
            Err(e) => error!(pipeline = %route.record_type, error = %e, "pipeline task failed"),
        }
    }
    metrics::gauge!(PIPELINES_RUNNING).set(0.0);

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "metrics server failed"),
        Err(e) => error!(error = %e, "metrics server task failed"),
    }

    pool.close().await;
    info!(records_lost, "all pipelines stopped");

    signal?;
    Ok(())
}
