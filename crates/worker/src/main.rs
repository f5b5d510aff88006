use std::sync::Arc;

use anyhow::Context;
use rybridge_bus::PgBroker;
use rybridge_db::PgStore;
use rybridge_protocol::LookupTables;
use rybridge_worker::{
    BrokerRemoteState, Consumer, DnsResolver, LogFormat, WorkerConfig, WorkerContext,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = WorkerConfig::from_env()?;

    // --- Tracing ---
    let (pretty, json) = match config.log_format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rybridge_worker=info,rybridge_bus=info".into()),
        )
        .with(pretty)
        .with(json)
        .init();
    tracing::info!(
        job_queue = %config.job_queue,
        prefetch = config.prefetch_count,
        "Loaded worker configuration",
    );

    // --- Database ---
    let pool = rybridge_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    rybridge_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    rybridge_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Worker context ---
    let broker = Arc::new(
        PgBroker::new(pool.clone(), config.broker_poll_interval)
            .with_max_deliveries(config.broker_max_deliveries)
            .with_requeue_backoff(config.broker_requeue_backoff)
            .with_reply_ttl(config.reply_ttl),
    );
    let ctx = Arc::new(WorkerContext {
        store: Arc::new(PgStore::new(pool.clone())),
        broker: broker.clone(),
        remote: Arc::new(BrokerRemoteState::new(broker, config.remote_call_timeout)),
        resolver: Arc::new(DnsResolver),
        tables: Arc::new(LookupTables::new()),
        queues: config.reply_queues.clone(),
    });

    // --- Consumer ---
    let cancel = CancellationToken::new();
    let consumer = Consumer::new(
        ctx,
        config.job_queue.clone(),
        config.prefetch_count,
        config.shutdown_timeout,
    );
    let consumer_cancel = cancel.clone();
    let consumer_handle = tokio::spawn(async move { consumer.run(consumer_cancel).await });

    shutdown_signal().await;
    cancel.cancel();

    match consumer_handle.await {
        Ok(Ok(())) => tracing::info!("Job consumer stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "Job consumer stopped with error"),
        Err(e) => tracing::error!(error = %e, "Job consumer task panicked"),
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
///
/// A handler that cannot be installed is logged and treated as never
/// firing, so the other signal still stops the worker.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
