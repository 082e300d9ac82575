//! CineCore email notification worker (NATS JetStream)
//!
//! ```text
//! NATS JetStream (EMAILS stream, subject "emails")
//!   ↓ (pull consumer: email-worker)
//! QueueConsumer<NotificationRequest, EmailProcessor>
//!   ↓ (renders templates)
//! TemplateRegistry (Handlebars)
//!   ↓ (sends emails)
//! Resend
//! ```
//!
//! An axum server runs alongside for `/healthcheck`, `/ready`, `/metrics`,
//! the service info endpoint and Swagger UI.

pub mod api;
pub mod config;

use crate::api::AppState;
use crate::config::AppConfig;
use core_config::FromEnv;
use email::{
    EmailDispatcher, EmailProcessor, EmailQueue, NotificationRequest, NotificationService,
    ResendProvider, TemplateRegistry,
};
use eyre::{Result, WrapErr, eyre};
use messaging::nats::{QueueConsumer, WorkerConfig, init_metrics};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Run the worker until a termination signal arrives.
///
/// # Errors
///
/// Returns an error if:
/// - configuration is missing or invalid (e.g. `RESEND_API_KEY`)
/// - a bundled template fails to parse
/// - the queue is unreachable or the stream cannot be declared
/// - the HTTP port cannot be bound
/// - the queue consumer stops on its own
pub async fn run() -> Result<()> {
    let config = AppConfig::from_env().wrap_err("Failed to load configuration")?;
    core_config::tracing::init_tracing(&config.environment);

    info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "Starting CineCore email worker"
    );

    let metrics = init_metrics().wrap_err("Failed to install Prometheus recorder")?;

    let (registry, skipped) =
        TemplateRegistry::embedded().wrap_err("Failed to load email templates")?;
    if !skipped.is_empty() {
        warn!(skipped = ?skipped, "Some templates have no bundled source");
    }
    let registry = Arc::new(registry);

    let provider = ResendProvider::new(&config.email.api_key, config.email.timeout)
        .wrap_err("Failed to create Resend client")?;
    let dispatcher = EmailDispatcher::from_config(Arc::new(provider), &config.email);

    info!(
        from_email = %dispatcher.from_email(),
        from_name = %dispatcher.from_name(),
        provider = dispatcher.provider_name(),
        "Email service initialized"
    );

    let service = NotificationService::new(registry.clone(), dispatcher.clone());
    let processor = EmailProcessor::new(service);

    let worker_config = WorkerConfig::from_stream::<EmailQueue>()
        .with_max_deliver(config.worker.max_deliver)
        .with_connect_timeout(config.queue.connect_timeout);

    let mut consumer =
        QueueConsumer::<NotificationRequest, _>::new(&config.queue.url, worker_config, processor);

    consumer
        .connect()
        .await
        .wrap_err_with(|| format!("Failed to connect to NATS at {}", config.queue.url))?;
    consumer
        .start()
        .await
        .wrap_err("Failed to start queue consumer")?;

    let state = AppState {
        registry,
        dispatcher,
        consumer_state: consumer.subscribe_state(),
        metrics,
    };

    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .wrap_err_with(|| format!("Failed to bind HTTP server to {}", address))?;
    info!(address = %address, "HTTP server listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let http = tokio::spawn(serve(listener, api::router(state), shutdown_rx));

    let outcome = tokio::select! {
        signal = shutdown_signal() => signal,
        stopped = consumer.wait_forever() => stopped
            .wrap_err("Queue consumer failed")
            .and_then(|()| Err(eyre!("Queue consumer stopped unexpectedly"))),
    };

    info!("Shutting down");
    let _ = shutdown_tx.send(true);

    if let Err(e) = consumer.close().await {
        error!(error = %e, "Queue consumer did not close cleanly");
    }

    match http.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "HTTP server failed"),
        Err(e) => error!(error = %e, "HTTP server task panicked"),
    }

    outcome?;
    info!("CineCore email worker stopped");
    Ok(())
}

async fn serve(
    listener: TcpListener,
    router: axum::Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        })
        .await
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .wrap_err("Failed to install Ctrl+C handler")
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .wrap_err("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<(), eyre::Report>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        result = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
            result
        },
        result = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
            result
        },
    }
}
