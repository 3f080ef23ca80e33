// HTTP server bootstrap
//
// Binds the API listener, serves until Ctrl-C, then engages the shutdown
// override so a motor that is running gets switched off before exit.

use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::{router, AppState};
use crate::config::Config;
use crate::metrics;
use crate::service::MotorService;

/// Time allowed for the processor to wind down after the server stops
const PROCESSOR_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve `app` on `listener` until `signal` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await
        .context("HTTP server error")
}

/// Build the service from `config` and serve the API until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    if config.metrics.enabled {
        metrics::init().context("Failed to initialize metrics")?;
    }

    let mut service = MotorService::from_config(&config).await?;
    let processor = service.start();
    let app = router(AppState::new(&service), config.metrics.enabled);

    let listener = TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    info!(
        "Motor gate listening on {}",
        listener.local_addr().context("Failed to read local address")?
    );

    serve(listener, app, shutdown_signal()).await?;

    info!("HTTP server stopped, switching motor off");
    service
        .shutdown()
        .force_shutdown("service stopping", "system")
        .await;
    drop(service);

    if let Some(handle) = processor {
        if tokio::time::timeout(PROCESSOR_STOP_TIMEOUT, handle)
            .await
            .is_err()
        {
            warn!("Queue processor did not stop in time");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::RecordingActuator;
    use crate::audit::MemoryAuditLog;
    use crate::clock::SystemClock;
    use crate::config::MotorConfig;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_serve_answers_health_and_stops_on_signal() {
        let service = MotorService::new(
            &MotorConfig::default(),
            Arc::new(RecordingActuator::new()),
            Arc::new(MemoryAuditLog::new()),
            Arc::new(SystemClock),
        );
        let app = router(AppState::new(&service), false);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve(listener, app, async move {
            let _ = stop_rx.await;
        }));

        // No idle keep-alive connection left to hold up the graceful stop
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .unwrap();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert!(response.text().await.unwrap().contains("ok"));

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
