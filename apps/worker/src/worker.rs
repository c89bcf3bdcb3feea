//! Queue Consumer — pulls job-search requests off the durable queue and
//! drives the pipeline for each, one message at a time.
//!
//! Acknowledgment policy: ack only after the full per-request loop completes
//! (partial per-link failure still acks); malformed payloads and unexpected
//! orchestrator errors reject WITHOUT requeue so a poison message cannot
//! loop forever. Lost requests are not retried automatically.

use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};

use crate::errors::WorkerError;
use crate::models::job::JobSearchRequest;
use crate::pipeline::{process_request, PipelineDeps};
use crate::queue::MessageQueue;

/// Delay before re-polling after a queue transport error.
const POLL_RETRY_SECS: u64 = 5;

/// Runs the consume loop until ctrl-c / SIGTERM.
///
/// Transient queue errors (a dropped connection, a failed poll) are logged
/// and retried after a short delay rather than stopping the worker.
/// Shutdown is observed between messages only; a dequeue cancelled mid-poll
/// can leave its payload on the processing list for manual recovery.
pub async fn run(queue: &dyn MessageQueue, deps: &PipelineDeps) -> Result<()> {
    info!("Worker started; waiting for messages...");

    loop {
        tokio::select! {
            _ = shutdown_signal() => {
                info!("Shutdown signal received; stopping worker");
                break;
            }
            message = queue.dequeue() => {
                match message {
                    Ok(Some(payload)) => {
                        if let Err(e) = handle_message(queue, deps, &payload).await {
                            error!(
                                "Could not settle message ({e}); payload stays on the \
                                 processing list"
                            );
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!("Queue poll failed ({e}); retrying in {POLL_RETRY_SECS}s");
                        tokio::time::sleep(Duration::from_secs(POLL_RETRY_SECS)).await;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Processes one raw queue payload and settles it (ack or reject).
/// Returned errors are queue-transport failures only — processing failures
/// are settled here and never escape.
async fn handle_message(
    queue: &dyn MessageQueue,
    deps: &PipelineDeps,
    payload: &str,
) -> Result<()> {
    info!("Received message from queue");

    let request: JobSearchRequest = match serde_json::from_str(payload) {
        Ok(request) => request,
        Err(e) => {
            let e = WorkerError::MalformedMessage(e);
            error!("{e}; rejecting without requeue");
            queue.reject(payload).await?;
            return Ok(());
        }
    };

    match process_request(deps, &request).await {
        Ok(summary) => {
            info!(
                "Processed request for user {}: {} discovered, {} persisted, {} failed",
                request.user_id, summary.discovered, summary.persisted, summary.failed
            );
            queue.ack(payload).await?;
        }
        Err(e) => {
            error!("Request processing failed ({e}); rejecting without requeue");
            queue.reject(payload).await?;
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {e}");
            // ctrl-c alone still works
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
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
