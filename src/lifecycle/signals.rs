//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals to [`ShutdownRequest`] messages for the coordinator
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGTERM is what orchestrators send on a rolling restart: graceful
//! - SIGINT (Ctrl+C) is an operator abort: immediate
//! - Keeps listening after SIGTERM so a later SIGINT can cut the drain short

use tokio::sync::mpsc;

use crate::lifecycle::shutdown::ShutdownRequest;

/// Forward OS signals as shutdown requests until an immediate one is sent or
/// the coordinator stops listening.
pub async fn forward_signals(requests: mpsc::Sender<ShutdownRequest>) {
    #[cfg(unix)]
    let mut terminate = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(signal) => Some(signal),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler, only Ctrl+C will stop the server");
            None
        }
    };

    loop {
        #[cfg(unix)]
        let request = tokio::select! {
            _ = recv_terminate(&mut terminate) => {
                tracing::info!("SIGTERM received");
                ShutdownRequest::Graceful
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to listen for SIGINT");
                    return;
                }
                tracing::info!("SIGINT received");
                ShutdownRequest::Immediate
            }
        };

        #[cfg(not(unix))]
        let request = match tokio::signal::ctrl_c().await {
            Ok(()) => ShutdownRequest::Immediate,
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
        };

        if requests.send(request).await.is_err() {
            tracing::debug!("Drain coordinator gone, no longer forwarding signals");
            return;
        }
        if request == ShutdownRequest::Immediate {
            return;
        }
    }
}

#[cfg(unix)]
async fn recv_terminate(signal: &mut Option<tokio::signal::unix::Signal>) {
    match signal {
        Some(signal) => {
            if signal.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending().await,
    }
}
