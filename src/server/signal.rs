// Signal handling module
//
// - SIGTERM: stop accepting connections
// - SIGINT:  stop accepting connections (Ctrl+C)

use crate::logger;

/// Resolves once the process is asked to stop.
///
/// If a handler cannot be registered the error is logged and that signal is
/// simply never observed.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => Some(s),
        Err(e) => {
            logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
            None
        }
    };

    let sigterm = async {
        match sigterm.as_mut() {
            Some(s) => {
                s.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        () = sigterm => logger::log_info("SIGTERM received, shutting down"),
        () = ctrl_c() => logger::log_info("SIGINT received, shutting down"),
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() {
    ctrl_c().await;
    logger::log_info("Ctrl+C received, shutting down");
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
        std::future::pending::<()>().await;
    }
}
