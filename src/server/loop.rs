// Server loop module
// Accepts connections until the shutdown future resolves, then drains them

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};

use super::connection::handle_connection;
use crate::config::Config;
use crate::logger;

/// How long accepted connections get to finish after shutdown is requested
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Accept loop: one tracked handler task per connection.
///
/// Accept errors are logged and the loop keeps going. When `shutdown`
/// resolves the listener is dropped and connections already accepted get
/// `DRAIN_TIMEOUT` to finish; whatever is still running after that is aborted.
pub async fn start_server_loop<F>(listener: TcpListener, config: Arc<Config>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        handle_connection(&mut tasks, stream, peer_addr, Arc::clone(&config));
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                log_join_failure(joined);
            }

            () = &mut shutdown => {
                logger::log_info("No longer accepting connections");
                break;
            }
        }
    }

    drop(listener);
    drain_connections(tasks, DRAIN_TIMEOUT).await;
}

/// Wait for in-flight connections, aborting the rest once `timeout` elapses
async fn drain_connections(mut tasks: JoinSet<()>, timeout: Duration) {
    if tasks.is_empty() {
        return;
    }
    logger::log_info(&format!(
        "Waiting for {} in-flight connection(s)",
        tasks.len()
    ));

    let drained = tokio::time::timeout(timeout, async {
        while let Some(joined) = tasks.join_next().await {
            log_join_failure(joined);
        }
    })
    .await;

    if drained.is_err() {
        logger::log_warning(&format!(
            "Aborting {} connection(s) still open after {}s",
            tasks.len(),
            timeout.as_secs()
        ));
        tasks.shutdown().await;
    }
}

fn log_join_failure(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            logger::log_error(&format!("Connection task panicked: {e}"));
        }
    }
}
