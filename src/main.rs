use std::sync::Arc;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;

use error::StartupError;

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = config::Config::load_from(&config_path).map_err(StartupError::from)?;
    cfg.validate()?;
    logger::init(&cfg).map_err(StartupError::Log)?;

    // Build the Tokio runtime, sizing the worker pool from config when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    logger::log_server_start(&listener.local_addr()?, &cfg);

    server::start_server_loop(listener, Arc::new(cfg), server::shutdown_signal()).await;
    Ok(())
}
