// Server module entry point
// Listener setup, accept loop, per-connection tasks and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// Rust doesn't allow `loop` as a module name (keyword), use server_loop instead
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used items
pub use listener::create_listener;
pub use server_loop::start_server_loop;
pub use signal::shutdown_signal;
