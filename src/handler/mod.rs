//! Request handler module
//!
//! Turns one connection's request into one response: target selection from
//! the web and server roots, then framing and body transfer.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::RequestHandler;
