//! HTTP protocol layer module
//!
//! Request head parsing, status codes, MIME detection, body encoding and
//! response framing. Knows nothing about the filesystem layout.

pub mod encoding;
pub mod mime;
pub mod request;
pub mod response;
pub mod status;

// Re-export commonly used types
pub use encoding::{BodyEncoder, ResponseEncoding};
pub use request::{parse_request, Request};
pub use response::{http_date, ResponseHead, FALLBACK_PROTOCOL};
pub use status::Status;
