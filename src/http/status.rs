//! Response status codes
//!
//! Only the four outcomes the file server can produce.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    NotImplemented,
}

impl Status {
    /// Statuses answered with a fixed document from the server root
    pub const ERRORS: [Self; 3] = [Self::BadRequest, Self::NotFound, Self::NotImplemented];

    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::NotImplemented => 501,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::NotImplemented => "Not Implemented",
        }
    }

    /// File name of the fixed document in the server root, if any
    pub const fn document(self) -> Option<&'static str> {
        match self {
            Self::Ok => None,
            Self::BadRequest => Some("400.html"),
            Self::NotFound => Some("404.html"),
            Self::NotImplemented => Some("501.html"),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}
