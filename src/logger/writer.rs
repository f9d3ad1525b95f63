//! Log writer module
//!
//! Process-wide sink for access records and operational messages, set up
//! once at startup. Writing never fails the caller.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use super::Level;

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(path) => Ok(Self::File(Mutex::new(open_log_file(path)?))),
            None => Ok(fallback),
        }
    }

    fn write_line(&self, message: &str) {
        // Lost log lines are not worth failing a request over
        let _ = match self {
            Self::Stdout => writeln!(io::stdout().lock(), "{message}"),
            Self::Stderr => writeln!(io::stderr().lock(), "{message}"),
            Self::File(file) => match file.lock() {
                Ok(mut f) => writeln!(f, "{message}"),
                Err(_) => Ok(()),
            },
        };
    }
}

pub struct LogWriter {
    access: LogTarget,
    error: LogTarget,
    level: Level,
}

impl LogWriter {
    fn new(
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
        level: Level,
    ) -> io::Result<Self> {
        Ok(Self {
            access: LogTarget::open(access_log_file, LogTarget::Stdout)?,
            error: LogTarget::open(error_log_file, LogTarget::Stderr)?,
            level,
        })
    }

    /// Access records and info messages
    pub fn write_access(&self, message: &str) {
        self.access.write_line(message);
    }

    /// Warnings and errors
    pub fn write_error(&self, message: &str) {
        self.error.write_line(message);
    }

    pub const fn level(&self) -> Level {
        self.level
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer. Fails if a log file cannot be opened or
/// the writer was already initialized.
pub fn init(
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
    level: Level,
) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file, level)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// The global writer, `None` before `init` (unit tests log to stdio)
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
