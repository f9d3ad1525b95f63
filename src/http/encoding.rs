//! Response body encoding
//!
//! Negotiates identity or gzip transfer from `Accept-Encoding` and streams the
//! body through the chosen encoder.

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseEncoding {
    Identity,
    Gzip,
}

impl ResponseEncoding {
    /// Gzip whenever the header mentions `gzip` anywhere. No q-value parsing.
    pub fn negotiate(accept_encoding: &str) -> Self {
        if accept_encoding.contains("gzip") {
            Self::Gzip
        } else {
            Self::Identity
        }
    }

    /// Value of the `Content-Encoding` header, absent for identity
    pub const fn header_value(self) -> Option<&'static str> {
        match self {
            Self::Identity => None,
            Self::Gzip => Some("gzip"),
        }
    }
}

/// Output transform for the response body
pub enum BodyEncoder<W> {
    Identity(BufWriter<W>),
    Gzip {
        sink: W,
        encoder: GzEncoder<Vec<u8>>,
    },
}

impl<W> BodyEncoder<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(encoding: ResponseEncoding, sink: W) -> Self {
        match encoding {
            ResponseEncoding::Identity => Self::Identity(BufWriter::new(sink)),
            ResponseEncoding::Gzip => Self::Gzip {
                sink,
                encoder: GzEncoder::new(Vec::new(), Compression::default()),
            },
        }
    }

    pub async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        match self {
            Self::Identity(writer) => writer.write_all(chunk).await,
            Self::Gzip { sink, encoder } => {
                encoder.write_all(chunk)?;
                // Forward whatever the compressor has produced so far
                let pending = encoder.get_mut();
                if !pending.is_empty() {
                    sink.write_all(pending.as_slice()).await?;
                    pending.clear();
                }
                Ok(())
            }
        }
    }

    /// Flush the identity buffer or write the gzip trailer, returning the sink
    pub async fn finish(self) -> io::Result<W> {
        match self {
            Self::Identity(mut writer) => {
                writer.flush().await?;
                Ok(writer.into_inner())
            }
            Self::Gzip { mut sink, encoder } => {
                let tail = encoder.finish()?;
                sink.write_all(&tail).await?;
                sink.flush().await?;
                Ok(sink)
            }
        }
    }
}
