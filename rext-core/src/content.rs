//! Document content sources
//!
//! Callers hand content over either fully materialized or as a streaming
//! source; either way the engine drains it to completion before an operation
//! reports success, and a mid-stream error becomes the operation's error.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::error::Result;

/// A finite byte source supplied by the caller
///
/// The engine treats content as opaque; it is never interpreted, only
/// persisted byte for byte.
pub enum Content {
    /// Fully materialized bytes
    Bytes(Bytes),
    /// A readable byte source, drained to end-of-stream
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    /// A chunked byte stream, drained to completion
    Stream(BoxStream<'static, std::io::Result<Bytes>>),
}

impl Content {
    /// Wrap an async reader
    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// Wrap a chunked byte stream
    pub fn from_stream(
        stream: impl futures::Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    ) -> Self {
        Self::Stream(stream.boxed())
    }

    /// Persist the entire source to `path`
    ///
    /// Writes to a sibling temp file first and renames into place, so a
    /// partially drained source never replaces existing content.
    pub(crate) async fn write_to(self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("tmp");

        let write = async {
            match self {
                Content::Bytes(data) => {
                    tokio::fs::write(&tmp, &data).await?;
                }
                Content::Reader(mut reader) => {
                    let mut file = tokio::fs::File::create(&tmp).await?;
                    tokio::io::copy(&mut reader, &mut file).await?;
                    file.flush().await?;
                }
                Content::Stream(mut stream) => {
                    let mut file = tokio::fs::File::create(&tmp).await?;
                    while let Some(chunk) = stream.next().await {
                        file.write_all(&chunk?).await?;
                    }
                    file.flush().await?;
                }
            }
            Ok::<_, std::io::Error>(())
        };

        if let Err(e) = write.await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

impl From<Bytes> for Content {
    fn from(data: Bytes) -> Self {
        Self::Bytes(data)
    }
}

impl From<Vec<u8>> for Content {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(data))
    }
}

impl From<&str> for Content {
    fn from(data: &str) -> Self {
        Self::Bytes(Bytes::copy_from_slice(data.as_bytes()))
    }
}

impl From<&[u8]> for Content {
    fn from(data: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(data))
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Content::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Content::Reader(_) => f.write_str("Reader(..)"),
            Content::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}
