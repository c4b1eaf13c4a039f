//! Request payloads.
//!
//! A [`Body`] is either held in memory or backed by a file that is only opened
//! when the transport reads it, so uploading a large file never buffers it
//! while the command is still travelling through the pipeline.

use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::AsyncRead;

/// The payload of a command parameter or a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// No payload.
    #[default]
    Empty,
    /// An in-memory payload.
    Bytes(Bytes),
    /// A file opened lazily on first read.
    File(PathBuf),
}

impl Body {
    /// A body streamed from the file at `path`. The file is not touched here.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// The backing resource of a streamed body, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            _ => None,
        }
    }

    /// The backing resource as a URI-like string (used for MIME inference).
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.path().and_then(Path::to_str)
    }

    /// Whether the payload has to be read from disk.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// The in-memory bytes, if the body is not streamed.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Empty => Some(&[]),
            Self::Bytes(bytes) => Some(bytes),
            Self::File(_) => None,
        }
    }

    /// Open the body for reading.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from opening a file-backed body.
    pub async fn open(&self) -> std::io::Result<Pin<Box<dyn AsyncRead + Send>>> {
        match self {
            Self::Empty => Ok(Box::pin(tokio::io::empty())),
            Self::Bytes(bytes) => Ok(Box::pin(std::io::Cursor::new(bytes.clone()))),
            Self::File(path) => Ok(Box::pin(tokio::fs::File::open(path).await?)),
        }
    }

    /// Read the whole payload into memory.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from reading a file-backed body.
    pub async fn collect(&self) -> std::io::Result<Bytes> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::File(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::Bytes(Bytes::from(s))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(s.as_bytes()))
    }
}
