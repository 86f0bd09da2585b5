//! Asset sources.
//!
//! Every source returns boxed, `Send` futures. Nothing drives them except the
//! render loop, which polls the bootstrap future once per frame; sources that
//! need to wait on the network do their blocking work on a helper thread and
//! stay pending until it finishes.
//!
//! Paths are relative and use forward slashes. They are normalized with
//! [`normalize`] before reaching a source.

mod directory;
#[cfg(feature = "http")]
mod http;
mod memory;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use directory::DirectoryAssets;
#[cfg(feature = "http")]
pub use http::HttpAssets;
pub use memory::MemoryAssets;

/// A boxed, `Send` future resolving to an asset result.
pub type AssetFuture<T> = Pin<Box<dyn Future<Output = Result<T, AssetError>> + Send>>;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP request for {url} failed: {message}")]
    Http { url: String, message: String },
    #[error("invalid asset path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
}

/// Where courtroom assets are read from.
pub trait AssetSource: Send + Sync + 'static {
    /// Read the whole asset at `path`.
    fn read(&self, path: &str) -> AssetFuture<Vec<u8>>;

    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;
}

/// Normalize an asset path.
///
/// - Replaces backslashes with forward slashes
/// - Drops empty and `.` segments
/// - Rejects `..` segments
///
/// The result has no leading or trailing slash.
pub fn normalize(path: &str) -> Result<String, AssetError> {
    let replaced = path.replace('\\', "/");
    let mut segments = Vec::new();

    for segment in replaced.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return Err(AssetError::InvalidPath {
                path: path.to_owned(),
                reason: "path traversal (..) not allowed",
            });
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        return Err(AssetError::InvalidPath {
            path: path.to_owned(),
            reason: "empty path",
        });
    }

    Ok(segments.join("/"))
}

/// A future that fails immediately.
pub(crate) fn failed<T: Send + 'static>(error: AssetError) -> AssetFuture<T> {
    Box::pin(async move { Err(error) })
}
