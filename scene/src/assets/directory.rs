use std::path::PathBuf;

use super::{AssetError, AssetFuture, AssetSource, failed, normalize};

/// Asset source rooted at a directory on disk.
///
/// Reads are blocking (`std::fs`) inside the returned future, so they complete
/// on the first poll. Traversal outside the root is rejected by [`normalize`].
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    /// The directory does not need to exist yet; it is checked at read time.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl AssetSource for DirectoryAssets {
    fn read(&self, path: &str) -> AssetFuture<Vec<u8>> {
        let relative = match normalize(path) {
            Ok(relative) => relative,
            Err(err) => return failed(err),
        };
        let full_path = self.root.join(&relative);
        Box::pin(async move {
            std::fs::read(&full_path).map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    AssetError::NotFound(full_path.display().to_string())
                } else {
                    AssetError::Io {
                        path: full_path.display().to_string(),
                        source,
                    }
                }
            })
        })
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}
