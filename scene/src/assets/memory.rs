use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{AssetError, AssetFuture, AssetSource, failed, normalize};

/// In-memory asset source for tests and embedded assets.
///
/// Thread-safe and mutable after being handed to a host.
#[derive(Clone, Default)]
pub struct MemoryAssets {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the asset at `path`.
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        let key = normalize(path).unwrap_or_else(|_| path.to_owned());
        self.lock_write().insert(key, data.into());
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        let key = normalize(path).ok()?;
        self.lock_write().remove(&key)
    }

    pub fn len(&self) -> usize {
        self.lock_read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Poisoning is ignored: every write is a single map operation.
    fn lock_read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<u8>>> {
        self.files.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<u8>>> {
        self.files.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AssetSource for MemoryAssets {
    fn read(&self, path: &str) -> AssetFuture<Vec<u8>> {
        let key = match normalize(path) {
            Ok(key) => key,
            Err(err) => return failed(err),
        };
        let assets = self.clone();
        Box::pin(async move {
            let data = assets.lock_read().get(&key).cloned();
            data.ok_or(AssetError::NotFound(key))
        })
    }

    fn describe(&self) -> String {
        format!("memory ({} assets)", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::poll_once;
    use std::task::Poll;

    #[test]
    fn reads_inserted_asset() {
        let assets = MemoryAssets::new();
        assets.insert("models/judge.glb", b"glTF".to_vec());

        let mut fut = assets.read("/models/judge.glb");
        let Poll::Ready(result) = poll_once(&mut fut) else {
            panic!("memory reads complete immediately");
        };
        assert_eq!(result.unwrap(), b"glTF");
    }

    #[test]
    fn missing_asset_is_not_found() {
        let assets = MemoryAssets::new();
        let mut fut = assets.read("models/none.glb");
        assert!(matches!(
            poll_once(&mut fut),
            Poll::Ready(Err(AssetError::NotFound(_)))
        ));
    }

    #[test]
    fn remove_returns_data() {
        let assets = MemoryAssets::new();
        assets.insert("a.glb", vec![1, 2, 3]);
        assert_eq!(assets.remove("a.glb"), Some(vec![1, 2, 3]));
        assert!(assets.is_empty());
    }

    #[test]
    fn insert_survives_a_poisoned_lock() {
        let assets = MemoryAssets::new();
        let files = assets.files.clone();
        let _ = std::thread::spawn(move || {
            let _guard = files.write().unwrap();
            panic!("poison the asset map");
        })
        .join();
        assert!(assets.files.is_poisoned());

        assets.insert("models/judge.glb", b"glTF".to_vec());
        assert_eq!(assets.len(), 1);
        let mut fut = assets.read("models/judge.glb");
        assert!(matches!(poll_once(&mut fut), Poll::Ready(Ok(_))));
    }
}
