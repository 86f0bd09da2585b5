use std::future::Future;
use std::io::Read;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use super::{AssetError, AssetFuture, AssetSource, failed, normalize};

/// Largest asset the HTTP source will download.
const MAX_ASSET_BYTES: u64 = 256 * 1024 * 1024;

/// Asset source that fetches from a base URL.
///
/// Each read spawns a helper thread running a blocking `ureq` request. The
/// returned future stays pending until that thread delivers the bytes.
pub struct HttpAssets {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpAssets {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            base_url,
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl AssetSource for HttpAssets {
    fn read(&self, path: &str) -> AssetFuture<Vec<u8>> {
        let relative = match normalize(path) {
            Ok(relative) => relative,
            Err(err) => return failed(err),
        };
        let url = self.url_for(&relative);
        let agent = self.agent.clone();
        let slot = Arc::new(Mutex::new(Slot::default()));

        let thread_slot = slot.clone();
        let spawned = std::thread::Builder::new()
            .name("asset-http".into())
            .spawn(move || {
                let result = fetch(&agent, &url);
                let mut slot = match thread_slot.lock() {
                    Ok(slot) => slot,
                    Err(poisoned) => poisoned.into_inner(),
                };
                slot.result = Some(result);
                if let Some(waker) = slot.waker.take() {
                    waker.wake();
                }
            });

        if let Err(err) = spawned {
            return failed(AssetError::Http {
                url: self.url_for(&relative),
                message: format!("failed to spawn request thread: {err}"),
            });
        }
        Box::pin(PendingFetch { slot })
    }

    fn describe(&self) -> String {
        format!("http {}", self.base_url)
    }
}

fn fetch(agent: &ureq::Agent, url: &str) -> Result<Vec<u8>, AssetError> {
    log::debug!("GET {url}");
    let response = agent.get(url).call().map_err(|err| match err {
        ureq::Error::Status(404, _) => AssetError::NotFound(url.to_owned()),
        other => AssetError::Http {
            url: url.to_owned(),
            message: other.to_string(),
        },
    })?;

    let bytes = read_limited(response.into_reader(), MAX_ASSET_BYTES, url)?;
    log::debug!("GET {url}: {} bytes", bytes.len());
    Ok(bytes)
}

/// Read at most `limit` bytes; a longer body is an error rather than a
/// truncated asset.
fn read_limited(reader: impl Read, limit: u64, url: &str) -> Result<Vec<u8>, AssetError> {
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|source| AssetError::Io {
            path: url.to_owned(),
            source,
        })?;
    if bytes.len() as u64 > limit {
        return Err(AssetError::Http {
            url: url.to_owned(),
            message: format!("asset exceeds {limit} bytes"),
        });
    }
    Ok(bytes)
}

#[derive(Default)]
struct Slot {
    result: Option<Result<Vec<u8>, AssetError>>,
    waker: Option<Waker>,
}

struct PendingFetch {
    slot: Arc<Mutex<Slot>>,
}

impl Future for PendingFetch {
    type Output = Result<Vec<u8>, AssetError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        match slot.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
