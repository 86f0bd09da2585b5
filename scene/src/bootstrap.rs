//! Asynchronous half of courtroom construction.
//!
//! [`load_courtroom`] fetches and decodes the three models in a fixed order,
//! checking the cancellation token before each fetch and after each one
//! completes. Nothing touches the scene here: the result is handed to
//! [`CourtroomScene::install`](crate::CourtroomScene::install) on the render
//! tick, so a failed or cancelled load leaves the scene exactly as it was.

use std::sync::Arc;

use circuit_court_core::AssetPaths;
use thiserror::Error;

use crate::animation::JudgeAnimator;
use crate::assets::{AssetError, AssetSource};
use crate::cancel::{CancellationToken, Cancelled};
use crate::model::{ModelAsset, ModelError};

/// Relative paths of the courtroom models inside an asset source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    pub environment: String,
    pub judge: String,
    pub person: String,
}

impl AssetManifest {
    pub fn from_paths(paths: &AssetPaths) -> Self {
        Self {
            environment: paths.environment.clone(),
            judge: paths.judge.clone(),
            person: paths.person.clone(),
        }
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self::from_paths(&AssetPaths::default())
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to load {asset} asset: {source}")]
    AssetLoad {
        asset: &'static str,
        #[source]
        source: AssetError,
    },
    #[error("invalid {asset} model: {source}")]
    Model {
        asset: &'static str,
        #[source]
        source: ModelError,
    },
    #[error("courtroom loading was cancelled")]
    Cancelled,
}

impl From<Cancelled> for BootstrapError {
    fn from(_: Cancelled) -> Self {
        BootstrapError::Cancelled
    }
}

/// Everything [`load_courtroom`] produced, ready to install.
#[derive(Debug, Clone)]
pub struct LoadedCourtroom {
    pub environment: ModelAsset,
    pub judge: ModelAsset,
    pub person: ModelAsset,
    pub judge_animator: JudgeAnimator,
}

/// Load environment, judge and person models, in that order.
pub async fn load_courtroom(
    source: Arc<dyn AssetSource>,
    manifest: AssetManifest,
    token: CancellationToken,
) -> Result<LoadedCourtroom, BootstrapError> {
    log::info!("Loading courtroom from {}", source.describe());

    let environment = load_model(&*source, "environment", &manifest.environment, &token).await?;
    let judge = load_model(&*source, "judge", &manifest.judge, &token).await?;
    let person = load_model(&*source, "person", &manifest.person, &token).await?;

    let judge_animator = JudgeAnimator::new(&judge).map_err(|source| BootstrapError::Model {
        asset: "judge",
        source,
    })?;

    log::info!("Courtroom assets loaded");
    Ok(LoadedCourtroom {
        environment,
        judge,
        person,
        judge_animator,
    })
}

async fn load_model(
    source: &dyn AssetSource,
    asset: &'static str,
    path: &str,
    token: &CancellationToken,
) -> Result<ModelAsset, BootstrapError> {
    token.check()?;
    log::debug!("fetching {asset} model {path}");

    let bytes = source
        .read(path)
        .await
        .map_err(|source| BootstrapError::AssetLoad { asset, source })?;
    token.check()?;

    ModelAsset::decode(asset, &bytes).map_err(|source| BootstrapError::Model { asset, source })
}
