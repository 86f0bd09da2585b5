//! Scene configuration loaded from `court.toml`.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::{
    CameraInterpolator, CameraPose, CameraRig, DEFAULT_BLEND_FACTOR, InterpolationError, RigError,
};
use crate::phase::{Phase, UnrecognizedPhase};

/// Field of view used when the config does not name one (radians).
pub const DEFAULT_FIELD_OF_VIEW: f32 = 0.9;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid camera rig: {0}")]
    Rig(#[from] RigError),
    #[error("invalid blend factor: {0}")]
    BlendFactor(#[from] InterpolationError),
    #[error("invalid [[camera]] entry: {0}")]
    Phase(#[from] UnrecognizedPhase),
    #[error("field of view must be between 0 and pi radians, got {0}")]
    FieldOfView(f32),
}

/// Top-level configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtConfig {
    /// Fraction of the remaining camera distance closed per frame.
    pub blend_factor: f32,
    /// Vertical field of view in radians.
    pub field_of_view: f32,
    pub assets: AssetPaths,
    /// Per-phase overrides of the built-in camera rig.
    #[serde(rename = "camera", skip_serializing_if = "Vec::is_empty")]
    pub cameras: Vec<CameraEntry>,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            blend_factor: DEFAULT_BLEND_FACTOR,
            field_of_view: DEFAULT_FIELD_OF_VIEW,
            assets: AssetPaths::default(),
            cameras: Vec::new(),
        }
    }
}

/// Where the three courtroom models live, relative to `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub root: String,
    pub environment: String,
    pub judge: String,
    pub person: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            root: "assets".into(),
            environment: "models/environment.glb".into(),
            judge: "models/judge.glb".into(),
            person: "models/person.glb".into(),
        }
    }
}

/// One `[[camera]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraEntry {
    pub phase: String,
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CourtConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        log::info!(
            "Loaded config {} ({} camera overrides)",
            path.display(),
            config.cameras.len()
        );
        Ok(config)
    }

    /// Load `path`, falling back to defaults when it is absent.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// The courtroom rig with this config's overrides applied.
    pub fn rig(&self) -> Result<CameraRig, ConfigError> {
        let overrides = self
            .cameras
            .iter()
            .map(|entry| {
                let phase: Phase = entry.phase.parse()?;
                Ok((phase, CameraPose::new(entry.position, entry.look_at)))
            })
            .collect::<Result<Vec<_>, UnrecognizedPhase>>()?;

        let mut seen = [false; Phase::COUNT];
        for (phase, _) in &overrides {
            if std::mem::replace(&mut seen[phase.index()], true) {
                return Err(RigError::DuplicatePose(*phase).into());
            }
        }

        Ok(CameraRig::courtroom().with_overrides(overrides)?)
    }

    pub fn interpolator(&self) -> Result<CameraInterpolator, ConfigError> {
        Ok(CameraInterpolator::new(self.blend_factor)?)
    }

    /// Vertical field of view, checked to lie strictly inside (0, pi).
    pub fn field_of_view_radians(&self) -> Result<f32, ConfigError> {
        let fov = self.field_of_view;
        if fov > 0.0 && fov < std::f32::consts::PI {
            Ok(fov)
        } else {
            Err(ConfigError::FieldOfView(fov))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_file_gives_defaults() {
        let config = CourtConfig::from_toml("").unwrap();
        assert_eq!(config, CourtConfig::default());
        assert_eq!(config.rig().unwrap(), CameraRig::courtroom());
        assert_eq!(config.interpolator().unwrap().factor(), 0.05);
    }

    #[test]
    fn camera_override_replaces_one_phase() {
        let config = CourtConfig::from_toml(
            r#"
            blend_factor = 0.1

            [assets]
            root = "https://cdn.example.com/court"

            [[camera]]
            phase = "judge_talking"
            position = [0.0, 7.0, 1.0]
            look_at = [0.0, 8.0, -15.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.assets.root, "https://cdn.example.com/court");
        assert_eq!(config.assets.judge, "models/judge.glb");

        let rig = config.rig().unwrap();
        assert_eq!(
            rig.pose(Phase::JudgeTalking).position,
            Vec3::new(0.0, 7.0, 1.0)
        );
        assert_eq!(
            rig.pose(Phase::Lobby),
            CameraRig::courtroom().pose(Phase::Lobby)
        );
    }

    #[test]
    fn unknown_phase_is_reported() {
        let config = CourtConfig::from_toml(
            r#"
            [[camera]]
            phase = "jury_talking"
            position = [0.0, 0.0, 0.0]
            look_at = [0.0, 0.0, 1.0]
            "#,
        )
        .unwrap();
        assert!(matches!(config.rig(), Err(ConfigError::Phase(_))));
    }

    #[test]
    fn duplicate_override_is_rejected() {
        let entry = CameraEntry {
            phase: "lobby".into(),
            position: Vec3::ONE,
            look_at: Vec3::ZERO,
        };
        let config = CourtConfig {
            cameras: vec![entry.clone(), entry],
            ..CourtConfig::default()
        };
        assert!(matches!(
            config.rig(),
            Err(ConfigError::Rig(RigError::DuplicatePose(Phase::Lobby)))
        ));
    }

    #[test]
    fn zero_blend_factor_is_rejected() {
        let config = CourtConfig::from_toml("blend_factor = 0.0").unwrap();
        assert!(matches!(
            config.interpolator(),
            Err(ConfigError::BlendFactor(_))
        ));
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-0.5)]
    #[case::straight(std::f32::consts::PI)]
    #[case::nan(f32::NAN)]
    fn degenerate_field_of_view_is_rejected(#[case] fov: f32) {
        let config = CourtConfig {
            field_of_view: fov,
            ..CourtConfig::default()
        };
        assert!(matches!(
            config.field_of_view_radians(),
            Err(ConfigError::FieldOfView(_))
        ));
    }

    #[test]
    fn default_field_of_view_is_valid() {
        assert_eq!(
            CourtConfig::default().field_of_view_radians().unwrap(),
            DEFAULT_FIELD_OF_VIEW
        );
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            CourtConfig::from_toml("blend_factor = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = CourtConfig::load(Path::new("/definitely/not/here/court.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
