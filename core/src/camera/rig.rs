use glam::Vec3;
use thiserror::Error;

use super::CameraPose;
use crate::Phase;

/// Errors detected while building a [`CameraRig`].
///
/// These are configuration defects: they surface when the rig is built, never
/// while frames are being rendered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RigError {
    #[error("camera rig has no pose for phase {0}")]
    MissingPose(Phase),
    #[error("camera rig defines phase {0} more than once")]
    DuplicatePose(Phase),
    #[error("camera pose for phase {0} has non-finite coordinates")]
    NonFinite(Phase),
}

/// Fixed mapping from [`Phase`] to [`CameraPose`].
///
/// Stored as an array indexed by [`Phase::index`], so lookup is total by
/// construction: a rig either has a pose for every phase or does not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    poses: [CameraPose; Phase::COUNT],
}

impl CameraRig {
    /// The courtroom framings.
    pub fn courtroom() -> Self {
        Self {
            poses: [
                // Lobby: wide shot from behind the gallery.
                CameraPose::new(Vec3::new(0.0, 10.0, 2.0), Vec3::new(0.0, 5.0, -14.0)),
                // Judge talking: low shot up at the bench.
                CameraPose::new(Vec3::new(0.0, 6.0, 2.0), Vec3::new(0.0, 8.0, -15.0)),
                // Prosecutor: over the judge's left shoulder.
                CameraPose::new(Vec3::new(3.0, 11.0, -17.0), Vec3::new(11.0, 3.0, 5.0)),
                // Defense: over the judge's right shoulder.
                CameraPose::new(Vec3::new(-3.0, 11.0, -17.0), Vec3::new(-11.0, 3.0, 5.0)),
            ],
        }
    }

    /// Build a rig from explicit `(phase, pose)` entries.
    ///
    /// Every phase must appear exactly once.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Phase, CameraPose)>,
    ) -> Result<Self, RigError> {
        let mut slots: [Option<CameraPose>; Phase::COUNT] = [None; Phase::COUNT];

        for (phase, pose) in entries {
            if !pose.is_finite() {
                return Err(RigError::NonFinite(phase));
            }
            let slot = &mut slots[phase.index()];
            if slot.is_some() {
                return Err(RigError::DuplicatePose(phase));
            }
            *slot = Some(pose);
        }

        let mut poses = [CameraPose::new(Vec3::ZERO, Vec3::ZERO); Phase::COUNT];
        for phase in Phase::ALL {
            poses[phase.index()] = slots[phase.index()].ok_or(RigError::MissingPose(phase))?;
        }
        Ok(Self { poses })
    }

    /// Start from this rig and replace the poses of the given phases.
    pub fn with_overrides(
        &self,
        overrides: impl IntoIterator<Item = (Phase, CameraPose)>,
    ) -> Result<Self, RigError> {
        let mut rig = self.clone();
        for (phase, pose) in overrides {
            if !pose.is_finite() {
                return Err(RigError::NonFinite(phase));
            }
            rig.poses[phase.index()] = pose;
        }
        Ok(rig)
    }

    /// The pose framing `phase`.
    pub fn pose(&self, phase: Phase) -> &CameraPose {
        &self.poses[phase.index()]
    }

    /// Iterate over `(phase, pose)` in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, &CameraPose)> {
        Phase::ALL.into_iter().map(|phase| (phase, self.pose(phase)))
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::courtroom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(x: f32) -> CameraPose {
        CameraPose::new(Vec3::splat(x), Vec3::splat(-x))
    }

    #[test]
    fn courtroom_lobby_pose() {
        let rig = CameraRig::courtroom();
        let lobby = rig.pose(Phase::Lobby);
        assert_eq!(lobby.position, Vec3::new(0.0, 10.0, 2.0));
        assert_eq!(lobby.look_at, Vec3::new(0.0, 5.0, -14.0));
    }

    #[test]
    fn litigant_shots_are_mirrored() {
        let rig = CameraRig::courtroom();
        let p = rig.pose(Phase::ProsecutorTalking);
        let d = rig.pose(Phase::DefenseTalking);
        assert_eq!(p.position.x, -d.position.x);
        assert_eq!(p.look_at.x, -d.look_at.x);
        assert_eq!(p.position.y, d.position.y);
        assert_eq!(p.position.z, d.position.z);
    }

    #[test]
    fn from_entries_requires_every_phase() {
        let err = CameraRig::from_entries([
            (Phase::Lobby, pose(1.0)),
            (Phase::JudgeTalking, pose(2.0)),
            (Phase::DefenseTalking, pose(3.0)),
        ])
        .unwrap_err();
        assert_eq!(err, RigError::MissingPose(Phase::ProsecutorTalking));
    }

    #[test]
    fn from_entries_rejects_duplicates() {
        let err = CameraRig::from_entries([
            (Phase::Lobby, pose(1.0)),
            (Phase::Lobby, pose(2.0)),
        ])
        .unwrap_err();
        assert_eq!(err, RigError::DuplicatePose(Phase::Lobby));
    }

    #[test]
    fn from_entries_rejects_nan() {
        let bad = CameraPose::new(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ZERO);
        let err = CameraRig::from_entries([(Phase::JudgeTalking, bad)]).unwrap_err();
        assert_eq!(err, RigError::NonFinite(Phase::JudgeTalking));
    }

    #[test]
    fn from_entries_accepts_any_order() {
        let rig = CameraRig::from_entries(
            Phase::ALL
                .into_iter()
                .rev()
                .map(|phase| (phase, pose(phase.index() as f32))),
        )
        .unwrap();
        for phase in Phase::ALL {
            assert_eq!(rig.pose(phase), &pose(phase.index() as f32));
        }
    }

    #[test]
    fn overrides_replace_only_named_phases() {
        let base = CameraRig::courtroom();
        let rig = base
            .with_overrides([(Phase::JudgeTalking, pose(7.0))])
            .unwrap();
        assert_eq!(rig.pose(Phase::JudgeTalking), &pose(7.0));
        assert_eq!(rig.pose(Phase::Lobby), base.pose(Phase::Lobby));
    }
}
