use circuit_court_core::Phase;

use crate::model::{AnimationClip, ModelAsset, ModelError};

/// Index of the judge's idle loop in the judge model.
pub const JUDGE_IDLE_CLIP: usize = 0;
/// Index of the judge's talking loop in the judge model.
pub const JUDGE_TALKING_CLIP: usize = 1;

/// Plays one looping clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPlayer {
    clip: usize,
    duration: f32,
    time: f32,
}

impl AnimationPlayer {
    /// Start `clip` (the clip at index `index`) from time 0.
    pub fn new(index: usize, clip: &AnimationClip) -> Self {
        Self {
            clip: index,
            duration: clip.duration,
            time: 0.0,
        }
    }

    /// Switch to another clip, restarting at time 0.
    pub fn play(&mut self, index: usize, clip: &AnimationClip) {
        *self = Self::new(index, clip);
    }

    /// Advance playback by `dt` seconds, wrapping at the clip's end.
    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.time = if self.duration > 0.0 {
            (self.time + dt).rem_euclid(self.duration)
        } else {
            0.0
        };
    }

    pub fn clip(&self) -> usize {
        self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

/// Keeps the judge idling, and talking while the judge has the floor.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeAnimator {
    idle: AnimationClip,
    talking: AnimationClip,
    player: AnimationPlayer,
}

impl JudgeAnimator {
    /// Requires the idle and talking clips to exist in `judge`.
    /// Starts on the idle loop.
    pub fn new(judge: &ModelAsset) -> Result<Self, ModelError> {
        let idle = judge.animation(JUDGE_IDLE_CLIP)?.clone();
        let talking = judge.animation(JUDGE_TALKING_CLIP)?.clone();
        let player = AnimationPlayer::new(JUDGE_IDLE_CLIP, &idle);
        Ok(Self {
            idle,
            talking,
            player,
        })
    }

    pub fn update(&mut self, phase: Phase, dt: f32) {
        let wanted = match phase {
            Phase::JudgeTalking => JUDGE_TALKING_CLIP,
            Phase::Lobby | Phase::ProsecutorTalking | Phase::DefenseTalking => JUDGE_IDLE_CLIP,
        };
        if wanted != self.player.clip() {
            let clip = if wanted == JUDGE_TALKING_CLIP {
                &self.talking
            } else {
                &self.idle
            };
            log::debug!("judge animation -> {}", clip.name);
            self.player.play(wanted, clip);
        }
        self.player.advance(dt);
    }

    pub fn player(&self) -> &AnimationPlayer {
        &self.player
    }

    pub fn current_clip_name(&self) -> &str {
        if self.player.clip() == JUDGE_TALKING_CLIP {
            &self.talking.name
        } else {
            &self.idle.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::gltf_json;

    fn judge() -> ModelAsset {
        ModelAsset::decode("judge", &gltf_json(&["Judge"], &[("Idle", 2.0), ("Talk", 1.0)]))
            .unwrap()
    }

    #[test]
    fn player_wraps_at_duration() {
        let clip = AnimationClip {
            name: "Idle".into(),
            duration: 2.0,
        };
        let mut player = AnimationPlayer::new(0, &clip);
        player.advance(1.5);
        player.advance(1.0);
        assert!((player.time() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn zero_length_clip_stays_at_start() {
        let clip = AnimationClip {
            name: "Pose".into(),
            duration: 0.0,
        };
        let mut player = AnimationPlayer::new(0, &clip);
        player.advance(0.3);
        assert_eq!(player.time(), 0.0);
    }

    #[test]
    fn judge_talks_only_while_judge_talking() {
        let mut animator = JudgeAnimator::new(&judge()).unwrap();
        assert_eq!(animator.player().clip(), JUDGE_IDLE_CLIP);

        animator.update(Phase::Lobby, 0.5);
        assert_eq!(animator.current_clip_name(), "Idle");

        animator.update(Phase::JudgeTalking, 0.25);
        assert_eq!(animator.current_clip_name(), "Talk");
        assert!((animator.player().time() - 0.25).abs() < 1e-5);

        animator.update(Phase::DefenseTalking, 0.0);
        assert_eq!(animator.player().clip(), JUDGE_IDLE_CLIP);
        assert_eq!(animator.player().time(), 0.0);
    }

    #[test]
    fn judge_without_talking_clip_is_rejected() {
        let model =
            ModelAsset::decode("judge", &gltf_json(&["Judge"], &[("Idle", 2.0)])).unwrap();
        assert!(matches!(
            JudgeAnimator::new(&model),
            Err(ModelError::MissingAnimation { index: 1, .. })
        ));
    }
}
