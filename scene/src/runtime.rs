//! The courtroom scene as seen by the render tick.

use circuit_court_core::{CameraInput, CameraInterpolator, CameraRig, CameraState, Phase};
use glam::Vec3;

use crate::animation::JudgeAnimator;
use crate::bootstrap::LoadedCourtroom;
use crate::graph::{Handedness, LightKind, NodeId, SceneGraph};

const CLEAR_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const AMBIENT_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

const JUDGE_POSITION: Vec3 = Vec3::new(0.0, 4.0, -17.0);
const JUDGE_SCALE: f32 = 1.35;

const PERSON_SCALE: f32 = 0.16;
/// Litigants face the bench at this angle off the Z axis.
const LITIGANT_TURN: f32 = 2.7;
const DEFENDANT_POSITION: Vec3 = Vec3::new(-14.0, 0.0, 7.0);
const PROSECUTOR_POSITION: Vec3 = Vec3::new(14.0, 0.0, 7.0);

fn sun_direction() -> Vec3 {
    Vec3::new(1.0, -3.0, -1.0).normalize()
}

/// Result of one [`CourtroomScene::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUpdate {
    /// Bootstrap has not finished; nothing changed.
    NotReady,
    /// The camera blend produced non-finite values and was skipped.
    Skipped,
    Updated,
}

/// Scene runtime: graph, live camera and per-frame behaviour.
///
/// Until [`install`](Self::install) completes the scene is not ready and
/// [`update`](Self::update) changes nothing.
#[derive(Debug)]
pub struct CourtroomScene {
    graph: SceneGraph,
    camera: CameraState,
    rig: Option<CameraRig>,
    interpolator: CameraInterpolator,
    judge: Option<JudgeAnimator>,
    input: CameraInput,
    ready: bool,
}

impl CourtroomScene {
    pub fn new(interpolator: CameraInterpolator) -> Self {
        Self {
            graph: SceneGraph::new(),
            camera: CameraState::default(),
            rig: None,
            interpolator,
            judge: None,
            input: CameraInput::new(),
            ready: false,
        }
    }

    /// Synchronous half of bootstrap: build the courtroom from loaded assets.
    ///
    /// Readiness is set last, so a frame never sees a half-built scene.
    pub fn install(&mut self, loaded: LoadedCourtroom, rig: CameraRig) {
        self.ready = false;
        self.graph.clear();

        self.graph.handedness = Handedness::Right;
        self.graph.clear_color = CLEAR_COLOR;
        self.graph.ambient_color = AMBIENT_COLOR;

        let sun = sun_direction();
        self.graph
            .add_light("sky", LightKind::Hemispheric { direction: -sun }, 1.2);
        self.graph
            .add_light("bounce", LightKind::Hemispheric { direction: sun }, 0.4);
        self.graph
            .add_light("sun", LightKind::Directional { direction: sun }, 0.5);

        self.graph.add_model("Environment", &loaded.environment);

        let judge = self.graph.add_model("Judge", &loaded.judge);
        self.graph.set_translation(judge, JUDGE_POSITION);
        self.graph.set_uniform_scale(judge, JUDGE_SCALE);

        let template = self.graph.add_model("Person", &loaded.person);
        self.graph.set_uniform_scale(template, PERSON_SCALE);
        self.graph.set_enabled(template, false);
        self.place_litigant(template, "Defendant", LITIGANT_TURN, DEFENDANT_POSITION);
        self.place_litigant(template, "Prosecutor", -LITIGANT_TURN, PROSECUTOR_POSITION);

        self.judge = Some(loaded.judge_animator);
        self.rig = Some(rig);
        self.input.attach();

        log::info!("Courtroom installed ({} nodes)", self.graph.len());
        self.ready = true;
    }

    fn place_litigant(&mut self, template: NodeId, name: &str, turn: f32, position: Vec3) {
        let Some(litigant) = self.graph.clone_subtree(template, name) else {
            log::warn!("person template missing; {name} not placed");
            return;
        };
        self.graph.set_enabled(litigant, true);
        self.graph.rotate_y(litigant, turn);
        self.graph.set_translation(litigant, position);
    }

    /// Advance one frame toward the framing of `phase`.
    pub fn update(&mut self, phase: Phase, dt: f32) -> FrameUpdate {
        if !self.ready {
            return FrameUpdate::NotReady;
        }
        let Some(rig) = &self.rig else {
            return FrameUpdate::NotReady;
        };

        self.input.apply(&mut self.camera, dt);

        let outcome = match self.interpolator.step(&mut self.camera, rig.pose(phase)) {
            Ok(()) => FrameUpdate::Updated,
            Err(err) => {
                log::warn!("camera update skipped for {phase}: {err}");
                FrameUpdate::Skipped
            }
        };

        if let Some(judge) = &mut self.judge {
            judge.update(phase, dt);
        }
        outcome
    }

    /// Tear the scene down to its pre-bootstrap state.
    pub fn reset(&mut self) {
        self.ready = false;
        self.graph.clear();
        self.rig = None;
        self.judge = None;
        self.input.detach();
        self.camera = CameraState::default();
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    /// Direct access to the live camera, e.g. to place it before the first frame.
    pub fn camera_mut(&mut self) -> &mut CameraState {
        &mut self.camera
    }

    pub fn rig(&self) -> Option<&CameraRig> {
        self.rig.as_ref()
    }

    pub fn judge(&self) -> Option<&JudgeAnimator> {
        self.judge.as_ref()
    }

    pub fn input_mut(&mut self) -> &mut CameraInput {
        &mut self.input
    }
}
