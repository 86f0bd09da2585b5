//! Render loop host lifecycle: bootstrap, failure, retry and teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use circuit_court_core::{CameraRig, ConfigError, CourtConfig, Phase};
use circuit_court_scene::{
    AssetManifest, CameraView, EngineError, FrameOutcome, HeadlessEngine, HostStatus,
    RenderEngine, RenderLoopHost, SceneGraph,
};
use circuit_court_scene::fixtures::{courtroom_assets, GatedAssets};
use glam::Vec3;
use rstest::rstest;

const DT: f32 = 1.0 / 60.0;

fn host_with(source: impl circuit_court_scene::AssetSource) -> RenderLoopHost<HeadlessEngine> {
    RenderLoopHost::new(
        HeadlessEngine::new(1280, 720),
        Arc::new(source),
        AssetManifest::default(),
        &CourtConfig::default(),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[test]
fn memory_assets_render_on_first_frame() {
    let mut host = host_with(courtroom_assets());
    assert_eq!(host.status(), &HostStatus::Loading);

    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Rendered);
    assert_eq!(host.status(), &HostStatus::Ready);
    assert!(host.scene().is_ready());
    assert_eq!(host.engine().frames(), 1);
    assert_eq!(host.engine().last_clear_color(), Some([1.0, 1.0, 1.0, 1.0]));
}

#[rstest]
#[case::environment("models/environment.glb", "environment")]
#[case::judge("models/judge.glb", "judge")]
#[case::person("models/person.glb", "person")]
fn missing_asset_fails_without_installing(#[case] path: &str, #[case] asset: &str) {
    let assets = courtroom_assets();
    assets.remove(path);
    let mut host = host_with(assets);

    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Failed);
    let HostStatus::Failed(message) = host.status() else {
        panic!("expected failure, got {:?}", host.status());
    };
    assert!(message.contains(asset), "{message}");

    assert!(!host.scene().is_ready());
    assert!(host.scene().graph().is_empty());
    assert_eq!(host.scene().camera().position, Vec3::ZERO);

    // The loop keeps drawing the empty scene.
    assert_eq!(host.frame(Phase::JudgeTalking, DT), FrameOutcome::Failed);
    assert_eq!(host.engine().frames(), 2);
}

#[test]
fn retry_after_failure_restarts_bootstrap() {
    let assets = courtroom_assets();
    let person = assets.remove("models/person.glb").unwrap();
    let mut host = host_with(assets.clone());

    assert!(!host.retry(), "nothing to retry while loading");
    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Failed);

    assets.insert("models/person.glb", person);
    assert!(host.retry());
    assert_eq!(host.status(), &HostStatus::Loading);
    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Rendered);
    assert!(!host.retry(), "nothing to retry once ready");
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = CourtConfig {
        blend_factor: 0.0,
        ..CourtConfig::default()
    };
    let result = RenderLoopHost::new(
        HeadlessEngine::new(1, 1),
        Arc::new(courtroom_assets()),
        AssetManifest::default(),
        &config,
    );
    assert!(matches!(result, Err(ConfigError::BlendFactor(_))));
}

#[test]
fn degenerate_field_of_view_is_rejected_up_front() {
    let config = CourtConfig {
        field_of_view: 0.0,
        ..CourtConfig::default()
    };
    let result = RenderLoopHost::new(
        HeadlessEngine::new(1, 1),
        Arc::new(courtroom_assets()),
        AssetManifest::default(),
        &config,
    );
    assert!(matches!(result, Err(ConfigError::FieldOfView(_))));
}

#[test]
fn ready_courtroom_submits_environment_geometry() {
    let mut host = host_with(courtroom_assets());
    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Rendered);
    // Only the environment fixture carries triangles.
    assert_eq!(host.engine().last_mesh_count(), 1);
}

// ---------------------------------------------------------------------------
// Camera through the host
// ---------------------------------------------------------------------------

#[test]
fn camera_follows_phase_changes() {
    let mut host = host_with(courtroom_assets());
    let rig = CameraRig::courtroom();

    for _ in 0..30 {
        host.frame(Phase::Lobby, DT);
    }
    let lobby_distance = host.scene().camera().distance_to(rig.pose(Phase::Lobby));

    for _ in 0..400 {
        host.frame(Phase::ProsecutorTalking, DT);
    }
    let camera = host.scene().camera();
    assert!(camera.distance_to(rig.pose(Phase::ProsecutorTalking)) < 1e-2);
    assert!(lobby_distance > 1e-2);

    let view = host.camera_view();
    assert_eq!(view.field_of_view, 0.9);
    assert_eq!(view.position, camera.position);
}

#[test]
fn draw_errors_do_not_stop_the_loop() {
    let mut host = host_with(courtroom_assets());
    host.engine_mut().set_fail_draws(true);

    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Rendered);
    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Rendered);
    assert_eq!(host.engine().frames(), 0);

    host.engine_mut().set_fail_draws(false);
    host.frame(Phase::Lobby, DT);
    assert_eq!(host.engine().frames(), 1);
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[test]
fn dispose_while_loading_abandons_bootstrap() {
    let (assets, gate) = GatedAssets::new(courtroom_assets());
    let mut host = host_with(assets);

    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Loading);
    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Loading);
    let drawn = host.engine().frames();

    host.dispose();
    gate.store(true, Ordering::Release);

    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Stopped);
    assert_eq!(host.status(), &HostStatus::Disposed);
    assert_eq!(host.engine().frames(), drawn);
    assert!(host.engine().is_disposed());
    assert!(!host.scene().is_ready());
    assert!(host.scene().graph().is_empty());
}

#[test]
fn gated_load_completes_once_released() {
    let (assets, gate) = GatedAssets::new(courtroom_assets());
    let mut host = host_with(assets);

    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Loading);
    assert!(!host.scene().is_ready());

    gate.store(true, Ordering::Release);
    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Rendered);
}

#[test]
fn dispose_is_idempotent() {
    let mut host = host_with(courtroom_assets());
    host.frame(Phase::Lobby, DT);
    host.dispose();
    host.dispose();
    assert_eq!(host.status(), &HostStatus::Disposed);
    assert!(!host.retry());
}

#[test]
fn resize_is_forwarded_only_while_attached() {
    let mut host = host_with(courtroom_assets());
    host.resize(800, 600);
    assert_eq!(host.engine().size(), (800, 600));

    host.dispose();
    host.resize(10, 10);
    assert_eq!(host.engine().size(), (800, 600));
    assert_eq!(host.size(), (800, 600));
}

/// Engine that reports disposal through shared counters.
struct ProbeEngine {
    disposals: Arc<AtomicUsize>,
    fail_dispose: bool,
}

impl RenderEngine for ProbeEngine {
    fn resize(&mut self, _width: u32, _height: u32) {}

    fn draw(&mut self, _scene: &SceneGraph, _view: &CameraView) -> Result<(), EngineError> {
        Ok(())
    }

    fn dispose(&mut self) -> Result<(), EngineError> {
        self.disposals.fetch_add(1, Ordering::SeqCst);
        if self.fail_dispose {
            Err(EngineError::Device("lost".into()))
        } else {
            Ok(())
        }
    }
}

#[rstest]
#[case::clean(false)]
#[case::failing(true)]
fn drop_disposes_engine_once(#[case] fail_dispose: bool) {
    let disposals = Arc::new(AtomicUsize::new(0));
    let disposed_status = Arc::new(AtomicBool::new(false));
    {
        let mut host = RenderLoopHost::new(
            ProbeEngine {
                disposals: disposals.clone(),
                fail_dispose,
            },
            Arc::new(courtroom_assets()),
            AssetManifest::default(),
            &CourtConfig::default(),
        )
        .unwrap();
        host.frame(Phase::Lobby, DT);
        host.dispose();
        disposed_status.store(host.status() == &HostStatus::Disposed, Ordering::SeqCst);
    }
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert!(disposed_status.load(Ordering::SeqCst));
}

#[test]
fn drop_without_dispose_still_disposes() {
    let disposals = Arc::new(AtomicUsize::new(0));
    let host = RenderLoopHost::new(
        ProbeEngine {
            disposals: disposals.clone(),
            fail_dispose: false,
        },
        Arc::new(courtroom_assets()),
        AssetManifest::default(),
        &CourtConfig::default(),
    )
    .unwrap();
    drop(host);
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
}

#[test]
fn loading_frames_hand_the_engine_a_finite_camera() {
    let (assets, _gate) = GatedAssets::new(courtroom_assets());
    let mut host = host_with(assets);

    assert_eq!(host.frame(Phase::Lobby, DT), FrameOutcome::Loading);
    let view_projection = host.engine().last_view_projection().unwrap();
    assert!(view_projection.is_finite(), "{view_projection:?}");
}
