//! Windowed host: `circuit-court play`.

use std::sync::Arc;
use std::time::Instant;

use circuit_court_core::session::Role;
use circuit_court_core::{CourtConfig, MusicDirector, SessionView};
use circuit_court_scene::{AssetManifest, FrameOutcome, HostStatus, RenderLoopHost};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::args::PlayArgs;
use crate::error::AppError;
use crate::feed::EventFeed;
use crate::input::move_direction;
use crate::proceedings::ProceedingsLog;
use crate::wgpu_engine::WgpuEngine;

const TITLE: &str = "Circuit Court";
/// Trackpads report pixels; the camera dollies per wheel notch.
const PIXELS_PER_NOTCH: f32 = 40.0;
/// Longest frame step fed to the scene, so a stall does not jump the camera.
const MAX_DT: f32 = 0.1;

/// Window title for the host status and session state.
pub fn window_title(status: &HostStatus, view: &SessionView) -> String {
    match status {
        HostStatus::Loading => format!("{TITLE} - loading courtroom"),
        HostStatus::Failed(message) => format!("{TITLE} - error: {message} (press R to retry)"),
        HostStatus::Disposed => TITLE.to_owned(),
        HostStatus::Ready if view.is_game_over() => match view.winner() {
            Some(winner) => format!("{TITLE} - verdict: {} wins", side(winner)),
            None => format!("{TITLE} - verdict reached"),
        },
        HostStatus::Ready if view.is_game_started() => {
            format!("{TITLE} - round {} - {}", view.round(), view.phase())
        }
        HostStatus::Ready => match view.join_code() {
            Some(code) => format!("{TITLE} - lobby {code}"),
            None => format!("{TITLE} - lobby"),
        },
    }
}

fn side(role: Role) -> &'static str {
    match role {
        Role::Prosecutor => "prosecution",
        Role::Defense => "defense",
    }
}

/// winit application driving one [`RenderLoopHost`].
pub struct CourtWindow {
    args: PlayArgs,
    config: CourtConfig,
    window: Option<Arc<Window>>,
    host: Option<RenderLoopHost<WgpuEngine>>,

    view: SessionView,
    feed: Option<EventFeed>,
    music: MusicDirector,
    proceedings: ProceedingsLog,

    title: String,
    last_frame: Option<Instant>,
    frames: u64,
    cursor: Option<(f64, f64)>,
    failure: Option<AppError>,
}

impl CourtWindow {
    pub fn new(args: PlayArgs, config: CourtConfig, feed: Option<EventFeed>) -> Self {
        Self {
            args,
            config,
            window: None,
            host: None,
            view: SessionView::new(),
            feed,
            music: MusicDirector::new(),
            proceedings: ProceedingsLog::new(),
            title: TITLE.to_owned(),
            last_frame: None,
            frames: 0,
            cursor: None,
            failure: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let attributes = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.args.width,
                self.args.height,
            ));
        let window = event_loop
            .create_window(attributes)
            .map(Arc::new)
            .map_err(|e| AppError::Bootstrap(format!("failed to create window: {e}")))?;
        log::info!("Window created");

        let engine = WgpuEngine::new(window.clone())?;
        let source = self.args.scene.asset_source(&self.config);
        let manifest = AssetManifest::from_paths(&self.config.assets);
        let mut host = RenderLoopHost::new(engine, source, manifest, &self.config)?;

        let size = window.inner_size();
        host.resize(size.width, size.height);

        self.host = Some(host);
        self.window = Some(window);
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(host) = &mut self.host {
            host.dispose();
        }
        event_loop.exit();
    }

    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(host) = &mut self.host else {
            return;
        };

        if let Some(feed) = &mut self.feed {
            if feed.drain(&mut self.view) > 0 {
                self.proceedings.update(&self.view);
            }
        }
        if let Some(cue) = self.music.update(&self.view) {
            log::info!("Music cue: {}", cue.name());
        }

        let now = Instant::now();
        let dt = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32())
            .min(MAX_DT);
        self.last_frame = Some(now);

        if host.frame(self.view.phase(), dt) == FrameOutcome::Stopped {
            event_loop.exit();
            return;
        }
        self.frames += 1;

        let title = window_title(host.status(), &self.view);
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }

        if let Some(max) = self.args.max_frames.filter(|&max| self.frames >= max) {
            log::info!("Reached max frames ({max}), exiting");
            self.shutdown(event_loop);
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(key) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;

        match key {
            KeyCode::Escape if pressed => self.shutdown(event_loop),
            KeyCode::KeyR if pressed && !event.repeat => {
                if let Some(host) = &mut self.host {
                    host.retry();
                }
            }
            _ => {
                if let (Some(direction), Some(host)) = (move_direction(key), &mut self.host) {
                    host.input_mut().set_moving(direction, pressed);
                }
            }
        }
    }

    fn take_failure(&mut self) -> Option<AppError> {
        self.failure.take()
    }
}

impl ApplicationHandler for CourtWindow {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            log::error!("Failed to start courtroom window: {err}");
            self.failure = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.shutdown(event_loop);
            }

            WindowEvent::Resized(size) => {
                if let Some(host) = &mut self.host {
                    host.resize(size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => self.render_frame(event_loop),

            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(host) = &mut self.host {
                    host.input_mut()
                        .set_looking(state == ElementState::Pressed);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace((position.x, position.y));
                if let (Some((x, y)), Some(host)) = (previous, &mut self.host) {
                    host.input_mut()
                        .pointer_moved((position.x - x) as f32, (position.y - y) as f32);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(host) = &mut self.host {
                    let notches = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_NOTCH,
                    };
                    host.input_mut().scrolled(notches);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// `circuit-court play`: open the window and run until closed.
pub fn run(args: PlayArgs) -> Result<(), AppError> {
    let config = args.scene.load_config()?;
    // Surface configuration defects before a window appears.
    config.rig()?;
    config.interpolator()?;
    config.field_of_view_radians()?;

    let feed = args.events.as_deref().map(EventFeed::open).transpose()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = CourtWindow::new(args, config, feed);
    event_loop.run_app(&mut app)?;

    match app.take_failure() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
