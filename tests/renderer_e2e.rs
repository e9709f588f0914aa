//! End-to-end tests for the render loop lifecycle.
//!
//! A [`ManualScheduler`] drives ticks so start/stop ordering is exact.

use std::sync::{Arc, Mutex};

use asciicam::camera::{CameraError, Frame, FrameSource, SourceStatus};
use asciicam::display::{DisplaySink, TextBuffer};
use asciicam::renderer::{FrameRenderer, RenderOptions, RenderState, SharedSource};
use asciicam::scheduler::{IntervalScheduler, ManualScheduler};

/// A source whose status and failures are set by the test.
struct ScriptedSource {
    status: SourceStatus,
    fail_next: usize,
    rgb: [u8; 3],
    grabs: usize,
}

impl ScriptedSource {
    fn live(rgb: [u8; 3]) -> Self {
        Self {
            status: SourceStatus::Live,
            fail_next: 0,
            rgb,
            grabs: 0,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn status(&self) -> SourceStatus {
        self.status
    }

    fn grab(&mut self) -> Result<Frame, CameraError> {
        self.grabs += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(CameraError::NoFrame);
        }
        Ok(Frame::solid(160, 120, self.rgb))
    }
}

fn setup(rgb: [u8; 3]) -> (Arc<Mutex<ScriptedSource>>, SharedSource, TextBuffer) {
    let scripted = Arc::new(Mutex::new(ScriptedSource::live(rgb)));
    let source: SharedSource = scripted.clone();
    (scripted, source, TextBuffer::new())
}

fn sink(display: &TextBuffer) -> Arc<dyn DisplaySink> {
    Arc::new(display.clone())
}

// ==================== Lifecycle Tests ====================

#[test]
fn test_start_renders_on_tick() {
    let (_, source, display) = setup([255, 255, 255]);
    let mut renderer = FrameRenderer::new(ManualScheduler::new());

    assert_eq!(renderer.state(), RenderState::Idle);
    assert!(renderer.start(source, sink(&display), RenderOptions::density()));
    assert_eq!(renderer.state(), RenderState::Running);
    assert_eq!(display.text(), "");

    renderer.scheduler_mut().run_pending();
    let text = display.text();
    assert_eq!(text.lines().count(), 32);
    assert!(text.lines().all(|l| l == "@".repeat(48)));
    assert_eq!(renderer.frames_rendered(), 1);
}

#[test]
fn test_double_start_schedules_one_task() {
    let (scripted, source, display) = setup([0, 0, 0]);
    let mut renderer = FrameRenderer::new(ManualScheduler::new());

    assert!(renderer.start(source.clone(), sink(&display), RenderOptions::density()));
    assert!(!renderer.start(source, sink(&display), RenderOptions::threshold()));
    assert_eq!(renderer.scheduler().pending(), 1);

    renderer.scheduler_mut().run_pending();
    assert_eq!(scripted.lock().unwrap().grabs, 1);
    // First options stay in effect
    assert_eq!(display.text().lines().count(), 32);
}

#[test]
fn test_stop_is_idempotent() {
    let (_, source, display) = setup([0, 0, 0]);
    let mut renderer = FrameRenderer::new(ManualScheduler::new());

    renderer.stop();
    assert_eq!(renderer.state(), RenderState::Idle);

    renderer.start(source, sink(&display), RenderOptions::density());
    renderer.stop();
    renderer.stop();
    assert_eq!(renderer.state(), RenderState::Idle);
    assert_eq!(renderer.scheduler().pending(), 0);
}

#[test]
fn test_no_render_after_stop() {
    let (scripted, source, display) = setup([0, 0, 0]);
    let mut renderer = FrameRenderer::new(ManualScheduler::new());

    renderer.start(source, sink(&display), RenderOptions::density());
    renderer.scheduler_mut().run_pending();
    renderer.stop();
    renderer.scheduler_mut().run_pending();

    assert_eq!(scripted.lock().unwrap().grabs, 1);
    assert_eq!(renderer.frames_rendered(), 1);
}

#[test]
fn test_restart_after_stop() {
    let (_, source, display) = setup([0, 0, 0]);
    let mut renderer = FrameRenderer::new(ManualScheduler::new());

    renderer.start(source.clone(), sink(&display), RenderOptions::density());
    renderer.stop();
    assert!(renderer.start(source, sink(&display), RenderOptions::threshold()));
    renderer.scheduler_mut().run_pending();

    // Threshold preset: 64 transposed lines of 32 '*'
    let text = display.text();
    assert_eq!(text.lines().count(), 64);
    assert!(text.lines().all(|l| l == "*".repeat(32)));
}

// ==================== Source Status Tests ====================

#[test]
fn test_paused_source_halts_loop() {
    let (scripted, source, display) = setup([0, 0, 0]);
    let mut renderer = FrameRenderer::new(ManualScheduler::new());

    renderer.start(source, sink(&display), RenderOptions::density());
    scripted.lock().unwrap().status = SourceStatus::Paused;
    renderer.scheduler_mut().run_pending();

    assert_eq!(renderer.state(), RenderState::Idle);
    assert_eq!(renderer.scheduler().pending(), 0);
    assert_eq!(scripted.lock().unwrap().grabs, 0);
    assert_eq!(display.text(), "");
}

#[test]
fn test_ended_source_can_restart_when_live_again() {
    let (scripted, source, display) = setup([255, 255, 255]);
    let mut renderer = FrameRenderer::new(ManualScheduler::new());

    renderer.start(source.clone(), sink(&display), RenderOptions::density());
    scripted.lock().unwrap().status = SourceStatus::Ended;
    renderer.scheduler_mut().run_pending();
    assert!(!renderer.is_running());

    scripted.lock().unwrap().status = SourceStatus::Live;
    assert!(renderer.start(source, sink(&display), RenderOptions::density()));
    renderer.scheduler_mut().run_pending();
    assert_eq!(renderer.frames_rendered(), 1);
}

#[test]
fn test_capture_failure_keeps_loop_alive() {
    let (scripted, source, display) = setup([0, 0, 0]);
    scripted.lock().unwrap().fail_next = 2;
    let mut renderer = FrameRenderer::new(ManualScheduler::new());

    display.set_text("previous frame");
    renderer.start(source, sink(&display), RenderOptions::density());

    renderer.scheduler_mut().run_pending();
    renderer.scheduler_mut().run_pending();
    assert_eq!(display.text(), "previous frame");
    assert!(renderer.is_running());

    renderer.scheduler_mut().run_pending();
    assert_eq!(renderer.frames_rendered(), 1);
    assert_ne!(display.text(), "previous frame");
}

// ==================== Interval Scheduler Tests ====================

#[tokio::test(start_paused = true)]
async fn test_interval_renderer_ticks_and_stops() {
    let (scripted, source, display) = setup([255, 255, 255]);
    let mut renderer = FrameRenderer::new(IntervalScheduler::from_hz(10).unwrap());

    renderer.start(source, sink(&display), RenderOptions::density());
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    renderer.stop();

    let grabs = scripted.lock().unwrap().grabs;
    assert!(grabs >= 2, "only {} ticks ran", grabs);
    assert!(display.text().starts_with(&"@".repeat(48)));

    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    assert_eq!(scripted.lock().unwrap().grabs, grabs);
}
