//! Frame Renderer: pulls frames, converts them to text, paints the display.
//!
//! Two states, [`RenderState::Idle`] and [`RenderState::Running`]. While
//! running, a repeating task on the configured [`TaskScheduler`] performs one
//! capture -> sample -> map -> display cycle per tick.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::ascii::{
    self, GlyphGrid, GlyphMapper, GlyphPolicy, LuminanceGrid, Orientation, DEFAULT_THRESHOLD,
};
use crate::camera::{Frame, FrameSource};
use crate::display::DisplaySink;
use crate::scheduler::TaskScheduler;

/// Frames older than this are still painted but logged at debug.
const STALE_FRAME: Duration = Duration::from_secs(1);

/// A frame source shared between the renderer task and its owner.
pub type SharedSource = Arc<Mutex<dyn FrameSource>>;

/// Errors from building render options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("output grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u16, height: u16 },
}

/// Everything fixed for the duration of one Running period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    width: u16,
    height: u16,
    mapper: GlyphMapper,
}

impl RenderOptions {
    pub fn new(width: u16, height: u16, mapper: GlyphMapper) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyGrid { width, height });
        }
        Ok(Self {
            width,
            height,
            mapper,
        })
    }

    /// 48x32 palette rendering, one line per row.
    pub fn density() -> Self {
        Self {
            width: 48,
            height: 32,
            mapper: GlyphMapper::default(),
        }
    }

    /// 64x32 two-level rendering, transposed to 32-character receipt lines.
    pub fn threshold() -> Self {
        Self {
            width: 64,
            height: 32,
            mapper: GlyphMapper::new(
                GlyphPolicy::Threshold(DEFAULT_THRESHOLD),
                Orientation::Transposed,
            ),
        }
    }

    /// Sampled grid width.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Sampled grid height.
    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn mapper(&self) -> &GlyphMapper {
        &self.mapper
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::density()
    }
}

/// Scratch buffers reused across ticks.
#[derive(Debug, Default)]
pub struct FramePipeline {
    options: RenderOptions,
    grid: LuminanceGrid,
    glyphs: GlyphGrid,
    text: String,
}

impl FramePipeline {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Convert one frame to display text.
    pub fn render(&mut self, frame: &Frame) -> &str {
        ascii::sample_into(frame, self.options.width, self.options.height, &mut self.grid);
        self.options
            .mapper
            .render_into(&self.grid, &mut self.glyphs, &mut self.text);
        &self.text
    }
}

/// Renderer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Running,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was painted
    Rendered,
    /// Capture failed; nothing painted, the next tick still runs
    Skipped,
    /// Renderer idle or source paused/ended; no more ticks
    Halted,
}

/// One tick of the render loop.
pub fn run_tick(
    running: &AtomicBool,
    source: &Mutex<dyn FrameSource>,
    pipeline: &mut FramePipeline,
    display: &dyn DisplaySink,
) -> TickOutcome {
    if !running.load(Ordering::SeqCst) {
        return TickOutcome::Halted;
    }

    let frame = {
        let Ok(mut source) = source.lock() else {
            log::debug!("Frame source lock poisoned, skipping tick");
            return TickOutcome::Skipped;
        };
        let status = source.status();
        if status.is_halted() {
            log::info!("Frame source {:?}, halting render loop", status);
            return TickOutcome::Halted;
        }
        match source.grab() {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("Frame capture failed: {}", e);
                return TickOutcome::Skipped;
            }
        }
    };

    let age = frame.age();
    if age > STALE_FRAME {
        log::debug!("Rendering stale frame ({:?} old)", age);
    }

    display.set_text(pipeline.render(&frame));
    TickOutcome::Rendered
}

/// Drives [`run_tick`] from a scheduler and owns the Idle/Running state.
pub struct FrameRenderer<T: TaskScheduler> {
    scheduler: T,
    handle: Option<T::Handle>,
    running: Arc<AtomicBool>,
    frames_rendered: Arc<AtomicU64>,
}

impl<T: TaskScheduler> std::fmt::Debug for FrameRenderer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("state", &self.state())
            .field("frames_rendered", &self.frames_rendered())
            .finish_non_exhaustive()
    }
}

impl<T: TaskScheduler> FrameRenderer<T> {
    pub fn new(scheduler: T) -> Self {
        Self {
            scheduler,
            handle: None,
            running: Arc::new(AtomicBool::new(false)),
            frames_rendered: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> RenderState {
        if self.running.load(Ordering::SeqCst) {
            RenderState::Running
        } else {
            RenderState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == RenderState::Running
    }

    /// Total frames painted since construction.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::SeqCst)
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut T {
        &mut self.scheduler
    }

    /// Begin rendering `source` into `display`.
    ///
    /// Returns `false` without doing anything if already running.
    pub fn start(
        &mut self,
        source: SharedSource,
        display: Arc<dyn DisplaySink>,
        options: RenderOptions,
    ) -> bool {
        if self.is_running() {
            return false;
        }
        // A loop that halted on its own leaves a finished handle behind
        if let Some(stale) = self.handle.take() {
            self.scheduler.cancel(stale);
        }

        log::info!(
            "Starting ASCII conversion: {}x{} {} {}",
            options.width,
            options.height,
            options.mapper.policy.name(),
            options.mapper.orientation.name()
        );

        // Fresh flag per run: a tick from an earlier run that is still in
        // flight can only ever clear its own flag
        self.running = Arc::new(AtomicBool::new(true));

        let running = Arc::clone(&self.running);
        let frames = Arc::clone(&self.frames_rendered);
        let mut pipeline = FramePipeline::new(options);

        let task = Box::new(move || {
            match run_tick(&running, &*source, &mut pipeline, &*display) {
                TickOutcome::Rendered => {
                    frames.fetch_add(1, Ordering::SeqCst);
                    ControlFlow::Continue(())
                }
                TickOutcome::Skipped => ControlFlow::Continue(()),
                TickOutcome::Halted => {
                    running.store(false, Ordering::SeqCst);
                    ControlFlow::Break(())
                }
            }
        });

        self.handle = Some(self.scheduler.schedule(task));
        true
    }

    /// Cancel the pending tick and return to Idle. Safe to call when idle.
    pub fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            self.scheduler.cancel(handle);
        }
        if was_running {
            log::info!("ASCII conversion stopped");
        }
    }
}

impl<T: TaskScheduler> Drop for FrameRenderer<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraError, SourceStatus, StillImage};
    use crate::display::TextBuffer;
    use crate::scheduler::{ManualHandle, ManualScheduler, RepeatingTask};

    struct FailingSource;

    struct PausedSource;

    impl FrameSource for PausedSource {
        fn status(&self) -> SourceStatus {
            SourceStatus::Paused
        }

        fn grab(&mut self) -> Result<Frame, CameraError> {
            Err(CameraError::NoFrame)
        }
    }

    /// Keeps cancelled tasks registered, like a tick already running on
    /// another worker thread when `cancel` lands.
    #[derive(Default)]
    struct LingeringScheduler(ManualScheduler);

    impl TaskScheduler for LingeringScheduler {
        type Handle = ManualHandle;

        fn schedule(&mut self, task: RepeatingTask) -> ManualHandle {
            self.0.schedule(task)
        }

        fn cancel(&mut self, _handle: ManualHandle) {}
    }

    impl FrameSource for FailingSource {
        fn status(&self) -> SourceStatus {
            SourceStatus::Live
        }

        fn grab(&mut self) -> Result<Frame, CameraError> {
            Err(CameraError::NoFrame)
        }
    }

    #[test]
    fn test_options_reject_empty_grid() {
        let err = RenderOptions::new(0, 32, GlyphMapper::default()).unwrap_err();
        assert_eq!(err, RenderError::EmptyGrid { width: 0, height: 32 });
    }

    #[test]
    fn test_presets() {
        let density = RenderOptions::density();
        assert_eq!((density.width(), density.height()), (48, 32));
        assert_eq!(density.mapper().orientation, Orientation::Straight);

        let threshold = RenderOptions::threshold();
        assert_eq!((threshold.width(), threshold.height()), (64, 32));
        assert_eq!(threshold.mapper().policy, GlyphPolicy::Threshold(128));
        assert_eq!(threshold.mapper().orientation, Orientation::Transposed);
    }

    #[test]
    fn test_pipeline_renders_requested_grid() {
        let mut pipeline = FramePipeline::new(RenderOptions::density());
        let text = pipeline.render(&Frame::solid(640, 480, [255, 255, 255]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 32);
        assert!(lines.iter().all(|l| l == &"@".repeat(48)));
    }

    #[test]
    fn test_tick_idle_is_halted() {
        let running = AtomicBool::new(false);
        let source: Mutex<StillImage> =
            Mutex::new(StillImage::from_frame(Frame::solid(4, 4, [0, 0, 0])));
        let display = TextBuffer::new();
        let mut pipeline = FramePipeline::default();

        let outcome = run_tick(&running, &source, &mut pipeline, &display);
        assert_eq!(outcome, TickOutcome::Halted);
        assert_eq!(display.text(), "");
    }

    #[test]
    fn test_capture_failure_skips_and_keeps_running() {
        let mut renderer = FrameRenderer::new(ManualScheduler::new());
        let display = TextBuffer::new();
        display.set_text("previous");
        let source: SharedSource = Arc::new(Mutex::new(FailingSource));

        assert!(renderer.start(source, Arc::new(display.clone()), RenderOptions::density()));
        renderer.scheduler_mut().run_pending();

        assert_eq!(display.text(), "previous");
        assert!(renderer.is_running());
        assert_eq!(renderer.scheduler().pending(), 1);
        assert_eq!(renderer.frames_rendered(), 0);
    }

    #[test]
    fn test_late_tick_from_old_run_leaves_new_run_alone() {
        let mut renderer = FrameRenderer::new(LingeringScheduler::default());
        let display = TextBuffer::new();

        let paused: SharedSource = Arc::new(Mutex::new(PausedSource));
        assert!(renderer.start(paused, Arc::new(display.clone()), RenderOptions::density()));
        renderer.stop();

        let live: SharedSource = Arc::new(Mutex::new(StillImage::from_frame(Frame::solid(
            8,
            8,
            [255, 255, 255],
        ))));
        assert!(renderer.start(live, Arc::new(display.clone()), RenderOptions::density()));

        // The first run's tick sees its own cleared flag and halts
        renderer.scheduler_mut().0.run_pending();

        assert!(renderer.is_running());
        assert_eq!(renderer.frames_rendered(), 1);
        assert_eq!(renderer.scheduler_mut().0.pending(), 1);
        assert!(display.text().starts_with('@'));
    }
}
