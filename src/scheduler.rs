//! Cancellable repeating tasks.
//!
//! The renderer registers its per-tick body with a [`TaskScheduler`] and keeps
//! the returned handle until `stop()`. [`IntervalScheduler`] drives ticks from
//! a tokio interval; [`ManualScheduler`] runs them only when asked, which
//! makes start/stop ordering deterministic in tests.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Body of a repeating task. Returning `Break` ends the repetition.
pub type RepeatingTask = Box<dyn FnMut() -> ControlFlow<()> + Send + 'static>;

/// Something that can run a task over and over until cancelled.
pub trait TaskScheduler {
    type Handle;

    /// Start repeating `task`. Each run completes before the next begins.
    fn schedule(&mut self, task: RepeatingTask) -> Self::Handle;

    /// Stop repeating. A run already in progress is allowed to finish.
    fn cancel(&mut self, handle: Self::Handle);
}

/// Why an [`IntervalScheduler`] could not be built.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("No tokio runtime to run ticks on: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// The period rounded down to nothing
    #[error("Tick period must be at least 1ns")]
    ZeroPeriod,
}

/// Runs tasks on a tokio interval.
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    period: Duration,
    runtime: Handle,
}

impl IntervalScheduler {
    /// Must be called from inside a tokio runtime.
    pub fn new(period: Duration) -> Result<Self, SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }
        Ok(Self {
            period,
            runtime: Handle::try_current()?,
        })
    }

    /// Tick `hz` times per second (at least once).
    pub fn from_hz(hz: u32) -> Result<Self, SchedulerError> {
        Self::new(Duration::from_secs(1) / hz.max(1))
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Handle to a task running on an [`IntervalScheduler`].
#[derive(Debug)]
pub struct IntervalHandle {
    join: JoinHandle<()>,
}

impl IntervalHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl TaskScheduler for IntervalScheduler {
    type Handle = IntervalHandle;

    fn schedule(&mut self, mut task: RepeatingTask) -> IntervalHandle {
        let period = self.period;
        let join = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            // A slow tick delays the next one instead of bunching them up
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if task().is_break() {
                    break;
                }
            }
        });
        IntervalHandle { join }
    }

    fn cancel(&mut self, handle: IntervalHandle) {
        handle.join.abort();
    }
}

/// Runs tasks only when [`ManualScheduler::run_pending`] is called.
#[derive(Default)]
pub struct ManualScheduler {
    tasks: Vec<(u64, RepeatingTask)>,
    next_id: u64,
}

/// Handle to a task registered with a [`ManualScheduler`].
#[derive(Debug, PartialEq, Eq)]
pub struct ManualHandle(u64);

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every registered task once, dropping those that return `Break`.
    ///
    /// Returns how many tasks ran.
    pub fn run_pending(&mut self) -> usize {
        let ran = self.tasks.len();
        self.tasks.retain_mut(|(_, task)| task().is_continue());
        ran
    }

    /// Number of tasks still repeating.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.tasks.len())
            .finish()
    }
}

impl TaskScheduler for ManualScheduler {
    type Handle = ManualHandle;

    fn schedule(&mut self, task: RepeatingTask) -> ManualHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push((id, task));
        ManualHandle(id)
    }

    fn cancel(&mut self, handle: ManualHandle) {
        self.tasks.retain(|(id, _)| *id != handle.0);
    }
}
