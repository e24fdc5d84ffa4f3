//! Per-pass counters returned by the runtime.

use std::ops::AddAssign;

/// Result of draining the update-task queue once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Tasks visited.
    pub tasks: usize,
    /// Tasks whose value differed and was written.
    pub writes: usize,
    /// Tasks skipped because the flow engine failed to evaluate.
    pub eval_failures: usize,
    /// Tasks skipped because the widget is gone or rejected the attribute.
    pub stale: usize,
    /// Echo events swallowed while the tasks were writing.
    pub suppressed_echoes: usize,
}

/// Result of evaluating timelines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimateReport {
    pub evaluated: usize,
    /// Timelines whose position changed and were written.
    pub written: usize,
    pub stale: usize,
}

impl AddAssign for AnimateReport {
    fn add_assign(&mut self, other: Self) {
        self.evaluated += other.evaluated;
        self.written += other.written;
        self.stale += other.stale;
    }
}

/// Result of dispatching one native event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Bindings that wrote into flow state or fired an output.
    pub forwarded: usize,
    /// Bindings skipped because the event echoed a runtime write.
    pub suppressed: usize,
    /// Bindings that did not match the event.
    pub ignored: usize,
    /// Bindings whose read or assignment failed.
    pub failures: usize,
}

impl AddAssign for DispatchReport {
    fn add_assign(&mut self, other: Self) {
        self.forwarded += other.forwarded;
        self.suppressed += other.suppressed;
        self.ignored += other.ignored;
        self.failures += other.failures;
    }
}

/// Result of one full tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub update: UpdateReport,
    pub animate: AnimateReport,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Ran(TickReport),
    /// The flow engine is stopped; nothing was synchronized.
    Stopped,
}

impl TickOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, TickOutcome::Stopped)
    }

    pub fn report(&self) -> Option<&TickReport> {
        match self {
            TickOutcome::Ran(report) => Some(report),
            TickOutcome::Stopped => None,
        }
    }
}
