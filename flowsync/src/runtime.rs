//! Per-screen synchronization runtime and the tick driver.

use log::{debug, trace};

use crate::bridge::{EventBridge, EventFilter};
use crate::config::RuntimeConfig;
use crate::error::TimelineError;
use crate::flow::{FlowEngine, FlowStateId, PropertyRef};
use crate::guard::FeedbackGuard;
use crate::keyframe::{Keyframe, RawKeyframe};
use crate::report::{AnimateReport, DispatchReport, TickOutcome, TickReport, UpdateReport};
use crate::timeline::TimelineRegistry;
use crate::toolkit::{NativeEvent, Toolkit, WidgetId};
use crate::update::{UpdateTask, UpdateTaskQueue};

/// Owns every registry of one screen (or flow root).
///
/// Widget construction registers keyframes, update tasks and event bindings;
/// the host loop then calls [`Runtime::tick`] once per frame and forwards
/// native input events through [`Runtime::dispatch_event`].
#[derive(Debug)]
pub struct Runtime {
    config: RuntimeConfig,
    timelines: TimelineRegistry,
    tasks: UpdateTaskQueue,
    bridge: EventBridge,
    guard: FeedbackGuard,
    active_screen: Option<FlowStateId>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            timelines: TimelineRegistry::new(config.inverted_keyframes),
            tasks: UpdateTaskQueue::new(),
            bridge: EventBridge::new(),
            guard: FeedbackGuard::new(),
            active_screen: None,
            config,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn timelines(&self) -> &TimelineRegistry {
        &self.timelines
    }

    pub fn tasks(&self) -> &UpdateTaskQueue {
        &self.tasks
    }

    pub fn bridge(&self) -> &EventBridge {
        &self.bridge
    }

    pub fn guard(&self) -> &FeedbackGuard {
        &self.guard
    }

    // =========================================================================
    // Timelines
    // =========================================================================

    pub fn add_timeline_keyframe(
        &mut self,
        widget: WidgetId,
        flow_state: FlowStateId,
        keyframe: Keyframe,
    ) -> Result<(), TimelineError> {
        self.timelines.add_keyframe(widget, flow_state, keyframe)
    }

    /// Register a keyframe given as raw property bits and easing ids.
    pub fn add_raw_keyframe(
        &mut self,
        widget: WidgetId,
        flow_state: FlowStateId,
        raw: RawKeyframe,
    ) -> Result<(), TimelineError> {
        self.add_timeline_keyframe(widget, flow_state, Keyframe::try_from(raw)?)
    }

    /// Evaluate every timeline at an absolute position (editor scrubbing).
    pub fn set_timeline_position<T>(&mut self, position: f32, toolkit: &mut T) -> AnimateReport
    where
        T: Toolkit + ?Sized,
    {
        trace!("[runtime:{}] Scrubbing to {}", self.config.name, position);
        self.timelines.set_position(position, toolkit)
    }

    pub fn clear_timeline(&mut self) {
        self.timelines.clear();
    }

    // =========================================================================
    // Update tasks
    // =========================================================================

    pub fn add_update_task(&mut self, task: UpdateTask) {
        self.tasks.add(task);
    }

    pub fn run_update_tasks<F, T>(&mut self, flow: &mut F, toolkit: &mut T) -> UpdateReport
    where
        F: FlowEngine + ?Sized,
        T: Toolkit + ?Sized,
    {
        self.tasks.run(
            flow,
            toolkit,
            &mut self.guard,
            &self.bridge,
            self.config.echo_suppression,
        )
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn add_event_binding(&mut self, widget: WidgetId, filter: EventFilter, target: PropertyRef) {
        self.bridge.register(widget, filter, target);
    }

    /// Forward a native event raised by the toolkit's input pass.
    pub fn dispatch_event<F, T>(
        &self,
        event: &NativeEvent,
        flow: &mut F,
        toolkit: &T,
    ) -> DispatchReport
    where
        F: FlowEngine + ?Sized,
        T: Toolkit + ?Sized,
    {
        self.bridge.dispatch(
            event,
            &self.guard,
            self.config.echo_suppression,
            flow,
            toolkit,
        )
    }

    /// Label for one meter tick, evaluated during the toolkit's paint pass.
    pub fn draw_tick_label<F>(&self, widget: WidgetId, tick_index: u32, flow: &mut F) -> Option<String>
    where
        F: FlowEngine + ?Sized,
    {
        self.bridge
            .tick_label(widget, tick_index, self.config.tick_label_capacity, flow)
    }

    // =========================================================================
    // Tick
    // =========================================================================

    pub fn set_active_screen(&mut self, screen: Option<FlowStateId>) {
        debug!("[runtime:{}] Active screen: {:?}", self.config.name, screen);
        self.active_screen = screen;
    }

    pub fn active_screen(&self) -> Option<FlowStateId> {
        self.active_screen
    }

    /// Animate the active screen's flow-state tree, parent before children.
    pub fn animate<F, T>(&mut self, flow: &F, toolkit: &mut T) -> AnimateReport
    where
        F: FlowEngine + ?Sized,
        T: Toolkit + ?Sized,
    {
        let mut report = AnimateReport::default();
        if let Some(screen) = self.active_screen {
            animate_tree(&mut self.timelines, flow, toolkit, screen, &mut report);
        }
        report
    }

    /// Advance the flow engine, drain the update tasks, then animate.
    pub fn tick<F, T>(&mut self, flow: &mut F, toolkit: &mut T) -> TickOutcome
    where
        F: FlowEngine + ?Sized,
        T: Toolkit + ?Sized,
    {
        if flow.is_stopped() {
            return TickOutcome::Stopped;
        }
        flow.tick();
        if flow.is_stopped() {
            debug!("[runtime:{}] Flow stopped during tick", self.config.name);
            return TickOutcome::Stopped;
        }

        let update = self.run_update_tasks(flow, toolkit);
        let animate = self.animate(&*flow, toolkit);
        TickOutcome::Ran(TickReport { update, animate })
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Forget everything registered for `widget`. Returns whether anything was.
    pub fn remove_widget(&mut self, widget: WidgetId) -> bool {
        let timeline = self.timelines.remove_widget(widget);
        let tasks = self.tasks.remove_widget(widget);
        let bindings = self.bridge.remove_widget(widget);
        let removed = timeline || tasks > 0 || bindings > 0;
        if removed {
            debug!(
                "[runtime:{}] Removed {}: timeline={} tasks={} bindings={}",
                self.config.name, widget, timeline, tasks, bindings
            );
        }
        removed
    }

    /// Drop every registry entry whose widget no longer exists.
    pub fn prune_stale<T>(&mut self, toolkit: &T) -> usize
    where
        T: Toolkit + ?Sized,
    {
        let removed = self.timelines.prune_stale(toolkit)
            + self.tasks.prune_stale(toolkit)
            + self.bridge.prune_stale(toolkit);
        if removed > 0 {
            debug!("[runtime:{}] Pruned {} stale entries", self.config.name, removed);
        }
        removed
    }

    /// Drop every registry. The active screen is kept.
    pub fn clear(&mut self) {
        self.timelines.clear();
        self.tasks.clear();
        self.bridge.clear();
    }
}

fn animate_tree<F, T>(
    timelines: &mut TimelineRegistry,
    flow: &F,
    toolkit: &mut T,
    flow_state: FlowStateId,
    report: &mut AnimateReport,
) where
    F: FlowEngine + ?Sized,
    T: Toolkit + ?Sized,
{
    let position = flow.timeline_position(flow_state);
    *report += timelines.animate_flow_state(flow_state, position, toolkit);
    for child in flow.children(flow_state) {
        animate_tree(timelines, flow, toolkit, child, report);
    }
}
