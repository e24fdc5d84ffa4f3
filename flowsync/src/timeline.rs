//! Widget timelines and the registry that owns them.

use std::collections::HashMap;

use log::{debug, trace};

use crate::config::InvertedKeyframePolicy;
use crate::error::{TimelineError, ToolkitError};
use crate::flow::FlowStateId;
use crate::keyframe::{AnimatedValues, Keyframe, NativeStyle, sample};
use crate::report::AnimateReport;
use crate::toolkit::{StyleProp, Toolkit, WidgetId};

/// The keyframe sequence of one widget.
#[derive(Debug, Clone)]
pub struct WidgetTimeline {
    widget: WidgetId,
    flow_state: FlowStateId,
    /// Style read from the widget on first evaluation.
    baseline: Option<AnimatedValues>,
    last_position: Option<f32>,
    /// Authoring order. Not sorted: evaluation order is significant.
    keyframes: Vec<Keyframe>,
}

impl WidgetTimeline {
    fn new(widget: WidgetId, flow_state: FlowStateId) -> Self {
        Self {
            widget,
            flow_state,
            baseline: None,
            last_position: None,
            keyframes: Vec::new(),
        }
    }

    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    pub fn flow_state(&self) -> FlowStateId {
        self.flow_state
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn baseline(&self) -> Option<&AnimatedValues> {
        self.baseline.as_ref()
    }

    pub fn last_position(&self) -> Option<f32> {
        self.last_position
    }

    /// Evaluate at `position` and write the result to the widget.
    ///
    /// Returns `Ok(false)` without touching the widget when `position` equals
    /// the last evaluated position.
    pub fn evaluate<T>(&mut self, position: f32, toolkit: &mut T) -> Result<bool, ToolkitError>
    where
        T: Toolkit + ?Sized,
    {
        if !toolkit.is_alive(self.widget) {
            return Err(ToolkitError::StaleWidget(self.widget));
        }

        if self.last_position == Some(position) {
            return Ok(false);
        }

        let baseline = match self.baseline {
            Some(baseline) => baseline,
            None => {
                let baseline = self.capture_baseline(toolkit)?;
                self.baseline = Some(baseline);
                baseline
            }
        };

        let style = sample(&baseline, &self.keyframes, position).to_native();
        for (prop, value) in style.writable() {
            toolkit.set_local_style(self.widget, prop, value)?;
        }
        toolkit.request_layout(self.widget)?;

        trace!(
            "[timeline] {} at {}: x={} y={} w={} h={} opa={} scale={} rot={}",
            self.widget,
            position,
            style.x,
            style.y,
            style.width,
            style.height,
            style.opacity,
            style.scale,
            style.rotate
        );

        self.last_position = Some(position);
        Ok(true)
    }

    fn capture_baseline<T>(&self, toolkit: &T) -> Result<AnimatedValues, ToolkitError>
    where
        T: Toolkit + ?Sized,
    {
        let mut native = NativeStyle::default();
        for prop in StyleProp::ALL {
            native.set(prop, toolkit.local_style(self.widget, prop)?);
        }
        Ok(AnimatedValues::from_native(&native))
    }
}

/// All widget timelines of one runtime, keyed by widget.
#[derive(Debug, Default)]
pub struct TimelineRegistry {
    timelines: Vec<WidgetTimeline>,
    by_widget: HashMap<WidgetId, usize>,
    by_flow_state: HashMap<FlowStateId, Vec<usize>>,
    policy: InvertedKeyframePolicy,
}

impl TimelineRegistry {
    pub fn new(policy: InvertedKeyframePolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Append a keyframe to the widget's timeline, creating the timeline on first use.
    ///
    /// A widget keeps the flow state it was first registered with.
    pub fn add_keyframe(
        &mut self,
        widget: WidgetId,
        flow_state: FlowStateId,
        keyframe: Keyframe,
    ) -> Result<(), TimelineError> {
        keyframe.validate()?;
        if keyframe.is_inverted() && self.policy == InvertedKeyframePolicy::Reject {
            return Err(TimelineError::InvertedRange {
                start: keyframe.start,
                end: keyframe.end,
            });
        }

        let slot = match self.by_widget.get(&widget) {
            Some(&slot) => slot,
            None => {
                let slot = self.timelines.len();
                self.timelines.push(WidgetTimeline::new(widget, flow_state));
                self.by_widget.insert(widget, slot);
                self.by_flow_state.entry(flow_state).or_default().push(slot);
                debug!("[timeline] New timeline for {} in {}", widget, flow_state);
                slot
            }
        };

        let timeline = &mut self.timelines[slot];
        if timeline.flow_state != flow_state {
            trace!(
                "[timeline] {} already belongs to {}, ignoring {}",
                widget, timeline.flow_state, flow_state
            );
        }
        timeline.keyframes.push(keyframe);
        Ok(())
    }

    pub fn get(&self, widget: WidgetId) -> Option<&WidgetTimeline> {
        self.by_widget.get(&widget).map(|&slot| &self.timelines[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &WidgetTimeline> {
        self.timelines.iter()
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    /// Evaluate every timeline at `position`, regardless of flow state.
    pub fn set_position<T>(&mut self, position: f32, toolkit: &mut T) -> AnimateReport
    where
        T: Toolkit + ?Sized,
    {
        let mut report = AnimateReport::default();
        for timeline in &mut self.timelines {
            evaluate_one(timeline, position, toolkit, &mut report);
        }
        report
    }

    /// Evaluate the timelines registered under one flow state.
    pub fn animate_flow_state<T>(
        &mut self,
        flow_state: FlowStateId,
        position: f32,
        toolkit: &mut T,
    ) -> AnimateReport
    where
        T: Toolkit + ?Sized,
    {
        let mut report = AnimateReport::default();
        let Some(slots) = self.by_flow_state.get(&flow_state) else {
            return report;
        };
        for &slot in slots {
            evaluate_one(&mut self.timelines[slot], position, toolkit, &mut report);
        }
        report
    }

    /// Drop every timeline.
    pub fn clear(&mut self) {
        if !self.timelines.is_empty() {
            debug!("[timeline] Clearing {} timelines", self.timelines.len());
        }
        self.timelines.clear();
        self.by_widget.clear();
        self.by_flow_state.clear();
    }

    /// Drop one widget's timeline. Returns whether it existed.
    pub fn remove_widget(&mut self, widget: WidgetId) -> bool {
        if !self.by_widget.contains_key(&widget) {
            return false;
        }
        self.timelines.retain(|t| t.widget != widget);
        self.reindex();
        true
    }

    /// Drop timelines whose widget has been deleted. Returns how many were dropped.
    pub fn prune_stale<T>(&mut self, toolkit: &T) -> usize
    where
        T: Toolkit + ?Sized,
    {
        let before = self.timelines.len();
        self.timelines.retain(|t| toolkit.is_alive(t.widget));
        let removed = before - self.timelines.len();
        if removed > 0 {
            debug!("[timeline] Pruned {} stale timelines", removed);
            self.reindex();
        }
        removed
    }

    fn reindex(&mut self) {
        self.by_widget.clear();
        self.by_flow_state.clear();
        for (slot, timeline) in self.timelines.iter().enumerate() {
            self.by_widget.insert(timeline.widget, slot);
            self.by_flow_state
                .entry(timeline.flow_state)
                .or_default()
                .push(slot);
        }
    }
}

fn evaluate_one<T>(
    timeline: &mut WidgetTimeline,
    position: f32,
    toolkit: &mut T,
    report: &mut AnimateReport,
) where
    T: Toolkit + ?Sized,
{
    report.evaluated += 1;
    match timeline.evaluate(position, toolkit) {
        Ok(true) => report.written += 1,
        Ok(false) => {}
        Err(e) => {
            debug!("[timeline] Skipping {}: {}", timeline.widget, e);
            report.stale += 1;
        }
    }
}
