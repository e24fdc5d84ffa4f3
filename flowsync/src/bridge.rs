//! Native widget events forwarded into flow state.

use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::attribute::{AttrValue, Attribute, AuxParams};
use crate::error::SyncError;
use crate::flow::{FlowEngine, PropertyRef};
use crate::guard::FeedbackGuard;
use crate::report::DispatchReport;
use crate::toolkit::{NativeEvent, NativeEventKind, Toolkit, WidgetId, WidgetState};

/// Which native events a binding reacts to and what it does with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    /// Fire the bound flow output whenever this event is dispatched.
    Native(NativeEventKind),
    /// Fire the output on value-changed while the widget is checked.
    Checked,
    /// Fire the output on value-changed while the widget is unchecked.
    Unchecked,
    TextareaTextChanged,
    CheckedStateChanged,
    ArcValueChanged,
    BarValueChanged,
    BarValueStartChanged,
    SliderValueChanged,
    SliderValueLeftChanged,
    DropdownSelectedChanged,
    RollerSelectedChanged,
    SpinboxValueChanged,
    /// Draw-time label provider for meter ticks. Never reacts to dispatched events.
    MeterTickLabel,
}

impl EventFilter {
    /// The attribute a value-changed filter reads and assigns into flow state.
    pub fn source_attribute(self) -> Option<Attribute> {
        match self {
            EventFilter::TextareaTextChanged => Some(Attribute::TextareaText),
            EventFilter::CheckedStateChanged => Some(Attribute::CheckedState),
            EventFilter::ArcValueChanged => Some(Attribute::ArcValue),
            EventFilter::BarValueChanged => Some(Attribute::BarValue),
            EventFilter::BarValueStartChanged => Some(Attribute::BarStartValue),
            EventFilter::SliderValueChanged => Some(Attribute::SliderValue),
            EventFilter::SliderValueLeftChanged => Some(Attribute::SliderLeftValue),
            EventFilter::DropdownSelectedChanged => Some(Attribute::DropdownSelected),
            EventFilter::RollerSelectedChanged => Some(Attribute::RollerSelected),
            EventFilter::SpinboxValueChanged => Some(Attribute::SpinboxValue),
            EventFilter::Native(_)
            | EventFilter::Checked
            | EventFilter::Unchecked
            | EventFilter::MeterTickLabel => None,
        }
    }
}

/// One registered event callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventBinding {
    pub widget: WidgetId,
    pub filter: EventFilter,
    /// Property to assign (value filters), output to fire (native and checked
    /// filters), or label expression (meter ticks).
    pub target: PropertyRef,
}

const TICK_LABEL_CONTEXT: &str = "Failed to evaluate scale label in Meter widget";

/// Event bindings of one runtime, keyed by widget.
#[derive(Debug, Default)]
pub struct EventBridge {
    bindings: HashMap<WidgetId, Vec<EventBinding>>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, widget: WidgetId, filter: EventFilter, target: PropertyRef) {
        trace!("[bridge] {} listens with {:?} -> {}", widget, filter, target);
        self.bindings.entry(widget).or_default().push(EventBinding {
            widget,
            filter,
            target,
        });
    }

    pub fn bindings(&self, widget: WidgetId) -> &[EventBinding] {
        self.bindings.get(&widget).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn remove_widget(&mut self, widget: WidgetId) -> usize {
        self.bindings.remove(&widget).map_or(0, |b| b.len())
    }

    pub fn prune_stale<T>(&mut self, toolkit: &T) -> usize
    where
        T: Toolkit + ?Sized,
    {
        let before = self.len();
        self.bindings.retain(|widget, _| toolkit.is_alive(*widget));
        before - self.len()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Run every binding of the event's widget.
    ///
    /// With `echo_suppression` on, an event on the widget `guard` says is being
    /// written is an echo of that write: none of the widget's bindings run.
    pub fn dispatch<F, T>(
        &self,
        event: &NativeEvent,
        guard: &FeedbackGuard,
        echo_suppression: bool,
        flow: &mut F,
        toolkit: &T,
    ) -> DispatchReport
    where
        F: FlowEngine + ?Sized,
        T: Toolkit + ?Sized,
    {
        let mut report = DispatchReport::default();
        let bindings = self.bindings(event.widget);

        if echo_suppression && guard.is_writing(event.widget) {
            if !bindings.is_empty() {
                debug!(
                    "[bridge] Suppressed echo {:?} on {} ({} bindings)",
                    event.kind,
                    event.widget,
                    bindings.len()
                );
            }
            report.suppressed += bindings.len();
            return report;
        }

        for binding in bindings {
            match binding.filter {
                EventFilter::Native(kind) => {
                    if event.kind == kind {
                        flow.propagate_value(binding.target);
                        report.forwarded += 1;
                    } else {
                        report.ignored += 1;
                    }
                }
                EventFilter::Checked | EventFilter::Unchecked => {
                    if event.kind != NativeEventKind::ValueChanged {
                        report.ignored += 1;
                        continue;
                    }
                    let wanted = binding.filter == EventFilter::Checked;
                    match toolkit.has_state(event.widget, WidgetState::Checked) {
                        Ok(checked) if checked == wanted => {
                            flow.propagate_value(binding.target);
                            report.forwarded += 1;
                        }
                        Ok(_) => report.ignored += 1,
                        Err(e) => {
                            debug!("[bridge] {:?} on {}: {}", binding.filter, event.widget, e);
                            report.failures += 1;
                        }
                    }
                }
                EventFilter::MeterTickLabel => report.ignored += 1,
                filter => {
                    let Some(attribute) = filter.source_attribute() else {
                        report.ignored += 1;
                        continue;
                    };
                    if event.kind != NativeEventKind::ValueChanged {
                        report.ignored += 1;
                        continue;
                    }
                    match forward_attribute(binding, attribute, flow, toolkit) {
                        Ok(()) => report.forwarded += 1,
                        Err(e) => {
                            warn!("[bridge] {}", e);
                            report.failures += 1;
                        }
                    }
                }
            }
        }

        report
    }

    /// Evaluate the tick label for a meter widget during paint.
    ///
    /// Returns `None` when the widget has no tick-label binding or evaluation
    /// fails. At most `capacity - 1` bytes are kept, cut on a char boundary.
    pub fn tick_label<F>(
        &self,
        widget: WidgetId,
        tick_index: u32,
        capacity: usize,
        flow: &mut F,
    ) -> Option<String>
    where
        F: FlowEngine + ?Sized,
    {
        let binding = self
            .bindings(widget)
            .iter()
            .find(|b| b.filter == EventFilter::MeterTickLabel)?;

        flow.set_meter_tick_index(tick_index);
        match flow.eval_text(binding.target, TICK_LABEL_CONTEXT) {
            Ok(label) => Some(truncate_label(label, capacity.saturating_sub(1))),
            Err(e) => {
                warn!("[bridge] {}", e);
                None
            }
        }
    }
}

fn truncate_label(mut label: String, max_bytes: usize) -> String {
    if label.len() > max_bytes {
        let mut end = max_bytes;
        while !label.is_char_boundary(end) {
            end -= 1;
        }
        label.truncate(end);
    }
    label
}

fn forward_attribute<F, T>(
    binding: &EventBinding,
    attribute: Attribute,
    flow: &mut F,
    toolkit: &T,
) -> Result<(), SyncError>
where
    F: FlowEngine + ?Sized,
    T: Toolkit + ?Sized,
{
    let value = toolkit.read_attribute(binding.widget, attribute, AuxParams::none())?;

    let info = attribute.info();
    let context = info.assign_context.unwrap_or(info.eval_context);
    match value {
        AttrValue::Integer(v) => flow.assign_integer(binding.target, v, context)?,
        AttrValue::Boolean(v) => flow.assign_boolean(binding.target, v, context)?,
        AttrValue::Text(v) => flow.assign_string(binding.target, &v, context)?,
    }
    trace!("[bridge] {:?} of {} -> {}", attribute, binding.widget, binding.target);
    Ok(())
}
