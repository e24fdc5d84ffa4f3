//! Flow-to-widget property bindings, re-evaluated every tick.

use log::{debug, trace, warn};

use crate::attribute::{
    AttrValue, Attribute, AuxParams, RollerMode, ValueKind, roller_options_changed,
};
use crate::bridge::EventBridge;
use crate::error::{EvalError, SyncError, ToolkitError};
use crate::flow::{FlowEngine, PropertyRef};
use crate::guard::FeedbackGuard;
use crate::report::{DispatchReport, UpdateReport};
use crate::toolkit::{Toolkit, WidgetId};

/// Binds one widget attribute to one flow property expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTask {
    pub attribute: Attribute,
    pub widget: WidgetId,
    pub property: PropertyRef,
    pub aux: AuxParams,
}

impl UpdateTask {
    pub fn new(attribute: Attribute, widget: WidgetId, property: PropertyRef) -> Self {
        Self {
            attribute,
            widget,
            property,
            aux: AuxParams::none(),
        }
    }

    pub fn with_aux(mut self, aux: AuxParams) -> Self {
        self.aux = aux;
        self
    }

    fn evaluate<F>(&self, flow: &mut F) -> Result<AttrValue, EvalError>
    where
        F: FlowEngine + ?Sized,
    {
        let context = self.attribute.info().eval_context;
        let value = match self.attribute.value_kind() {
            ValueKind::Integer => AttrValue::Integer(flow.eval_integer(self.property, context)?),
            ValueKind::Boolean => AttrValue::Boolean(flow.eval_boolean(self.property, context)?),
            ValueKind::Text => AttrValue::Text(flow.eval_text(self.property, context)?),
            ValueKind::OptionList => {
                AttrValue::Text(flow.eval_string_array_joined(self.property, "\n", context)?)
            }
        };
        Ok(value)
    }

    /// Whether `new` would change what the widget currently shows.
    fn differs(&self, new: &AttrValue, current: &AttrValue) -> bool {
        match (self.attribute, new, current) {
            (Attribute::RollerOptions, AttrValue::Text(new), AttrValue::Text(current)) => {
                roller_options_changed(new, current, RollerMode::from_param(self.aux.param))
            }
            _ => new != current,
        }
    }
}

/// Update tasks in registration order.
#[derive(Debug, Default)]
pub struct UpdateTaskQueue {
    tasks: Vec<UpdateTask>,
}

impl UpdateTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: UpdateTask) {
        trace!(
            "[update] Task {} binds {:?} of {} to {}",
            self.tasks.len(),
            task.attribute,
            task.widget,
            task.property
        );
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UpdateTask> {
        self.tasks.iter()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Drop every task bound to `widget`. Returns how many were dropped.
    pub fn remove_widget(&mut self, widget: WidgetId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.widget != widget);
        before - self.tasks.len()
    }

    pub fn prune_stale<T>(&mut self, toolkit: &T) -> usize
    where
        T: Toolkit + ?Sized,
    {
        let before = self.tasks.len();
        self.tasks.retain(|task| toolkit.is_alive(task.widget));
        before - self.tasks.len()
    }

    /// Evaluate every task and write the widgets whose value changed.
    ///
    /// Events fired by a write are dispatched through `bridge` while `guard`
    /// still names the widget being written.
    pub fn run<F, T>(
        &self,
        flow: &mut F,
        toolkit: &mut T,
        guard: &mut FeedbackGuard,
        bridge: &EventBridge,
        echo_suppression: bool,
    ) -> UpdateReport
    where
        F: FlowEngine + ?Sized,
        T: Toolkit + ?Sized,
    {
        let mut report = UpdateReport::default();

        for (index, task) in self.tasks.iter().enumerate() {
            report.tasks += 1;

            guard.enter(task.widget, index);
            let outcome = run_task(task, flow, toolkit, guard, bridge, echo_suppression);
            guard.exit();

            match outcome {
                Ok(None) => {}
                Ok(Some(dispatch)) => {
                    report.writes += 1;
                    report.suppressed_echoes += dispatch.suppressed;
                }
                Err(SyncError::Eval(e)) => {
                    warn!("[update] {}", e);
                    report.eval_failures += 1;
                }
                Err(e) => {
                    debug!("[update] Skipping task {} on {}: {}", index, task.widget, e);
                    report.stale += 1;
                }
            }
        }

        report
    }
}

/// Returns `None` when the widget already shows the evaluated value.
fn run_task<F, T>(
    task: &UpdateTask,
    flow: &mut F,
    toolkit: &mut T,
    guard: &FeedbackGuard,
    bridge: &EventBridge,
    echo_suppression: bool,
) -> Result<Option<DispatchReport>, SyncError>
where
    F: FlowEngine + ?Sized,
    T: Toolkit + ?Sized,
{
    if !toolkit.is_alive(task.widget) {
        return Err(ToolkitError::StaleWidget(task.widget).into());
    }

    let new = task.evaluate(flow)?;
    let current = toolkit.read_attribute(task.widget, task.attribute, task.aux)?;
    if !task.differs(&new, &current) {
        return Ok(None);
    }

    trace!("[update] {:?} of {}: {:?} -> {:?}", task.attribute, task.widget, current, new);
    let events = toolkit.write_attribute(task.widget, task.attribute, task.aux, new)?;

    let mut dispatch = DispatchReport::default();
    for event in &events {
        dispatch += bridge.dispatch(event, guard, echo_suppression, flow, &*toolkit);
    }
    Ok(Some(dispatch))
}
