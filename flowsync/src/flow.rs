//! The flow engine seam.
//!
//! The flow interpreter is external. This layer only needs to evaluate bound
//! properties, assign user edits back, fire outputs, and walk the flow-state
//! tree for timeline animation.

use std::fmt;

use crate::error::EvalError;

/// Opaque key for one running flow-state instance (a screen or a user widget instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowStateId(pub u32);

impl fmt::Display for FlowStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fs{}", self.0)
    }
}

/// Addresses a flow-side property expression or component output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    pub flow_state: FlowStateId,
    pub component_index: u32,
    /// Property index for evaluations/assignments, output index for propagation.
    pub property_index: u32,
}

impl PropertyRef {
    pub fn new(flow_state: FlowStateId, component_index: u32, property_index: u32) -> Self {
        Self {
            flow_state,
            component_index,
            property_index,
        }
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/c{}/p{}",
            self.flow_state, self.component_index, self.property_index
        )
    }
}

/// The data-flow execution engine, seen from the synchronization layer.
pub trait FlowEngine {
    /// Advance the flow engine by one step.
    fn tick(&mut self);

    /// A stopped flow no longer drives widgets.
    fn is_stopped(&self) -> bool {
        false
    }

    /// Current timeline position of a flow state.
    fn timeline_position(&self, flow_state: FlowStateId) -> f32;

    /// Child flow states (user widget instances), in creation order.
    fn children(&self, flow_state: FlowStateId) -> Vec<FlowStateId>;

    fn eval_integer(&mut self, property: PropertyRef, context: &str) -> Result<i32, EvalError>;

    fn eval_boolean(&mut self, property: PropertyRef, context: &str) -> Result<bool, EvalError>;

    fn eval_text(&mut self, property: PropertyRef, context: &str) -> Result<String, EvalError>;

    /// Evaluate a string array and join it with `separator`.
    fn eval_string_array_joined(
        &mut self,
        property: PropertyRef,
        separator: &str,
        context: &str,
    ) -> Result<String, EvalError>;

    fn assign_integer(
        &mut self,
        property: PropertyRef,
        value: i32,
        context: &str,
    ) -> Result<(), EvalError>;

    fn assign_boolean(
        &mut self,
        property: PropertyRef,
        value: bool,
        context: &str,
    ) -> Result<(), EvalError>;

    fn assign_string(
        &mut self,
        property: PropertyRef,
        value: &str,
        context: &str,
    ) -> Result<(), EvalError>;

    /// Fire a component output (`output.property_index` is the output index).
    fn propagate_value(&mut self, output: PropertyRef);

    /// Tell the engine which meter tick is being drawn before a tick-label evaluation.
    fn set_meter_tick_index(&mut self, _index: u32) {}
}
