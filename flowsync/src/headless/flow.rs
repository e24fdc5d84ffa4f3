use std::collections::{HashMap, HashSet};

use crate::error::EvalError;
use crate::flow::{FlowEngine, FlowStateId, PropertyRef};

/// A flow-side value held by [`MemoryFlow`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Boolean(bool),
    Text(String),
    StringArray(Vec<String>),
    /// One label per meter tick, selected by the current tick index.
    TickLabels(Vec<String>),
    /// Evaluating this property fails with the given message.
    Error(String),
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// In-memory flow engine: a property map plus logs of what the runtime
/// assigned and propagated.
#[derive(Debug, Default)]
pub struct MemoryFlow {
    properties: HashMap<PropertyRef, Value>,
    read_only: HashSet<PropertyRef>,
    assignments: Vec<(PropertyRef, Value)>,
    propagations: Vec<PropertyRef>,
    positions: HashMap<FlowStateId, f32>,
    children: HashMap<FlowStateId, Vec<FlowStateId>>,
    ticks: u64,
    stop_after: Option<u64>,
    stopped: bool,
    tick_index: u32,
}

impl MemoryFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, property: PropertyRef, value: impl Into<Value>) {
        self.properties.insert(property, value.into());
    }

    pub fn get(&self, property: PropertyRef) -> Option<&Value> {
        self.properties.get(&property)
    }

    /// Assignments to `property` fail from now on.
    pub fn set_read_only(&mut self, property: PropertyRef) {
        self.read_only.insert(property);
    }

    pub fn set_timeline_position(&mut self, flow_state: FlowStateId, position: f32) {
        self.positions.insert(flow_state, position);
    }

    pub fn add_child(&mut self, parent: FlowStateId, child: FlowStateId) {
        self.children.entry(parent).or_default().push(child);
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Stop once `ticks` ticks have run.
    pub fn stop_after(&mut self, ticks: u64) {
        self.stop_after = Some(ticks);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick_index(&self) -> u32 {
        self.tick_index
    }

    /// Values written back by the runtime, oldest first.
    pub fn assignments(&self) -> &[(PropertyRef, Value)] {
        &self.assignments
    }

    /// Outputs fired by the runtime, oldest first.
    pub fn propagations(&self) -> &[PropertyRef] {
        &self.propagations
    }

    pub fn clear_logs(&mut self) {
        self.assignments.clear();
        self.propagations.clear();
    }

    fn lookup(&self, property: PropertyRef, context: &str) -> Result<&Value, EvalError> {
        match self.properties.get(&property) {
            Some(Value::Error(message)) => Err(EvalError::new(context, message.clone())),
            Some(value) => Ok(value),
            None => Err(EvalError::new(context, format!("{} has no value", property))),
        }
    }

    fn assign(&mut self, property: PropertyRef, value: Value, context: &str) -> Result<(), EvalError> {
        if self.read_only.contains(&property) {
            return Err(EvalError::new(context, format!("{} is not assignable", property)));
        }
        self.properties.insert(property, value.clone());
        self.assignments.push((property, value));
        Ok(())
    }
}

impl FlowEngine for MemoryFlow {
    fn tick(&mut self) {
        self.ticks += 1;
        if self.stop_after.is_some_and(|limit| self.ticks >= limit) {
            self.stopped = true;
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn timeline_position(&self, flow_state: FlowStateId) -> f32 {
        self.positions.get(&flow_state).copied().unwrap_or(0.0)
    }

    fn children(&self, flow_state: FlowStateId) -> Vec<FlowStateId> {
        self.children.get(&flow_state).cloned().unwrap_or_default()
    }

    fn eval_integer(&mut self, property: PropertyRef, context: &str) -> Result<i32, EvalError> {
        match self.lookup(property, context)? {
            Value::Integer(v) => Ok(*v),
            Value::Boolean(v) => Ok(i32::from(*v)),
            other => Err(EvalError::new(context, format!("expected integer, got {:?}", other))),
        }
    }

    fn eval_boolean(&mut self, property: PropertyRef, context: &str) -> Result<bool, EvalError> {
        match self.lookup(property, context)? {
            Value::Boolean(v) => Ok(*v),
            Value::Integer(v) => Ok(*v != 0),
            other => Err(EvalError::new(context, format!("expected boolean, got {:?}", other))),
        }
    }

    fn eval_text(&mut self, property: PropertyRef, context: &str) -> Result<String, EvalError> {
        let index = self.tick_index as usize;
        match self.lookup(property, context)? {
            Value::Text(v) => Ok(v.clone()),
            Value::Integer(v) => Ok(v.to_string()),
            Value::Boolean(v) => Ok(v.to_string()),
            Value::TickLabels(labels) => labels
                .get(index)
                .cloned()
                .ok_or_else(|| EvalError::new(context, format!("no label for tick {}", index))),
            other => Err(EvalError::new(context, format!("expected text, got {:?}", other))),
        }
    }

    fn eval_string_array_joined(
        &mut self,
        property: PropertyRef,
        separator: &str,
        context: &str,
    ) -> Result<String, EvalError> {
        match self.lookup(property, context)? {
            Value::StringArray(items) => Ok(items.join(separator)),
            Value::Text(v) => Ok(v.clone()),
            other => Err(EvalError::new(
                context,
                format!("expected string array, got {:?}", other),
            )),
        }
    }

    fn assign_integer(
        &mut self,
        property: PropertyRef,
        value: i32,
        context: &str,
    ) -> Result<(), EvalError> {
        self.assign(property, Value::Integer(value), context)
    }

    fn assign_boolean(
        &mut self,
        property: PropertyRef,
        value: bool,
        context: &str,
    ) -> Result<(), EvalError> {
        self.assign(property, Value::Boolean(value), context)
    }

    fn assign_string(
        &mut self,
        property: PropertyRef,
        value: &str,
        context: &str,
    ) -> Result<(), EvalError> {
        self.assign(property, Value::Text(value.to_string()), context)
    }

    fn propagate_value(&mut self, output: PropertyRef) {
        self.propagations.push(output);
    }

    fn set_meter_tick_index(&mut self, index: u32) {
        self.tick_index = index;
    }
}
