use std::collections::HashMap;

use log::trace;

use crate::attribute::{
    AttrValue, Attribute, AuxParams, RollerMode, SubObjectId, ValueKind, repeat_roller_options,
};
use crate::error::ToolkitError;
use crate::keyframe::NativeStyle;
use crate::toolkit::{
    NativeEvent, NativeEventKind, SIZE_CONTENT, StyleProp, Toolkit, WidgetId, WidgetState,
};

/// Widget types the headless tree knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Screen,
    Container,
    Label,
    Button,
    Checkbox,
    Switch,
    Slider,
    Bar,
    Arc,
    Dropdown,
    Roller,
    Textarea,
    Meter,
    Spinbox,
    Led,
    Tabview,
}

impl WidgetKind {
    pub fn supports(self, attribute: Attribute) -> bool {
        use Attribute::*;
        match attribute {
            CheckedState | DisabledState | HiddenFlag | ClickableFlag => true,
            LabelText => self == WidgetKind::Label,
            TextareaText => self == WidgetKind::Textarea,
            DropdownOptions | DropdownSelected => self == WidgetKind::Dropdown,
            RollerOptions | RollerSelected => self == WidgetKind::Roller,
            SliderValue | SliderLeftValue => self == WidgetKind::Slider,
            ArcValue | ArcRangeMin | ArcRangeMax => self == WidgetKind::Arc,
            BarValue | BarStartValue => self == WidgetKind::Bar,
            MeterIndicatorValue | MeterIndicatorStartValue | MeterIndicatorEndValue => {
                self == WidgetKind::Meter
            }
            SpinboxValue | SpinboxStep => self == WidgetKind::Spinbox,
            LedColor | LedBrightness => self == WidgetKind::Led,
            TabName => self == WidgetKind::Tabview,
        }
    }

    /// Checkboxes and switches toggle their checked state when clicked.
    pub fn is_checkable(self) -> bool {
        matches!(self, WidgetKind::Checkbox | WidgetKind::Switch)
    }

    fn default_style(self) -> NativeStyle {
        let (width, height) = match self {
            WidgetKind::Screen => (800, 480),
            WidgetKind::Label => (SIZE_CONTENT, SIZE_CONTENT),
            _ => (100, 40),
        };
        NativeStyle {
            x: 0,
            y: 0,
            width,
            height,
            opacity: 255,
            scale: 256,
            rotate: 0,
        }
    }
}

/// Write and layout counts, used as a spy in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounters {
    pub attribute_writes: usize,
    pub style_writes: usize,
    pub layout_requests: usize,
}

type ValueKey = (Attribute, u32);

#[derive(Debug)]
struct Node {
    kind: WidgetKind,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
    style: NativeStyle,
    values: HashMap<ValueKey, AttrValue>,
    indicators: u32,
    tabs: u32,
}

impl Node {
    fn new(kind: WidgetKind, parent: Option<WidgetId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            style: kind.default_style(),
            values: HashMap::new(),
            indicators: 0,
            tabs: 0,
        }
    }

    fn value(&self, key: ValueKey) -> AttrValue {
        self.values
            .get(&key)
            .cloned()
            .unwrap_or_else(|| default_value(key.0))
    }

    fn flag(&self, attribute: Attribute) -> bool {
        self.value((attribute, 0)).as_boolean().unwrap_or(false)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// In-memory retained widget tree implementing [`Toolkit`].
///
/// Slots are reused after deletion with a bumped generation, so handles to
/// deleted widgets are reported as stale.
#[derive(Debug)]
pub struct WidgetTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    echo_writes: bool,
    counters: WriteCounters,
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            echo_writes: true,
            counters: WriteCounters::default(),
        }
    }
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether writing a user-editable attribute fires `ValueChanged` from
    /// inside the write. On by default.
    pub fn set_echo_writes(&mut self, echo: bool) {
        self.echo_writes = echo;
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn create(
        &mut self,
        kind: WidgetKind,
        parent: Option<WidgetId>,
    ) -> Result<WidgetId, ToolkitError> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(Node::new(kind, parent));
                WidgetId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(Node::new(kind, parent)),
                });
                WidgetId::new(index, 0)
            }
        };

        if let Some(parent) = parent {
            self.node_mut(parent)?.children.push(id);
        }
        trace!("[headless] Created {:?} {}", kind, id);
        Ok(id)
    }

    /// Delete a widget and its whole subtree.
    pub fn delete(&mut self, widget: WidgetId) -> Result<(), ToolkitError> {
        let parent = self.node(widget)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|child| *child != widget);
        }

        let mut pending = vec![widget];
        while let Some(id) = pending.pop() {
            let slot = &mut self.slots[id.index as usize];
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                trace!("[headless] Deleted {}", id);
            }
        }
        Ok(())
    }

    pub fn kind(&self, widget: WidgetId) -> Result<WidgetKind, ToolkitError> {
        Ok(self.node(widget)?.kind)
    }

    pub fn parent(&self, widget: WidgetId) -> Result<Option<WidgetId>, ToolkitError> {
        Ok(self.node(widget)?.parent)
    }

    pub fn children(&self, widget: WidgetId) -> Result<&[WidgetId], ToolkitError> {
        Ok(&self.node(widget)?.children)
    }

    pub fn style(&self, widget: WidgetId) -> Result<NativeStyle, ToolkitError> {
        Ok(self.node(widget)?.style)
    }

    /// Add a needle/arc indicator to a meter.
    pub fn add_indicator(&mut self, meter: WidgetId) -> Result<SubObjectId, ToolkitError> {
        let node = self.node_mut(meter)?;
        if node.kind != WidgetKind::Meter {
            return Err(ToolkitError::Unsupported {
                widget: meter,
                attribute: Attribute::MeterIndicatorValue,
            });
        }
        let id = SubObjectId(node.indicators);
        node.indicators += 1;
        Ok(id)
    }

    /// Add a tab and return its index.
    pub fn add_tab(&mut self, tabview: WidgetId, name: &str) -> Result<u32, ToolkitError> {
        let node = self.node_mut(tabview)?;
        if node.kind != WidgetKind::Tabview {
            return Err(ToolkitError::Unsupported {
                widget: tabview,
                attribute: Attribute::TabName,
            });
        }
        let index = node.tabs;
        node.tabs += 1;
        node.values
            .insert((Attribute::TabName, index), AttrValue::Text(name.to_string()));
        Ok(index)
    }

    pub fn counters(&self) -> WriteCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = WriteCounters::default();
    }

    /// Simulate the user editing a widget. Not counted as a write.
    pub fn input(
        &mut self,
        widget: WidgetId,
        attribute: Attribute,
        aux: AuxParams,
        value: AttrValue,
    ) -> Result<Vec<NativeEvent>, ToolkitError> {
        self.store(widget, attribute, aux, value)?;
        Ok(vec![NativeEvent::value_changed(widget)])
    }

    /// Simulate a press and release. Checkable widgets toggle their state.
    pub fn click(&mut self, widget: WidgetId) -> Result<Vec<NativeEvent>, ToolkitError> {
        let node = self.node_mut(widget)?;
        if node.flag(Attribute::DisabledState) {
            return Ok(Vec::new());
        }

        let mut events = vec![NativeEvent::new(widget, NativeEventKind::Pressed)];
        if node.kind.is_checkable() {
            let checked = node.flag(Attribute::CheckedState);
            node.values
                .insert((Attribute::CheckedState, 0), AttrValue::Boolean(!checked));
            events.push(NativeEvent::value_changed(widget));
        }
        events.push(NativeEvent::new(widget, NativeEventKind::Released));
        events.push(NativeEvent::new(widget, NativeEventKind::Clicked));
        Ok(events)
    }

    fn node(&self, widget: WidgetId) -> Result<&Node, ToolkitError> {
        self.slots
            .get(widget.index as usize)
            .filter(|slot| slot.generation == widget.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(ToolkitError::StaleWidget(widget))
    }

    fn node_mut(&mut self, widget: WidgetId) -> Result<&mut Node, ToolkitError> {
        self.slots
            .get_mut(widget.index as usize)
            .filter(|slot| slot.generation == widget.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(ToolkitError::StaleWidget(widget))
    }

    fn value_key(
        widget: WidgetId,
        node: &Node,
        attribute: Attribute,
        aux: AuxParams,
    ) -> Result<ValueKey, ToolkitError> {
        if !node.kind.supports(attribute) {
            return Err(ToolkitError::Unsupported { widget, attribute });
        }
        let sub = if attribute.info().needs_sub_object {
            match aux.sub_object {
                Some(SubObjectId(id)) if id < node.indicators => id,
                _ => return Err(ToolkitError::MissingSubObject { widget }),
            }
        } else if attribute == Attribute::TabName {
            u32::try_from(aux.param)
                .ok()
                .filter(|index| *index < node.tabs)
                .ok_or(ToolkitError::MissingSubObject { widget })?
        } else {
            0
        };
        Ok((attribute, sub))
    }

    fn store(
        &mut self,
        widget: WidgetId,
        attribute: Attribute,
        aux: AuxParams,
        value: AttrValue,
    ) -> Result<(), ToolkitError> {
        let node = self.node_mut(widget)?;
        let key = Self::value_key(widget, node, attribute, aux)?;
        if !fits(attribute, &value) {
            return Err(ToolkitError::TypeMismatch { widget, attribute });
        }

        let value = match (attribute, value) {
            (Attribute::RollerOptions, AttrValue::Text(options)) => AttrValue::Text(
                repeat_roller_options(&options, RollerMode::from_param(aux.param)),
            ),
            (_, value) => value,
        };
        node.values.insert(key, value);
        Ok(())
    }
}

fn default_value(attribute: Attribute) -> AttrValue {
    match attribute.value_kind() {
        ValueKind::Integer => AttrValue::Integer(0),
        ValueKind::Boolean => AttrValue::Boolean(false),
        ValueKind::Text | ValueKind::OptionList => AttrValue::Text(String::new()),
    }
}

fn fits(attribute: Attribute, value: &AttrValue) -> bool {
    matches!(
        (attribute.value_kind(), value),
        (ValueKind::Integer, AttrValue::Integer(_))
            | (ValueKind::Boolean, AttrValue::Boolean(_))
            | (ValueKind::Text | ValueKind::OptionList, AttrValue::Text(_))
    )
}

impl Toolkit for WidgetTree {
    fn is_alive(&self, widget: WidgetId) -> bool {
        self.node(widget).is_ok()
    }

    fn local_style(&self, widget: WidgetId, prop: StyleProp) -> Result<i32, ToolkitError> {
        Ok(self.node(widget)?.style.get(prop))
    }

    fn set_local_style(
        &mut self,
        widget: WidgetId,
        prop: StyleProp,
        value: i32,
    ) -> Result<(), ToolkitError> {
        self.node_mut(widget)?.style.set(prop, value);
        self.counters.style_writes += 1;
        Ok(())
    }

    fn request_layout(&mut self, widget: WidgetId) -> Result<(), ToolkitError> {
        self.node(widget)?;
        self.counters.layout_requests += 1;
        Ok(())
    }

    fn has_state(&self, widget: WidgetId, state: WidgetState) -> Result<bool, ToolkitError> {
        let node = self.node(widget)?;
        Ok(match state {
            WidgetState::Checked => node.flag(Attribute::CheckedState),
            WidgetState::Disabled => node.flag(Attribute::DisabledState),
        })
    }

    fn read_attribute(
        &self,
        widget: WidgetId,
        attribute: Attribute,
        aux: AuxParams,
    ) -> Result<AttrValue, ToolkitError> {
        let node = self.node(widget)?;
        let key = Self::value_key(widget, node, attribute, aux)?;
        Ok(node.value(key))
    }

    fn write_attribute(
        &mut self,
        widget: WidgetId,
        attribute: Attribute,
        aux: AuxParams,
        value: AttrValue,
    ) -> Result<Vec<NativeEvent>, ToolkitError> {
        self.store(widget, attribute, aux, value)?;
        self.counters.attribute_writes += 1;

        let echoes = self.echo_writes && attribute.info().assign_context.is_some();
        Ok(if echoes {
            vec![NativeEvent::value_changed(widget)]
        } else {
            Vec::new()
        })
    }
}
