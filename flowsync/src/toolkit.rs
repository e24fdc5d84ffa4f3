//! The widget toolkit seam.
//!
//! The synchronization layer never owns widgets. It talks to whatever
//! retained-mode toolkit hosts them through [`Toolkit`], addressing widgets by
//! generation-checked [`WidgetId`] handles.

use std::fmt;

use crate::attribute::{AttrValue, Attribute, AuxParams};
use crate::error::ToolkitError;

/// Generation-checked widget handle.
///
/// A toolkit reuses `index` after a widget is deleted but bumps `generation`,
/// so a handle kept past deletion is detected as stale instead of aliasing a
/// new widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId {
    pub index: u32,
    pub generation: u32,
}

impl WidgetId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}v{}", self.index, self.generation)
    }
}

/// Local style properties driven by timelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProp {
    X,
    Y,
    /// [`SIZE_CONTENT`] means sized by content. Timelines leave that value
    /// alone, and an animated width starting from it interpolates from -1.
    Width,
    /// Same sentinel handling as [`StyleProp::Width`].
    Height,
    /// 0 (transparent) to 255 (opaque).
    Opacity,
    /// Toolkit-native scale units (e.g. 256 = 1x zoom).
    Scale,
    /// Toolkit-native rotation units (e.g. 0.1 degree).
    Rotate,
}

impl StyleProp {
    pub const ALL: [StyleProp; 7] = [
        StyleProp::X,
        StyleProp::Y,
        StyleProp::Width,
        StyleProp::Height,
        StyleProp::Opacity,
        StyleProp::Scale,
        StyleProp::Rotate,
    ];
}

/// Width/height value meaning "sized by content".
///
/// It is an ordinary integer: a computed width or height that lands exactly on
/// it is not written back either. Give a widget an explicit size before
/// animating that dimension.
pub const SIZE_CONTENT: i32 = -1;

/// Widget states a toolkit can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetState {
    Checked,
    Disabled,
}

/// Native event codes a toolkit dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEventKind {
    Pressed,
    Pressing,
    Released,
    Clicked,
    LongPressed,
    Focused,
    Defocused,
    ValueChanged,
    Ready,
    Cancel,
}

/// A native event fired by the toolkit for one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeEvent {
    pub widget: WidgetId,
    pub kind: NativeEventKind,
}

impl NativeEvent {
    pub fn new(widget: WidgetId, kind: NativeEventKind) -> Self {
        Self { widget, kind }
    }

    pub fn value_changed(widget: WidgetId) -> Self {
        Self::new(widget, NativeEventKind::ValueChanged)
    }
}

/// A retained-mode widget toolkit.
///
/// Events a write triggers synchronously inside the toolkit are returned from
/// [`Toolkit::write_attribute`] so the caller can dispatch them while it still
/// knows which write produced them.
pub trait Toolkit {
    /// Whether the handle still refers to a live widget.
    fn is_alive(&self, widget: WidgetId) -> bool;

    fn local_style(&self, widget: WidgetId, prop: StyleProp) -> Result<i32, ToolkitError>;

    fn set_local_style(
        &mut self,
        widget: WidgetId,
        prop: StyleProp,
        value: i32,
    ) -> Result<(), ToolkitError>;

    /// Ask the toolkit to lay the widget out again before the next paint.
    fn request_layout(&mut self, widget: WidgetId) -> Result<(), ToolkitError>;

    fn has_state(&self, widget: WidgetId, state: WidgetState) -> Result<bool, ToolkitError>;

    fn read_attribute(
        &self,
        widget: WidgetId,
        attribute: Attribute,
        aux: AuxParams,
    ) -> Result<AttrValue, ToolkitError>;

    /// Write an attribute and return the native events the write fired.
    fn write_attribute(
        &mut self,
        widget: WidgetId,
        attribute: Attribute,
        aux: AuxParams,
        value: AttrValue,
    ) -> Result<Vec<NativeEvent>, ToolkitError>;
}
