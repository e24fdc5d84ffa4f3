//! Error types for the synchronization layer.
//!
//! Registration errors are returned to the caller. Everything that can go
//! wrong while a tick runs is logged and counted instead, see [`crate::runtime`].

use crate::attribute::Attribute;
use crate::toolkit::WidgetId;

/// Failure reported by the flow engine while evaluating or assigning a property.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{context}: {message}")]
pub struct EvalError {
    /// Error-context string supplied by the caller (e.g. "Failed to evaluate Value in Slider widget").
    pub context: String,
    /// Engine-side description of what went wrong.
    pub message: String,
}

impl EvalError {
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by a widget toolkit backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolkitError {
    /// The handle refers to a widget that has been deleted.
    #[error("Stale widget handle {0}")]
    StaleWidget(WidgetId),

    /// The widget type has no such attribute.
    #[error("Widget {widget} does not support {attribute:?}")]
    Unsupported {
        widget: WidgetId,
        attribute: Attribute,
    },

    /// The attribute needs a sub-object (e.g. a meter indicator) that was not supplied or does not exist.
    #[error("Widget {widget} is missing the sub-object required for this attribute")]
    MissingSubObject { widget: WidgetId },

    /// The value has the wrong shape for the attribute.
    #[error("Type mismatch writing {attribute:?} on widget {widget}")]
    TypeMismatch {
        widget: WidgetId,
        attribute: Attribute,
    },
}

/// Errors raised when registering timeline keyframes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    /// `start` is after `end`.
    #[error("Keyframe range is inverted: start {start} > end {end}")]
    InvertedRange { start: f32, end: f32 },

    /// `start` or `end` is NaN or infinite.
    #[error("Keyframe range must be finite")]
    NonFinite,

    /// CP1/CP2 were enabled without X or Y.
    #[error("Bezier control points require X or Y to be enabled")]
    ControlPointsWithoutPosition,

    /// Easing id outside the easing table.
    #[error("Unknown easing function id {0}")]
    UnknownEasing(u8),
}

/// Umbrella error for callers that do not care which layer failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Toolkit(#[from] ToolkitError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),
}
