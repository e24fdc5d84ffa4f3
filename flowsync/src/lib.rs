//! Synchronization between a data-flow engine and a retained-mode widget toolkit.
//!
//! Each tick the [`Runtime`] advances the flow engine, pushes changed flow
//! values into widgets through the update-task queue, and evaluates keyframe
//! timelines for the active screen. Native widget events travel the other way
//! through the event bridge, with a feedback guard dropping the echoes of the
//! runtime's own writes.

pub mod attribute;
pub mod bridge;
pub mod config;
pub mod easing;
pub mod error;
pub mod flow;
pub mod guard;
pub mod headless;
pub mod keyframe;
pub mod report;
pub mod runtime;
pub mod timeline;
pub mod toolkit;
pub mod update;

pub use attribute::{AttrValue, Attribute, AuxParams, RollerMode, SubObjectId, ValueKind};
pub use bridge::{EventBinding, EventBridge, EventFilter};
pub use config::{InvertedKeyframePolicy, RuntimeConfig};
pub use easing::Easing;
pub use error::{EvalError, SyncError, TimelineError, ToolkitError};
pub use flow::{FlowEngine, FlowStateId, PropertyRef};
pub use guard::FeedbackGuard;
pub use keyframe::{Keyframe, RawKeyframe, TimelineProperties};
pub use report::{AnimateReport, DispatchReport, TickOutcome, TickReport, UpdateReport};
pub use runtime::Runtime;
pub use timeline::{TimelineRegistry, WidgetTimeline};
pub use toolkit::{
    NativeEvent, NativeEventKind, SIZE_CONTENT, StyleProp, Toolkit, WidgetId, WidgetState,
};
pub use update::{UpdateTask, UpdateTaskQueue};
