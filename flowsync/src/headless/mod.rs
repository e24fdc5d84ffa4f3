//! In-memory toolkit and flow engine.
//!
//! Enough of a retained widget tree and a flow interpreter to drive the
//! runtime without a display: tests and the demo binary run against these.

mod flow;
mod tree;

pub use flow::{MemoryFlow, Value};
pub use tree::{WidgetKind, WidgetTree, WriteCounters};
