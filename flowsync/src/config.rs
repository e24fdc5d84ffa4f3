//! Runtime configuration.

/// What registration does with a keyframe whose `start` is after its `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvertedKeyframePolicy {
    /// Registration fails with [`crate::error::TimelineError::InvertedRange`].
    #[default]
    Reject,
    /// The keyframe is stored but is never active and never snaps.
    Inactive,
}

/// Per-screen synchronization runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Name used in log lines.
    pub name: &'static str,

    pub inverted_keyframes: InvertedKeyframePolicy,

    /// Buffer size for meter tick labels; at most `tick_label_capacity - 1`
    /// bytes of an evaluated label are kept, cut on a char boundary.
    pub tick_label_capacity: usize,

    /// Consult the feedback guard before forwarding widget events into flow
    /// state. Only turned off for diagnostics.
    pub echo_suppression: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "screen",
            inverted_keyframes: InvertedKeyframePolicy::Reject,
            tick_label_capacity: 32,
            echo_suppression: true,
        }
    }
}

impl RuntimeConfig {
    /// Create a new config with the given name.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    pub fn inverted_keyframes(mut self, policy: InvertedKeyframePolicy) -> Self {
        self.inverted_keyframes = policy;
        self
    }

    pub fn tick_label_capacity(mut self, capacity: usize) -> Self {
        self.tick_label_capacity = capacity;
        self
    }

    /// Forward every widget event, including echoes of the runtime's own writes.
    pub fn without_echo_suppression(mut self) -> Self {
        self.echo_suppression = false;
        self
    }
}
