//! Non-fatal compilation signals.
//!
//! A signal records a degradation the compiler chose to tolerate: the job is still
//! produced, but some part of it is not what the template or shot asked for.

use std::fmt;
use thiserror::Error;

/// The logical role a designated node plays in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Text,
    NegativeText,
    Image,
    Temporal,
    Output,
    LowNoiseSlot,
    HighNoiseSlot,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeRole::Text => "text",
            NodeRole::NegativeText => "negative text",
            NodeRole::Image => "image",
            NodeRole::Temporal => "temporal",
            NodeRole::Output => "output",
            NodeRole::LowNoiseSlot => "low-noise slot",
            NodeRole::HighNoiseSlot => "high-noise slot",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Signal {
    #[error("{role} node '{node_id}' is not present in the graph; injection skipped")]
    MissingNode { role: NodeRole, node_id: String },

    #[error("Input '{input}' of node '{node_id}' references unknown link {link_id}")]
    DanglingLink {
        node_id: String,
        input: String,
        link_id: String,
    },

    #[error("Node '{node_id}' has unknown operation type '{operation_type}'; widgets passed through")]
    UnsupportedOperation {
        node_id: String,
        operation_type: String,
    },

    #[error("Camera tag '{tag}' at position {index} exceeds the {capacity} available modifier slots")]
    SlotOverflow {
        tag: String,
        index: usize,
        capacity: usize,
    },

    #[error("Camera tag '{tag}' leaves slot node '{node_id}' untouched (empty module)")]
    SkippedModule { tag: String, node_id: String },

    #[error("Camera tag '{tag}' matched no catalog entry; using default")]
    UnresolvedCamera { tag: String },
}

impl Signal {
    fn log(&self) {
        match self {
            Signal::SkippedModule { .. } | Signal::UnresolvedCamera { .. } => {
                tracing::debug!("{}", self)
            }
            _ => tracing::warn!("{}", self),
        }
    }
}

/// Ordered collection of the signals raised while compiling one template or shot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    signals: Vec<Signal>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a signal and logs it.
    pub fn push(&mut self, signal: Signal) {
        signal.log();
        self.signals.push(signal);
    }

    /// Appends signals that were already logged when they were first recorded.
    pub fn extend(&mut self, other: Diagnostics) {
        self.signals.extend(other.signals);
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter()
    }
}
