//! Resource: the per-item execution record threaded through the dispatch pipeline.
//!
//! A resource is created empty for each input item, receives its parameters exactly once
//! (from flags or from one piped item), and is settled exactly once by the execution hook
//! or by a hook failure. After dispatch it is handed, read-only, to the renderer.

use crate::error::RackError;
use serde_json::{Map, Value};

/// An ordered field-name → value mapping returned by a command.
pub type ResultMap = Map<String, Value>;

/// What a successful execution produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A single record (get, create, delete).
    Record(ResultMap),
    /// An ordered sequence of records (list).
    Records(Vec<ResultMap>),
}

impl Payload {
    /// The records this payload contributes to output, in order.
    pub fn records(&self) -> &[ResultMap] {
        match self {
            Payload::Record(map) => std::slice::from_ref(map),
            Payload::Records(maps) => maps.as_slice(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Payload::Record(map) => Value::Object(map.clone()),
            Payload::Records(maps) => {
                Value::Array(maps.iter().cloned().map(Value::Object).collect())
            }
        }
    }
}

/// Lifecycle state of a resource.
#[derive(Debug)]
pub enum ResourceState {
    Pending,
    Succeeded(Payload),
    Failed(RackError),
}

/// One logical operation instance.
#[derive(Debug)]
pub struct Resource<P> {
    index: usize,
    label: Option<String>,
    params: Option<P>,
    state: ResourceState,
}

impl<P> Resource<P> {
    pub fn new(index: usize, label: Option<String>) -> Self {
        Self {
            index,
            label,
            params: None,
            state: ResourceState::Pending,
        }
    }

    /// Position of the item in the input sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn params(&self) -> Option<&P> {
        self.params.as_ref()
    }

    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    pub(crate) fn set_params(&mut self, params: P) {
        debug_assert!(self.params.is_none(), "params populated twice");
        self.params = Some(params);
    }

    /// Record the outcome of this item. Only the first outcome is kept.
    pub(crate) fn settle(&mut self, outcome: Result<Payload, RackError>) {
        debug_assert!(self.is_pending(), "resource {} settled twice", self.index);
        if !self.is_pending() {
            return;
        }
        self.state = match outcome {
            Ok(payload) => ResourceState::Succeeded(payload),
            Err(err) => ResourceState::Failed(err),
        };
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ResourceState::Pending)
    }

    pub fn result(&self) -> Option<&Payload> {
        match &self.state {
            ResourceState::Succeeded(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn err(&self) -> Option<&RackError> {
        match &self.state {
            ResourceState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Name used when reporting this item: its label, or its position.
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("item {}", self.index),
        }
    }
}
