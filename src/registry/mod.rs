//! The Widget Schema Registry.
//!
//! Editor nodes store most of their configuration as a positional widget array whose
//! meaning depends on the node's operation type. The registry maps each operation type
//! to a [`WidgetDecoder`] that turns that array into named inputs, so supporting a new
//! node type is a table entry rather than new control flow.

use crate::graph::RAW_PARAMS_KEY;
use crate::template::{Node, Widgets};
use ahash::AHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

mod decoder;
mod defaults;

pub use decoder::{DeclaredOrderDecoder, PositionalDecoder, WidgetDecoder, WidgetField};
pub use defaults::DEFAULT_OPERATION_TYPES;

/// Outcome of decoding one node's widgets.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetDecode {
    /// Widgets mapped to named literal inputs.
    Named(BTreeMap<String, Value>),
    /// Widgets kept verbatim under [`RAW_PARAMS_KEY`]. `known` is `false` when the
    /// operation type has no registered decoder.
    Raw { params: Vec<Value>, known: bool },
}

impl WidgetDecode {
    /// Flattens the outcome into literal inputs.
    pub fn into_inputs(self) -> BTreeMap<String, Value> {
        match self {
            WidgetDecode::Named(inputs) => inputs,
            WidgetDecode::Raw { params, .. } => {
                BTreeMap::from([(RAW_PARAMS_KEY.to_string(), Value::Array(params))])
            }
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, WidgetDecode::Raw { known: false, .. })
    }
}

#[derive(Clone)]
pub struct WidgetSchemaRegistry {
    decoders: AHashMap<String, Arc<dyn WidgetDecoder>>,
}

impl Default for WidgetSchemaRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for WidgetSchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        types.sort_unstable();
        f.debug_struct("WidgetSchemaRegistry")
            .field("operation_types", &types)
            .finish()
    }
}

impl WidgetSchemaRegistry {
    /// A registry that knows no operation types.
    pub fn empty() -> Self {
        Self {
            decoders: AHashMap::new(),
        }
    }

    /// A registry preloaded with the built-in schemas.
    pub fn with_defaults() -> Self {
        let mut decoders = AHashMap::new();
        defaults::register_default_decoders(&mut decoders);
        Self { decoders }
    }

    /// Registers a decoder under its own operation type, replacing any previous one.
    pub fn register(&mut self, decoder: Arc<dyn WidgetDecoder>) {
        self.decoders
            .insert(decoder.operation_type().to_string(), decoder);
    }

    /// Registers a positional schema from a plain list of field names.
    pub fn register_positional<S: AsRef<str>>(&mut self, operation_type: &str, names: &[S]) {
        self.register(Arc::new(PositionalDecoder::from_names(operation_type, names)));
    }

    /// Makes `user_type` decode exactly like the already registered `known_type`.
    /// Returns `false` when `known_type` is not registered.
    pub fn register_alias(&mut self, user_type: &str, known_type: &str) -> bool {
        match self.decoders.get(known_type).cloned() {
            Some(decoder) => {
                self.decoders.insert(user_type.to_string(), decoder);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, operation_type: &str) -> bool {
        self.decoders.contains_key(operation_type)
    }

    pub fn get(&self, operation_type: &str) -> Option<&dyn WidgetDecoder> {
        self.decoders.get(operation_type).map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Positional index of `input_name` for `operation_type`, if the layout is fixed.
    pub fn position_of(&self, operation_type: &str, input_name: &str) -> Option<usize> {
        self.get(operation_type)
            .and_then(|decoder| decoder.position_of(input_name))
    }

    /// Decodes a node's widgets.
    ///
    /// Keyed widgets need no schema and are returned as-is. A known type whose array is
    /// too short for any field keeps the array verbatim. An unknown type always keeps its
    /// array, even an empty one.
    pub fn decode(&self, node: &Node) -> WidgetDecode {
        let params = match &node.widgets {
            Widgets::Keyed(map) => {
                return WidgetDecode::Named(
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                );
            }
            Widgets::Positional(params) => params,
            Widgets::Absent => return WidgetDecode::Named(BTreeMap::new()),
        };

        match self.get(&node.operation_type) {
            None => WidgetDecode::Raw {
                params: params.clone(),
                known: false,
            },
            Some(_) if params.is_empty() => WidgetDecode::Named(BTreeMap::new()),
            Some(decoder) => {
                let inputs = decoder.decode(node);
                if inputs.is_empty() {
                    WidgetDecode::Raw {
                        params: params.clone(),
                        known: true,
                    }
                } else {
                    WidgetDecode::Named(inputs)
                }
            }
        }
    }

    /// Decodes a bare positional array for `operation_type`, with no declared inputs.
    pub fn decode_params(&self, operation_type: &str, params: &[Value]) -> WidgetDecode {
        let node = Node {
            id: String::new(),
            operation_type: operation_type.to_string(),
            declared_inputs: Vec::new(),
            widgets: Widgets::Positional(params.to_vec()),
            enabled: true,
        };
        self.decode(&node)
    }
}
