//! The Resolved Graph intermediate representation.
//!
//! Both template shapes normalize into a [`ResolvedGraph`]: a map from node id to
//! `{class_type, inputs}` where every input is a literal or a reference to another
//! node's output slot. A [`CompiledJob`] is the same structure once per-shot
//! parameters have been applied, serialized exactly as the execution backend expects.

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Input key holding a positional widget array the registry could not decode.
pub const RAW_PARAMS_KEY: &str = "_raw_params";

/// Key some editors and older exports use for the same undecoded array.
pub const LEGACY_RAW_PARAMS_KEY: &str = "widgets_values";

/// A single input of a resolved node.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// A literal widget value, serialized as-is.
    Literal(Value),
    /// Output `slot` of node `node_id`, serialized as `[node_id, slot]`.
    Link { node_id: String, slot: u64 },
    /// A link whose source could not be found, serialized as `[link_id]`.
    Dangling { link_id: String },
}

impl InputValue {
    pub fn link(node_id: impl Into<String>, slot: u64) -> Self {
        InputValue::Link {
            node_id: node_id.into(),
            slot,
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        InputValue::Literal(value.into())
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            InputValue::Literal(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        !matches!(self, InputValue::Literal(_))
    }

    /// Interprets a resolved-map input. A `[string, non-negative integer]` pair is a
    /// reference unless it sits under one of the raw passthrough keys.
    pub fn from_json(key: &str, value: Value) -> Self {
        if key == RAW_PARAMS_KEY || key == LEGACY_RAW_PARAMS_KEY {
            return InputValue::Literal(value);
        }
        if let Value::Array(items) = &value {
            if let [Value::String(node_id), slot] = items.as_slice() {
                if let Some(slot) = slot.as_u64() {
                    return InputValue::link(node_id.clone(), slot);
                }
            }
        }
        InputValue::Literal(value)
    }
}

impl Serialize for InputValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InputValue::Literal(v) => v.serialize(serializer),
            InputValue::Link { node_id, slot } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(node_id)?;
                seq.serialize_element(slot)?;
                seq.end()
            }
            InputValue::Dangling { link_id } => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(link_id)?;
                seq.end()
            }
        }
    }
}

/// How [`ResolvedNode::overwrite_widget`] placed a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetWrite {
    /// An existing keyed input was replaced.
    Keyed,
    /// A slot of the undecoded positional array was replaced.
    Positional(usize),
    /// The input did not exist and was added.
    Inserted,
}

/// One node of a resolved graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResolvedNode")]
pub struct ResolvedNode {
    #[serde(rename = "class_type")]
    pub operation_type: String,
    pub inputs: BTreeMap<String, InputValue>,
}

#[derive(Deserialize)]
struct RawResolvedNode {
    #[serde(rename = "class_type", alias = "operation_type")]
    operation_type: String,
    #[serde(default)]
    inputs: BTreeMap<String, Value>,
}

impl TryFrom<RawResolvedNode> for ResolvedNode {
    type Error = String;

    fn try_from(raw: RawResolvedNode) -> Result<Self, Self::Error> {
        let inputs = raw
            .inputs
            .into_iter()
            .map(|(key, value)| {
                let input = InputValue::from_json(&key, value);
                (key, input)
            })
            .collect();
        Ok(Self {
            operation_type: raw.operation_type,
            inputs,
        })
    }
}

impl ResolvedNode {
    pub fn new(operation_type: impl Into<String>) -> Self {
        Self {
            operation_type: operation_type.into(),
            inputs: BTreeMap::new(),
        }
    }

    pub fn input(&self, name: &str) -> Option<&InputValue> {
        self.inputs.get(name)
    }

    pub fn literal(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name).and_then(InputValue::as_literal)
    }

    pub fn set_literal(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.inputs
            .insert(name.into(), InputValue::Literal(value.into()));
    }

    /// The undecoded positional widget array, if the node still carries one.
    pub fn raw_params(&self) -> Option<&Vec<Value>> {
        [RAW_PARAMS_KEY, LEGACY_RAW_PARAMS_KEY]
            .iter()
            .find_map(|key| match self.literal(key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
    }

    fn raw_params_mut(&mut self) -> Option<&mut Vec<Value>> {
        let key = [RAW_PARAMS_KEY, LEGACY_RAW_PARAMS_KEY]
            .into_iter()
            .find(|key| matches!(self.literal(key), Some(Value::Array(_))))?;
        match self.inputs.get_mut(key) {
            Some(InputValue::Literal(Value::Array(items))) => Some(items),
            _ => None,
        }
    }

    /// Writes a widget value into whichever representation the node uses.
    ///
    /// A keyed input wins; otherwise `position` addresses the raw positional array; if
    /// neither applies the value is added as a keyed input.
    pub fn overwrite_widget(
        &mut self,
        name: &str,
        value: Value,
        position: Option<usize>,
    ) -> WidgetWrite {
        if let Some(existing) = self.inputs.get_mut(name) {
            *existing = InputValue::Literal(value);
            return WidgetWrite::Keyed;
        }
        if let (Some(index), Some(params)) = (position, self.raw_params_mut()) {
            if index < params.len() {
                params[index] = value;
                return WidgetWrite::Positional(index);
            }
        }
        self.set_literal(name, value);
        WidgetWrite::Inserted
    }
}

/// Node id -> resolved node. Ordered so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedGraph {
    nodes: BTreeMap<String, ResolvedNode>,
}

impl ResolvedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node_id: impl Into<String>, node: ResolvedNode) {
        self.nodes.insert(node_id.into(), node);
    }

    pub fn get(&self, node_id: &str) -> Option<&ResolvedNode> {
        self.nodes.get(node_id)
    }

    pub fn get_mut(&mut self, node_id: &str) -> Option<&mut ResolvedNode> {
        self.nodes.get_mut(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ResolvedNode> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, ResolvedNode> {
        self.nodes.iter_mut()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Parses a document already in resolved-map shape.
    pub(crate) fn from_value(value: Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}

impl<'de> Deserialize<'de> for InputValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Without the key in scope, a stand-alone input is classified as if it were named.
        let value = Value::deserialize(deserializer)?;
        Ok(InputValue::from_json("", value))
    }
}

/// A fully injected, per-shot job ready to submit to the execution backend.
///
/// A compiled job is never mutated after it is produced; it only exposes read access.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompiledJob(ResolvedGraph);

impl CompiledJob {
    pub(crate) fn new(graph: ResolvedGraph) -> Self {
        Self(graph)
    }

    pub fn graph(&self) -> &ResolvedGraph {
        &self.0
    }

    pub fn get(&self, node_id: &str) -> Option<&ResolvedNode> {
        self.0.get(node_id)
    }

    pub fn into_graph(self) -> ResolvedGraph {
        self.0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
