use crate::graph::ResolvedGraph;
use serde_json::{Map, Value};

/// A workflow template in one of its two authoring shapes.
///
/// The shape is detected once at the boundary; downstream code only ever sees a
/// [`ResolvedGraph`] produced by the normalizer.
#[derive(Debug, Clone)]
pub enum WorkflowTemplate {
    /// Node/link graph authored in the visual editor.
    Editor(EditorGraph),
    /// Node map that is already keyed by id with named inputs.
    Resolved(ResolvedGraph),
}

/// The canonical editor graph: flat node and link collections cross-referenced by id.
#[derive(Debug, Clone, Default)]
pub struct EditorGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

/// A single unit of work in the editor graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub operation_type: String,
    pub declared_inputs: Vec<DeclaredInput>,
    pub widgets: Widgets,
    /// `false` for muted or bypassed nodes, which never reach the resolved graph.
    pub enabled: bool,
}

impl Node {
    /// The positional widget array, empty when the node stores keyed widgets.
    pub fn positional_params(&self) -> &[Value] {
        match &self.widgets {
            Widgets::Positional(params) => params,
            Widgets::Keyed(_) | Widgets::Absent => &[],
        }
    }

    pub fn is_linked(&self, input_name: &str) -> bool {
        self.declared_inputs
            .iter()
            .any(|input| input.name == input_name && input.is_link())
    }
}

/// A named input socket. `link` is set when the socket is fed by another node.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredInput {
    pub name: String,
    pub link: Option<String>,
    /// The socket is a converted widget rather than a pure data input.
    pub is_widget: bool,
}

impl DeclaredInput {
    pub fn is_link(&self) -> bool {
        self.link.is_some()
    }
}

/// Literal widget values of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Widgets {
    /// Values stored by position; the registry knows which input each slot encodes.
    Positional(Vec<Value>),
    /// Values already stored by input name.
    Keyed(Map<String, Value>),
    /// The node carries no widget values at all.
    Absent,
}

impl Default for Widgets {
    fn default() -> Self {
        Widgets::Absent
    }
}

/// A directed edge from a node's output slot to another node's input.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: String,
    pub source_node_id: String,
    pub source_slot: u64,
    pub target_node_id: Option<String>,
    pub target_slot: Option<u64>,
    pub target_input_name: Option<String>,
}
