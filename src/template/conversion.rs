use super::definition::{DeclaredInput, EditorGraph, Link, Node, Widgets, WorkflowTemplate};
use crate::error::ConfigurationError;
use crate::graph::ResolvedGraph;
use crate::ui::{UiLink, UiNode, UiWorkflow};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Editor modes that keep a node out of the executed graph.
const MUTED_MODE: u32 = 2;
const BYPASSED_MODE: u32 = 4;

/// A trait for authoring formats that can be converted into the canonical [`EditorGraph`].
///
/// The built-in implementation covers the visual editor's export format. Implement it on
/// your own structs to feed other authoring tools into the compiler.
///
/// # Example
///
/// ```rust,no_run
/// use satsuei::error::ConfigurationError;
/// use satsuei::template::{EditorGraph, IntoEditorGraph, Node, Widgets};
///
/// struct MyStep { name: String, kind: String }
/// struct MyPlan { steps: Vec<MyStep> }
///
/// impl IntoEditorGraph for MyPlan {
///     fn into_editor_graph(self) -> Result<EditorGraph, ConfigurationError> {
///         let nodes = self
///             .steps
///             .into_iter()
///             .map(|step| Node {
///                 id: step.name,
///                 operation_type: step.kind,
///                 declared_inputs: vec![],
///                 widgets: Widgets::default(),
///                 enabled: true,
///             })
///             .collect();
///         Ok(EditorGraph { nodes, links: vec![] })
///     }
/// }
/// ```
pub trait IntoEditorGraph {
    /// Consumes the object and converts it into an editor graph.
    fn into_editor_graph(self) -> Result<EditorGraph, ConfigurationError>;
}

impl IntoEditorGraph for UiWorkflow {
    fn into_editor_graph(self) -> Result<EditorGraph, ConfigurationError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (index, raw) in self.nodes.into_iter().enumerate() {
            let ui_node: UiNode =
                serde_json::from_value(raw).map_err(|e| ConfigurationError::MalformedNode {
                    index,
                    message: e.to_string(),
                })?;
            nodes.push(convert_node(ui_node));
        }

        let mut links = Vec::with_capacity(self.links.len());
        for (index, raw) in self.links.into_iter().enumerate() {
            match parse_link(raw) {
                Some(link) => links.push(link),
                None => tracing::warn!("Ignoring malformed link entry at position {}", index),
            }
        }

        for link in &mut links {
            link.target_input_name = nodes
                .iter()
                .flat_map(|node| node.declared_inputs.iter())
                .find(|input| input.link.as_deref() == Some(link.id.as_str()))
                .map(|input| input.name.clone());
        }

        Ok(EditorGraph { nodes, links })
    }
}

fn convert_node(ui_node: UiNode) -> Node {
    let declared_inputs = ui_node
        .inputs
        .into_iter()
        .map(|input| DeclaredInput {
            name: input.name,
            link: input.link.map(|id| id.to_string()),
            is_widget: input.widget.is_some(),
        })
        .collect();

    let widgets = match ui_node.widgets_values {
        None => Widgets::default(),
        Some(Value::Array(params)) => Widgets::Positional(params),
        Some(Value::Object(map)) => Widgets::Keyed(map),
        Some(other) => Widgets::Positional(vec![other]),
    };

    Node {
        id: ui_node.id.to_string(),
        operation_type: ui_node.node_type,
        declared_inputs,
        widgets,
        enabled: !matches!(ui_node.mode, MUTED_MODE | BYPASSED_MODE),
    }
}

fn parse_link(raw: Value) -> Option<Link> {
    match serde_json::from_value::<UiLink>(raw).ok()? {
        UiLink::Array(items) => {
            if items.len() < 3 {
                return None;
            }
            Some(Link {
                id: id_string(&items[0])?,
                source_node_id: id_string(&items[1])?,
                source_slot: items[2].as_u64()?,
                target_node_id: items.get(3).and_then(id_string),
                target_slot: items.get(4).and_then(Value::as_u64),
                target_input_name: None,
            })
        }
        UiLink::Object(obj) => Some(Link {
            id: obj.id.to_string(),
            source_node_id: obj.origin_id.to_string(),
            source_slot: obj.origin_slot,
            target_node_id: obj.target_id.map(|id| id.to_string()),
            target_slot: obj.target_slot,
            target_input_name: None,
        }),
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl WorkflowTemplate {
    /// Detects the template shape by the presence of a top-level `nodes` key.
    pub fn from_value(value: Value) -> Result<Self, ConfigurationError> {
        match value {
            Value::Object(map) if map.contains_key("nodes") => {
                let ui: UiWorkflow = serde_json::from_value(Value::Object(map)).map_err(|e| {
                    ConfigurationError::UnshapedTemplate(format!("editor graph: {}", e))
                })?;
                Ok(WorkflowTemplate::Editor(ui.into_editor_graph()?))
            }
            Value::Object(map) => ResolvedGraph::from_value(Value::Object(map))
                .map(WorkflowTemplate::Resolved)
                .map_err(|e| ConfigurationError::UnshapedTemplate(format!("node map: {}", e))),
            other => Err(ConfigurationError::UnshapedTemplate(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Reads and parses a template file. This is the only I/O the compiler performs.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigurationError::io(path, e))?;
        Self::from_json(&content)
    }

    pub fn is_editor_graph(&self) -> bool {
        matches!(self, WorkflowTemplate::Editor(_))
    }
}
