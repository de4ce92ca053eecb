use crate::config::Dimensions;
use crate::graph::{InputValue, ResolvedGraph, ResolvedNode};
use crate::registry::WidgetSchemaRegistry;
use crate::signal::{Diagnostics, Signal};
use crate::template::{EditorGraph, Node, WorkflowTemplate};
use ahash::{AHashMap, AHashSet};
use serde_json::Value;
use std::collections::BTreeMap;

/// Literal overrides that make one cached variant of a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOptions {
    pub temporal_node_id: Option<String>,
    /// Written to the temporal node's `length` input.
    pub frame_count: Option<u64>,
    /// Written to the temporal node's `width` and `height` inputs.
    pub dimensions: Option<Dimensions>,
}

/// A resolved graph together with the signals raised while producing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub graph: ResolvedGraph,
    pub diagnostics: Diagnostics,
}

/// Turns either template shape into a [`ResolvedGraph`].
pub struct GraphNormalizer<'a> {
    registry: &'a WidgetSchemaRegistry,
}

impl<'a> GraphNormalizer<'a> {
    pub fn new(registry: &'a WidgetSchemaRegistry) -> Self {
        Self { registry }
    }

    /// Deterministic and side-effect free apart from logging.
    #[tracing::instrument(skip_all, fields(frames = ?options.frame_count))]
    pub fn normalize(&self, template: &WorkflowTemplate, options: &NormalizeOptions) -> Normalized {
        let mut diagnostics = Diagnostics::new();
        let mut graph = match template {
            WorkflowTemplate::Resolved(graph) => graph.clone(),
            WorkflowTemplate::Editor(editor) => self.normalize_editor(editor, &mut diagnostics),
        };
        self.apply_variant(&mut graph, options);
        Normalized { graph, diagnostics }
    }

    fn normalize_editor(&self, editor: &EditorGraph, diagnostics: &mut Diagnostics) -> ResolvedGraph {
        let link_lookup = Self::build_link_lookup(editor);
        let mut graph = ResolvedGraph::new();

        for node in editor.nodes.iter().filter(|n| n.enabled) {
            let resolved = self.resolve_node(node, &link_lookup, diagnostics);
            graph.insert(node.id.clone(), resolved);
        }

        tracing::debug!(
            "Normalized editor graph: {} of {} nodes enabled, {} links",
            graph.len(),
            editor.nodes.len(),
            editor.links.len()
        );
        graph
    }

    /// `link_id -> (source_node_id, source_slot)`. Links leaving a disabled node are left
    /// out so that their consumers degrade to a dangling reference.
    fn build_link_lookup(editor: &EditorGraph) -> AHashMap<&str, (&str, u64)> {
        let enabled: AHashSet<&str> = editor
            .nodes
            .iter()
            .filter(|n| n.enabled)
            .map(|n| n.id.as_str())
            .collect();

        editor
            .links
            .iter()
            .filter(|link| enabled.contains(link.source_node_id.as_str()))
            .map(|link| {
                (
                    link.id.as_str(),
                    (link.source_node_id.as_str(), link.source_slot),
                )
            })
            .collect()
    }

    fn resolve_node(
        &self,
        node: &Node,
        link_lookup: &AHashMap<&str, (&str, u64)>,
        diagnostics: &mut Diagnostics,
    ) -> ResolvedNode {
        let mut inputs: BTreeMap<String, InputValue> = BTreeMap::new();

        for declared in &node.declared_inputs {
            let Some(link_id) = declared.link.as_deref() else {
                continue;
            };
            let value = match link_lookup.get(link_id) {
                Some((source, slot)) => InputValue::link(*source, *slot),
                None => {
                    diagnostics.push(Signal::DanglingLink {
                        node_id: node.id.clone(),
                        input: declared.name.clone(),
                        link_id: link_id.to_string(),
                    });
                    InputValue::Dangling {
                        link_id: link_id.to_string(),
                    }
                }
            };
            inputs.insert(declared.name.clone(), value);
        }

        let decoded = self.registry.decode(node);
        if decoded.is_unsupported() {
            diagnostics.push(Signal::UnsupportedOperation {
                node_id: node.id.clone(),
                operation_type: node.operation_type.clone(),
            });
        }
        for (name, value) in decoded.into_inputs() {
            inputs.entry(name).or_insert(InputValue::Literal(value));
        }

        ResolvedNode {
            operation_type: node.operation_type.clone(),
            inputs,
        }
    }

    /// Only the temporal node is touched; other nodes keep their authored sizes.
    fn apply_variant(&self, graph: &mut ResolvedGraph, options: &NormalizeOptions) {
        let Some(node) = options
            .temporal_node_id
            .as_deref()
            .and_then(|id| graph.get_mut(id))
        else {
            return;
        };
        if let Some(frames) = options.frame_count {
            write_frame_count(self.registry, node, frames);
        }
        if let Some(dimensions) = options.dimensions {
            write_dimensions(self.registry, node, dimensions);
        }
    }
}

/// Overwrites only the frame-count slot of a temporal node, keyed or positional.
/// Link-backed lengths are left alone.
pub(crate) fn write_frame_count(registry: &WidgetSchemaRegistry, node: &mut ResolvedNode, frames: u64) {
    if node.input("length").is_some_and(InputValue::is_reference) {
        tracing::debug!("Temporal node length is link-backed; frame count not written");
        return;
    }
    let position = registry.position_of(&node.operation_type, "length");
    node.overwrite_widget("length", Value::from(frames), position);
}

fn write_dimensions(registry: &WidgetSchemaRegistry, node: &mut ResolvedNode, dimensions: Dimensions) {
    for (name, value) in [("width", dimensions.width), ("height", dimensions.height)] {
        if node.input(name).is_some_and(InputValue::is_reference) {
            tracing::debug!("Temporal node {} is link-backed; not overwritten", name);
            continue;
        }
        let position = registry.position_of(&node.operation_type, name);
        node.overwrite_widget(name, Value::from(value), position);
    }
}
