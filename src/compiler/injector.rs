use super::camera::compose_prompt;
use super::normalizer::write_frame_count;
use crate::config::DesignatedNodes;
use crate::graph::{CompiledJob, ResolvedGraph, ResolvedNode, WidgetWrite};
use crate::registry::WidgetSchemaRegistry;
use crate::shot::ShotParameters;
use crate::signal::{Diagnostics, NodeRole, Signal};
use serde_json::Value;
use std::path::{Path, PathBuf};

const SEED_INPUTS: [&str; 2] = ["seed", "noise_seed"];

/// What the injector wrote, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionReport {
    pub prompt: String,
    pub frame_count: Option<u64>,
}

/// Overlays one shot's parameters onto a working copy of a resolved graph.
pub struct ParameterInjector<'a> {
    registry: &'a WidgetSchemaRegistry,
    nodes: &'a DesignatedNodes,
    frame_rate: f64,
}

impl<'a> ParameterInjector<'a> {
    pub fn new(registry: &'a WidgetSchemaRegistry, nodes: &'a DesignatedNodes, frame_rate: f64) -> Self {
        Self {
            registry,
            nodes,
            frame_rate,
        }
    }

    /// Copies `graph`, injects `shot` into the copy and wraps it as a job.
    pub fn inject(
        &self,
        graph: &ResolvedGraph,
        shot: &ShotParameters,
        prompt_addendum: &str,
        diagnostics: &mut Diagnostics,
    ) -> (CompiledJob, InjectionReport) {
        let mut working = graph.clone();
        let report = self.apply(&mut working, shot, prompt_addendum, diagnostics);
        (CompiledJob::new(working), report)
    }

    /// Injects `shot` into `graph` in place. A designated node that is absent from the
    /// graph is reported as [`Signal::MissingNode`] and that field is skipped.
    pub fn apply(
        &self,
        graph: &mut ResolvedGraph,
        shot: &ShotParameters,
        prompt_addendum: &str,
        diagnostics: &mut Diagnostics,
    ) -> InjectionReport {
        let prompt = compose_prompt(&shot.prompt_text, prompt_addendum);

        if let Some(node) = designated(graph, &self.nodes.text_node, NodeRole::Text, diagnostics) {
            self.write(node, "text", Value::String(prompt.clone()));
        }

        if let (Some(node_id), Some(negative)) = (&self.nodes.negative_text_node, &shot.negative_prompt) {
            if let Some(node) = designated(graph, node_id, NodeRole::NegativeText, diagnostics) {
                self.write(node, "text", Value::String(negative.clone()));
            }
        }

        if let Some(path) = &shot.source_image_path {
            if let Some(node) = designated(graph, &self.nodes.image_node, NodeRole::Image, diagnostics) {
                self.write(node, "image", Value::String(canonical_image_path(path)));
            }
        }

        let frame_count = shot.frame_count(self.frame_rate);
        if let Some(frames) = frame_count {
            if let Some(node) = designated(graph, &self.nodes.temporal_node, NodeRole::Temporal, diagnostics)
            {
                write_frame_count(self.registry, node, frames);
            }
        }

        if let Some(seed) = shot.seed {
            self.write_seed(graph, seed);
        }

        if let (Some(node_id), Some(prefix)) = (&self.nodes.output_node, &shot.output_prefix) {
            if let Some(node) = designated(graph, node_id, NodeRole::Output, diagnostics) {
                self.write(node, "filename_prefix", Value::String(prefix.clone()));
            }
        }

        InjectionReport {
            prompt,
            frame_count,
        }
    }

    fn write(&self, node: &mut ResolvedNode, name: &str, value: Value) {
        let position = self.registry.position_of(&node.operation_type, name);
        if node.overwrite_widget(name, value, position) == WidgetWrite::Inserted {
            tracing::debug!("{} node had no '{}' input; added it", node.operation_type, name);
        }
    }

    fn write_seed(&self, graph: &mut ResolvedGraph, seed: u64) {
        let mut written = 0usize;
        for (_, node) in graph.iter_mut() {
            for name in SEED_INPUTS {
                if node.literal(name).is_some() {
                    node.set_literal(name, seed);
                    written += 1;
                }
            }
        }
        tracing::debug!("Seed {} written to {} inputs", seed, written);
    }
}

fn designated<'g>(
    graph: &'g mut ResolvedGraph,
    node_id: &str,
    role: NodeRole,
    diagnostics: &mut Diagnostics,
) -> Option<&'g mut ResolvedNode> {
    if !graph.contains(node_id) {
        diagnostics.push(Signal::MissingNode {
            role,
            node_id: node_id.to_string(),
        });
        return None;
    }
    graph.get_mut(node_id)
}

/// Absolute path with `/` separators and `.`/`..` collapsed.
///
/// Relative paths are resolved against the current working directory. Windows drive-letter
/// paths are treated as already absolute.
pub fn canonical_image_path(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    let absolute = if text.starts_with('/') || has_drive_prefix(&text) {
        text
    } else {
        std::path::absolute(&text)
            .unwrap_or_else(|_| PathBuf::from(&text))
            .to_string_lossy()
            .replace('\\', "/")
    };
    collapse_dot_segments(&absolute)
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn collapse_dot_segments(path: &str) -> String {
    let (prefix, rest) = if has_drive_prefix(path) {
        path.split_at(2)
    } else {
        ("", path)
    };
    let rooted = rest.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let root = if rooted { "/" } else { "" };
    format!("{prefix}{root}{}", segments.join("/"))
}
