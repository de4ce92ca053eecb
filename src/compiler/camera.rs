use crate::config::{CameraCatalog, CameraEffectEntry, CameraMatch, SlotPair};
use crate::graph::ResolvedGraph;
use crate::registry::WidgetSchemaRegistry;
use crate::shot::DEFAULT_CAMERA_TAG;
use crate::signal::{Diagnostics, NodeRole, Signal};
use itertools::Itertools;
use serde_json::Value;

/// One modifier written to one slot node.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotWrite {
    pub slot_index: usize,
    pub tag: String,
    pub node_id: String,
    pub role: NodeRole,
    pub module: String,
    pub strength: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraResolution {
    pub writes: Vec<SlotWrite>,
    /// Unique trigger keywords in tag order, joined with `", "`.
    pub prompt_addendum: String,
}

/// Maps camera tags onto the fixed pool of modifier slots.
pub struct CameraEffectResolver<'a> {
    catalog: &'a CameraCatalog,
    slot_pool: &'a [SlotPair],
    default_strength_low: f64,
    default_strength_high: f64,
}

impl<'a> CameraEffectResolver<'a> {
    pub fn new(catalog: &'a CameraCatalog, slot_pool: &'a [SlotPair]) -> Self {
        Self {
            catalog,
            slot_pool,
            default_strength_low: 1.0,
            default_strength_high: 1.0,
        }
    }

    pub fn with_default_strengths(mut self, low: f64, high: f64) -> Self {
        self.default_strength_low = low;
        self.default_strength_high = high;
        self
    }

    /// Plans the slot writes for normalized `tags`. Tag `i` uses slot pair `i`; tags past
    /// the pool are dropped with a [`Signal::SlotOverflow`].
    pub fn resolve(&self, tags: &[String], diagnostics: &mut Diagnostics) -> CameraResolution {
        let capacity = self.slot_pool.len();
        let default_entry = self.catalog.default_entry();
        let mut writes = Vec::new();
        let mut triggers = Vec::new();

        for (index, tag) in tags.iter().enumerate() {
            let Some(pair) = self.slot_pool.get(index) else {
                diagnostics.push(Signal::SlotOverflow {
                    tag: tag.clone(),
                    index,
                    capacity,
                });
                continue;
            };

            let Some((entry, matched)) = self.catalog.resolve(tag) else {
                diagnostics.push(Signal::UnresolvedCamera { tag: tag.clone() });
                continue;
            };
            if matched == CameraMatch::Default && tag != DEFAULT_CAMERA_TAG {
                diagnostics.push(Signal::UnresolvedCamera { tag: tag.clone() });
            }

            let low = entry
                .low_noise_module
                .as_ref()
                .or_else(|| default_entry.and_then(|d| d.low_noise_module.as_ref()));
            let high = entry
                .high_noise_module
                .as_ref()
                .or_else(|| default_entry.and_then(|d| d.high_noise_module.as_ref()));

            let planned = [
                (
                    NodeRole::LowNoiseSlot,
                    &pair.low_noise_node_id,
                    low,
                    entry.strength_low.unwrap_or(self.default_strength_low),
                ),
                (
                    NodeRole::HighNoiseSlot,
                    &pair.high_noise_node_id,
                    high,
                    entry.strength_high.unwrap_or(self.default_strength_high),
                ),
            ];
            for (role, node_id, module, strength) in planned {
                match module {
                    Some(module) if !module.is_empty() => writes.push(SlotWrite {
                        slot_index: index,
                        tag: tag.clone(),
                        node_id: node_id.clone(),
                        role,
                        module: module.clone(),
                        strength,
                    }),
                    _ => diagnostics.push(Signal::SkippedModule {
                        tag: tag.clone(),
                        node_id: node_id.clone(),
                    }),
                }
            }

            triggers.push(trigger_of(entry));
        }

        let prompt_addendum = triggers
            .into_iter()
            .filter(|t| !t.is_empty())
            .unique()
            .join(", ");

        tracing::debug!(
            "Resolved {} camera tags into {} slot writes",
            tags.len(),
            writes.len()
        );
        CameraResolution {
            writes,
            prompt_addendum,
        }
    }

    /// Writes `lora_name` and `strength_model` on each planned slot node. Slots without a
    /// write keep their template values.
    pub fn apply(
        &self,
        graph: &mut ResolvedGraph,
        writes: &[SlotWrite],
        registry: &WidgetSchemaRegistry,
        diagnostics: &mut Diagnostics,
    ) {
        for write in writes {
            let Some(node) = graph.get_mut(&write.node_id) else {
                diagnostics.push(Signal::MissingNode {
                    role: write.role,
                    node_id: write.node_id.clone(),
                });
                continue;
            };
            let module_position = registry.position_of(&node.operation_type, "lora_name");
            let strength_position = registry.position_of(&node.operation_type, "strength_model");
            let placed = node.overwrite_widget(
                "lora_name",
                Value::String(write.module.clone()),
                module_position,
            );
            node.overwrite_widget("strength_model", Value::from(write.strength), strength_position);
            tracing::debug!("Camera '{}' loaded into node {} ({:?})", write.tag, write.node_id, placed);
        }
    }
}

fn trigger_of(entry: &CameraEffectEntry) -> &str {
    entry.trigger_keyword.trim()
}

/// `base` followed by `", " + addendum` when the addendum is non-empty.
pub fn compose_prompt(base: &str, addendum: &str) -> String {
    match (base.is_empty(), addendum.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => addendum.to_string(),
        (false, false) => format!("{base}, {addendum}"),
    }
}
