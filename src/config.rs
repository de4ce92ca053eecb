//! Pipeline configuration: which template nodes play which role, the camera effect
//! catalog, the modifier slot pool, and output geometry.
//!
//! Every field has a default, so a configuration file only needs to name what differs.

use crate::error::ConfigurationError;
use crate::registry::WidgetSchemaRegistry;
use crate::shot::DEFAULT_CAMERA_TAG;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// At most this many cameras can be active on one shot.
pub const MAX_SLOT_PAIRS: usize = 4;

const LOW_NOISE_MODULE: &str = "wan2.2_i2v__lightx2v_4steps_lora_v1_low_noise_model.safetensors";
const HIGH_NOISE_MODULE: &str = "wan2.2_i2v__lightx2v_4steps_lora_v1__high_noise_model.safetensors";

/// Template-specific ids of the nodes the injector writes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignatedNodes {
    pub text_node: String,
    pub image_node: String,
    pub temporal_node: String,
    pub negative_text_node: Option<String>,
    pub output_node: Option<String>,
}

impl Default for DesignatedNodes {
    fn default() -> Self {
        Self {
            text_node: "93".to_string(),
            image_node: "97".to_string(),
            temporal_node: "98".to_string(),
            negative_text_node: None,
            output_node: None,
        }
    }
}

/// The pair of loader nodes one camera effect is written into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPair {
    pub low_noise_node_id: String,
    pub high_noise_node_id: String,
}

impl SlotPair {
    pub fn new(low: impl Into<String>, high: impl Into<String>) -> Self {
        Self {
            low_noise_node_id: low.into(),
            high_noise_node_id: high.into(),
        }
    }
}

/// A configured camera effect.
///
/// `None` modules fall back to the catalog's `default` entry; an empty-string module
/// means "leave that slot node alone". Missing strengths fall back to the global
/// defaults. A bare string in the catalog is accepted as one module used for both slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CameraEffectSpec")]
pub struct CameraEffectEntry {
    pub low_noise_module: Option<String>,
    pub high_noise_module: Option<String>,
    pub strength_low: Option<f64>,
    pub strength_high: Option<f64>,
    pub trigger_keyword: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CameraEffectSpec {
    Module(String),
    Entry {
        #[serde(default)]
        low_noise_module: Option<String>,
        #[serde(default)]
        high_noise_module: Option<String>,
        #[serde(default)]
        strength_low: Option<f64>,
        #[serde(default)]
        strength_high: Option<f64>,
        #[serde(default)]
        trigger_keyword: String,
    },
}

impl From<CameraEffectSpec> for CameraEffectEntry {
    fn from(spec: CameraEffectSpec) -> Self {
        match spec {
            CameraEffectSpec::Module(module) => Self {
                low_noise_module: Some(module.clone()),
                high_noise_module: Some(module),
                ..Self::default()
            },
            CameraEffectSpec::Entry {
                low_noise_module,
                high_noise_module,
                strength_low,
                strength_high,
                trigger_keyword,
            } => Self {
                low_noise_module,
                high_noise_module,
                strength_low,
                strength_high,
                trigger_keyword,
            },
        }
    }
}

impl CameraEffectEntry {
    pub fn new(low: &str, high: &str, trigger_keyword: &str) -> Self {
        Self {
            low_noise_module: Some(low.to_string()),
            high_noise_module: Some(high.to_string()),
            strength_low: None,
            strength_high: None,
            trigger_keyword: trigger_keyword.to_string(),
        }
    }

    pub fn with_strengths(mut self, low: f64, high: f64) -> Self {
        self.strength_low = Some(low);
        self.strength_high = Some(high);
        self
    }
}

/// How a camera tag found its catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMatch {
    Exact,
    Substring,
    Default,
}

/// Camera tag -> effect, in authored order. Keys are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, CameraEffectEntry>",
    into = "IndexMap<String, CameraEffectEntry>"
)]
pub struct CameraCatalog {
    entries: IndexMap<String, CameraEffectEntry>,
}

impl From<IndexMap<String, CameraEffectEntry>> for CameraCatalog {
    fn from(entries: IndexMap<String, CameraEffectEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(tag, entry)| (tag.trim().to_lowercase(), entry))
                .collect(),
        }
    }
}

impl From<CameraCatalog> for IndexMap<String, CameraEffectEntry> {
    fn from(catalog: CameraCatalog) -> Self {
        catalog.entries
    }
}

impl Default for CameraCatalog {
    fn default() -> Self {
        let effect =
            |trigger: &str| CameraEffectEntry::new(LOW_NOISE_MODULE, HIGH_NOISE_MODULE, trigger);
        IndexMap::from([
            ("slow pan".to_string(), effect("slow pan movement")),
            ("pan".to_string(), effect("pan movement")),
            ("static".to_string(), effect("static shot")),
            ("dolly".to_string(), effect("dolly movement")),
            ("orbit".to_string(), effect("orbit movement")),
            ("zoom".to_string(), effect("zoom in")),
            ("tracking".to_string(), effect("tracking shot")),
            ("drone".to_string(), effect("aerial drone shot")),
            (DEFAULT_CAMERA_TAG.to_string(), effect("")),
        ])
        .into()
    }
}

impl CameraCatalog {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, tag: &str, entry: CameraEffectEntry) {
        self.entries.insert(tag.trim().to_lowercase(), entry);
    }

    pub fn with_entry(mut self, tag: &str, entry: CameraEffectEntry) -> Self {
        self.insert(tag, entry);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&CameraEffectEntry> {
        self.entries.get(tag)
    }

    pub fn default_entry(&self) -> Option<&CameraEffectEntry> {
        self.entries.get(DEFAULT_CAMERA_TAG)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a normalized tag: exact key, then the first key in catalog order that the
    /// tag contains, then `default`.
    pub fn resolve(&self, tag: &str) -> Option<(&CameraEffectEntry, CameraMatch)> {
        if let Some(entry) = self.entries.get(tag) {
            return Some((entry, CameraMatch::Exact));
        }
        let partial = self
            .entries
            .iter()
            .find(|(key, _)| key.as_str() != DEFAULT_CAMERA_TAG && tag.contains(key.as_str()));
        if let Some((_, entry)) = partial {
            return Some((entry, CameraMatch::Substring));
        }
        self.default_entry().map(|entry| (entry, CameraMatch::Default))
    }
}

/// Aspect ratio and resolution of generated media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionSettings {
    pub aspect_ratio: String,
    pub resolution: u32,
}

impl Default for DimensionSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: "16:9".to_string(),
            resolution: 1280,
        }
    }
}

impl DimensionSettings {
    pub fn resolve(&self) -> Dimensions {
        Dimensions::from_aspect_ratio(&self.aspect_ratio, self.resolution)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// `resolution` is the long edge. Both edges are floored to a multiple of 8, and an
    /// unparsable ratio is treated as 1:1.
    pub fn from_aspect_ratio(aspect_ratio: &str, resolution: u32) -> Self {
        let (ratio_w, ratio_h) = aspect_ratio
            .split_once(':')
            .and_then(|(w, h)| {
                Some((w.trim().parse::<u64>().ok()?, h.trim().parse::<u64>().ok()?))
            })
            .filter(|(w, h)| *w > 0 && *h > 0)
            .unwrap_or((1, 1));
        let res = u64::from(resolution);
        let (width, height) = if ratio_w >= ratio_h {
            (res, res * ratio_h / ratio_w)
        } else {
            (res * ratio_w / ratio_h, res)
        };
        Self {
            width: (width / 8 * 8) as u32,
            height: (height / 8 * 8) as u32,
        }
    }
}

/// The complete compiler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub designated_nodes: DesignatedNodes,
    pub frame_rate: f64,
    pub dimensions: Option<DimensionSettings>,
    pub default_strength_low: f64,
    pub default_strength_high: f64,
    pub slot_pool: Vec<SlotPair>,
    pub camera_catalog: CameraCatalog,
    /// Extra positional schemas: operation type -> widget field names in order.
    pub widget_schemas: BTreeMap<String, Vec<String>>,
    /// Operation types that decode like an already known type.
    pub type_aliases: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            designated_nodes: DesignatedNodes::default(),
            frame_rate: 24.0,
            dimensions: None,
            default_strength_low: 1.0,
            default_strength_high: 1.0,
            slot_pool: vec![
                SlotPair::new("101", "102"),
                SlotPair::new("103", "104"),
                SlotPair::new("105", "106"),
                SlotPair::new("107", "108"),
            ],
            camera_catalog: CameraCatalog::default(),
            widget_schemas: BTreeMap::new(),
            type_aliases: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigurationError::io(path, e))?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.camera_catalog.default_entry().is_none() {
            return Err(ConfigurationError::InvalidConfig(
                "camera catalog has no 'default' entry".to_string(),
            ));
        }
        if self.slot_pool.len() > MAX_SLOT_PAIRS {
            return Err(ConfigurationError::InvalidConfig(format!(
                "slot pool has {} pairs, at most {} are supported",
                self.slot_pool.len(),
                MAX_SLOT_PAIRS
            )));
        }
        if let Some(pair) = self
            .slot_pool
            .iter()
            .find(|p| p.low_noise_node_id.is_empty() || p.high_noise_node_id.is_empty())
        {
            return Err(ConfigurationError::InvalidConfig(format!(
                "slot pair {:?} has an empty node id",
                pair
            )));
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ConfigurationError::InvalidConfig(format!(
                "frame rate must be positive, got {}",
                self.frame_rate
            )));
        }
        let nodes = &self.designated_nodes;
        for (role, id) in [
            ("text_node", &nodes.text_node),
            ("image_node", &nodes.image_node),
            ("temporal_node", &nodes.temporal_node),
        ] {
            if id.is_empty() {
                return Err(ConfigurationError::InvalidConfig(format!(
                    "designated {} is empty",
                    role
                )));
            }
        }
        Ok(())
    }

    pub fn resolved_dimensions(&self) -> Option<Dimensions> {
        self.dimensions.as_ref().map(DimensionSettings::resolve)
    }

    /// Builds the widget registry: built-in schemas plus configured ones and aliases.
    pub fn build_registry(&self) -> WidgetSchemaRegistry {
        let mut registry = WidgetSchemaRegistry::with_defaults();
        for (operation_type, fields) in &self.widget_schemas {
            registry.register_positional(operation_type, fields);
        }
        for (user_type, known_type) in &self.type_aliases {
            if !registry.register_alias(user_type, known_type) {
                tracing::warn!(
                    "Type alias '{}' -> '{}' ignored: '{}' has no widget schema",
                    user_type,
                    known_type,
                    known_type
                );
            }
        }
        registry
    }
}
