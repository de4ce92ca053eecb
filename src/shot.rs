use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const TAG_DELIMITERS: [char; 4] = [',', ';', '|', '+'];

/// Tag used when a shot names no camera at all.
pub const DEFAULT_CAMERA_TAG: &str = "default";

/// Camera tags as supplied by the shot planner: one tag, a delimited string, or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CameraTags {
    One(String),
    Many(Vec<String>),
}

impl Default for CameraTags {
    fn default() -> Self {
        CameraTags::Many(Vec::new())
    }
}

impl From<&str> for CameraTags {
    fn from(tag: &str) -> Self {
        CameraTags::One(tag.to_string())
    }
}

impl From<Vec<&str>> for CameraTags {
    fn from(tags: Vec<&str>) -> Self {
        CameraTags::Many(tags.into_iter().map(str::to_string).collect())
    }
}

impl CameraTags {
    /// Ordered, trimmed, lower-cased tags. Never empty: no tags means `["default"]`.
    pub fn normalize(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            CameraTags::One(s) => s.split(TAG_DELIMITERS).collect(),
            CameraTags::Many(list) => list
                .iter()
                .flat_map(|s| s.split(TAG_DELIMITERS))
                .collect(),
        };
        let tags: Vec<String> = raw
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if tags.is_empty() {
            vec![DEFAULT_CAMERA_TAG.to_string()]
        } else {
            tags
        }
    }
}

/// The per-shot parameters overlaid onto a resolved graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotParameters {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default, alias = "motion_prompt")]
    pub prompt_text: String,
    #[serde(default, alias = "image_path")]
    pub source_image_path: Option<PathBuf>,
    #[serde(default, alias = "duration")]
    pub duration_seconds: Option<f64>,
    #[serde(default, alias = "camera")]
    pub camera_tags: CameraTags,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub output_prefix: Option<String>,
}

impl ShotParameters {
    pub fn new(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_image_path = Some(path.into());
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_cameras(mut self, tags: impl Into<CameraTags>) -> Self {
        self.camera_tags = tags.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_negative_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(prompt.into());
        self
    }

    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = Some(prefix.into());
        self
    }

    /// Output frame count for this shot's duration, if it has one.
    pub fn frame_count(&self, frame_rate: f64) -> Option<u64> {
        self.duration_seconds
            .map(|seconds| frames_for(seconds, frame_rate))
    }

    /// Parses a shot list: either a bare array or an object with a `shots` array.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, ConfigurationError> {
        let value: Value = serde_json::from_str(json)?;
        let list = match value {
            Value::Object(mut map) => map.remove("shots").ok_or_else(|| {
                ConfigurationError::JsonParse("shot document has no 'shots' array".to_string())
            })?,
            other => other,
        };
        Ok(serde_json::from_value(list)?)
    }

    pub fn list_from_file(path: impl AsRef<Path>) -> Result<Vec<Self>, ConfigurationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigurationError::io(path, e))?;
        Self::list_from_json(&content)
    }
}

/// `round(duration_seconds * frame_rate)`, clamped at zero.
pub fn frames_for(duration_seconds: f64, frame_rate: f64) -> u64 {
    let frames = (duration_seconds * frame_rate).round();
    if frames.is_finite() && frames > 0.0 {
        frames as u64
    } else {
        0
    }
}
