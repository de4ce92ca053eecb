use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Node and link ids are integers in editor exports, but strings are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UiId {
    Int(i64),
    Text(String),
}

impl fmt::Display for UiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiId::Int(n) => write!(f, "{}", n),
            UiId::Text(s) => f.write_str(s),
        }
    }
}

/// Reference to the widget that backs a declared input
#[derive(Debug, Deserialize, Clone)]
pub struct UiWidgetRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// A declared input socket of an editor node
#[derive(Debug, Deserialize, Clone)]
pub struct UiNodeInput {
    pub name: String,
    #[serde(default)]
    pub link: Option<UiId>,
    #[serde(default)]
    pub widget: Option<UiWidgetRef>,
}

/// Editor node as exported by the visual workflow editor
#[derive(Debug, Deserialize, Clone)]
pub struct UiNode {
    pub id: UiId,
    #[serde(rename = "type", alias = "class_type")]
    pub node_type: String,
    /// 0 = always, 2 = muted, 4 = bypassed
    #[serde(default)]
    pub mode: u32,
    #[serde(default)]
    pub inputs: Vec<UiNodeInput>,
    #[serde(default, alias = "widgetsValues")]
    pub widgets_values: Option<Value>,
}

/// Object form of a link used by newer editor exports
#[derive(Debug, Deserialize, Clone)]
pub struct UiLinkObject {
    pub id: UiId,
    pub origin_id: UiId,
    pub origin_slot: u64,
    #[serde(default)]
    pub target_id: Option<UiId>,
    #[serde(default)]
    pub target_slot: Option<u64>,
}

/// A link entry, either `[id, origin, origin_slot, target, target_slot, type]` or an object
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum UiLink {
    Array(Vec<Value>),
    Object(UiLinkObject),
}

/// Complete editor workflow document
///
/// Nodes and links stay as raw JSON until conversion so a bad entry can be reported
/// by position instead of failing the whole document.
#[derive(Debug, Deserialize)]
pub struct UiWorkflow {
    pub nodes: Vec<Value>,
    #[serde(default)]
    pub links: Vec<Value>,
}
