use crate::template::Node;
use serde_json::Value;
use std::collections::BTreeMap;

/// Editor control values stored right after a seed widget. They steer the editor's own
/// seed handling and are not inputs of the node.
const SEED_CONTROL_VALUES: [&str; 4] = ["fixed", "increment", "decrement", "randomize"];
const SEED_INPUTS: [&str; 2] = ["seed", "noise_seed"];

/// Defines the contract for turning a node's positional widget array into named inputs.
pub trait WidgetDecoder: Send + Sync {
    fn operation_type(&self) -> &str;

    /// Decodes the node's widgets. An empty map means nothing could be assigned.
    fn decode(&self, node: &Node) -> BTreeMap<String, Value>;

    /// Index of `input_name` in the positional array, when the layout is position-fixed.
    fn position_of(&self, _input_name: &str) -> Option<usize> {
        None
    }
}

/// One entry of a positional schema: the field is written only when the widget array
/// holds at least `min_len` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetField {
    pub name: String,
    pub min_len: usize,
}

impl WidgetField {
    pub fn new(name: impl Into<String>, min_len: usize) -> Self {
        Self {
            name: name.into(),
            min_len,
        }
    }
}

/// Decoder for operation types whose widget order is fixed.
#[derive(Debug, Clone)]
pub struct PositionalDecoder {
    operation_type: String,
    fields: Vec<WidgetField>,
}

impl PositionalDecoder {
    pub fn new(operation_type: impl Into<String>, fields: Vec<WidgetField>) -> Self {
        Self {
            operation_type: operation_type.into(),
            fields,
        }
    }

    /// Builds a schema where each field only requires its own slot to be present.
    pub fn from_names<S: AsRef<str>>(operation_type: impl Into<String>, names: &[S]) -> Self {
        let fields = names
            .iter()
            .enumerate()
            .map(|(i, name)| WidgetField::new(name.as_ref(), i + 1))
            .collect();
        Self::new(operation_type, fields)
    }

    pub fn fields(&self) -> &[WidgetField] {
        &self.fields
    }
}

impl WidgetDecoder for PositionalDecoder {
    fn operation_type(&self) -> &str {
        &self.operation_type
    }

    fn decode(&self, node: &Node) -> BTreeMap<String, Value> {
        let params = node.positional_params();
        self.fields
            .iter()
            .enumerate()
            .filter(|(index, field)| *index < params.len() && params.len() >= field.min_len)
            .map(|(index, field)| (field.name.clone(), params[index].clone()))
            .collect()
    }

    fn position_of(&self, input_name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == input_name)
    }
}

/// Decoder for operation types where some widgets may instead be fed by links.
///
/// Declared inputs are walked in order; linked ones are skipped and every other one
/// consumes the next widget value. A node that declares no inputs at all falls back to
/// `widget_order`.
#[derive(Debug, Clone)]
pub struct DeclaredOrderDecoder {
    operation_type: String,
    widget_order: Vec<String>,
}

impl DeclaredOrderDecoder {
    pub fn new(operation_type: impl Into<String>) -> Self {
        Self {
            operation_type: operation_type.into(),
            widget_order: Vec::new(),
        }
    }

    pub fn with_widget_order(mut self, names: &[&str]) -> Self {
        self.widget_order = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Declared inputs that take the next widget value. When the node marks which inputs
    /// are widgets, unmarked sockets never consume a value.
    fn candidate_names<'a>(&'a self, node: &'a Node) -> Vec<&'a str> {
        if node.declared_inputs.is_empty() {
            return self.widget_order.iter().map(String::as_str).collect();
        }
        let marks_widgets = node.declared_inputs.iter().any(|input| input.is_widget);
        node.declared_inputs
            .iter()
            .filter(|input| !input.is_link() && (input.is_widget || !marks_widgets))
            .map(|input| input.name.as_str())
            .collect()
    }
}

impl WidgetDecoder for DeclaredOrderDecoder {
    fn operation_type(&self) -> &str {
        &self.operation_type
    }

    fn decode(&self, node: &Node) -> BTreeMap<String, Value> {
        let mut params = node.positional_params().iter().peekable();
        let mut inputs = BTreeMap::new();

        for name in self.candidate_names(node) {
            let Some(value) = params.next() else {
                break;
            };
            inputs.insert(name.to_string(), value.clone());

            if SEED_INPUTS.contains(&name) {
                let is_control = params
                    .peek()
                    .and_then(|next| next.as_str())
                    .is_some_and(|s| SEED_CONTROL_VALUES.contains(&s));
                if is_control {
                    params.next();
                }
            }
        }
        inputs
    }
}
