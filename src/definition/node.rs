use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// The kind of a node, both in the input application tree and in the resolved output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    App,
    Function,
    UiServices,
    UiServiceMethod,
    Timer,
    Topic,
    Queue,
    DupeStopper,
    Warning,
    Error,
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::App => "app",
            NodeType::Function => "function",
            NodeType::UiServices => "ui-services",
            NodeType::UiServiceMethod => "ui-service-method",
            NodeType::Timer => "timer",
            NodeType::Topic => "topic",
            NodeType::Queue => "queue",
            NodeType::DupeStopper => "dupe-stopper",
            NodeType::Warning => "warning",
            NodeType::Error => "error",
            NodeType::Other(name) => name,
        }
    }
}

impl From<&str> for NodeType {
    fn from(value: &str) -> Self {
        match value {
            "app" => NodeType::App,
            "function" => NodeType::Function,
            "ui-services" => NodeType::UiServices,
            "ui-service-method" => NodeType::UiServiceMethod,
            "timer" => NodeType::Timer,
            "topic" => NodeType::Topic,
            "queue" => NodeType::Queue,
            "dupe-stopper" => NodeType::DupeStopper,
            "warning" => NodeType::Warning,
            "error" => NodeType::Error,
            other => NodeType::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeType {
    fn from(value: String) -> Self {
        NodeType::from(value.as_str())
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line of display metadata attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataLine {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clickable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MetadataLine {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            clickable: None,
            data: None,
        }
    }

    /// A line that the renderer must not turn into a link.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            clickable: Some(false),
            data: None,
        }
    }

    pub fn clickable(text: impl Into<String>, data: Value) -> Self {
        Self {
            text: text.into(),
            clickable: Some(true),
            data: Some(data),
        }
    }
}

const RESERVED_KEYS: [&str; 7] = [
    "name",
    "type",
    "children",
    "metadata_lines",
    "_unresolvedRef",
    "_cycleAt",
    "_path",
];

/// A node of the resolved display tree.
///
/// Nodes are shared through `Arc`: the same cached function subtree appears wherever it is
/// referenced from the same resolution context. Any change to a shared node must go
/// through `Arc::make_mut` so cached subtrees are never altered in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Arc<OutputNode>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_lines: Option<Vec<MetadataLine>>,
    /// The missing function name, set on unresolved-reference diagnostics.
    #[serde(
        rename = "_unresolvedRef",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub unresolved_ref: Option<String>,
    /// The function at which a cycle was cut.
    #[serde(rename = "_cycleAt", default, skip_serializing_if = "Option::is_none")]
    pub cycle_at: Option<String>,
    /// Display names from the traversal root down to the re-entered function.
    #[serde(rename = "_path", default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OutputNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: None,
            metadata_lines: None,
            unresolved_ref: None,
            cycle_at: None,
            path: None,
            extra: Map::new(),
        }
    }

    /// The marker substituted where a function would re-enter one of its own ancestors.
    pub fn cycle_stopper(display_name: &str, mut path: Vec<String>) -> Self {
        path.push(display_name.to_string());
        Self {
            cycle_at: Some(display_name.to_string()),
            path: Some(path),
            ..Self::new(
                format!("loop detected stopping ({})", display_name),
                NodeType::DupeStopper,
            )
        }
    }

    /// The diagnostic substituted for a reference to a function that is not registered.
    pub fn unresolved(reference: &str, severity: NodeType) -> Self {
        Self {
            unresolved_ref: Some(reference.to_string()),
            ..Self::new(
                format!(
                    "dependency to {} could not be resolved so the tree may be incomplete",
                    reference
                ),
                severity,
            )
        }
    }

    pub fn children(&self) -> &[Arc<OutputNode>] {
        self.children.as_deref().unwrap_or_default()
    }

    pub fn metadata_lines(&self) -> &[MetadataLine] {
        self.metadata_lines.as_deref().unwrap_or_default()
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    pub fn is_cycle_stopper(&self) -> bool {
        self.node_type == NodeType::DupeStopper
    }

    /// Inserts a metadata line ahead of all existing ones.
    pub fn prepend_metadata(&mut self, line: MetadataLine) {
        self.metadata_lines.get_or_insert_with(Vec::new).insert(0, line);
    }

    pub fn push_metadata(&mut self, line: MetadataLine) {
        self.metadata_lines.get_or_insert_with(Vec::new).push(line);
    }

    /// Copies pass-through properties onto the node, overwriting keys already present.
    /// Keys that would collide with the typed fields are skipped.
    pub fn merge_extra(&mut self, extra: Map<String, Value>) {
        for (key, value) in extra {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                self.extra.insert(key, value);
            }
        }
    }

    /// Serializes the tree into a JSON value.
    pub fn to_json(&self) -> Value {
        // A tree of strings, maps and sequences always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
