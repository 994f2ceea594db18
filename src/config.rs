use crate::definition::NodeType;
use crate::error::DefinitionError;
use serde::Deserialize;

/// How a reference to an unregistered function is reported in the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Warning,
    Error,
}

impl From<Severity> for NodeType {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warning => NodeType::Warning,
            Severity::Error => NodeType::Error,
        }
    }
}

/// Construction-time options of a `TreeBuilder`. Immutable once the builder exists.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderConfig {
    pub unresolved_severity: Severity,
    /// Drop `ui-service-method` nodes that end up without children.
    pub filter_empty_ui_service_methods: bool,
    /// Drop `ui-services` nodes that end up without children.
    pub filter_empty_ui_services: bool,
    /// Node types that receive a clickable "Logs" metadata line.
    pub log_node_types: Vec<NodeType>,
}

impl BuilderConfig {
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }

    pub(crate) fn logs(&self, node_type: &NodeType) -> bool {
        *node_type != NodeType::DupeStopper && self.log_node_types.contains(node_type)
    }
}
