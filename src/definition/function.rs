use super::node::MetadataLine;
use super::reference::Reference;
use crate::error::DefinitionError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A reusable, named function in the registry.
///
/// Any JSON property that is not one of the known fields is kept in `extra` and copied
/// onto the resolved output node as-is.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    /// Original-case name used in the output. Filled from the registry key when empty.
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub children: Vec<Reference>,
    /// Rendered as the first metadata line of the function node.
    #[serde(default)]
    pub app: Option<String>,
    /// Default queue for async references to this function.
    #[serde(default)]
    pub queue_name: Option<String>,
    #[serde(default, rename = "metadata_lines", alias = "metadataLines")]
    pub metadata_lines: Option<Vec<MetadataLine>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FunctionDefinition {
    pub fn new(children: Vec<Reference>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    pub fn with_queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = Some(queue_name.into());
        self
    }

    pub fn with_metadata(mut self, lines: Vec<MetadataLine>) -> Self {
        self.metadata_lines = Some(lines);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn from_value(value: Value) -> Result<Self, DefinitionError> {
        if !value.is_object() {
            return Err(DefinitionError::NotAnObject {
                context: "a function definition".to_string(),
                found: value.to_string(),
            });
        }
        serde_json::from_value(value).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }
}
