use crate::builder::TreeBuilder;
use crate::definition::{FunctionDefinition, StructuralNode};
use crate::error::{DefinitionError, LoadError};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;

/// An application description as stored on disk: the function pool plus the root tree.
///
/// ```json
/// {
///   "functions": { "Checkout": { "children": [{ "ref": "Charge" }] }, "Charge": {} },
///   "app": { "name": "shop", "type": "app", "children": [{ "ref": "Checkout" }] }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AppDescription {
    #[serde(default)]
    pub functions: IndexMap<String, FunctionDefinition>,
    pub app: StructuralNode,
}

impl AppDescription {
    /// Load an application description from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(Self::from_json(&content)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }

    /// Registers this description's functions on `builder` and hands back the root tree.
    pub fn register(self, builder: &mut TreeBuilder) -> StructuralNode {
        builder.define_functions(self.functions);
        self.app
    }
}

/// Load a standalone function pool (`{ name: definition }`) from a JSON file.
pub fn functions_from_file(path: &str) -> Result<IndexMap<String, FunctionDefinition>, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&content)
        .map_err(|e| LoadError::Definition(DefinitionError::JsonParseError(e.to_string())))
}
