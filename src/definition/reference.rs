use super::node::{MetadataLine, NodeType};
use crate::error::DefinitionError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// An edge in the application description, classified once when it is ingested.
///
/// JSON objects are classified in this order:
/// 1. `ref` together with `async: true` is an [`Reference::Async`] call.
/// 2. `topicPublish: true` is a [`Reference::TopicPublish`].
/// 3. Any other object with `ref` is a [`Reference::Sync`] call.
/// 4. Everything else is an inline [`Reference::Structural`] node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum Reference {
    /// Direct substitution by the named function's subtree.
    Sync { name: String },
    /// A queue-mediated invocation, rendered as a timer node wrapping the function.
    Async {
        name: String,
        queue_name: Option<String>,
        metadata_lines: Option<Vec<MetadataLine>>,
        extra: Map<String, Value>,
    },
    /// A publish to a topic. Terminal: it never expands into function children.
    TopicPublish {
        topic_name: Option<String>,
        queue_name: Option<String>,
        metadata_lines: Option<Vec<MetadataLine>>,
        extra: Map<String, Value>,
    },
    Structural(StructuralNode),
}

impl Reference {
    pub fn call(name: impl Into<String>) -> Self {
        Reference::Sync { name: name.into() }
    }

    pub fn queued(name: impl Into<String>, queue_name: Option<&str>) -> Self {
        Reference::Async {
            name: name.into(),
            queue_name: queue_name.map(str::to_string),
            metadata_lines: None,
            extra: Map::new(),
        }
    }

    pub fn publish(topic_name: Option<&str>, queue_name: Option<&str>) -> Self {
        Reference::TopicPublish {
            topic_name: topic_name.map(str::to_string),
            queue_name: queue_name.map(str::to_string),
            metadata_lines: None,
            extra: Map::new(),
        }
    }

    /// Parses a single reference or inline node from JSON.
    pub fn from_value(value: Value) -> Result<Self, DefinitionError> {
        match value {
            Value::Object(map) => classify(map),
            other => Err(DefinitionError::NotAnObject {
                context: "a reference".to_string(),
                found: other.to_string(),
            }),
        }
    }
}

impl TryFrom<Value> for Reference {
    type Error = DefinitionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Reference::from_value(value)
    }
}

/// A raw node embedded inline in the application tree, such as `app`, `ui-services`,
/// `ui-service-method` or a pre-typed `timer`/`topic`/`queue`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct StructuralNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Option<Vec<Reference>>,
    pub metadata_lines: Option<Vec<MetadataLine>>,
    pub extra: Map<String, Value>,
}

impl StructuralNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: None,
            metadata_lines: None,
            extra: Map::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Reference>) -> Self {
        self.children = Some(children);
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
        match value {
            Value::Object(map) => structural_from_map(map),
            other => Err(DefinitionError::NotAnObject {
                context: "a structural node".to_string(),
                found: other.to_string(),
            }),
        }
    }
}

impl TryFrom<Value> for StructuralNode {
    type Error = DefinitionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        StructuralNode::from_value(value)
    }
}

fn classify(mut map: Map<String, Value>) -> Result<Reference, DefinitionError> {
    let is_async = take_flag(&mut map, "async")?;
    let is_topic_publish = take_flag(&mut map, "topicPublish")?;
    let reference = take_string(&mut map, "ref")?;

    match reference {
        Some(name) if is_async => {
            let queue_name = take_string(&mut map, "queueName")?;
            let metadata_lines = take_metadata(&mut map, &name)?;
            Ok(Reference::Async {
                name,
                queue_name,
                metadata_lines,
                extra: map,
            })
        }
        _ if is_topic_publish => {
            let topic_name = take_string(&mut map, "topicName")?;
            let queue_name = take_string(&mut map, "queueName")?;
            let metadata_lines = take_metadata(&mut map, topic_name.as_deref().unwrap_or("topic"))?;
            Ok(Reference::TopicPublish {
                topic_name,
                queue_name,
                metadata_lines,
                extra: map,
            })
        }
        Some(name) => Ok(Reference::Sync { name }),
        None => structural_from_map(map).map(Reference::Structural),
    }
}

fn structural_from_map(mut map: Map<String, Value>) -> Result<StructuralNode, DefinitionError> {
    let name = take_string(&mut map, "name")?
        .ok_or_else(|| DefinitionError::MissingField("name".to_string()))?;
    let node_type = take_string(&mut map, "type")?
        .map(NodeType::from)
        .ok_or_else(|| DefinitionError::MissingField("type".to_string()))?;

    let children = match map.remove("children") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .map(Reference::from_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(_) => {
            return Err(DefinitionError::InvalidField {
                context: format!("node '{}'", name),
                field: "children".to_string(),
                expected: "list".to_string(),
            });
        }
    };

    let metadata_lines = take_metadata(&mut map, &name)?;

    Ok(StructuralNode {
        name,
        node_type,
        children,
        metadata_lines,
        extra: map,
    })
}

fn take_flag(map: &mut Map<String, Value>, field: &str) -> Result<bool, DefinitionError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(flag),
        Some(_) => Err(DefinitionError::InvalidField {
            context: "a reference".to_string(),
            field: field.to_string(),
            expected: "boolean".to_string(),
        }),
    }
}

fn take_string(
    map: &mut Map<String, Value>,
    field: &str,
) -> Result<Option<String>, DefinitionError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(_) => Err(DefinitionError::InvalidField {
            context: "a reference".to_string(),
            field: field.to_string(),
            expected: "string".to_string(),
        }),
    }
}

fn take_metadata(
    map: &mut Map<String, Value>,
    owner: &str,
) -> Result<Option<Vec<MetadataLine>>, DefinitionError> {
    match map.remove("metadata_lines") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(|_| {
            DefinitionError::InvalidField {
                context: format!("node '{}'", owner),
                field: "metadata_lines".to_string(),
                expected: "list of metadata lines".to_string(),
            }
        }),
    }
}
