use crate::definition::MetadataLine;
use crate::error::{DefinitionError, ResolverError};
use crate::registry::normalize;
use ahash::AHashMap;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

/// What an external resolver can contribute to a timer or topic node.
///
/// `queue_name` replaces the node's name. `metadata_lines` and every key of `extra`
/// override whatever the inline reference carried.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverOutput {
    #[serde(default)]
    pub queue_name: Option<String>,
    #[serde(default, rename = "metadata_lines", alias = "metadataLines")]
    pub metadata_lines: Option<Vec<MetadataLine>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolverOutput {
    pub fn queue(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: Some(queue_name.into()),
            ..Self::default()
        }
    }
}

/// Looks up the queue behind an async invocation of a function.
#[async_trait]
pub trait AsyncQueueResolver: Send + Sync {
    /// `queue_name` is the inline queue of the reference, or the function's registered
    /// default when the reference has none.
    async fn resolve_queue(
        &self,
        function_name: &str,
        queue_name: Option<&str>,
    ) -> Result<Option<ResolverOutput>, ResolverError>;
}

/// Looks up the queue that a topic publish ends up in.
#[async_trait]
pub trait TopicResolver: Send + Sync {
    async fn resolve_topic(
        &self,
        topic_name: &str,
        queue_name: Option<&str>,
    ) -> Result<Option<ResolverOutput>, ResolverError>;
}

/// A fixed lookup table serving both resolver roles.
///
/// Function names match case-insensitively; topic names match exactly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueTable {
    #[serde(default)]
    functions: AHashMap<String, String>,
    #[serde(default)]
    topics: AHashMap<String, String>,
}

impl QueueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(mut self, function_name: &str, queue_name: impl Into<String>) -> Self {
        self.functions.insert(normalize(function_name), queue_name.into());
        self
    }

    pub fn with_topic(
        mut self,
        topic_name: impl Into<String>,
        queue_name: impl Into<String>,
    ) -> Self {
        self.topics.insert(topic_name.into(), queue_name.into());
        self
    }

    /// Parses `{ "functions": { name: queue }, "topics": { name: queue } }`.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        let raw: QueueTable = serde_json::from_str(json)
            .map_err(|e| DefinitionError::JsonParseError(e.to_string()))?;
        Ok(Self {
            functions: raw
                .functions
                .into_iter()
                .map(|(name, queue)| (normalize(&name), queue))
                .collect(),
            topics: raw.topics,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.topics.is_empty()
    }
}

#[async_trait]
impl AsyncQueueResolver for QueueTable {
    async fn resolve_queue(
        &self,
        function_name: &str,
        _queue_name: Option<&str>,
    ) -> Result<Option<ResolverOutput>, ResolverError> {
        Ok(self
            .functions
            .get(&normalize(function_name))
            .map(ResolverOutput::queue))
    }
}

#[async_trait]
impl TopicResolver for QueueTable {
    async fn resolve_topic(
        &self,
        topic_name: &str,
        _queue_name: Option<&str>,
    ) -> Result<Option<ResolverOutput>, ResolverError> {
        Ok(self.topics.get(topic_name).map(ResolverOutput::queue))
    }
}
