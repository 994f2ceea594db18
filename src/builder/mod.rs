use crate::config::{BuilderConfig, Severity};
use crate::definition::{FunctionDefinition, IntoRegistry, NodeType, OutputNode, StructuralNode};
use crate::error::{BuildError, ConversionError};
use crate::external::{AsyncQueueResolver, TopicResolver};
use crate::logging::{Logger, TracingLogger};
use crate::registry::FunctionRegistry;
use std::sync::Arc;

mod metadata;
mod session;

use session::{Session, Trail};

/// Resolves a function registry and a root application tree into a display tree.
///
/// Every call to [`TreeBuilder::build`] runs in its own resolution session: caches are
/// fresh for each build and only the registry carries over.
pub struct TreeBuilder {
    registry: Arc<FunctionRegistry>,
    config: Arc<BuilderConfig>,
    async_resolver: Option<Arc<dyn AsyncQueueResolver>>,
    topic_resolver: Option<Arc<dyn TopicResolver>>,
    logger: Arc<dyn Logger>,
}

pub struct TreeBuilderBuilder {
    config: BuilderConfig,
    async_resolver: Option<Arc<dyn AsyncQueueResolver>>,
    topic_resolver: Option<Arc<dyn TopicResolver>>,
    logger: Arc<dyn Logger>,
}

impl Default for TreeBuilderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilderBuilder {
    pub fn new() -> Self {
        Self {
            config: BuilderConfig::default(),
            async_resolver: None,
            topic_resolver: None,
            logger: Arc::new(TracingLogger),
        }
    }
    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }
    pub fn unresolved_severity(mut self, severity: Severity) -> Self {
        self.config.unresolved_severity = severity;
        self
    }
    pub fn filter_empty_ui_service_methods(mut self, enabled: bool) -> Self {
        self.config.filter_empty_ui_service_methods = enabled;
        self
    }
    pub fn filter_empty_ui_services(mut self, enabled: bool) -> Self {
        self.config.filter_empty_ui_services = enabled;
        self
    }
    pub fn log_node_types(mut self, node_types: impl IntoIterator<Item = NodeType>) -> Self {
        self.config.log_node_types = node_types.into_iter().collect();
        self
    }
    pub fn with_async_resolver(mut self, resolver: Arc<dyn AsyncQueueResolver>) -> Self {
        self.async_resolver = Some(resolver);
        self
    }
    pub fn with_topic_resolver(mut self, resolver: Arc<dyn TopicResolver>) -> Self {
        self.topic_resolver = Some(resolver);
        self
    }
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }
    pub fn build(self) -> TreeBuilder {
        TreeBuilder {
            registry: Arc::new(FunctionRegistry::new()),
            config: Arc::new(self.config),
            async_resolver: self.async_resolver,
            topic_resolver: self.topic_resolver,
            logger: self.logger,
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// A builder with default configuration and no external resolvers.
    pub fn new() -> Self {
        TreeBuilderBuilder::new().build()
    }

    pub fn builder() -> TreeBuilderBuilder {
        TreeBuilderBuilder::new()
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Registers a function, replacing any definition with the same case-folded name.
    pub fn define_function(&mut self, name: &str, definition: FunctionDefinition) {
        Arc::make_mut(&mut self.registry).define(name, definition);
    }

    pub fn define_functions<I, S>(&mut self, definitions: I)
    where
        I: IntoIterator<Item = (S, FunctionDefinition)>,
        S: AsRef<str>,
    {
        Arc::make_mut(&mut self.registry).define_all(definitions);
    }

    /// Registers every function produced by a custom format conversion.
    pub fn define_from(&mut self, source: impl IntoRegistry) -> Result<(), ConversionError> {
        let definitions = source.into_registry()?;
        self.define_functions(definitions);
        Ok(())
    }

    fn session(&self) -> Session {
        Session::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.config),
            self.async_resolver.clone(),
            self.topic_resolver.clone(),
            Arc::clone(&self.logger),
        )
    }

    /// Materializes the display tree for `root`.
    ///
    /// Unresolved references, cycles and resolver failures are reported inside the tree.
    /// The only error is a root that the filtering rules removed entirely.
    pub async fn build(&self, root: &StructuralNode) -> Result<Arc<OutputNode>, BuildError> {
        let session = self.session();
        self.logger.debug(&format!(
            "pre-resolving {} registered functions",
            self.registry.len()
        ));
        session.pre_resolve().await;
        self.logger.debug(&format!(
            "pre-resolution cached {} function contexts",
            session.cached_contexts()
        ));

        session
            .resolve_structural(root, &Trail::default())
            .await
            .ok_or_else(|| BuildError::EmptyRoot(root.name.clone()))
    }

    /// Resolves a single function from an empty ancestor context, outside of any tree.
    pub async fn resolve_function(&self, name: &str) -> Arc<OutputNode> {
        self.session().resolve_function(name, &Trail::default()).await
    }
}
