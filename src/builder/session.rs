use super::metadata::{annotate_logs, app_line, function_log_data, resolver_failure_line};
use crate::config::BuilderConfig;
use crate::definition::{
    FunctionDefinition, MetadataLine, NodeType, OutputNode, Reference, StructuralNode,
};
use crate::external::{AsyncQueueResolver, ResolverOutput, TopicResolver};
use crate::logging::Logger;
use crate::registry::{FunctionRegistry, normalize};
use ahash::AHashMap;
use futures::future::{self, BoxFuture, FutureExt, Shared, join_all};
use itertools::Itertools;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const UNKNOWN_TOPIC: &str = "unknown topic";

type PendingNode = Shared<BoxFuture<'static, Arc<OutputNode>>>;

/// A normalized function name together with the set of its active ancestors.
type ContextKey = (String, BTreeSet<String>);

/// The ancestor functions active on the current resolution branch.
#[derive(Debug, Clone, Default)]
pub(crate) struct Trail {
    visited: BTreeSet<String>,
    path: Vec<String>,
}

impl Trail {
    fn contains(&self, key: &str) -> bool {
        self.visited.contains(key)
    }

    fn enter(&self, key: String, display_name: &str) -> Trail {
        let mut next = self.clone();
        next.visited.insert(key);
        next.path.push(display_name.to_string());
        next
    }

    /// Memoization key: the same function under a different set of ancestors may need
    /// different stoppers, so the context is part of the key.
    fn cache_key(&self, key: &str) -> ContextKey {
        (key.to_string(), self.visited.clone())
    }
}

#[derive(Default)]
struct SessionState {
    resolved: AHashMap<ContextKey, Arc<OutputNode>>,
    in_flight: AHashMap<ContextKey, PendingNode>,
}

struct SessionInner {
    registry: Arc<FunctionRegistry>,
    config: Arc<BuilderConfig>,
    async_resolver: Option<Arc<dyn AsyncQueueResolver>>,
    topic_resolver: Option<Arc<dyn TopicResolver>>,
    logger: Arc<dyn Logger>,
    state: Mutex<SessionState>,
}

/// Resolution state for a single `build()` call.
///
/// Holds the per-context cache and the in-flight map. A session is never reused, so
/// nothing leaks from one build into the next.
#[derive(Clone)]
pub(crate) struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub(crate) fn new(
        registry: Arc<FunctionRegistry>,
        config: Arc<BuilderConfig>,
        async_resolver: Option<Arc<dyn AsyncQueueResolver>>,
        topic_resolver: Option<Arc<dyn TopicResolver>>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                registry,
                config,
                async_resolver,
                topic_resolver,
                logger,
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn cached_contexts(&self) -> usize {
        self.lock().resolved.len()
    }

    /// Pass 1: resolves every registered function under the empty context, in registry
    /// order, populating the cache for every context reachable from them.
    pub(crate) async fn pre_resolve(&self) {
        let root = Trail::default();
        let keys: Vec<String> = self.inner.registry.keys().map(str::to_string).collect();
        for key in keys {
            let cached = self.lock().resolved.contains_key(&root.cache_key(&key));
            if cached {
                continue;
            }
            self.resolve_function(&key, &root).await;
        }
    }

    /// Resolves a function reference under the given ancestor trail.
    ///
    /// Order of checks: live cycle, cache, in-flight, unknown name, fresh resolution.
    /// The cache and in-flight lookups and the in-flight registration happen under one
    /// lock, so a key is only ever resolved once per session.
    pub(crate) fn resolve_function(
        &self,
        name: &str,
        trail: &Trail,
    ) -> BoxFuture<'static, Arc<OutputNode>> {
        let key = normalize(name);
        let definition = self.inner.registry.get(name);

        if trail.contains(&key) {
            let display_name = definition.map_or(name, |d| d.display_name.as_str());
            self.inner.logger.debug(&format!(
                "loop detected at '{}' via {}",
                display_name,
                trail.path.iter().join(" -> ")
            ));
            let stopper = OutputNode::cycle_stopper(display_name, trail.path.clone());
            return future::ready(Arc::new(stopper)).boxed();
        }

        let cache_key = trail.cache_key(&key);
        let mut state = self.lock();

        if let Some(node) = state.resolved.get(&cache_key) {
            return future::ready(Arc::clone(node)).boxed();
        }
        if let Some(pending) = state.in_flight.get(&cache_key) {
            return pending.clone().boxed();
        }

        let Some(definition) = definition else {
            self.inner.logger.warn(&format!(
                "dependency to {} could not be resolved so the tree may be incomplete",
                name
            ));
            let severity = NodeType::from(self.inner.config.unresolved_severity);
            let node = Arc::new(OutputNode::unresolved(name, severity));
            state.resolved.insert(cache_key, Arc::clone(&node));
            return future::ready(node).boxed();
        };

        let session = self.clone();
        let definition = definition.clone();
        let inner_trail = trail.enter(key, &definition.display_name);
        let pending_key = cache_key.clone();
        let pending = async move {
            session
                .materialize_function(definition, inner_trail, pending_key)
                .await
        }
        .boxed()
        .shared();

        state.in_flight.insert(cache_key, pending.clone());
        drop(state);
        pending.boxed()
    }

    async fn materialize_function(
        self,
        definition: FunctionDefinition,
        trail: Trail,
        cache_key: ContextKey,
    ) -> Arc<OutputNode> {
        let FunctionDefinition {
            display_name,
            children,
            app,
            metadata_lines,
            extra,
            ..
        } = definition;

        let mut node = OutputNode::new(display_name, NodeType::Function);
        node.merge_extra(extra);
        node.metadata_lines = metadata_lines;
        if let Some(app) = &app {
            node.prepend_metadata(app_line(app));
        }
        if !children.is_empty() {
            node.children = Some(self.resolve_children(&children, &trail).await);
        }
        annotate_logs(
            &self.inner.config,
            &mut node,
            function_log_data(app.as_deref()),
        );

        let mut state = self.lock();
        let node = Arc::clone(state.resolved.entry(cache_key.clone()).or_insert(Arc::new(node)));
        state.in_flight.remove(&cache_key);
        node
    }

    /// Resolves sibling references concurrently. Output order matches input order;
    /// children that resolve to nothing are dropped.
    pub(crate) async fn resolve_children(
        &self,
        children: &[Reference],
        trail: &Trail,
    ) -> Vec<Arc<OutputNode>> {
        join_all(children.iter().map(|child| self.resolve_child(child, trail)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Resolves one edge. `None` means the node was filtered away.
    pub(crate) fn resolve_child<'a>(
        &'a self,
        reference: &'a Reference,
        trail: &'a Trail,
    ) -> BoxFuture<'a, Option<Arc<OutputNode>>> {
        async move {
            match reference {
                Reference::Sync { name } => Some(self.resolve_function(name, trail).await),
                Reference::Async {
                    name,
                    queue_name,
                    metadata_lines,
                    extra,
                } => Some(
                    self.resolve_async(name, queue_name.as_deref(), metadata_lines, extra, trail)
                        .await,
                ),
                Reference::TopicPublish {
                    topic_name,
                    queue_name,
                    metadata_lines,
                    extra,
                } => Some(
                    self.resolve_topic(
                        topic_name.as_deref(),
                        queue_name.as_deref(),
                        metadata_lines,
                        extra,
                    )
                    .await,
                ),
                Reference::Structural(node) => self.resolve_structural(node, trail).await,
            }
        }
        .boxed()
    }

    async fn resolve_async(
        &self,
        name: &str,
        inline_queue: Option<&str>,
        metadata_lines: &Option<Vec<MetadataLine>>,
        extra: &Map<String, Value>,
        trail: &Trail,
    ) -> Arc<OutputNode> {
        let definition = self.inner.registry.get(name);
        let display_name = definition.map_or(name, |d| d.display_name.as_str());
        let default_queue =
            inline_queue.or_else(|| definition.and_then(|d| d.queue_name.as_deref()));

        let mut node = OutputNode::new(String::new(), NodeType::Timer);
        node.merge_extra(extra.clone());
        node.metadata_lines = metadata_lines.clone();

        let mut resolved_queue = None;
        if let Some(resolver) = &self.inner.async_resolver {
            match resolver.resolve_queue(display_name, default_queue).await {
                Ok(Some(output)) => resolved_queue = apply_resolver_output(&mut node, output),
                Ok(None) => {}
                Err(e) => {
                    self.inner.logger.error(&format!(
                        "asyncResolver failed for '{}': {}",
                        display_name, e
                    ));
                    node.push_metadata(resolver_failure_line("asyncResolver", &e.to_string()));
                }
            }
        }

        node.name = resolved_queue
            .or_else(|| default_queue.map(str::to_string))
            .unwrap_or_else(|| format!("{}_queue", display_name));
        node.children = Some(vec![self.resolve_function(name, trail).await]);
        annotate_logs(&self.inner.config, &mut node, Map::new());
        Arc::new(node)
    }

    async fn resolve_topic(
        &self,
        topic_name: Option<&str>,
        inline_queue: Option<&str>,
        metadata_lines: &Option<Vec<MetadataLine>>,
        extra: &Map<String, Value>,
    ) -> Arc<OutputNode> {
        let effective_topic = topic_name.unwrap_or(UNKNOWN_TOPIC);

        let mut node = OutputNode::new(String::new(), NodeType::Topic);
        node.merge_extra(extra.clone());
        node.metadata_lines = metadata_lines.clone();

        let mut resolved_queue = None;
        if let Some(resolver) = &self.inner.topic_resolver {
            match resolver.resolve_topic(effective_topic, inline_queue).await {
                Ok(Some(output)) => resolved_queue = apply_resolver_output(&mut node, output),
                Ok(None) => {}
                Err(e) => {
                    self.inner.logger.error(&format!(
                        "topicPublishResolver failed for '{}': {}",
                        effective_topic, e
                    ));
                    node.push_metadata(resolver_failure_line(
                        "topicPublishResolver",
                        &e.to_string(),
                    ));
                }
            }
        }

        node.name = resolved_queue
            .or_else(|| inline_queue.map(str::to_string))
            .unwrap_or_else(|| match topic_name {
                Some(topic) => format!("{}_queue", topic),
                None => UNKNOWN_TOPIC.to_string(),
            });
        annotate_logs(&self.inner.config, &mut node, Map::new());
        Arc::new(node)
    }

    /// Copies an inline node and resolves its children. Structural nodes never join the
    /// trail: only functions take part in cycle detection.
    pub(crate) async fn resolve_structural(
        &self,
        source: &StructuralNode,
        trail: &Trail,
    ) -> Option<Arc<OutputNode>> {
        let config = &self.inner.config;
        let mut node = OutputNode::new(source.name.clone(), source.node_type.clone());
        node.merge_extra(source.extra.clone());
        node.metadata_lines = source.metadata_lines.clone();

        if let Some(children) = &source.children {
            let mut resolved = self.resolve_children(children, trail).await;
            if node.node_type == NodeType::UiServices && config.filter_empty_ui_service_methods {
                resolved.retain(|child| {
                    child.node_type != NodeType::UiServiceMethod || child.has_children()
                });
            }
            node.children = Some(resolved);
        }

        if node.node_type == NodeType::UiServices
            && config.filter_empty_ui_services
            && !node.has_children()
        {
            self.inner
                .logger
                .debug(&format!("dropping empty ui-services node '{}'", node.name));
            return None;
        }

        annotate_logs(config, &mut node, Map::new());
        Some(Arc::new(node))
    }
}

/// Merges resolver-provided fields over the node and returns the resolver's queue name.
fn apply_resolver_output(node: &mut OutputNode, output: ResolverOutput) -> Option<String> {
    let ResolverOutput {
        queue_name,
        metadata_lines,
        extra,
    } = output;
    node.merge_extra(extra);
    if metadata_lines.is_some() {
        node.metadata_lines = metadata_lines;
    }
    queue_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullLogger;

    fn session(registry: FunctionRegistry) -> Session {
        Session::new(
            Arc::new(registry),
            Arc::new(BuilderConfig::default()),
            None,
            None,
            Arc::new(NullLogger),
        )
    }

    fn visited(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn cache_key_is_independent_of_entry_order() {
        let trail = Trail::default()
            .enter("zeta".to_string(), "Zeta")
            .enter("alpha".to_string(), "Alpha");
        let reversed = Trail::default()
            .enter("alpha".to_string(), "Alpha")
            .enter("zeta".to_string(), "Zeta");

        assert_eq!(trail.cache_key("f"), ("f".to_string(), visited(&["alpha", "zeta"])));
        assert_eq!(trail.cache_key("f"), reversed.cache_key("f"));
        assert_eq!(Trail::default().cache_key("f"), ("f".to_string(), BTreeSet::new()));
    }

    #[test]
    fn cache_key_keeps_names_containing_separators_apart() {
        let single = Trail::default().enter("a,b".to_string(), "a,b");
        let pair = Trail::default()
            .enter("a".to_string(), "a")
            .enter("b".to_string(), "b");

        assert_ne!(single.cache_key("f"), pair.cache_key("f"));
        assert_ne!(
            Trail::default().enter("b".to_string(), "b").cache_key("a::"),
            Trail::default().enter(":b".to_string(), ":b").cache_key("a:")
        );
    }

    #[test]
    fn unresolved_names_are_cached_per_context() {
        let session = session(FunctionRegistry::new());
        let trail = Trail::default();

        let first = tokio_test::block_on(session.resolve_function("ghost", &trail));
        let second = tokio_test::block_on(session.resolve_function("GHOST", &trail));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.node_type, NodeType::Warning);
        assert_eq!(session.cached_contexts(), 1);
    }

    #[test]
    fn pre_resolve_fills_the_cache_for_nested_contexts() {
        let mut registry = FunctionRegistry::new();
        registry.define("a", FunctionDefinition::new(vec![Reference::call("b")]));
        registry.define("b", FunctionDefinition::default());
        let session = session(registry);

        tokio_test::block_on(session.pre_resolve());

        // a::, b::a and b::
        assert_eq!(session.cached_contexts(), 3);
        assert!(session.lock().in_flight.is_empty());
    }
}
