use crate::config::BuilderConfig;
use crate::definition::{MetadataLine, OutputNode};
use serde_json::{Map, Value};

/// The line synthesized from a function's `app` tag.
pub(super) fn app_line(app: &str) -> MetadataLine {
    MetadataLine::plain(app)
}

/// The line attached when an external resolver fails for a node.
pub(super) fn resolver_failure_line(resolver: &str, message: &str) -> MetadataLine {
    MetadataLine::plain(format!("{} errored out: {}", resolver, message))
}

/// Prepends the clickable "Logs" line when the node's type is configured for it.
///
/// The line's data holds the node's name and type, plus `extra`. It always ends up first,
/// ahead of any `app` line.
pub(super) fn annotate_logs(
    config: &BuilderConfig,
    node: &mut OutputNode,
    extra: Map<String, Value>,
) {
    if !config.logs(&node.node_type) {
        return;
    }
    let mut data = Map::new();
    data.insert("name".to_string(), Value::String(node.name.clone()));
    data.insert(
        "type".to_string(),
        Value::String(node.node_type.as_str().to_string()),
    );
    data.extend(extra);
    node.prepend_metadata(MetadataLine::clickable("Logs", Value::Object(data)));
}

/// The `extra` payload of a function node's "Logs" line.
pub(super) fn function_log_data(app: Option<&str>) -> Map<String, Value> {
    let mut data = Map::new();
    if let Some(app) = app {
        data.insert("app".to_string(), Value::String(app.to_string()));
    }
    data
}
