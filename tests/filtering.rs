//! Tests for ui-services filtering and "Logs" metadata annotation.
mod common;
use calltree::prelude::*;
use common::*;
use serde_json::json;
use std::sync::Arc;

fn services_root() -> StructuralNode {
    app(
        "shop",
        json!([
            {
                "name": "CartService",
                "type": "ui-services",
                "children": [
                    { "name": "add", "type": "ui-service-method", "children": [] },
                    { "name": "remove", "type": "ui-service-method" },
                ]
            },
            { "ref": "leaf" },
        ]),
    )
}

fn filtering_builder(methods: bool, services: bool) -> TreeBuilder {
    let mut builder = TreeBuilder::builder()
        .filter_empty_ui_service_methods(methods)
        .filter_empty_ui_services(services)
        .with_logger(Arc::new(NullLogger))
        .build();
    define_all(&mut builder, json!({ "leaf": {} }));
    builder
}

#[tokio::test]
async fn test_filters_off_keep_everything() {
    let tree = filtering_builder(false, false)
        .build(&services_root())
        .await
        .expect("build");

    assert_eq!(tree.children().len(), 2);
    assert_eq!(tree.children()[0].children().len(), 2);
}

#[tokio::test]
async fn test_empty_methods_are_dropped() {
    let tree = filtering_builder(true, false)
        .build(&services_root())
        .await
        .expect("build");

    let services = &tree.children()[0];
    assert_eq!(services.node_type, NodeType::UiServices);
    assert_eq!(services.children, Some(Vec::new()));
}

#[tokio::test]
async fn test_services_emptied_by_method_filter_are_dropped() {
    let tree = filtering_builder(true, true)
        .build(&services_root())
        .await
        .expect("build");

    assert_eq!(tree.children().len(), 1);
    assert_eq!(tree.children()[0].name, "leaf");
}

#[tokio::test]
async fn test_methods_with_children_and_other_nodes_survive() {
    let root = app(
        "shop",
        json!([{
            "name": "CartService",
            "type": "ui-services",
            "children": [
                { "name": "add", "type": "ui-service-method", "children": [{ "ref": "leaf" }] },
                { "name": "remove", "type": "ui-service-method" },
                { "ref": "leaf" },
            ]
        }]),
    );

    let tree = filtering_builder(true, true).build(&root).await.expect("build");
    let services = &tree.children()[0];
    let names: Vec<_> = services.children().iter().map(|c| c.name.as_str()).collect();

    assert_eq!(names, vec!["add", "leaf"]);
}

#[tokio::test]
async fn test_services_filter_alone_drops_childless_services() {
    let root = app(
        "shop",
        json!([
            { "name": "Empty", "type": "ui-services", "children": [] },
            { "name": "Bare", "type": "ui-services" },
            {
                "name": "Kept",
                "type": "ui-services",
                "children": [{ "name": "m", "type": "ui-service-method" }]
            },
        ]),
    );

    let tree = filtering_builder(false, true).build(&root).await.expect("build");
    let names: Vec<_> = tree.children().iter().map(|c| c.name.as_str()).collect();

    assert_eq!(names, vec!["Kept"]);
}

#[tokio::test]
async fn test_filtered_root_is_an_error() {
    let root = StructuralNode::from_value(json!({ "name": "Nothing", "type": "ui-services" }))
        .expect("valid node");

    let result = filtering_builder(true, true).build(&root).await;

    assert!(matches!(result, Err(BuildError::EmptyRoot(name)) if name == "Nothing"));
}

#[tokio::test]
async fn test_function_logs_line_leads_the_metadata() {
    let mut builder = TreeBuilder::builder()
        .log_node_types([NodeType::Function])
        .with_logger(Arc::new(NullLogger))
        .build();
    define_all(&mut builder, json!({ "Charge": { "app": "billing" } }));

    let node = builder.resolve_function("charge").await;

    assert_eq!(
        node.metadata_lines(),
        &[
            MetadataLine::clickable(
                "Logs",
                json!({ "name": "Charge", "type": "function", "app": "billing" })
            ),
            MetadataLine::plain("billing"),
        ]
    );
}

#[tokio::test]
async fn test_logs_line_on_queue_like_and_structural_nodes() {
    let mut builder = TreeBuilder::builder()
        .log_node_types([NodeType::Timer, NodeType::Topic, NodeType::App])
        .with_logger(Arc::new(NullLogger))
        .build();
    define_all(
        &mut builder,
        json!({
            "sender": { "children": [{ "ref": "worker", "async": true, "queueName": "W.Q" }] },
            "worker": {},
        }),
    );
    let root = app(
        "shop",
        json!([
            { "ref": "sender" },
            { "topicPublish": true, "topicName": "orders" },
        ]),
    );

    let tree = builder.build(&root).await.expect("build");

    assert_eq!(
        tree.metadata_lines()[0],
        MetadataLine::clickable("Logs", json!({ "name": "shop", "type": "app" }))
    );
    let sender = &tree.children()[0];
    assert!(sender.metadata_lines.is_none());
    assert_eq!(
        sender.children()[0].metadata_lines(),
        &[MetadataLine::clickable("Logs", json!({ "name": "W.Q", "type": "timer" }))]
    );
    assert_eq!(
        tree.children()[1].metadata_lines(),
        &[MetadataLine::clickable(
            "Logs",
            json!({ "name": "orders_queue", "type": "topic" })
        )]
    );
}

#[tokio::test]
async fn test_cycle_stoppers_never_get_logs() {
    let mut builder = TreeBuilder::builder()
        .log_node_types([NodeType::Function, NodeType::DupeStopper])
        .with_logger(Arc::new(NullLogger))
        .build();
    define_all(&mut builder, json!({ "loop": { "children": [{ "ref": "loop" }] } }));

    let node = builder.resolve_function("loop").await;

    assert_eq!(node.metadata_lines()[0].text, "Logs");
    assert!(node.children()[0].is_cycle_stopper());
    assert!(node.children()[0].metadata_lines.is_none());
}

#[tokio::test]
async fn test_service_method_logs_line_precedes_inline_metadata() {
    let mut builder = TreeBuilder::builder()
        .log_node_types([NodeType::UiServiceMethod])
        .with_logger(Arc::new(NullLogger))
        .build();
    define_all(&mut builder, json!({ "leaf": {} }));
    let root = app(
        "shop",
        json!([{
            "name": "CartService",
            "type": "ui-services",
            "children": [{
                "name": "add",
                "type": "ui-service-method",
                "metadata_lines": [{ "text": "POST /cart" }],
                "children": [{ "ref": "leaf" }],
            }]
        }]),
    );

    let tree = builder.build(&root).await.expect("build");
    let method = descend(&tree, &[0, 0]);

    assert_eq!(
        method.metadata_lines(),
        &[
            MetadataLine::clickable(
                "Logs",
                json!({ "name": "add", "type": "ui-service-method" })
            ),
            MetadataLine::text("POST /cart"),
        ]
    );
    assert!(tree.metadata_lines.is_none());
    assert!(tree.children()[0].metadata_lines.is_none());
}

#[tokio::test]
async fn test_logs_line_precedes_resolver_failure_line() {
    let resolver = Arc::new(ScriptedResolver::new().fail("worker", "boom"));
    let mut builder = TreeBuilder::builder()
        .log_node_types([NodeType::Timer])
        .with_async_resolver(resolver)
        .with_logger(Arc::new(NullLogger))
        .build();
    define_all(&mut builder, json!({ "worker": { "queueName": "W.Q" } }));

    let tree = builder
        .build(&app("shop", json!([{ "ref": "worker", "async": true }])))
        .await
        .expect("build");

    assert_eq!(
        tree.children()[0].metadata_lines(),
        &[
            MetadataLine::clickable("Logs", json!({ "name": "W.Q", "type": "timer" })),
            MetadataLine::plain("asyncResolver errored out: boom"),
        ]
    );
}
