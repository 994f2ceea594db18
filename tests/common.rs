//! Common test utilities for building registries, root trees and resolver doubles.
use async_trait::async_trait;
use calltree::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A small shop application: a call chain with a loop, an async edge, a topic publish,
/// an empty service method and a dangling reference.
#[allow(dead_code)]
pub const SHOP_DESCRIPTION_JSON: &str = r#"{
    "functions": {
        "Checkout": {
            "app": "shop",
            "children": [
                { "ref": "Charge" },
                { "ref": "SendReceipt", "async": true, "label": "email" },
                { "topicPublish": true, "topicName": "orders" }
            ]
        },
        "Charge": { "queueName": "CHARGE.Q", "children": [{ "ref": "Audit" }] },
        "SendReceipt": { "queueName": "MAIL.Q" },
        "Audit": { "children": [{ "ref": "checkout" }] }
    },
    "app": {
        "name": "shop-ui",
        "type": "app",
        "children": [
            {
                "name": "CartService",
                "type": "ui-services",
                "children": [
                    {
                        "name": "pay",
                        "type": "ui-service-method",
                        "children": [{ "ref": "Checkout" }]
                    },
                    { "name": "noop", "type": "ui-service-method", "children": [] }
                ]
            },
            { "ref": "Missing" }
        ]
    }
}"#;

/// Creates a builder with default configuration whose registry is parsed from a JSON
/// object of `{ name: definition }`.
#[allow(dead_code)]
pub fn builder_with(functions: Value) -> TreeBuilder {
    let mut builder = TreeBuilder::builder().with_logger(Arc::new(NullLogger)).build();
    define_all(&mut builder, functions);
    builder
}

/// Registers every `{ name: definition }` entry of a JSON object on `builder`.
#[allow(dead_code)]
pub fn define_all(builder: &mut TreeBuilder, functions: Value) {
    let Value::Object(map) = functions else {
        panic!("function pool must be a JSON object");
    };
    for (name, definition) in map {
        let definition = FunctionDefinition::from_value(definition).expect("valid definition");
        builder.define_function(&name, definition);
    }
}

/// Creates a root `app` node named `name` with the given JSON children.
#[allow(dead_code)]
pub fn app(name: &str, children: Value) -> StructuralNode {
    StructuralNode::from_value(serde_json::json!({
        "name": name,
        "type": "app",
        "children": children,
    }))
    .expect("valid app node")
}

/// Follows a chain of child indexes from `node`.
#[allow(dead_code)]
pub fn descend<'a>(node: &'a OutputNode, indexes: &[usize]) -> &'a OutputNode {
    indexes.iter().fold(node, |current, &index| {
        current
            .children()
            .get(index)
            .map(|child| &**child)
            .unwrap_or_else(|| panic!("node '{}' has no child {}", current.name, index))
    })
}

/// A resolver double that records every call and can delay, answer or fail per name.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedResolver {
    answers: HashMap<String, ResolverOutput>,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

#[allow(dead_code)]
impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, name: &str, output: ResolverOutput) -> Self {
        self.answers.insert(name.to_string(), output);
        self
    }

    pub fn delay(mut self, name: &str, millis: u64) -> Self {
        self.delays
            .insert(name.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn fail(mut self, name: &str, message: &str) -> Self {
        self.failures.insert(name.to_string(), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|(n, _)| n == name).count()
    }

    async fn respond(
        &self,
        name: &str,
        queue_name: Option<&str>,
    ) -> std::result::Result<Option<ResolverOutput>, ResolverError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), queue_name.map(str::to_string)));
        if let Some(delay) = self.delays.get(name) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.failures.get(name) {
            return Err(ResolverError::Failed(message.clone()));
        }
        Ok(self.answers.get(name).cloned())
    }
}

#[async_trait]
impl AsyncQueueResolver for ScriptedResolver {
    async fn resolve_queue(
        &self,
        function_name: &str,
        queue_name: Option<&str>,
    ) -> std::result::Result<Option<ResolverOutput>, ResolverError> {
        self.respond(function_name, queue_name).await
    }
}

#[async_trait]
impl TopicResolver for ScriptedResolver {
    async fn resolve_topic(
        &self,
        topic_name: &str,
        queue_name: Option<&str>,
    ) -> std::result::Result<Option<ResolverOutput>, ResolverError> {
        self.respond(topic_name, queue_name).await
    }
}

/// A logger that keeps every message, tagged with its level.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingLogger {
    pub messages: Mutex<Vec<(&'static str, String)>>,
}

#[allow(dead_code)]
impl RecordingLogger {
    pub fn at(&self, level: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(("error", message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(("warn", message.to_string()));
    }

    fn debug(&self, message: &str) {
        self.messages.lock().unwrap().push(("debug", message.to_string()));
    }
}
