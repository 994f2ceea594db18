//! # calltree - Call Graph Resolution Engine
//!
//! **calltree** turns a declarative application description into a fully materialized,
//! cycle-safe display tree. The description is a pool of named functions that reference
//! each other plus a root application tree. References can be direct calls, async
//! invocations through a queue, or publishes to a topic.
//!
//! ## Core Workflow
//!
//! 1.  **Register Functions**: Define the function pool on a `TreeBuilder`, either
//!     directly, from JSON, or through the `IntoRegistry` trait for custom formats.
//! 2.  **Plug In Resolvers**: Optionally attach an `AsyncQueueResolver` and a
//!     `TopicResolver` to look up real queue names for async and publish edges.
//! 3.  **Build**: Call `build` with the root application node. Every registered function
//!     is resolved once per ancestor context, then the root tree is materialized from
//!     that cache.
//! 4.  **Render**: Serialize the resulting `OutputNode` tree with serde, or print it with
//!     the `TreeFormatter`.
//!
//! Unresolved references, cycles and resolver failures never abort a build; they show
//! up as typed diagnostic nodes and metadata lines inside the tree.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use calltree::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut builder = TreeBuilder::builder()
//!     .filter_empty_ui_service_methods(true)
//!     .build();
//!
//! builder.define_function(
//!     "Checkout",
//!     FunctionDefinition::from_value(json!({
//!         "app": "shop",
//!         "children": [
//!             { "ref": "Charge" },
//!             { "ref": "SendReceipt", "async": true },
//!             { "topicPublish": true, "topicName": "orders" }
//!         ]
//!     }))?,
//! );
//! builder.define_function("Charge", FunctionDefinition::default());
//! builder.define_function(
//!     "SendReceipt",
//!     FunctionDefinition::default().with_queue_name("MAIL.Q"),
//! );
//!
//! let root = StructuralNode::from_value(json!({
//!     "name": "shop",
//!     "type": "app",
//!     "children": [{ "ref": "checkout" }]
//! }))?;
//!
//! let tree = builder.build(&root).await?;
//! println!("{}", TreeFormatter::format_tree(&tree));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod data;
pub mod definition;
pub mod error;
pub mod external;
pub mod logging;
pub mod prelude;
pub mod registry;
pub mod render;
