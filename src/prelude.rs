//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the calltree
//! crate. Import it to get the builder, the definition model and the resolver traits
//! without importing each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use calltree::prelude::*;
//!
//! # async fn run_example() -> Result<()> {
//! let description = AppDescription::from_file("path/to/app.json")?;
//!
//! let mut builder = TreeBuilder::new();
//! let root = description.register(&mut builder);
//!
//! let tree = builder.build(&root).await?;
//! println!("{}", TreeFormatter::format_tree(&tree));
//! # Ok(())
//! # }
//! ```

// Core resolution
pub use crate::builder::{TreeBuilder, TreeBuilderBuilder};
pub use crate::config::{BuilderConfig, Severity};
pub use crate::registry::FunctionRegistry;

// Definition and output model
pub use crate::definition::{
    FunctionDefinition, IntoRegistry, MetadataLine, NodeType, OutputNode, Reference,
    StructuralNode,
};

// External resolvers and logging
pub use crate::external::{AsyncQueueResolver, QueueTable, ResolverOutput, TopicResolver};
pub use crate::logging::{Logger, NullLogger, TracingLogger};

// Loading
pub use crate::data::AppDescription;

// Error types
pub use crate::error::{BuildError, ConversionError, DefinitionError, LoadError, ResolverError};

// Tree formatting
pub use crate::render::TreeFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
