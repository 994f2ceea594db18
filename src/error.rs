use thiserror::Error;

/// Errors raised while ingesting function definitions or application trees from JSON.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("Failed to parse definition JSON: {0}")]
    JsonParseError(String),

    #[error("Expected an object for {context}, but found: {found}")]
    NotAnObject { context: String, found: String },

    #[error("Field '{field}' on {context} must be a {expected}")]
    InvalidField {
        context: String,
        field: String,
        expected: String,
    },

    #[error("Structural node is missing its required '{0}' field")]
    MissingField(String),
}

/// Errors that an external queue or topic resolver can report.
///
/// Only the `Display` text of these errors ever reaches the output tree; a failing
/// resolver never aborts a build.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolverError {
    #[error("{0}")]
    Failed(String),

    #[error("{0}")]
    Other(String),
}

/// Unexpected conditions that abort a whole `build()` call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Root node '{0}' was filtered out and produced no tree")]
    EmptyRoot(String),
}

/// Errors raised while loading an application description from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Errors that can occur when converting a custom user format into function definitions.
#[derive(Error, Debug, Clone)]
pub enum ConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),
}
