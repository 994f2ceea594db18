use super::function::FunctionDefinition;
use crate::error::ConversionError;
use indexmap::IndexMap;

/// A trait for custom data models that can be converted into calltree function definitions.
///
/// This is the extension point for keeping calltree format-agnostic. Implement it on the
/// structs of your own configuration format to feed them into a `TreeBuilder`.
///
/// # Example
///
/// ```rust,no_run
/// use calltree::prelude::*;
/// use calltree::error::ConversionError;
/// use indexmap::IndexMap;
///
/// struct Lambda { name: String, invokes: Vec<String> }
/// struct Stack { lambdas: Vec<Lambda> }
///
/// impl IntoRegistry for Stack {
///     fn into_registry(self) -> std::result::Result<IndexMap<String, FunctionDefinition>, ConversionError> {
///         let mut functions = IndexMap::new();
///         for lambda in self.lambdas {
///             let children = lambda.invokes.into_iter().map(Reference::call).collect();
///             functions.insert(lambda.name, FunctionDefinition::new(children));
///         }
///         Ok(functions)
///     }
/// }
/// ```
pub trait IntoRegistry {
    /// Consumes the object and produces function definitions keyed by name.
    fn into_registry(self) -> Result<IndexMap<String, FunctionDefinition>, ConversionError>;
}

impl IntoRegistry for IndexMap<String, FunctionDefinition> {
    fn into_registry(self) -> Result<IndexMap<String, FunctionDefinition>, ConversionError> {
        Ok(self)
    }
}
