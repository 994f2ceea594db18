use crate::definition::FunctionDefinition;
use indexmap::IndexMap;

/// Case-folds a function name into its registry identity.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
}

/// The pool of named, reusable function definitions.
///
/// Keys are case-insensitive; enumeration follows first-insertion order, and redefining a
/// name replaces its definition in place.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: IndexMap<String, FunctionDefinition>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a definition. An empty `display_name` is filled with `name`.
    pub fn define(&mut self, name: &str, mut definition: FunctionDefinition) {
        if definition.display_name.is_empty() {
            definition.display_name = name.to_string();
        }
        self.functions.insert(normalize(name), definition);
    }

    pub fn define_all<I, S>(&mut self, definitions: I)
    where
        I: IntoIterator<Item = (S, FunctionDefinition)>,
        S: AsRef<str>,
    {
        for (name, definition) in definitions {
            self.define(name.as_ref(), definition);
        }
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(&normalize(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&normalize(name))
    }

    /// Normalized keys in enumeration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Display names in enumeration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.values().map(|f| f.display_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
