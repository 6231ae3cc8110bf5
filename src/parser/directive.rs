//! Directive nodes and the registry that maps directive names to parsers

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::error::{CompileError, Position, RegistryError};
use crate::parser::arguments::ArgumentCursor;
use crate::parser::document::DocumentParser;
use crate::render::{RenderContext, RenderError};

/// Runtime node produced by a directive parser.
///
/// Compiled templates are shared between concurrent renders, so `execute`
/// must only write into the context it is given.
pub trait DirectiveNode: Any + fmt::Debug + Send + Sync {
    fn execute(&self, ctx: &mut RenderContext, out: &mut String) -> Result<(), RenderError>;

    fn as_any(&self) -> &dyn Any;
}

/// Parser for one directive name.
///
/// Receives the document parser (for template loading and block bodies), the
/// position of the directive name and a cursor over the remaining arguments.
pub type DirectiveParser = fn(
    &mut DocumentParser<'_>,
    &Position,
    &mut ArgumentCursor<'_>,
) -> Result<Box<dyn DirectiveNode>, CompileError>;

/// Directive name to parser table
#[derive(Clone, Default)]
pub struct DirectiveRegistry {
    parsers: HashMap<String, DirectiveParser>,
}

impl fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("DirectiveRegistry")
            .field("directives", &names)
            .finish()
    }
}

impl DirectiveRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding `macro`, `import` and `from`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, parser) in crate::directives::BUILTINS {
            registry.parsers.insert(name.to_string(), *parser);
        }
        registry
    }

    /// Register a parser under a new name
    pub fn register(&mut self, name: &str, parser: DirectiveParser) -> Result<(), RegistryError> {
        if self.parsers.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        self.parsers.insert(name.to_string(), parser);
        Ok(())
    }

    /// Swap the parser of an existing directive
    pub fn replace(&mut self, name: &str, parser: DirectiveParser) -> Result<(), RegistryError> {
        match self.parsers.get_mut(name) {
            Some(slot) => {
                *slot = parser;
                Ok(())
            }
            None => Err(RegistryError::NotRegistered {
                name: name.to_string(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<DirectiveParser> {
        self.parsers.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(|s| s.as_str())
    }
}
