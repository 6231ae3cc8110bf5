//! Macro registry for a compiled template

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::directives::MacroDefinition;

/// Which of a template's macros a lookup may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroVisibility {
    /// Only macros declared with `export` (used by `import`)
    Exported,
    /// Every macro in the file (used by `from ... import`)
    All,
}

/// Macros defined by one template, keyed by name
#[derive(Debug, Default, Clone)]
pub struct MacroRegistry {
    all: BTreeMap<String, Arc<MacroDefinition>>,
    /// Subset of `all` holding the exported macros
    exported: BTreeMap<String, Arc<MacroDefinition>>,
}

/// Returned when a template defines two macros with the same name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateMacro(pub String);

impl MacroRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a macro definition
    pub fn register(&mut self, definition: Arc<MacroDefinition>) -> Result<(), DuplicateMacro> {
        let name = definition.name().to_string();
        if self.all.contains_key(&name) {
            return Err(DuplicateMacro(name));
        }
        if definition.is_exported() {
            self.exported.insert(name.clone(), Arc::clone(&definition));
        }
        self.all.insert(name, definition);
        Ok(())
    }

    /// The mapping a lookup with `visibility` consults
    pub fn mapping(&self, visibility: MacroVisibility) -> &BTreeMap<String, Arc<MacroDefinition>> {
        match visibility {
            MacroVisibility::Exported => &self.exported,
            MacroVisibility::All => &self.all,
        }
    }

    pub fn get(&self, name: &str, visibility: MacroVisibility) -> Option<&Arc<MacroDefinition>> {
        self.mapping(visibility).get(name)
    }

    /// Macro names in sorted order
    pub fn names(&self, visibility: MacroVisibility) -> impl Iterator<Item = &str> {
        self.mapping(visibility).keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
