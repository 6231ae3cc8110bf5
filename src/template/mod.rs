//! Compiled templates and the set that loads, compiles and caches them
//!
//! A [`TemplateSet`] owns filename resolution, a [`TemplateLoader`] and a
//! cache of compiled [`Template`]s keyed by canonical name. Templates import
//! macros from each other through the set:
//!
//! ```text
//! {# forms.html #}
//! {% macro field(name, kind="text") export %}<input name="{{ name }}" type="{{ kind }}">{% endmacro %}
//!
//! {# page.html #}
//! {% import "forms.html" field as input %}
//! {{ input("email") }}
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::directives::{ImportBinding, MacroDefinition};
use crate::parser::ast::Node;
use crate::render::{render_nodes, RenderContext, RenderError};

mod loader;
mod registry;
mod resolver;
mod set;

pub use loader::{FileSystemLoader, LoadError, MemoryLoader, TemplateLoader};
pub use registry::{DuplicateMacro, MacroRegistry, MacroVisibility};
pub use resolver::{normalize, resolve_filename, SourceKind, TemplateIdentity};
pub use set::TemplateSet;

/// A compiled template; immutable and shared between renders
#[derive(Debug)]
pub struct Template {
    identity: TemplateIdentity,
    nodes: Vec<Node>,
    macros: MacroRegistry,
}

impl Template {
    pub(crate) fn new(identity: TemplateIdentity, nodes: Vec<Node>, macros: MacroRegistry) -> Self {
        Self {
            identity,
            nodes,
            macros,
        }
    }

    /// Canonical name (resolved filename, or `<string>`)
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn identity(&self) -> &TemplateIdentity {
        &self.identity
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Macros visible to an importer using `visibility`
    pub fn macros(&self, visibility: MacroVisibility) -> &BTreeMap<String, Arc<MacroDefinition>> {
        self.macros.mapping(visibility)
    }

    pub fn macro_registry(&self) -> &MacroRegistry {
        &self.macros
    }

    /// Import directives at the top level of this template, in source order
    pub fn imports(&self) -> impl Iterator<Item = &ImportBinding> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Directive(directive) => directive.as_any().downcast_ref::<ImportBinding>(),
            _ => None,
        })
    }

    /// Render into a string using (and updating) `ctx`
    pub fn render(&self, ctx: &mut RenderContext) -> Result<String, RenderError> {
        let mut out = String::new();
        render_nodes(&self.nodes, ctx, &mut out)?;
        Ok(out)
    }
}
