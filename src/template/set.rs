//! Template set: resolution, loading, compilation and caching

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::SetConfig;
use crate::error::{CompileError, RegistryError};
use crate::parser::directive::{DirectiveParser, DirectiveRegistry};
use crate::parser::document::DocumentParser;
use crate::parser::source::SourceFile;
use crate::render::RenderContext;

use super::loader::{FileSystemLoader, LoadError, TemplateLoader};
use super::resolver::{resolve_filename, TemplateIdentity};
use super::Template;

/// Owns everything templates need to find and compile each other
#[derive(Debug)]
pub struct TemplateSet {
    config: SetConfig,
    loader: Box<dyn TemplateLoader>,
    directives: DirectiveRegistry,
    /// Compiled templates by canonical name. Never locked across a compile.
    cache: RwLock<HashMap<String, Arc<Template>>>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::new(SetConfig::default())
    }
}

impl TemplateSet {
    /// Create a set that reads templates from disk
    pub fn new(config: SetConfig) -> Self {
        Self::with_loader(config, FileSystemLoader)
    }

    /// Create a set with a custom loader
    pub fn with_loader(config: SetConfig, loader: impl TemplateLoader + 'static) -> Self {
        Self {
            config,
            loader: Box::new(loader),
            directives: DirectiveRegistry::with_builtins(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SetConfig {
        &self.config
    }

    pub fn directives(&self) -> &DirectiveRegistry {
        &self.directives
    }

    /// Add a directive to the set's parser table
    pub fn register_directive(&mut self, name: &str, parser: DirectiveParser) -> Result<(), RegistryError> {
        self.directives.register(name, parser)
    }

    /// Replace the parser of an existing directive
    pub fn replace_directive(&mut self, name: &str, parser: DirectiveParser) -> Result<(), RegistryError> {
        self.directives.replace(name, parser)
    }

    /// Resolve `path` as written in `requesting` (or at top level) to a canonical name
    pub fn resolve_filename(&self, requesting: Option<&TemplateIdentity>, path: &str) -> String {
        resolve_filename(&self.config.base_dir, requesting, path)
    }

    /// Load, compile and cache a template by path
    pub fn from_file(&self, path: &str) -> Result<Arc<Template>, CompileError> {
        let name = self.resolve_filename(None, path);
        self.load_resolved(&name, &[])
    }

    /// Compile a template from a string; the result is not cached.
    ///
    /// Imports inside it resolve against the configured base directory.
    pub fn from_string(&self, source: &str) -> Result<Arc<Template>, CompileError> {
        let identity = TemplateIdentity::inline();
        let template = self.compile(identity, source, &[])?;
        Ok(Arc::new(template))
    }

    /// Load a template by path and render it with `ctx`
    pub fn render(&self, path: &str, ctx: &mut RenderContext) -> Result<String, crate::Error> {
        let template = self.from_file(path)?;
        Ok(template.render(ctx)?)
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.read().contains_key(name)
    }

    /// Drop all compiled templates
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    /// Load a template whose name is already resolved.
    ///
    /// `chain` lists the files whose compilation is in progress; finding
    /// `name` in it means the imports form a cycle.
    pub(crate) fn load_resolved(&self, name: &str, chain: &[String]) -> Result<Arc<Template>, CompileError> {
        if self.config.cache {
            if let Some(template) = self.cache.read().get(name) {
                debug!(template = name, "template cache hit");
                return Ok(Arc::clone(template));
            }
        }

        if chain.iter().any(|entry| entry == name) {
            let mut cycle = chain.to_vec();
            cycle.push(name.to_string());
            return Err(CompileError::load(LoadError::Circular {
                chain: cycle.join(" -> "),
            }));
        }

        let source = self.loader.load(name).map_err(CompileError::load)?;
        debug!(template = name, bytes = source.len(), "compiling template");

        let mut chain = chain.to_vec();
        chain.push(name.to_string());
        let template = Arc::new(self.compile(TemplateIdentity::file(name), &source, &chain)?);

        if !self.config.cache {
            return Ok(template);
        }
        let mut cache = self.cache.write();
        let cached = cache.entry(name.to_string()).or_insert(template);
        Ok(Arc::clone(cached))
    }

    fn compile(&self, identity: TemplateIdentity, source: &str, chain: &[String]) -> Result<Template, CompileError> {
        let file = SourceFile::new(identity.name.clone(), source);
        let mut parser = DocumentParser::new(self, &identity, &file, chain)?;
        let nodes = parser.parse()?;
        let macros = parser.into_macros();
        Ok(Template::new(identity, nodes, macros))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{MacroVisibility, MemoryLoader};

    fn set(loader: MemoryLoader) -> TemplateSet {
        TemplateSet::with_loader(SetConfig::default(), loader)
    }

    #[test]
    fn test_from_file_caches_by_canonical_name() {
        let set = set(MemoryLoader::new().with("a.html", "hello"));
        let first = set.from_file("a.html").expect("Should load");
        let second = set.from_file("./a.html").expect("Should load");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(set.is_cached("a.html"));

        set.clear_cache();
        assert!(!set.is_cached("a.html"));
    }

    #[test]
    fn test_cache_disabled_recompiles() {
        let set = TemplateSet::with_loader(
            SetConfig::default().with_cache(false),
            MemoryLoader::new().with("a.html", "hello"),
        );
        let first = set.from_file("a.html").expect("Should load");
        let second = set.from_file("a.html").expect("Should load");
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!set.is_cached("a.html"));
    }

    #[test]
    fn test_missing_template() {
        let set = set(MemoryLoader::new());
        let err = set.from_file("nope.html").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Load {
                source: LoadError::NotFound { .. },
                position: None
            }
        ));
    }

    #[test]
    fn test_circular_import_detected() {
        let set = set(
            MemoryLoader::new()
                .with("a.html", r#"{% import "b.html" x %}"#)
                .with("b.html", r#"{% macro x() export %}{% endmacro %}{% import "a.html" y %}"#),
        );
        let err = set.from_file("a.html").unwrap_err();
        match err {
            CompileError::Load {
                source: LoadError::Circular { chain },
                position,
            } => {
                assert_eq!(chain, "a.html -> b.html -> a.html");
                assert_eq!(position.map(|p| p.filename), Some("b.html".to_string()));
            }
            other => panic!("Expected circular import error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_string_collects_macros() {
        let set = set(MemoryLoader::new());
        let template = set
            .from_string("{% macro a() export %}A{% endmacro %}{% macro b() %}B{% endmacro %}")
            .expect("Should compile");
        assert_eq!(template.name(), "<string>");
        assert_eq!(template.macros(MacroVisibility::All).len(), 2);
        assert_eq!(template.macros(MacroVisibility::Exported).len(), 1);
    }

    #[test]
    fn test_render_by_path() {
        let set = set(MemoryLoader::new().with("hi.html", "Hi {{ who }}!"));
        let mut ctx = RenderContext::new();
        ctx.set_public("who", "there");
        assert_eq!(set.render("hi.html", &mut ctx).expect("Should render"), "Hi there!");
    }
}
