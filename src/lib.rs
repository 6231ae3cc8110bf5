//! Stencil - text templates with macros shared across files
//!
//! Templates declare macros with `{% macro %}` and pull macros out of other
//! templates with `{% import %}` or `{% from ... import %}`. A
//! [`TemplateSet`] loads, compiles and caches the files involved.
//!
//! # Example
//!
//! ```rust
//! use stencil::{MemoryLoader, RenderContext, SetConfig, TemplateSet};
//!
//! let loader = MemoryLoader::new()
//!     .with("forms.html", r#"{% macro field(name) export %}<input name="{{ name }}">{% endmacro %}"#)
//!     .with("page.html", r#"{% import "forms.html" field as input %}{{ input("email") }}"#);
//! let set = TemplateSet::with_loader(SetConfig::default(), loader);
//!
//! let out = set.render("page.html", &mut RenderContext::new()).unwrap();
//! assert_eq!(out, r#"<input name="email">"#);
//! ```

pub mod config;
pub mod directives;
pub mod error;
pub mod parser;
pub mod render;
pub mod template;
pub mod value;

pub use config::{ConfigError, SetConfig};
pub use directives::{ImportBinding, MacroDefinition};
pub use error::{CompileError, Position, RegistryError};
pub use render::{RenderContext, RenderError};
pub use template::{
    FileSystemLoader, LoadError, MacroVisibility, MemoryLoader, Template, TemplateLoader,
    TemplateSet,
};
pub use value::{Callable, Value};

use thiserror::Error;

/// Errors from compiling or rendering a template
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Compile and render a standalone template with no variables
///
/// Imports resolve relative to the current directory.
///
/// # Example
///
/// ```rust
/// let out = stencil::render_str(r#"{% macro hi(who) %}Hi {{ who }}{% endmacro %}{{ hi("all") }}"#).unwrap();
/// assert_eq!(out, "Hi all");
/// ```
pub fn render_str(source: &str) -> Result<String, Error> {
    let set = TemplateSet::default();
    let template = set.from_string(source)?;
    Ok(template.render(&mut RenderContext::new())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain_text() {
        assert_eq!(render_str("hello").unwrap(), "hello");
    }

    #[test]
    fn test_render_str_compile_error() {
        let err = render_str("{% bogus %}").unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::Syntax { .. })));
        assert_eq!(
            err.to_string(),
            "<string>:1:4: directive 'bogus' not found (or beginning tag not provided)"
        );
    }

    #[test]
    fn test_render_str_render_error() {
        let err = render_str("{{ nope() }}").unwrap_err();
        assert!(matches!(err, Error::Render(RenderError::UndefinedCallable { .. })));
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(render_str("a{# note #}b").unwrap(), "ab");
    }
}
