//! `import` and `from` directives: use macros defined in another template
//!
//! ```text
//! {% import "forms.html" field, button as submit %}
//! {% from "forms.html" import helper as h with context %}
//! ```
//!
//! `import` only sees macros declared with `export`; `from` sees every macro
//! of the target file. Both produce an [`ImportBinding`].

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{CompileError, Position};
use crate::parser::arguments::ArgumentCursor;
use crate::parser::directive::DirectiveNode;
use crate::parser::document::DocumentParser;
use crate::parser::lexer::TokenKind;
use crate::render::{RenderContext, RenderError};
use crate::template::MacroVisibility;
use crate::value::Value;

use super::macro_def::MacroDefinition;

/// Which directive syntax is being parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Import,
    From,
}

impl Form {
    fn visibility(self) -> MacroVisibility {
        match self {
            Form::Import => MacroVisibility::Exported,
            Form::From => MacroVisibility::All,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Form::Import => "Import",
            Form::From => "From",
        }
    }
}

/// Macros of another template, bound to local names.
///
/// Built once while the importing document is parsed. Every execution
/// installs fresh callables into the render context it is given.
#[derive(Debug)]
pub struct ImportBinding {
    position: Position,
    source_filename: String,
    bindings: BTreeMap<String, Arc<MacroDefinition>>,
}

impl ImportBinding {
    /// Location of the directive in the importing template
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Canonical name of the template the macros come from
    pub fn source_filename(&self) -> &str {
        &self.source_filename
    }

    /// Local name to definition, sorted by local name
    pub fn bindings(&self) -> &BTreeMap<String, Arc<MacroDefinition>> {
        &self.bindings
    }

    /// Publish every binding as a callable in `ctx`'s private namespace
    pub fn install(&self, ctx: &mut RenderContext) {
        for (local, definition) in &self.bindings {
            trace!(
                local = local.as_str(),
                source = self.source_filename.as_str(),
                "installing imported macro"
            );
            ctx.set_private(local.clone(), Value::Callable(definition.callable()));
        }
    }
}

impl DirectiveNode for ImportBinding {
    fn execute(&self, ctx: &mut RenderContext, _out: &mut String) -> Result<(), RenderError> {
        self.install(ctx);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `{% import "file" name [as alias], ... %}`
pub(crate) fn parse_import(
    doc: &mut DocumentParser<'_>,
    start: &Position,
    args: &mut ArgumentCursor<'_>,
) -> Result<Box<dyn DirectiveNode>, CompileError> {
    Ok(Box::new(parse_binding(doc, start, args, Form::Import)?))
}

/// `{% from "file" import name [as alias] [with context], ... %}`
pub(crate) fn parse_from(
    doc: &mut DocumentParser<'_>,
    start: &Position,
    args: &mut ArgumentCursor<'_>,
) -> Result<Box<dyn DirectiveNode>, CompileError> {
    Ok(Box::new(parse_binding(doc, start, args, Form::From)?))
}

fn parse_binding(
    doc: &mut DocumentParser<'_>,
    start: &Position,
    args: &mut ArgumentCursor<'_>,
    form: Form,
) -> Result<ImportBinding, CompileError> {
    let Some(file_token) = args.match_kind(TokenKind::String) else {
        return Err(args.error(
            format!("{}-directive needs a filename as string", form.label()),
            None,
        ));
    };
    let path = file_token.node.literal().unwrap_or_default();
    let source_filename = doc.resolve_filename(path);

    if args.remaining() == 0 {
        return Err(CompileError::EmptyImport {
            position: Some(args.current_position()),
        });
    }

    let template = doc
        .load_template(&source_filename)
        .map_err(|err| err.with_position_if_missing(start))?;

    if form == Form::From {
        match args.match_value(TokenKind::Ident, "import") {
            Some(_) => {}
            None => {
                let message = match args.peek().and_then(|tok| tok.node.literal()) {
                    Some(found) => format!(
                        "expected 'import' keyword after macro file, found '{}'",
                        found
                    ),
                    None => "expected 'import' keyword after macro file".to_string(),
                };
                return Err(args.error(message, None));
            }
        }
        if args.remaining() == 0 {
            return Err(CompileError::EmptyImport {
                position: Some(args.current_position()),
            });
        }
    }

    let macros = template.macros(form.visibility());
    let mut bindings = BTreeMap::new();

    while args.remaining() > 0 {
        let Some(name_token) = args.match_kind(TokenKind::Ident) else {
            return Err(args.error("expected macro name (identifier)", None));
        };
        let name = name_token.node.literal().unwrap_or_default().to_string();

        let local = if args.match_value(TokenKind::Keyword, "as").is_some() {
            match args.match_kind(TokenKind::Ident) {
                Some(alias) => alias.node.literal().unwrap_or_default().to_string(),
                None => return Err(args.error("expected macro alias name (identifier)", None)),
            }
        } else {
            name.clone()
        };

        let Some(definition) = macros.get(&name) else {
            return Err(CompileError::UnresolvedMacro {
                name,
                filename: source_filename,
                position: args.position(name_token.span),
            });
        };
        bindings.insert(local, Arc::clone(definition));

        if args.remaining() == 0 {
            break;
        }

        if form == Form::From && args.match_one(TokenKind::Ident, &["with", "context"]).is_some() {
            if args.match_value(TokenKind::Ident, "context").is_none() {
                return Err(args.error("expected with 'context'", None));
            }
            if args.remaining() == 0 {
                break;
            }
        }

        if args.match_value(TokenKind::Symbol, ",").is_none() {
            return Err(args.error("expected ','", None));
        }
    }

    debug!(
        template = doc.identity().name.as_str(),
        source = source_filename.as_str(),
        macros = ?bindings.keys().collect::<Vec<_>>(),
        "resolved {} directive",
        form.label().to_lowercase()
    );

    Ok(ImportBinding {
        position: start.clone(),
        source_filename,
        bindings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SetConfig;
    use crate::template::{LoadError, MemoryLoader, Template, TemplateSet};
    use pretty_assertions::assert_eq;

    const FORMS: &str = concat!(
        r#"{% macro field(name, kind="text") export %}<input name="{{ name }}" type="{{ kind }}">{% endmacro %}"#,
        r#"{% macro button(label) export %}<button>{{ label }}</button>{% endmacro %}"#,
        r#"{% macro helper(x) %}[{{ x }}]{% endmacro %}"#,
    );

    fn set() -> TemplateSet {
        TemplateSet::with_loader(
            SetConfig::default(),
            MemoryLoader::new().with("forms.html", FORMS),
        )
    }

    fn compile(source: &str) -> Result<Arc<Template>, CompileError> {
        set().from_string(source)
    }

    fn binding(template: &Template) -> &ImportBinding {
        template.imports().next().expect("Should contain an import")
    }

    fn local_names(template: &Template) -> Vec<String> {
        binding(template).bindings().keys().cloned().collect()
    }

    #[test]
    fn test_import_exported_macros() {
        let template = compile(r#"{% import "forms.html" field, button %}"#).expect("Should compile");
        let import = binding(&template);
        assert_eq!(import.source_filename(), "forms.html");
        assert_eq!(local_names(&template), vec!["button", "field"]);
        assert_eq!(import.position().column, 4);
    }

    #[test]
    fn test_import_rejects_unexported_macro() {
        let err = compile(r#"{% import "forms.html" helper %}"#).unwrap_err();
        match err {
            CompileError::UnresolvedMacro {
                name,
                filename,
                position,
            } => {
                assert_eq!(name, "helper");
                assert_eq!(filename, "forms.html");
                assert_eq!(position.span, 23..29);
            }
            other => panic!("Expected unresolved macro, got {:?}", other),
        }
    }

    #[test]
    fn test_from_resolves_unexported_macro() {
        let template = compile(r#"{% from "forms.html" import helper %}"#).expect("Should compile");
        assert_eq!(local_names(&template), vec!["helper"]);
    }

    #[test]
    fn test_alias_binds_local_name_only() {
        let template = compile(r#"{% import "forms.html" field as input %}"#).expect("Should compile");
        assert_eq!(local_names(&template), vec!["input"]);
        assert_eq!(binding(&template).bindings()["input"].name(), "field");
    }

    #[test]
    fn test_duplicate_local_name_last_wins() {
        let template = compile(r#"{% import "forms.html" field as x, button as x %}"#)
            .expect("Should compile");
        let bindings = binding(&template).bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings["x"].name(), "button");
    }

    #[test]
    fn test_filename_only_is_empty_import() {
        let err = compile(r#"{% import "forms.html" %}"#).unwrap_err();
        assert!(matches!(err, CompileError::EmptyImport { position: Some(_) }));

        let err = compile(r#"{% from "forms.html" import %}"#).unwrap_err();
        assert!(matches!(err, CompileError::EmptyImport { position: Some(_) }));
    }

    #[test]
    fn test_missing_filename() {
        let err = compile("{% import field %}").unwrap_err();
        assert_eq!(err.message(), "Import-directive needs a filename as string");
        let err = compile("{% from field import x %}").unwrap_err();
        assert_eq!(err.message(), "From-directive needs a filename as string");
    }

    #[test]
    fn test_missing_separator_points_at_next_name() {
        let source = r#"{% import "forms.html" field button %}"#;
        let err = compile(source).unwrap_err();
        assert_eq!(err.message(), "expected ','");
        let span = err.position().expect("Should have a position").span.clone();
        assert_eq!(&source[span], "button");
    }

    #[test]
    fn test_trailing_comma_accepted() {
        let template = compile(r#"{% import "forms.html" field, %}"#).expect("Should compile");
        assert_eq!(local_names(&template), vec!["field"]);
    }

    #[test]
    fn test_missing_name_and_alias() {
        let err = compile(r#"{% import "forms.html" , field %}"#).unwrap_err();
        assert_eq!(err.message(), "expected macro name (identifier)");

        let err = compile(r#"{% import "forms.html" field as %}"#).unwrap_err();
        assert_eq!(err.message(), "expected macro alias name (identifier)");

        let err = compile(r#"{% import "forms.html" field as "x" %}"#).unwrap_err();
        assert_eq!(err.message(), "expected macro alias name (identifier)");
    }

    #[test]
    fn test_from_requires_import_keyword() {
        let err = compile(r#"{% from "forms.html" helper %}"#).unwrap_err();
        assert_eq!(
            err.message(),
            "expected 'import' keyword after macro file, found 'helper'"
        );
    }

    #[test]
    fn test_from_with_context() {
        let template = compile(r#"{% from "forms.html" import helper with context %}"#)
            .expect("Should compile");
        assert_eq!(local_names(&template), vec!["helper"]);

        let template = compile(
            r#"{% from "forms.html" import helper as h with context, field %}"#,
        )
        .expect("Should compile");
        assert_eq!(local_names(&template), vec!["field", "h"]);

        let err = compile(r#"{% from "forms.html" import helper with banana %}"#).unwrap_err();
        assert_eq!(err.message(), "expected with 'context'");
    }

    #[test]
    fn test_with_context_not_allowed_in_import_form() {
        let err = compile(r#"{% import "forms.html" field with context %}"#).unwrap_err();
        assert_eq!(err.message(), "expected ','");
    }

    #[test]
    fn test_missing_file_reported_at_directive() {
        let source = r#"{% import "nope.html" x %}"#;
        let err = compile(source).unwrap_err();
        match &err {
            CompileError::Load {
                source: LoadError::NotFound { name },
                position: Some(position),
            } => {
                assert_eq!(name, "nope.html");
                assert_eq!(&source[position.span.clone()], "import");
            }
            other => panic!("Expected load error, got {:?}", other),
        }
    }

    #[test]
    fn test_errors_in_imported_file_keep_their_location() {
        let set = TemplateSet::with_loader(
            SetConfig::default(),
            MemoryLoader::new().with("broken.html", "{% macro x( %}"),
        );
        let err = set.from_string(r#"{% import "broken.html" x %}"#).unwrap_err();
        assert_eq!(err.position().map(|p| p.filename.as_str()), Some("broken.html"));
    }

    #[test]
    fn test_installed_callable_matches_definition() {
        let template = compile(r#"{% import "forms.html" field as input %}"#).expect("Should compile");
        let import = binding(&template);

        let mut ctx = RenderContext::new();
        import.install(&mut ctx);
        let installed = ctx
            .get("input")
            .and_then(Value::as_callable)
            .expect("Should install a callable")
            .clone();

        let args = [Value::from("email"), Value::from("email")];
        let direct = import.bindings()["input"].call(&ctx, &args).expect("Should call");
        assert_eq!(installed.call(&ctx, &args).expect("Should call"), direct);
        assert_eq!(direct, Value::from(r#"<input name="email" type="email">"#));
    }

    #[test]
    fn test_each_render_gets_its_own_callables() {
        let template = compile(r#"{% import "forms.html" button %}"#).expect("Should compile");
        let import = binding(&template);

        let callables: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(|| {
                        let mut ctx = RenderContext::new();
                        import.install(&mut ctx);
                        assert!(ctx.get("field").is_none());
                        ctx.get("button")
                            .and_then(Value::as_callable)
                            .cloned()
                            .expect("Should install a callable")
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("Thread should not panic"))
                .collect()
        });

        assert!(!callables[0].ptr_eq(&callables[1]));
    }

    #[test]
    fn test_render_imported_macros() {
        let template = compile(concat!(
            r#"{% import "forms.html" field as input %}"#,
            r#"{% from "forms.html" import helper %}"#,
            r#"{{ input("q") }}{{ helper(1) }}"#,
        ))
        .expect("Should compile");
        let out = template.render(&mut RenderContext::new()).expect("Should render");
        assert_eq!(out, r#"<input name="q" type="text">[1]"#);
    }
}
