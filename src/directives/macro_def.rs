//! `macro` directive: named, parameterized template fragments

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use crate::error::{CompileError, Position};
use crate::parser::arguments::ArgumentCursor;
use crate::parser::ast::Node;
use crate::parser::directive::DirectiveNode;
use crate::parser::document::DocumentParser;
use crate::parser::expression::{parse_macro_signature, MacroParam};
use crate::render::{evaluate, render_nodes, RenderContext, RenderError, MAX_CALL_DEPTH};
use crate::value::{Callable, Value};

/// A macro as declared by `{% macro name(params) [export] %}...{% endmacro %}`
#[derive(Debug)]
pub struct MacroDefinition {
    name: String,
    params: Vec<MacroParam>,
    body: Vec<Node>,
    exported: bool,
    position: Position,
}

impl MacroDefinition {
    pub fn new(
        name: impl Into<String>,
        params: Vec<MacroParam>,
        body: Vec<Node>,
        exported: bool,
        position: Position,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            body,
            exported,
            position,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }

    /// Where the macro is declared
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.node.as_str())
    }

    /// Render the macro body with `args` bound to its parameters.
    ///
    /// Arguments are positional. Missing ones take their default, evaluated
    /// in the macro scope, or `none`. The body sees a child of `ctx`.
    pub fn call(&self, ctx: &RenderContext, args: &[Value]) -> Result<Value, RenderError> {
        if ctx.depth() >= MAX_CALL_DEPTH {
            return Err(RenderError::MaxDepthExceeded {
                name: self.name.clone(),
                depth: MAX_CALL_DEPTH,
            });
        }
        if args.len() > self.params.len() {
            return Err(RenderError::TooManyArguments {
                name: self.name.clone(),
                expected: self.params.len(),
                given: args.len(),
            });
        }

        let mut scope = ctx.child();
        for (index, param) in self.params.iter().enumerate() {
            let value = match (args.get(index), &param.default) {
                (Some(value), _) => value.clone(),
                (None, Some(default)) => evaluate(default, &scope, &self.position)?,
                (None, None) => Value::None,
            };
            scope.set_private(param.name.node.clone(), value);
        }

        let mut out = String::new();
        render_nodes(&self.body, &mut scope, &mut out)?;
        Ok(Value::String(out))
    }

    /// A callable that forwards to [`call`](Self::call) with the caller's context.
    ///
    /// Each callable owns its own handle on the definition.
    pub fn callable(self: &Arc<Self>) -> Callable {
        let definition = Arc::clone(self);
        Callable::new(move |ctx, args| definition.call(ctx, args))
    }
}

/// Node left in the tree where a macro is declared
#[derive(Debug)]
pub struct MacroNode {
    definition: Arc<MacroDefinition>,
}

impl MacroNode {
    pub fn definition(&self) -> &Arc<MacroDefinition> {
        &self.definition
    }
}

impl DirectiveNode for MacroNode {
    /// Makes the macro callable from the rest of its own template
    fn execute(&self, ctx: &mut RenderContext, _out: &mut String) -> Result<(), RenderError> {
        trace!(name = self.definition.name(), "installing local macro");
        ctx.set_private(
            self.definition.name().to_string(),
            Value::Callable(self.definition.callable()),
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn parse_macro(
    doc: &mut DocumentParser<'_>,
    start: &Position,
    args: &mut ArgumentCursor<'_>,
) -> Result<Box<dyn DirectiveNode>, CompileError> {
    if args.remaining() == 0 {
        return Err(args.error("macro directive needs a name and a parameter list", None));
    }
    let signature = parse_macro_signature(args.source(), args.take_rest(), args.end_span())?;

    let mut seen = HashSet::new();
    for param in &signature.params {
        if !seen.insert(param.name.node.as_str()) {
            return Err(CompileError::syntax(
                format!(
                    "duplicate parameter '{}' in macro '{}'",
                    param.name.node, signature.name.node
                ),
                doc.position(param.name.span.clone()),
            ));
        }
    }

    let (body, end_name, end_args) = doc.wrap_until(&["endmacro"], start)?;
    if let Some(extra) = end_args.peek() {
        return Err(end_args.error(format!("'{}' takes no arguments", end_name), Some(extra)));
    }

    let definition = Arc::new(MacroDefinition::new(
        signature.name.node.clone(),
        signature.params,
        body,
        signature.exported,
        doc.position(signature.name.span.clone()),
    ));
    doc.register_macro(Arc::clone(&definition), signature.name.span)?;

    Ok(Box::new(MacroNode { definition }))
}
