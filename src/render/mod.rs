//! Rendering of compiled node trees

mod context;

pub use context::RenderContext;

use thiserror::Error;

use crate::error::Position;
use crate::parser::ast::{Expr, Node, Spanned};
use crate::value::Value;

/// Errors that can occur while rendering a compiled template
#[derive(Debug, Error)]
pub enum RenderError {
    /// Call of a name that is not bound in the render context
    #[error("{position}: '{name}' is not defined")]
    UndefinedCallable { name: String, position: Position },

    /// Call of a bound value that is not callable
    #[error("{position}: '{name}' is a {kind}, not a callable")]
    NotCallable {
        name: String,
        kind: &'static str,
        position: Position,
    },

    /// Macro invoked with more positional arguments than parameters
    #[error("macro '{name}' called with too many arguments ({given} instead of {expected})")]
    TooManyArguments {
        name: String,
        expected: usize,
        given: usize,
    },

    /// Macro calls nested deeper than [`MAX_CALL_DEPTH`]
    #[error("macro '{name}' exceeds the maximum call depth of {depth}")]
    MaxDepthExceeded { name: String, depth: usize },
}

/// Deepest macro call nesting a render may reach
pub const MAX_CALL_DEPTH: usize = 100;

/// Render `nodes` in order, appending to `out`
pub fn render_nodes(nodes: &[Node], ctx: &mut RenderContext, out: &mut String) -> Result<(), RenderError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Print { expr, position } => {
                let value = evaluate(expr, ctx, position)?;
                out.push_str(&value.to_string());
            }
            Node::Directive(directive) => directive.execute(ctx, out)?,
        }
    }
    Ok(())
}

/// Evaluate an expression; `position` locates errors (the enclosing tag)
pub fn evaluate(expr: &Spanned<Expr>, ctx: &RenderContext, position: &Position) -> Result<Value, RenderError> {
    match &expr.node {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, ctx, position))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        // Undefined variables render as nothing
        Expr::Variable(name) => Ok(ctx.get(name).cloned().unwrap_or(Value::None)),
        Expr::Call { name, args } => {
            let callee = ctx.get(&name.node).ok_or_else(|| RenderError::UndefinedCallable {
                name: name.node.clone(),
                position: position.clone(),
            })?;
            let callable = callee
                .as_callable()
                .ok_or_else(|| RenderError::NotCallable {
                    name: name.node.clone(),
                    kind: callee.kind(),
                    position: position.clone(),
                })?
                .clone();
            let values = args
                .iter()
                .map(|arg| evaluate(arg, ctx, position))
                .collect::<Result<Vec<_>, _>>()?;
            callable.call(ctx, &values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Callable;

    fn position() -> Position {
        Position {
            filename: "t.html".to_string(),
            line: 1,
            column: 1,
            span: 0..1,
        }
    }

    fn call(name: &str, args: Vec<Expr>) -> Spanned<Expr> {
        Spanned::new(
            Expr::Call {
                name: Spanned::new(name.to_string(), 0..name.len()),
                args: args.into_iter().map(|a| Spanned::new(a, 0..0)).collect(),
            },
            0..0,
        )
    }

    #[test]
    fn test_render_text_and_print() {
        let mut ctx = RenderContext::new();
        ctx.set_public("name", "world");
        let nodes = vec![
            Node::Text("Hello ".to_string()),
            Node::Print {
                expr: Spanned::new(Expr::Variable("name".to_string()), 0..4),
                position: position(),
            },
            Node::Print {
                expr: Spanned::new(Expr::Variable("missing".to_string()), 0..7),
                position: position(),
            },
        ];
        let mut out = String::new();
        render_nodes(&nodes, &mut ctx, &mut out).expect("Should render");
        assert_eq!(out, "Hello world");
    }

    #[test]
    fn test_call_passes_evaluated_arguments() {
        let mut ctx = RenderContext::new();
        ctx.set_public("who", "you");
        ctx.set_private(
            "greet",
            Value::Callable(Callable::new(|_, args| Ok(Value::from(format!("hi {}", args[0]))))),
        );
        let value = evaluate(
            &call("greet", vec![Expr::Variable("who".to_string())]),
            &ctx,
            &position(),
        )
        .expect("Should evaluate");
        assert_eq!(value, Value::from("hi you"));
    }

    #[test]
    fn test_call_undefined() {
        let ctx = RenderContext::new();
        let err = evaluate(&call("nope", vec![]), &ctx, &position()).unwrap_err();
        assert_eq!(err.to_string(), "t.html:1:1: 'nope' is not defined");
    }

    #[test]
    fn test_call_not_callable() {
        let mut ctx = RenderContext::new();
        ctx.set_public("title", "x");
        let err = evaluate(&call("title", vec![]), &ctx, &position()).unwrap_err();
        assert!(matches!(err, RenderError::NotCallable { kind: "string", .. }));
    }
}
