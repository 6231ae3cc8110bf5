//! Node tree types for compiled templates

use std::fmt;

use crate::error::Position;
use crate::parser::directive::DirectiveNode;
use crate::value::Value;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// One element of a compiled template body
#[derive(Debug)]
pub enum Node {
    /// Literal text copied to the output unchanged
    Text(String),
    /// Print tag: `{{ expr }}`
    Print {
        expr: Spanned<Expr>,
        position: Position,
    },
    /// Directive tag: `{% name args %}`, produced by a registered directive parser
    Directive(Box<dyn DirectiveNode>),
}

/// Expression inside a print tag or a macro parameter default
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String, number, boolean or `none`
    Literal(Value),
    /// List literal: `[a, "b", 3]`
    List(Vec<Spanned<Expr>>),
    /// Variable lookup, private namespace first
    Variable(String),
    /// Call of a callable value: `name(arg, ...)`
    Call {
        name: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::String(s)) => write!(f, "{:?}", s),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item.node)?;
                }
                f.write_str("]")
            }
            Expr::Variable(name) => f.write_str(name),
            Expr::Call { name, args } => {
                write!(f, "{}(", name.node)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg.node)?;
                }
                f.write_str(")")
            }
        }
    }
}
