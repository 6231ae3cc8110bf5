//! Template parser: lexing, tag splitting, expressions and directive dispatch

pub mod arguments;
pub mod ast;
pub mod directive;
pub mod document;
pub mod expression;
pub mod lexer;
pub mod source;

pub use arguments::ArgumentCursor;
pub use ast::{Expr, Node, Span, Spanned};
pub use directive::{DirectiveNode, DirectiveParser, DirectiveRegistry};
pub use document::DocumentParser;
pub use lexer::{Token, TokenKind};
pub use source::SourceFile;
