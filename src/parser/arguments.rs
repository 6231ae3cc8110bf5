//! Cursor over the tokens of a single directive's arguments

use crate::error::{CompileError, Position};
use crate::parser::ast::{Span, Spanned};
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::source::SourceFile;

/// Token cursor handed to directive parsers.
///
/// All `match_*` methods consume the current token only when it matches and
/// leave the cursor untouched otherwise.
#[derive(Debug)]
pub struct ArgumentCursor<'a> {
    source: &'a SourceFile,
    tokens: Vec<Spanned<Token>>,
    index: usize,
    /// Zero-width span just before the tag's closing delimiter
    end: Span,
}

impl<'a> ArgumentCursor<'a> {
    pub fn new(source: &'a SourceFile, tokens: Vec<Spanned<Token>>, end: Span) -> Self {
        Self {
            source,
            tokens,
            index: 0,
            end,
        }
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.index
    }

    pub fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.index)
    }

    /// Consume the current token unconditionally
    pub fn advance(&mut self) -> Option<Spanned<Token>> {
        let tok = self.tokens.get(self.index).cloned()?;
        self.index += 1;
        Some(tok)
    }

    /// Consume the current token if it has the given kind
    pub fn match_kind(&mut self, kind: TokenKind) -> Option<Spanned<Token>> {
        self.match_if(|tok| tok.kind() == kind)
    }

    /// Consume the current token if it has the given kind and literal value
    pub fn match_value(&mut self, kind: TokenKind, value: &str) -> Option<Spanned<Token>> {
        self.match_if(|tok| tok.kind() == kind && tok.literal() == Some(value))
    }

    /// Consume the current token if it has the given kind and any of the values
    pub fn match_one(&mut self, kind: TokenKind, values: &[&str]) -> Option<Spanned<Token>> {
        self.match_if(|tok| {
            tok.kind() == kind && tok.literal().is_some_and(|lit| values.contains(&lit))
        })
    }

    fn match_if(&mut self, pred: impl FnOnce(&Token) -> bool) -> Option<Spanned<Token>> {
        match self.tokens.get(self.index) {
            Some(tok) if pred(&tok.node) => self.advance(),
            _ => None,
        }
    }

    /// Hand the unconsumed tokens to another parser
    pub fn take_rest(&mut self) -> Vec<Spanned<Token>> {
        let rest = self.tokens[self.index..].to_vec();
        self.index = self.tokens.len();
        rest
    }

    pub fn end_span(&self) -> Span {
        self.end.clone()
    }

    pub fn source(&self) -> &'a SourceFile {
        self.source
    }

    pub fn position(&self, span: Span) -> Position {
        self.source.position(span)
    }

    /// Position used for errors that are not tied to a specific token: the
    /// current token, else the last one, else the end of the tag
    pub fn current_position(&self) -> Position {
        let span = self
            .tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .map(|tok| tok.span.clone())
            .unwrap_or_else(|| self.end.clone());
        self.source.position(span)
    }

    /// Build a syntax error at `token`, or at [`current_position`](Self::current_position)
    pub fn error(&self, message: impl Into<String>, token: Option<&Spanned<Token>>) -> CompileError {
        let position = match token {
            Some(tok) => self.source.position(tok.span.clone()),
            None => self.current_position(),
        };
        CompileError::syntax(message, position)
    }
}
