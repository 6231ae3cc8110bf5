//! Lexer for directive arguments and print expressions using logos

use std::fmt;

use logos::Logos;

use crate::parser::ast::{Span, Spanned};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Keywords (must win over identifiers of the same length)
    #[token("as", keyword)]
    #[token("export", keyword)]
    #[token("true", keyword)]
    #[token("false", keyword)]
    #[token("none", keyword)]
    #[token("and", keyword)]
    #[token("or", keyword)]
    #[token("not", keyword)]
    #[token("in", keyword)]
    Keyword(String),

    // Delimiters and operators
    #[token(",", symbol)]
    #[token("(", symbol)]
    #[token(")", symbol)]
    #[token("[", symbol)]
    #[token("]", symbol)]
    #[token("=", symbol)]
    #[token(".", symbol)]
    #[token("|", symbol)]
    #[token(":", symbol)]
    Symbol(String),

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, unescape)]
    String(String),

    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

/// Token categories the argument cursor matches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    String,
    Ident,
    Keyword,
    Number,
    Symbol,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::String => "string",
            TokenKind::Ident => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::Number => "number",
            TokenKind::Symbol => "symbol",
        };
        f.write_str(name)
    }
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Keyword(_) => TokenKind::Keyword,
            Token::Symbol(_) => TokenKind::Symbol,
            Token::Ident(_) => TokenKind::Ident,
            Token::String(_) => TokenKind::String,
            Token::Number(_) => TokenKind::Number,
        }
    }

    /// The textual value of the token; `None` for numbers
    pub fn literal(&self) -> Option<&str> {
        match self {
            Token::Keyword(s) | Token::Symbol(s) | Token::Ident(s) | Token::String(s) => {
                Some(s.as_str())
            }
            Token::Number(_) => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(s) => write!(f, "keyword '{}'", s),
            Token::Symbol(s) => write!(f, "'{}'", s),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::String(s) => write!(f, "string \"{}\"", s),
            Token::Number(n) => write!(f, "number {}", n),
        }
    }
}

fn keyword(lex: &mut logos::Lexer<Token>) -> String {
    lex.slice().to_string()
}

fn symbol(lex: &mut logos::Lexer<Token>) -> String {
    lex.slice().to_string()
}

fn unescape(lex: &mut logos::Lexer<Token>) -> String {
    let raw = lex.slice();
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Lex a tag body into spanned tokens.
///
/// `offset` is the byte position of `input` inside the template source, so
/// the returned spans point into the whole file. On an unrecognized character
/// the span of the offending input is returned as the error.
pub fn lex(input: &str, offset: usize) -> Result<Vec<Spanned<Token>>, Span> {
    let mut tokens = Vec::new();
    for (tok, span) in Token::lexer(input).spanned() {
        let span = span.start + offset..span.end + offset;
        match tok {
            Ok(tok) => tokens.push(Spanned::new(tok, span)),
            Err(()) => return Err(span),
        }
    }
    Ok(tokens)
}
