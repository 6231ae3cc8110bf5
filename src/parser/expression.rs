//! Expression and macro signature grammar using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::CompileError;
use crate::parser::ast::{Expr, Span, Spanned};
use crate::parser::lexer::Token;
use crate::parser::source::SourceFile;
use crate::value::Value;

/// A macro parameter with its optional default expression
#[derive(Debug, Clone, PartialEq)]
pub struct MacroParam {
    pub name: Spanned<String>,
    pub default: Option<Spanned<Expr>>,
}

/// Parsed head of a `macro` directive: `name(p1, p2="x") export`
#[derive(Debug, Clone, PartialEq)]
pub struct MacroSignature {
    pub name: Spanned<String>,
    pub params: Vec<MacroParam>,
    pub exported: bool,
}

/// Parse the tokens of a print tag into an expression
pub fn parse_expression(
    source: &SourceFile,
    tokens: Vec<Spanned<Token>>,
    eoi: Span,
) -> Result<Spanned<Expr>, CompileError> {
    let token_iter = tokens
        .into_iter()
        .map(|tok| (tok.node, SimpleSpan::from(tok.span)));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter).map(eoi.clone().into(), |(t, s): (_, _)| (t, s));

    expression_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| first_error(source, errs, eoi))
}

/// Parse the arguments of a `macro` directive
pub fn parse_macro_signature(
    source: &SourceFile,
    tokens: Vec<Spanned<Token>>,
    eoi: Span,
) -> Result<MacroSignature, CompileError> {
    let token_iter = tokens
        .into_iter()
        .map(|tok| (tok.node, SimpleSpan::from(tok.span)));

    let token_stream = Stream::from_iter(token_iter).map(eoi.clone().into(), |(t, s): (_, _)| (t, s));

    signature_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| first_error(source, errs, eoi))
}

fn first_error(source: &SourceFile, errs: Vec<Rich<'_, Token>>, eoi: Span) -> CompileError {
    match errs.into_iter().next() {
        Some(err) => rich_to_compile_error(source, err),
        None => CompileError::syntax("invalid expression", source.position(eoi)),
    }
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn symbol<'a, I>(s: &str) -> impl Parser<'a, I, Token, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    just(Token::Symbol(s.to_string()))
}

fn identifier<'a, I>() -> impl Parser<'a, I, Spanned<String>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    select! {
        Token::Ident(s) => s,
    }
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())))
}

fn expression_parser<'a, I>() -> impl Parser<'a, I, Spanned<Expr>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let literal = select! {
            Token::String(s) => Value::String(s),
            Token::Number(n) => Value::Number(n),
            Token::Keyword(k) if k == "true" => Value::Bool(true),
            Token::Keyword(k) if k == "false" => Value::Bool(false),
            Token::Keyword(k) if k == "none" => Value::None,
        }
        .map(Expr::Literal);

        let list = expr
            .clone()
            .separated_by(symbol(","))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(symbol("["), symbol("]"))
            .map(Expr::List);

        let call = identifier()
            .then(
                expr.clone()
                    .separated_by(symbol(","))
                    .allow_trailing()
                    .collect::<Vec<_>>()
                    .delimited_by(symbol("("), symbol(")")),
            )
            .map(|(name, args)| Expr::Call { name, args });

        let variable = identifier().map(|name| Expr::Variable(name.node));

        // Call must come before variable: both start with an identifier
        choice((literal, list, call, variable))
            .map_with(|node, e| Spanned::new(node, span_range(&e.span())))
            .boxed()
    })
}

fn signature_parser<'a, I>() -> impl Parser<'a, I, MacroSignature, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let param = identifier()
        .then(symbol("=").ignore_then(expression_parser()).or_not())
        .map(|(name, default)| MacroParam { name, default });

    let params = param
        .separated_by(symbol(","))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(symbol("("), symbol(")"));

    identifier()
        .then(params)
        .then(just(Token::Keyword("export".to_string())).or_not())
        .map(|((name, params), export)| MacroSignature {
            name,
            params,
            exported: export.is_some(),
        })
}

fn rich_to_compile_error(source: &SourceFile, err: Rich<'_, Token>) -> CompileError {
    use chumsky::error::{RichPattern, RichReason};

    let message = match err.reason() {
        RichReason::ExpectedFound { found, .. } => match found {
            Some(tok) => format!("unexpected {}", &**tok),
            None => "unexpected end of tag".to_string(),
        },
        RichReason::Custom(msg) => msg.to_string(),
    };

    let expected: Vec<String> = err
        .expected()
        .filter_map(|e| match e {
            RichPattern::Token(tok) => Some(format!("{}", &**tok)),
            RichPattern::Label(label) => Some(label.to_string()),
            RichPattern::EndOfInput => Some("end of tag".to_string()),
            RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
            RichPattern::Any => Some("any token".to_string()),
            RichPattern::SomethingElse => None,
        })
        .collect();

    let message = if expected.is_empty() {
        message
    } else {
        format!("{}, expected {}", message, expected.join(" or "))
    };

    CompileError::syntax(message, source.position(err.span().into_range()))
}
