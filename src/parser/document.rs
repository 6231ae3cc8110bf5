//! Document parser: splits template text into tags and builds the node tree

use std::sync::Arc;

use crate::directives::MacroDefinition;
use crate::error::{CompileError, Position};
use crate::parser::arguments::ArgumentCursor;
use crate::parser::ast::{Node, Span, Spanned};
use crate::parser::expression::parse_expression;
use crate::parser::lexer::{lex, Token};
use crate::parser::source::SourceFile;
use crate::template::{MacroRegistry, Template, TemplateIdentity, TemplateSet};

/// Top-level pieces of a template before tag bodies are lexed
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(Span),
    /// `{{ ... }}`; `inner` excludes the delimiters
    Print { inner: Span, outer: Span },
    /// `{% ... %}`
    Directive { inner: Span, outer: Span },
    /// `{# ... #}`
    Comment,
}

/// Split template source into text, tags and comments
fn split(source: &SourceFile) -> Result<Vec<Segment>, CompileError> {
    let bytes = source.text().as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos + 1 < bytes.len() {
        let closer: &[u8; 2] = match (bytes[pos], bytes[pos + 1]) {
            (b'{', b'{') => b"}}",
            (b'{', b'%') => b"%}",
            (b'{', b'#') => b"#}",
            _ => {
                pos += 1;
                continue;
            }
        };

        if text_start < pos {
            segments.push(Segment::Text(text_start..pos));
        }

        let inner_start = pos + 2;
        let quoted = closer != b"#}";
        let Some(close) = find_closer(bytes, inner_start, closer, quoted) else {
            return Err(CompileError::syntax(
                format!(
                    "unterminated tag, expected '{}'",
                    String::from_utf8_lossy(closer)
                ),
                source.position(pos..pos + 2),
            ));
        };

        let inner = inner_start..close;
        let outer = pos..close + 2;
        segments.push(match closer {
            b"}}" => Segment::Print { inner, outer },
            b"%}" => Segment::Directive { inner, outer },
            _ => Segment::Comment,
        });

        pos = close + 2;
        text_start = pos;
    }

    if text_start < bytes.len() {
        segments.push(Segment::Text(text_start..bytes.len()));
    }
    Ok(segments)
}

/// Find the closing delimiter, skipping over double-quoted strings in tags
fn find_closer(bytes: &[u8], start: usize, closer: &[u8; 2], quoted: bool) -> Option<usize> {
    let mut i = start;
    let mut in_string = false;
    while i + 1 < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == b'"' {
                in_string = false;
            }
        } else if quoted && b == b'"' {
            in_string = true;
        } else if b == closer[0] && bytes[i + 1] == closer[1] {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Parser state for one template file.
///
/// Directive parsers receive it to load other templates through the owning
/// set, to register macros and to consume block bodies.
pub struct DocumentParser<'a> {
    set: &'a TemplateSet,
    identity: &'a TemplateIdentity,
    source: &'a SourceFile,
    /// Files currently being compiled, outermost first, this one last
    chain: &'a [String],
    segments: Vec<Segment>,
    index: usize,
    macros: MacroRegistry,
}

impl<'a> DocumentParser<'a> {
    pub fn new(
        set: &'a TemplateSet,
        identity: &'a TemplateIdentity,
        source: &'a SourceFile,
        chain: &'a [String],
    ) -> Result<Self, CompileError> {
        Ok(Self {
            set,
            identity,
            source,
            chain,
            segments: split(source)?,
            index: 0,
            macros: MacroRegistry::new(),
        })
    }

    pub fn identity(&self) -> &TemplateIdentity {
        self.identity
    }

    pub fn position(&self, span: Span) -> Position {
        self.source.position(span)
    }

    /// Resolve a path written in this template to a canonical template name
    pub fn resolve_filename(&self, path: &str) -> String {
        self.set.resolve_filename(Some(self.identity), path)
    }

    /// Load and compile another template through the owning set
    pub fn load_template(&self, name: &str) -> Result<Arc<Template>, CompileError> {
        self.set.load_resolved(name, self.chain)
    }

    /// Record a macro defined in this template
    pub fn register_macro(
        &mut self,
        definition: Arc<MacroDefinition>,
        name_span: Span,
    ) -> Result<(), CompileError> {
        let name = definition.name().to_string();
        if self.macros.register(definition).is_err() {
            return Err(CompileError::syntax(
                format!("another macro with name '{}' is already registered", name),
                self.position(name_span),
            ));
        }
        Ok(())
    }

    /// Parse the whole document
    pub fn parse(&mut self) -> Result<Vec<Node>, CompileError> {
        let (nodes, _) = self.parse_until(&[])?;
        Ok(nodes)
    }

    /// Parse nodes until a directive named in `end_names` is reached.
    ///
    /// Returns the body, the name of the end directive and a cursor over its
    /// arguments. Reaching the end of the file first is an error reported at
    /// `start`.
    pub fn wrap_until(
        &mut self,
        end_names: &[&str],
        start: &Position,
    ) -> Result<(Vec<Node>, String, ArgumentCursor<'a>), CompileError> {
        match self.parse_until(end_names)? {
            (nodes, Some((name, args))) => Ok((nodes, name, args)),
            (_, None) => Err(CompileError::syntax(
                format!(
                    "unexpected end of template, expected one of: {}",
                    end_names.join(", ")
                ),
                start.clone(),
            )),
        }
    }

    /// Give up the parser and keep the macros it collected
    pub fn into_macros(self) -> MacroRegistry {
        self.macros
    }

    #[allow(clippy::type_complexity)]
    fn parse_until(
        &mut self,
        end_names: &[&str],
    ) -> Result<(Vec<Node>, Option<(String, ArgumentCursor<'a>)>), CompileError> {
        let mut nodes = Vec::new();

        while let Some(segment) = self.segments.get(self.index).cloned() {
            self.index += 1;
            match segment {
                Segment::Text(span) => nodes.push(Node::Text(self.source.slice(span).to_string())),
                Segment::Comment => {}
                Segment::Print { inner, outer } => nodes.push(self.parse_print(inner, outer)?),
                Segment::Directive { inner, outer: _ } => {
                    let (name, mut args) = self.directive_head(inner)?;
                    if end_names.contains(&name.node.as_str()) {
                        return Ok((nodes, Some((name.node, args))));
                    }

                    let parser = self.set.directives().get(&name.node).ok_or_else(|| {
                        CompileError::syntax(
                            format!(
                                "directive '{}' not found (or beginning tag not provided)",
                                name.node
                            ),
                            self.position(name.span.clone()),
                        )
                    })?;

                    let start = self.position(name.span.clone());
                    let node = parser(self, &start, &mut args)?;
                    if let Some(extra) = args.peek() {
                        return Err(args.error(
                            format!("malformed '{}' arguments, unexpected {}", name.node, extra.node),
                            None,
                        ));
                    }
                    nodes.push(Node::Directive(node));
                }
            }
        }

        Ok((nodes, None))
    }

    fn parse_print(&self, inner: Span, outer: Span) -> Result<Node, CompileError> {
        let tokens = self.lex_tag(inner.clone())?;
        if tokens.is_empty() {
            return Err(CompileError::syntax(
                "empty print tag",
                self.position(outer),
            ));
        }
        let expr = parse_expression(self.source, tokens, inner.end..inner.end)?;
        Ok(Node::Print {
            expr,
            position: self.position(outer),
        })
    }

    /// Lex a directive tag and split off its name
    fn directive_head(
        &self,
        inner: Span,
    ) -> Result<(Spanned<String>, ArgumentCursor<'a>), CompileError> {
        let mut tokens = self.lex_tag(inner.clone())?.into_iter();
        let name = match tokens.next() {
            Some(Spanned {
                node: Token::Ident(name) | Token::Keyword(name),
                span,
            }) => Spanned::new(name, span),
            Some(other) => {
                return Err(CompileError::syntax(
                    format!("expected directive name, found {}", other.node),
                    self.position(other.span),
                ))
            }
            None => {
                return Err(CompileError::syntax(
                    "empty directive",
                    self.position(inner),
                ))
            }
        };
        let args = ArgumentCursor::new(self.source, tokens.collect(), inner.end..inner.end);
        Ok((name, args))
    }

    fn lex_tag(&self, inner: Span) -> Result<Vec<Spanned<Token>>, CompileError> {
        let text = self.source.slice(inner.clone());
        lex(text, inner.start).map_err(|span| {
            let found = self.source.slice(span.clone()).to_string();
            CompileError::syntax(
                format!("unexpected character '{}'", found),
                self.position(span),
            )
        })
    }
}

impl std::fmt::Debug for DocumentParser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentParser")
            .field("template", &self.identity.name)
            .field("index", &self.index)
            .finish()
    }
}
