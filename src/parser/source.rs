//! Template source text with offset-to-position mapping

use std::sync::Arc;

use crate::error::Position;
use crate::parser::ast::Span;

#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    text: Arc<str>,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn slice(&self, span: Span) -> &str {
        &self.text[span]
    }

    /// Map a byte span to a line/column position
    pub fn position(&self, span: Span) -> Position {
        let offset = span.start.min(self.text.len());
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_index];
        let column = self.text[line_start..offset].chars().count() + 1;
        Position {
            filename: self.name.clone(),
            line: line_index + 1,
            column,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_first_line() {
        let file = SourceFile::new("a.html", "hello world");
        let pos = file.position(6..11);
        assert_eq!((pos.line, pos.column), (1, 7));
        assert_eq!(pos.to_string(), "a.html:1:7");
    }

    #[test]
    fn test_position_after_newlines() {
        let file = SourceFile::new("a.html", "one\ntwo\nthree");
        let pos = file.position(8..13);
        assert_eq!((pos.line, pos.column), (3, 1));
        assert_eq!(file.slice(8..13), "three");
    }

    #[test]
    fn test_column_counts_characters() {
        let file = SourceFile::new("a.html", "héllo x");
        let pos = file.position(7..8);
        assert_eq!(pos.column, 7);
    }
}
