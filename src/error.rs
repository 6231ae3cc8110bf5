//! Error types for template compilation

use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::ast::Span;
use crate::template::LoadError;

/// Location of a token inside a template file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub filename: String,
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
    pub span: Span,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

fn at(position: &Option<Position>) -> String {
    position
        .as_ref()
        .map(|p| format!("{}: ", p))
        .unwrap_or_default()
}

/// Errors that abort compilation of a template
#[derive(Debug, Error)]
pub enum CompileError {
    /// Malformed directive or expression
    #[error("{}{}", at(.position), .message)]
    Syntax {
        message: String,
        position: Option<Position>,
    },

    /// Import directive that names a file but no macros
    #[error("{}you must specify at least one macro to import", at(.position))]
    EmptyImport { position: Option<Position> },

    /// Requested macro is missing from the mapping the directive consults
    #[error("{position}: macro '{name}' not found (or not exported) in '{filename}'")]
    UnresolvedMacro {
        name: String,
        filename: String,
        position: Position,
    },

    /// Referenced template could not be loaded
    #[error("{}{}", at(.position), .source)]
    Load {
        #[source]
        source: LoadError,
        position: Option<Position>,
    },
}

impl CompileError {
    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::Syntax {
            message: message.into(),
            position: Some(position),
        }
    }

    pub fn load(source: LoadError) -> Self {
        Self::Load {
            source,
            position: None,
        }
    }

    /// Get the source position if available
    pub fn position(&self) -> Option<&Position> {
        match self {
            Self::Syntax { position, .. }
            | Self::EmptyImport { position }
            | Self::Load { position, .. } => position.as_ref(),
            Self::UnresolvedMacro { position, .. } => Some(position),
        }
    }

    /// Attach `position` unless the error already points somewhere.
    ///
    /// Errors raised while compiling an imported file keep their own location;
    /// only errors without one (a missing file, say) are pinned to the
    /// importing directive.
    pub fn with_position_if_missing(mut self, fallback: &Position) -> Self {
        match &mut self {
            Self::Syntax { position, .. }
            | Self::EmptyImport { position }
            | Self::Load { position, .. } => {
                if position.is_none() {
                    *position = Some(fallback.clone());
                }
            }
            Self::UnresolvedMacro { .. } => {}
        }
        self
    }

    /// Message without the location prefix
    pub fn message(&self) -> String {
        match self {
            Self::Syntax { message, .. } => message.clone(),
            Self::EmptyImport { .. } => "you must specify at least one macro to import".to_string(),
            Self::UnresolvedMacro { name, filename, .. } => {
                format!("macro '{}' not found (or not exported) in '{}'", name, filename)
            }
            Self::Load { source, .. } => source.to_string(),
        }
    }

    /// Format the error with source context using ariadne
    ///
    /// `source` must be the text of the file named by the error's position.
    pub fn format(&self, source: &str) -> String {
        let Some(position) = self.position() else {
            return self.to_string();
        };
        let filename = position.filename.as_str();
        let message = self.message();

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, position.span.start)
            .with_message(&message)
            .with_label(
                Label::new((filename, position.span.clone()))
                    .with_message(&message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| self.to_string()),
            Err(_) => self.to_string(),
        }
    }
}

/// Errors from directive registration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("directive '{name}' is already registered")]
    AlreadyRegistered { name: String },

    #[error("directive '{name}' is not registered")]
    NotRegistered { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(column: usize, span: Span) -> Position {
        Position {
            filename: "page.html".to_string(),
            line: 1,
            column,
            span,
        }
    }

    #[test]
    fn test_display_includes_position() {
        let err = CompileError::syntax("expected ','", position(5, 4..5));
        assert_eq!(err.to_string(), "page.html:1:5: expected ','");
    }

    #[test]
    fn test_display_without_position() {
        let err = CompileError::EmptyImport { position: None };
        assert_eq!(
            err.to_string(),
            "you must specify at least one macro to import"
        );
    }

    #[test]
    fn test_position_attached_only_when_missing() {
        let err = CompileError::load(LoadError::NotFound {
            name: "missing.html".to_string(),
        })
        .with_position_if_missing(&position(4, 3..9));
        assert_eq!(err.position().map(|p| p.column), Some(4));

        let err = CompileError::syntax("bad", position(2, 1..2))
            .with_position_if_missing(&position(9, 8..9));
        assert_eq!(err.position().map(|p| p.column), Some(2));
    }

    #[test]
    fn test_load_keeps_cause() {
        use std::error::Error as _;

        let err = CompileError::load(LoadError::NotFound {
            name: "missing.html".to_string(),
        });
        assert!(err.source().is_some());
        assert!(err.to_string().contains("missing.html"));
    }

    #[test]
    fn test_format_with_source() {
        let source = "{% import \"x\" %}";
        let err = CompileError::EmptyImport {
            position: Some(position(15, 14..16)),
        };
        let report = err.format(source);
        assert!(report.contains("at least one macro"));
        assert!(report.contains("page.html"));
    }
}
