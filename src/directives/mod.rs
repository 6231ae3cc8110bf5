//! Built-in directives

mod import;
mod macro_def;

pub use import::ImportBinding;
pub use macro_def::{MacroDefinition, MacroNode};

use crate::parser::directive::DirectiveParser;

/// Directives every template set starts with
pub(crate) const BUILTINS: &[(&str, DirectiveParser)] = &[
    ("macro", macro_def::parse_macro),
    ("import", import::parse_import),
    ("from", import::parse_from),
];
