//! Configuration-error diagnostics for grammar authors.
//!
//! Ordinary parse failure is never an error: rules report it as an explicit
//! no-match value and callers recover by trying the next alternative. The
//! errors in this module are the fatal kind: a grammar that cannot be
//! interpreted at all. They surface either eagerly (`Grammar::validate`) or
//! lazily on first use during a parse, and are meant for the person writing
//! the grammar, not for the person supplying input text.

use miette::Diagnostic;
use thiserror::Error;

/// A fatal grammar-configuration error.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("unresolved reference to nonterminal '{name}'")]
    UnresolvedReference { name: String },

    #[error("duplicate definition of nonterminal '{name}'")]
    DuplicateDefinition { name: String },

    #[error("field '{field}' permits '{found}', which is not a nonterminal")]
    InvalidFieldOption { field: String, found: String },

    #[error("invalid pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("recursion limit of {limit} exceeded while evaluating '{rule}'")]
    RecursionLimit { limit: usize, rule: String },

    #[error("left recursion through '{rule}' escaped every alternation that could resolve it")]
    UnguardedRecursion { rule: String },
}

impl Diagnostic for GrammarError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self {
            Self::UnresolvedReference { .. } => "vyaka::grammar::unresolved_reference",
            Self::DuplicateDefinition { .. } => "vyaka::grammar::duplicate_definition",
            Self::InvalidFieldOption { .. } => "vyaka::grammar::invalid_field_option",
            Self::InvalidPattern { .. } => "vyaka::grammar::invalid_pattern",
            Self::RecursionLimit { .. } => "vyaka::engine::recursion_limit",
            Self::UnguardedRecursion { .. } => "vyaka::engine::unguarded_recursion",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let help = match self {
            Self::UnresolvedReference { name } => {
                format!("declare a nonterminal named '{name}' before parsing")
            }
            Self::DuplicateDefinition { name } => {
                format!("'{name}' is already declared; nonterminal names must be unique")
            }
            Self::InvalidFieldOption { .. } => {
                "field rules may only permit nonterminals (or forward references to them)"
                    .to_string()
            }
            Self::InvalidPattern { .. } => {
                "the pattern must be a valid regular expression".to_string()
            }
            Self::RecursionLimit { .. } => {
                "a rule recursed into itself without consuming input; route left recursion \
                 through a priority alternation, or raise the limit in ParseOptions"
                    .to_string()
            }
            Self::UnguardedRecursion { .. } => {
                "a rule referenced itself at the same position without an enclosing priority \
                 alternation to catch the recursion"
                    .to_string()
            }
        };
        Some(Box::new(help))
    }
}
