//! Eager structural validation of a grammar.
//!
//! The engine surfaces the same configuration errors lazily on first use;
//! `validate` exists so grammar authors can get them up front, before any
//! input is parsed.

use crate::diagnostics::GrammarError;
use crate::grammar::{Grammar, Rule, RuleId};

impl Grammar {
    /// Checks that every forward reference resolves and that every field
    /// permits only nonterminals.
    pub fn validate(&self) -> Result<(), GrammarError> {
        for index in 0..self.rule_count() {
            let id = RuleId(index as u32);
            match self.rule(id) {
                Rule::Forward(name) => {
                    self.resolve_name(name)?;
                }
                Rule::Field { name, options } => {
                    for &option in options {
                        self.expect_nonterminal(name, option)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::GrammarError;
    use crate::grammar::{Capabilities, Grammar};

    #[test]
    fn complete_grammar_validates() {
        let mut g = Grammar::new();
        let fwd = g.forward("X");
        let inner = g.field("x", [fwd]);
        let body = g.literal("x");
        g.nonterminal("X", body, Capabilities::NONE).unwrap();
        g.nonterminal("Top", inner, Capabilities::NONE).unwrap();
        assert!(g.validate().is_ok());
    }

    #[test]
    fn dangling_forward_reference_fails() {
        let mut g = Grammar::new();
        g.forward("Nowhere");
        assert!(matches!(
            g.validate(),
            Err(GrammarError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn field_option_must_be_a_nonterminal() {
        let mut g = Grammar::new();
        let lit = g.literal("x");
        g.field("x", [lit]);
        assert!(matches!(
            g.validate(),
            Err(GrammarError::InvalidFieldOption { .. })
        ));
    }
}
