//! Name registry binding textual references to nonterminal handles.
//!
//! Recursive grammars need to mention a nonterminal before (or inside) its
//! own definition. The registry is the lazy binder that makes that work:
//! `declare` registers a nonterminal under its name, `resolve` turns a
//! forward reference into the declared handle. A reference that never
//! resolves is a configuration error, not a parse failure.

use std::collections::HashMap;

use crate::diagnostics::GrammarError;
use crate::grammar::RuleId;

#[derive(Debug, Default)]
pub struct NameRegistry {
    entries: HashMap<String, RuleId>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `rule` under `name`. Names are unique per grammar.
    pub fn declare(&mut self, name: &str, rule: RuleId) -> Result<(), GrammarError> {
        if self.entries.contains_key(name) {
            return Err(GrammarError::DuplicateDefinition {
                name: name.to_string(),
            });
        }
        self.entries.insert(name.to_string(), rule);
        Ok(())
    }

    /// The handle declared under `name`, or a configuration error.
    pub fn resolve(&self, name: &str) -> Result<RuleId, GrammarError> {
        self.lookup(name)
            .ok_or_else(|| GrammarError::UnresolvedReference {
                name: name.to_string(),
            })
    }

    pub fn lookup(&self, name: &str) -> Option<RuleId> {
        self.entries.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_then_resolve() {
        let mut registry = NameRegistry::new();
        registry.declare("Expr", RuleId(0)).unwrap();
        assert_eq!(registry.resolve("Expr").unwrap(), RuleId(0));
    }

    #[test]
    fn unresolved_name_is_an_error() {
        let registry = NameRegistry::new();
        assert!(matches!(
            registry.resolve("Missing"),
            Err(GrammarError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn duplicate_declaration_is_an_error() {
        let mut registry = NameRegistry::new();
        registry.declare("Expr", RuleId(0)).unwrap();
        assert!(matches!(
            registry.declare("Expr", RuleId(1)),
            Err(GrammarError::DuplicateDefinition { .. })
        ));
    }
}
