//! Grammar rule model and builder surface.
//!
//! A grammar is an arena of immutable tagged rule values. Every rule is
//! addressed by a stable [`RuleId`] handed out at construction; the engine's
//! recursion bookkeeping keys on these handles, so two structurally equal
//! alternations built separately stay distinct. Rules form a graph; cycles
//! are allowed (and required, for recursive grammars) through nonterminals
//! and forward references.
//!
//! Grammars are authored through the combinator methods on [`Grammar`]:
//!
//! ```
//! use vyaka::grammar::{Capabilities, Grammar};
//!
//! let mut g = Grammar::new();
//! let digits = g.pattern("[0-9]+").unwrap();
//! let number = g
//!     .nonterminal("Number", digits, Capabilities::NONE.with_text())
//!     .unwrap();
//! let plus = g.literal("+");
//! let expr = g.sequence([number, plus, number]);
//! # let _ = expr;
//! ```

pub mod registry;
pub mod validate;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagnostics::GrammarError;
use registry::NameRegistry;

/// Stable handle of a rule in a grammar's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) u32);

impl RuleId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Tie-breaking policy of an alternation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoicePolicy {
    /// First declared option that matches wins; left-recursion aware.
    Priority,
    /// All options tried; the longest match wins, ties become an ambiguity.
    Longest,
    /// All options tried; the shortest match wins, ties become an ambiguity.
    Shortest,
}

/// What a nonterminal does with its matches beyond producing a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Store the matched source slice on the node.
    pub captures_text: bool,
    /// Expose the node's span in the document projection.
    pub captures_span: bool,
    /// A node whose only payload is a `self` field is replaced by that
    /// field's values wherever it is used as a child, transitively.
    pub self_replacing: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        captures_text: false,
        captures_span: false,
        self_replacing: false,
    };

    pub const fn with_text(mut self) -> Self {
        self.captures_text = true;
        self
    }

    pub const fn with_span(mut self) -> Self {
        self.captures_span = true;
        self
    }

    pub const fn with_self_replacing(mut self) -> Self {
        self.self_replacing = true;
        self
    }
}

/// A named, reusable rule whose matches become nodes in the output tree.
#[derive(Debug)]
pub(crate) struct Nonterminal {
    pub(crate) name: String,
    pub(crate) body: RuleId,
    pub(crate) capabilities: Capabilities,
}

/// One rule value in the arena.
#[derive(Debug)]
pub(crate) enum Rule {
    Literal(String),
    Pattern(Regex),
    Sequence(Vec<RuleId>),
    Choice {
        policy: ChoicePolicy,
        options: Vec<RuleId>,
    },
    Optional(RuleId),
    OneOrMore(RuleId),
    ZeroOrMore(RuleId),
    Field {
        name: String,
        options: Vec<RuleId>,
    },
    Nonterminal(Nonterminal),
    Forward(String),
}

/// An arena of rules plus the name registry resolving forward references.
#[derive(Debug, Default)]
pub struct Grammar {
    rules: Vec<Rule>,
    registry: NameRegistry,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, rule: Rule) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(rule);
        id
    }

    /// A terminal matching `text` verbatim.
    pub fn literal(&mut self, text: impl Into<String>) -> RuleId {
        self.push(Rule::Literal(text.into()))
    }

    /// A terminal matching a regular expression anchored at the current
    /// position. Invalid patterns are configuration errors.
    pub fn pattern(&mut self, pattern: &str) -> Result<RuleId, GrammarError> {
        let compiled = Regex::new(pattern).map_err(|source| GrammarError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(self.push(Rule::Pattern(compiled)))
    }

    /// Ordered concatenation. An empty sequence matches without consuming.
    pub fn sequence(&mut self, items: impl IntoIterator<Item = RuleId>) -> RuleId {
        self.push(Rule::Sequence(items.into_iter().collect()))
    }

    fn choice(
        &mut self,
        policy: ChoicePolicy,
        options: impl IntoIterator<Item = RuleId>,
    ) -> RuleId {
        self.push(Rule::Choice {
            policy,
            options: options.into_iter().collect(),
        })
    }

    /// Alternation resolved by declaration order; the only alternation kind
    /// that supports left recursion.
    pub fn priority_of(&mut self, options: impl IntoIterator<Item = RuleId>) -> RuleId {
        self.choice(ChoicePolicy::Priority, options)
    }

    /// Alternation resolved by longest match; ties survive as an ambiguity.
    pub fn longest_of(&mut self, options: impl IntoIterator<Item = RuleId>) -> RuleId {
        self.choice(ChoicePolicy::Longest, options)
    }

    /// Alternation resolved by shortest match; ties survive as an ambiguity.
    pub fn shortest_of(&mut self, options: impl IntoIterator<Item = RuleId>) -> RuleId {
        self.choice(ChoicePolicy::Shortest, options)
    }

    /// Matches `rule` or nothing. Never fails the enclosing rule.
    pub fn optional(&mut self, rule: RuleId) -> RuleId {
        self.push(Rule::Optional(rule))
    }

    pub fn one_or_more(&mut self, rule: RuleId) -> RuleId {
        self.push(Rule::OneOrMore(rule))
    }

    pub fn zero_or_more(&mut self, rule: RuleId) -> RuleId {
        self.push(Rule::ZeroOrMore(rule))
    }

    /// A named attribute: the first permitted nonterminal that matches is
    /// appended to the enclosing node's child list under `name`. Options must
    /// be nonterminals or forward references to nonterminals.
    pub fn field(
        &mut self,
        name: impl Into<String>,
        options: impl IntoIterator<Item = RuleId>,
    ) -> RuleId {
        self.push(Rule::Field {
            name: name.into(),
            options: options.into_iter().collect(),
        })
    }

    /// Declares a named nonterminal with the given body and capabilities and
    /// registers it for forward references.
    pub fn nonterminal(
        &mut self,
        name: impl Into<String>,
        body: RuleId,
        capabilities: Capabilities,
    ) -> Result<RuleId, GrammarError> {
        let name = name.into();
        let id = self.push(Rule::Nonterminal(Nonterminal {
            name: name.clone(),
            body,
            capabilities,
        }));
        self.registry.declare(&name, id)?;
        Ok(id)
    }

    /// A reference to a nonterminal that may not be declared yet. Resolved
    /// through the registry at most once; transparent thereafter.
    pub fn forward(&mut self, name: impl Into<String>) -> RuleId {
        self.push(Rule::Forward(name.into()))
    }

    /// The handle declared under `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<RuleId> {
        self.registry.lookup(name)
    }

    /// The name of the nonterminal behind `id`, if `id` is one.
    pub fn name_of(&self, id: RuleId) -> Option<&str> {
        match self.rule(id) {
            Rule::Nonterminal(nonterminal) => Some(nonterminal.name.as_str()),
            _ => None,
        }
    }

    /// The capabilities of the nonterminal behind `id`, if `id` is one.
    pub fn capabilities_of(&self, id: RuleId) -> Option<Capabilities> {
        match self.rule(id) {
            Rule::Nonterminal(nonterminal) => Some(nonterminal.capabilities),
            _ => None,
        }
    }

    pub(crate) fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub(crate) fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub(crate) fn resolve_name(&self, name: &str) -> Result<RuleId, GrammarError> {
        self.registry.resolve(name)
    }

    /// Follows forward references until a concrete rule is reached.
    pub(crate) fn resolve_target(&self, id: RuleId) -> Result<RuleId, GrammarError> {
        let mut current = id;
        while let Rule::Forward(name) = self.rule(current) {
            current = self.registry.resolve(name)?;
        }
        Ok(current)
    }

    pub(crate) fn as_nonterminal(&self, id: RuleId) -> Option<&Nonterminal> {
        match self.rule(id) {
            Rule::Nonterminal(nonterminal) => Some(nonterminal),
            _ => None,
        }
    }

    /// Resolves a field option to the nonterminal it must name.
    pub(crate) fn expect_nonterminal(
        &self,
        field: &str,
        option: RuleId,
    ) -> Result<(RuleId, &Nonterminal), GrammarError> {
        let target = self.resolve_target(option)?;
        match self.rule(target) {
            Rule::Nonterminal(nonterminal) => Ok((target, nonterminal)),
            other => Err(GrammarError::InvalidFieldOption {
                field: field.to_string(),
                found: describe_rule(other),
            }),
        }
    }

    /// Short human description of a rule, for diagnostics.
    pub(crate) fn describe(&self, id: RuleId) -> String {
        describe_rule(self.rule(id))
    }
}

fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::Literal(text) => format!("literal '{text}'"),
        Rule::Pattern(pattern) => format!("pattern '{}'", pattern.as_str()),
        Rule::Sequence(_) => "sequence".to_string(),
        Rule::Choice { policy, .. } => match policy {
            ChoicePolicy::Priority => "priority alternation".to_string(),
            ChoicePolicy::Longest => "longest alternation".to_string(),
            ChoicePolicy::Shortest => "shortest alternation".to_string(),
        },
        Rule::Optional(_) => "optional".to_string(),
        Rule::OneOrMore(_) => "one-or-more repetition".to_string(),
        Rule::ZeroOrMore(_) => "zero-or-more repetition".to_string(),
        Rule::Field { name, .. } => format!("field '{name}'"),
        Rule::Nonterminal(nonterminal) => format!("nonterminal '{}'", nonterminal.name),
        Rule::Forward(name) => format!("reference to '{name}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_distinct_even_for_equal_structure() {
        let mut g = Grammar::new();
        let a = g.literal("x");
        let b = g.literal("x");
        let first = g.priority_of([a]);
        let second = g.priority_of([a]);
        assert_ne!(a, b);
        assert_ne!(first, second);
    }

    #[test]
    fn nonterminal_registers_its_name() {
        let mut g = Grammar::new();
        let body = g.literal("x");
        let nt = g.nonterminal("X", body, Capabilities::NONE).unwrap();
        assert_eq!(g.lookup("X"), Some(nt));
        assert_eq!(g.name_of(nt), Some("X"));
    }

    #[test]
    fn duplicate_nonterminal_name_is_rejected() {
        let mut g = Grammar::new();
        let body = g.literal("x");
        g.nonterminal("X", body, Capabilities::NONE).unwrap();
        assert!(matches!(
            g.nonterminal("X", body, Capabilities::NONE),
            Err(GrammarError::DuplicateDefinition { .. })
        ));
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let mut g = Grammar::new();
        assert!(matches!(
            g.pattern("["),
            Err(GrammarError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn forward_reference_resolves_through_registry() {
        let mut g = Grammar::new();
        let fwd = g.forward("X");
        let body = g.literal("x");
        let nt = g.nonterminal("X", body, Capabilities::NONE).unwrap();
        assert_eq!(g.resolve_target(fwd).unwrap(), nt);
    }
}
