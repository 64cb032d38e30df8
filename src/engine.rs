//! The parsing engine: a recursive-descent interpreter over rule values.
//!
//! `parse` walks a grammar's rule graph against a text source and synthesizes
//! an attributed node tree. Three outcomes exist internally: a match with an
//! end position and a node, an explicit no-match, and a left-recursion
//! signal. The signal never escapes this module: it is caught by exactly
//! the priority alternation whose handle it names, which is what makes
//! left-recursive grammars terminate.
//!
//! # Left recursion
//!
//! A priority alternation marks itself pending in the recursion map before
//! scanning its options. An option that re-enters the same alternation at
//! the same left edge reports the signal instead of descending forever; such
//! options are deferred. The first option that matches becomes the *seed*.
//! The growth loop then re-evaluates the deferred options against the seed:
//! a re-entry now resolves to the seed immediately, so each accepted growth
//! extends the match by one recursive step, and the seed keeps growing until
//! no deferred option can extend it further. Growth re-evaluation is bounded
//! so that re-entrant solves of the growing rule stop at their own seed;
//! repeated one-step growth is what makes `1+2+3` come out left-associated.
//! When the bounded pass cannot extend the seed, the option is re-evaluated
//! once without the bound, so matches that need a fully grown nested parse
//! are not lost.
//!
//! The recursion map is scoped to the current left edge of the derivation:
//! a sequence hands it to its first element only, and every other evaluation
//! context starts from an empty map. It is not a cross-call cache.

use std::collections::{HashMap, HashSet};

use crate::diagnostics::GrammarError;
use crate::grammar::{ChoicePolicy, Grammar, Nonterminal, Rule, RuleId};
use crate::syntax::{Span, SyntaxNode};
use crate::text::TextSource;

/// Default ceiling on nested rule evaluations.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Knobs for a single parse invocation.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Hard ceiling on evaluation depth. A rule that recurses into itself
    /// without crossing a priority alternation cannot terminate; exhausting
    /// the limit reports that as a configuration error instead of
    /// overflowing the stack.
    pub max_depth: usize,
    /// When false, field capture, text capture, and self-replacement are
    /// skipped. Control flow is unchanged: the parse reaches the same end
    /// position with or without capture.
    pub capture: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            capture: true,
        }
    }
}

/// Result of evaluating one rule at one position.
enum Outcome<P> {
    Matched { end: P, node: SyntaxNode<P> },
    NoMatch,
    /// Internal left-recursion signal, tagged with the handle of the
    /// priority alternation being re-entered. Caught by that alternation
    /// and by nothing else.
    LeftRecursion(RuleId),
}

/// Per-handle state in the recursion map.
enum SeedState<P> {
    /// The alternation is scanning its options; re-entry is left recursion.
    Pending,
    /// The alternation's value at this position, for this derivation path.
    Resolved { end: P, node: SyntaxNode<P> },
}

type RecursionMap<P> = HashMap<RuleId, SeedState<P>>;

/// Parses `start` against `source` from its start position, with default
/// options.
///
/// `Ok(Some((end, node)))` is a match, `Ok(None)` an ordinary parse failure,
/// `Err` a grammar-configuration error.
pub fn parse<S: TextSource>(
    grammar: &Grammar,
    source: &S,
    start: RuleId,
) -> Result<Option<(S::Pos, SyntaxNode<S::Pos>)>, GrammarError> {
    parse_at(grammar, source, start, source.start(), &ParseOptions::default())
}

/// Parses `start` against `source` from `at`.
pub fn parse_at<S: TextSource>(
    grammar: &Grammar,
    source: &S,
    start: RuleId,
    at: S::Pos,
    options: &ParseOptions,
) -> Result<Option<(S::Pos, SyntaxNode<S::Pos>)>, GrammarError> {
    let mut evaluator = Evaluator {
        grammar,
        source,
        options,
        growing: HashSet::new(),
        bounded_hit: false,
    };
    let target = grammar.resolve_target(start)?;
    let mut recursion = RecursionMap::new();
    match evaluator.eval(target, at, &mut recursion, 0)? {
        Outcome::Matched { end, node } => {
            let node = match grammar.as_nonterminal(target) {
                Some(nonterminal) if options.capture => {
                    evaluator.finish_match(target, nonterminal, at, end, node)
                }
                _ => node,
            };
            Ok(Some((end, node)))
        }
        Outcome::NoMatch => Ok(None),
        Outcome::LeftRecursion(handle) => Err(GrammarError::UnguardedRecursion {
            rule: grammar.describe(handle),
        }),
    }
}

struct Evaluator<'a, S: TextSource> {
    grammar: &'a Grammar,
    source: &'a S,
    options: &'a ParseOptions,
    /// Priority alternations currently running their growth loop. A solve of
    /// the same alternation reached through a fresh map while it is growing
    /// stops at its seed instead of growing itself.
    growing: HashSet<RuleId>,
    /// Evidence that some solve skipped its growth loop since the last
    /// reset; tells a growth pass that a free re-evaluation could find more.
    bounded_hit: bool,
}

impl<S: TextSource> Evaluator<'_, S> {
    fn eval(
        &mut self,
        rule: RuleId,
        at: S::Pos,
        recursion: &mut RecursionMap<S::Pos>,
        depth: usize,
    ) -> Result<Outcome<S::Pos>, GrammarError> {
        if depth > self.options.max_depth {
            return Err(GrammarError::RecursionLimit {
                limit: self.options.max_depth,
                rule: self.grammar.describe(rule),
            });
        }
        let grammar = self.grammar;
        match grammar.rule(rule) {
            Rule::Literal(text) => Ok(match self.source.match_literal(text, at) {
                Some(end) => Outcome::Matched {
                    end,
                    node: SyntaxNode::new(),
                },
                None => Outcome::NoMatch,
            }),
            Rule::Pattern(pattern) => Ok(match self.source.match_pattern(pattern, at) {
                Some(end) => Outcome::Matched {
                    end,
                    node: SyntaxNode::new(),
                },
                None => Outcome::NoMatch,
            }),
            Rule::Sequence(items) => self.eval_sequence(items, at, recursion, depth),
            Rule::Choice { policy, options } => match policy {
                ChoicePolicy::Priority => self.eval_priority(rule, options, at, recursion, depth),
                ChoicePolicy::Longest => self.eval_extremal(options, true, at, depth),
                ChoicePolicy::Shortest => self.eval_extremal(options, false, at, depth),
            },
            Rule::Optional(inner) => self.eval_optional(*inner, at, depth),
            Rule::OneOrMore(inner) => self.eval_repetition(*inner, at, depth, true),
            Rule::ZeroOrMore(inner) => self.eval_repetition(*inner, at, depth, false),
            Rule::Field { name, options } => self.eval_field(name, options, at, recursion, depth),
            Rule::Nonterminal(nonterminal) => {
                // A nonterminal is exactly its body; identity matters only to
                // field stamping and recursion bookkeeping.
                self.eval(nonterminal.body, at, recursion, depth + 1)
            }
            Rule::Forward(name) => {
                let target = grammar.resolve_name(name)?;
                self.eval(target, at, recursion, depth + 1)
            }
        }
    }

    fn eval_sequence(
        &mut self,
        items: &[RuleId],
        at: S::Pos,
        recursion: &mut RecursionMap<S::Pos>,
        depth: usize,
    ) -> Result<Outcome<S::Pos>, GrammarError> {
        let mut node = SyntaxNode::new();
        let mut cursor = at;
        for (index, &item) in items.iter().enumerate() {
            // Left recursion can only occur through the leftmost element;
            // everything after it starts a new left edge.
            let outcome = if index == 0 {
                self.eval(item, cursor, recursion, depth + 1)?
            } else {
                self.eval(item, cursor, &mut RecursionMap::new(), depth + 1)?
            };
            match outcome {
                Outcome::Matched { end, node: part } => {
                    node.merge(part);
                    cursor = end;
                }
                Outcome::NoMatch => return Ok(Outcome::NoMatch),
                signal @ Outcome::LeftRecursion(_) => return Ok(signal),
            }
        }
        Ok(Outcome::Matched { end: cursor, node })
    }

    fn eval_optional(
        &mut self,
        inner: RuleId,
        at: S::Pos,
        depth: usize,
    ) -> Result<Outcome<S::Pos>, GrammarError> {
        match self.eval(inner, at, &mut RecursionMap::new(), depth + 1)? {
            matched @ Outcome::Matched { .. } => Ok(matched),
            Outcome::NoMatch => Ok(Outcome::Matched {
                end: at,
                node: SyntaxNode::new(),
            }),
            signal @ Outcome::LeftRecursion(_) => Ok(signal),
        }
    }

    fn eval_repetition(
        &mut self,
        inner: RuleId,
        at: S::Pos,
        depth: usize,
        require_one: bool,
    ) -> Result<Outcome<S::Pos>, GrammarError> {
        let mut node = SyntaxNode::new();
        let mut cursor = at;
        let mut matched_any = false;
        loop {
            match self.eval(inner, cursor, &mut RecursionMap::new(), depth + 1)? {
                Outcome::Matched { end, node: part } => {
                    node.merge(part);
                    matched_any = true;
                    let advanced = end > cursor;
                    cursor = end;
                    // A zero-width match is committed once; iterating on it
                    // again could never advance.
                    if !advanced {
                        break;
                    }
                }
                Outcome::NoMatch => break,
                signal @ Outcome::LeftRecursion(_) => return Ok(signal),
            }
        }
        if require_one && !matched_any {
            Ok(Outcome::NoMatch)
        } else {
            Ok(Outcome::Matched { end: cursor, node })
        }
    }

    /// Longest/Shortest alternation: every option evaluated independently,
    /// optimal end position wins, ties survive as an ambiguity option set.
    fn eval_extremal(
        &mut self,
        options: &[RuleId],
        longest: bool,
        at: S::Pos,
        depth: usize,
    ) -> Result<Outcome<S::Pos>, GrammarError> {
        let mut best: Option<S::Pos> = None;
        let mut tied: Vec<SyntaxNode<S::Pos>> = Vec::new();
        for &option in options {
            match self.eval(option, at, &mut RecursionMap::new(), depth + 1)? {
                Outcome::Matched { end, node } => {
                    let better = match best {
                        None => true,
                        Some(current) => {
                            if longest {
                                end > current
                            } else {
                                end < current
                            }
                        }
                    };
                    if better {
                        best = Some(end);
                        tied.clear();
                        tied.push(node);
                    } else if best == Some(end) {
                        tied.push(node);
                    }
                }
                Outcome::NoMatch => {}
                signal @ Outcome::LeftRecursion(_) => return Ok(signal),
            }
        }
        match best {
            Some(end) => {
                let mut node = SyntaxNode::new();
                node.merge_alternatives(tied);
                Ok(Outcome::Matched { end, node })
            }
            None => Ok(Outcome::NoMatch),
        }
    }

    /// Priority alternation: first match wins, with left-recursion handling.
    fn eval_priority(
        &mut self,
        handle: RuleId,
        options: &[RuleId],
        at: S::Pos,
        recursion: &mut RecursionMap<S::Pos>,
        depth: usize,
    ) -> Result<Outcome<S::Pos>, GrammarError> {
        match recursion.get(&handle) {
            Some(SeedState::Pending) => return Ok(Outcome::LeftRecursion(handle)),
            Some(SeedState::Resolved { end, node }) => {
                return Ok(Outcome::Matched {
                    end: *end,
                    node: node.clone(),
                })
            }
            None => {}
        }
        recursion.insert(handle, SeedState::Pending);

        let mut deferred: Vec<RuleId> = Vec::new();
        let mut seed: Option<(S::Pos, SyntaxNode<S::Pos>)> = None;
        for &option in options {
            match self.eval(option, at, recursion, depth + 1)? {
                Outcome::Matched { end, node } => {
                    recursion.insert(
                        handle,
                        SeedState::Resolved {
                            end,
                            node: node.clone(),
                        },
                    );
                    seed = Some((end, node));
                    break;
                }
                Outcome::NoMatch => {}
                Outcome::LeftRecursion(signal) if signal == handle => deferred.push(option),
                signal @ Outcome::LeftRecursion(_) => {
                    // Belongs to an enclosing alternation. Clear the pending
                    // mark so a later re-entry solves this rule cleanly.
                    recursion.remove(&handle);
                    return Ok(signal);
                }
            }
        }

        let Some((mut end, mut node)) = seed else {
            recursion.remove(&handle);
            return Ok(Outcome::NoMatch);
        };

        if !deferred.is_empty() {
            if self.growing.contains(&handle) {
                // A bounded solve: some outer growth pass of this same rule
                // is in progress, so stop at the seed.
                self.bounded_hit = true;
            } else {
                self.growing.insert(handle);
                let grown = self.grow(handle, deferred, (end, node), at, recursion, depth);
                self.growing.remove(&handle);
                (end, node) = grown?;
            }
        }
        Ok(Outcome::Matched { end, node })
    }

    /// The growth loop: extends the seed while any deferred option can.
    ///
    /// Options are retried in priority order; the first strict extension
    /// replaces the seed and restarts the scan, with the deferred list
    /// truncated to the options at or above the grown one. Each retry starts
    /// a new derivation attempt whose left edge knows only the current seed,
    /// so sibling entries resolved against an older seed cannot go stale.
    /// Termination: every accepted growth strictly advances the end position.
    fn grow(
        &mut self,
        handle: RuleId,
        mut deferred: Vec<RuleId>,
        seed: (S::Pos, SyntaxNode<S::Pos>),
        at: S::Pos,
        recursion: &mut RecursionMap<S::Pos>,
        depth: usize,
    ) -> Result<(S::Pos, SyntaxNode<S::Pos>), GrammarError> {
        let (mut best, mut node) = seed;
        loop {
            let mut advanced = false;
            let mut reached = 0;
            for (index, &option) in deferred.iter().enumerate() {
                reached = index;
                if let Some((end, grown)) =
                    self.regrow_option(handle, option, best, &node, at, depth)?
                {
                    recursion.insert(
                        handle,
                        SeedState::Resolved {
                            end,
                            node: grown.clone(),
                        },
                    );
                    best = end;
                    node = grown;
                    advanced = true;
                    break;
                }
            }
            deferred.truncate(reached + 1);
            if !advanced {
                break;
            }
        }
        Ok((best, node))
    }

    /// One deferred option, bounded pass first, free pass as fallback.
    fn regrow_option(
        &mut self,
        handle: RuleId,
        option: RuleId,
        best: S::Pos,
        node: &SyntaxNode<S::Pos>,
        at: S::Pos,
        depth: usize,
    ) -> Result<Option<(S::Pos, SyntaxNode<S::Pos>)>, GrammarError> {
        let outer_hit = self.bounded_hit;
        self.bounded_hit = false;
        // Bounded pass: re-entrant solves of `handle` stop at their seed, so
        // an accepted growth adds exactly one recursive step.
        let mut local = self.seeded_map(handle, best, node);
        if let Outcome::Matched { end, node } = self.eval(option, at, &mut local, depth + 1)? {
            if end > best {
                self.bounded_hit = outer_hit;
                return Ok(Some((end, node)));
            }
        }
        let hit = self.bounded_hit;
        self.bounded_hit = outer_hit || hit;
        if !hit {
            return Ok(None);
        }
        // Free pass: the bound cost us a match somewhere below (e.g. the
        // recursion sits behind further required elements); retry without it.
        self.growing.remove(&handle);
        let mut local = self.seeded_map(handle, best, node);
        let outcome = self.eval(option, at, &mut local, depth + 1);
        self.growing.insert(handle);
        if let Outcome::Matched { end, node } = outcome? {
            if end > best {
                return Ok(Some((end, node)));
            }
        }
        Ok(None)
    }

    /// A fresh left-edge map holding only the growing rule's current seed.
    fn seeded_map(
        &self,
        handle: RuleId,
        end: S::Pos,
        node: &SyntaxNode<S::Pos>,
    ) -> RecursionMap<S::Pos> {
        let mut map = RecursionMap::new();
        map.insert(
            handle,
            SeedState::Resolved {
                end,
                node: node.clone(),
            },
        );
        map
    }

    /// Named attribute: first permitted nonterminal that matches is stamped,
    /// capability effects applied, and appended under the field's name.
    fn eval_field(
        &mut self,
        name: &str,
        options: &[RuleId],
        at: S::Pos,
        recursion: &mut RecursionMap<S::Pos>,
        depth: usize,
    ) -> Result<Outcome<S::Pos>, GrammarError> {
        for &option in options {
            let (target, nonterminal) = self.grammar.expect_nonterminal(name, option)?;
            match self.eval(nonterminal.body, at, recursion, depth + 1)? {
                Outcome::Matched { end, node } => {
                    let mut parent = SyntaxNode::new();
                    if self.options.capture {
                        let child = self.finish_match(target, nonterminal, at, end, node);
                        for replacement in self.replace_self(child) {
                            parent.append(name, replacement);
                        }
                    }
                    return Ok(Outcome::Matched { end, node: parent });
                }
                Outcome::NoMatch => {}
                signal @ Outcome::LeftRecursion(_) => return Ok(signal),
            }
        }
        Ok(Outcome::NoMatch)
    }

    /// Stamps a fresh nonterminal match: class identity, span, captured text.
    fn finish_match(
        &self,
        class: RuleId,
        nonterminal: &Nonterminal,
        start: S::Pos,
        end: S::Pos,
        mut node: SyntaxNode<S::Pos>,
    ) -> SyntaxNode<S::Pos> {
        node.set_class(class);
        node.set_span(Span { start, end });
        if nonterminal.capabilities.captures_text {
            node.set_text(self.source.slice(start, end).to_string());
        }
        node
    }

    /// Transitively replaces self-replacing nodes by their `self` children.
    /// Each step descends into strictly nested subtrees, so this terminates.
    /// A replaced field holding an option set yields several nodes.
    fn replace_self(&self, node: SyntaxNode<S::Pos>) -> Vec<SyntaxNode<S::Pos>> {
        let mut nodes = vec![node];
        loop {
            let mut changed = false;
            let mut next = Vec::with_capacity(nodes.len());
            for candidate in nodes {
                if self.is_self_replacing(&candidate) {
                    let mut candidate = candidate;
                    next.extend(candidate.take_field("self"));
                    changed = true;
                } else {
                    next.push(candidate);
                }
            }
            nodes = next;
            if !changed {
                return nodes;
            }
        }
    }

    fn is_self_replacing(&self, node: &SyntaxNode<S::Pos>) -> bool {
        let Some(class) = node.class() else {
            return false;
        };
        self.grammar
            .capabilities_of(class)
            .is_some_and(|capabilities| capabilities.self_replacing)
            && node.has_field("self")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Capabilities;
    use crate::text::StringSource;

    #[test]
    fn literal_terminal_matches_or_reports_no_match() {
        let mut g = Grammar::new();
        let lit = g.literal("ab");
        let source = StringSource::new("abc");
        let (end, node) = parse(&g, &source, lit).unwrap().unwrap();
        assert_eq!(end, 2);
        assert!(node.is_empty());
        let source = StringSource::new("xbc");
        assert!(parse(&g, &source, lit).unwrap().is_none());
    }

    #[test]
    fn sequence_threads_positions_and_fails_without_partial_commit() {
        let mut g = Grammar::new();
        let a = g.literal("a");
        let b = g.literal("b");
        let seq = g.sequence([a, b]);
        let source = StringSource::new("ab");
        let (end, _) = parse(&g, &source, seq).unwrap().unwrap();
        assert_eq!(end, 2);
        let source = StringSource::new("ax");
        assert!(parse(&g, &source, seq).unwrap().is_none());
    }

    #[test]
    fn empty_sequence_matches_without_consuming() {
        let mut g = Grammar::new();
        let empty: [RuleId; 0] = [];
        let seq = g.sequence(empty);
        let source = StringSource::new("abc");
        let (end, node) = parse(&g, &source, seq).unwrap().unwrap();
        assert_eq!(end, 0);
        assert!(node.is_empty());
    }

    #[test]
    fn priority_takes_the_first_matching_option() {
        let mut g = Grammar::new();
        let a = g.literal("a");
        let ab = g.literal("ab");
        let choice = g.priority_of([a, ab]);
        let source = StringSource::new("ab");
        let (end, _) = parse(&g, &source, choice).unwrap().unwrap();
        assert_eq!(end, 1);
    }

    #[test]
    fn unguarded_self_recursion_reports_a_configuration_error() {
        let mut g = Grammar::new();
        let fwd = g.forward("Loop");
        let tail = g.literal("x");
        let body = g.sequence([fwd, tail]);
        g.nonterminal("Loop", body, Capabilities::NONE).unwrap();
        let source = StringSource::new("x");
        let start = g.lookup("Loop").unwrap();
        assert!(matches!(
            parse(&g, &source, start),
            Err(GrammarError::RecursionLimit { .. })
        ));
    }
}
