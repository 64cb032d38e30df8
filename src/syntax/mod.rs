//! Attributed syntax nodes, the output tree of the parsing engine.
//!
//! A [`SyntaxNode`] accumulates named child lists while a nonterminal's body
//! is being parsed, and is frozen once it is handed back to the caller. Field
//! order is insertion order: the order fields were populated during parsing,
//! not the order they were declared in the grammar.
//!
//! Ambiguity is first class. A node may carry a non-empty list of
//! *alternatives*: mutually exclusive, equally valid completions of this
//! position in the tree. Invariant: a node with alternatives has an empty
//! field map of its own; each alternative carries its own fields. Merging an
//! ambiguous node into an accumulator expands the ambiguity by cross-product
//! (see [`SyntaxNode::merge_alternatives`]).

pub mod document;

use serde::{Deserialize, Serialize};

use crate::grammar::RuleId;

/// A start/end position pair stamped on every nonterminal match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span<P> {
    pub start: P,
    pub end: P,
}

/// One named child list.
#[derive(Debug, Clone, PartialEq)]
struct FieldSlot<P> {
    name: String,
    children: Vec<SyntaxNode<P>>,
}

/// A node of the attributed output tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode<P> {
    class: Option<RuleId>,
    span: Option<Span<P>>,
    text: Option<String>,
    fields: Vec<FieldSlot<P>>,
    alternatives: Vec<SyntaxNode<P>>,
}

impl<P> Default for SyntaxNode<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SyntaxNode<P> {
    pub fn new() -> Self {
        Self {
            class: None,
            span: None,
            text: None,
            fields: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// The nonterminal that produced this node, if it has been stamped.
    pub fn class(&self) -> Option<RuleId> {
        self.class
    }

    pub fn span(&self) -> Option<&Span<P>> {
        self.span.as_ref()
    }

    /// The captured source slice, for text-capturing nonterminals.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub(crate) fn set_class(&mut self, class: RuleId) {
        self.class = Some(class);
    }

    pub(crate) fn set_span(&mut self, span: Span<P>) {
        self.span = Some(span);
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }

    /// True when this node carries no fields and no alternatives.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.alternatives.is_empty()
    }

    /// True when this position in the tree is genuinely ambiguous.
    pub fn is_ambiguous(&self) -> bool {
        !self.alternatives.is_empty()
    }

    /// The unresolved-ambiguity option set. Empty for unambiguous nodes.
    pub fn alternatives(&self) -> &[SyntaxNode<P>] {
        &self.alternatives
    }

    /// Adds `child` to the end of the list for `name`, creating the list if
    /// it does not exist yet.
    pub fn append(&mut self, name: &str, child: SyntaxNode<P>) {
        match self.fields.iter_mut().find(|slot| slot.name == name) {
            Some(slot) => slot.children.push(child),
            None => self.fields.push(FieldSlot {
                name: name.to_string(),
                children: vec![child],
            }),
        }
    }

    fn extend_field(&mut self, name: String, children: Vec<SyntaxNode<P>>) {
        match self.fields.iter_mut().find(|slot| slot.name == name) {
            Some(slot) => slot.children.extend(children),
            None => self.fields.push(FieldSlot { name, children }),
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|slot| slot.name == name)
    }

    /// The child list for `name`, in append order. Empty if absent.
    pub fn children(&self, name: &str) -> &[SyntaxNode<P>] {
        self.fields
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    /// Field names and child lists, in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &[SyntaxNode<P>])> {
        self.fields
            .iter()
            .map(|slot| (slot.name.as_str(), slot.children.as_slice()))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Removes and returns the child list for `name`.
    pub(crate) fn take_field(&mut self, name: &str) -> Vec<SyntaxNode<P>> {
        match self.fields.iter().position(|slot| slot.name == name) {
            Some(index) => self.fields.remove(index).children,
            None => Vec::new(),
        }
    }
}

impl<P: Clone> SyntaxNode<P> {
    /// Appends every field-list entry of `source` into the corresponding
    /// list of `self`, in order, and expands ambiguity if `source` carries
    /// alternatives.
    ///
    /// Once `self` is ambiguous its own field map stays empty; content
    /// merged afterwards is shared continuation, distributed into every
    /// alternative.
    pub fn merge(&mut self, source: SyntaxNode<P>) {
        let SyntaxNode {
            fields,
            alternatives,
            ..
        } = source;
        if self.alternatives.is_empty() {
            for slot in fields {
                self.extend_field(slot.name, slot.children);
            }
        } else {
            for alternative in &mut self.alternatives {
                for slot in &fields {
                    alternative.extend_field(slot.name.clone(), slot.children.clone());
                }
            }
        }
        if !alternatives.is_empty() {
            self.merge_alternatives(alternatives);
        }
    }

    /// Merges an option set into this node.
    ///
    /// A single-entry set merges as an ordinary field merge. Otherwise, if
    /// this node is not yet ambiguous, its accumulated fields become shared
    /// context distributed into every alternative; if it already is, the
    /// result is the full cross-product of existing and new alternatives,
    /// discarding the prior unpaired lists.
    pub fn merge_alternatives(&mut self, mut sources: Vec<SyntaxNode<P>>) {
        if sources.len() == 1 {
            if let Some(only) = sources.pop() {
                self.merge(only);
            }
            return;
        }
        if sources.is_empty() {
            return;
        }
        if self.alternatives.is_empty() {
            let mut shared = SyntaxNode::new();
            shared.fields = std::mem::take(&mut self.fields);
            self.alternatives = sources
                .into_iter()
                .map(|source| {
                    let mut alternative = shared.clone();
                    alternative.merge(source);
                    alternative
                })
                .collect();
        } else {
            let existing = std::mem::take(&mut self.alternatives);
            let mut combined = Vec::with_capacity(existing.len() * sources.len());
            for left in &existing {
                for right in &sources {
                    let mut merged = left.clone();
                    merged.merge(right.clone());
                    combined.push(merged);
                }
            }
            self.alternatives = combined;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(text: &str) -> SyntaxNode<usize> {
        let mut node = SyntaxNode::new();
        node.set_text(text.to_string());
        node
    }

    fn with_field(name: &str, text: &str) -> SyntaxNode<usize> {
        let mut node = SyntaxNode::new();
        node.append(name, leaf(text));
        node
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut node: SyntaxNode<usize> = SyntaxNode::new();
        node.append("b", leaf("1"));
        node.append("a", leaf("2"));
        node.append("b", leaf("3"));
        let names: Vec<&str> = node.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(node.children("b").len(), 2);
        assert_eq!(node.children("b")[1].text(), Some("3"));
    }

    #[test]
    fn merge_appends_field_lists_in_order() {
        let mut target = with_field("x", "1");
        let mut source = with_field("x", "2");
        source.append("y", leaf("3"));
        target.merge(source);
        assert_eq!(target.children("x").len(), 2);
        assert_eq!(target.children("x")[0].text(), Some("1"));
        assert_eq!(target.children("x")[1].text(), Some("2"));
        assert_eq!(target.children("y").len(), 1);
    }

    #[test]
    fn single_alternative_merges_as_plain_merge() {
        let mut target = with_field("x", "1");
        target.merge_alternatives(vec![with_field("x", "2")]);
        assert!(!target.is_ambiguous());
        assert_eq!(target.children("x").len(), 2);
    }

    #[test]
    fn adoption_distributes_prior_fields_into_each_alternative() {
        let mut target = with_field("ctx", "shared");
        target.merge_alternatives(vec![with_field("a", "1"), with_field("b", "2")]);
        assert!(target.is_ambiguous());
        // The node's own field map is vacated in favor of the alternatives.
        assert_eq!(target.field_count(), 0);
        assert_eq!(target.alternatives().len(), 2);
        for alternative in target.alternatives() {
            assert_eq!(alternative.children("ctx").len(), 1);
        }
        assert!(target.alternatives()[0].has_field("a"));
        assert!(target.alternatives()[1].has_field("b"));
    }

    #[test]
    fn nested_ambiguity_expands_as_cross_product() {
        let mut target: SyntaxNode<usize> = SyntaxNode::new();
        target.merge_alternatives(vec![with_field("a", "1"), with_field("a", "2")]);
        target.merge_alternatives(vec![with_field("b", "3"), with_field("b", "4")]);
        assert_eq!(target.alternatives().len(), 4);
        let pairs: Vec<(&str, &str)> = target
            .alternatives()
            .iter()
            .map(|alt| {
                (
                    alt.children("a")[0].text().unwrap(),
                    alt.children("b")[0].text().unwrap(),
                )
            })
            .collect();
        assert_eq!(pairs, [("1", "3"), ("1", "4"), ("2", "3"), ("2", "4")]);
    }

    #[test]
    fn merge_into_an_ambiguous_target_distributes_into_each_alternative() {
        let mut target: SyntaxNode<usize> = SyntaxNode::new();
        target.merge_alternatives(vec![with_field("a", "1"), with_field("b", "2")]);
        target.merge(with_field("tail", "3"));
        assert_eq!(target.field_count(), 0);
        for alternative in target.alternatives() {
            assert_eq!(alternative.children("tail").len(), 1);
        }
    }

    #[test]
    fn ambiguous_source_expands_target_on_merge() {
        let mut target = with_field("ctx", "shared");
        let mut source: SyntaxNode<usize> = SyntaxNode::new();
        source.merge_alternatives(vec![with_field("a", "1"), with_field("b", "2")]);
        target.merge(source);
        assert_eq!(target.alternatives().len(), 2);
        assert!(target.alternatives()[0].has_field("ctx"));
    }
}
