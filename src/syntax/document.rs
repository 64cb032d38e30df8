//! Generic projection of an attributed tree to a JSON document.
//!
//! Convenience export: class identity, span (for span-capturing classes),
//! captured text, fields, and unresolved alternatives, recursively. Nothing
//! in the engine depends on this form.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::grammar::Grammar;
use crate::syntax::SyntaxNode;

impl<P: Serialize> SyntaxNode<P> {
    /// Projects this node (and its subtree) to a JSON value.
    pub fn to_document(&self, grammar: &Grammar) -> Value {
        let mut doc = Map::new();
        if let Some(class) = self.class() {
            if let Some(name) = grammar.name_of(class) {
                doc.insert("class".to_string(), Value::String(name.to_string()));
            }
            let captures_span = grammar
                .capabilities_of(class)
                .is_some_and(|capabilities| capabilities.captures_span);
            if captures_span {
                if let Some(span) = self.span() {
                    doc.insert("span".to_string(), json!(span));
                }
            }
        }
        if let Some(text) = self.text() {
            doc.insert("text".to_string(), Value::String(text.to_string()));
        }
        if self.is_ambiguous() {
            let alternatives = self
                .alternatives()
                .iter()
                .map(|alternative| alternative.to_document(grammar))
                .collect();
            doc.insert("alternatives".to_string(), Value::Array(alternatives));
        } else if self.field_count() > 0 {
            let mut fields = Map::new();
            for (name, children) in self.fields() {
                let children = children
                    .iter()
                    .map(|child| child.to_document(grammar))
                    .collect();
                fields.insert(name.to_string(), Value::Array(children));
            }
            doc.insert("fields".to_string(), Value::Object(fields));
        }
        Value::Object(doc)
    }
}
