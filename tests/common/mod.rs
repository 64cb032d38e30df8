#![allow(dead_code)]

//! Shared grammar fixtures for integration tests.
//!
//! The expression grammar mirrors the shape every test battery leans on:
//! left-recursive binary operators over identifiers and numbers, with
//! self-replacing wrapper nonterminals. The program grammar extends it to
//! assignment lists.

use once_cell::sync::Lazy;
use vyaka::grammar::{Capabilities, Grammar};

pub static EXPRESSION: Lazy<Grammar> = Lazy::new(expression_grammar);
pub static PROGRAM: Lazy<Grammar> = Lazy::new(program_grammar);

/// `Expression := (left:Expression op right:Expression) / (… '*'|'/' …) /
/// self:Literal`, with `Literal` self-replacing into `Id` or `Num`.
pub fn expression_grammar() -> Grammar {
    let mut g = Grammar::new();

    let ws_body = g.pattern(r"[ \t]*").unwrap();
    let ws = g.nonterminal("WS", ws_body, Capabilities::NONE).unwrap();

    let num_body = g.pattern("[0-9]+").unwrap();
    let num = g
        .nonterminal("Num", num_body, Capabilities::NONE.with_text())
        .unwrap();

    let id_body = g.pattern("[a-zA-Z_][0-9a-zA-Z_]*").unwrap();
    let ident = g
        .nonterminal("Id", id_body, Capabilities::NONE.with_text())
        .unwrap();

    let literal_body = g.field("self", [ident, num]);
    let literal = g
        .nonterminal(
            "Literal",
            literal_body,
            Capabilities::NONE.with_self_replacing(),
        )
        .unwrap();

    let expr_ref = g.forward("Expression");

    let add_left = g.field("left", [expr_ref]);
    let add_right = g.field("right", [expr_ref]);
    let plus = g.literal("+");
    let minus = g.literal("-");
    let add_op = g.priority_of([plus, minus]);
    let add = g.sequence([add_left, ws, add_op, ws, add_right]);

    let mul_left = g.field("left", [expr_ref]);
    let mul_right = g.field("right", [expr_ref]);
    let star = g.literal("*");
    let slash = g.literal("/");
    let mul_op = g.priority_of([star, slash]);
    let mul = g.sequence([mul_left, ws, mul_op, ws, mul_right]);

    let literal_self = g.field("self", [literal]);

    let body = g.priority_of([add, mul, literal_self]);
    g.nonterminal(
        "Expression",
        body,
        Capabilities::NONE
            .with_text()
            .with_span()
            .with_self_replacing(),
    )
    .unwrap();

    g
}

/// `Program := (stat:Assignment / NL)*`,
/// `Assignment := assignee:Id '=' value:Expression`.
pub fn program_grammar() -> Grammar {
    let mut g = expression_grammar();

    let nl_body = g.literal("\n");
    let nl = g.nonterminal("NL", nl_body, Capabilities::NONE).unwrap();

    let ws = g.lookup("WS").unwrap();
    let ident = g.lookup("Id").unwrap();
    let expr = g.lookup("Expression").unwrap();

    let assignee = g.field("assignee", [ident]);
    let eq = g.literal("=");
    let value = g.field("value", [expr]);
    let assignment_body = g.sequence([assignee, ws, eq, ws, value]);
    let assignment = g
        .nonterminal(
            "Assignment",
            assignment_body,
            Capabilities::NONE.with_span(),
        )
        .unwrap();

    let stat = g.field("stat", [assignment]);
    let item = g.priority_of([stat, nl]);
    let body = g.zero_or_more(item);
    g.nonterminal("Program", body, Capabilities::NONE).unwrap();

    g
}
