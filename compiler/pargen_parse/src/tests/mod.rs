//! Engine tests.
//!
//! Tests are organized into modules by category:
//! - `left_recursion`: switch alternatives and seed growth
//! - `compound`: fields, optional entries, aliases, hooks
//! - `sequence`: repeated entries
//! - `jumps`: upward jumps into enclosing alternatives
//! - `caches`: negative cache and forward transitions
//! - `control`: position markers, variants, lookup checkpoints

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod compound;
mod control;
mod left_recursion;
mod sequence;

use pargen_ir::{Declarations, GrammarTable, PhrasePart as P, Token, TokenList};

use crate::{parse, ParseOutput, ParserConfig};

pub(crate) fn is_ident(token: &Token<'_>) -> bool {
    !token.text.is_empty() && token.text.chars().all(|c| c.is_ascii_alphanumeric())
}

/// `Expr: Expr + Term | Expr - Term | Term`, with calls and parentheses.
pub(crate) fn arithmetic<U: 'static>() -> Declarations<U> {
    let mut decls = Declarations::new();
    decls
        .declare("Expr")
        .phrase(
            "plus",
            [P::phrase("Expr").named("left"), P::token("+"), P::phrase("Term").named("right")],
        )
        .phrase(
            "minus",
            [P::phrase("Expr").named("left"), P::token("-"), P::phrase("Term").named("right")],
        )
        .phrase("term", [P::phrase("Term")]);
    decls
        .declare("Term")
        .phrase("paren", [P::token("("), P::phrase("Expr").named("inner"), P::token(")")])
        .phrase(
            "call",
            [P::predicate(|t, _| is_ident(t)).named("name"), P::token("("), P::token(")")],
        )
        .phrase("name", [P::predicate(|t, _| is_ident(t)).named("name")]);
    decls
}

pub(crate) fn run<U>(
    table: &GrammarTable<U>,
    root: &str,
    input: &str,
    user: &mut U,
    config: &ParserConfig,
) -> ParseOutput {
    let root = table.lookup(root).unwrap();
    let mut tokens = TokenList::from_words(input);
    parse(table, root, &mut tokens, user, config).unwrap()
}

/// Root subtree as text, `-` when there is none.
pub(crate) fn render(output: &ParseOutput) -> String {
    output
        .display_root()
        .map_or_else(|| "-".to_string(), |root| root.to_string())
}
