use pargen_ir::{Declarations, PhrasePart as P};
use pretty_assertions::assert_eq;

use super::{is_ident, render, run};
use crate::ParserConfig;

fn list(optional: bool) -> Declarations<()> {
    let items = P::predicate(|t, _| is_ident(t)).named("items").sequence();
    let items = if optional { items.optional() } else { items };
    let mut decls = Declarations::new();
    decls
        .declare("List")
        .phrase("list", [P::token("["), items, P::token("]")]);
    decls
}

#[test]
fn test_sequence_collects_items_in_order() {
    let table = list(true).link().unwrap();
    let output = run(&table, "List", "[ a b c ]", &mut (), &ParserConfig::default());
    assert!(output.is_complete());
    assert_eq!(render(&output), "List(items: [a, b, c])");
}

#[test]
fn test_optional_sequence_may_be_empty() {
    let table = list(true).link().unwrap();
    let output = run(&table, "List", "[ ]", &mut (), &ParserConfig::default());
    assert!(output.is_complete());
    assert_eq!(render(&output), "List(items: [])");
}

#[test]
fn test_required_sequence_needs_one_item() {
    let table = list(false).link().unwrap();
    let output = run(&table, "List", "[ ]", &mut (), &ParserConfig::default());
    assert!(!output.matched);

    let output = run(&table, "List", "[ a ]", &mut (), &ParserConfig::default());
    assert!(output.is_complete());
    assert_eq!(render(&output), "List(items: [a])");
}

#[test]
fn test_sequence_of_compounds() {
    let mut decls: Declarations<()> = Declarations::new();
    decls.declare("Args").phrase(
        "args",
        [P::token("("), P::phrase("Arg").named("args").sequence().optional(), P::token(")")],
    );
    decls.declare("Arg").phrase(
        "arg",
        [P::predicate(|t, _| is_ident(t)).named("value"), P::token(",").optional()],
    );
    let table = decls.link().unwrap();

    let output = run(&table, "Args", "( a , b , c )", &mut (), &ParserConfig::default());
    assert!(output.is_complete());
    assert_eq!(
        render(&output),
        "Args(args: [Arg(value: a), Arg(value: b), Arg(value: c)])"
    );
}

#[test]
fn test_sequence_stops_at_empty_item() {
    let mut decls: Declarations<()> = Declarations::new();
    decls.declare("Items").phrase(
        "items",
        [P::token("["), P::phrase("Maybe").named("items").sequence(), P::token("]")],
    );
    decls
        .declare("Maybe")
        .phrase("maybe", [P::token("x").named("x").optional()]);
    let table = decls.link().unwrap();

    let output = run(&table, "Items", "[ x x ]", &mut (), &ParserConfig::default());
    assert!(output.is_complete());
    assert_eq!(render(&output), "Items(items: [Maybe(x: x), Maybe(x: x)])");
}
