use pretty_assertions::assert_eq;

use super::{arithmetic, render, run};
use crate::ParserConfig;

fn parse_expr(input: &str) -> (String, bool, bool) {
    let table = arithmetic::<()>().link().unwrap();
    let output = run(&table, "Expr", input, &mut (), &ParserConfig::default());
    (render(&output), output.matched, output.at_end)
}

#[test]
fn test_single_term() {
    let (tree, matched, at_end) = parse_expr("a");
    assert!(matched);
    assert!(at_end);
    assert_eq!(tree, "Expr_term(term: Term_name(name: a))");
}

#[test]
fn test_left_recursion_groups_left() {
    let (tree, _, at_end) = parse_expr("a + b + c");
    assert!(at_end);
    assert_eq!(
        tree,
        "Expr_plus(left: Expr_plus(left: Expr_term(term: Term_name(name: a)), \
         right: Term_name(name: b)), right: Term_name(name: c))"
    );
}

#[test]
fn test_mixed_operators_share_the_seed() {
    let (tree, _, at_end) = parse_expr("a + b - c");
    assert!(at_end);
    assert_eq!(
        tree,
        "Expr_minus(left: Expr_plus(left: Expr_term(term: Term_name(name: a)), \
         right: Term_name(name: b)), right: Term_name(name: c))"
    );
}

#[test]
fn test_parentheses_nest_a_fresh_switch() {
    let (tree, _, at_end) = parse_expr("a - ( b + c )");
    assert!(at_end);
    assert_eq!(
        tree,
        "Expr_minus(left: Expr_term(term: Term_name(name: a)), \
         right: Term_paren(inner: Expr_plus(left: Expr_term(term: Term_name(name: b)), \
         right: Term_name(name: c))))"
    );
}

#[test]
fn test_earlier_alternative_wins_over_later_one() {
    let (tree, _, at_end) = parse_expr("f ( ) + x");
    assert!(at_end);
    assert_eq!(
        tree,
        "Expr_plus(left: Expr_term(term: Term_call(name: f)), right: Term_name(name: x))"
    );
}

#[test]
fn test_trailing_operator_is_left_unconsumed() {
    let (tree, matched, at_end) = parse_expr("a +");
    assert!(matched);
    assert!(!at_end);
    assert_eq!(tree, "Expr_term(term: Term_name(name: a))");
}

#[test]
fn test_no_match() {
    let (tree, matched, at_end) = parse_expr("+ a");
    assert!(!matched);
    assert!(!at_end);
    assert_eq!(tree, "-");
}

#[test]
fn test_switch_accepts_seed_and_every_growth() {
    let mut decls = arithmetic::<Vec<String>>();
    decls.get_mut("Expr").unwrap().on_accept(|element, ctl, log| {
        let text = element.map_or_else(
            || "_".to_string(),
            |id| ctl.elements().display(id).to_string(),
        );
        log.push(text);
    });
    let table = decls.link().unwrap();

    let mut log = Vec::new();
    let output = run(&table, "Expr", "a + b + c", &mut log, &ParserConfig::default());

    assert_eq!(log.len(), 3);
    assert_eq!(log[0], "Expr_term(term: Term_name(name: a))");
    assert!(log[1].starts_with("Expr_plus(left: Expr_term"));
    assert_eq!(log[2], render(&output));
}
