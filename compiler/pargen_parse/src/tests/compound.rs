use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pargen_ir::{
    CompoundGrammar, Declarations, ElementFactory, ElementLayout, EntryFlags, Grammar,
    GrammarEntry, GrammarId, GrammarKind, GrammarTable, PhrasePart as P, SubgrammarEntry,
    SwitchEntry, SwitchGrammar, TokenList,
};
use pretty_assertions::assert_eq;

use super::{arithmetic, is_ident, render, run};
use crate::{optimize, parse, EngineError, ParserConfig};

fn declaration_with_initializer() -> Declarations<Vec<String>> {
    let mut decls = Declarations::new();
    decls.declare("Decl").phrase(
        "decl",
        [P::token("let"), P::any_token().named("name"), P::phrase("Init").optional()],
    );
    decls
        .declare("Init")
        .phrase("init", [P::token("="), P::any_token().named("value")])
        .on_accept(|element, ctl, log: &mut Vec<String>| {
            log.push(element.map_or_else(
                || "none".to_string(),
                |id| ctl.elements().display(id).to_string(),
            ));
        });
    decls
}

#[test]
fn test_optional_entry_present() {
    let table = declaration_with_initializer().link().unwrap();
    let mut log = Vec::new();
    let output = run(&table, "Decl", "let x = 1", &mut log, &ParserConfig::default());
    assert!(output.is_complete());
    assert_eq!(render(&output), "Decl(name: x, init: Init(value: 1))");
    assert_eq!(log, vec!["Init(value: 1)"]);
}

#[test]
fn test_optional_entry_absent_accepts_none() {
    let table = declaration_with_initializer().link().unwrap();
    let mut log = Vec::new();
    let output = run(&table, "Decl", "let x", &mut log, &ParserConfig::default());
    assert!(output.is_complete());
    assert_eq!(render(&output), "Decl(name: x, init: _)");
    assert_eq!(log, vec!["none"]);
}

#[test]
fn test_partial_optional_entry_is_rolled_back() {
    let table = declaration_with_initializer().link().unwrap();
    let mut log = Vec::new();
    let output = run(&table, "Decl", "let x =", &mut log, &ParserConfig::default());
    assert!(output.matched);
    assert!(!output.at_end);
    assert_eq!(render(&output), "Decl(name: x, init: _)");
}

#[test]
fn test_match_hook_vetoes_element() {
    let mut decls = arithmetic::<()>();
    decls.get_mut("Term").unwrap().on_match(|id, ctl, _| {
        let elements = ctl.elements();
        let name = elements
            .compound(id)
            .and_then(|term| term.get("name"))
            .and_then(|name| elements.token(name));
        name.map_or(true, |token| &*token.text != "bad")
    });
    let table = decls.link().unwrap();

    let output = run(&table, "Expr", "bad", &mut (), &ParserConfig::default());
    assert!(!output.matched);

    let output = run(&table, "Expr", "a + bad", &mut (), &ParserConfig::default());
    assert!(output.matched);
    assert!(!output.at_end);
    assert_eq!(render(&output), "Expr_term(term: Term_name(name: a))");
}

#[test]
fn test_begin_fires_per_occurrence() {
    let begins = Arc::new(AtomicUsize::new(0));
    let mut decls = arithmetic::<()>();
    let counter = Arc::clone(&begins);
    decls.get_mut("Term").unwrap().on_begin(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });
    let table = decls.link().unwrap();

    run(&table, "Expr", "a + b", &mut (), &ParserConfig::default());
    assert_eq!(begins.load(Ordering::Relaxed), 2);
}

#[test]
fn test_token_elements_can_be_switched_off() {
    let table = arithmetic::<()>().link().unwrap();
    let config = ParserConfig {
        create_elements: false,
        ..ParserConfig::default()
    };
    let output = run(&table, "Expr", "a", &mut (), &config);
    assert!(output.is_complete());
    assert_eq!(render(&output), "Expr_term(term: Term_name(name: _))");
}

fn path_grammar(optional: bool) -> Declarations<Vec<bool>> {
    let mut decls = Declarations::new();
    let path = if optional {
        P::phrase("Path").optional()
    } else {
        P::phrase("Path")
    };
    decls.declare("Use").phrase("use", [P::token("use"), path]);
    decls
        .alias("Path", "Name")
        .on_accept(|element, _, log: &mut Vec<bool>| log.push(element.is_some()));
    decls
        .declare("Name")
        .phrase("name", [P::predicate(|t, _| is_ident(t)).named("ident")]);
    decls
}

#[test]
fn test_alias_is_transparent() {
    let table = path_grammar(false).link().unwrap();
    let mut log = Vec::new();
    let output = run(&table, "Use", "use x", &mut log, &ParserConfig::default());
    assert!(output.is_complete());
    assert_eq!(render(&output), "Use(path: Name(ident: x))");
    assert_eq!(log, vec![true]);
}

#[test]
fn test_optional_alias_accepts_none() {
    let table = path_grammar(true).link().unwrap();
    let mut log = Vec::new();
    let output = run(&table, "Use", "use", &mut log, &ParserConfig::default());
    assert!(output.is_complete());
    assert_eq!(render(&output), "Use(path: _)");
    assert_eq!(log, vec![false]);
}

#[test]
fn test_failed_alias_fails_the_compound() {
    let table = path_grammar(false).link().unwrap();
    let mut log = Vec::new();
    let output = run(&table, "Use", "use +", &mut log, &ParserConfig::default());
    assert!(!output.matched);
    assert!(log.is_empty());
}

#[test]
fn test_unknown_root_is_an_error() {
    let table = arithmetic::<()>().link().unwrap();
    let mut tokens = TokenList::from_words("a");
    let result = parse(
        &table,
        GrammarId::new(9999),
        &mut tokens,
        &mut (),
        &ParserConfig::default(),
    );
    assert_eq!(result.unwrap_err(), EngineError::UnknownGrammar(GrammarId::new(9999)));
}

/// `Root: [<id 99>]` and `Pick: <id 98> | Root`, built without the linker.
fn dangling_table() -> (GrammarTable<()>, GrammarId, GrammarId) {
    let mut table = GrammarTable::new();
    let compound = CompoundGrammar {
        entries: vec![GrammarEntry::Subgrammar(SubgrammarEntry {
            grammar: GrammarId::new(99),
            flags: EntryFlags::empty(),
            field: None,
        })],
        factory: ElementFactory::new(ElementLayout::new("Root", Vec::new())),
    };
    let root = table
        .push(Grammar::new("Root", GrammarKind::Compound(compound)), true)
        .unwrap();
    let alternatives = [GrammarId::new(98), root]
        .into_iter()
        .map(|grammar| SwitchEntry {
            grammar,
            variants: Default::default(),
            transitions: None,
        })
        .collect();
    let pick = table
        .push(
            Grammar::new("Pick", GrammarKind::Switch(SwitchGrammar { entries: alternatives })),
            true,
        )
        .unwrap();
    (table, root, pick)
}

#[test]
fn test_dangling_grammar_id_is_an_error() {
    let (mut table, root, pick) = dangling_table();
    optimize(&mut table, pick);

    for (start, missing) in [(root, 99), (pick, 98)] {
        let mut tokens = TokenList::from_words("a");
        let result = parse(&table, start, &mut tokens, &mut (), &ParserConfig::default());
        assert_eq!(
            result.unwrap_err(),
            EngineError::UnknownGrammar(GrammarId::new(missing))
        );
    }
}
