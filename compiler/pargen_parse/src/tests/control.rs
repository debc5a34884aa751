use pargen_ir::{ControlError, Declarations, PhrasePart as P, PositionMarker, TokenList};
use pretty_assertions::assert_eq;

use super::{arithmetic, is_ident, render, run};
use crate::{parse_with_lookup, LookupData, ParserConfig};

#[derive(Default)]
struct Replay {
    marker: Option<PositionMarker>,
    replayed: bool,
    seconds: usize,
    stale: Option<Result<(), ControlError>>,
}

fn pair() -> Declarations<Replay> {
    let mut decls = Declarations::new();
    decls
        .declare("Pair")
        .phrase(
            "pair",
            [
                P::predicate(|t, _| is_ident(t)).named("first"),
                P::inline(|_, ctl, replay: &mut Replay| {
                    if replay.marker.is_none() {
                        replay.marker = Some(ctl.position().unwrap());
                    }
                    true
                }),
                P::predicate(|t, _| is_ident(t))
                    .named("second")
                    .on_accept(|_, _, replay: &mut Replay| replay.seconds += 1),
            ],
        )
        .on_match(|_, ctl, replay| {
            if !replay.replayed {
                replay.replayed = true;
                let marker = replay.marker.clone().unwrap();
                ctl.set_position(&marker).unwrap();
            }
            true
        });
    decls
}

#[test]
fn test_set_position_replays_from_marker() {
    let table = pair().link().unwrap();
    let mut replay = Replay::default();
    let output = run(&table, "Pair", "x y", &mut replay, &ParserConfig::default());

    assert!(output.is_complete());
    assert_eq!(render(&output), "Pair(first: x, second: y)");
    assert_eq!(replay.seconds, 2);
    let marker = replay.marker.unwrap();
    assert_eq!(marker.next_entry, 2);
    assert_eq!(marker.stream_pos.offset(), 1);
}

#[test]
fn test_stale_marker_is_rejected() {
    let mut decls: Declarations<Replay> = Declarations::new();
    decls
        .declare("Word")
        .phrase("word", [P::predicate(|t, _| is_ident(t)).named("word")])
        .on_match(|_, ctl, replay| {
            let mut marker = ctl.position().unwrap();
            marker.serial += 100;
            replay.stale = Some(ctl.set_position(&marker));
            true
        });
    let table = decls.link().unwrap();
    let mut replay = Replay::default();
    let output = run(&table, "Word", "w", &mut replay, &ParserConfig::default());

    assert!(output.is_complete());
    assert_eq!(replay.stale, Some(Err(ControlError::StaleMarker)));
}

fn greetings() -> Declarations<()> {
    let mut decls = Declarations::new();
    decls
        .declare("Greeting")
        .phrase_for_variants(&["formal"], "formal", [P::token("good"), P::token("day")])
        .phrase_for_variants(&["casual"], "casual", [P::token("hey")])
        .phrase("any", [P::token("hello")]);
    decls
        .declare("Dialog")
        .phrase("dialog", [P::phrase("Switch").optional(), P::phrase("Greeting")]);
    decls.declare("Switch").phrase(
        "switch",
        [P::token("!").on_accept(|_, ctl, _| ctl.set_variant("casual"))],
    );
    decls
}

#[test]
fn test_default_variant_selects_phrases() {
    let table = greetings().link().unwrap();
    let formal = ParserConfig {
        default_variant: "formal".to_string(),
        ..ParserConfig::default()
    };
    let casual = ParserConfig {
        default_variant: "casual".to_string(),
        ..ParserConfig::default()
    };

    assert!(run(&table, "Greeting", "good day", &mut (), &formal).is_complete());
    assert!(!run(&table, "Greeting", "hey", &mut (), &formal).matched);
    assert!(run(&table, "Greeting", "hey", &mut (), &casual).is_complete());
    assert!(!run(&table, "Greeting", "good day", &mut (), &casual).matched);

    // Phrases without variants are always available.
    assert!(run(&table, "Greeting", "hello", &mut (), &formal).is_complete());
    assert!(run(&table, "Greeting", "hello", &mut (), &casual).is_complete());
}

#[test]
fn test_callback_switches_variant() {
    let table = greetings().link().unwrap();
    let formal = ParserConfig {
        default_variant: "formal".to_string(),
        ..ParserConfig::default()
    };

    let output = run(&table, "Dialog", "! hey", &mut (), &formal);
    assert!(output.is_complete());
    assert_eq!(render(&output), "Dialog(switch: Switch(), greeting: Greeting_casual())");

    assert!(!run(&table, "Dialog", "hey", &mut (), &formal).matched);
}

#[derive(Default)]
struct Checkpoints {
    depth: usize,
    opened: usize,
    committed: usize,
    cancelled: usize,
}

impl LookupData for Checkpoints {
    fn new_checkpoint(&mut self) {
        self.depth += 1;
        self.opened += 1;
    }

    fn commit_checkpoint(&mut self) {
        self.depth -= 1;
        self.committed += 1;
    }

    fn cancel_checkpoint(&mut self) {
        self.depth -= 1;
        self.cancelled += 1;
    }
}

#[test]
fn test_lookup_checkpoints_follow_steps() {
    let table = arithmetic::<()>().link().unwrap();
    let root = table.lookup("Expr").unwrap();
    let mut tokens = TokenList::from_words("a + b - c");
    let mut lookup = Checkpoints::default();
    let output = parse_with_lookup(
        &table,
        root,
        &mut tokens,
        &mut (),
        &ParserConfig::default(),
        &mut lookup,
    )
    .unwrap();

    assert!(output.is_complete());
    assert_eq!(lookup.depth, 0);
    assert_eq!(lookup.opened, output.stats.steps);
    assert_eq!(lookup.opened, lookup.committed + lookup.cancelled);
    assert!(lookup.cancelled > 0);
}

#[test]
fn test_callbacks_edit_element_creation_and_fields() {
    let mut decls: Declarations<()> = Declarations::new();
    decls.declare("Quiet").phrase(
        "quiet",
        [
            P::token("quiet").on_accept(|_, ctl, _| ctl.set_create_elements(false)),
            P::predicate(|t, _| is_ident(t)).named("name"),
        ],
    );
    decls
        .declare("Drop")
        .phrase("drop", [P::token("drop"), P::predicate(|t, _| is_ident(t)).named("name")])
        .on_match(|element, ctl, _| {
            let index = ctl.elements().compound(element).unwrap().layout().field_index("name");
            ctl.elements_mut().compound_mut(element).unwrap().assign(index.unwrap(), None);
            true
        });
    let table = decls.link().unwrap();

    let quiet = run(&table, "Quiet", "quiet x", &mut (), &ParserConfig::default());
    assert!(quiet.is_complete());
    assert_eq!(render(&quiet), "Quiet(name: _)");

    let dropped = run(&table, "Drop", "drop x", &mut (), &ParserConfig::default());
    assert!(dropped.is_complete());
    assert_eq!(render(&dropped), "Drop(name: _)");
}
