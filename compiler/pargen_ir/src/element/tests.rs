#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;

fn binary_factory() -> ElementFactory {
    ElementFactory::new(ElementLayout::new(
        "Sum",
        vec![
            FieldDef {
                name: "left".into(),
                kind: FieldKind::Single,
            },
            FieldDef {
                name: "rest".into(),
                kind: FieldKind::List,
            },
        ],
    ))
}

fn token(text: &str) -> Element {
    Element::Token(TokenElement {
        text: text.into(),
        payload: None,
    })
}

#[test]
fn test_factory_creates_empty_fields() {
    let element = binary_factory().create();
    assert_eq!(element.name(), "Sum");
    assert_eq!(element.get("left"), None);
    assert!(element.list("rest").is_empty());
    assert!(element.field("missing").is_none());
}

#[test]
fn test_assign_single_overwrites_and_clears() {
    let mut arena = ElementArena::new();
    let a = arena.alloc(token("a")).unwrap();
    let b = arena.alloc(token("b")).unwrap();
    let mut element = binary_factory().create();

    element.assign(0, Some(a));
    element.assign(0, Some(b));
    assert_eq!(element.get("left"), Some(b));

    element.assign(0, None);
    assert_eq!(element.get("left"), None);
}

#[test]
fn test_assign_list_appends_and_ignores_none() {
    let mut arena = ElementArena::new();
    let a = arena.alloc(token("a")).unwrap();
    let b = arena.alloc(token("b")).unwrap();
    let mut element = binary_factory().create();

    element.assign(1, Some(a));
    element.assign(1, None);
    element.assign(1, Some(b));
    assert_eq!(element.list("rest"), &[a, b]);
    assert_eq!(element.get("rest"), None);
}

#[test]
fn test_truncate_discards_newer_elements() {
    let mut arena = ElementArena::new();
    let a = arena.alloc(token("a")).unwrap();
    let level = arena.level();
    let b = arena.alloc(token("b")).unwrap();
    assert_eq!(arena.len(), 2);

    arena.truncate(level);
    assert_eq!(arena.len(), 1);
    assert!(arena.get(a).is_some());
    assert!(arena.get(b).is_none());

    let c = arena.alloc(token("c")).unwrap();
    assert_eq!(c, b);
    assert_eq!(arena.token(c).map(|t| &*t.text), Some("c"));
}

#[test]
fn test_display_renders_tree() {
    let mut arena = ElementArena::new();
    let a = arena.alloc(token("a")).unwrap();
    let b = arena.alloc(token("b")).unwrap();
    let c = arena.alloc(token("c")).unwrap();

    let mut inner = binary_factory().create();
    inner.assign(0, Some(a));
    let inner = arena.alloc(Element::Compound(inner)).unwrap();

    let mut outer = binary_factory().create();
    outer.assign(0, Some(inner));
    outer.assign(1, Some(b));
    outer.assign(1, Some(c));
    let outer = arena.alloc(Element::Compound(outer)).unwrap();

    assert_eq!(
        arena.display(outer).to_string(),
        "Sum(left: Sum(left: a, rest: []), rest: [b, c])"
    );
}

#[test]
fn test_element_id_sentinel() {
    assert!(!ElementId::INVALID.is_valid());
    assert_eq!(ElementId::default(), ElementId::INVALID);
    assert_eq!(format!("{:?}", ElementId::new(3)), "ElementId(3)");
}

#[test]
fn test_element_id_from_index_stops_below_sentinel() {
    assert_eq!(ElementId::from_index(7), Some(ElementId::new(7)));
    assert_eq!(ElementId::from_index(u32::MAX as usize), None);
    assert!(ElementId::from_index(u32::MAX as usize - 1).is_some_and(ElementId::is_valid));
}
