//! Parse elements and the arena they live in.
//!
//! # Design
//!
//! Elements are allocated from a single [`ElementArena`] per parse. The
//! engine records the arena [`ElementLevel`] when it pushes a step and
//! truncates back to it when that step fails, so a failed branch and its
//! whole subtree disappear in O(1) without per-element frees.
//!
//! Elements refer to their children by [`ElementId`]. Ids handed out
//! after a truncation reuse slots, so an id is only meaningful while the
//! step that produced it is alive or after it matched.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

/// Index into an [`ElementArena`].
#[derive(Copy, Clone, Eq, PartialEq)]
#[repr(transparent)]
pub struct ElementId(u32);

impl ElementId {
    /// Invalid element ID (sentinel value).
    pub const INVALID: ElementId = ElementId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        ElementId(index)
    }

    /// Id of arena slot `index`, if it lies below the sentinel.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .map(ElementId)
            .filter(|id| id.is_valid())
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Hash for ElementId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "ElementId({})", self.0)
        } else {
            write!(f, "ElementId::INVALID")
        }
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Saved arena watermark.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ElementLevel(usize);

/// Whether a compound field holds one element or a list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Single,
    List,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: Box<str>,
    pub kind: FieldKind,
}

/// Shape shared by every element a compound grammar produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementLayout {
    name: Box<str>,
    fields: Vec<FieldDef>,
}

impl ElementLayout {
    pub fn new(name: impl Into<Box<str>>, fields: Vec<FieldDef>) -> Self {
        ElementLayout {
            name: name.into(),
            fields,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| &*f.name == name)
    }
}

/// Element-construction function of a compound grammar.
#[derive(Clone, Debug)]
pub struct ElementFactory {
    layout: Arc<ElementLayout>,
}

impl ElementFactory {
    pub fn new(layout: ElementLayout) -> Self {
        ElementFactory {
            layout: Arc::new(layout),
        }
    }

    #[inline]
    pub fn layout(&self) -> &ElementLayout {
        &self.layout
    }

    pub fn create(&self) -> CompoundElement {
        let fields = self
            .layout
            .fields
            .iter()
            .map(|def| match def.kind {
                FieldKind::Single => FieldValue::Single(None),
                FieldKind::List => FieldValue::List(SmallVec::new()),
            })
            .collect();
        CompoundElement {
            layout: Arc::clone(&self.layout),
            fields,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Single(Option<ElementId>),
    List(SmallVec<[ElementId; 2]>),
}

/// Element produced by a compound grammar.
#[derive(Clone, Debug)]
pub struct CompoundElement {
    layout: Arc<ElementLayout>,
    fields: SmallVec<[FieldValue; 4]>,
}

impl CompoundElement {
    #[inline]
    pub fn name(&self) -> &str {
        self.layout.name()
    }

    #[inline]
    pub fn layout(&self) -> &ElementLayout {
        &self.layout
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.layout
            .field_index(name)
            .and_then(|index| self.fields.get(index))
    }

    /// The element in single-valued field `name`, if set.
    pub fn get(&self, name: &str) -> Option<ElementId> {
        match self.field(name)? {
            FieldValue::Single(value) => *value,
            FieldValue::List(_) => None,
        }
    }

    /// The elements in list field `name`; empty for unknown fields.
    pub fn list(&self, name: &str) -> &[ElementId] {
        match self.field(name) {
            Some(FieldValue::List(items)) => items,
            _ => &[],
        }
    }

    #[inline]
    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    /// Route `value` into field `index`: single fields are overwritten
    /// (and cleared by `None`), list fields append.
    pub fn assign(&mut self, index: usize, value: Option<ElementId>) {
        match self.fields.get_mut(index) {
            Some(FieldValue::Single(slot)) => *slot = value,
            Some(FieldValue::List(items)) => items.extend(value),
            None => {}
        }
    }

    /// Replace all field values, keeping the layout.
    pub fn restore_fields(&mut self, fields: &[FieldValue]) {
        self.fields = fields.iter().cloned().collect();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenElement {
    pub text: Box<str>,
    pub payload: Option<u32>,
}

#[derive(Clone, Debug)]
pub enum Element {
    Token(TokenElement),
    Compound(CompoundElement),
}

impl Element {
    pub fn as_compound(&self) -> Option<&CompoundElement> {
        match self {
            Element::Compound(compound) => Some(compound),
            Element::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&TokenElement> {
        match self {
            Element::Token(token) => Some(token),
            Element::Compound(_) => None,
        }
    }
}

/// LIFO arena of parse elements.
#[derive(Clone, Debug, Default)]
pub struct ElementArena {
    elements: Vec<Element>,
}

impl ElementArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `element`. Returns `None` once the arena holds `u32::MAX`
    /// elements, the last id being the [`ElementId::INVALID`] sentinel.
    pub fn alloc(&mut self, element: Element) -> Option<ElementId> {
        let id = ElementId::from_index(self.elements.len())?;
        self.elements.push(element);
        Some(id)
    }

    #[inline]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.index())
    }

    #[inline]
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.index())
    }

    pub fn compound(&self, id: ElementId) -> Option<&CompoundElement> {
        self.get(id).and_then(Element::as_compound)
    }

    pub fn compound_mut(&mut self, id: ElementId) -> Option<&mut CompoundElement> {
        match self.get_mut(id)? {
            Element::Compound(compound) => Some(compound),
            Element::Token(_) => None,
        }
    }

    pub fn token(&self, id: ElementId) -> Option<&TokenElement> {
        self.get(id).and_then(Element::as_token)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn level(&self) -> ElementLevel {
        ElementLevel(self.elements.len())
    }

    /// Drop every element allocated since `level` was taken.
    pub fn truncate(&mut self, level: ElementLevel) {
        self.elements.truncate(level.0);
    }

    /// Render the subtree rooted at `id`.
    ///
    /// Tokens render as their text, compounds as
    /// `Name(field: value, list: [a, b])` with `_` for empty slots.
    pub fn display(&self, id: ElementId) -> ElementDisplay<'_> {
        ElementDisplay { arena: self, id }
    }
}

pub struct ElementDisplay<'a> {
    arena: &'a ElementArena,
    id: ElementId,
}

impl ElementDisplay<'_> {
    fn child(&self, id: ElementId) -> Self {
        ElementDisplay {
            arena: self.arena,
            id,
        }
    }
}

impl fmt::Display for ElementDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compound = match self.arena.get(self.id) {
            None => return write!(f, "<stale {:?}>", self.id),
            Some(Element::Token(token)) => return f.write_str(&token.text),
            Some(Element::Compound(compound)) => compound,
        };

        write!(f, "{}(", compound.name())?;
        for (i, (def, value)) in compound
            .layout
            .fields
            .iter()
            .zip(compound.fields.iter())
            .enumerate()
        {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: ", def.name)?;
            match value {
                FieldValue::Single(None) => f.write_str("_")?,
                FieldValue::Single(Some(id)) => write!(f, "{}", self.child(*id))?,
                FieldValue::List(items) => {
                    f.write_str("[")?;
                    for (j, id) in items.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", self.child(*id))?;
                    }
                    f.write_str("]")?;
                }
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests;
