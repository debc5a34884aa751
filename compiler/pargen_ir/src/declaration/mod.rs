//! Programmatic grammar declarations.
//!
//! A [`Declarations`] set describes a grammar the way it is written by
//! hand: declarations made of named phrases, phrases made of parts.
//!
//! ```text
//! Expr:
//!     plus = Expr '+' Term
//!     term = Term
//! Term:
//!     name = <any>
//! ```
//!
//! [`Declarations::link`] resolves names and produces a
//! [`GrammarTable`](crate::GrammarTable).

use std::sync::Arc;

use smallvec::SmallVec;

use crate::control::ParserControl;
use crate::element::{ElementArena, ElementId};
use crate::grammar::{EntryFlags, GrammarHooks, InlineMatchFn, JumpFn, TokenMatcher};
use crate::token::Token;

/// Ordered set of declarations making up one grammar.
pub struct Declarations<U> {
    pub(crate) decls: Vec<Declaration<U>>,
}

impl<U> Declarations<U> {
    pub fn new() -> Self {
        Declarations { decls: Vec::new() }
    }

    /// Start a phrase declaration.
    pub fn declare(&mut self, name: impl Into<Box<str>>) -> &mut Declaration<U> {
        self.push(Declaration {
            name: name.into(),
            alias: None,
            phrases: Vec::new(),
            hooks: GrammarHooks::default(),
        })
    }

    /// Declare `name` as another name for `target`.
    pub fn alias(
        &mut self,
        name: impl Into<Box<str>>,
        target: impl Into<Box<str>>,
    ) -> &mut Declaration<U> {
        self.push(Declaration {
            name: name.into(),
            alias: Some(target.into()),
            phrases: Vec::new(),
            hooks: GrammarHooks::default(),
        })
    }

    fn push(&mut self, decl: Declaration<U>) -> &mut Declaration<U> {
        self.decls.push(decl);
        let last = self.decls.len() - 1;
        &mut self.decls[last]
    }

    /// Most recent declaration named `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Declaration<U>> {
        self.decls.iter_mut().rev().find(|decl| *decl.name == *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration<U>> {
        self.decls.iter()
    }
}

impl<U> Default for Declarations<U> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Declaration<U> {
    pub(crate) name: Box<str>,
    pub(crate) alias: Option<Box<str>>,
    pub(crate) phrases: Vec<Phrase<U>>,
    pub(crate) hooks: GrammarHooks<U>,
}

impl<U> Declaration<U> {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phrases(&self) -> &[Phrase<U>] {
        &self.phrases
    }

    pub fn phrase(
        &mut self,
        name: impl Into<Box<str>>,
        parts: impl IntoIterator<Item = PhrasePart<U>>,
    ) -> &mut Self {
        self.phrase_for_variants(&[], name, parts)
    }

    /// Add a phrase that is only selected under one of `variants`.
    pub fn phrase_for_variants(
        &mut self,
        variants: &[&str],
        name: impl Into<Box<str>>,
        parts: impl IntoIterator<Item = PhrasePart<U>>,
    ) -> &mut Self {
        self.phrases.push(Phrase {
            name: name.into(),
            parts: parts.into_iter().collect(),
            variants: variants.iter().map(|v| Box::from(*v)).collect(),
        });
        self
    }

    pub fn on_begin(&mut self, f: impl Fn(&mut U) + Send + Sync + 'static) -> &mut Self {
        self.hooks.begin = Some(Arc::new(f));
        self
    }

    pub fn on_match(
        &mut self,
        f: impl Fn(ElementId, &mut dyn ParserControl, &mut U) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.hooks.match_fn = Some(Arc::new(f));
        self
    }

    pub fn on_accept(
        &mut self,
        f: impl Fn(Option<ElementId>, &mut dyn ParserControl, &mut U) + Send + Sync + 'static,
    ) -> &mut Self {
        self.hooks.accept = Some(Arc::new(f));
        self
    }
}

pub struct Phrase<U> {
    pub(crate) name: Box<str>,
    pub(crate) parts: Vec<PhrasePart<U>>,
    pub(crate) variants: SmallVec<[Box<str>; 1]>,
}

impl<U> Phrase<U> {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parts(&self) -> &[PhrasePart<U>] {
        &self.parts
    }
}

/// `(Declaration:Phrase@label)` continuation point of an upward jump.
pub struct UpwardsAnchor<U> {
    pub declaration: Box<str>,
    pub phrase: Box<str>,
    pub label: Box<str>,
    pub predicate: Option<JumpFn<U>>,
}

pub enum PartKind<U> {
    /// Reference to another declaration.
    Phrase(Box<str>),
    Token(TokenMatcher<U>),
    InlineMatch(InlineMatchFn<U>),
    Anchor(UpwardsAnchor<U>),
    /// Jump continuation point; produces no entry.
    Label(Box<str>),
}

pub struct PhrasePart<U> {
    pub(crate) kind: PartKind<U>,
    pub(crate) flags: EntryFlags,
    pub(crate) field: Option<Box<str>>,
    pub(crate) hooks: GrammarHooks<U>,
}

impl<U> PhrasePart<U> {
    fn new(kind: PartKind<U>) -> Self {
        PhrasePart {
            kind,
            flags: EntryFlags::empty(),
            field: None,
            hooks: GrammarHooks::default(),
        }
    }

    pub fn phrase(declaration: impl Into<Box<str>>) -> Self {
        Self::new(PartKind::Phrase(declaration.into()))
    }

    /// Literal token. Literals are matched but not stored unless named.
    pub fn token(text: impl Into<Box<str>>) -> Self {
        Self::new(PartKind::Token(TokenMatcher::Exact(text.into())))
    }

    pub fn any_token() -> Self {
        Self::new(PartKind::Token(TokenMatcher::Any))
    }

    pub fn predicate(f: impl Fn(&Token<'_>, &mut U) -> bool + Send + Sync + 'static) -> Self {
        Self::new(PartKind::Token(TokenMatcher::Predicate(Arc::new(f))))
    }

    pub fn inline(
        f: impl Fn(ElementId, &mut dyn ParserControl, &mut U) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::new(PartKind::InlineMatch(Arc::new(f)))
    }

    pub fn anchor(
        declaration: impl Into<Box<str>>,
        phrase: impl Into<Box<str>>,
        label: impl Into<Box<str>>,
    ) -> Self {
        Self::new(PartKind::Anchor(UpwardsAnchor {
            declaration: declaration.into(),
            phrase: phrase.into(),
            label: label.into(),
            predicate: None,
        }))
    }

    pub fn label(name: impl Into<Box<str>>) -> Self {
        Self::new(PartKind::Label(name.into()))
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.flags |= EntryFlags::OPTIONAL;
        self
    }

    #[must_use]
    pub fn sequence(mut self) -> Self {
        self.flags |= EntryFlags::SEQUENCE;
        self
    }

    /// Store the match in field `name` of the phrase's element.
    #[must_use]
    pub fn named(mut self, name: impl Into<Box<str>>) -> Self {
        self.field = Some(name.into());
        self
    }

    /// Gate an anchor's jump. Ignored on other parts.
    #[must_use]
    pub fn jump_if(
        mut self,
        f: impl Fn(ElementId, &ElementArena, &mut U) -> bool + Send + Sync + 'static,
    ) -> Self {
        if let PartKind::Anchor(anchor) = &mut self.kind {
            anchor.predicate = Some(Arc::new(f));
        }
        self
    }

    /// Veto hook of a token part's grammar. Ignored on other parts.
    #[must_use]
    pub fn on_match(
        mut self,
        f: impl Fn(ElementId, &mut dyn ParserControl, &mut U) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.hooks.match_fn = Some(Arc::new(f));
        self
    }

    /// Accept hook of a token part's grammar. Ignored on other parts.
    #[must_use]
    pub fn on_accept(
        mut self,
        f: impl Fn(Option<ElementId>, &mut dyn ParserControl, &mut U) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.accept = Some(Arc::new(f));
        self
    }

    #[inline]
    pub fn kind(&self) -> &PartKind<U> {
        &self.kind
    }

    #[inline]
    pub fn flags(&self) -> EntryFlags {
        self.flags
    }
}
