//! Grammar model and parse-element types for pargen.
//!
//! This crate holds everything the parsing engine consumes but does not
//! drive itself:
//!
//! - [`GrammarTable`]: the immutable, shared grammar graph (Immediate,
//!   Compound, Switch and Alias nodes addressed by [`GrammarId`])
//! - [`ElementArena`]: the LIFO arena parse elements are allocated from
//! - [`TokenStream`]: the narrow token source interface, plus the
//!   in-memory [`TokenList`]
//! - [`ParserControl`]: the engine surface exposed to grammar callbacks
//! - [`Declarations`]: programmatic grammar declarations and the linker
//!   that resolves them into a [`GrammarTable`]
//!
//! # Design
//!
//! The grammar graph is cyclic, so nodes never own each other. Every
//! cross-reference is a [`GrammarId`] resolved once at link time and
//! never re-validated during parsing.

mod control;
mod declaration;
mod element;
mod error;
mod grammar;
mod grammar_id;
mod link;
mod token;

pub use control::{ControlError, ParserControl, PositionMarker};
pub use declaration::{Declaration, Declarations, Phrase, PhrasePart, PartKind, UpwardsAnchor};
pub use element::{
    CompoundElement, Element, ElementArena, ElementDisplay, ElementFactory, ElementId,
    ElementLayout, ElementLevel, FieldDef, FieldKind, FieldValue, TokenElement,
};
pub use error::GrammarError;
pub use grammar::{
    AcceptFn, BeginFn, CompoundGrammar, EntryFlags, Grammar, GrammarEntry, GrammarHooks,
    GrammarKind, GrammarTable, InlineMatchFn, JumpEntry, JumpFn, MatchFn, SubgrammarEntry,
    SwitchEntry, SwitchGrammar, TokenMatcher, TokenPredicate, Transitions,
};
pub use grammar_id::GrammarId;
pub use token::{OwnedToken, StreamPos, Token, TokenList, TokenStream};
