//! Grammar model.
//!
//! Four node kinds make up a grammar graph:
//!
//! - **Immediate**: matches exactly one token
//! - **Compound**: ordered sequence of [`GrammarEntry`]s
//! - **Switch**: ordered alternation with left-recursion support
//! - **Alias**: transparent indirection to another grammar
//!
//! A [`GrammarTable`] is built once (normally by linking
//! [`Declarations`](crate::Declarations)), annotated once by the
//! optimizer, and read-only for every parse after that. Callbacks are
//! `Arc<dyn Fn + Send + Sync>`, so a table can be shared between
//! threads and parsed concurrently.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::control::ParserControl;
use crate::element::{ElementArena, ElementFactory, ElementId};
use crate::error::GrammarError;
use crate::grammar_id::GrammarId;
use crate::token::Token;

/// Fired when a grammar occurrence is first entered.
pub type BeginFn<U> = Arc<dyn Fn(&mut U) + Send + Sync>;

/// Veto gate over a syntactically matched element.
pub type MatchFn<U> = Arc<dyn Fn(ElementId, &mut dyn ParserControl, &mut U) -> bool + Send + Sync>;

/// Acceptance notification; `None` for an optional occurrence that did
/// not match.
pub type AcceptFn<U> =
    Arc<dyn Fn(Option<ElementId>, &mut dyn ParserControl, &mut U) + Send + Sync>;

/// Compound entry evaluated in place, with no grammar of its own.
pub type InlineMatchFn<U> = MatchFn<U>;

/// Gates whether a recorded upward jump is taken.
pub type JumpFn<U> = Arc<dyn Fn(ElementId, &ElementArena, &mut U) -> bool + Send + Sync>;

/// User-supplied single-token matcher.
pub type TokenPredicate<U> = Arc<dyn Fn(&Token<'_>, &mut U) -> bool + Send + Sync>;

/// Optional callbacks attached to a grammar node.
pub struct GrammarHooks<U> {
    pub begin: Option<BeginFn<U>>,
    pub match_fn: Option<MatchFn<U>>,
    pub accept: Option<AcceptFn<U>>,
}

impl<U> GrammarHooks<U> {
    pub fn is_empty(&self) -> bool {
        self.begin.is_none() && self.match_fn.is_none() && self.accept.is_none()
    }
}

impl<U> Default for GrammarHooks<U> {
    fn default() -> Self {
        GrammarHooks {
            begin: None,
            match_fn: None,
            accept: None,
        }
    }
}

impl<U> Clone for GrammarHooks<U> {
    fn clone(&self) -> Self {
        GrammarHooks {
            begin: self.begin.clone(),
            match_fn: self.match_fn.clone(),
            accept: self.accept.clone(),
        }
    }
}

impl<U> fmt::Debug for GrammarHooks<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarHooks")
            .field("begin", &self.begin.is_some())
            .field("match_fn", &self.match_fn.is_some())
            .field("accept", &self.accept.is_some())
            .finish()
    }
}

/// How an Immediate grammar recognizes its token.
pub enum TokenMatcher<U> {
    Exact(Box<str>),
    Any,
    Predicate(TokenPredicate<U>),
}

impl<U> TokenMatcher<U> {
    pub fn matches(&self, token: &Token<'_>, user: &mut U) -> bool {
        match self {
            TokenMatcher::Exact(text) => **text == *token.text,
            TokenMatcher::Any => true,
            TokenMatcher::Predicate(predicate) => predicate(token, user),
        }
    }
}

impl<U> Clone for TokenMatcher<U> {
    fn clone(&self) -> Self {
        match self {
            TokenMatcher::Exact(text) => TokenMatcher::Exact(text.clone()),
            TokenMatcher::Any => TokenMatcher::Any,
            TokenMatcher::Predicate(predicate) => TokenMatcher::Predicate(Arc::clone(predicate)),
        }
    }
}

impl<U> fmt::Debug for TokenMatcher<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenMatcher::Exact(text) => write!(f, "Exact({text:?})"),
            TokenMatcher::Any => f.write_str("Any"),
            TokenMatcher::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

bitflags! {
    /// Flags of a sub-grammar entry inside a compound.
    #[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Debug)]
    pub struct EntryFlags: u8 {
        /// The entry may match nothing.
        const OPTIONAL = 1 << 0;
        /// The entry repeats its grammar until it stops matching.
        const SEQUENCE = 1 << 1;
    }
}

/// Reference to a sub-grammar from a compound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubgrammarEntry {
    pub grammar: GrammarId,
    pub flags: EntryFlags,
    /// Field of the compound's element the match is assigned to.
    pub field: Option<usize>,
}

impl SubgrammarEntry {
    #[inline]
    pub fn is_optional(&self) -> bool {
        self.flags.contains(EntryFlags::OPTIONAL)
    }

    #[inline]
    pub fn is_sequence(&self) -> bool {
        self.flags.contains(EntryFlags::SEQUENCE)
    }
}

/// Upward jump directive: continue in alternative `switch_index` of
/// `switch`, at entry `compound_index` of that alternative.
///
/// `compound_index` may equal the alternative's entry count, meaning
/// "continue at the end".
pub struct JumpEntry<U> {
    pub switch: GrammarId,
    pub switch_index: usize,
    pub compound_index: usize,
    pub predicate: Option<JumpFn<U>>,
}

pub enum GrammarEntry<U> {
    Subgrammar(SubgrammarEntry),
    InlineMatch(InlineMatchFn<U>),
    Jump(JumpEntry<U>),
}

impl<U> GrammarEntry<U> {
    pub fn as_subgrammar(&self) -> Option<&SubgrammarEntry> {
        match self {
            GrammarEntry::Subgrammar(sub) => Some(sub),
            _ => None,
        }
    }
}

impl<U> fmt::Debug for GrammarEntry<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarEntry::Subgrammar(sub) => sub.fmt(f),
            GrammarEntry::InlineMatch(_) => f.write_str("InlineMatch"),
            GrammarEntry::Jump(jump) => f
                .debug_struct("Jump")
                .field("switch", &jump.switch)
                .field("switch_index", &jump.switch_index)
                .field("compound_index", &jump.compound_index)
                .finish_non_exhaustive(),
        }
    }
}

pub struct CompoundGrammar<U> {
    pub entries: Vec<GrammarEntry<U>>,
    pub factory: ElementFactory,
}

impl<U> CompoundGrammar<U> {
    /// Index of the first entry that is not an inline match.
    pub fn first_subgrammar_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| !matches!(entry, GrammarEntry::InlineMatch(_)))
    }

    /// First non-inline entry, if it references a grammar.
    ///
    /// A compound alternative whose first sub-grammar is its own switch
    /// is left-recursive.
    pub fn first_subgrammar(&self) -> Option<&SubgrammarEntry> {
        self.first_subgrammar_index()
            .and_then(|index| self.entries[index].as_subgrammar())
    }
}

/// Single-token lookahead set of a switch alternative.
pub struct Transitions<U> {
    pub tokens: FxHashSet<Box<str>>,
    pub predicates: Vec<TokenPredicate<U>>,
    /// Any token (or none) may start the alternative; never prune it.
    pub any: bool,
}

impl<U> Transitions<U> {
    pub fn accepts(&self, token: &Token<'_>, user: &mut U) -> bool {
        self.any
            || self.predicates.iter().any(|predicate| predicate(token, user))
            || self.tokens.contains(token.text)
    }
}

impl<U> Default for Transitions<U> {
    fn default() -> Self {
        Transitions {
            tokens: FxHashSet::default(),
            predicates: Vec::new(),
            any: false,
        }
    }
}

pub struct SwitchEntry<U> {
    pub grammar: GrammarId,
    pub variants: SmallVec<[Box<str>; 1]>,
    /// Set by the optimizer; `None` means the alternative is never pruned.
    pub transitions: Option<Transitions<U>>,
}

pub struct SwitchGrammar<U> {
    pub entries: Vec<SwitchEntry<U>>,
}

pub enum GrammarKind<U> {
    Immediate(TokenMatcher<U>),
    Compound(CompoundGrammar<U>),
    Switch(SwitchGrammar<U>),
    Alias(GrammarId),
}

impl<U> GrammarKind<U> {
    pub fn label(&self) -> &'static str {
        match self {
            GrammarKind::Immediate(_) => "immediate",
            GrammarKind::Compound(_) => "compound",
            GrammarKind::Switch(_) => "switch",
            GrammarKind::Alias(_) => "alias",
        }
    }
}

pub struct Grammar<U> {
    pub name: Box<str>,
    pub kind: GrammarKind<U>,
    pub hooks: GrammarHooks<U>,
    /// Set once the optimizer has visited this node.
    pub optimized: bool,
}

impl<U> Grammar<U> {
    pub fn new(name: impl Into<Box<str>>, kind: GrammarKind<U>) -> Self {
        Grammar {
            name: name.into(),
            kind,
            hooks: GrammarHooks::default(),
            optimized: false,
        }
    }

    pub fn as_compound(&self) -> Option<&CompoundGrammar<U>> {
        match &self.kind {
            GrammarKind::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    pub fn as_switch(&self) -> Option<&SwitchGrammar<U>> {
        match &self.kind {
            GrammarKind::Switch(switch) => Some(switch),
            _ => None,
        }
    }
}

impl<U> fmt::Debug for Grammar<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("kind", &self.kind.label())
            .field("optimized", &self.optimized)
            .finish_non_exhaustive()
    }
}

/// Arena of grammar nodes with a by-name index of declared rules.
pub struct GrammarTable<U> {
    grammars: Vec<Grammar<U>>,
    by_name: FxHashMap<Box<str>, GrammarId>,
}

impl<U> GrammarTable<U> {
    pub fn new() -> Self {
        GrammarTable {
            grammars: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Add a node. Only nodes added with `named = true` are reachable
    /// through [`lookup`](Self::lookup).
    ///
    /// A table holds at most `u32::MAX` nodes; the last id is the
    /// [`GrammarId::INVALID`] sentinel.
    pub fn push(&mut self, grammar: Grammar<U>, named: bool) -> Result<GrammarId, GrammarError> {
        let id = GrammarId::from_index(self.grammars.len()).ok_or(GrammarError::TooManyGrammars)?;
        if named {
            self.by_name.insert(grammar.name.clone(), id);
        }
        self.grammars.push(grammar);
        Ok(id)
    }

    /// # Panics
    /// Panics if `id` does not belong to this table.
    #[inline]
    pub fn get(&self, id: GrammarId) -> &Grammar<U> {
        &self.grammars[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: GrammarId) -> &mut Grammar<U> {
        &mut self.grammars[id.index()]
    }

    #[inline]
    pub fn try_get(&self, id: GrammarId) -> Option<&Grammar<U>> {
        self.grammars.get(id.index())
    }

    pub fn lookup(&self, name: &str) -> Option<GrammarId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn name(&self, id: GrammarId) -> &str {
        self.try_get(id).map_or("<invalid>", |g| &g.name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = GrammarId> {
        (0..self.grammars.len()).filter_map(GrammarId::from_index)
    }
}

impl<U> Default for GrammarTable<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> fmt::Debug for GrammarTable<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.grammars).finish()
    }
}
