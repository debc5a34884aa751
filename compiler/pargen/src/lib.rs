//! Grammar-driven backtracking parser engine.
//!
//! `pargen` parses a token stream against a grammar built at runtime
//! from [`Declarations`]. Grammars may be directly left-recursive, may
//! carry semantic callbacks that veto matches or rewind the parse, and
//! may jump back up into an enclosing alternative once a later token
//! disambiguates what was being parsed. Entries reached through such a
//! jump report to their hooks but leave no elements in the tree; see
//! [`ParseOutput`].
//!
//! # Example
//!
//! ```
//! use pargen::{CompiledGrammar, Declarations, ParserConfig, PhrasePart as P, TokenList};
//!
//! let mut decls = Declarations::<()>::new();
//! decls
//!     .declare("Sum")
//!     .phrase("add", [P::phrase("Sum").named("left"), P::token("+"), P::any_token().named("right")])
//!     .phrase("one", [P::any_token().named("value")]);
//!
//! let grammar = CompiledGrammar::new(decls, "Sum").unwrap();
//! let mut tokens = TokenList::from_words("1 + 2 + 3");
//! let output = grammar.parse(&mut tokens, &mut (), &ParserConfig::default()).unwrap();
//! assert!(output.is_complete());
//! ```
//!
//! The grammar model lives in `pargen_ir`, the engine in
//! `pargen_parse`; this crate re-exports both.

use std::sync::Once;

pub use pargen_ir::{
    AcceptFn, BeginFn, CompoundElement, ControlError, Declaration, Declarations, Element,
    ElementArena, ElementDisplay, ElementId, ElementLayout, FieldDef, FieldKind, FieldValue,
    GrammarError, GrammarId, GrammarKind, GrammarTable, JumpFn, MatchFn, OwnedToken, ParserControl,
    PartKind, Phrase, PhrasePart, PositionMarker, StreamPos, Token, TokenElement, TokenList,
    TokenStream, UpwardsAnchor,
};
pub use pargen_parse::{
    optimize, parse, parse_with_lookup, EngineError, LookupData, ParseOutput, ParseStats,
    ParserConfig,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=pargen_parse=debug` or `RUST_LOG=pargen_parse=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};
        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .init();
        }
    });
}

/// A linked, optimized grammar together with its root.
///
/// Shareable between threads when the declaration callbacks and the
/// user type allow it; every parse keeps its own state.
pub struct CompiledGrammar<U> {
    table: GrammarTable<U>,
    root: GrammarId,
}

impl<U> CompiledGrammar<U> {
    /// Link `decls`, resolve `root` and run the optimizer from it.
    #[tracing::instrument(level = "debug", skip_all, fields(root = root))]
    pub fn new(decls: Declarations<U>, root: &str) -> Result<Self, GrammarError> {
        let mut table = decls.link()?;
        let root_id = table
            .lookup(root)
            .ok_or_else(|| GrammarError::UnknownRoot(root.into()))?;
        optimize(&mut table, root_id);
        Ok(CompiledGrammar {
            table,
            root: root_id,
        })
    }

    #[inline]
    pub fn table(&self) -> &GrammarTable<U> {
        &self.table
    }

    #[inline]
    pub fn root(&self) -> GrammarId {
        self.root
    }

    pub fn parse(
        &self,
        stream: &mut dyn TokenStream,
        user: &mut U,
        config: &ParserConfig,
    ) -> Result<ParseOutput, EngineError> {
        parse(&self.table, self.root, stream, user, config)
    }

    /// [`parse`](Self::parse) with user checkpoints kept in step with
    /// backtracking.
    pub fn parse_with_lookup(
        &self,
        stream: &mut dyn TokenStream,
        user: &mut U,
        config: &ParserConfig,
        lookup: &mut dyn LookupData,
    ) -> Result<ParseOutput, EngineError> {
        parse_with_lookup(&self.table, self.root, stream, user, config, lookup)
    }
}
