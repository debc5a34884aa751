//! Backtracking parsing engine for pargen grammars.
//!
//! The engine walks a linked [`GrammarTable`] over a [`TokenStream`]
//! using an explicit stack of parsing steps:
//!
//! - **Switches** try alternatives in order and grow left-recursive
//!   alternatives from a seed, so `Expr: Expr '+' Term | Term` parses
//!   `a + b + c` as `((a + b) + c)`.
//! - **Compounds** match entries in order, assigning each match to a
//!   field of the compound's element.
//! - **Negative cache** remembers grammars that failed at a token
//!   position; **forward transitions** (see [`optimize`]) skip
//!   alternatives that cannot start with the next token.
//! - **Upward jumps** let a nested rule continue directly inside an
//!   enclosing alternative.
//!
//! Grammar callbacks observe and steer the parse through
//! [`ParserControl`](pargen_ir::ParserControl).
//!
//! # Usage
//!
//! ```text
//! let mut table = decls.link()?;
//! let root = table.lookup("Expr").unwrap();
//! optimize(&mut table, root);
//! let mut tokens = TokenList::from_words("a + b + c");
//! let output = parse(&table, root, &mut tokens, &mut (), &ParserConfig::default())?;
//! ```

mod acceptor;
mod config;
mod engine;
mod error;
mod lookup;
mod negative_cache;
mod optimize;
mod output;
mod stack;
mod state;
mod step;

pub use config::ParserConfig;
pub use error::EngineError;
pub use lookup::LookupData;
pub use optimize::optimize;
pub use output::{ParseOutput, ParseStats};

use pargen_ir::{GrammarId, GrammarTable, TokenStream};

use crate::engine::Parser;

/// Parse `stream` against grammar `root` of `table`.
///
/// Returns `Ok` whether or not the input matched; see
/// [`ParseOutput::matched`]. An `Err` means the table itself is
/// inconsistent.
#[tracing::instrument(level = "debug", skip_all, fields(root = table.name(root)))]
pub fn parse<U>(
    table: &GrammarTable<U>,
    root: GrammarId,
    stream: &mut dyn TokenStream,
    user: &mut U,
    config: &ParserConfig,
) -> Result<ParseOutput, EngineError> {
    Parser::new(table, config, stream, user, None).run(root)
}

/// [`parse`], keeping `lookup` in step with backtracking.
#[tracing::instrument(level = "debug", skip_all, fields(root = table.name(root)))]
pub fn parse_with_lookup<U>(
    table: &GrammarTable<U>,
    root: GrammarId,
    stream: &mut dyn TokenStream,
    user: &mut U,
    config: &ParserConfig,
    lookup: &mut dyn LookupData,
) -> Result<ParseOutput, EngineError> {
    Parser::new(table, config, stream, user, Some(lookup)).run(root)
}

#[cfg(test)]
mod tests;
