//! Engine errors.
//!
//! These indicate a table that does not hold together (a grammar id of
//! the wrong kind, a jump to a missing alternative) or a broken step
//! stack. Failing to parse the input is not an error; it is reported
//! through [`ParseOutput`](crate::ParseOutput).

use pargen_ir::{ElementId, GrammarId};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("grammar {0:?} is not part of the table")]
    UnknownGrammar(GrammarId),

    #[error("grammar `{grammar}` is not a {expected} grammar")]
    KindMismatch {
        grammar: Box<str>,
        expected: &'static str,
    },

    #[error("no step at depth {0} of the expected kind")]
    StepMismatch(usize),

    #[error("element arena is full")]
    ElementLimit,

    #[error("element {0:?} is missing or not a compound")]
    StaleElement(ElementId),

    #[error("jump target `{switch}` has no alternative {index}")]
    BadJumpTarget { switch: Box<str>, index: usize },
}
