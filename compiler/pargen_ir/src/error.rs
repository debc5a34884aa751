//! Link-time grammar errors.
//!
//! Every variant is an inconsistency in the declarations themselves,
//! never in parser input. The linker reports the first one it finds.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("declaration `{0}` is declared more than once")]
    DuplicateDeclaration(Box<str>),

    #[error("declaration `{0}` has no phrases")]
    EmptyDeclaration(Box<str>),

    #[error("alias `{0}` cannot declare phrases")]
    AliasWithPhrases(Box<str>),

    #[error("`{referrer}` refers to unknown declaration `{name}`")]
    UnknownDeclaration { referrer: Box<str>, name: Box<str> },

    #[error("declaration `{declaration}` has no phrase `{phrase}`")]
    UnknownPhrase {
        declaration: Box<str>,
        phrase: Box<str>,
    },

    #[error("phrase `{declaration}:{phrase}` has no label `{label}`")]
    UnknownLabel {
        declaration: Box<str>,
        phrase: Box<str>,
        label: Box<str>,
    },

    #[error("label `{label}` appears twice in `{element}`")]
    DuplicateLabel { element: Box<str>, label: Box<str> },

    #[error("jump target `{0}` must declare more than one phrase")]
    JumpTargetNotSwitch(Box<str>),

    #[error("field `{field}` appears twice in `{element}`; name one of the parts")]
    DuplicateField { element: Box<str>, field: Box<str> },

    #[error("alias `{0}` is part of an alias cycle")]
    AliasCycle(Box<str>),

    #[error("`{0}` is left-recursive but declares a single phrase")]
    LeftRecursiveCompound(Box<str>),

    #[error("left-recursive phrase `{0}` starts with an inline match")]
    LeadingInlineMatch(Box<str>),

    #[error("left-recursive phrase `{0}` refers to its declaration through an alias")]
    IndirectLeftRecursion(Box<str>),

    #[error("root `{0}` is not a declared grammar")]
    UnknownRoot(Box<str>),

    #[error("grammar table is full")]
    TooManyGrammars,
}
