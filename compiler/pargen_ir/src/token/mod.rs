//! Token stream interface.
//!
//! The engine consumes tokens strictly left to right and only rewinds
//! through an explicit [`StreamPos`]. Anything else about tokenization
//! (lexing, file positions) belongs to the stream implementation.

/// Opaque, O(1)-restorable position in a [`TokenStream`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamPos(usize);

impl StreamPos {
    #[inline]
    pub const fn new(offset: usize) -> Self {
        StreamPos(offset)
    }

    #[inline]
    pub const fn offset(self) -> usize {
        self.0
    }
}

/// A token borrowed from its stream.
///
/// `payload` is an opaque per-token value the stream may attach (a
/// symbol id, a source offset, ...). The engine copies it into token
/// elements without interpreting it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub payload: Option<u32>,
}

impl<'a> Token<'a> {
    #[inline]
    pub const fn new(text: &'a str) -> Self {
        Token {
            text,
            payload: None,
        }
    }
}

/// Source of tokens for the parsing engine.
pub trait TokenStream {
    /// Consume the next token, or `None` at end of input.
    fn next_token(&mut self) -> Option<Token<'_>>;

    /// Current position; restoring it with [`set_position`](Self::set_position)
    /// replays the same tokens.
    fn position(&self) -> StreamPos;

    fn set_position(&mut self, pos: StreamPos);
}

/// A token owned by a [`TokenList`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedToken {
    pub text: Box<str>,
    pub payload: Option<u32>,
}

/// In-memory token stream.
///
/// Positions are plain indices, so save/restore is free.
#[derive(Clone, Debug, Default)]
pub struct TokenList {
    tokens: Vec<OwnedToken>,
    cursor: usize,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `input` on whitespace, one token per word.
    pub fn from_words(input: &str) -> Self {
        let mut list = Self::new();
        for word in input.split_whitespace() {
            list.push(word, None);
        }
        list
    }

    pub fn push(&mut self, text: impl Into<Box<str>>, payload: Option<u32>) {
        self.tokens.push(OwnedToken {
            text: text.into(),
            payload,
        });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens not yet consumed.
    pub fn remaining(&self) -> &[OwnedToken] {
        self.tokens.get(self.cursor..).unwrap_or_default()
    }
}

impl TokenStream for TokenList {
    fn next_token(&mut self) -> Option<Token<'_>> {
        let token = self.tokens.get(self.cursor)?;
        self.cursor += 1;
        Some(Token {
            text: &token.text,
            payload: token.payload,
        })
    }

    #[inline]
    fn position(&self) -> StreamPos {
        StreamPos::new(self.cursor)
    }

    #[inline]
    fn set_position(&mut self, pos: StreamPos) {
        self.cursor = pos.offset().min(self.tokens.len());
    }
}
