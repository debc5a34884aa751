//! Engine surface exposed to grammar callbacks.

use smallvec::SmallVec;

use crate::element::{ElementArena, ElementLevel, FieldValue};
use crate::token::StreamPos;

/// Snapshot of an in-progress compound step, taken by
/// [`ParserControl::position`].
///
/// Restoring it pops every step pushed since, rewinds the token stream
/// and replays the compound from the saved entry. The fields are engine
/// bookkeeping; callers should treat the marker as opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionMarker {
    pub depth: usize,
    pub serial: u64,
    pub stream_pos: StreamPos,
    pub next_entry: usize,
    pub got_nonoptional_match: bool,
    /// Entry index of an upward jump recorded before the mark.
    pub pending_jump: Option<usize>,
    pub go_right_count: usize,
    pub element_level: ElementLevel,
    pub fields: SmallVec<[FieldValue; 4]>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("no compound step is active")]
    NotInCompound,

    #[error("position marker refers to a step that is no longer active")]
    StaleMarker,
}

/// Operations callbacks may perform on the running parse.
pub trait ParserControl {
    /// Toggle creation of token elements for subsequent matches.
    fn set_create_elements(&mut self, create: bool);

    /// Mark the current position inside the innermost compound step.
    fn position(&self) -> Result<PositionMarker, ControlError>;

    /// Rewind to `marker`. The engine resumes the marked compound once
    /// the calling callback returns; the callback's own verdict is
    /// ignored.
    fn set_position(&mut self, marker: &PositionMarker) -> Result<(), ControlError>;

    /// Select the switch variant used for subsequent alternative
    /// selection. An empty name selects the default variant.
    fn set_variant(&mut self, variant: &str);

    fn variant(&self) -> Option<&str>;

    fn elements(&self) -> &ElementArena;

    fn elements_mut(&mut self) -> &mut ElementArena;
}
