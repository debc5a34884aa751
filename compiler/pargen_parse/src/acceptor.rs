//! Where a matched element goes.

use pargen_ir::ElementId;

/// Slot of a parent step that receives a child's element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Non-left-recursive result of a switch; the left-recursion seed.
    SwitchSeed,
    /// Result of the switch alternative currently being tried.
    SwitchCurrent,
    Alias,
}

/// Destination of the element produced by a grammar occurrence.
///
/// Every destination is owned by a step or element below the child on
/// the stack, so it outlives the child.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Acceptor {
    Discard,
    /// Root of the parse.
    Root,
    /// Item list of the sequence step at this depth.
    List(usize),
    Slot(usize, Slot),
    /// Field of an in-progress compound element.
    Field { element: ElementId, field: usize },
}

impl Acceptor {
    /// Whether a delivered element is kept anywhere.
    #[inline]
    pub(crate) fn stores(self) -> bool {
        !matches!(self, Acceptor::Discard)
    }
}
