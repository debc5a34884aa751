//! Stack growth for the recursive grammar walks.
//!
//! The engine itself runs on an explicit step stack; only the optimizer
//! recurses over the grammar graph, whose depth is that of the grammar
//! rather than of the input.

const RED_ZONE: usize = 100 * 1024;

const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
