//! Native stack growth for the recursive evaluator.
//!
//! Statements, expressions and calls all recurse on the native stack, and
//! spawned tasks start on a default-sized thread stack. Every statement
//! passes through [`ensure_sufficient_stack`], so recursion up to
//! `EvalConfig::max_call_depth` grows the stack instead of overflowing it.

/// Run `f`, first switching to a fresh stack segment if little is left.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    #[cfg(not(target_arch = "wasm32"))]
    {
        const RED_ZONE: usize = 128 * 1024;
        const SEGMENT: usize = 2 * 1024 * 1024;
        stacker::maybe_grow(RED_ZONE, SEGMENT, f)
    }
    #[cfg(target_arch = "wasm32")]
    {
        f()
    }
}
