//! Structural invariants of the engine's derived data.
//!
//! The checks are compiled in for debug builds and under the
//! `check-invariants` / `strict-invariants` features. The `force` arm of
//! [`debug_invariants!`](crate::debug_invariants) also runs them when a
//! runtime flag such as `EngineOptions::check_invariants` is set.

use crate::homology_error::HomologyError;

/// Validation of structural invariants (∂∂ = 0, closed relator cycles, ...).
pub trait DebugInvariants {
    /// Panic with an `[invariants]` diagnostic when a check fails.
    fn debug_assert_invariants(&self);
    /// First violated invariant, if any.
    fn validate_invariants(&self) -> Result<(), HomologyError>;
}

/// Abort on a violated invariant. A failure here is an engine bug, not a
/// user error.
#[doc(hidden)]
#[cold]
#[track_caller]
pub fn violation(context: &str, err: &HomologyError) -> ! {
    panic!("[invariants] {context}: {err}")
}

/// Run a fallible check and panic on error.
///
/// `debug_invariants!(check, "context")` runs when invariant checking is
/// compiled in; `debug_invariants!(force flag, check, "context")` also runs
/// when `flag` is true.
#[macro_export]
macro_rules! debug_invariants {
    (force $flag:expr, $expr:expr, $ctx:expr) => {
        if $flag || cfg!(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants")) {
            if let Err(e) = $expr {
                $crate::debug_invariants::violation($ctx, &e);
            }
        }
    };
    ($expr:expr, $ctx:expr) => {
        $crate::debug_invariants!(force false, $expr, $ctx)
    };
}
