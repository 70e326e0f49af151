//! HomologyError: unified error type for cellular-homology public APIs
//!
//! Every query of the engine returns `Result<_, HomologyError>`. A request the
//! engine cannot answer (out-of-range dimension, unsupported map or form,
//! failed precondition) surfaces as an `Err` and is memoized as such, so the
//! same request keeps failing for the lifetime of the engine.

use thiserror::Error;

use crate::cellular::coordinates::CoordinateSystem;

/// Unified error type for triangulation, algebra and engine operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HomologyError {
    /// The input triangulation violates a precondition (connected, valid gluings, dimension 3 or 4).
    #[error("invalid triangulation: {0}")]
    InvalidTriangulation(String),
    /// An isomorphism signature could not be decoded.
    #[error("invalid isomorphism signature: {0}")]
    InvalidIsosig(String),
    /// Requested dimension exceeds the top dimension of the coordinate system.
    #[error("dimension {dim} out of range for {system:?} (top dimension {top})")]
    DimOutOfRange {
        dim: usize,
        system: CoordinateSystem,
        top: usize,
    },
    /// No implemented natural map (or composition of them) matches the request.
    #[error("unsupported homomorphism: {0}")]
    UnsupportedHom(String),
    /// The form kind is not implemented for the requested coordinates.
    #[error("unsupported form: {0}")]
    UnsupportedForm(String),
    /// The Alexander module needs b₁(M) = 1.
    #[error("Alexander module requires b1 = 1, found b1 = {betti}")]
    AlexanderPrecondition { betti: usize },
    /// An integer-valued form was requested on a non-orientable manifold.
    #[error("integer-valued form requested on a non-orientable manifold")]
    NonOrientableZForm,
    /// Matrix or vector dimensions disagree.
    #[error("shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },
    /// An `i64` computation left the representable range.
    #[error("integer overflow during exact arithmetic")]
    ArithmeticOverflow,
    /// A chain handed to a homology routine is not a cycle.
    #[error("chain is not a cycle")]
    NotACycle,
    /// An integer linear system has no solution.
    #[error("linear system has no integer solution")]
    NoSolution,
    /// A cache entry was requested while it was still being built.
    #[error("re-entrant request for {0}")]
    ReentrantRequest(String),
}
