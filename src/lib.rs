#![cfg_attr(docsrs, feature(doc_cfg))]
//! # cellular-homology
//!
//! cellular-homology computes algebraic invariants of triangulated 3- and
//! 4-manifolds, closed, bounded or cusped (ideal vertices). A triangulation
//! is decomposed three ways and every query is answered exactly over ℤ or
//! `ℤ/m`.
//!
//! ## Features
//! - Standard, dual and mixed (barycentric) cell decompositions, each with
//!   boundary and relative-to-boundary variants
//! - Homology and cohomology groups with chain-level coordinates
//! - Natural maps between decompositions, connecting maps of the long exact
//!   sequence, Poincaré duality
//! - Evaluation, intersection and torsion linking forms, with the
//!   Kawauchi–Kojima classification of linking forms
//! - Presentations of π₁ of the manifold and of each boundary component,
//!   Alexander ideals when `b₁ = 1`
//!
//! ## Determinism
//!
//! Every construction is deterministic: cells, generators and relators are
//! numbered by the skeleton's face order, so two engines built from the same
//! triangulation agree coordinate for coordinate.
//!
//! ## Caching
//!
//! [`CellularData`](cellular::CellularData) memoizes every answer, failures
//! included. Results are handed out behind `Arc` and stay valid for the
//! lifetime of the engine.
//!
//! ## Usage
//!
//! ```no_run
//! use cellular_homology::prelude::*;
//!
//! # fn main() -> Result<(), HomologyError> {
//! let tri = Triangulation::from_isosig("bkaajn", 3)?;
//! let data = CellularData::new(&tri)?;
//! let h1 = data.unmarked_group(&GroupLocator::homology(1, CoordinateSystem::Std))?;
//! println!("{h1}");
//! # Ok(())
//! # }
//! ```

pub mod algebra;
pub mod cellular;
pub mod debug_invariants;
pub mod homology_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use homology_error::HomologyError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algebra::{
        AbelianGroup, GroupPresentation, HomGroupPresentation, HomMarkedAbelianGroup, IntMatrix,
        LaurentPoly, MarkedAbelianGroup, PolyMatrix,
    };
    pub use crate::cellular::{
        BilinearForm, BoolRequest, CellularData, CoordinateSystem, EngineOptions, FormKind,
        FormLocator, GroupLocator, HomLocator, PresentationLocator, StringRequest, Variance,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::homology_error::HomologyError;
    pub use crate::topology::{Perm, Skeleton, Triangulation};
}
