//! Exact algebra over ℤ: matrices, Smith normal form, abelian groups and their
//! homomorphisms, group presentations, and Laurent polynomials.

pub mod abelian_group;
pub mod hom;
pub mod laurent;
pub mod matrix;
pub mod presentation;
pub mod smith;

pub use abelian_group::{AbelianGroup, MarkedAbelianGroup};
pub use hom::HomMarkedAbelianGroup;
pub use laurent::{LaurentPoly, PolyMatrix};
pub use matrix::IntMatrix;
pub use presentation::{GroupPresentation, HomGroupPresentation, Word};
pub use smith::SmithForm;
