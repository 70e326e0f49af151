//! Triangulations and their combinatorics.
//!
//! This module provides the triangulation collaborator the cellular engine
//! reads from:
//! - [`Perm`] for facet gluings and sign bookkeeping
//! - [`Triangulation`] with its builders (isomorphism signatures, facet
//!   lists, lens spaces, orientable double covers)
//! - [`Skeleton`] enumerating faces, boundary and ideal vertices, local
//!   orientations and the rings of simplices around codimension-2 faces
//! - input validation

pub mod isosig;
pub mod perm;
pub mod skeleton;
pub mod triangulation;
pub mod validation;

pub use perm::{Perm, list_sign, sort_sign};
pub use skeleton::{FaceEmbedding, FaceLookup, Skeleton};
pub use triangulation::{Gluing, SimplexOrientation, Triangulation};
pub use validation::{TriangulationValidationOptions, ValidationHandling, validate_triangulation};
