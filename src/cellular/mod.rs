//! The cellular homology engine.
//!
//! A triangulation is decomposed three ways (standard, dual and their common
//! barycentric refinement), each with boundary and relative variants. This
//! module builds the cell registries and boundary operators of those
//! decompositions and answers queries on top of them:
//! - homology and cohomology groups with any cyclic coefficients
//! - natural maps between decompositions, connecting maps, Poincaré duality
//! - evaluation, intersection and torsion linking forms
//! - presentations of π₁ and the Alexander module
//!
//! Every answer is memoized inside [`CellularData`].

pub mod adjacency;
pub mod alexander;
pub mod bilinear;
pub mod cache;
pub mod cells;
pub mod chain_maps;
pub mod coordinates;
pub mod dual_graph;
pub mod engine;
pub mod fundamental_group;
pub mod groups;
pub mod linking;
pub mod max_tree;
pub mod sparse_grid;

pub use alexander::AlexanderModule;
pub use bilinear::BilinearForm;
pub use cells::{CellRegistry, MixCell, StdCell};
pub use coordinates::{
    BoolRequest, CoordinateSystem, FormKind, FormLocator, GroupLocator, HomLocator,
    PresentationLocator, StringRequest, Variance,
};
pub use engine::{CellularData, EngineOptions};
pub use fundamental_group::Pi1Data;
pub use linking::LinkingInvariants;
