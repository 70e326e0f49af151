//! Homomorphisms between homology groups of different decompositions.
//!
//! Natural maps are the edges of a small graph on the nine coordinate
//! systems. Subdivision edges into MIX induce isomorphisms and may be walked
//! backwards through the inverse hom; inclusion and projection edges only
//! forwards. A request is answered by the shortest walk, composed with a
//! change of coefficients at the start. Connecting maps and Poincaré duality
//! change dimension and are matched directly.

use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::algebra::hom::HomMarkedAbelianGroup;
use crate::algebra::matrix::IntMatrix;
use crate::cellular::chain_maps::{
    connecting, dual_subdivision, poincare_matrix, shared_cells, subdivision,
};
use crate::cellular::coordinates::{
    CoordinateSystem, Family, GroupLocator, HomLocator, Part, Variance,
};
use crate::cellular::engine::CellularData;
use crate::homology_error::HomologyError;

use CoordinateSystem::*;

/// Chain maps `(from, to, induces an isomorphism)`. Dual boundary cells are
/// not cells of the dual decomposition, so `DualBdry` reaches `Dual` through
/// `MixBdry` and `Mix`.
const EDGES: [(CoordinateSystem, CoordinateSystem, bool); 11] = [
    (Std, Mix, true),
    (Dual, Mix, true),
    (StdBdry, MixBdry, true),
    (DualBdry, MixBdry, true),
    (StdRelBdry, MixRelBdry, true),
    (DualRelBdry, MixRelBdry, true),
    (StdBdry, Std, false),
    (MixBdry, Mix, false),
    (Dual, DualRelBdry, false),
    (Std, StdRelBdry, false),
    (Mix, MixRelBdry, false),
];

#[derive(Copy, Clone, Debug)]
struct Step {
    from: CoordinateSystem,
    to: CoordinateSystem,
    inverse: bool,
}

/// Walk from `start` to `goal` along the edges oriented for `variance`.
fn route(start: CoordinateSystem, goal: CoordinateSystem, variance: Variance) -> Option<Vec<Step>> {
    let mut arcs: Vec<(CoordinateSystem, CoordinateSystem, bool)> = Vec::new();
    for &(a, b, iso) in &EDGES {
        // cochain maps run against the chain maps
        let (a, b) = match variance {
            Variance::Covariant => (a, b),
            Variance::Contravariant => (b, a),
        };
        arcs.push((a, b, false));
        if iso {
            arcs.push((b, a, true));
        }
    }
    let mut prev: HashMap<CoordinateSystem, Step> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    while let Some(v) = queue.pop_front() {
        if v == goal {
            let mut path = Vec::new();
            let mut cur = goal;
            while cur != start {
                let step = prev[&cur];
                path.push(step);
                cur = step.from;
            }
            path.reverse();
            return Some(path);
        }
        for &(a, b, inverse) in &arcs {
            if a == v && b != start && !prev.contains_key(&b) {
                prev.insert(b, Step { from: a, to: b, inverse });
                queue.push_back(b);
            }
        }
    }
    None
}

fn unsupported(loc: &HomLocator) -> HomologyError {
    HomologyError::UnsupportedHom(loc.to_string())
}

impl CellularData {
    pub(crate) fn build_hom(&self, loc: &HomLocator) -> Result<HomMarkedAbelianGroup, HomologyError> {
        let (dom, rng) = (loc.domain, loc.range);
        if dom == rng {
            return HomMarkedAbelianGroup::identity(self.marked_group(&dom)?);
        }
        let (a, b) = (dom.modulus, rng.modulus);
        let divides = b == a || a == 0 || (b != 0 && a % b == 0);
        if !divides {
            return Err(unsupported(loc));
        }
        // 1. change of coefficients first
        let start = dom.with_modulus(b);
        let coeff = if a != b {
            Some(self.coefficient_change(&dom, &start)?)
        } else {
            None
        };
        // 2. the structural part at the range coefficients
        let structural = self.structural_hom(&HomLocator::new(start, rng))?;
        match coeff {
            Some(c) => structural.compose(&c),
            None => Ok(structural),
        }
    }

    fn coefficient_change(
        &self,
        from: &GroupLocator,
        to: &GroupLocator,
    ) -> Result<HomMarkedAbelianGroup, HomologyError> {
        let domain = self.marked_group(from)?;
        let range = self.marked_group(to)?;
        let n = domain.chain_dim();
        HomMarkedAbelianGroup::from_chain_map(domain, range, IntMatrix::identity(n))
    }

    fn structural_hom(&self, loc: &HomLocator) -> Result<HomMarkedAbelianGroup, HomologyError> {
        let (dom, rng) = (loc.domain, loc.range);
        if dom == rng {
            return HomMarkedAbelianGroup::identity(self.marked_group(&dom)?);
        }
        let n = self.ambient_dim();

        if dom.variance != rng.variance {
            // Poincaré duality: dual chains against standard cochains
            let pair = (dom.system, rng.system);
            let ok = dom.variance == Variance::Covariant
                && matches!(pair, (Dual, StdRelBdry) | (DualRelBdry, Std))
                && dom.dim <= n
                && rng.dim == n - dom.dim;
            if !ok {
                return Err(unsupported(loc));
            }
            if !self.is_orientable() && dom.modulus != 2 {
                return Err(HomologyError::NonOrientableZForm);
            }
            let m = poincare_matrix(self.skeleton(), self.registry(), dom.system, dom.dim)?;
            return self.from_chain_matrix(&dom, &rng, m);
        }

        if dom.dim != rng.dim {
            return self.connecting_hom(loc);
        }

        let path = route(dom.system, rng.system, dom.variance).ok_or_else(|| unsupported(loc))?;
        log::debug!(
            "{loc}: {}",
            path.iter()
                .map(|s| format!("{}{}->{}", if s.inverse { "inv " } else { "" }, s.from, s.to))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut acc: Option<HomMarkedAbelianGroup> = None;
        for step in path {
            let hom = self.step_hom(dom, step)?;
            acc = Some(match acc {
                Some(inner) => hom.compose(&inner)?,
                None => hom,
            });
        }
        acc.ok_or_else(|| unsupported(loc))
    }

    fn step_hom(&self, base: GroupLocator, step: Step) -> Result<HomMarkedAbelianGroup, HomologyError> {
        if step.inverse {
            let forward = Step {
                from: step.to,
                to: step.from,
                inverse: false,
            };
            return self.step_hom(base, forward)?.inverse();
        }
        let from = base.with_system(step.from);
        let to = base.with_system(step.to);
        // the chain map always runs between the covariant ends of the edge
        let (chain_from, chain_to) = match base.variance {
            Variance::Covariant => (step.from, step.to),
            Variance::Contravariant => (step.to, step.from),
        };
        let m = self.edge_chain_map(chain_from, chain_to, base.dim)?;
        let m = match base.variance {
            Variance::Covariant => m,
            Variance::Contravariant => m.transpose(),
        };
        self.from_chain_matrix(&from, &to, m)
    }

    /// Chain-level matrix of one edge of the map graph.
    pub(crate) fn edge_chain_map(
        &self,
        from: CoordinateSystem,
        to: CoordinateSystem,
        d: usize,
    ) -> Result<IntMatrix, HomologyError> {
        let (sk, reg) = (self.skeleton(), self.registry());
        let m = match (from.family(), to.family()) {
            (Family::Std, Family::Mix) if from.part() == to.part() => subdivision(sk, reg, from, d)?,
            (Family::Dual, Family::Mix) if from.part() == to.part() => dual_subdivision(sk, reg, from, d)?,
            _ if from.family() == to.family() => shared_cells(reg, from, to, d)?,
            _ => {
                return Err(HomologyError::UnsupportedHom(format!(
                    "no chain map from {from} to {to}"
                )));
            }
        };
        if self.options().check_invariants {
            if let Err(e) = self.check_chain_map(from, to, d, &m) {
                crate::debug_invariants::violation("chain map", &e);
            }
        }
        Ok(m)
    }

    /// `∂_T ∘ f_d = f_{d−1} ∘ ∂_S`; a failure is an engine bug.
    fn check_chain_map(
        &self,
        from: CoordinateSystem,
        to: CoordinateSystem,
        d: usize,
        f: &IntMatrix,
    ) -> Result<(), HomologyError> {
        if d == 0 {
            return Ok(());
        }
        let lower = match (from.family(), to.family()) {
            (Family::Std, Family::Mix) => subdivision(self.skeleton(), self.registry(), from, d - 1)?,
            (Family::Dual, Family::Mix) => dual_subdivision(self.skeleton(), self.registry(), from, d - 1)?,
            _ => shared_cells(self.registry(), from, to, d - 1)?,
        };
        let lhs = self.integer_chain_complex(d, to)?.mul(f)?;
        let rhs = lower.mul(&*self.integer_chain_complex(d, from)?)?;
        if lhs != rhs {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("{from} -> {to} commuting with the boundary"),
                found: format!("mismatch at dimension {d}"),
            });
        }
        Ok(())
    }

    fn connecting_hom(&self, loc: &HomLocator) -> Result<HomMarkedAbelianGroup, HomologyError> {
        let (dom, rng) = (loc.domain, loc.range);
        let family = dom.system.family();
        let shape_ok = family == rng.system.family()
            && matches!(family, Family::Std | Family::Mix)
            && match dom.variance {
                Variance::Covariant => {
                    dom.system.part() == Part::Relative
                        && rng.system.part() == Part::Boundary
                        && dom.dim == rng.dim + 1
                }
                Variance::Contravariant => {
                    dom.system.part() == Part::Boundary
                        && rng.system.part() == Part::Relative
                        && rng.dim == dom.dim + 1
                }
            };
        if !shape_ok {
            return Err(unsupported(loc));
        }
        let m = match dom.variance {
            Variance::Covariant => connecting(self.skeleton(), self.registry(), self.adjacency(), family, dom.dim)?,
            Variance::Contravariant => {
                connecting(self.skeleton(), self.registry(), self.adjacency(), family, rng.dim)?.transpose()
            }
        };
        self.from_chain_matrix(&dom, &rng, m)
    }

    fn from_chain_matrix(
        &self,
        from: &GroupLocator,
        to: &GroupLocator,
        m: IntMatrix,
    ) -> Result<HomMarkedAbelianGroup, HomologyError> {
        let domain: Arc<_> = self.marked_group(from)?;
        let range: Arc<_> = self.marked_group(to)?;
        HomMarkedAbelianGroup::from_chain_map(domain, range, m)
    }
}
