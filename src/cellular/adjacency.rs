//! Adjacency store: boundary records of every decomposition.
//!
//! STD boundaries are computed once per cell as [`StdTerm`]s that remember
//! which occurrence of the target they were read from. DUAL incidences are
//! derived from them: the dual of `∂_STD` with the local orientation of each
//! occurrence folded in. MIX boundaries are generated per cell from the
//! barycentric block of its carrier.

use crate::cellular::cells::{
    carrier, local_faces, mask_of, positions, CellRegistry, Loc, MixCell, StdCell,
};
use crate::cellular::coordinates::{CoordinateSystem, Family, Part};
use crate::cellular::sparse_grid::{AdjacencyTable, CoverFacetData};
use crate::homology_error::HomologyError;
use crate::topology::perm::{list_sign, sort_sign};
use crate::topology::skeleton::{vertex_mask, Skeleton};

fn canon_pos(canon: &[usize], v: usize) -> Result<usize, HomologyError> {
    canon.iter().position(|&c| c == v).ok_or_else(|| {
        HomologyError::InvalidTriangulation("vertex missing from a facet".into())
    })
}

#[inline]
pub(crate) fn parity(n: usize) -> i64 {
    if n % 2 == 0 { 1 } else { -1 }
}

/// One term of the boundary of a STD cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StdTerm {
    pub target: StdCell,
    pub coef: i64,
    /// Occurrence of the target's carrier face the term was read from.
    pub simplex: usize,
    pub mask: u8,
}

impl StdTerm {
    /// Dimension of the face carrying the target of a term out of a `d`-cell.
    #[inline]
    pub fn carrier_dim(&self, d: usize) -> usize {
        match self.target {
            StdCell::Face(_) => d - 1,
            StdCell::Ideal { .. } => d,
        }
    }

    /// Local orientation of the occurrence this term was read from.
    pub fn local_orientation(&self, sk: &Skeleton, d: usize) -> Result<i64, HomologyError> {
        let index = match self.target {
            StdCell::Face(i) => i,
            StdCell::Ideal { face, .. } => face,
        };
        sk.local_orientation_at(self.carrier_dim(d), index, self.simplex, self.mask)
            .ok_or_else(|| {
                HomologyError::InvalidTriangulation(format!(
                    "face {index} has a non-orientable star"
                ))
            })
    }
}

/// Boundary terms of the STD `d`-cell `sigma`.
pub fn std_boundary_terms(sk: &Skeleton, d: usize, sigma: StdCell) -> Result<Vec<StdTerm>, HomologyError> {
    let mut out = Vec::new();
    if d == 0 {
        return Ok(out);
    }
    let e = carrier(sk, d, sigma);
    let (s0, verts) = (e.simplex, &e.vertices);
    match sigma {
        StdCell::Face(index) => {
            for j in 0..=d {
                let mut sub = verts.clone();
                sub.remove(j);
                let face = sk.face_at(s0, &sub)?;
                if face.dim == 0 && sk.is_ideal(face.index) {
                    continue;
                }
                out.push(StdTerm {
                    target: StdCell::Face(face.index),
                    coef: parity(j) * list_sign(&sub, face.canon),
                    simplex: s0,
                    mask: vertex_mask(&sub),
                });
            }
            for (i, &v) in verts.iter().enumerate() {
                if sk.is_ideal_at(s0, v) {
                    out.push(StdTerm {
                        target: StdCell::Ideal { face: index, pos: i },
                        coef: parity(i + 1),
                        simplex: s0,
                        mask: vertex_mask(verts),
                    });
                }
            }
        }
        StdCell::Ideal { pos, .. } => {
            let iv = verts[pos];
            let link: Vec<usize> = verts.iter().copied().filter(|&v| v != iv).collect();
            for (k, &m) in link.iter().enumerate() {
                let sub: Vec<usize> = verts.iter().copied().filter(|&v| v != m).collect();
                let face = sk.face_at(s0, &sub)?;
                let ip = face.canon.iter().position(|&v| v == iv).ok_or_else(|| {
                    HomologyError::InvalidTriangulation("ideal vertex lost in a facet".into())
                })?;
                let lm: Vec<usize> = link.iter().copied().filter(|&v| v != m).collect();
                let cl: Vec<usize> = face.canon.iter().copied().filter(|&v| v != iv).collect();
                out.push(StdTerm {
                    target: StdCell::Ideal {
                        face: face.index,
                        pos: ip,
                    },
                    coef: parity(k) * list_sign(&lm, &cl),
                    simplex: s0,
                    mask: vertex_mask(&sub),
                });
            }
        }
    }
    Ok(out)
}

/// Boundary terms of a MIX cell, as `(target, coefficient)`.
pub fn mix_terms(sk: &Skeleton, cell: MixCell) -> Result<Vec<(MixCell, i64)>, HomologyError> {
    let MixCell { k, sigma, loc } = cell;
    let e = carrier(sk, k, sigma);
    let (s0, verts) = (e.simplex, &e.vertices);
    let dt = parity(loc.local_dim());
    let mut out = Vec::new();
    let local = |l: Loc| MixCell { k, sigma, loc: l };

    match (sigma, loc) {
        (StdCell::Face(index), Loc::Span(_) | Loc::Cusp { .. }) => {
            let t = loc.mask();
            let size = t.count_ones() as usize;
            // 1. cofaces inside the block
            match loc {
                Loc::Span(_) => {
                    for x in (0..=k).filter(|&x| t & (1 << x) == 0) {
                        let above = positions(t).filter(|&p| p > x).count();
                        out.push((local(Loc::Span(t | (1 << x))), parity(above)));
                    }
                }
                Loc::Cusp { ideal, .. } => {
                    let i = ideal as usize;
                    let pos = positions(t).filter(|&p| p < i).count();
                    out.push((local(Loc::Span(t)), parity(size + pos)));
                    for x in (0..=k).filter(|&x| t & (1 << x) == 0) {
                        let kx = positions(t).filter(|&p| p != i && p < x).count();
                        out.push((
                            local(Loc::Cusp {
                                span: t | (1 << x),
                                ideal,
                            }),
                            parity(size - 1 + kx),
                        ));
                    }
                }
                Loc::Link(_) => unreachable!(),
            }
            // 2. facets of the carrier
            for y in (0..=k).filter(|&y| t & (1 << y) == 0) {
                let mut sub = verts.clone();
                sub.remove(y);
                let face = sk.face_at(s0, &sub)?;
                if face.dim == 0 && sk.is_ideal(face.index) {
                    continue;
                }
                let inc = parity(y) * list_sign(&sub, face.canon);
                let relab = positions(t)
                    .map(|p| canon_pos(face.canon, verts[p]))
                    .collect::<Result<Vec<_>, _>>()?;
                let (target, rho) = match loc {
                    Loc::Cusp { ideal, .. } => {
                        let iv = verts[ideal as usize];
                        let ip = canon_pos(face.canon, iv)?;
                        let rest = positions(t)
                            .filter(|&p| p != ideal as usize)
                            .map(|p| canon_pos(face.canon, verts[p]))
                            .collect::<Result<Vec<_>, _>>()?;
                        (
                            Loc::Cusp {
                                span: mask_of(relab.iter().copied()),
                                ideal: ip as u8,
                            },
                            sort_sign(&rest),
                        )
                    }
                    _ => (Loc::Span(mask_of(relab.iter().copied())), sort_sign(&relab)),
                };
                out.push((
                    MixCell {
                        k: k - 1,
                        sigma: StdCell::Face(face.index),
                        loc: target,
                    },
                    dt * inc * rho,
                ));
            }
            // 3. the cusp side of a cusp cell
            if let Loc::Cusp { ideal, .. } = loc {
                let i = ideal as usize;
                out.push((
                    MixCell {
                        k: k - 1,
                        sigma: StdCell::Ideal { face: index, pos: i },
                        loc: Loc::Link(t & !(1 << i)),
                    },
                    dt * parity(i + 1),
                ));
            }
        }
        (StdCell::Ideal { pos: i, .. }, Loc::Link(r)) => {
            for x in (0..k + 2).filter(|&x| x != i && r & (1 << x) == 0) {
                let above = positions(r).filter(|&p| p > x).count();
                out.push((local(Loc::Link(r | (1 << x))), parity(above)));
            }
            let iv = verts[i];
            let link: Vec<usize> = verts.iter().copied().filter(|&v| v != iv).collect();
            for (kidx, &m) in link.iter().enumerate() {
                let y = canon_pos(verts, m)?;
                if r & (1 << y) != 0 {
                    continue;
                }
                let sub: Vec<usize> = verts.iter().copied().filter(|&v| v != m).collect();
                let face = sk.face_at(s0, &sub)?;
                let ip = canon_pos(face.canon, iv)?;
                let lm: Vec<usize> = link.iter().copied().filter(|&v| v != m).collect();
                let cl: Vec<usize> = face.canon.iter().copied().filter(|&v| v != iv).collect();
                let inc = parity(kidx) * list_sign(&lm, &cl);
                let rr = positions(r)
                    .map(|p| canon_pos(face.canon, verts[p]))
                    .collect::<Result<Vec<_>, _>>()?;
                out.push((
                    MixCell {
                        k: k - 1,
                        sigma: StdCell::Ideal {
                            face: face.index,
                            pos: ip,
                        },
                        loc: Loc::Link(mask_of(rr.iter().copied())),
                    },
                    dt * inc * sort_sign(&rr),
                ));
            }
        }
        _ => {
            return Err(HomologyError::InvalidTriangulation(format!(
                "mixed cell {cell:?} has no block"
            )));
        }
    }
    Ok(out)
}

/// Boundary data shared by all decompositions.
#[derive(Clone, Debug)]
pub struct AdjacencyStore {
    ambient: usize,
    /// `std_terms[d][i]` for the `i`-th STD `d`-cell.
    std_terms: Vec<Vec<Vec<StdTerm>>>,
    /// `cofaces[k][i]`: `(σ, c)` with `σ` a STD `(k+1)`-cell and `c` the
    /// coefficient of `D(σ)` in `∂D(τ)` for the `i`-th STD `k`-cell `τ`.
    cofaces: Vec<Vec<Vec<(usize, i64)>>>,
}

impl AdjacencyStore {
    pub fn new(sk: &Skeleton, reg: &CellRegistry) -> Result<Self, HomologyError> {
        let n = reg.ambient_dim();
        let mut std_terms = Vec::with_capacity(n + 1);
        for d in 0..=n {
            let chart = reg.std_cells(d);
            std_terms.push(
                chart
                    .iter()
                    .map(|&c| std_boundary_terms(sk, d, c))
                    .collect::<Result<Vec<_>, _>>()?,
            );
        }

        let mut cofaces: Vec<Vec<Vec<(usize, i64)>>> =
            (0..=n).map(|k| vec![Vec::new(); reg.std_cells(k).len()]).collect();
        for k in 1..=n {
            for (si, terms) in std_terms[k].iter().enumerate() {
                for term in terms {
                    let ti = reg.std_cells(k - 1).position(&term.target).ok_or_else(|| {
                        HomologyError::InvalidTriangulation(format!(
                            "boundary term {:?} is not a registered cell",
                            term.target
                        ))
                    })?;
                    let c = parity(k) * term.local_orientation(sk, k)? * term.coef;
                    let list = &mut cofaces[k - 1][ti];
                    match list.iter_mut().find(|(s, _)| *s == si) {
                        Some(slot) => slot.1 += c,
                        None => list.push((si, c)),
                    }
                }
            }
        }
        for per_dim in cofaces.iter_mut() {
            for list in per_dim.iter_mut() {
                list.retain(|&(_, c)| c != 0);
            }
        }
        Ok(Self {
            ambient: n,
            std_terms,
            cofaces,
        })
    }

    pub fn std_terms(&self, d: usize, index: usize) -> &[StdTerm] {
        &self.std_terms[d][index]
    }

    /// Cofaces of the `index`-th STD `k`-cell with their dual coefficients.
    pub fn dual_cofaces(&self, k: usize, index: usize) -> &[(usize, i64)] {
        &self.cofaces[k][index]
    }

    /// Records of the boundary operator from `d`-cells to `(d−1)`-cells.
    pub fn boundary(
        &self,
        sk: &Skeleton,
        reg: &CellRegistry,
        system: CoordinateSystem,
        d: usize,
    ) -> Result<AdjacencyTable, HomologyError> {
        reg.check_dim(system, d)?;
        if d == 0 {
            return Ok(AdjacencyTable::new(reg.count(system, 0)?, 0));
        }
        match system.family() {
            Family::Std => {
                let dom = reg.std_chart(system, d)?;
                let rng = reg.std_chart(system, d - 1)?;
                let full = reg.std_cells(d);
                let mut table = AdjacencyTable::new(dom.len(), rng.len());
                for (a, cell) in dom.iter().enumerate() {
                    let fi = full.position(cell).ok_or_else(|| missing(cell))?;
                    for term in &self.std_terms[d][fi] {
                        if let Some(b) = rng.position(&term.target) {
                            table.push(a, CoverFacetData::new(b, term.coef))?;
                        }
                    }
                }
                Ok(table)
            }
            Family::Dual => {
                let sign = if system.part() == Part::Boundary { -1 } else { 1 };
                let k = reg.dual_carrier_dim(system, d);
                let dom = reg.std_chart(system, d)?;
                let rng = reg.std_chart(system, d - 1)?;
                let mut table = AdjacencyTable::new(dom.len(), rng.len());
                for (a, tau) in dom.iter().enumerate() {
                    let ti = reg.std_cells(k).position(tau).ok_or_else(|| missing(tau))?;
                    for &(si, c) in &self.cofaces[k][ti] {
                        let sigma = reg.std_cells(k + 1).get(si);
                        if let Some(b) = rng.position(&sigma) {
                            table.push(a, CoverFacetData::new(b, sign * c))?;
                        }
                    }
                }
                Ok(table)
            }
            Family::Mix => {
                let dom = reg.mix_chart(system, d)?;
                let rng = reg.mix_chart(system, d - 1)?;
                let all = reg.mix_cells(d - 1);
                let mut table = AdjacencyTable::new(dom.len(), rng.len());
                for (a, &cell) in dom.iter().enumerate() {
                    for (target, c) in mix_terms(sk, cell)? {
                        if all.position(&target).is_none() {
                            return Err(HomologyError::InvalidTriangulation(format!(
                                "mixed boundary term {target:?} is not a registered cell"
                            )));
                        }
                        if let Some(b) = rng.position(&target) {
                            table.push(a, CoverFacetData::new(b, c))?;
                        }
                    }
                }
                Ok(table)
            }
        }
    }

    #[inline]
    pub fn ambient_dim(&self) -> usize {
        self.ambient
    }
}

fn missing(cell: &StdCell) -> HomologyError {
    HomologyError::InvalidTriangulation(format!("{cell:?} is not a registered cell"))
}

/// MIX cells a STD cell subdivides into, i.e. its block cells of the same
/// dimension.
pub fn subdivision(sk: &Skeleton, k: usize, sigma: StdCell) -> Vec<MixCell> {
    local_faces(sk, k, sigma)
        .into_iter()
        .filter(|l| l.local_dim() == 0)
        .map(|loc| MixCell { k, sigma, loc })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::triangulation::Triangulation;

    fn store(sig: &str, dim: usize) -> (Skeleton, CellRegistry, AdjacencyStore) {
        let t = Triangulation::from_isosig(sig, dim).unwrap();
        let sk = Skeleton::new(&t).unwrap();
        let reg = CellRegistry::new(&sk).unwrap();
        let adj = AdjacencyStore::new(&sk, &reg).unwrap();
        (sk, reg, adj)
    }

    fn squares_to_zero(sk: &Skeleton, reg: &CellRegistry, adj: &AdjacencyStore, system: CoordinateSystem) {
        let top = system.top_dim(reg.ambient_dim());
        for d in 1..top {
            let a = adj.boundary(sk, reg, system, d).unwrap().integer_matrix();
            let b = adj.boundary(sk, reg, system, d + 1).unwrap().integer_matrix();
            assert!(a.mul(&b).unwrap().is_zero(), "{system} at {d}");
        }
    }

    #[test]
    fn figure_eight_complexes_are_chain_complexes() {
        let (sk, reg, adj) = store("cPcbbbiht", 3);
        for system in CoordinateSystem::ALL {
            squares_to_zero(&sk, &reg, &adj, system);
        }
    }

    #[test]
    fn ball_complexes_are_chain_complexes() {
        let t = Triangulation::from_facets(3, &[vec![0, 1, 2, 3], vec![1, 2, 3, 4]]).unwrap();
        let sk = Skeleton::new(&t).unwrap();
        let reg = CellRegistry::new(&sk).unwrap();
        let adj = AdjacencyStore::new(&sk, &reg).unwrap();
        for system in CoordinateSystem::ALL {
            squares_to_zero(&sk, &reg, &adj, system);
        }
    }

    #[test]
    fn base_boundaries_carry_no_deck_words() {
        let (sk, reg, adj) = store("cPcbbbiht", 3);
        for system in CoordinateSystem::ALL {
            for d in 1..=system.top_dim(reg.ambient_dim()) {
                let table = adj.boundary(&sk, &reg, system, d).unwrap();
                assert!(table.iter().all(|(_, _, rec)| rec.trans.is_empty()), "{system} at {d}");
            }
        }
    }

    #[test]
    fn truncated_edge_has_two_ends() {
        let (sk, reg, adj) = store("cPcbbbiht", 3);
        // an edge between two ideal ends is bounded by both truncation points
        let terms = adj.std_terms(1, 0);
        assert_eq!(terms.len(), 2);
        assert!(terms.iter().all(|t| matches!(t.target, StdCell::Ideal { face: 0, .. })));
        assert_eq!(terms.iter().map(|t| t.coef).sum::<i64>(), 0);
        assert_eq!(subdivision(&sk, 1, reg.std_cells(1).get(0)).len(), 2);
    }
}
