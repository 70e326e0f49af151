//! Chain-level maps between decompositions.
//!
//! All matrices have rows indexed by the range chart and columns by the
//! domain chart of the given dimension.

use hashbrown::HashMap;

use crate::algebra::matrix::IntMatrix;
use crate::cellular::adjacency::{mix_terms, subdivision as std_subdivision, AdjacencyStore};
use crate::cellular::cells::{carrier, CellRegistry, Loc, MixCell, StdCell};
use crate::cellular::coordinates::{CoordinateSystem, Family, Part};
use crate::homology_error::HomologyError;
use crate::topology::perm::{list_sign, sort_sign};
use crate::topology::skeleton::{vertex_mask, Skeleton};

fn wrong_family(system: CoordinateSystem, want: Family) -> HomologyError {
    HomologyError::UnsupportedHom(format!("{system} is not in the {want:?} family"))
}

fn not_in_chart(what: impl std::fmt::Debug, system: CoordinateSystem) -> HomologyError {
    HomologyError::InvalidTriangulation(format!("{what:?} is not a cell of {system}"))
}

/// Barycentric subdivision `STD_d → MIX_d` of the matching part.
pub fn subdivision(
    sk: &Skeleton,
    reg: &CellRegistry,
    domain: CoordinateSystem,
    d: usize,
) -> Result<IntMatrix, HomologyError> {
    if domain.family() != Family::Std {
        return Err(wrong_family(domain, Family::Std));
    }
    let range = CoordinateSystem::from_parts(Family::Mix, domain.part());
    let dom = reg.std_chart(domain, d)?;
    let rng = reg.mix_chart(range, d)?;
    let mut m = IntMatrix::zeros(rng.len(), dom.len());
    for (c, &sigma) in dom.iter().enumerate() {
        for cell in std_subdivision(sk, d, sigma) {
            let r = rng.position(&cell).ok_or_else(|| not_in_chart(cell, range))?;
            m.add_to(r, c, 1)?;
        }
    }
    Ok(m)
}

/// The dual cell of the STD `k`-cell `phi` as a MIX `(n−k)`-chain in the
/// top simplices around it.
pub fn image_dual(sk: &Skeleton, k: usize, phi: StdCell) -> Result<Vec<(MixCell, i64)>, HomologyError> {
    let n = sk.dim();
    let non_orientable = |index: usize| {
        HomologyError::InvalidTriangulation(format!("star of face {index} is not orientable"))
    };
    let mut out = Vec::new();
    match phi {
        StdCell::Face(index) => {
            for emb in sk.embeddings(k, index) {
                let e = sk
                    .local_orientation(k, index, emb.simplex, &emb.vertices)
                    .ok_or_else(|| non_orientable(index))?;
                let mut sorted = emb.vertices.clone();
                sorted.sort_unstable();
                out.push((
                    MixCell {
                        k: n,
                        sigma: StdCell::Face(sk.top_face(emb.simplex)?),
                        loc: Loc::Span(vertex_mask(&emb.vertices)),
                    },
                    e * list_sign(&emb.vertices, &sorted),
                ));
            }
        }
        StdCell::Ideal { face, pos } => {
            for emb in sk.embeddings(k + 1, face) {
                let e = sk
                    .local_orientation(k + 1, face, emb.simplex, &emb.vertices)
                    .ok_or_else(|| non_orientable(face))?;
                let iv = emb.vertices[pos];
                let rest: Vec<usize> = emb.vertices.iter().copied().filter(|&v| v != iv).collect();
                out.push((
                    MixCell {
                        k: n,
                        sigma: StdCell::Face(sk.top_face(emb.simplex)?),
                        loc: Loc::Cusp {
                            span: vertex_mask(&emb.vertices),
                            ideal: iv as u8,
                        },
                    },
                    e * sort_sign(&rest),
                ));
            }
        }
    }
    Ok(out)
}

/// Subdivision `DUAL_j → MIX_j` of the matching part.
///
/// Boundary dual cells are the boundary of the dual of their STD cell taken
/// in the interior, so their image is the boundary part of `∂_MIX` applied
/// to that image.
pub fn dual_subdivision(
    sk: &Skeleton,
    reg: &CellRegistry,
    domain: CoordinateSystem,
    j: usize,
) -> Result<IntMatrix, HomologyError> {
    if domain.family() != Family::Dual {
        return Err(wrong_family(domain, Family::Dual));
    }
    let range = CoordinateSystem::from_parts(Family::Mix, domain.part());
    let k = reg.dual_carrier_dim(domain, j);
    let dom = reg.std_chart(domain, j)?;
    let rng = reg.mix_chart(range, j)?;
    let mut m = IntMatrix::zeros(rng.len(), dom.len());
    for (c, &phi) in dom.iter().enumerate() {
        let image = image_dual(sk, k, phi)?;
        if domain.part() == Part::Boundary {
            let mut acc: HashMap<MixCell, i64> = HashMap::new();
            for (cell, a) in image {
                for (target, b) in mix_terms(sk, cell)? {
                    if rng.position(&target).is_some() {
                        *acc.entry(target).or_insert(0) += a * b;
                    }
                }
            }
            for (target, v) in acc {
                if let Some(r) = rng.position(&target) {
                    m.add_to(r, c, v)?;
                }
            }
        } else {
            for (cell, a) in image {
                let r = rng.position(&cell).ok_or_else(|| not_in_chart(cell, range))?;
                m.add_to(r, c, a)?;
            }
        }
    }
    Ok(m)
}

/// Identity on the cells two systems of one family share: inclusion of the
/// boundary, projection onto the relative complex, and `DUAL → DUAL_REL`.
pub fn shared_cells(
    reg: &CellRegistry,
    domain: CoordinateSystem,
    range: CoordinateSystem,
    d: usize,
) -> Result<IntMatrix, HomologyError> {
    if domain.family() != range.family() {
        return Err(HomologyError::UnsupportedHom(format!(
            "{domain} and {range} use different cells"
        )));
    }
    if domain.family() == Family::Mix {
        let dom = reg.mix_chart(domain, d)?;
        let rng = reg.mix_chart(range, d)?;
        let mut m = IntMatrix::zeros(rng.len(), dom.len());
        for (c, cell) in dom.iter().enumerate() {
            if let Some(r) = rng.position(cell) {
                m.set(r, c, 1);
            }
        }
        return Ok(m);
    }
    if domain.family() == Family::Dual && reg.dual_carrier_dim(domain, d) != reg.dual_carrier_dim(range, d) {
        return Err(HomologyError::UnsupportedHom(format!(
            "{domain} and {range} dualize cells of different dimensions"
        )));
    }
    let dom = reg.std_chart(domain, d)?;
    let rng = reg.std_chart(range, d)?;
    let mut m = IntMatrix::zeros(rng.len(), dom.len());
    for (c, cell) in dom.iter().enumerate() {
        if let Some(r) = rng.position(cell) {
            m.set(r, c, 1);
        }
    }
    Ok(m)
}

/// Connecting map `C_d(M, ∂M) → C_{d−1}(∂M)`: the boundary of a relative
/// cell restricted to the boundary. Anticommutes with the differentials.
pub fn connecting(
    sk: &Skeleton,
    reg: &CellRegistry,
    adj: &AdjacencyStore,
    family: Family,
    d: usize,
) -> Result<IntMatrix, HomologyError> {
    let rel = CoordinateSystem::from_parts(family, Part::Relative);
    let bdry = CoordinateSystem::from_parts(family, Part::Boundary);
    if d == 0 {
        return Err(HomologyError::DimOutOfRange {
            dim: 0,
            system: rel,
            top: reg.ambient_dim(),
        });
    }
    match family {
        Family::Std => {
            let dom = reg.std_chart(rel, d)?;
            let rng = reg.std_chart(bdry, d - 1)?;
            let full = reg.std_cells(d);
            let mut m = IntMatrix::zeros(rng.len(), dom.len());
            for (c, sigma) in dom.iter().enumerate() {
                let fi = full.position(sigma).ok_or_else(|| not_in_chart(sigma, CoordinateSystem::Std))?;
                for term in adj.std_terms(d, fi) {
                    if let Some(r) = rng.position(&term.target) {
                        m.add_to(r, c, term.coef)?;
                    }
                }
            }
            Ok(m)
        }
        Family::Mix => {
            let dom = reg.mix_chart(rel, d)?;
            let rng = reg.mix_chart(bdry, d - 1)?;
            let mut m = IntMatrix::zeros(rng.len(), dom.len());
            for (c, &cell) in dom.iter().enumerate() {
                for (target, v) in mix_terms(sk, cell)? {
                    if let Some(r) = rng.position(&target) {
                        m.add_to(r, c, v)?;
                    }
                }
            }
            Ok(m)
        }
        Family::Dual => Err(HomologyError::UnsupportedHom(
            "connecting map on dual cells".into(),
        )),
    }
}

/// Signs `λ_j(τ)` of the diagonal Poincaré duality map between dual
/// `j`-chains and standard `(n−j)`-cochains, in dual chart order.
///
/// `λ_j(τ) = (−1)^{Σ_{i=1..j} (n−i+1)} · ε_s`, where `s` carries the first
/// embedding of `τ`.
pub fn poincare_signs(
    sk: &Skeleton,
    reg: &CellRegistry,
    system: CoordinateSystem,
    j: usize,
) -> Result<Vec<i64>, HomologyError> {
    if system.family() != Family::Dual || system.part() == Part::Boundary {
        return Err(wrong_family(system, Family::Dual));
    }
    let n = reg.ambient_dim();
    let k = n - j;
    let exponent: usize = (1..=j).map(|i| n - i + 1).sum();
    let global = if exponent % 2 == 0 { 1 } else { -1 };
    Ok(reg
        .std_chart(system, j)?
        .iter()
        .map(|&tau| global * sk.simplex_sign(carrier(sk, k, tau).simplex))
        .collect())
}

/// The diagonal matrix of [`poincare_signs`].
pub fn poincare_matrix(
    sk: &Skeleton,
    reg: &CellRegistry,
    system: CoordinateSystem,
    j: usize,
) -> Result<IntMatrix, HomologyError> {
    let signs = poincare_signs(sk, reg, system, j)?;
    let mut m = IntMatrix::zeros(signs.len(), signs.len());
    for (i, s) in signs.into_iter().enumerate() {
        m.set(i, i, s);
    }
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::triangulation::Triangulation;

    struct Fixture {
        sk: Skeleton,
        reg: CellRegistry,
        adj: AdjacencyStore,
    }

    fn fixture(t: Triangulation) -> Fixture {
        let sk = Skeleton::new(&t).unwrap();
        let reg = CellRegistry::new(&sk).unwrap();
        let adj = AdjacencyStore::new(&sk, &reg).unwrap();
        Fixture { sk, reg, adj }
    }

    fn bd(f: &Fixture, system: CoordinateSystem, d: usize) -> IntMatrix {
        f.adj.boundary(&f.sk, &f.reg, system, d).unwrap().integer_matrix()
    }

    fn commutes(f: &Fixture, from: CoordinateSystem, to: CoordinateSystem, map: impl Fn(usize) -> IntMatrix) {
        let top = from.top_dim(f.reg.ambient_dim());
        for d in 1..=top {
            let lhs = bd(f, to, d).mul(&map(d)).unwrap();
            let rhs = map(d - 1).mul(&bd(f, from, d)).unwrap();
            assert_eq!(lhs, rhs, "{from} -> {to} in dimension {d}");
        }
    }

    fn check_all(f: &Fixture) {
        use CoordinateSystem::*;
        for (from, to) in [(Std, Mix), (StdBdry, MixBdry), (StdRelBdry, MixRelBdry)] {
            commutes(f, from, to, |d| subdivision(&f.sk, &f.reg, from, d).unwrap());
        }
        for (from, to) in [(Dual, Mix), (DualBdry, MixBdry), (DualRelBdry, MixRelBdry)] {
            commutes(f, from, to, |d| dual_subdivision(&f.sk, &f.reg, from, d).unwrap());
        }
        for (from, to) in [(StdBdry, Std), (MixBdry, Mix), (Std, StdRelBdry), (Mix, MixRelBdry), (Dual, DualRelBdry)] {
            commutes(f, from, to, |d| shared_cells(&f.reg, from, to, d).unwrap());
        }
    }

    #[test]
    fn figure_eight_maps_are_chain_maps() {
        check_all(&fixture(Triangulation::from_isosig("cPcbbbiht", 3).unwrap()));
    }

    #[test]
    fn ball_maps_are_chain_maps() {
        check_all(&fixture(
            Triangulation::from_facets(3, &[vec![0, 1, 2, 3], vec![1, 2, 3, 4]]).unwrap(),
        ));
    }

    #[test]
    fn connecting_maps_anticommute() {
        let f = fixture(Triangulation::from_facets(3, &[vec![0, 1, 2, 3], vec![1, 2, 3, 4]]).unwrap());
        for family in [Family::Std, Family::Mix] {
            let rel = CoordinateSystem::from_parts(family, Part::Relative);
            let bdry = CoordinateSystem::from_parts(family, Part::Boundary);
            for d in 2..=3 {
                let lhs = bd(&f, bdry, d - 1).mul(&connecting(&f.sk, &f.reg, &f.adj, family, d).unwrap()).unwrap();
                let rhs = connecting(&f.sk, &f.reg, &f.adj, family, d - 1)
                    .unwrap()
                    .mul(&bd(&f, rel, d))
                    .unwrap();
                for r in 0..lhs.rows() {
                    for c in 0..lhs.cols() {
                        assert_eq!(lhs.get(r, c), -rhs.get(r, c));
                    }
                }
            }
        }
    }

    #[test]
    fn poincare_signs_follow_orientation() {
        let f = fixture(Triangulation::lens_space(5, 2).unwrap());
        let s0 = poincare_signs(&f.sk, &f.reg, CoordinateSystem::Dual, 0).unwrap();
        assert_eq!(s0.len(), f.reg.count(CoordinateSystem::Dual, 0).unwrap());
        for (i, s) in s0.iter().enumerate() {
            assert_eq!(*s, f.sk.simplex_sign(f.sk.canonical(3, i).simplex));
        }
        assert!(poincare_signs(&f.sk, &f.reg, CoordinateSystem::DualBdry, 0).is_err());
    }
}
