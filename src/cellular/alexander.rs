//! Alexander module of a manifold with `b₁ = 1`.
//!
//! The abelianization `π₁ → ℤ` is read off the exponent-sum matrix; Fox
//! derivatives of the relators, lifted to the infinite cyclic cover, give a
//! presentation matrix over `ℤ[t^±]`. One generator row is redundant by the
//! fundamental formula of Fox calculus: a Euclidean walk on the generator
//! exponents isolates it, after which it vanishes and is dropped. Unit
//! entries are then eliminated and the ideal of maximal minors is reduced.
//!
//! `φ` is oriented so that its first nonzero entry is positive, which ties
//! the sign of `t` to the generator order of the presentation. The reported
//! ideal does not depend on that choice: of the ideal and its mirror
//! `t ↦ t⁻¹`, [`mirror_canonical`] keeps the one with positive leading
//! coefficients. The presentation matrix stays in the orientation of `φ`.

use num_integer::Integer;
use num_traits::{One, Zero};

use crate::algebra::laurent::{LaurentPoly, PolyMatrix, mirror_canonical, reduce_ideal};
use crate::algebra::presentation::{GroupPresentation, Word};
use crate::algebra::smith::kernel_basis;
use crate::cellular::sparse_grid::{AdjacencyTable, CoverFacetData};
use crate::homology_error::HomologyError;

#[derive(Clone, Debug)]
pub struct AlexanderModule {
    /// Image of each generator under `π₁ → ℤ`.
    phi: Vec<i64>,
    matrix: PolyMatrix,
    ideal: Vec<LaurentPoly>,
}

/// Primitive generator of the one-dimensional kernel of `φ ↦ φ·A`, first
/// nonzero entry positive.
fn abelian_character(group: &GroupPresentation) -> Result<Vec<i64>, HomologyError> {
    let a = group.abelianization_matrix().transpose();
    let ker = kernel_basis(&a)?;
    if ker.cols() != 1 {
        return Err(HomologyError::AlexanderPrecondition { betti: ker.cols() });
    }
    let mut phi = ker.column(0);
    let g = phi.iter().fold(0i64, |g, &x| g.gcd(&x));
    if g > 1 {
        phi.iter_mut().for_each(|x| *x /= g);
    }
    if phi.iter().find(|&&x| x != 0).is_some_and(|&x| x < 0) {
        phi.iter_mut().for_each(|x| *x = -*x);
    }
    Ok(phi)
}

/// Fox derivatives of the relators as cover incidences: one record per
/// letter, carrying the prefix that lifts it.
fn fox_table(group: &GroupPresentation) -> Result<AdjacencyTable, HomologyError> {
    let mut table = AdjacencyTable::new(group.relators().len(), group.generator_count());
    for (r, word) in group.relators().iter().enumerate() {
        let mut prefix = Word::new();
        for &(g, e) in word {
            for _ in 0..e.unsigned_abs() {
                if e > 0 {
                    table.push(r, CoverFacetData { cell_no: g, sig: 1, trans: prefix.clone() })?;
                    prefix.push((g, 1));
                } else {
                    prefix.push((g, -1));
                    table.push(r, CoverFacetData { cell_no: g, sig: -1, trans: prefix.clone() })?;
                }
            }
        }
    }
    Ok(table)
}

/// Eliminate unit entries and zero columns until neither is left.
fn simplify(mut m: PolyMatrix) -> PolyMatrix {
    loop {
        if m.rows() == 0 {
            return m;
        }
        let all_rows: Vec<usize> = (0..m.rows()).collect();
        let keep: Vec<usize> = (0..m.cols())
            .filter(|&c| (0..m.rows()).any(|r| !m.get(r, c).is_zero()))
            .collect();
        if keep.len() != m.cols() {
            m = m.select(&all_rows, &keep);
        }
        let unit = (0..m.rows())
            .flat_map(|r| (0..m.cols()).map(move |c| (r, c)))
            .find(|&(r, c)| m.get(r, c).is_unit());
        let Some((r, c)) = unit else {
            return m;
        };
        let Some(inv) = m.get(r, c).unit_inverse() else {
            return m;
        };
        for r2 in (0..m.rows()).filter(|&r2| r2 != r) {
            if m.get(r2, c).is_zero() {
                continue;
            }
            let f = -(m.get(r2, c) * &inv);
            m.add_row_multiple(r2, r, &f);
        }
        let rows: Vec<usize> = (0..m.rows()).filter(|&x| x != r).collect();
        let cols: Vec<usize> = (0..m.cols()).filter(|&x| x != c).collect();
        m = m.select(&rows, &cols);
    }
}

impl AlexanderModule {
    pub fn new(group: &GroupPresentation) -> Result<Self, HomologyError> {
        let phi = abelian_character(group)?;
        let m = group.generator_count();

        // 1. Fox matrix: rows are generators, columns relators
        let table = fox_table(group)?;
        let mut fox = table
            .fold(|rec| {
                let e: i64 = rec.trans.iter().map(|&(g, x)| phi[g] * x).sum();
                LaurentPoly::monomial(rec.sig, e)
            })
            .to_poly_matrix();

        // 2. Euclid on the exponents until one generator carries all of φ
        let mut exps = phi.clone();
        while exps.iter().filter(|&&e| e != 0).count() > 1 {
            let nz: Vec<usize> = (0..m).filter(|&k| exps[k] != 0).collect();
            let Some(&k) = nz.iter().min_by_key(|&&k| exps[k].abs()) else {
                break;
            };
            for &j in nz.iter().filter(|&&j| j != k) {
                let (a, b) = (exps[j], exps[k]);
                let q = a / b;
                if q == 0 {
                    continue;
                }
                let num = LaurentPoly::from_terms([(a, 1), (a - q * b, -1)]);
                let c = num.div_exact(&LaurentPoly::power_minus_one(b))?;
                exps[j] = a - q * b;
                fox.add_row_multiple(k, j, &c);
            }
        }

        // 3. the remaining pivot row vanishes; drop it
        let pivot = (0..m).find(|&k| exps[k] != 0).ok_or(HomologyError::AlexanderPrecondition { betti: 0 })?;
        if (0..fox.cols()).any(|c| !fox.get(pivot, c).is_zero()) {
            return Err(HomologyError::ShapeMismatch {
                expected: "vanishing pivot row in the Fox matrix".into(),
                found: format!("nonzero row {pivot}"),
            });
        }
        let rows: Vec<usize> = (0..m).filter(|&k| k != pivot).collect();
        let cols: Vec<usize> = (0..fox.cols()).collect();
        let matrix = simplify(fox.select(&rows, &cols));

        // 4. elementary ideal of maximal minors
        let ideal = if matrix.rows() == 0 {
            vec![LaurentPoly::one()]
        } else if matrix.cols() < matrix.rows() {
            vec![LaurentPoly::zero()]
        } else {
            let minors = reduce_ideal(&matrix.maximal_minors()?);
            if minors.is_empty() { vec![LaurentPoly::zero()] } else { mirror_canonical(minors) }
        };
        log::debug!(
            "alexander: {}x{} presentation, ideal [{}]",
            matrix.rows(),
            matrix.cols(),
            ideal.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
        );
        Ok(AlexanderModule { phi, matrix, ideal })
    }

    pub fn character(&self) -> &[i64] {
        &self.phi
    }

    /// Simplified presentation matrix over `ℤ[t^±]`.
    pub fn presentation_matrix(&self) -> &PolyMatrix {
        &self.matrix
    }

    /// Reduced generators of the first elementary ideal.
    pub fn ideal(&self) -> &[LaurentPoly] {
        &self.ideal
    }

    /// The Alexander polynomial when the ideal is principal.
    pub fn polynomial(&self) -> Option<&LaurentPoly> {
        match self.ideal.as_slice() {
            [p] => Some(p),
            _ => None,
        }
    }
}
