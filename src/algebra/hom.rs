//! Homomorphisms between marked abelian groups.
//!
//! A hom always carries its *reduced* matrix (generator coordinates of the
//! range against generators of the domain). Homs induced by chain maps also
//! keep the chain-level matrix; homs obtained by inverting or composing with
//! an inverse only know the reduced matrix.

use std::sync::Arc;

use crate::algebra::abelian_group::{AbelianGroup, MarkedAbelianGroup};
use crate::algebra::matrix::IntMatrix;
use crate::algebra::smith::{kernel_basis, solve};
use crate::homology_error::HomologyError;

/// Homomorphism of marked abelian groups.
#[derive(Clone, Debug)]
pub struct HomMarkedAbelianGroup {
    domain: Arc<MarkedAbelianGroup>,
    range: Arc<MarkedAbelianGroup>,
    chain_matrix: Option<IntMatrix>,
    reduced: IntMatrix,
}

/// Relation columns `d_j e_j` for the torsion generators of `g`.
fn torsion_relations(g: &MarkedAbelianGroup) -> IntMatrix {
    let n = g.generator_count();
    let idx: Vec<usize> = g.torsion_indices().collect();
    let mut m = IntMatrix::zeros(n, idx.len());
    for (col, &i) in idx.iter().enumerate() {
        m.set(i, col, g.generator_order(i));
    }
    m
}

impl HomMarkedAbelianGroup {
    /// Hom induced by a chain-level matrix (`range.chain_dim × domain.chain_dim`).
    pub fn from_chain_map(
        domain: Arc<MarkedAbelianGroup>,
        range: Arc<MarkedAbelianGroup>,
        matrix: IntMatrix,
    ) -> Result<Self, HomologyError> {
        if matrix.rows() != range.chain_dim() || matrix.cols() != domain.chain_dim() {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("{}x{}", range.chain_dim(), domain.chain_dim()),
                found: format!("{}x{}", matrix.rows(), matrix.cols()),
            });
        }
        let mut reduced = IntMatrix::zeros(range.generator_count(), domain.generator_count());
        for i in 0..domain.generator_count() {
            let chain = domain.generator_chain(i)?;
            let image = matrix.mul_vec(&chain)?;
            let coords = range.snf_coordinates(&image)?;
            for (j, x) in coords.into_iter().enumerate() {
                reduced.set(j, i, x);
            }
        }
        Ok(Self {
            domain,
            range,
            chain_matrix: Some(matrix),
            reduced,
        })
    }

    /// Hom given only by its reduced matrix.
    pub fn from_reduced(
        domain: Arc<MarkedAbelianGroup>,
        range: Arc<MarkedAbelianGroup>,
        reduced: IntMatrix,
    ) -> Result<Self, HomologyError> {
        if reduced.rows() != range.generator_count() || reduced.cols() != domain.generator_count() {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("{}x{}", range.generator_count(), domain.generator_count()),
                found: format!("{}x{}", reduced.rows(), reduced.cols()),
            });
        }
        let mut reduced = reduced;
        for c in 0..reduced.cols() {
            let col = range.reduce_coordinates(&reduced.column(c));
            for (r, x) in col.into_iter().enumerate() {
                reduced.set(r, c, x);
            }
        }
        Ok(Self {
            domain,
            range,
            chain_matrix: None,
            reduced,
        })
    }

    /// Identity of `group`.
    pub fn identity(group: Arc<MarkedAbelianGroup>) -> Result<Self, HomologyError> {
        let n = group.chain_dim();
        Self::from_chain_map(group.clone(), group, IntMatrix::identity(n))
    }

    /// Inclusion of [`MarkedAbelianGroup::torsion_subgroup`] into `group`.
    pub fn torsion_inclusion(group: Arc<MarkedAbelianGroup>) -> Result<Self, HomologyError> {
        let sub = Arc::new(group.torsion_subgroup()?);
        let mut reduced = IntMatrix::zeros(group.generator_count(), sub.generator_count());
        for (col, i) in group.torsion_indices().enumerate() {
            reduced.set(i, col, 1);
        }
        Self::from_reduced(sub, group, reduced)
    }

    /// The restriction `tA → tB` between torsion subgroups.
    pub fn torsion_restriction(&self) -> Result<Self, HomologyError> {
        let sub_dom = Arc::new(self.domain.torsion_subgroup()?);
        let sub_rng = Arc::new(self.range.torsion_subgroup()?);
        let rows: Vec<usize> = self.range.torsion_indices().collect();
        let mut reduced = IntMatrix::zeros(rows.len(), sub_dom.generator_count());
        for (col, i) in self.domain.torsion_indices().enumerate() {
            let image = self.reduced.column(i);
            if image[..self.range.rank()].iter().any(|&v| v != 0) {
                return Err(HomologyError::UnsupportedHom("torsion class mapped to a free class".into()));
            }
            for (r, &j) in rows.iter().enumerate() {
                reduced.set(r, col, image[j]);
            }
        }
        Self::from_reduced(sub_dom, sub_rng, reduced)
    }

    pub fn domain(&self) -> &Arc<MarkedAbelianGroup> {
        &self.domain
    }

    pub fn range(&self) -> &Arc<MarkedAbelianGroup> {
        &self.range
    }

    pub fn chain_matrix(&self) -> Option<&IntMatrix> {
        self.chain_matrix.as_ref()
    }

    pub fn reduced_matrix(&self) -> &IntMatrix {
        &self.reduced
    }

    /// Image of a class given in domain coordinates.
    pub fn evaluate(&self, coords: &[i64]) -> Result<Vec<i64>, HomologyError> {
        Ok(self.range.reduce_coordinates(&self.reduced.mul_vec(coords)?))
    }

    /// ℤ-basis of `{a : F·a ≡ 0 in the range}` as columns.
    fn preimage_of_zero(&self) -> Result<IntMatrix, HomologyError> {
        let rel = torsion_relations(&self.range);
        let mut neg = rel.clone();
        for c in 0..neg.cols() {
            neg.negate_col(c);
        }
        let full = kernel_basis(&self.reduced.hstack(&neg)?)?;
        let n = self.domain.generator_count();
        Ok(full.select_rows(&(0..n).collect::<Vec<_>>()))
    }

    pub fn kernel(&self) -> Result<AbelianGroup, HomologyError> {
        let basis = self.preimage_of_zero()?;
        let dom_rel = torsion_relations(&self.domain);
        let mut coords = IntMatrix::zeros(basis.cols(), dom_rel.cols());
        for c in 0..dom_rel.cols() {
            let x = solve(&basis, &dom_rel.column(c))?;
            for (r, v) in x.into_iter().enumerate() {
                coords.set(r, c, v);
            }
        }
        AbelianGroup::from_relations(basis.cols(), &coords)
    }

    pub fn image(&self) -> Result<AbelianGroup, HomologyError> {
        let basis = self.preimage_of_zero()?;
        AbelianGroup::from_relations(self.domain.generator_count(), &basis)
    }

    pub fn cokernel(&self) -> Result<AbelianGroup, HomologyError> {
        let rel = self.reduced.hstack(&torsion_relations(&self.range))?;
        AbelianGroup::from_relations(self.range.generator_count(), &rel)
    }

    pub fn is_injective(&self) -> Result<bool, HomologyError> {
        Ok(self.kernel()?.is_trivial())
    }

    pub fn is_surjective(&self) -> Result<bool, HomologyError> {
        Ok(self.cokernel()?.is_trivial())
    }

    pub fn is_iso(&self) -> Result<bool, HomologyError> {
        Ok(self.is_injective()? && self.is_surjective()?)
    }

    pub fn is_zero(&self) -> bool {
        self.reduced.is_zero()
    }

    /// `self ∘ inner`, where `inner: A → B` and `self: B → C`.
    pub fn compose(&self, inner: &HomMarkedAbelianGroup) -> Result<Self, HomologyError> {
        if inner.range.generator_count() != self.domain.generator_count()
            || inner.range.chain_dim() != self.domain.chain_dim()
        {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("range with {} generators", self.domain.generator_count()),
                found: format!("{} generators", inner.range.generator_count()),
            });
        }
        let reduced = self.reduced.mul(&inner.reduced)?;
        let mut out = Self::from_reduced(inner.domain.clone(), self.range.clone(), reduced)?;
        if let (Some(a), Some(b)) = (&self.chain_matrix, &inner.chain_matrix) {
            out.chain_matrix = Some(a.mul(b)?);
        }
        Ok(out)
    }

    /// Inverse of an isomorphism.
    pub fn inverse(&self) -> Result<Self, HomologyError> {
        if !self.is_iso()? {
            return Err(HomologyError::UnsupportedHom("inverse of a non-isomorphism".into()));
        }
        let system = self.reduced.hstack(&torsion_relations(&self.range))?;
        let n = self.range.generator_count();
        let m = self.domain.generator_count();
        let mut inv = IntMatrix::zeros(m, n);
        for j in 0..n {
            let mut e = vec![0i64; n];
            e[j] = 1;
            let x = solve(&system, &e)?;
            for (i, v) in x.into_iter().take(m).enumerate() {
                inv.set(i, j, v);
            }
        }
        Self::from_reduced(self.range.clone(), self.domain.clone(), inv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cyclic(n: i64) -> Arc<MarkedAbelianGroup> {
        let m = IntMatrix::zeros(0, 1);
        let r = IntMatrix::from_rows(1, vec![vec![n]]).unwrap();
        Arc::new(MarkedAbelianGroup::new(m, r, 0).unwrap())
    }

    #[test]
    fn multiplication_maps() {
        let z6 = cyclic(6);
        let z3 = cyclic(3);
        // ℤ/6 → ℤ/3, 1 ↦ 1 (chain level identity on one generator)
        let f = HomMarkedAbelianGroup::from_chain_map(z6.clone(), z3, IntMatrix::identity(1)).unwrap();
        assert!(f.is_surjective().unwrap());
        assert_eq!(f.kernel().unwrap().torsion(), &[2]);
        assert!(!f.is_iso().unwrap());
        let g = HomMarkedAbelianGroup::from_reduced(z6.clone(), z6.clone(), IntMatrix::from_rows(1, vec![vec![5]]).unwrap()).unwrap();
        assert!(g.is_iso().unwrap());
        let inv = g.inverse().unwrap();
        let id = inv.compose(&g).unwrap();
        assert_eq!(id.evaluate(&[1]).unwrap(), vec![1]);
        let double = HomMarkedAbelianGroup::from_reduced(z6.clone(), z6, IntMatrix::from_rows(1, vec![vec![2]]).unwrap()).unwrap();
        assert_eq!(double.image().unwrap().torsion(), &[3]);
        assert_eq!(double.cokernel().unwrap().torsion(), &[2]);
    }

    #[test]
    fn restriction_to_torsion() {
        // ℤ ⊕ ℤ/6 with 1 ↦ 1 on ℤ and 1 ↦ 5 on ℤ/6
        let rel = IntMatrix::from_rows(1, vec![vec![0], vec![6]]).unwrap();
        let g = Arc::new(MarkedAbelianGroup::new(IntMatrix::zeros(0, 2), rel, 0).unwrap());
        assert_eq!(g.rank(), 1);
        let m = IntMatrix::from_rows(2, vec![vec![1, 0], vec![0, 5]]).unwrap();
        let f = HomMarkedAbelianGroup::from_reduced(g.clone(), g, m).unwrap();
        let t = f.torsion_restriction().unwrap();
        assert_eq!(t.domain().torsion(), &[6]);
        assert_eq!(t.evaluate(&[1]).unwrap(), vec![5]);
        assert!(t.is_iso().unwrap());
    }
}
