//! Bilinear forms on homology groups.
//!
//! A [`BilinearForm`] pairs generators of two marked groups into a third.
//! Forms built from cells keep the chain-level tensor (pairs of chart
//! positions to a sparse range chain) so they can also be evaluated on
//! chains that are not cycles; forms obtained by composition only know the
//! reduced pairing.
//!
//! The engine builds three kinds:
//!
//! * evaluation of cohomology on homology of one system,
//! * intersection of DUAL cycles with STD_REL_BDRY cycles, landing in MIX
//!   (or in the coefficient group when the dimensions add up to `n`),
//! * the torsion linking form of a closed or bounded 3-manifold.

use std::collections::BTreeMap;
use std::sync::Arc;

use itertools::Itertools;
use num_integer::Integer;
use num_rational::Ratio;
use num_traits::{Signed, Zero};

use crate::algebra::abelian_group::{AbelianGroup, MarkedAbelianGroup};
use crate::algebra::hom::HomMarkedAbelianGroup;
use crate::algebra::matrix::IntMatrix;
use crate::algebra::smith::{rank, solve};
use crate::cellular::cells::{mask_of, Loc, MixCell, StdCell};
use crate::cellular::coordinates::{
    CoordinateSystem, FormKind, FormLocator, GroupLocator, HomLocator, Variance,
};
use crate::cellular::engine::CellularData;
use crate::homology_error::HomologyError;
use crate::topology::perm::list_sign;

/// Sparse chain-level tensor: `(left position, right position) → range chain`.
pub type ChainTensor = BTreeMap<(usize, usize), Vec<(usize, i64)>>;

fn narrow(x: i128) -> Result<i64, HomologyError> {
    i64::try_from(x).map_err(|_| HomologyError::ArithmeticOverflow)
}

fn free_group(n: usize) -> Result<MarkedAbelianGroup, HomologyError> {
    MarkedAbelianGroup::new(IntMatrix::zeros(0, n), IntMatrix::zeros(n, 0), 0)
}

#[derive(Clone, Debug)]
pub struct BilinearForm {
    left: Arc<MarkedAbelianGroup>,
    right: Arc<MarkedAbelianGroup>,
    range: Arc<MarkedAbelianGroup>,
    tensor: Option<ChainTensor>,
    /// `pairing[a][b]` = range coordinates of `⟨e_a, f_b⟩`.
    pairing: Vec<Vec<Vec<i64>>>,
}

impl BilinearForm {
    /// Form induced by a chain-level tensor.
    pub fn from_tensor(
        left: Arc<MarkedAbelianGroup>,
        right: Arc<MarkedAbelianGroup>,
        range: Arc<MarkedAbelianGroup>,
        tensor: ChainTensor,
    ) -> Result<Self, HomologyError> {
        let lefts: Vec<Vec<i64>> = (0..left.generator_count())
            .map(|a| left.generator_chain(a))
            .collect::<Result<_, _>>()?;
        let rights: Vec<Vec<i64>> = (0..right.generator_count())
            .map(|b| right.generator_chain(b))
            .collect::<Result<_, _>>()?;
        let mut pairing = Vec::with_capacity(lefts.len());
        for x in &lefts {
            let mut row = Vec::with_capacity(rights.len());
            for y in &rights {
                let chain = apply_tensor(&tensor, range.chain_dim(), x, y)?;
                row.push(range.snf_coordinates(&chain)?);
            }
            pairing.push(row);
        }
        Ok(Self {
            left,
            right,
            range,
            tensor: Some(tensor),
            pairing,
        })
    }

    /// Form given by its reduced pairing `pairing[a][b]`.
    pub fn from_pairing(
        left: Arc<MarkedAbelianGroup>,
        right: Arc<MarkedAbelianGroup>,
        range: Arc<MarkedAbelianGroup>,
        pairing: Vec<Vec<Vec<i64>>>,
    ) -> Result<Self, HomologyError> {
        let shape_ok = pairing.len() == left.generator_count()
            && pairing.iter().all(|row| {
                row.len() == right.generator_count()
                    && row.iter().all(|v| v.len() == range.generator_count())
            });
        if !shape_ok {
            return Err(HomologyError::ShapeMismatch {
                expected: format!(
                    "{}x{}x{} pairing",
                    left.generator_count(),
                    right.generator_count(),
                    range.generator_count()
                ),
                found: format!("{} rows", pairing.len()),
            });
        }
        let pairing = pairing
            .into_iter()
            .map(|row| row.into_iter().map(|v| range.reduce_coordinates(&v)).collect())
            .collect();
        Ok(Self {
            left,
            right,
            range,
            tensor: None,
            pairing,
        })
    }

    pub fn left(&self) -> &Arc<MarkedAbelianGroup> {
        &self.left
    }

    pub fn right(&self) -> &Arc<MarkedAbelianGroup> {
        &self.right
    }

    pub fn range(&self) -> &Arc<MarkedAbelianGroup> {
        &self.range
    }

    pub fn tensor(&self) -> Option<&ChainTensor> {
        self.tensor.as_ref()
    }

    /// Range coordinates of `⟨e_a, f_b⟩`.
    pub fn reduced_pairing(&self, a: usize, b: usize) -> &[i64] {
        &self.pairing[a][b]
    }

    /// `⟨x, y⟩` for classes given in generator coordinates.
    pub fn evaluate(&self, x: &[i64], y: &[i64]) -> Result<Vec<i64>, HomologyError> {
        if x.len() != self.left.generator_count() || y.len() != self.right.generator_count() {
            return Err(HomologyError::ShapeMismatch {
                expected: format!(
                    "{} and {} coordinates",
                    self.left.generator_count(),
                    self.right.generator_count()
                ),
                found: format!("{} and {}", x.len(), y.len()),
            });
        }
        let mut acc = vec![0i128; self.range.generator_count()];
        for (a, &xa) in x.iter().enumerate() {
            if xa == 0 {
                continue;
            }
            for (b, &yb) in y.iter().enumerate() {
                if yb == 0 {
                    continue;
                }
                for (slot, &v) in acc.iter_mut().zip(&self.pairing[a][b]) {
                    *slot += xa as i128 * yb as i128 * v as i128;
                }
            }
        }
        let mut out = Vec::with_capacity(acc.len());
        for (i, v) in acc.into_iter().enumerate() {
            let order = self.range.generator_order(i) as i128;
            out.push(narrow(if order == 0 { v } else { v.rem_euclid(order) })?);
        }
        Ok(out)
    }

    /// Range chain of two arbitrary chains; only forms built from cells can
    /// do this.
    pub fn evaluate_chains(&self, x: &[i64], y: &[i64]) -> Result<Vec<i64>, HomologyError> {
        let tensor = self
            .tensor
            .as_ref()
            .ok_or_else(|| HomologyError::UnsupportedForm("form has no chain-level tensor".into()))?;
        apply_tensor(tensor, self.range.chain_dim(), x, y)
    }

    /// ℚ-rank of the adjoint `left → Hom(right, range)`.
    pub fn rank(&self) -> Result<usize, HomologyError> {
        let cols = self.right.generator_count() * self.range.generator_count();
        let mut m = IntMatrix::zeros(self.left.generator_count(), cols);
        for (a, row) in self.pairing.iter().enumerate() {
            for (b, v) in row.iter().enumerate() {
                for (r, &x) in v.iter().enumerate() {
                    // torsion values vanish rationally
                    if self.range.generator_order(r) == 0
                        && self.left.generator_order(a) == 0
                        && self.right.generator_order(b) == 0
                    {
                        m.set(a, b * self.range.generator_count() + r, x);
                    }
                }
            }
        }
        rank(&m)
    }

    fn same_sides(&self) -> bool {
        self.left.generator_count() == self.right.generator_count()
            && (0..self.left.generator_count())
                .all(|i| self.left.generator_order(i) == self.right.generator_order(i))
    }

    pub fn is_symmetric(&self) -> bool {
        self.same_sides()
            && (0..self.pairing.len())
                .all(|a| (0..a).all(|b| self.pairing[a][b] == self.pairing[b][a]))
    }

    pub fn is_antisymmetric(&self) -> bool {
        self.same_sides()
            && (0..self.pairing.len()).all(|a| {
                (0..=a).all(|b| {
                    let neg: Vec<i64> = self.pairing[b][a].iter().map(|&v| -v).collect();
                    self.pairing[a][b] == self.range.reduce_coordinates(&neg)
                })
            })
    }

    /// Subgroup of the range generated by all values.
    pub fn image(&self) -> Result<AbelianGroup, HomologyError> {
        let values: Vec<&Vec<i64>> = self.pairing.iter().flatten().collect();
        let mut m = IntMatrix::zeros(self.range.generator_count(), values.len());
        for (c, v) in values.iter().enumerate() {
            for (r, &x) in v.iter().enumerate() {
                m.set(r, c, x);
            }
        }
        let span = Arc::new(free_group(values.len())?);
        HomMarkedAbelianGroup::from_reduced(span, self.range.clone(), m)?.image()
    }

    fn cyclic_range(&self) -> Result<i64, HomologyError> {
        if self.range.generator_count() != 1 {
            return Err(HomologyError::UnsupportedForm(format!(
                "adjoint needs a cyclic range, found {}",
                self.range.group()
            )));
        }
        Ok(self.range.generator_order(0))
    }

    /// `Hom(g, ℤ/N)` on the chain generators of `g`, and the value each
    /// dual generator takes on its own summand.
    fn dual_group(g: &MarkedAbelianGroup, big_n: i64) -> Result<(MarkedAbelianGroup, Vec<i64>), HomologyError> {
        let m = g.generator_count();
        let mut rel = IntMatrix::zeros(m, m);
        let mut unit = Vec::with_capacity(m);
        for b in 0..m {
            let d = g.generator_order(b);
            let (order, u) = match (d, big_n) {
                (0, n) => (n, 1),
                (_, 0) => (1, 1),
                (d, n) => {
                    let k = d.gcd(&n);
                    (k, n / k)
                }
            };
            rel.set(b, b, order);
            unit.push(u);
        }
        Ok((MarkedAbelianGroup::new(IntMatrix::zeros(0, m), rel, 0)?, unit))
    }

    fn adjoint(&self, transpose: bool) -> Result<HomMarkedAbelianGroup, HomologyError> {
        let big_n = self.cyclic_range()?;
        let (from, to) = if transpose {
            (&self.right, &self.left)
        } else {
            (&self.left, &self.right)
        };
        let (dual, unit) = Self::dual_group(to, big_n)?;
        let dual = Arc::new(dual);
        let mut reduced = IntMatrix::zeros(dual.generator_count(), from.generator_count());
        for a in 0..from.generator_count() {
            let mut chain = Vec::with_capacity(to.generator_count());
            for (b, &u) in unit.iter().enumerate() {
                let v = if transpose { self.pairing[b][a][0] } else { self.pairing[a][b][0] };
                if v % u != 0 {
                    return Err(HomologyError::NoSolution);
                }
                chain.push(v / u);
            }
            for (r, x) in dual.snf_coordinates(&chain)?.into_iter().enumerate() {
                reduced.set(r, a, x);
            }
        }
        HomMarkedAbelianGroup::from_reduced(from.clone(), dual, reduced)
    }

    /// `x ↦ ⟨x, ·⟩` into `Hom(right, range)`; the range must be cyclic.
    pub fn left_adjoint(&self) -> Result<HomMarkedAbelianGroup, HomologyError> {
        self.adjoint(false)
    }

    /// `y ↦ ⟨·, y⟩` into `Hom(left, range)`; the range must be cyclic.
    pub fn right_adjoint(&self) -> Result<HomMarkedAbelianGroup, HomologyError> {
        self.adjoint(true)
    }

    /// Both adjoints are isomorphisms.
    pub fn is_nondegenerate(&self) -> Result<bool, HomologyError> {
        Ok(self.left_adjoint()?.is_iso()? && self.right_adjoint()?.is_iso()?)
    }

    /// `⟨f(x), g(y)⟩` for `f: A → left`, `g: B → right`.
    pub fn precompose(
        &self,
        f: &HomMarkedAbelianGroup,
        g: &HomMarkedAbelianGroup,
    ) -> Result<BilinearForm, HomologyError> {
        let (fm, gm) = (f.reduced_matrix(), g.reduced_matrix());
        if fm.rows() != self.left.generator_count() || gm.rows() != self.right.generator_count() {
            return Err(HomologyError::ShapeMismatch {
                expected: format!(
                    "maps into {} and {} generators",
                    self.left.generator_count(),
                    self.right.generator_count()
                ),
                found: format!("{} and {}", fm.rows(), gm.rows()),
            });
        }
        let mut pairing = Vec::with_capacity(fm.cols());
        for a in 0..fm.cols() {
            let x = fm.column(a);
            let mut row = Vec::with_capacity(gm.cols());
            for b in 0..gm.cols() {
                row.push(self.evaluate(&x, &gm.column(b))?);
            }
            pairing.push(row);
        }
        Self::from_pairing(f.domain().clone(), g.domain().clone(), self.range.clone(), pairing)
    }

    /// `⟨f(x), y⟩`.
    pub fn left_compose(&self, f: &HomMarkedAbelianGroup) -> Result<BilinearForm, HomologyError> {
        let id = HomMarkedAbelianGroup::identity(self.right.clone())?;
        self.precompose(f, &id)
    }

    /// `(y, x) ↦ ⟨x, y⟩`.
    pub fn transpose(&self) -> BilinearForm {
        let pairing = (0..self.right.generator_count())
            .map(|b| self.pairing.iter().map(|row| row[b].clone()).collect())
            .collect();
        let tensor = self
            .tensor
            .as_ref()
            .map(|t| t.iter().map(|(&(p, q), v)| ((q, p), v.clone())).collect());
        Self {
            left: self.right.clone(),
            right: self.left.clone(),
            range: self.range.clone(),
            tensor,
            pairing,
        }
    }

    /// `⟨x, g(y)⟩`.
    pub fn right_compose(&self, g: &HomMarkedAbelianGroup) -> Result<BilinearForm, HomologyError> {
        let id = HomMarkedAbelianGroup::identity(self.left.clone())?;
        self.precompose(&id, g)
    }

    /// `h(⟨x, y⟩)` for `h: range → R`.
    pub fn post_compose(&self, h: &HomMarkedAbelianGroup) -> Result<BilinearForm, HomologyError> {
        let pairing = self
            .pairing
            .iter()
            .map(|row| row.iter().map(|v| h.evaluate(v)).collect::<Result<Vec<_>, _>>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_pairing(self.left.clone(), self.right.clone(), h.range().clone(), pairing)
    }

    /// Integer Gram matrix on the free generators of a ℤ-valued form.
    pub fn gram_matrix(&self) -> Result<IntMatrix, HomologyError> {
        if self.range.generator_count() != 1 || self.range.generator_order(0) != 0 {
            return Err(HomologyError::UnsupportedForm(format!(
                "Gram matrix of a form valued in {}",
                self.range.group()
            )));
        }
        let (r, s) = (self.left.rank(), self.right.rank());
        let mut m = IntMatrix::zeros(r, s);
        for a in 0..r {
            for b in 0..s {
                m.set(a, b, self.pairing[a][b][0]);
            }
        }
        Ok(m)
    }

    /// Signature of a symmetric ℤ-valued form.
    pub fn signature(&self) -> Result<i64, HomologyError> {
        if !self.is_symmetric() {
            return Err(HomologyError::UnsupportedForm("signature of a non-symmetric form".into()));
        }
        signature_of(&self.gram_matrix()?)
    }

    /// `(odd, definiteness)` of a symmetric ℤ-valued form: odd when some
    /// `⟨e, e⟩` is odd, definiteness `+1`/`−1` for a positive/negative
    /// definite Gram matrix and `0` otherwise (indefinite, degenerate or
    /// empty).
    pub fn form_type(&self) -> Result<(bool, i8), HomologyError> {
        if !self.is_symmetric() {
            return Err(HomologyError::UnsupportedForm("type of a non-symmetric form".into()));
        }
        let gram = self.gram_matrix()?;
        let odd = (0..gram.rows()).any(|i| gram.get(i, i) % 2 != 0);
        let (pos, neg, _) = inertia(&gram)?;
        let n = gram.rows();
        let definiteness = match (pos, neg) {
            _ if n == 0 => 0,
            (p, 0) if p == n => 1,
            (0, q) if q == n => -1,
            _ => 0,
        };
        Ok((odd, definiteness))
    }
}

fn apply_tensor(tensor: &ChainTensor, dim: usize, x: &[i64], y: &[i64]) -> Result<Vec<i64>, HomologyError> {
    let mut acc = vec![0i128; dim];
    for (&(p, q), terms) in tensor {
        let (xp, yq) = (x.get(p).copied().unwrap_or(0), y.get(q).copied().unwrap_or(0));
        if xp == 0 || yq == 0 {
            continue;
        }
        for &(r, c) in terms {
            acc[r] += xp as i128 * yq as i128 * c as i128;
        }
    }
    acc.into_iter().map(narrow).collect()
}

/// Signature of a symmetric integer matrix.
pub fn signature_of(m: &IntMatrix) -> Result<i64, HomologyError> {
    let (pos, neg, _) = inertia(m)?;
    Ok(pos as i64 - neg as i64)
}

/// `(positive, negative, zero)` counts of a symmetric integer matrix by
/// congruence diagonalization over ℚ.
pub fn inertia(m: &IntMatrix) -> Result<(usize, usize, usize), HomologyError> {
    let n = m.rows();
    let mut a: Vec<Vec<Ratio<i128>>> = (0..n)
        .map(|r| (0..n).map(|c| Ratio::from_integer(m.get(r, c) as i128)).collect())
        .collect();
    let (mut pos, mut neg) = (0usize, 0usize);
    let mut k = 0;
    while k < n {
        // 1. bring a nonzero diagonal entry to position k
        if a[k][k].is_zero() {
            if let Some(p) = (k + 1..n).find(|&p| !a[p][p].is_zero()) {
                a.swap(k, p);
                for row in a.iter_mut() {
                    row.swap(k, p);
                }
            } else if let Some(p) = (k + 1..n).find(|&p| !a[k][p].is_zero()) {
                // e_k ↦ e_k + e_p gives diagonal 2·a[k][p]
                for c in 0..n {
                    let v = a[p][c];
                    a[k][c] += v;
                }
                for r in 0..n {
                    let v = a[r][p];
                    a[r][k] += v;
                }
            } else {
                k += 1;
                continue;
            }
        }
        // 2. Schur complement on the remaining block
        let pivot = a[k][k];
        for r in k + 1..n {
            let f = a[r][k] / pivot;
            if f.is_zero() {
                continue;
            }
            for c in k + 1..n {
                let v = a[k][c];
                a[r][c] -= f * v;
            }
        }
        for t in k + 1..n {
            a[t][k] = Ratio::zero();
            a[k][t] = Ratio::zero();
        }
        if pivot.is_positive() {
            pos += 1;
        } else {
            neg += 1;
        }
        k += 1;
    }
    Ok((pos, neg, n - pos - neg))
}

fn unsupported(loc: &FormLocator) -> HomologyError {
    HomologyError::UnsupportedForm(loc.to_string())
}

impl CellularData {
    pub(crate) fn build_form(&self, loc: &FormLocator) -> Result<BilinearForm, HomologyError> {
        match loc.kind {
            FormKind::Evaluation => self.evaluation_form(loc),
            FormKind::Intersection => self.intersection_form(loc),
            FormKind::TorsionLinking => self.linking_form(loc),
            FormKind::CupProduct => Err(unsupported(loc)),
        }
    }

    /// The torsion linking form `tH₁ × tH₁ → ℚ/ℤ` of a 3-manifold.
    pub(crate) fn torsion_linking_form(&self) -> Result<Arc<BilinearForm>, HomologyError> {
        if self.ambient_dim() != 3 {
            return Err(HomologyError::UnsupportedForm(format!(
                "torsion linking form in dimension {}",
                self.ambient_dim()
            )));
        }
        let h1 = GroupLocator::homology(1, CoordinateSystem::Dual);
        self.form(&FormLocator::new(FormKind::TorsionLinking, h1, h1))
    }

    fn evaluation_form(&self, loc: &FormLocator) -> Result<BilinearForm, HomologyError> {
        let (l, r) = (loc.left, loc.right);
        let matched = l.variance == Variance::Covariant
            && r.variance == Variance::Contravariant
            && l.system == r.system
            && l.dim == r.dim
            && l.modulus == r.modulus;
        if !matched {
            return Err(unsupported(loc));
        }
        let left = self.marked_group(&l)?;
        let right = self.marked_group(&r)?;
        let range = Arc::new(MarkedAbelianGroup::cyclic(l.modulus_i64()?)?);
        let tensor: ChainTensor = (0..left.chain_dim()).map(|p| ((p, p), vec![(0, 1)])).collect();
        BilinearForm::from_tensor(left, right, range, tensor)
    }

    fn intersection_form(&self, loc: &FormLocator) -> Result<BilinearForm, HomologyError> {
        let (l, r) = (loc.left, loc.right);
        let n = self.ambient_dim();
        let shape_ok = l.variance == Variance::Covariant
            && r.variance == Variance::Covariant
            && l.modulus == r.modulus
            && l.dim + r.dim >= n;
        if !shape_ok {
            return Err(unsupported(loc));
        }
        if !self.is_orientable() && l.modulus != 2 {
            return Err(HomologyError::NonOrientableZForm);
        }
        let dual = l.with_system(CoordinateSystem::Dual);
        let rel = r.with_system(CoordinateSystem::StdRelBdry);
        if l.system == CoordinateSystem::Dual && r.system == CoordinateSystem::StdRelBdry {
            let tensor = self.intersection_tensor(l.dim, r.dim)?;
            let left = self.marked_group(&l)?;
            let right = self.marked_group(&r)?;
            let range = self.intersection_range(&l, l.dim + r.dim - n)?;
            return BilinearForm::from_tensor(left, right, range, tensor);
        }
        // other coordinates go through the natural maps
        let core = self.form(&FormLocator::new(FormKind::Intersection, dual, rel))?;
        let f = self.hom(&HomLocator::new(l, dual))?;
        let g = self.hom(&HomLocator::new(r, rel))?;
        core.precompose(&f, &g)
    }

    fn intersection_range(
        &self,
        base: &GroupLocator,
        d: usize,
    ) -> Result<Arc<MarkedAbelianGroup>, HomologyError> {
        if d == 0 {
            Ok(Arc::new(MarkedAbelianGroup::cyclic(base.modulus_i64()?)?))
        } else {
            self.marked_group(&GroupLocator::new(d, Variance::Covariant, CoordinateSystem::Mix, base.modulus))
        }
    }

    /// Chain-level intersection of DUAL `i`-cells with STD_REL_BDRY
    /// `j`-cells. The dual cell of a face `τ` meets an interior `j`-face `σ`
    /// only when `τ ⊂ σ`, in the MIX cell `(σ, T)` spanned by the positions
    /// `T` of `τ` in `σ`. With `i + j = n` that cell is the barycenter of
    /// `σ = τ` and the tensor is collapsed onto the augmentation.
    pub(crate) fn intersection_tensor(&self, i: usize, j: usize) -> Result<ChainTensor, HomologyError> {
        let (sk, reg) = (self.skeleton(), self.registry());
        let n = self.ambient_dim();
        if i + j < n {
            return Err(HomologyError::UnsupportedForm(format!(
                "intersection of dimensions {i} and {j} in dimension {n}"
            )));
        }
        let d = i + j - n;
        let dual = reg.std_chart(CoordinateSystem::Dual, i)?;
        let rel = reg.std_chart(CoordinateSystem::StdRelBdry, j)?;
        let mix = reg.mix_chart(CoordinateSystem::Mix, d)?;
        let orientable = self.is_orientable();
        let tau_dim = n - i;

        let mut acc: BTreeMap<(usize, usize), BTreeMap<usize, i64>> = BTreeMap::new();
        for (q, &sigma) in rel.iter().enumerate() {
            let StdCell::Face(s) = sigma else {
                continue;
            };
            let emb = sk.canonical(j, s);
            let s0 = emb.simplex;
            let eps = sk.simplex_sign(s0);
            for t in (0..=j).combinations(tau_dim + 1) {
                let sub: Vec<usize> = t.iter().map(|&p| emb.vertices[p]).collect();
                let look = sk.face_at(s0, &sub)?;
                let Some(p) = dual.position(&StdCell::Face(look.index)) else {
                    continue;
                };
                let local = match sk.local_orientation(look.dim, look.index, s0, &sub) {
                    Some(e) => e,
                    None if !orientable => 1,
                    None => return Err(HomologyError::NonOrientableZForm),
                };
                let coef = local * eps * list_sign(&sub, look.canon);
                let row = if d == 0 {
                    0
                } else {
                    let cell = MixCell {
                        k: j,
                        sigma,
                        loc: Loc::Span(mask_of(t.iter().copied())),
                    };
                    mix.position(&cell).ok_or_else(|| {
                        HomologyError::InvalidTriangulation(format!("{cell:?} is not a MIX cell"))
                    })?
                };
                *acc.entry((p, q)).or_default().entry(row).or_insert(0) += coef;
            }
        }
        Ok(acc
            .into_iter()
            .filter_map(|(key, terms)| {
                let terms: Vec<(usize, i64)> = terms.into_iter().filter(|&(_, c)| c != 0).collect();
                (!terms.is_empty()).then_some((key, terms))
            })
            .collect())
    }

    /// `lk(x, y) = (x · Y) / ord(y)` where `∂Y = ord(y)·y`, scaled into
    /// `ℤ/N` with `N` the exponent shared by both torsion groups. On a
    /// non-orientable manifold only the mod 2 count of `x · Y` is defined
    /// and the form is valued in `ℤ/2`.
    fn linking_form(&self, loc: &FormLocator) -> Result<BilinearForm, HomologyError> {
        use CoordinateSystem::*;
        let (l, r) = (loc.left, loc.right);
        let n = self.ambient_dim();
        let shape_ok = l.variance == Variance::Covariant
            && r.variance == Variance::Covariant
            && l.modulus == 0
            && r.modulus == 0
            && matches!(r.system, Dual | Std | Mix | StdRelBdry | MixRelBdry)
            && l.dim + r.dim + 1 == n;
        if !shape_ok {
            return Err(unsupported(loc));
        }
        match l.system {
            Dual => self.linking_form_on_dual(loc),
            Std | Mix => {
                let dual = l.with_system(Dual);
                let core = self.form(&FormLocator::new(FormKind::TorsionLinking, dual, r))?;
                let f = self.hom(&HomLocator::new(l, dual))?.torsion_restriction()?;
                core.left_compose(&f)
            }
            // relative classes only link with absolute ones
            StdRelBdry | MixRelBdry if matches!(r.system, Dual | Std | Mix) => {
                Ok(self.form(&FormLocator::new(FormKind::TorsionLinking, r, l))?.transpose())
            }
            _ => Err(unsupported(loc)),
        }
    }

    fn linking_form_on_dual(&self, loc: &FormLocator) -> Result<BilinearForm, HomologyError> {
        let (l, r) = (loc.left, loc.right);
        let orientable = self.is_orientable();
        let left_group = self.marked_group(&l)?;
        let right_group = self.marked_group(&r)?;
        let rel_loc = r.with_system(CoordinateSystem::StdRelBdry);
        let rel_group = self.marked_group(&rel_loc)?;
        let to_rel = if r.system == CoordinateSystem::StdRelBdry {
            None
        } else {
            Some(self.hom(&HomLocator::new(r, rel_loc))?)
        };

        let exponent = |g: &MarkedAbelianGroup| g.torsion().last().copied().unwrap_or(1);
        let big_n = if orientable {
            exponent(&left_group).gcd(&exponent(&right_group))
        } else {
            2
        };
        let range = Arc::new(MarkedAbelianGroup::cyclic(big_n)?);

        // 1. bounding chains for the right-hand torsion generators
        let boundary = self.integer_chain_complex(r.dim + 1, CoordinateSystem::StdRelBdry)?;
        let mut bounding = Vec::new();
        for b in right_group.torsion_indices() {
            let mut e = vec![0i64; right_group.generator_count()];
            e[b] = 1;
            let coords = match &to_rel {
                Some(h) => h.evaluate(&e)?,
                None => e,
            };
            let y = rel_group.chain_from_coordinates(&coords)?;
            let ord = right_group.generator_order(b);
            let target: Vec<i64> = y.iter().map(|&v| v * ord).collect();
            bounding.push((ord, solve(&boundary, &target)?));
        }

        // 2. intersect with the left-hand generators
        let aug = self.intersection_tensor(l.dim, r.dim + 1)?;
        let mut pairing = Vec::new();
        for a in left_group.torsion_indices() {
            let x = left_group.generator_chain(a)?;
            let mut row = Vec::with_capacity(bounding.len());
            for (ord, big_y) in &bounding {
                let v = apply_tensor(&aug, 1, &x, big_y)?[0] as i128;
                if !orientable {
                    row.push(vec![narrow(v.rem_euclid(2))?]);
                    continue;
                }
                let scaled = v * big_n as i128;
                if scaled % *ord as i128 != 0 {
                    return Err(HomologyError::NoSolution);
                }
                row.push(vec![narrow((scaled / *ord as i128).rem_euclid(big_n as i128))?]);
            }
            pairing.push(row);
        }
        log::debug!("torsion linking form {loc} valued in Z/{big_n}");
        let left = Arc::new(left_group.torsion_subgroup()?);
        let right = Arc::new(right_group.torsion_subgroup()?);
        BilinearForm::from_pairing(left, right, range, pairing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::triangulation::Triangulation;

    #[test]
    fn signature_of_small_matrices() {
        let m = |rows: Vec<Vec<i64>>| IntMatrix::from_rows(rows.len(), rows).unwrap();
        assert_eq!(signature_of(&m(vec![vec![1, 0], vec![0, -1]])).unwrap(), 0);
        assert_eq!(signature_of(&m(vec![vec![0, 1], vec![1, 0]])).unwrap(), 0);
        assert_eq!(signature_of(&m(vec![vec![2, 1], vec![1, 2]])).unwrap(), 2);
        assert_eq!(
            signature_of(&m(vec![vec![0, 0, 1], vec![0, -1, 0], vec![1, 0, 0]])).unwrap(),
            -1
        );
        assert_eq!(signature_of(&m(vec![vec![0, 0], vec![0, 0]])).unwrap(), 0);
    }

    fn integer_form(rows: &[&[i64]]) -> BilinearForm {
        let g = Arc::new(free_group(rows.len()).unwrap());
        let z = Arc::new(MarkedAbelianGroup::cyclic(0).unwrap());
        let pairing = rows.iter().map(|r| r.iter().map(|&v| vec![v]).collect()).collect();
        BilinearForm::from_pairing(g.clone(), g, z, pairing).unwrap()
    }

    #[test]
    fn parity_and_definiteness() {
        assert_eq!(integer_form(&[&[1]]).form_type().unwrap(), (true, 1));
        assert_eq!(integer_form(&[&[-1, 0], &[0, -1]]).form_type().unwrap(), (true, -1));
        assert_eq!(integer_form(&[&[0, 1], &[1, 0]]).form_type().unwrap(), (false, 0));
        assert_eq!(integer_form(&[&[2, 1], &[1, 2]]).form_type().unwrap(), (false, 1));
        assert_eq!(integer_form(&[&[1, 0], &[0, -1]]).form_type().unwrap(), (true, 0));
        // degenerate forms are not definite
        assert_eq!(integer_form(&[&[1, 0], &[0, 0]]).form_type().unwrap(), (true, 0));
        assert!(integer_form(&[&[0, 1], &[2, 0]]).form_type().is_err());
        assert_eq!(inertia(&integer_form(&[&[0, 1], &[1, 0]]).gram_matrix().unwrap()).unwrap(), (1, 1, 0));
    }

    #[test]
    fn transpose_swaps_the_arguments() {
        let f = integer_form(&[&[0, 1], &[2, 0]]);
        let t = f.transpose();
        assert_eq!(t.reduced_pairing(0, 1), &[2]);
        assert_eq!(t.reduced_pairing(1, 0), &[1]);
        assert_eq!(t.evaluate(&[1, 3], &[5, 7]).unwrap(), f.evaluate(&[5, 7], &[1, 3]).unwrap());
    }

    #[test]
    fn evaluation_is_perfect_on_free_part() {
        let data = CellularData::new(&Triangulation::lens_space(3, 1).unwrap()).unwrap();
        let h3 = GroupLocator::homology(3, CoordinateSystem::Std);
        let c3 = GroupLocator::cohomology(3, CoordinateSystem::Std);
        let form = data.form(&FormLocator::new(FormKind::Evaluation, h3, c3)).unwrap();
        assert_eq!(form.reduced_pairing(0, 0).len(), 1);
        assert_eq!(form.reduced_pairing(0, 0)[0].abs(), 1);
    }

    #[test]
    fn lens_space_linking_form() {
        let data = CellularData::new(&Triangulation::lens_space(5, 2).unwrap()).unwrap();
        let form = data.torsion_linking_form().unwrap();
        assert_eq!(form.range().group().torsion(), &[5]);
        let v = form.reduced_pairing(0, 0)[0];
        // ±2 or ±3 up to squares of units mod 5
        assert!([2, 3].contains(&v), "{v}");
        assert!(form.is_symmetric());
        assert!(form.is_nondegenerate().unwrap());
    }
}
