//! Finitely generated abelian groups, bare and marked.
//!
//! A [`MarkedAbelianGroup`] is the homology `ker M / im N` of a piece of
//! chain complex `ℤⁿ --M--> ℤ^q` fed by `ℤ^p --N--> ℤⁿ`, with coefficients
//! in `ℤ/c` (`c = 0` meaning ℤ). It keeps the presentation so cycles can be
//! converted to Smith-normal-form coordinates and generators back to chains.
//!
//! Coordinates list the free generators first, then the torsion generators in
//! divisibility order.

use std::fmt;

use crate::algebra::matrix::IntMatrix;
use crate::algebra::smith::{SmithForm, invariant_factors, smith_form};
use crate::homology_error::HomologyError;

/// Isomorphism type `ℤ^rank ⊕ ℤ/d₁ ⊕ … ⊕ ℤ/d_k` with `1 < d₁ | d₂ | … | d_k`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct AbelianGroup {
    rank: usize,
    torsion: Vec<i64>,
}

impl AbelianGroup {
    /// Build from a rank and a list of cyclic orders (any order, 0 = infinite).
    pub fn new(rank: usize, orders: &[i64]) -> Result<Self, HomologyError> {
        let mut rank = rank;
        let mut finite = Vec::new();
        for &d in orders {
            match d.abs() {
                0 => rank += 1,
                1 => {}
                d => finite.push(d),
            }
        }
        let diag = IntMatrix::from_rows(
            finite.len(),
            (0..finite.len())
                .map(|i| {
                    let mut row = vec![0; finite.len()];
                    row[i] = finite[i];
                    row
                })
                .collect(),
        )?;
        let torsion = invariant_factors(&diag)?.into_iter().filter(|&d| d > 1).collect();
        Ok(Self { rank, torsion })
    }

    pub fn trivial() -> Self {
        Self::default()
    }

    /// `ℤ^gens` modulo the column span of `relations`.
    pub fn from_relations(gens: usize, relations: &IntMatrix) -> Result<Self, HomologyError> {
        if relations.rows() != gens {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("{gens} rows"),
                found: format!("{} rows", relations.rows()),
            });
        }
        let diag = invariant_factors(relations)?;
        Ok(Self {
            rank: gens - diag.len(),
            torsion: diag.into_iter().filter(|&d| d > 1).collect(),
        })
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn torsion(&self) -> &[i64] {
        &self.torsion
    }

    pub fn is_trivial(&self) -> bool {
        self.rank == 0 && self.torsion.is_empty()
    }

    pub fn is_free(&self) -> bool {
        self.torsion.is_empty()
    }

    /// Number of generators in the invariant-factor decomposition.
    pub fn generator_count(&self) -> usize {
        self.rank + self.torsion.len()
    }

    /// Order of the group, `None` when infinite.
    pub fn order(&self) -> Option<i64> {
        if self.rank > 0 {
            return None;
        }
        self.torsion.iter().try_fold(1i64, |acc, &d| acc.checked_mul(d))
    }

    /// Order of the torsion subgroup.
    pub fn torsion_order(&self) -> Option<i64> {
        self.torsion.iter().try_fold(1i64, |acc, &d| acc.checked_mul(d))
    }
}

impl fmt::Display for AbelianGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_trivial() {
            return write!(f, "0");
        }
        let mut parts = Vec::new();
        match self.rank {
            0 => {}
            1 => parts.push("Z".to_string()),
            r => parts.push(format!("{r} Z")),
        }
        let mut i = 0;
        while i < self.torsion.len() {
            let d = self.torsion[i];
            let run = self.torsion[i..].iter().take_while(|&&x| x == d).count();
            if run == 1 {
                parts.push(format!("Z_{d}"));
            } else {
                parts.push(format!("{run} Z_{d}"));
            }
            i += run;
        }
        write!(f, "{}", parts.join(" + "))
    }
}

/// Homology group `ker M / im N` with `ℤ/c` coefficients, keeping chain-level data.
#[derive(Clone, Debug)]
pub struct MarkedAbelianGroup {
    out_matrix: IntMatrix,
    in_matrix: IntMatrix,
    modulus: i64,
    /// ℤ-basis of the cycle lattice `{x : Mx ≡ 0 mod c}` as columns.
    cycles: IntMatrix,
    /// Left inverse of `cycles` on the (extended) cycle lattice.
    coords: IntMatrix,
    relations: SmithForm,
    group: AbelianGroup,
    /// Positions in the relation Smith basis, in output order.
    positions: Vec<usize>,
}

impl MarkedAbelianGroup {
    /// Homology of `ℤ^p --N--> ℤⁿ --M--> ℤ^q` with `ℤ/modulus` coefficients.
    pub fn new(out_matrix: IntMatrix, in_matrix: IntMatrix, modulus: i64) -> Result<Self, HomologyError> {
        let n = out_matrix.cols();
        if in_matrix.rows() != n {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("incoming matrix with {n} rows"),
                found: format!("{} rows", in_matrix.rows()),
            });
        }
        if modulus < 0 {
            return Err(HomologyError::ShapeMismatch {
                expected: "non-negative modulus".into(),
                found: modulus.to_string(),
            });
        }
        let q = out_matrix.rows();

        let (cycles, coords) = if q == 0 {
            (IntMatrix::identity(n), IntMatrix::identity(n))
        } else if modulus == 0 {
            let snf = smith_form(&out_matrix)?;
            let r = snf.rank();
            (
                snf.v.select_columns(&(r..n).collect::<Vec<_>>()),
                snf.v_inv.select_rows(&(r..n).collect::<Vec<_>>()),
            )
        } else {
            let mut scaled = IntMatrix::zeros(q, q);
            for i in 0..q {
                scaled.set(i, i, -modulus);
            }
            let extended = out_matrix.hstack(&scaled)?;
            let snf = smith_form(&extended)?;
            let r = snf.rank();
            let keep: Vec<usize> = (r..n + q).collect();
            let full = snf.v.select_columns(&keep);
            (
                full.select_rows(&(0..n).collect::<Vec<_>>()),
                snf.v_inv.select_rows(&keep),
            )
        };

        // Generators of the boundary lattice (plus c·ℤⁿ), in cycle coordinates.
        let mut image = in_matrix.clone();
        if modulus != 0 {
            let mut c_id = IntMatrix::zeros(n, n);
            for i in 0..n {
                c_id.set(i, i, modulus);
            }
            image = image.hstack(&c_id)?;
        }
        let extended_image = if modulus != 0 && q > 0 {
            // Pair each generator x with M·x / c.
            let mut tail = IntMatrix::zeros(q, image.cols());
            for j in in_matrix.cols()..image.cols() {
                let col = j - in_matrix.cols();
                for r in 0..q {
                    tail.set(r, j, out_matrix.get(r, col));
                }
            }
            stack_rows(&image, &tail)
        } else {
            image
        };
        let relation_matrix = coords.mul(&extended_image)?;
        let relations = smith_form(&relation_matrix)?;

        let k = cycles.cols();
        let r = relations.rank();
        let mut positions: Vec<usize> = (r..k).collect();
        let mut torsion = Vec::new();
        for (i, &d) in relations.diag.iter().enumerate() {
            if d > 1 {
                positions.push(i);
                torsion.push(d);
            }
        }
        let group = AbelianGroup {
            rank: k - r,
            torsion,
        };
        log::trace!(
            "marked group: chains={n} cycles={k} relations={} -> {group}",
            relation_matrix.cols()
        );
        Ok(Self {
            out_matrix,
            in_matrix,
            modulus,
            cycles,
            coords,
            relations,
            group,
            positions,
        })
    }

    #[inline]
    pub fn group(&self) -> &AbelianGroup {
        &self.group
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.group.rank
    }

    #[inline]
    pub fn torsion(&self) -> &[i64] {
        &self.group.torsion
    }

    #[inline]
    pub fn modulus(&self) -> i64 {
        self.modulus
    }

    /// Rank of the underlying chain group.
    #[inline]
    pub fn chain_dim(&self) -> usize {
        self.out_matrix.cols()
    }

    pub fn out_matrix(&self) -> &IntMatrix {
        &self.out_matrix
    }

    pub fn in_matrix(&self) -> &IntMatrix {
        &self.in_matrix
    }

    pub fn is_trivial(&self) -> bool {
        self.group.is_trivial()
    }

    /// Number of generators (free first, then torsion).
    pub fn generator_count(&self) -> usize {
        self.positions.len()
    }

    /// Order of generator `i`; 0 for a free generator.
    pub fn generator_order(&self, i: usize) -> i64 {
        if i < self.group.rank {
            0
        } else {
            self.group.torsion[i - self.group.rank]
        }
    }

    /// Indices of the torsion generators.
    pub fn torsion_indices(&self) -> std::ops::Range<usize> {
        self.group.rank..self.positions.len()
    }

    /// Is `chain` a cycle (modulo `c`)?
    pub fn is_cycle(&self, chain: &[i64]) -> Result<bool, HomologyError> {
        let image = self.out_matrix.mul_vec(chain)?;
        Ok(image.iter().all(|&x| self.reduce(x) == 0))
    }

    fn reduce(&self, x: i64) -> i64 {
        if self.modulus == 0 { x } else { x.rem_euclid(self.modulus) }
    }

    /// Coordinates of the cycle `chain` in the generator basis.
    ///
    /// Free coordinates are exact, torsion coordinates are reduced modulo
    /// their generator's order.
    pub fn snf_coordinates(&self, chain: &[i64]) -> Result<Vec<i64>, HomologyError> {
        let image = self.out_matrix.mul_vec(chain)?;
        let lifted: Vec<i64> = if self.modulus == 0 {
            if image.iter().any(|&x| x != 0) {
                return Err(HomologyError::NotACycle);
            }
            chain.to_vec()
        } else if self.out_matrix.rows() == 0 {
            chain.to_vec()
        } else {
            let mut v = chain.to_vec();
            for x in image {
                if x % self.modulus != 0 {
                    return Err(HomologyError::NotACycle);
                }
                v.push(x / self.modulus);
            }
            v
        };
        let in_cycles = self.coords.mul_vec(&lifted)?;
        let smith = self.relations.u.mul_vec(&in_cycles)?;
        Ok(self
            .positions
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let order = self.generator_order(i);
                if order == 0 { smith[p] } else { smith[p].rem_euclid(order) }
            })
            .collect())
    }

    /// Reduce a coordinate vector modulo the generator orders.
    pub fn reduce_coordinates(&self, coords: &[i64]) -> Vec<i64> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let order = self.generator_order(i);
                if order == 0 { x } else { x.rem_euclid(order) }
            })
            .collect()
    }

    /// Does `chain` represent the zero class?
    pub fn is_boundary(&self, chain: &[i64]) -> Result<bool, HomologyError> {
        Ok(self.snf_coordinates(chain)?.iter().all(|&x| x == 0))
    }

    /// A cycle representing generator `i`.
    pub fn generator_chain(&self, i: usize) -> Result<Vec<i64>, HomologyError> {
        let p = self.positions[i];
        let col = self.relations.u_inv.column(p);
        let chain = self.cycles.mul_vec(&col)?;
        Ok(chain.into_iter().map(|x| self.reduce(x)).collect())
    }

    /// A cycle representing the class with the given coordinates.
    pub fn chain_from_coordinates(&self, coords: &[i64]) -> Result<Vec<i64>, HomologyError> {
        if coords.len() != self.generator_count() {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("{} coordinates", self.generator_count()),
                found: format!("{} coordinates", coords.len()),
            });
        }
        let mut chain = vec![0i64; self.chain_dim()];
        for (i, &a) in coords.iter().enumerate() {
            if a == 0 {
                continue;
            }
            for (slot, g) in chain.iter_mut().zip(self.generator_chain(i)?) {
                *slot = crate::algebra::matrix::checked_axpy(*slot, a, g)?;
            }
        }
        Ok(chain.into_iter().map(|x| self.reduce(x)).collect())
    }

    /// Direct sum of two groups with the same coefficients.
    pub fn direct_sum(&self, other: &MarkedAbelianGroup) -> Result<MarkedAbelianGroup, HomologyError> {
        if self.modulus != other.modulus {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("modulus {}", self.modulus),
                found: format!("modulus {}", other.modulus),
            });
        }
        MarkedAbelianGroup::new(
            self.out_matrix.block_diagonal(&other.out_matrix),
            self.in_matrix.block_diagonal(&other.in_matrix),
            self.modulus,
        )
    }

    /// `ℤ/c` presented on a single chain generator.
    pub fn cyclic(modulus: i64) -> Result<MarkedAbelianGroup, HomologyError> {
        MarkedAbelianGroup::new(IntMatrix::zeros(0, 1), IntMatrix::zeros(1, 0), modulus)
    }

    /// Matrix `Q` with `snf_coordinates(x) ≡ Q·x` on integral cycles.
    ///
    /// Only integral groups have a linear coordinate map on chains; with
    /// `ℤ/c` coefficients a cycle must first be lifted.
    pub fn coordinate_matrix(&self) -> Result<IntMatrix, HomologyError> {
        if self.modulus != 0 {
            return Err(HomologyError::UnsupportedForm(format!(
                "no chain-level coordinate matrix with Z_{} coefficients",
                self.modulus
            )));
        }
        let full = self.relations.u.mul(&self.coords)?;
        Ok(full.select_rows(&self.positions))
    }

    /// The torsion subgroup `⊕ ℤ/d_j`, one chain generator per summand, in
    /// the order of [`MarkedAbelianGroup::torsion_indices`].
    pub fn torsion_subgroup(&self) -> Result<MarkedAbelianGroup, HomologyError> {
        let t = self.group.torsion.len();
        let mut relations = IntMatrix::zeros(t, t);
        for (i, &d) in self.group.torsion.iter().enumerate() {
            relations.set(i, i, d);
        }
        MarkedAbelianGroup::new(IntMatrix::zeros(0, t), relations, 0)
    }
}

fn stack_rows(top: &IntMatrix, bottom: &IntMatrix) -> IntMatrix {
    let mut out = IntMatrix::zeros(top.rows() + bottom.rows(), top.cols());
    for r in 0..top.rows() {
        for c in 0..top.cols() {
            out.set(r, c, top.get(r, c));
        }
    }
    for r in 0..bottom.rows() {
        for c in 0..bottom.cols() {
            out.set(top.rows() + r, c, bottom.get(r, c));
        }
    }
    out
}
