//! Dense integer matrices.
//!
//! Row-major `i64` storage. Elementary row/column operations are checked so a
//! long elimination reports [`HomologyError::ArithmeticOverflow`] instead of
//! silently wrapping. Products whose partial sums overflow are redone in
//! [`BigInt`] and only fail when the final entry does not fit.

use std::ops::Index;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::homology_error::HomologyError;

/// Dense `rows × cols` integer matrix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct IntMatrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
}

#[inline]
pub(crate) fn checked_add(a: i64, b: i64) -> Result<i64, HomologyError> {
    a.checked_add(b).ok_or(HomologyError::ArithmeticOverflow)
}

#[inline]
pub(crate) fn checked_mul(a: i64, b: i64) -> Result<i64, HomologyError> {
    a.checked_mul(b).ok_or(HomologyError::ArithmeticOverflow)
}

/// `a + k·b`, checked.
#[inline]
pub(crate) fn checked_axpy(a: i64, k: i64, b: i64) -> Result<i64, HomologyError> {
    checked_add(a, checked_mul(k, b)?)
}

/// `Σ aᵢ·bᵢ` accumulated in big integers.
pub(crate) fn wide_dot<I: IntoIterator<Item = (i64, i64)>>(pairs: I) -> Result<i64, HomologyError> {
    let sum: BigInt = pairs.into_iter().map(|(a, b)| BigInt::from(a) * b).sum();
    sum.to_i64().ok_or(HomologyError::ArithmeticOverflow)
}

impl IntMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1;
        }
        m
    }

    /// Build from explicit rows; every row must have `cols` entries.
    pub fn from_rows(cols: usize, rows: Vec<Vec<i64>>) -> Result<Self, HomologyError> {
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in &rows {
            if row.len() != cols {
                return Err(HomologyError::ShapeMismatch {
                    expected: format!("{cols} columns"),
                    found: format!("{} columns", row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Single-column matrix.
    pub fn column_vector(v: &[i64]) -> Self {
        Self {
            rows: v.len(),
            cols: 1,
            data: v.to_vec(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> i64 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: i64) {
        self.data[r * self.cols + c] = v;
    }

    /// `self[r][c] += v`, checked.
    pub fn add_to(&mut self, r: usize, c: usize, v: i64) -> Result<(), HomologyError> {
        let idx = r * self.cols + c;
        self.data[idx] = checked_add(self.data[idx], v)?;
        Ok(())
    }

    #[inline]
    pub fn row(&self, r: usize) -> &[i64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn column(&self, c: usize) -> Vec<i64> {
        (0..self.rows).map(|r| self.get(r, c)).collect()
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&x| x == 0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                t.set(c, r, self.get(r, c));
            }
        }
        t
    }

    /// Matrix product `self · other`.
    pub fn mul(&self, other: &IntMatrix) -> Result<IntMatrix, HomologyError> {
        if self.cols != other.rows {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("{} rows", self.cols),
                found: format!("{} rows", other.rows),
            });
        }
        match self.mul_narrow(other) {
            Err(HomologyError::ArithmeticOverflow) => {
                log::trace!("mul: {}x{} by {}x{} redone in big integers", self.rows, self.cols, other.rows, other.cols);
                let mut out = IntMatrix::zeros(self.rows, other.cols);
                for r in 0..self.rows {
                    for c in 0..other.cols {
                        out.set(r, c, wide_dot((0..self.cols).map(|k| (self.get(r, k), other.get(k, c))))?);
                    }
                }
                Ok(out)
            }
            res => res,
        }
    }

    fn mul_narrow(&self, other: &IntMatrix) -> Result<IntMatrix, HomologyError> {
        // Boundary matrices are sparse; walk only the nonzero entries of `other`.
        let supports: Vec<Vec<usize>> = (0..other.rows).map(|k| other.row_support(k)).collect();
        let mut out = IntMatrix::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for (k, support) in supports.iter().enumerate() {
                let a = self.get(r, k);
                if a == 0 {
                    continue;
                }
                for &c in support {
                    let idx = r * out.cols + c;
                    out.data[idx] = checked_axpy(out.data[idx], a, other.get(k, c))?;
                }
            }
        }
        Ok(out)
    }

    /// Matrix-vector product.
    pub fn mul_vec(&self, v: &[i64]) -> Result<Vec<i64>, HomologyError> {
        if v.len() != self.cols {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("vector of length {}", self.cols),
                found: format!("vector of length {}", v.len()),
            });
        }
        let mut out = vec![0i64; self.rows];
        for (r, slot) in out.iter_mut().enumerate() {
            let row = self.row(r);
            let narrow = row
                .iter()
                .zip(v)
                .filter(|&(&a, &x)| a != 0 && x != 0)
                .try_fold(0i64, |acc, (&a, &x)| checked_axpy(acc, a, x));
            *slot = match narrow {
                Ok(x) => x,
                Err(_) => wide_dot(row.iter().copied().zip(v.iter().copied()))?,
            };
        }
        Ok(out)
    }

    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut out = Self::zeros(rows.len(), self.cols);
        for (i, &r) in rows.iter().enumerate() {
            out.data[i * self.cols..(i + 1) * self.cols].copy_from_slice(self.row(r));
        }
        out
    }

    pub fn select_columns(&self, cols: &[usize]) -> Self {
        let mut out = Self::zeros(self.rows, cols.len());
        for r in 0..self.rows {
            for (j, &c) in cols.iter().enumerate() {
                out.set(r, j, self.get(r, c));
            }
        }
        out
    }

    /// `[self | other]`.
    pub fn hstack(&self, other: &IntMatrix) -> Result<IntMatrix, HomologyError> {
        if self.rows != other.rows {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("{} rows", self.rows),
                found: format!("{} rows", other.rows),
            });
        }
        let mut out = IntMatrix::zeros(self.rows, self.cols + other.cols);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.set(r, c, self.get(r, c));
            }
            for c in 0..other.cols {
                out.set(r, self.cols + c, other.get(r, c));
            }
        }
        Ok(out)
    }

    /// Block-diagonal sum `self ⊕ other`.
    pub fn block_diagonal(&self, other: &IntMatrix) -> IntMatrix {
        let mut out = IntMatrix::zeros(self.rows + other.rows, self.cols + other.cols);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.set(r, c, self.get(r, c));
            }
        }
        for r in 0..other.rows {
            for c in 0..other.cols {
                out.set(self.rows + r, self.cols + c, other.get(r, c));
            }
        }
        out
    }

    /// Entries reduced into `[0, modulus)`; `modulus == 0` is a no-op.
    pub fn reduce_mod(&self, modulus: i64) -> Self {
        if modulus == 0 {
            return self.clone();
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|x| x.rem_euclid(modulus)).collect(),
        }
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    pub fn swap_cols(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for r in 0..self.rows {
            self.data.swap(r * self.cols + a, r * self.cols + b);
        }
    }

    /// `row[dst] += k · row[src]`.
    pub fn add_row_multiple(&mut self, dst: usize, src: usize, k: i64) -> Result<(), HomologyError> {
        if k == 0 {
            return Ok(());
        }
        for c in 0..self.cols {
            let s = self.data[src * self.cols + c];
            if s != 0 {
                let idx = dst * self.cols + c;
                self.data[idx] = checked_axpy(self.data[idx], k, s)?;
            }
        }
        Ok(())
    }

    /// `col[dst] += k · col[src]`.
    pub fn add_col_multiple(&mut self, dst: usize, src: usize, k: i64) -> Result<(), HomologyError> {
        if k == 0 {
            return Ok(());
        }
        for r in 0..self.rows {
            let s = self.data[r * self.cols + src];
            if s != 0 {
                let idx = r * self.cols + dst;
                self.data[idx] = checked_axpy(self.data[idx], k, s)?;
            }
        }
        Ok(())
    }

    pub fn negate_row(&mut self, r: usize) {
        for c in 0..self.cols {
            let idx = r * self.cols + c;
            self.data[idx] = -self.data[idx];
        }
    }

    pub fn negate_col(&mut self, c: usize) {
        for r in 0..self.rows {
            let idx = r * self.cols + c;
            self.data[idx] = -self.data[idx];
        }
    }

    /// Column indices holding a nonzero entry in row `r`.
    pub fn row_support(&self, r: usize) -> Vec<usize> {
        self.row(r)
            .iter()
            .enumerate()
            .filter_map(|(c, &x)| (x != 0).then_some(c))
            .collect()
    }

    /// Row indices holding a nonzero entry in column `c`.
    pub fn column_support(&self, c: usize) -> Vec<usize> {
        (0..self.rows).filter(|&r| self.get(r, c) != 0).collect()
    }
}

impl Index<(usize, usize)> for IntMatrix {
    type Output = i64;

    fn index(&self, (r, c): (usize, usize)) -> &i64 {
        &self.data[r * self.cols + c]
    }
}
