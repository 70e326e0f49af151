//! Smith normal form over ℤ.
//!
//! [`smith_form`] returns unimodular `U`, `V` (and their inverses) with
//! `U·A·V = D`, `D` diagonal with positive entries `d₁ | d₂ | … | d_r`.
//! Boundary matrices are sparse with mostly unit entries, so the pivot search
//! stops at the first `±1` it sees and elimination only touches rows/columns
//! with a nonzero entry in the pivot column/row.
//!
//! When an intermediate entry leaves the `i64` range the elimination is
//! repeated densely over [`BigInt`]; the answer only has to fit at the end.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::algebra::matrix::IntMatrix;
use crate::homology_error::HomologyError;

/// Result of a Smith normal form computation.
#[derive(Clone, Debug)]
pub struct SmithForm {
    /// Nonzero invariant factors, positive and in divisibility order.
    pub diag: Vec<i64>,
    pub u: IntMatrix,
    pub u_inv: IntMatrix,
    pub v: IntMatrix,
    pub v_inv: IntMatrix,
}

impl SmithForm {
    #[inline]
    pub fn rank(&self) -> usize {
        self.diag.len()
    }
}

struct Elimination {
    a: IntMatrix,
    transforms: Option<[IntMatrix; 4]>,
}

impl Elimination {
    fn new(a: &IntMatrix, track: bool) -> Self {
        let transforms = track.then(|| {
            [
                IntMatrix::identity(a.rows()),
                IntMatrix::identity(a.rows()),
                IntMatrix::identity(a.cols()),
                IntMatrix::identity(a.cols()),
            ]
        });
        Self {
            a: a.clone(),
            transforms,
        }
    }

    // row[dst] += k row[src]
    fn row_add(&mut self, dst: usize, src: usize, k: i64) -> Result<(), HomologyError> {
        self.a.add_row_multiple(dst, src, k)?;
        if let Some([u, u_inv, _, _]) = self.transforms.as_mut() {
            u.add_row_multiple(dst, src, k)?;
            u_inv.add_col_multiple(src, dst, -k)?;
        }
        Ok(())
    }

    // col[dst] += k col[src]
    fn col_add(&mut self, dst: usize, src: usize, k: i64) -> Result<(), HomologyError> {
        self.a.add_col_multiple(dst, src, k)?;
        if let Some([_, _, v, v_inv]) = self.transforms.as_mut() {
            v.add_col_multiple(dst, src, k)?;
            v_inv.add_row_multiple(src, dst, -k)?;
        }
        Ok(())
    }

    fn row_swap(&mut self, a: usize, b: usize) {
        self.a.swap_rows(a, b);
        if let Some([u, u_inv, _, _]) = self.transforms.as_mut() {
            u.swap_rows(a, b);
            u_inv.swap_cols(a, b);
        }
    }

    fn col_swap(&mut self, a: usize, b: usize) {
        self.a.swap_cols(a, b);
        if let Some([_, _, v, v_inv]) = self.transforms.as_mut() {
            v.swap_cols(a, b);
            v_inv.swap_rows(a, b);
        }
    }

    fn row_negate(&mut self, r: usize) {
        self.a.negate_row(r);
        if let Some([u, u_inv, _, _]) = self.transforms.as_mut() {
            u.negate_row(r);
            u_inv.negate_col(r);
        }
    }

    fn find_pivot(&self, t: usize) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, i64)> = None;
        for c in t..self.a.cols() {
            for r in t..self.a.rows() {
                let x = self.a.get(r, c).abs();
                if x == 0 {
                    continue;
                }
                if x == 1 {
                    return Some((r, c));
                }
                if best.is_none_or(|(_, _, b)| x < b) {
                    best = Some((r, c, x));
                }
            }
        }
        best.map(|(r, c, _)| (r, c))
    }

    // Clear row t and column t around the pivot, keeping |pivot| minimal.
    fn clear_cross(&mut self, t: usize) -> Result<(), HomologyError> {
        loop {
            let p = self.a.get(t, t);
            let mut dirty = false;
            for r in self.a.column_support(t) {
                if r <= t {
                    continue;
                }
                let q = self.a.get(r, t) / p;
                self.row_add(r, t, -q)?;
                if self.a.get(r, t) != 0 {
                    dirty = true;
                }
            }
            for c in self.a.row_support(t) {
                if c <= t {
                    continue;
                }
                let q = self.a.get(t, c) / p;
                self.col_add(c, t, -q)?;
                if self.a.get(t, c) != 0 {
                    dirty = true;
                }
            }
            if !dirty {
                if p.abs() == 1 {
                    return Ok(());
                }
                // Divisibility: fold a non-multiple row into the pivot row.
                let mut bad = None;
                'scan: for r in t + 1..self.a.rows() {
                    for c in t + 1..self.a.cols() {
                        if self.a.get(r, c) % p != 0 {
                            bad = Some(r);
                            break 'scan;
                        }
                    }
                }
                match bad {
                    None => return Ok(()),
                    Some(r) => {
                        self.row_add(t, r, 1)?;
                        continue;
                    }
                }
            }
            // Move the smallest remaining entry of the cross into the pivot.
            let mut best_row = None;
            for r in t..self.a.rows() {
                let x = self.a.get(r, t).abs();
                if x != 0 && best_row.is_none_or(|(_, b)| x < b) {
                    best_row = Some((r, x));
                }
            }
            let mut best_col = None;
            for c in t..self.a.cols() {
                let x = self.a.get(t, c).abs();
                if x != 0 && best_col.is_none_or(|(_, b)| x < b) {
                    best_col = Some((c, x));
                }
            }
            match (best_row, best_col) {
                (Some((r, xr)), Some((c, xc))) => {
                    if xr <= xc {
                        self.row_swap(t, r);
                    } else {
                        self.col_swap(t, c);
                    }
                }
                (Some((r, _)), None) => self.row_swap(t, r),
                (None, Some((c, _))) => self.col_swap(t, c),
                (None, None) => return Ok(()),
            }
        }
    }

    fn run(mut self) -> Result<(Vec<i64>, Option<[IntMatrix; 4]>), HomologyError> {
        let mut diag = Vec::new();
        let mut t = 0;
        while t < self.a.rows().min(self.a.cols()) {
            let Some((r, c)) = self.find_pivot(t) else {
                break;
            };
            self.row_swap(t, r);
            self.col_swap(t, c);
            self.clear_cross(t)?;
            if self.a.get(t, t) < 0 {
                self.row_negate(t);
            }
            diag.push(self.a.get(t, t));
            t += 1;
        }
        Ok((diag, self.transforms))
    }
}

/// Dense big-integer matrix for the overflow path.
struct Wide {
    cols: usize,
    data: Vec<BigInt>,
}

impl Wide {
    fn from_int(a: &IntMatrix) -> Self {
        let data = (0..a.rows()).flat_map(|r| a.row(r).iter().map(|&x| BigInt::from(x))).collect();
        Self { cols: a.cols(), data }
    }

    fn rows(&self) -> usize {
        if self.cols == 0 { 0 } else { self.data.len() / self.cols }
    }

    fn at(&self, r: usize, c: usize) -> &BigInt {
        &self.data[r * self.cols + c]
    }

    fn add_row_multiple(&mut self, dst: usize, src: usize, k: &BigInt) {
        for c in 0..self.cols {
            let x = self.at(src, c) * k;
            self.data[dst * self.cols + c] += x;
        }
    }

    fn add_col_multiple(&mut self, dst: usize, src: usize, k: &BigInt) {
        for r in 0..self.rows() {
            let x = self.at(r, src) * k;
            self.data[r * self.cols + dst] += x;
        }
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    fn swap_cols(&mut self, a: usize, b: usize) {
        for r in 0..self.rows() {
            self.data.swap(r * self.cols + a, r * self.cols + b);
        }
    }

    fn negate_row(&mut self, r: usize) {
        for c in 0..self.cols {
            let x = -self.at(r, c);
            self.data[r * self.cols + c] = x;
        }
    }

    fn negate_col(&mut self, c: usize) {
        for r in 0..self.rows() {
            let x = -self.at(r, c);
            self.data[r * self.cols + c] = x;
        }
    }

    fn narrow(&self) -> Result<IntMatrix, HomologyError> {
        let mut out = IntMatrix::zeros(self.rows(), self.cols);
        for r in 0..self.rows() {
            for c in 0..self.cols {
                out.set(r, c, self.at(r, c).to_i64().ok_or(HomologyError::ArithmeticOverflow)?);
            }
        }
        Ok(out)
    }
}

/// [`Elimination`] over [`BigInt`], visiting the whole matrix.
struct WideElimination {
    a: Wide,
    transforms: Option<[Wide; 4]>,
}

impl WideElimination {
    fn new(a: &IntMatrix, track: bool) -> Self {
        let transforms = track.then(|| {
            [
                Wide::from_int(&IntMatrix::identity(a.rows())),
                Wide::from_int(&IntMatrix::identity(a.rows())),
                Wide::from_int(&IntMatrix::identity(a.cols())),
                Wide::from_int(&IntMatrix::identity(a.cols())),
            ]
        });
        Self {
            a: Wide::from_int(a),
            transforms,
        }
    }

    fn row_add(&mut self, dst: usize, src: usize, k: &BigInt) {
        self.a.add_row_multiple(dst, src, k);
        if let Some([u, u_inv, _, _]) = self.transforms.as_mut() {
            u.add_row_multiple(dst, src, k);
            u_inv.add_col_multiple(src, dst, &-k);
        }
    }

    fn col_add(&mut self, dst: usize, src: usize, k: &BigInt) {
        self.a.add_col_multiple(dst, src, k);
        if let Some([_, _, v, v_inv]) = self.transforms.as_mut() {
            v.add_col_multiple(dst, src, k);
            v_inv.add_row_multiple(src, dst, &-k);
        }
    }

    fn row_swap(&mut self, a: usize, b: usize) {
        self.a.swap_rows(a, b);
        if let Some([u, u_inv, _, _]) = self.transforms.as_mut() {
            u.swap_rows(a, b);
            u_inv.swap_cols(a, b);
        }
    }

    fn col_swap(&mut self, a: usize, b: usize) {
        self.a.swap_cols(a, b);
        if let Some([_, _, v, v_inv]) = self.transforms.as_mut() {
            v.swap_cols(a, b);
            v_inv.swap_rows(a, b);
        }
    }

    fn row_negate(&mut self, r: usize) {
        self.a.negate_row(r);
        if let Some([u, u_inv, _, _]) = self.transforms.as_mut() {
            u.negate_row(r);
            u_inv.negate_col(r);
        }
    }

    /// Nonzero entry of least magnitude in row `t` (`by_row`) or column `t`, from index `t` on.
    fn smallest_in_cross(&self, t: usize, by_row: bool) -> Option<(usize, BigInt)> {
        let len = if by_row { self.a.cols } else { self.a.rows() };
        (t..len)
            .map(|i| (i, if by_row { self.a.at(t, i) } else { self.a.at(i, t) }.abs()))
            .filter(|(_, x)| !x.is_zero())
            .min_by(|a, b| a.1.cmp(&b.1))
    }

    fn clear_cross(&mut self, t: usize) {
        loop {
            let p = self.a.at(t, t).clone();
            let mut dirty = false;
            for r in t + 1..self.a.rows() {
                if self.a.at(r, t).is_zero() {
                    continue;
                }
                let q = self.a.at(r, t) / &p;
                self.row_add(r, t, &-q);
                dirty |= !self.a.at(r, t).is_zero();
            }
            for c in t + 1..self.a.cols {
                if self.a.at(t, c).is_zero() {
                    continue;
                }
                let q = self.a.at(t, c) / &p;
                self.col_add(c, t, &-q);
                dirty |= !self.a.at(t, c).is_zero();
            }
            if !dirty {
                if p.abs() == BigInt::from(1) {
                    return;
                }
                let bad = (t + 1..self.a.rows())
                    .find(|&r| (t + 1..self.a.cols).any(|c| !(self.a.at(r, c) % &p).is_zero()));
                match bad {
                    None => return,
                    Some(r) => {
                        self.row_add(t, r, &BigInt::from(1));
                        continue;
                    }
                }
            }
            match (self.smallest_in_cross(t, false), self.smallest_in_cross(t, true)) {
                (Some((r, xr)), Some((c, xc))) => {
                    if xr <= xc {
                        self.row_swap(t, r);
                    } else {
                        self.col_swap(t, c);
                    }
                }
                (Some((r, _)), None) => self.row_swap(t, r),
                (None, Some((c, _))) => self.col_swap(t, c),
                (None, None) => return,
            }
        }
    }

    fn run(mut self) -> Result<(Vec<i64>, Option<[IntMatrix; 4]>), HomologyError> {
        let mut diag = Vec::new();
        let mut t = 0;
        while t < self.a.rows().min(self.a.cols) {
            let mut best: Option<(usize, usize, BigInt)> = None;
            for c in t..self.a.cols {
                for r in t..self.a.rows() {
                    let x = self.a.at(r, c).abs();
                    if !x.is_zero() && best.as_ref().is_none_or(|(_, _, b)| &x < b) {
                        best = Some((r, c, x));
                    }
                }
            }
            let Some((r, c, _)) = best else {
                break;
            };
            self.row_swap(t, r);
            self.col_swap(t, c);
            self.clear_cross(t);
            if self.a.at(t, t).is_negative() {
                self.row_negate(t);
            }
            diag.push(self.a.at(t, t).to_i64().ok_or(HomologyError::ArithmeticOverflow)?);
            t += 1;
        }
        let transforms = match self.transforms {
            Some([u, u_inv, v, v_inv]) => Some([u.narrow()?, u_inv.narrow()?, v.narrow()?, v_inv.narrow()?]),
            None => None,
        };
        Ok((diag, transforms))
    }
}

/// Runs the `i64` elimination, repeating it over big integers on overflow.
fn eliminate(a: &IntMatrix, track: bool) -> Result<(Vec<i64>, Option<[IntMatrix; 4]>), HomologyError> {
    match Elimination::new(a, track).run() {
        Err(HomologyError::ArithmeticOverflow) => {
            log::debug!("smith: {}x{} overflowed i64, redoing with big integers", a.rows(), a.cols());
            WideElimination::new(a, track).run()
        }
        res => res,
    }
}

/// Smith normal form with transforms.
pub fn smith_form(a: &IntMatrix) -> Result<SmithForm, HomologyError> {
    let (diag, transforms) = eliminate(a, true)?;
    let [u, u_inv, v, v_inv] = transforms.ok_or(HomologyError::ArithmeticOverflow)?;
    Ok(SmithForm {
        diag,
        u,
        u_inv,
        v,
        v_inv,
    })
}

/// Nonzero invariant factors only; no transforms are tracked.
pub fn invariant_factors(a: &IntMatrix) -> Result<Vec<i64>, HomologyError> {
    if a.is_empty() {
        return Ok(Vec::new());
    }
    Ok(eliminate(a, false)?.0)
}

/// Rank over ℚ.
pub fn rank(a: &IntMatrix) -> Result<usize, HomologyError> {
    Ok(invariant_factors(a)?.len())
}

/// ℤ-basis of `ker A`, as the columns of the returned matrix.
pub fn kernel_basis(a: &IntMatrix) -> Result<IntMatrix, HomologyError> {
    if a.rows() == 0 {
        return Ok(IntMatrix::identity(a.cols()));
    }
    let snf = smith_form(a)?;
    let cols: Vec<usize> = (snf.rank()..a.cols()).collect();
    Ok(snf.v.select_columns(&cols))
}

/// Integer solution of `A·x = b`, or [`HomologyError::NoSolution`].
pub fn solve(a: &IntMatrix, b: &[i64]) -> Result<Vec<i64>, HomologyError> {
    let snf = smith_form(a)?;
    solve_with(&snf, a.cols(), b)
}

/// Solve `A·x = b` reusing a precomputed Smith form of `A`.
pub fn solve_with(snf: &SmithForm, cols: usize, b: &[i64]) -> Result<Vec<i64>, HomologyError> {
    let c = snf.u.mul_vec(b)?;
    let mut w = vec![0i64; cols];
    for (i, &ci) in c.iter().enumerate() {
        match snf.diag.get(i) {
            Some(&d) => {
                if ci % d != 0 {
                    return Err(HomologyError::NoSolution);
                }
                w[i] = ci / d;
            }
            None if ci != 0 => return Err(HomologyError::NoSolution),
            None => {}
        }
    }
    snf.v.mul_vec(&w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_transforms(a: &IntMatrix) {
        let snf = smith_form(a).unwrap();
        let d = snf.u.mul(a).unwrap().mul(&snf.v).unwrap();
        for r in 0..d.rows() {
            for c in 0..d.cols() {
                let want = if r == c { snf.diag.get(r).copied().unwrap_or(0) } else { 0 };
                assert_eq!(d.get(r, c), want);
            }
        }
        assert_eq!(snf.u.mul(&snf.u_inv).unwrap(), IntMatrix::identity(a.rows()));
        assert_eq!(snf.v.mul(&snf.v_inv).unwrap(), IntMatrix::identity(a.cols()));
        for w in snf.diag.windows(2) {
            assert_eq!(w[1] % w[0], 0);
        }
    }

    #[test]
    fn diagonal_entries_divide() {
        let a = IntMatrix::from_rows(2, vec![vec![2, 0], vec![0, 3]]).unwrap();
        assert_eq!(invariant_factors(&a).unwrap(), vec![1, 6]);
        check_transforms(&a);
    }

    #[test]
    fn mixed_matrix() {
        let a = IntMatrix::from_rows(
            4,
            vec![vec![2, 4, 4, -6], vec![-6, 6, 12, 10], vec![10, -4, -16, 0]],
        )
        .unwrap();
        check_transforms(&a);
        let b = a.mul_vec(&[1, -2, 3, 1]).unwrap();
        let x = solve(&a, &b).unwrap();
        assert_eq!(a.mul_vec(&x).unwrap(), b);
    }

    #[test]
    fn intermediate_entries_beyond_i64() {
        let big = (1i64 << 32) + 1;
        let a = IntMatrix::from_rows(2, vec![vec![2, 3], vec![1, big], vec![3 << 30, 1]]).unwrap();
        assert_eq!(Elimination::new(&a, false).run().unwrap_err(), HomologyError::ArithmeticOverflow);
        assert_eq!(invariant_factors(&a).unwrap(), vec![1, 7]);
        check_transforms(&a);
        let b = a.mul_vec(&[5, -2]).unwrap();
        assert_eq!(a.mul_vec(&solve(&a, &b).unwrap()).unwrap(), b);
    }

    #[test]
    fn oversized_factors_still_fail() {
        // invariant factors 1 and 2⁶⁴ − 1
        let m = 1i64 << 32;
        let a = IntMatrix::from_rows(2, vec![vec![1, m], vec![m, 1]]).unwrap();
        assert_eq!(invariant_factors(&a).unwrap_err(), HomologyError::ArithmeticOverflow);
    }

    #[test]
    fn kernel_of_boundary() {
        // Boundary of a triangle: three edges, three vertices.
        let d1 = IntMatrix::from_rows(3, vec![vec![-1, 0, -1], vec![1, -1, 0], vec![0, 1, 1]]).unwrap();
        let k = kernel_basis(&d1).unwrap();
        assert_eq!(k.cols(), 1);
        assert!(d1.mul(&k).unwrap().is_zero());
        assert!(solve(&d1, &[1, 0, 0]).is_err());
    }
}
