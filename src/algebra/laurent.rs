//! Integer Laurent polynomials `ℤ[t, t⁻¹]` and small polynomial matrices.
//!
//! Coefficients are [`BigInt`]: Bareiss elimination over `ℤ[t^±]` grows them
//! quickly, and minors of presentation matrices are compared exactly.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use itertools::Itertools;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::homology_error::HomologyError;

/// Sparse Laurent polynomial: exponent → nonzero coefficient.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct LaurentPoly {
    terms: BTreeMap<i64, BigInt>,
}

impl LaurentPoly {
    /// `c·tᵉ`.
    pub fn monomial(c: i64, e: i64) -> Self {
        let mut p = Self::default();
        p.add_big(e, BigInt::from(c));
        p
    }

    /// Build from `(exponent, coefficient)` pairs; repeated exponents add up.
    pub fn from_terms<I: IntoIterator<Item = (i64, i64)>>(terms: I) -> Self {
        let mut p = Self::default();
        for (e, c) in terms {
            p.add_term(e, c);
        }
        p
    }

    fn from_big_terms<I: IntoIterator<Item = (i64, BigInt)>>(terms: I) -> Self {
        let mut p = Self::default();
        for (e, c) in terms {
            p.add_big(e, c);
        }
        p
    }

    /// `tᵉ − 1`.
    pub fn power_minus_one(e: i64) -> Self {
        Self::from_terms([(e, 1), (0, -1)])
    }

    pub fn add_term(&mut self, e: i64, c: i64) {
        self.add_big(e, BigInt::from(c));
    }

    fn add_big(&mut self, e: i64, c: BigInt) {
        if c.is_zero() {
            return;
        }
        let slot = self.terms.entry(e).or_default();
        *slot += c;
        if slot.is_zero() {
            self.terms.remove(&e);
        }
    }

    /// `self += c·tˢ·other`.
    pub fn add_scaled(&mut self, other: &LaurentPoly, c: i64, shift: i64) {
        self.add_scaled_big(other, &BigInt::from(c), shift);
    }

    fn add_scaled_big(&mut self, other: &LaurentPoly, c: &BigInt, shift: i64) {
        for (&e, x) in &other.terms {
            self.add_big(e + shift, c * x);
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = (i64, &BigInt)> + '_ {
        self.terms.iter().map(|(&e, c)| (e, c))
    }

    pub fn coefficient(&self, e: i64) -> BigInt {
        self.terms.get(&e).cloned().unwrap_or_default()
    }

    pub fn min_exponent(&self) -> Option<i64> {
        self.terms.keys().next().copied()
    }

    pub fn max_exponent(&self) -> Option<i64> {
        self.terms.keys().next_back().copied()
    }

    pub fn leading_coefficient(&self) -> BigInt {
        self.terms.values().next_back().cloned().unwrap_or_default()
    }

    /// `±tᵏ`?
    pub fn is_unit(&self) -> bool {
        self.terms.len() == 1 && self.leading_coefficient().abs().is_one()
    }

    /// Inverse of a unit `±tᵏ`.
    pub fn unit_inverse(&self) -> Option<Self> {
        if !self.is_unit() {
            return None;
        }
        let (&e, c) = self.terms.iter().next()?;
        Some(Self::from_big_terms([(-e, c.clone())]))
    }

    /// Value at `t = 1`.
    pub fn eval_at_one(&self) -> BigInt {
        self.terms.values().sum()
    }

    /// `p(t) ↦ p(t⁻¹)`.
    pub fn mirror(&self) -> Self {
        Self::from_big_terms(self.terms.iter().map(|(&e, c)| (-e, c.clone())))
    }

    /// Multiply by `tˢ`.
    pub fn shifted(&self, s: i64) -> Self {
        Self::from_big_terms(self.terms.iter().map(|(&e, c)| (e + s, c.clone())))
    }

    /// Does `p(t) = ±tᵏ·p(t⁻¹)` hold for some `k`?
    pub fn is_symmetric_up_to_unit(&self) -> bool {
        let (Some(lo), Some(hi)) = (self.min_exponent(), self.max_exponent()) else {
            return true;
        };
        let m = self.mirror().shifted(lo + hi);
        m == *self || m == -self.clone()
    }

    /// Canonical associate: lowest exponent 0, and positive at `t = 1`
    /// (ties broken by a positive constant term).
    pub fn normalized(&self) -> Self {
        let Some(lo) = self.min_exponent() else {
            return Self::default();
        };
        let p = self.shifted(-lo);
        let s = p.eval_at_one();
        if s.is_negative() || (s.is_zero() && p.coefficient(0).is_negative()) { -p } else { p }
    }

    /// Exact quotient `self / divisor`, failing when the division leaves a remainder.
    pub fn div_exact(&self, divisor: &LaurentPoly) -> Result<Self, HomologyError> {
        let (Some(dmax), Some(dmin)) = (divisor.max_exponent(), divisor.min_exponent()) else {
            return Err(HomologyError::NoSolution);
        };
        let dc = divisor.leading_coefficient();
        let mut rem = self.clone();
        let mut quot = LaurentPoly::default();
        while let Some(rmax) = rem.max_exponent() {
            let rc = rem.leading_coefficient();
            let rmin = rem.min_exponent().unwrap_or(rmax);
            let (m, r) = rc.div_rem(&dc);
            if !r.is_zero() || rmax - dmax < rmin - dmin {
                return Err(HomologyError::NoSolution);
            }
            let k = rmax - dmax;
            rem.add_scaled_big(divisor, &-&m, k);
            quot.add_big(k, m);
        }
        Ok(quot)
    }
}

impl fmt::Display for LaurentPoly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, (&e, c)) in self.terms.iter().enumerate() {
            let sign = if c.is_negative() { "-" } else { "+" };
            if i == 0 {
                if c.is_negative() {
                    write!(f, "-")?;
                }
            } else {
                write!(f, " {sign} ")?;
            }
            let a = c.abs();
            match e {
                0 => write!(f, "{a}")?,
                _ => {
                    if !a.is_one() {
                        write!(f, "{a}")?;
                    }
                    if e == 1 { write!(f, "t")? } else { write!(f, "t^{e}")? }
                }
            }
        }
        Ok(())
    }
}

impl Add for LaurentPoly {
    type Output = LaurentPoly;
    fn add(mut self, rhs: LaurentPoly) -> LaurentPoly {
        self.add_scaled(&rhs, 1, 0);
        self
    }
}

impl Sub for LaurentPoly {
    type Output = LaurentPoly;
    fn sub(mut self, rhs: LaurentPoly) -> LaurentPoly {
        self.add_scaled(&rhs, -1, 0);
        self
    }
}

impl Neg for LaurentPoly {
    type Output = LaurentPoly;
    fn neg(mut self) -> LaurentPoly {
        self.terms.values_mut().for_each(|c| *c = -&*c);
        self
    }
}

impl Mul for &LaurentPoly {
    type Output = LaurentPoly;
    fn mul(self, rhs: &LaurentPoly) -> LaurentPoly {
        let mut out = LaurentPoly::default();
        for (&a, x) in &self.terms {
            for (&b, y) in &rhs.terms {
                out.add_big(a + b, x * y);
            }
        }
        out
    }
}

impl Mul for LaurentPoly {
    type Output = LaurentPoly;
    fn mul(self, rhs: LaurentPoly) -> LaurentPoly {
        &self * &rhs
    }
}

impl Zero for LaurentPoly {
    fn zero() -> Self {
        Self::default()
    }
    fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }
}

impl One for LaurentPoly {
    fn one() -> Self {
        Self::monomial(1, 0)
    }
}

/// Dense matrix of Laurent polynomials.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PolyMatrix {
    rows: usize,
    cols: usize,
    entries: Vec<LaurentPoly>,
}

impl PolyMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: vec![LaurentPoly::zero(); rows * cols],
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
    pub fn get(&self, r: usize, c: usize) -> &LaurentPoly {
        &self.entries[r * self.cols + c]
    }

    #[inline]
    pub fn get_mut(&mut self, r: usize, c: usize) -> &mut LaurentPoly {
        &mut self.entries[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, p: LaurentPoly) {
        self.entries[r * self.cols + c] = p;
    }

    pub fn select(&self, rows: &[usize], cols: &[usize]) -> PolyMatrix {
        let mut out = PolyMatrix::zeros(rows.len(), cols.len());
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                out.set(i, j, self.get(r, c).clone());
            }
        }
        out
    }

    /// `row[dst] += f · row[src]`.
    pub fn add_row_multiple(&mut self, dst: usize, src: usize, f: &LaurentPoly) {
        for c in 0..self.cols {
            let add = f * self.get(src, c);
            if !add.is_zero() {
                self.get_mut(dst, c).add_scaled(&add, 1, 0);
            }
        }
    }

    /// Determinant of a square matrix by fraction-free (Bareiss) elimination.
    pub fn determinant(&self) -> Result<LaurentPoly, HomologyError> {
        if self.rows != self.cols {
            return Err(HomologyError::ShapeMismatch {
                expected: "square matrix".into(),
                found: format!("{}x{}", self.rows, self.cols),
            });
        }
        let n = self.rows;
        if n == 0 {
            return Ok(LaurentPoly::one());
        }
        let mut a = self.clone();
        let mut negate = false;
        let mut prev = LaurentPoly::one();
        for k in 0..n - 1 {
            if a.get(k, k).is_zero() {
                let Some(swap) = (k + 1..n).find(|&i| !a.get(i, k).is_zero()) else {
                    return Ok(LaurentPoly::zero());
                };
                for c in 0..n {
                    a.entries.swap(k * n + c, swap * n + c);
                }
                negate = !negate;
            }
            for i in k + 1..n {
                for j in k + 1..n {
                    let num = a.get(i, j) * a.get(k, k) - a.get(i, k) * a.get(k, j);
                    a.set(i, j, num.div_exact(&prev)?);
                }
            }
            prev = a.get(k, k).clone();
        }
        let det = a.get(n - 1, n - 1).clone();
        Ok(if negate { -det } else { det })
    }

    /// All maximal minors (`rows ≤ cols`): one per choice of `rows` columns.
    pub fn maximal_minors(&self) -> Result<Vec<LaurentPoly>, HomologyError> {
        let rows: Vec<usize> = (0..self.rows).collect();
        (0..self.cols)
            .combinations(self.rows)
            .map(|cols| self.select(&rows, &cols).determinant())
            .collect()
    }
}

/// Reduce a generating set of an ideal of `ℤ[t^±]` by pairwise leading-term
/// cancellation, returning normalized, distinct, nonzero generators.
pub fn reduce_ideal(generators: &[LaurentPoly]) -> Vec<LaurentPoly> {
    let mut gens: Vec<LaurentPoly> = generators
        .iter()
        .filter(|g| !g.is_zero())
        .map(LaurentPoly::normalized)
        .collect();
    loop {
        let mut uniq: Vec<LaurentPoly> = Vec::new();
        for g in gens {
            if !g.is_zero() && !uniq.contains(&g) {
                uniq.push(g);
            }
        }
        gens = uniq;
        gens.sort_by_key(|g| (g.max_exponent().unwrap_or(0), g.leading_coefficient().abs()));
        let mut changed = false;
        'outer: for j in 0..gens.len() {
            for i in 0..j {
                let (p, q) = (&gens[j], &gens[i]);
                let (dp, dq) = (p.max_exponent().unwrap_or(0), q.max_exponent().unwrap_or(0));
                let (a, b) = (p.leading_coefficient(), q.leading_coefficient());
                let mut next = p.clone();
                if a.is_multiple_of(&b) {
                    next.add_scaled_big(q, &-(&a / &b), dp - dq);
                } else if dp == dq {
                    next.add_scaled_big(q, &-a.div_floor(&b), 0);
                } else {
                    continue;
                }
                gens[j] = next.normalized();
                changed = true;
                break 'outer;
            }
        }
        if !changed {
            return gens.into_iter().filter(|g| !g.is_zero()).collect();
        }
    }
}

/// Picks between an ideal and its image under `t ↦ t⁻¹`: the side whose
/// generators have positive leading coefficients wins, then the smaller
/// coefficient lists.
pub fn mirror_canonical(ideal: Vec<LaurentPoly>) -> Vec<LaurentPoly> {
    let mut mirrored: Vec<LaurentPoly> = ideal.iter().map(|p| p.mirror().normalized()).collect();
    if mirrored.len() > 1 {
        mirrored = reduce_ideal(&mirrored);
    }
    let key = |gens: &[LaurentPoly]| -> Vec<(bool, Vec<(i64, BigInt)>)> {
        gens.iter()
            .map(|p| {
                let terms = p.terms().map(|(e, c)| (e, c.clone())).collect();
                (!p.leading_coefficient().is_positive(), terms)
            })
            .collect()
    };
    if key(&mirrored) < key(&ideal) { mirrored } else { ideal }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(terms: &[(i64, i64)]) -> LaurentPoly {
        LaurentPoly::from_terms(terms.iter().copied())
    }

    #[test]
    fn display_and_normalize() {
        let f = p(&[(0, -1), (1, 3), (2, -1)]);
        assert_eq!(f.to_string(), "-1 + 3t - t^2");
        assert_eq!(f.shifted(-4).normalized(), f);
        assert_eq!((-f.clone()).normalized(), f);
        assert!(f.is_symmetric_up_to_unit());
        assert!(!p(&[(0, 1), (1, 1), (3, -1)]).is_symmetric_up_to_unit());
    }

    #[test]
    fn exact_division() {
        let a = p(&[(3, 1), (0, -1)]);
        let b = LaurentPoly::power_minus_one(1);
        assert_eq!(a.div_exact(&b).unwrap(), p(&[(0, 1), (1, 1), (2, 1)]));
        assert!(p(&[(0, 1)]).div_exact(&b).is_err());
    }

    #[test]
    fn bareiss_determinant() {
        let mut m = PolyMatrix::zeros(2, 2);
        m.set(0, 0, p(&[(1, 1)]));
        m.set(0, 1, p(&[(0, 1)]));
        m.set(1, 0, p(&[(0, 1)]));
        m.set(1, 1, p(&[(1, 1)]));
        assert_eq!(m.determinant().unwrap(), p(&[(2, 1), (0, -1)]));
    }

    #[test]
    fn ideal_reduction_finds_gcd_like_generator() {
        let f = p(&[(0, -1), (1, 3), (2, -1)]);
        let g = &f * &p(&[(0, 1), (1, 1)]);
        let h = &f * &p(&[(0, 2)]);
        let red = reduce_ideal(&[g, h, f.clone()]);
        assert_eq!(red, vec![f]);
    }

    #[test]
    fn mirror_representative() {
        let a = p(&[(0, -1), (1, 1), (2, 1)]);
        let b = a.mirror().normalized();
        assert_eq!(b, p(&[(0, 1), (1, 1), (2, -1)]));
        assert_eq!(mirror_canonical(vec![a.clone()]), vec![a.clone()]);
        assert_eq!(mirror_canonical(vec![b]), vec![a]);
        // symmetric and trivial ideals are their own mirrors
        let knot = p(&[(0, -1), (1, 3), (2, -1)]);
        assert_eq!(mirror_canonical(vec![knot.clone()]), vec![knot]);
        assert_eq!(mirror_canonical(vec![LaurentPoly::zero()]), vec![LaurentPoly::zero()]);
    }

    #[test]
    fn coefficients_outgrow_machine_words() {
        // (1 + 2⁶²t)² has a middle coefficient 2⁶³ and a top one 2¹²⁴
        let big = p(&[(0, 1), (1, 1 << 62)]);
        let sq = &big * &big;
        assert_eq!(sq.coefficient(1), BigInt::from(1i64 << 62) * 2);
        assert_eq!(sq.leading_coefficient(), BigInt::from(1i64 << 62).pow(2));
        assert_eq!(sq.div_exact(&big).unwrap(), big);
        let mut m = PolyMatrix::zeros(2, 2);
        m.set(0, 0, big.clone());
        m.set(0, 1, p(&[(0, 1)]));
        m.set(1, 0, p(&[(0, 1)]));
        m.set(1, 1, big.clone());
        assert_eq!(m.determinant().unwrap(), sq - p(&[(0, 1)]));
    }
}
