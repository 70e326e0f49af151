//! Sparse adjacency records and their folding into matrices.
//!
//! Every boundary operator of every decomposition is stored the same way: a
//! map `(domain cell, facet number) → CoverFacetData`. Folding sums the
//! records into a [`SparseGrid`] of any [`GridEntry`] type, which is `i64`
//! for ordinary chain complexes and [`LaurentPoly`] for the infinite cyclic
//! cover.

use std::collections::BTreeMap;

use num_traits::Zero;

use crate::algebra::laurent::{LaurentPoly, PolyMatrix};
use crate::algebra::matrix::IntMatrix;
use crate::algebra::presentation::Word;
use crate::homology_error::HomologyError;

/// Coefficient type a grid can accumulate.
pub trait GridEntry: Clone {
    fn zero() -> Self;
    fn plus_assign(&mut self, other: &Self);
    fn is_zero(&self) -> bool;
}

impl GridEntry for i64 {
    #[inline]
    fn zero() -> Self {
        0
    }
    #[inline]
    fn plus_assign(&mut self, other: &Self) {
        *self += *other;
    }
    #[inline]
    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl GridEntry for LaurentPoly {
    fn zero() -> Self {
        <LaurentPoly as Zero>::zero()
    }
    fn plus_assign(&mut self, other: &Self) {
        self.add_scaled(other, 1, 0);
    }
    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }
}

/// One incidence of a domain cell with a lower-dimensional cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverFacetData {
    /// Index of the incident cell in its own chart.
    pub cell_no: usize,
    /// Incidence sign, usually `±1`.
    pub sig: i64,
    /// Deck transformation picked up by the lift. Boundary tables of the
    /// base complex leave it empty; Fox tables store the relator prefix.
    pub trans: Word,
}

impl CoverFacetData {
    pub fn new(cell_no: usize, sig: i64) -> Self {
        Self {
            cell_no,
            sig,
            trans: Word::new(),
        }
    }
}

/// Sparse `rows × cols` grid; zero entries are never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SparseGrid<T> {
    rows: usize,
    cols: usize,
    entries: BTreeMap<(usize, usize), T>,
}

impl<T: GridEntry> SparseGrid<T> {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: BTreeMap::new(),
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

    /// `grid[r, c] += v`.
    pub fn add(&mut self, r: usize, c: usize, v: &T) {
        debug_assert!(r < self.rows && c < self.cols);
        let slot = self.entries.entry((r, c)).or_insert_with(T::zero);
        slot.plus_assign(v);
        if slot.is_zero() {
            self.entries.remove(&(r, c));
        }
    }

    pub fn get(&self, r: usize, c: usize) -> Option<&T> {
        self.entries.get(&(r, c))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.entries.iter().map(|(&(r, c), v)| (r, c, v))
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }
}

impl SparseGrid<i64> {
    pub fn to_matrix(&self) -> IntMatrix {
        let mut m = IntMatrix::zeros(self.rows, self.cols);
        for (&(r, c), &v) in &self.entries {
            m.set(r, c, v);
        }
        m
    }
}

impl SparseGrid<LaurentPoly> {
    pub fn to_poly_matrix(&self) -> PolyMatrix {
        let mut m = PolyMatrix::zeros(self.rows, self.cols);
        for (&(r, c), v) in &self.entries {
            m.set(r, c, v.clone());
        }
        m
    }
}

/// Boundary operator from `domain_count` cells to `range_count` cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdjacencyTable {
    domain_count: usize,
    range_count: usize,
    records: BTreeMap<(usize, usize), CoverFacetData>,
}

impl AdjacencyTable {
    pub fn new(domain_count: usize, range_count: usize) -> Self {
        Self {
            domain_count,
            range_count,
            records: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn domain_count(&self) -> usize {
        self.domain_count
    }

    #[inline]
    pub fn range_count(&self) -> usize {
        self.range_count
    }

    /// Append a record as the next facet of `domain`.
    pub fn push(&mut self, domain: usize, data: CoverFacetData) -> Result<(), HomologyError> {
        if domain >= self.domain_count || data.cell_no >= self.range_count {
            return Err(HomologyError::ShapeMismatch {
                expected: format!("cells below {}x{}", self.domain_count, self.range_count),
                found: format!("({domain}, {})", data.cell_no),
            });
        }
        let facet = self
            .records
            .range((domain, 0)..(domain + 1, 0))
            .next_back()
            .map_or(0, |(&(_, f), _)| f + 1);
        self.records.insert((domain, facet), data);
        Ok(())
    }

    pub fn get(&self, domain: usize, facet: usize) -> Option<&CoverFacetData> {
        self.records.get(&(domain, facet))
    }

    /// Records of one domain cell, in facet order.
    pub fn facets(&self, domain: usize) -> impl Iterator<Item = &CoverFacetData> {
        self.records.range((domain, 0)..(domain + 1, 0)).map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &CoverFacetData)> {
        self.records.iter().map(|(&(d, f), r)| (d, f, r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum `weight(record)` into the grid at `(record.cell_no, domain)`.
    pub fn fold<T: GridEntry>(&self, weight: impl Fn(&CoverFacetData) -> T) -> SparseGrid<T> {
        let mut grid = SparseGrid::new(self.range_count, self.domain_count);
        for (&(domain, _), rec) in &self.records {
            grid.add(rec.cell_no, domain, &weight(rec));
        }
        grid
    }

    /// Integer boundary matrix: rows are range cells, columns domain cells.
    pub fn integer_matrix(&self) -> IntMatrix {
        self.fold(|r| r.sig).to_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelling_records_leave_no_entry() {
        let mut t = AdjacencyTable::new(1, 2);
        t.push(0, CoverFacetData::new(0, 1)).unwrap();
        t.push(0, CoverFacetData::new(0, -1)).unwrap();
        t.push(0, CoverFacetData::new(1, 1)).unwrap();
        assert_eq!(t.facets(0).count(), 3);
        let g = t.fold(|r| r.sig);
        assert_eq!(g.nnz(), 1);
        assert_eq!(g.get(1, 0), Some(&1));
        assert!(t.push(1, CoverFacetData::new(0, 1)).is_err());
    }

    #[test]
    fn polynomial_fold_uses_the_deck_word() {
        let mut t = AdjacencyTable::new(1, 1);
        t.push(0, CoverFacetData::new(0, 1)).unwrap();
        t.push(
            0,
            CoverFacetData {
                cell_no: 0,
                sig: -1,
                trans: vec![(0, 1)],
            },
        )
        .unwrap();
        let grid = t.fold(|r| {
            let e: i64 = r.trans.iter().map(|&(_, x)| x).sum();
            LaurentPoly::monomial(r.sig, e)
        });
        let m = grid.to_poly_matrix();
        assert_eq!(*m.get(0, 0), LaurentPoly::from_terms([(0, 1), (1, -1)]));
    }
}
