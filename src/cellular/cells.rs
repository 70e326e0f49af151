//! Cell index registry.
//!
//! Enumerates the cells of every decomposition once and keeps, per
//! `(system, dimension)`, an ordered chart with reverse lookup.
//!
//! * A STD `d`-cell is either a `d`-face that is not an ideal vertex, or the
//!   truncation cell cut off by an ideal vertex at position `pos` of the
//!   canonical vertex list of a `(d+1)`-face. Faces come first, then
//!   truncation cells ordered by `(face, pos)`.
//! * A DUAL `j`-cell is named by the STD cell it is dual to: an interior STD
//!   `(n−j)`-cell, any STD `(n−j)`-cell for the relative system, and a
//!   boundary STD `(n−1−j)`-cell for the boundary system.
//! * A MIX cell is a STD `k`-cell together with a local face of its
//!   barycentric block (see [`Loc`]).

use hashbrown::HashMap;
use itertools::Itertools;
use std::hash::Hash;

use crate::cellular::coordinates::{CoordinateSystem, Family, Part};
use crate::homology_error::HomologyError;
use crate::topology::skeleton::{FaceEmbedding, Skeleton};

/// A cell of the standard decomposition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StdCell {
    /// A face of the triangulation, by index within its dimension.
    Face(usize),
    /// The truncation cell of the `(d+1)`-face `face` at the ideal vertex in
    /// canonical position `pos`.
    Ideal { face: usize, pos: usize },
}

/// Position of a MIX cell inside the barycentric block of a STD cell.
///
/// Masks are subsets of canonical vertex positions of the carrier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Loc {
    /// The cell dual to the sub-simplex spanned by `mask`; singletons at
    /// ideal positions are excluded.
    Span(u8),
    /// The part of a `Span` cell that lies in the cusp of the ideal vertex at
    /// position `ideal` (which belongs to `span`).
    Cusp { span: u8, ideal: u8 },
    /// Inside a truncation cell: the cell dual to the sub-face `mask` of the
    /// cusp cross-section.
    Link(u8),
}

impl Loc {
    /// Codimension of the MIX cell inside its STD carrier.
    #[inline]
    pub fn local_dim(self) -> usize {
        match self {
            Loc::Span(m) | Loc::Link(m) => m.count_ones() as usize - 1,
            Loc::Cusp { span, .. } => span.count_ones() as usize - 2,
        }
    }

    #[inline]
    pub fn mask(self) -> u8 {
        match self {
            Loc::Span(m) | Loc::Link(m) => m,
            Loc::Cusp { span, .. } => span,
        }
    }
}

/// A cell of the mixed decomposition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MixCell {
    /// Dimension of the STD carrier.
    pub k: usize,
    pub sigma: StdCell,
    pub loc: Loc,
}

impl MixCell {
    #[inline]
    pub fn dim(&self) -> usize {
        self.k - self.loc.local_dim()
    }
}

/// Ascending positions in a mask.
pub(crate) fn positions(mask: u8) -> impl Iterator<Item = usize> {
    (0..8).filter(move |&i| mask & (1 << i) != 0)
}

pub(crate) fn mask_of<I: IntoIterator<Item = usize>>(ps: I) -> u8 {
    ps.into_iter().fold(0u8, |m, p| m | (1 << p))
}

/// Ordered cells with reverse lookup.
#[derive(Clone, Debug)]
pub struct CellChart<C> {
    cells: Vec<C>,
    index: HashMap<C, usize>,
}

impl<C: Copy + Eq + Hash> Default for CellChart<C> {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<C: Copy + Eq + Hash> CellChart<C> {
    pub fn push(&mut self, cell: C) -> usize {
        let i = self.cells.len();
        self.cells.push(cell);
        self.index.insert(cell, i);
        i
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> C {
        self.cells[i]
    }

    #[inline]
    pub fn position(&self, cell: &C) -> Option<usize> {
        self.index.get(cell).copied()
    }

    pub fn cells(&self) -> &[C] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &C> {
        self.cells.iter()
    }
}

impl<C: Copy + Eq + Hash> FromIterator<C> for CellChart<C> {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let mut chart = Self::default();
        for c in iter {
            chart.push(c);
        }
        chart
    }
}

/// First embedding of the face carrying a STD `k`-cell.
pub fn carrier(sk: &Skeleton, k: usize, sigma: StdCell) -> &FaceEmbedding {
    match sigma {
        StdCell::Face(i) => sk.canonical(k, i),
        StdCell::Ideal { face, .. } => sk.canonical(k + 1, face),
    }
}

/// Canonical positions of the carrier that are ideal vertices.
pub fn ideal_positions(sk: &Skeleton, k: usize, sigma: StdCell) -> u8 {
    let e = carrier(sk, k, sigma);
    mask_of(
        e.vertices
            .iter()
            .enumerate()
            .filter(|&(_, &v)| sk.is_ideal_at(e.simplex, v))
            .map(|(p, _)| p),
    )
}

/// Truncation cells lie in ∂M; faces follow the skeleton's boundary flags.
pub fn std_is_boundary(sk: &Skeleton, k: usize, sigma: StdCell) -> bool {
    match sigma {
        StdCell::Face(i) => sk.is_boundary(k, i),
        StdCell::Ideal { .. } => true,
    }
}

/// Local faces of the barycentric block of a STD `k`-cell, in registry order.
pub fn local_faces(sk: &Skeleton, k: usize, sigma: StdCell) -> Vec<Loc> {
    let mut out = Vec::new();
    match sigma {
        StdCell::Face(_) => {
            let ideal = ideal_positions(sk, k, sigma);
            for size in 1..=k + 1 {
                for t in (0..=k).combinations(size) {
                    if size == 1 && ideal & (1 << t[0]) != 0 {
                        continue;
                    }
                    out.push(Loc::Span(mask_of(t)));
                }
            }
            for size in 2..=k + 1 {
                for t in (0..=k).combinations(size) {
                    for &i in &t {
                        if ideal & (1 << i) != 0 {
                            out.push(Loc::Cusp {
                                span: mask_of(t.iter().copied()),
                                ideal: i as u8,
                            });
                        }
                    }
                }
            }
        }
        StdCell::Ideal { pos, .. } => {
            let others: Vec<usize> = (0..k + 2).filter(|&p| p != pos).collect();
            for size in 1..=k + 1 {
                for r in others.iter().copied().combinations(size) {
                    out.push(Loc::Link(mask_of(r)));
                }
            }
        }
    }
    out
}

/// Cells of every decomposition, per system and dimension.
#[derive(Clone, Debug)]
pub struct CellRegistry {
    ambient: usize,
    std: HashMap<CoordinateSystem, Vec<CellChart<StdCell>>>,
    mix: HashMap<CoordinateSystem, Vec<CellChart<MixCell>>>,
}

impl CellRegistry {
    pub fn new(sk: &Skeleton) -> Result<Self, HomologyError> {
        let n = sk.dim();
        if !(3..=4).contains(&n) {
            return Err(HomologyError::InvalidTriangulation(format!(
                "no cellular decompositions in dimension {n}"
            )));
        }

        // 1. standard cells
        let mut full: Vec<CellChart<StdCell>> = Vec::with_capacity(n + 1);
        for d in 0..=n {
            let mut chart = CellChart::default();
            for i in 0..sk.count(d) {
                if d == 0 && sk.is_ideal(i) {
                    continue;
                }
                chart.push(StdCell::Face(i));
            }
            if d < n {
                for face in 0..sk.count(d + 1) {
                    let e = sk.canonical(d + 1, face);
                    for (pos, &v) in e.vertices.iter().enumerate() {
                        if sk.is_ideal_at(e.simplex, v) {
                            chart.push(StdCell::Ideal { face, pos });
                        }
                    }
                }
            }
            full.push(chart);
        }
        let select = |d: usize, bdry: bool| -> CellChart<StdCell> {
            full[d]
                .iter()
                .copied()
                .filter(|&c| std_is_boundary(sk, d, c) == bdry)
                .collect()
        };

        let mut std = HashMap::new();
        std.insert(
            CoordinateSystem::StdBdry,
            (0..n).map(|d| select(d, true)).collect(),
        );
        std.insert(
            CoordinateSystem::StdRelBdry,
            (0..=n).map(|d| select(d, false)).collect(),
        );
        // 2. dual cells, indexed by dual dimension
        std.insert(
            CoordinateSystem::Dual,
            (0..=n).map(|j| select(n - j, false)).collect(),
        );
        std.insert(CoordinateSystem::DualRelBdry, (0..=n).map(|j| full[n - j].clone()).collect());
        std.insert(
            CoordinateSystem::DualBdry,
            (0..n).map(|j| select(n - 1 - j, true)).collect(),
        );

        // 3. mixed cells, block by block
        let mut mix_full: Vec<CellChart<MixCell>> = vec![CellChart::default(); n + 1];
        for (k, chart) in full.iter().enumerate() {
            for &sigma in chart.iter() {
                for loc in local_faces(sk, k, sigma) {
                    let cell = MixCell { k, sigma, loc };
                    mix_full[cell.dim()].push(cell);
                }
            }
        }
        let mix_select = |d: usize, bdry: bool| -> CellChart<MixCell> {
            mix_full[d]
                .iter()
                .copied()
                .filter(|c| std_is_boundary(sk, c.k, c.sigma) == bdry)
                .collect()
        };
        let mut mix = HashMap::new();
        mix.insert(CoordinateSystem::MixBdry, (0..n).map(|d| mix_select(d, true)).collect());
        mix.insert(
            CoordinateSystem::MixRelBdry,
            (0..=n).map(|d| mix_select(d, false)).collect(),
        );
        mix.insert(CoordinateSystem::Mix, mix_full);
        std.insert(CoordinateSystem::Std, full);

        let reg = Self { ambient: n, std, mix };
        for system in CoordinateSystem::ALL {
            log::trace!(
                "registry {system}: {:?}",
                (0..=system.top_dim(n))
                    .map(|d| reg.count(system, d).unwrap_or(0))
                    .collect::<Vec<_>>()
            );
        }
        Ok(reg)
    }

    #[inline]
    pub fn ambient_dim(&self) -> usize {
        self.ambient
    }

    pub fn check_dim(&self, system: CoordinateSystem, d: usize) -> Result<(), HomologyError> {
        let top = system.top_dim(self.ambient);
        if d > top {
            return Err(HomologyError::DimOutOfRange { dim: d, system, top });
        }
        Ok(())
    }

    /// STD cells of dimension `d`, including boundary and truncation cells.
    pub fn std_cells(&self, d: usize) -> &CellChart<StdCell> {
        &self.std[&CoordinateSystem::Std][d]
    }

    /// MIX cells of dimension `d`.
    pub fn mix_cells(&self, d: usize) -> &CellChart<MixCell> {
        &self.mix[&CoordinateSystem::Mix][d]
    }

    /// Chart of a STD- or DUAL-family system. For DUAL systems `d` is the
    /// dual dimension and the chart lists the STD cells being dualized.
    pub fn std_chart(&self, system: CoordinateSystem, d: usize) -> Result<&CellChart<StdCell>, HomologyError> {
        self.check_dim(system, d)?;
        self.std
            .get(&system)
            .and_then(|v| v.get(d))
            .ok_or_else(|| HomologyError::UnsupportedHom(format!("{system} has no standard-cell chart")))
    }

    pub fn mix_chart(&self, system: CoordinateSystem, d: usize) -> Result<&CellChart<MixCell>, HomologyError> {
        self.check_dim(system, d)?;
        self.mix
            .get(&system)
            .and_then(|v| v.get(d))
            .ok_or_else(|| HomologyError::UnsupportedHom(format!("{system} has no mixed-cell chart")))
    }

    /// Number of `d`-cells of `system`.
    pub fn count(&self, system: CoordinateSystem, d: usize) -> Result<usize, HomologyError> {
        match system.family() {
            Family::Mix => Ok(self.mix_chart(system, d)?.len()),
            _ => Ok(self.std_chart(system, d)?.len()),
        }
    }

    /// Dimension of the STD cells dual to the `j`-cells of a DUAL system.
    pub fn dual_carrier_dim(&self, system: CoordinateSystem, j: usize) -> usize {
        match system.part() {
            Part::Boundary => self.ambient - 1 - j,
            _ => self.ambient - j,
        }
    }

    /// `Σ (−1)^d · #cells`.
    pub fn euler_characteristic(&self, system: CoordinateSystem) -> Result<i64, HomologyError> {
        let mut chi = 0i64;
        for d in 0..=system.top_dim(self.ambient) {
            let c = self.count(system, d)? as i64;
            chi += if d % 2 == 0 { c } else { -c };
        }
        Ok(chi)
    }
}
