//! The 2-complex dual to the STD decomposition, used to present π₁.
//!
//! Vertices are the top simplices together with the boundary `(n−1)`-cells.
//! Every STD `(n−1)`-cell gives an edge: an interior facet joins two
//! simplices, a boundary facet or ideal truncation cell connects a simplex to
//! its boundary vertex. Boundary `(n−2)`-cells give edges inside the
//! boundary. The 2-cells ("cycles") are dual to `(n−2)`-faces of the
//! interior and `(n−3)`-cells of the boundary; their edge words become the
//! relators of the presentation.

use hashbrown::HashMap;

use crate::cellular::adjacency::{AdjacencyStore, StdTerm, parity};
use crate::cellular::cells::{CellRegistry, StdCell, std_is_boundary};
use crate::debug_invariants::DebugInvariants;
use crate::homology_error::HomologyError;
use crate::topology::perm::{Perm, list_sign};
use crate::topology::skeleton::{Skeleton, vertex_mask};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CoverVertex {
    Simplex(usize),
    /// A boundary `(n−1)`-cell of the STD decomposition.
    Boundary(StdCell),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CoverEdge {
    /// Dual to a STD `(n−1)`-cell.
    Dual(StdCell),
    /// Dual to a boundary STD `(n−2)`-cell, inside the boundary.
    Boundary(StdCell),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CycleKind {
    /// Around an interior `(n−2)`-face.
    Interior,
    /// Around a boundary `(n−2)`-face, closed through the boundary.
    Connector,
    /// Around an ideal `(n−2)`-cell, closed through the cusp.
    IdealConnector,
    /// Around a boundary `(n−3)`-face, inside the boundary.
    StdBoundary,
    /// Around an ideal `(n−3)`-cell, inside the cusp.
    IdealBoundary,
}

impl CycleKind {
    /// Whether the cycle lies entirely in the boundary.
    pub fn is_boundary(self) -> bool {
        matches!(self, CycleKind::StdBoundary | CycleKind::IdealBoundary)
    }
}

/// An oriented 2-cell: its dual cell and the signed edge word around it.
#[derive(Clone, Debug)]
pub struct Cycle {
    pub kind: CycleKind,
    pub cell: StdCell,
    pub word: Vec<(usize, i64)>,
}

#[derive(Clone, Debug)]
pub struct CoverComplex {
    dim: usize,
    vertices: Vec<CoverVertex>,
    vertex_index: HashMap<CoverVertex, usize>,
    edges: Vec<CoverEdge>,
    edge_index: HashMap<CoverEdge, usize>,
    /// Per edge, its ends as `(vertex, incidence)`, one entry per occurrence.
    ends: Vec<Vec<(usize, i64)>>,
    cycles: Vec<Cycle>,
}

/// Borrowed inputs shared by the builders.
struct Builder<'a> {
    sk: &'a Skeleton,
    reg: &'a CellRegistry,
    adj: &'a AdjacencyStore,
    n: usize,
}

fn missing_vertex(n: usize, verts: &[usize]) -> Result<usize, HomologyError> {
    (0..=n)
        .find(|v| !verts.contains(v))
        .ok_or_else(|| HomologyError::InvalidTriangulation("facet covers the whole simplex".into()))
}

fn all_but(n: usize, skip: &[usize]) -> Vec<usize> {
    (0..=n).filter(|v| !skip.contains(v)).collect()
}

impl<'a> Builder<'a> {
    /// Incidence of simplex `s` with the dual edge of its facet opposite `j`.
    fn facet_coefficient(&self, s: usize, j: usize) -> Result<(i64, usize), HomologyError> {
        let n = self.n;
        let verts = all_but(n, &[j]);
        let look = self.sk.face_at(s, &verts)?;
        let sign = if j % 2 == 0 { 1 } else { -1 };
        let coef = sign * list_sign(&verts, look.canon);
        let e = self
            .sk
            .local_orientation(n - 1, look.index, s, &verts)
            .ok_or_else(|| HomologyError::InvalidTriangulation(format!("facet {} is not two-sided", look.index)))?;
        Ok((parity(n) * e * coef, look.index))
    }

    /// Incidence of simplex `s` with the connector to its truncation cell at vertex `i`.
    fn ideal_coefficient(&self, s: usize, i: usize) -> Result<(i64, StdCell), HomologyError> {
        let c = parity(self.n) * parity(i + 1);
        let face = self.sk.top_face(s)?;
        Ok((c, StdCell::Ideal { face, pos: i }))
    }

    /// Signed incidence of the unique boundary term of the `k`-cell `sigma`
    /// selected by `pick`.
    fn term_coefficient(
        &self,
        k: usize,
        sigma: StdCell,
        pick: impl Fn(&StdTerm) -> bool,
    ) -> Result<i64, HomologyError> {
        let idx = self.reg.std_cells(k).position(&sigma).ok_or_else(|| {
            HomologyError::InvalidTriangulation(format!("{sigma:?} is not a {k}-cell"))
        })?;
        let mut found = None;
        for term in self.adj.std_terms(k, idx).iter().filter(|t| pick(t)) {
            if found.is_some() {
                return Err(HomologyError::InvalidTriangulation(format!(
                    "{sigma:?} meets a boundary cell twice at one occurrence"
                )));
            }
            found = Some(parity(k) * term.local_orientation(self.sk, k)? * term.coef);
        }
        found.ok_or_else(|| HomologyError::InvalidTriangulation(format!("{sigma:?} has no matching boundary term")))
    }

    /// Incidence `b` picks up from the boundary edge of `c`.
    fn boundary_end(&self, b: StdCell, term: &StdTerm) -> Result<i64, HomologyError> {
        let n = self.n;
        let cb = parity(n - 1) * term.local_orientation(self.sk, n - 1)? * term.coef;
        let ob = match b {
            StdCell::Face(f) => {
                let emb = self.sk.canonical(n - 1, f);
                self.facet_coefficient(emb.simplex, missing_vertex(n, &emb.vertices)?)?.0
            }
            StdCell::Ideal { face, pos } => self.ideal_coefficient(self.sk.canonical(n, face).simplex, pos)?.0,
        };
        Ok(-cb * ob)
    }
}

impl CoverComplex {
    pub fn new(sk: &Skeleton, reg: &CellRegistry, adj: &AdjacencyStore) -> Result<Self, HomologyError> {
        let n = sk.dim();
        let b = Builder { sk, reg, adj, n };

        let mut vertices: Vec<CoverVertex> = (0..sk.triangulation().size()).map(CoverVertex::Simplex).collect();
        vertices.extend(
            reg.std_cells(n - 1)
                .iter()
                .filter(|&&c| std_is_boundary(sk, n - 1, c))
                .map(|&c| CoverVertex::Boundary(c)),
        );
        let mut edges: Vec<CoverEdge> = reg.std_cells(n - 1).iter().map(|&c| CoverEdge::Dual(c)).collect();
        edges.extend(
            reg.std_cells(n - 2)
                .iter()
                .filter(|&&c| std_is_boundary(sk, n - 2, c))
                .map(|&c| CoverEdge::Boundary(c)),
        );
        let vertex_index = vertices.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let edge_index = edges.iter().enumerate().map(|(i, &e)| (e, i)).collect();

        let mut cx = CoverComplex {
            dim: n,
            vertices,
            vertex_index,
            edges,
            edge_index,
            ends: Vec::new(),
            cycles: Vec::new(),
        };
        cx.ends = cx.edges.iter().map(|&e| cx.edge_ends(&b, e)).collect::<Result<_, _>>()?;
        cx.build_face_cycles(&b)?;
        cx.build_ideal_connectors(&b)?;
        cx.build_std_boundary_cycles(&b)?;
        cx.build_ideal_boundary_cycles(&b)?;
        log::debug!(
            "cover complex: {} vertices, {} edges, {} cycles",
            cx.vertices.len(),
            cx.edges.len(),
            cx.cycles.len()
        );
        Ok(cx)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn vertices(&self) -> &[CoverVertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[CoverEdge] {
        &self.edges
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Ends of edge `e` as `(vertex, incidence)`; a loop lists both ends.
    pub fn ends(&self, e: usize) -> &[(usize, i64)] {
        &self.ends[e]
    }

    pub fn vertex_position(&self, v: &CoverVertex) -> Option<usize> {
        self.vertex_index.get(v).copied()
    }

    fn vertex(&self, v: CoverVertex) -> Result<usize, HomologyError> {
        self.vertex_position(&v)
            .ok_or_else(|| HomologyError::InvalidTriangulation(format!("{v:?} is not a cover vertex")))
    }

    fn edge(&self, e: CoverEdge) -> Result<usize, HomologyError> {
        self.edge_index
            .get(&e)
            .copied()
            .ok_or_else(|| HomologyError::InvalidTriangulation(format!("{e:?} is not a cover edge")))
    }

    fn edge_ends(&self, b: &Builder<'_>, e: CoverEdge) -> Result<Vec<(usize, i64)>, HomologyError> {
        let n = self.dim;
        let mut out = Vec::new();
        match e {
            CoverEdge::Dual(StdCell::Face(f)) => {
                for emb in b.sk.embeddings(n - 1, f) {
                    let j = missing_vertex(n, &emb.vertices)?;
                    let (c, _) = b.facet_coefficient(emb.simplex, j)?;
                    out.push((self.vertex(CoverVertex::Simplex(emb.simplex))?, c));
                    if b.sk.triangulation().adjacent(emb.simplex, j).is_none() {
                        out.push((self.vertex(CoverVertex::Boundary(StdCell::Face(f)))?, -c));
                    }
                }
            }
            CoverEdge::Dual(cell @ StdCell::Ideal { face, pos }) => {
                let s = b.sk.canonical(n, face).simplex;
                let (c, _) = b.ideal_coefficient(s, pos)?;
                out.push((self.vertex(CoverVertex::Simplex(s))?, c));
                out.push((self.vertex(CoverVertex::Boundary(cell))?, -c));
            }
            CoverEdge::Boundary(c) => {
                for (idx, &bc) in b.reg.std_cells(n - 1).iter().enumerate() {
                    if !std_is_boundary(b.sk, n - 1, bc) {
                        continue;
                    }
                    for term in b.adj.std_terms(n - 1, idx).iter().filter(|t| t.target == c) {
                        out.push((self.vertex(CoverVertex::Boundary(bc))?, b.boundary_end(bc, term)?));
                    }
                }
            }
        }
        Ok(out)
    }

    /// Cycles around the non-ideal `(n−2)`-faces.
    fn build_face_cycles(&mut self, b: &Builder<'_>) -> Result<(), HomologyError> {
        let n = self.dim;
        for tau in 0..b.sk.count(n - 2) {
            let ring = b.sk.cyclic_embeddings(tau)?;
            let boundary = b.sk.is_boundary(n - 2, tau);
            let mut word = Vec::with_capacity(ring.len() + 2);
            let (s0, p0) = ring[0];
            if boundary {
                let (c, b0) = b.facet_coefficient(s0, p0.apply(n - 1))?;
                word.push((self.edge(CoverEdge::Dual(StdCell::Face(b0)))?, c));
            }
            for (k, &(s, p)) in ring.iter().enumerate() {
                let (c, f) = b.facet_coefficient(s, p.apply(n))?;
                word.push((self.edge(CoverEdge::Dual(StdCell::Face(f)))?, -c));
                if boundary && k + 1 == ring.len() {
                    // close through the boundary, arriving at the first boundary facet
                    let (ob0, b0) = b.facet_coefficient(s0, p0.apply(n - 1))?;
                    let tv = vertex_mask(&p0.images().take(n - 1).collect::<Vec<_>>());
                    let c0 = b.term_coefficient(n - 1, StdCell::Face(b0), |t| {
                        t.target == StdCell::Face(tau) && t.simplex == s0 && t.mask == tv
                    })?;
                    word.push((self.edge(CoverEdge::Boundary(StdCell::Face(tau)))?, -c0 * ob0));
                }
            }
            let kind = if boundary { CycleKind::Connector } else { CycleKind::Interior };
            self.cycles.push(Cycle {
                kind,
                cell: StdCell::Face(tau),
                word,
            });
        }
        Ok(())
    }

    /// Cycles around the ideal `(n−2)`-cells: facet, two connectors and one cusp edge.
    fn build_ideal_connectors(&mut self, b: &Builder<'_>) -> Result<(), HomologyError> {
        let n = self.dim;
        for &cell in b.reg.std_cells(n - 2).iter() {
            let StdCell::Ideal { face: f, pos: i } = cell else {
                continue;
            };
            let [ea, eb] = b.sk.embeddings(n - 1, f) else {
                return Err(HomologyError::InvalidTriangulation(format!(
                    "facet {f} carries an ideal vertex but is not interior"
                )));
            };
            let (sa, va) = (ea.simplex, &ea.vertices);
            let (sb, vb) = (eb.simplex, &eb.vertices);
            let mut word = Vec::with_capacity(4);

            let (ca, _) = b.facet_coefficient(sa, missing_vertex(n, va)?)?;
            word.push((self.edge(CoverEdge::Dual(StdCell::Face(f)))?, -ca));
            let (cb, con_b) = b.ideal_coefficient(sb, vb[i])?;
            word.push((self.edge(CoverEdge::Dual(con_b))?, -cb));

            let (oa, con_a) = b.ideal_coefficient(sa, va[i])?;
            let mask = vertex_mask(va);
            let c0 = b.term_coefficient(n - 1, con_a, |t| t.target == cell && t.simplex == sa && t.mask == mask)?;
            word.push((self.edge(CoverEdge::Boundary(cell))?, -c0 * oa));
            word.push((self.edge(CoverEdge::Dual(con_a))?, oa));
            self.cycles.push(Cycle {
                kind: CycleKind::IdealConnector,
                cell,
                word,
            });
        }
        Ok(())
    }

    /// Cycles around the non-ideal boundary `(n−3)`-faces, walked inside the boundary.
    fn build_std_boundary_cycles(&mut self, b: &Builder<'_>) -> Result<(), HomologyError> {
        let n = self.dim;
        let tri = b.sk.triangulation();
        let swap = Perm::transposition(n + 1, n - 1, n);
        let turn = Perm::transposition(n + 1, n - 2, n - 1);
        for rho in 0..b.sk.count(n - 3) {
            if !b.sk.is_boundary(n - 3, rho) || (n == 3 && b.sk.is_ideal(rho)) {
                continue;
            }
            // 1. start on a boundary facet through some occurrence of rho
            let mut start = None;
            'search: for emb in b.sk.embeddings(n - 3, rho) {
                for a in 0..=n {
                    if emb.vertices.contains(&a) || tri.adjacent(emb.simplex, a).is_some() {
                        continue;
                    }
                    let mut images = emb.vertices.clone();
                    images.extend((0..=n).filter(|&v| v != a && !emb.vertices.contains(&v)));
                    images.push(a);
                    start = Some((emb.simplex, Perm::from_images(&images)?));
                    break 'search;
                }
            }
            let Some(start) = start else {
                return Err(HomologyError::InvalidTriangulation(format!(
                    "boundary ({})-face {rho} lies on no boundary facet",
                    n - 3
                )));
            };

            // 2. alternate between crossing a boundary (n−2)-face and turning around it
            let bound = 4 * b.reg.std_cells(n - 2).len() + 4;
            let (mut s, mut big) = start;
            let mut word = Vec::new();
            loop {
                let mut p = big.compose(swap);
                while let Some(g) = tri.adjacent(s, p.apply(n)) {
                    s = g.simplex;
                    p = g.perm.compose(p).compose(swap);
                }
                let tau_verts: Vec<usize> = p.images().take(n - 1).collect();
                let tau = b.sk.face_at(s, &tau_verts)?.index;
                let (onew, bnew) = b.facet_coefficient(s, p.apply(n))?;
                let mask = vertex_mask(&tau_verts);
                let cnew = b.term_coefficient(n - 1, StdCell::Face(bnew), |t| {
                    t.target == StdCell::Face(tau) && t.simplex == s && t.mask == mask
                })?;
                word.push((self.edge(CoverEdge::Boundary(StdCell::Face(tau)))?, -cnew * onew));
                big = p.compose(turn);
                if (s, big) == start {
                    break;
                }
                if word.len() > bound {
                    return Err(HomologyError::InvalidTriangulation(format!(
                        "boundary walk around ({})-face {rho} does not close",
                        n - 3
                    )));
                }
            }
            self.cycles.push(Cycle {
                kind: CycleKind::StdBoundary,
                cell: StdCell::Face(rho),
                word,
            });
        }
        Ok(())
    }

    /// Cycles around the ideal `(n−3)`-cells, walked inside the cusp.
    fn build_ideal_boundary_cycles(&mut self, b: &Builder<'_>) -> Result<(), HomologyError> {
        let n = self.dim;
        let tri = b.sk.triangulation();
        let swap = Perm::transposition(n + 1, n - 1, n);
        for &cell in b.reg.std_cells(n - 3).iter() {
            let StdCell::Ideal { face: g, pos: i } = cell else {
                continue;
            };
            let ring = b.sk.cyclic_embeddings(g)?;
            let mut word = Vec::with_capacity(ring.len());
            for (s, p) in ring {
                let gl = tri.adjacent(s, p.apply(n)).ok_or_else(|| {
                    HomologyError::InvalidTriangulation(format!("ideal ({})-face {g} touches the boundary", n - 2))
                })?;
                let t = gl.simplex;
                let p2 = gl.perm.compose(p).compose(swap);
                let iv = p2.apply(i);
                let fverts = all_but(n, &[p2.apply(n - 1)]);
                let look = b.sk.face_at(t, &fverts)?;
                let ip = look.canon.iter().position(|&v| v == iv).ok_or_else(|| {
                    HomologyError::InvalidTriangulation("ideal vertex missing from its facet".into())
                })?;
                let target = StdCell::Ideal {
                    face: look.index,
                    pos: ip,
                };
                let (oi, icell) = b.ideal_coefficient(t, iv)?;
                let mask = vertex_mask(&fverts);
                let cc = b.term_coefficient(n - 1, icell, |tm| {
                    tm.target == target && tm.simplex == t && tm.mask == mask
                })?;
                word.push((self.edge(CoverEdge::Boundary(target))?, -cc * oi));
            }
            self.cycles.push(Cycle {
                kind: CycleKind::IdealBoundary,
                cell,
                word,
            });
        }
        Ok(())
    }
}

impl DebugInvariants for CoverComplex {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "cover complex");
    }

    /// Every cycle is closed: its edge word has zero boundary.
    fn validate_invariants(&self) -> Result<(), HomologyError> {
        for cycle in &self.cycles {
            let mut total: HashMap<usize, i64> = HashMap::new();
            for &(e, d) in &cycle.word {
                for &(v, c) in &self.ends[e] {
                    *total.entry(v).or_insert(0) += d * c;
                }
            }
            if total.values().any(|&x| x != 0) {
                return Err(HomologyError::InvalidTriangulation(format!(
                    "{:?} cycle around {:?} is not closed",
                    cycle.kind, cycle.cell
                )));
            }
        }
        Ok(())
    }
}
