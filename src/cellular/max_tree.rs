//! Maximal tree of the cover complex, grown boundary-first.
//!
//! The breadth-first search from simplex 0 enters each boundary component
//! the first time it is seen and spans it completely with boundary edges
//! before continuing through interior facets. Every boundary component is
//! then spanned by a subtree of its own, so the non-tree boundary edges of
//! a component generate its fundamental group.

use std::collections::VecDeque;

use crate::cellular::cells::StdCell;
use crate::cellular::dual_graph::{CoverComplex, CoverEdge};
use crate::homology_error::HomologyError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// A component of the real boundary.
    Standard,
    /// A cusp cross-section.
    Ideal,
}

/// One boundary component: its kind and the cover vertices it contains.
#[derive(Clone, Debug)]
pub struct BoundaryComponent {
    pub kind: ComponentKind,
    pub vertices: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct MaximalTree {
    in_tree: Vec<bool>,
    components: Vec<BoundaryComponent>,
    /// Boundary component per vertex; `None` for simplex vertices.
    component_of: Vec<Option<usize>>,
}

struct Search<'a> {
    cx: &'a CoverComplex,
    incident: Vec<Vec<usize>>,
    visited: Vec<bool>,
    in_tree: Vec<bool>,
    components: Vec<BoundaryComponent>,
    component_of: Vec<Option<usize>>,
}

impl Search<'_> {
    fn other_ends(&self, e: usize) -> Vec<usize> {
        self.cx.ends(e).iter().map(|&(v, _)| v).collect()
    }

    /// Span the boundary component through `root` with boundary edges.
    fn span_component(&mut self, root: usize, kind: ComponentKind) {
        let id = self.components.len();
        let mut vertices = vec![root];
        self.component_of[root] = Some(id);
        let mut queue = VecDeque::from([root]);
        while let Some(v) = queue.pop_front() {
            for k in 0..self.incident[v].len() {
                let e = self.incident[v][k];
                if !matches!(self.cx.edges()[e], CoverEdge::Boundary(_)) {
                    continue;
                }
                for w in self.other_ends(e) {
                    if !self.visited[w] {
                        self.visited[w] = true;
                        self.in_tree[e] = true;
                        self.component_of[w] = Some(id);
                        vertices.push(w);
                        queue.push_back(w);
                    }
                }
            }
        }
        self.components.push(BoundaryComponent { kind, vertices });
    }
}

impl MaximalTree {
    pub fn new(cx: &CoverComplex) -> Result<Self, HomologyError> {
        let nv = cx.vertices().len();
        let mut incident = vec![Vec::new(); nv];
        for e in 0..cx.edges().len() {
            for &(v, _) in cx.ends(e) {
                incident[v].push(e);
            }
        }
        let mut search = Search {
            cx,
            incident,
            visited: vec![false; nv],
            in_tree: vec![false; cx.edges().len()],
            components: Vec::new(),
            component_of: vec![None; nv],
        };

        let mut queue = VecDeque::from([0usize]);
        search.visited[0] = true;
        while let Some(v) = queue.pop_front() {
            // 1. cusps, 2. real boundary, 3. interior facets
            for pass in 0..3 {
                for k in 0..search.incident[v].len() {
                    let e = search.incident[v][k];
                    let kind = match cx.edges()[e] {
                        CoverEdge::Dual(StdCell::Ideal { .. }) if pass == 0 => Some(ComponentKind::Ideal),
                        CoverEdge::Dual(StdCell::Face(f)) if pass == 1 && is_connector(cx, e, f) => {
                            Some(ComponentKind::Standard)
                        }
                        CoverEdge::Dual(StdCell::Face(f)) if pass == 2 && !is_connector(cx, e, f) => None,
                        _ => continue,
                    };
                    for w in search.other_ends(e) {
                        if search.visited[w] {
                            continue;
                        }
                        search.visited[w] = true;
                        search.in_tree[e] = true;
                        match kind {
                            Some(kind) => search.span_component(w, kind),
                            None => queue.push_back(w),
                        }
                    }
                }
            }
        }

        let tree_edges = search.in_tree.iter().filter(|&&b| b).count();
        if search.visited.iter().any(|&b| !b) || tree_edges + 1 != nv {
            return Err(HomologyError::InvalidTriangulation(format!(
                "cover complex is not connected ({tree_edges} tree edges for {nv} vertices)"
            )));
        }
        log::trace!(
            "maximal tree: {tree_edges} edges, {} boundary components",
            search.components.len()
        );
        Ok(MaximalTree {
            in_tree: search.in_tree,
            components: search.components,
            component_of: search.component_of,
        })
    }

    pub fn contains(&self, e: usize) -> bool {
        self.in_tree[e]
    }

    pub fn components(&self) -> &[BoundaryComponent] {
        &self.components
    }

    pub fn component_of(&self, v: usize) -> Option<usize> {
        self.component_of[v]
    }

    /// Boundary component containing the boundary edge `e`.
    pub fn edge_component(&self, cx: &CoverComplex, e: usize) -> Option<usize> {
        match cx.edges()[e] {
            CoverEdge::Boundary(_) => cx.ends(e).first().and_then(|&(v, _)| self.component_of(v)),
            CoverEdge::Dual(_) => None,
        }
    }
}

/// A facet edge reaching a boundary vertex.
fn is_connector(cx: &CoverComplex, e: usize, f: usize) -> bool {
    let target = crate::cellular::dual_graph::CoverVertex::Boundary(StdCell::Face(f));
    match cx.vertex_position(&target) {
        Some(b) => cx.ends(e).iter().any(|&(v, _)| v == b),
        None => false,
    }
}
