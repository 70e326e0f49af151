//! Faces of every dimension of a triangulation.
//!
//! A `d`-face is an equivalence class of `(simplex, vertex subset)` pairs
//! under the gluings. Faces are numbered per dimension in order of first
//! appearance when scanning simplices, and within a simplex the vertex
//! subsets in lexicographic order. The first embedding fixes the face's
//! *canonical* vertex order; every other embedding lists the images of those
//! vertices in its own simplex, in the same order.

use std::collections::VecDeque;

use hashbrown::HashMap;
use itertools::Itertools;

use crate::algebra::abelian_group::MarkedAbelianGroup;
use crate::algebra::matrix::IntMatrix;
use crate::homology_error::HomologyError;
use crate::topology::perm::{Perm, list_sign};
use crate::topology::triangulation::{SimplexOrientation, Triangulation};

/// One occurrence of a face inside a top simplex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceEmbedding {
    pub simplex: usize,
    /// Local vertices of `simplex`, in the face's canonical order.
    pub vertices: Vec<usize>,
}

#[derive(Clone, Debug)]
struct Slot {
    dim: usize,
    index: usize,
    canon: Vec<usize>,
}

/// Result of [`Skeleton::face_at`].
#[derive(Clone, Copy, Debug)]
pub struct FaceLookup<'a> {
    pub dim: usize,
    pub index: usize,
    /// The occurrence's vertices in canonical order.
    pub canon: &'a [usize],
}

#[inline]
pub(crate) fn vertex_mask(verts: &[usize]) -> u8 {
    verts.iter().fold(0u8, |m, &v| m | (1 << v))
}

#[derive(Clone, Debug)]
pub struct Skeleton {
    tri: Triangulation,
    faces: Vec<Vec<Vec<FaceEmbedding>>>,
    lookup: HashMap<(usize, u8), Slot>,
    boundary: Vec<Vec<bool>>,
    ideal: Vec<bool>,
    orientation: SimplexOrientation,
    local: Vec<Vec<HashMap<(usize, u8), Option<i64>>>>,
}

impl Skeleton {
    pub fn new(tri: &Triangulation) -> Result<Self, HomologyError> {
        let n = tri.dim();
        let mut sk = Skeleton {
            tri: tri.clone(),
            faces: vec![Vec::new(); n + 1],
            lookup: HashMap::new(),
            boundary: Vec::new(),
            ideal: Vec::new(),
            orientation: tri.orientation(),
            local: Vec::new(),
        };
        for d in 0..=n {
            for s in 0..tri.size() {
                for sub in (0..=n).combinations(d + 1) {
                    if sk.lookup.contains_key(&(s, vertex_mask(&sub))) {
                        continue;
                    }
                    let index = sk.faces[d].len();
                    let embs = sk.enumerate_face(d, index, s, sub)?;
                    sk.faces[d].push(embs);
                }
            }
        }

        sk.boundary = sk.faces.iter().map(|f| vec![false; f.len()]).collect();
        for s in 0..tri.size() {
            for f in 0..=n {
                if tri.adjacent(s, f).is_some() {
                    continue;
                }
                let others: Vec<usize> = (0..=n).filter(|&v| v != f).collect();
                for d in 0..n {
                    for sub in others.iter().copied().combinations(d + 1) {
                        let slot = &sk.lookup[&(s, vertex_mask(&sub))];
                        sk.boundary[slot.dim][slot.index] = true;
                    }
                }
            }
        }

        sk.ideal = vec![false; sk.faces[0].len()];
        for v in 0..sk.faces[0].len() {
            if sk.boundary[0][v] {
                continue;
            }
            let ideal = match n {
                3 => sk.link_euler_char(v) != 2,
                4 => {
                    let link = Skeleton::new(&sk.vertex_link(v)?)?;
                    let h1 = MarkedAbelianGroup::new(
                        link.simplicial_boundary(1)?,
                        link.simplicial_boundary(2)?,
                        0,
                    )?;
                    !h1.is_trivial()
                }
                _ => false,
            };
            sk.ideal[v] = ideal;
        }

        sk.local = (0..=n)
            .map(|d| (0..sk.faces[d].len()).map(|i| sk.local_orientations(d, i)).collect())
            .collect();
        log::trace!(
            "skeleton: f-vector {:?}, {} ideal vertices, orientable = {}",
            sk.faces.iter().map(Vec::len).collect::<Vec<_>>(),
            sk.ideal.iter().filter(|&&b| b).count(),
            sk.orientation.orientable
        );
        Ok(sk)
    }

    fn enumerate_face(
        &mut self,
        dim: usize,
        index: usize,
        s: usize,
        sub: Vec<usize>,
    ) -> Result<Vec<FaceEmbedding>, HomologyError> {
        let n = self.tri.dim();
        let mut embs = Vec::new();
        self.lookup.insert(
            (s, vertex_mask(&sub)),
            Slot {
                dim,
                index,
                canon: sub.clone(),
            },
        );
        let mut queue = VecDeque::from([(s, sub)]);
        while let Some((s, verts)) = queue.pop_front() {
            for f in 0..=n {
                if verts.contains(&f) {
                    continue;
                }
                let Some(g) = self.tri.adjacent(s, f) else {
                    continue;
                };
                let image: Vec<usize> = verts.iter().map(|&v| g.perm.apply(v)).collect();
                let key = (g.simplex, vertex_mask(&image));
                match self.lookup.get(&key) {
                    Some(slot) => {
                        if (slot.dim, slot.index) != (dim, index) || slot.canon != image {
                            return Err(HomologyError::InvalidTriangulation(format!(
                                "{dim}-face {index} is identified with itself under a nontrivial permutation"
                            )));
                        }
                    }
                    None => {
                        self.lookup.insert(
                            key,
                            Slot {
                                dim,
                                index,
                                canon: image.clone(),
                            },
                        );
                        queue.push_back((g.simplex, image));
                    }
                }
            }
            embs.push(FaceEmbedding {
                simplex: s,
                vertices: verts,
            });
        }
        Ok(embs)
    }

    /// Propagate `e' = −sign(g)·e` over the occurrences of a face; a
    /// conflicting assignment marks the occurrence `None`.
    fn local_orientations(&self, dim: usize, index: usize) -> HashMap<(usize, u8), Option<i64>> {
        let n = self.tri.dim();
        let first = &self.faces[dim][index][0];
        let mut e = HashMap::new();
        e.insert((first.simplex, vertex_mask(&first.vertices)), Some(1i64));
        let mut queue = VecDeque::from([(first.simplex, first.vertices.clone())]);
        while let Some((s, verts)) = queue.pop_front() {
            let cur = e[&(s, vertex_mask(&verts))];
            for f in 0..=n {
                if verts.contains(&f) {
                    continue;
                }
                let Some(g) = self.tri.adjacent(s, f) else {
                    continue;
                };
                let image: Vec<usize> = verts.iter().map(|&v| g.perm.apply(v)).collect();
                let key = (g.simplex, vertex_mask(&image));
                let want = cur.map(|c| -g.perm.sign() * c);
                match e.get(&key) {
                    None => {
                        e.insert(key, want);
                        queue.push_back((g.simplex, image));
                    }
                    Some(&have) if have != want => {
                        e.insert(key, None);
                    }
                    Some(_) => {}
                }
            }
        }
        e
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.tri.dim()
    }

    pub fn triangulation(&self) -> &Triangulation {
        &self.tri
    }

    /// Number of `d`-faces.
    #[inline]
    pub fn count(&self, d: usize) -> usize {
        self.faces.get(d).map_or(0, Vec::len)
    }

    pub fn embeddings(&self, d: usize, index: usize) -> &[FaceEmbedding] {
        &self.faces[d][index]
    }

    /// First embedding, which carries the canonical vertex order.
    pub fn canonical(&self, d: usize, index: usize) -> &FaceEmbedding {
        &self.faces[d][index][0]
    }

    /// Face spanned by the local vertices `verts` of `simplex`.
    pub fn face_at(&self, simplex: usize, verts: &[usize]) -> Result<FaceLookup<'_>, HomologyError> {
        let slot = self
            .lookup
            .get(&(simplex, vertex_mask(verts)))
            .ok_or_else(|| {
                HomologyError::InvalidTriangulation(format!("no face {verts:?} in simplex {simplex}"))
            })?;
        Ok(FaceLookup {
            dim: slot.dim,
            index: slot.index,
            canon: &slot.canon,
        })
    }

    /// Vertex class of local vertex `v` of `simplex`.
    pub fn vertex_of(&self, simplex: usize, v: usize) -> usize {
        self.lookup[&(simplex, 1u8 << v)].index
    }

    #[inline]
    pub fn is_boundary(&self, d: usize, index: usize) -> bool {
        self.boundary[d][index]
    }

    #[inline]
    pub fn is_ideal(&self, vertex: usize) -> bool {
        self.ideal[vertex]
    }

    /// Is local vertex `v` of `simplex` ideal?
    pub fn is_ideal_at(&self, simplex: usize, v: usize) -> bool {
        self.ideal[self.vertex_of(simplex, v)]
    }

    pub fn ideal_vertex_count(&self) -> usize {
        self.ideal.iter().filter(|&&b| b).count()
    }

    /// No boundary facets and no ideal vertices.
    pub fn is_closed(&self) -> bool {
        self.tri.boundary_facet_count() == 0 && self.ideal_vertex_count() == 0
    }

    #[inline]
    pub fn is_orientable(&self) -> bool {
        self.orientation.orientable
    }

    /// Orientation sign `ε_s` of a top simplex.
    #[inline]
    pub fn simplex_sign(&self, simplex: usize) -> i64 {
        self.orientation.signs[simplex]
    }

    /// Local orientation of the occurrence `(simplex, verts)` of a face
    /// relative to its first embedding; `None` when the star of the face is
    /// not orientable.
    pub fn local_orientation(&self, d: usize, index: usize, simplex: usize, verts: &[usize]) -> Option<i64> {
        self.local_orientation_at(d, index, simplex, vertex_mask(verts))
    }

    /// [`Skeleton::local_orientation`] keyed by the vertex mask of the occurrence.
    pub fn local_orientation_at(&self, d: usize, index: usize, simplex: usize, mask: u8) -> Option<i64> {
        self.local[d][index].get(&(simplex, mask)).copied().flatten()
    }

    /// Face index of the top simplex `simplex`.
    pub fn top_face(&self, simplex: usize) -> Result<usize, HomologyError> {
        let all: Vec<usize> = (0..=self.dim()).collect();
        Ok(self.face_at(simplex, &all)?.index)
    }

    /// Euler characteristic of a vertex link in dimension 3, counted from
    /// edge ends, triangle corners and tetrahedron corners.
    pub fn link_euler_char(&self, vertex: usize) -> i64 {
        let mut chi = self.faces[0][vertex].len() as i64;
        for (d, sign) in [(1usize, 1i64), (2, -1)] {
            for embs in &self.faces[d] {
                let e = &embs[0];
                let ends = e
                    .vertices
                    .iter()
                    .filter(|&&u| self.vertex_of(e.simplex, u) == vertex)
                    .count() as i64;
                chi += sign * ends;
            }
        }
        chi
    }

    /// The link of a vertex as a triangulation one dimension down; corner
    /// `(s, i)` of the vertex becomes one simplex of the link.
    pub fn vertex_link(&self, vertex: usize) -> Result<Triangulation, HomologyError> {
        let n = self.dim();
        let mut corners = Vec::new();
        let mut corner_of = HashMap::new();
        for s in 0..self.tri.size() {
            for i in 0..=n {
                if self.vertex_of(s, i) == vertex {
                    corner_of.insert((s, i), corners.len());
                    corners.push((s, i));
                }
            }
        }
        let mut link = Triangulation::new(n - 1, corners.len())?;
        for (k, &(s, i)) in corners.iter().enumerate() {
            let others: Vec<usize> = (0..=n).filter(|&u| u != i).collect();
            for (lf, &f) in others.iter().enumerate() {
                let Some(g) = self.tri.adjacent(s, f) else {
                    continue;
                };
                let gi = g.perm.apply(i);
                let k2 = corner_of[&(g.simplex, gi)];
                let targets: Vec<usize> = (0..=n).filter(|&u| u != gi).collect();
                let images: Vec<usize> = others
                    .iter()
                    .map(|&u| {
                        let x = g.perm.apply(u);
                        targets.iter().position(|&t| t == x).unwrap_or(0)
                    })
                    .collect();
                if link.adjacent(k, lf).is_none() {
                    link.join(k, lf, k2, Perm::from_images(&images)?)?;
                }
            }
        }
        Ok(link)
    }

    /// Simplicial boundary `∂_d` (rows `(d−1)`-faces, columns `d`-faces),
    /// ignoring boundary and ideal structure.
    pub fn simplicial_boundary(&self, d: usize) -> Result<IntMatrix, HomologyError> {
        let rows = if d == 0 { 0 } else { self.count(d - 1) };
        let mut m = IntMatrix::zeros(rows, self.count(d));
        if d == 0 {
            return Ok(m);
        }
        for (c, embs) in self.faces[d].iter().enumerate() {
            let e = &embs[0];
            for j in 0..=d {
                let mut sub = e.vertices.clone();
                sub.remove(j);
                let face = self.face_at(e.simplex, &sub)?;
                let sign = if j % 2 == 0 { 1 } else { -1 };
                m.add_to(face.index, c, sign * list_sign(&sub, face.canon))?;
            }
        }
        Ok(m)
    }

    /// Embeddings `(simplex, p)` around an `(n−2)`-face in cyclic order.
    ///
    /// `p` lists the face's vertices in positions `0..n−1` and the two
    /// remaining vertices last; the walk crosses the facet opposite `p(n)`.
    /// For a boundary face the ring starts at one boundary end.
    pub fn cyclic_embeddings(&self, index: usize) -> Result<Vec<(usize, Perm)>, HomologyError> {
        let n = self.dim();
        let ring_len = self.faces[n - 2][index].len();
        let first = &self.faces[n - 2][index][0];
        let mut images = first.vertices.clone();
        images.extend((0..=n).filter(|v| !first.vertices.contains(v)));
        let mut p = Perm::from_images(&images)?;
        let mut s = first.simplex;
        let swap = Perm::transposition(n + 1, n - 1, n);
        if self.boundary[n - 2][index] {
            for _ in 0..=ring_len {
                let Some(g) = self.tri.adjacent(s, p.apply(n - 1)) else {
                    break;
                };
                s = g.simplex;
                p = g.perm.compose(p).compose(swap);
            }
        }
        let start = (s, p);
        let mut out = Vec::with_capacity(ring_len);
        loop {
            out.push((s, p));
            if out.len() > ring_len {
                break;
            }
            let Some(g) = self.tri.adjacent(s, p.apply(n)) else {
                break;
            };
            s = g.simplex;
            p = g.perm.compose(p).compose(swap);
            if (s, p) == start {
                break;
            }
        }
        if out.len() != ring_len {
            return Err(HomologyError::InvalidTriangulation(format!(
                "ring around ({})-face {index} has {} embeddings, expected {ring_len}",
                n - 2,
                out.len()
            )));
        }
        Ok(out)
    }
}
