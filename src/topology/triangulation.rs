//! Facet-glued triangulations of dimension 2, 3 and 4.
//!
//! A triangulation is a set of `size()` top-dimensional simplices whose
//! facets are glued in pairs by vertex permutations. Facet `f` of simplex
//! `s` is the facet opposite vertex `f`. A gluing `(s, f) → (t, g)` sends
//! vertex `i` of `s` to vertex `g(i)` of `t`, so facet `f` of `s` lands on
//! facet `g(f)` of `t`. Unglued facets form the boundary.

use std::collections::VecDeque;

use crate::homology_error::HomologyError;
use crate::topology::perm::Perm;

/// Destination of a facet gluing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Gluing {
    pub simplex: usize,
    pub perm: Perm,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Triangulation {
    dim: usize,
    gluings: Vec<Vec<Option<Gluing>>>,
}

/// Orientation signs of the top simplices, propagated across gluings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimplexOrientation {
    /// `±1` per simplex; the first simplex of each component is `+1`.
    pub signs: Vec<i64>,
    pub orientable: bool,
}

impl Triangulation {
    /// `size` unglued simplices of dimension `dim`.
    pub fn new(dim: usize, size: usize) -> Result<Self, HomologyError> {
        if !(2..=4).contains(&dim) {
            return Err(HomologyError::InvalidTriangulation(format!(
                "dimension {dim} not supported"
            )));
        }
        Ok(Self {
            dim,
            gluings: vec![vec![None; dim + 1]; size],
        })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of top-dimensional simplices.
    #[inline]
    pub fn size(&self) -> usize {
        self.gluings.len()
    }

    #[inline]
    pub fn adjacent(&self, simplex: usize, facet: usize) -> Option<Gluing> {
        self.gluings[simplex][facet]
    }

    /// Glue facet `facet` of `simplex` to `target` through `perm`, recording
    /// both directions.
    pub fn join(
        &mut self,
        simplex: usize,
        facet: usize,
        target: usize,
        perm: Perm,
    ) -> Result<(), HomologyError> {
        let n = self.dim + 1;
        if simplex >= self.size() || target >= self.size() || facet >= n {
            return Err(HomologyError::InvalidTriangulation(format!(
                "gluing ({simplex}, {facet}) -> {target} out of range"
            )));
        }
        if perm.size() != n {
            return Err(HomologyError::InvalidTriangulation(format!(
                "gluing permutation {perm:?} has wrong size"
            )));
        }
        let back = perm.apply(facet);
        if simplex == target && back == facet {
            return Err(HomologyError::InvalidTriangulation(format!(
                "facet {facet} of simplex {simplex} glued to itself"
            )));
        }
        if self.gluings[simplex][facet].is_some() || self.gluings[target][back].is_some() {
            return Err(HomologyError::InvalidTriangulation(format!(
                "facet ({simplex}, {facet}) or ({target}, {back}) already glued"
            )));
        }
        self.gluings[simplex][facet] = Some(Gluing {
            simplex: target,
            perm,
        });
        self.gluings[target][back] = Some(Gluing {
            simplex,
            perm: perm.inverse(),
        });
        Ok(())
    }

    /// Number of unglued facets.
    pub fn boundary_facet_count(&self) -> usize {
        self.gluings.iter().flatten().filter(|g| g.is_none()).count()
    }

    pub fn is_connected(&self) -> bool {
        if self.size() == 0 {
            return true;
        }
        let mut seen = vec![false; self.size()];
        seen[0] = true;
        let mut queue = VecDeque::from([0usize]);
        let mut count = 1;
        while let Some(s) = queue.pop_front() {
            for g in self.gluings[s].iter().flatten() {
                if !seen[g.simplex] {
                    seen[g.simplex] = true;
                    count += 1;
                    queue.push_back(g.simplex);
                }
            }
        }
        count == self.size()
    }

    /// Breadth-first orientation: across a gluing `g` the neighbour gets
    /// `−sign(g)` times the current sign.
    pub fn orientation(&self) -> SimplexOrientation {
        let mut signs = vec![0i64; self.size()];
        let mut orientable = true;
        for start in 0..self.size() {
            if signs[start] != 0 {
                continue;
            }
            signs[start] = 1;
            let mut queue = VecDeque::from([start]);
            while let Some(s) = queue.pop_front() {
                for g in self.gluings[s].iter().flatten() {
                    let want = -g.perm.sign() * signs[s];
                    if signs[g.simplex] == 0 {
                        signs[g.simplex] = want;
                        queue.push_back(g.simplex);
                    } else if signs[g.simplex] != want {
                        orientable = false;
                    }
                }
            }
        }
        SimplexOrientation { signs, orientable }
    }

    pub fn is_orientable(&self) -> bool {
        self.orientation().orientable
    }

    /// Glue the simplices of a simplicial complex given by vertex labels.
    ///
    /// Facets shared by two simplices are glued; facets met once stay on the
    /// boundary. A facet shared by three or more simplices is rejected.
    pub fn from_facets(dim: usize, simplices: &[Vec<usize>]) -> Result<Self, HomologyError> {
        let mut tri = Self::new(dim, simplices.len())?;
        let sorted: Vec<Vec<usize>> = simplices
            .iter()
            .map(|s| {
                let mut s = s.clone();
                s.sort_unstable();
                s
            })
            .collect();
        let mut facets: hashbrown::HashMap<Vec<usize>, Vec<(usize, usize)>> =
            hashbrown::HashMap::new();
        let mut order: Vec<Vec<usize>> = Vec::new();
        for (s, verts) in sorted.iter().enumerate() {
            if verts.len() != dim + 1 {
                return Err(HomologyError::InvalidTriangulation(format!(
                    "simplex {s} has {} vertices, expected {}",
                    verts.len(),
                    dim + 1
                )));
            }
            for j in 0..=dim {
                let mut key = verts.clone();
                key.remove(j);
                let entry = facets.entry(key.clone()).or_default();
                if entry.is_empty() {
                    order.push(key);
                }
                entry.push((s, j));
            }
        }
        for key in order {
            let occ = &facets[&key];
            match occ.as_slice() {
                [_] => {}
                [(s, j), (t, k)] => {
                    let (fs, ft) = (&sorted[*s], &sorted[*t]);
                    let mut images = vec![0usize; dim + 1];
                    for (a, slot) in images.iter_mut().enumerate() {
                        *slot = if a == *j {
                            *k
                        } else {
                            ft.iter().position(|&v| v == fs[a]).ok_or_else(|| {
                                HomologyError::InvalidTriangulation("inconsistent facet".into())
                            })?
                        };
                    }
                    tri.join(*s, *j, *t, Perm::from_images(&images)?)?;
                }
                _ => {
                    return Err(HomologyError::InvalidTriangulation(format!(
                        "facet {key:?} shared by {} simplices",
                        occ.len()
                    )));
                }
            }
        }
        Ok(tri)
    }

    /// Lens space `L(p, q)` from the `p`-tetrahedron bipyramid.
    ///
    /// Tetrahedron `i` has vertices `[N, S, a_i, a_{i+1}]`. Neighbouring
    /// tetrahedra share the facets through the axis `NS`; the upper face
    /// `[N, a_i, a_{i+1}]` is glued to the lower face `[S, a_{i+q}, a_{i+q+1}]`.
    pub fn lens_space(p: usize, q: usize) -> Result<Self, HomologyError> {
        if p < 2 || q == 0 || q >= p || num_integer::gcd(p, q) != 1 {
            return Err(HomologyError::InvalidTriangulation(format!(
                "L({p}, {q}) needs p >= 2, 0 < q < p and gcd(p, q) = 1"
            )));
        }
        let mut tri = Self::new(3, p)?;
        let around = Perm::from_images(&[0, 1, 3, 2])?;
        let upper = Perm::from_images(&[1, 0, 2, 3])?;
        for i in 0..p {
            if tri.adjacent(i, 2).is_none() {
                tri.join(i, 2, (i + 1) % p, around)?;
            }
        }
        for i in 0..p {
            if tri.adjacent(i, 1).is_none() {
                tri.join(i, 1, (i + q) % p, upper)?;
            }
        }
        Ok(tri)
    }

    /// Orientable double cover. Sheet `k ∈ {0, 1}` of simplex `s` is simplex
    /// `s + k·size()`; orientation-preserving gluings stay on their sheet.
    pub fn orientable_double_cover(&self) -> Result<Self, HomologyError> {
        let n = self.size();
        let mut cover = Self::new(self.dim, 2 * n)?;
        for s in 0..n {
            for f in 0..=self.dim {
                let Some(g) = self.gluings[s][f] else {
                    continue;
                };
                for k in 0..2 {
                    let k2 = if g.perm.sign() == -1 { k } else { 1 - k };
                    let (a, b) = (s + k * n, g.simplex + k2 * n);
                    if cover.adjacent(a, f).is_none() {
                        cover.join(a, f, b, g.perm)?;
                    }
                }
            }
        }
        Ok(cover)
    }
}
