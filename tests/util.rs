#![allow(dead_code)]
use cellular_homology::prelude::*;

pub const S3: &str = "bkaagj";
pub const L41: &str = "bkaajj";
pub const L52: &str = "bkaajn";
pub const T3: &str = "gvzQQecdffefjssqasq";
pub const S2_TWISTED_S1: &str = "cPcbbbajs";
pub const GIESEKING: &str = "bkaaid";
pub const FIGURE_EIGHT: &str = "cPcbbbiht";
pub const KNOT_5_2: &str = "dLQbcccdero";
pub const KNOT_6_1: &str = "eLPkbcddddcwjb";
pub const CAPPELL_SHANESON: &str = "cMkabbb+aAa3blb";
pub const WEBER_SEIFERT: &str = "8vvvzzvvvPLvMPQvLLzzLLAAwMvPAPMQQQQQAAQQQghsxsytoqpAvHIvKMMQTBJIMYZKGNYVTL3V02SS1UZ1X3004Y443271575667aaaaaaabaaaaaabaaaaabaaaaaaaabbbbabbbbbbbbbbabbabaaababaaaabb";

pub fn tri(sig: &str, dim: usize) -> Triangulation {
    Triangulation::from_isosig(sig, dim).unwrap()
}

pub fn engine(sig: &str, dim: usize) -> CellularData {
    CellularData::new(&tri(sig, dim)).unwrap()
}

pub fn ball3() -> CellularData {
    CellularData::new(&Triangulation::from_facets(3, &[vec![0, 1, 2, 3]]).unwrap()).unwrap()
}

pub fn ball4() -> CellularData {
    let t = Triangulation::from_facets(4, &[vec![0, 1, 2, 3, 4], vec![1, 2, 3, 4, 5]]).unwrap();
    CellularData::new(&t).unwrap()
}

/// Boundary of the 5-simplex.
pub fn sphere4() -> CellularData {
    use itertools::Itertools;
    let facets: Vec<Vec<usize>> = (0..6).combinations(5).collect();
    CellularData::new(&Triangulation::from_facets(4, &facets).unwrap()).unwrap()
}

/// `(rank, torsion)` of `H_d` in `system`.
pub fn homology(data: &CellularData, d: usize, system: CoordinateSystem) -> (usize, Vec<i64>) {
    let g = data.unmarked_group(&GroupLocator::homology(d, system)).unwrap();
    (g.rank(), g.torsion().to_vec())
}

pub fn free(rank: usize) -> (usize, Vec<i64>) {
    (rank, Vec::new())
}

pub fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 { a.abs() } else { gcd(b, a % b) }
}

/// The 9-vertex complex projective plane.
pub fn cp2() -> CellularData {
    const FACETS: [[usize; 5]; 36] = [
        [0, 1, 2, 3, 4], [0, 1, 2, 3, 5], [0, 1, 2, 4, 5], [0, 1, 3, 4, 6], [0, 1, 3, 5, 7], [0, 1, 3, 6, 7],
        [0, 1, 4, 5, 6], [0, 1, 5, 6, 8], [0, 1, 5, 7, 8], [0, 1, 6, 7, 8], [0, 2, 3, 4, 8], [0, 2, 3, 5, 8],
        [0, 2, 4, 5, 6], [0, 2, 4, 6, 7], [0, 2, 4, 7, 8], [0, 2, 5, 6, 8], [0, 2, 6, 7, 8], [0, 3, 4, 6, 7],
        [0, 3, 4, 7, 8], [0, 3, 5, 7, 8], [1, 2, 3, 4, 8], [1, 2, 3, 5, 7], [1, 2, 3, 6, 7], [1, 2, 3, 6, 8],
        [1, 2, 4, 5, 7], [1, 2, 4, 7, 8], [1, 2, 6, 7, 8], [1, 3, 4, 6, 8], [1, 4, 5, 6, 8], [1, 4, 5, 7, 8],
        [2, 3, 5, 6, 7], [2, 3, 5, 6, 8], [2, 4, 5, 6, 7], [3, 4, 5, 6, 7], [3, 4, 5, 6, 8], [3, 4, 5, 7, 8],
    ];
    let facets: Vec<Vec<usize>> = FACETS.iter().map(|f| f.to_vec()).collect();
    CellularData::new(&Triangulation::from_facets(4, &facets).unwrap()).unwrap()
}

/// `S² × S²` as the staircase triangulation of two tetrahedron boundaries.
pub fn s2_times_s2() -> CellularData {
    use itertools::Itertools;
    let triangles: Vec<Vec<usize>> = (0..4).combinations(3).collect();
    let mut facets = Vec::new();
    for a in &triangles {
        for b in &triangles {
            // monotone lattice paths from (0, 0) to (2, 2)
            for ups in (0..4).combinations(2) {
                let (mut i, mut j) = (0, 0);
                let mut path = vec![4 * a[0] + b[0]];
                for step in 0..4 {
                    if ups.contains(&step) {
                        j += 1;
                    } else {
                        i += 1;
                    }
                    path.push(4 * a[i] + b[j]);
                }
                facets.push(path);
            }
        }
    }
    CellularData::new(&Triangulation::from_facets(4, &facets).unwrap()).unwrap()
}
