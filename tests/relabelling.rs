//! Homology does not depend on how simplices and their vertices are labelled.

mod util;

use cellular_homology::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use util::*;

/// Renumber simplices by a random permutation and relabel the vertices of
/// every simplex.
fn relabel(t: &Triangulation, rng: &mut SmallRng) -> Triangulation {
    let (n, dim) = (t.size(), t.dim());
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    let perms: usize = (1..=dim + 1).product();
    let tau: Vec<Perm> = (0..n)
        .map(|_| Perm::from_lex_index(dim + 1, rng.gen_range(0..perms)).unwrap())
        .collect();

    let mut out = Triangulation::new(dim, n).unwrap();
    for s in 0..n {
        for f in 0..=dim {
            let Some(g) = t.adjacent(s, f) else {
                continue;
            };
            let facet = tau[s].apply(f);
            if out.adjacent(order[s], facet).is_some() {
                continue;
            }
            let perm = tau[g.simplex].compose(g.perm).compose(tau[s].inverse());
            out.join(order[s], facet, order[g.simplex], perm).unwrap();
        }
    }
    out
}

#[test]
fn random_relabellings_preserve_homology() {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    for (sig, dim) in [(L52, 3), (T3, 3), (GIESEKING, 3), (KNOT_5_2, 3), (CAPPELL_SHANESON, 4)] {
        let t = tri(sig, dim);
        let base = CellularData::new(&t).unwrap();
        for _ in 0..3 {
            let other = CellularData::new(&relabel(&t, &mut rng)).unwrap();
            assert_eq!(other.is_orientable(), base.is_orientable());
            for d in 0..=dim {
                for system in [CoordinateSystem::Std, CoordinateSystem::Dual] {
                    assert_eq!(homology(&other, d, system), homology(&base, d, system), "{sig} H{d} {system}");
                }
            }
        }
    }
}

#[test]
fn random_relabellings_preserve_linking_data() {
    let mut rng = SmallRng::seed_from_u64(7);
    let t = tri(L52, 3);
    let base = CellularData::new(&t).unwrap();
    for _ in 0..4 {
        let other = CellularData::new(&relabel(&t, &mut rng)).unwrap();
        for request in [StringRequest::TorsionRankVector, StringRequest::TorsionLegendreSymbolVector] {
            assert_eq!(other.string_info(request).unwrap(), base.string_info(request).unwrap());
        }
    }
}
