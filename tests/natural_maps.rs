mod util;

use cellular_homology::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use util::*;

use CoordinateSystem::*;

fn h(d: usize, system: CoordinateSystem) -> GroupLocator {
    GroupLocator::homology(d, system)
}

fn hom(data: &CellularData, from: GroupLocator, to: GroupLocator) -> std::sync::Arc<HomMarkedAbelianGroup> {
    data.hom(&HomLocator::new(from, to)).unwrap()
}

#[test]
fn subdivision_maps_are_isomorphisms() {
    let data = engine(FIGURE_EIGHT, 3);
    for d in 0..=3 {
        for (a, b) in [(Std, Mix), (Dual, Mix), (Std, Dual), (StdRelBdry, DualRelBdry)] {
            assert!(hom(&data, h(d, a), h(d, b)).is_iso().unwrap(), "{a} -> {b} at {d}");
        }
    }
    for d in 0..=2 {
        assert!(hom(&data, h(d, StdBdry), h(d, DualBdry)).is_iso().unwrap());
    }
}

#[test]
fn long_exact_sequence_of_the_pair() {
    let data = engine(FIGURE_EIGHT, 3);
    for (rel, bdry, abs) in [(StdRelBdry, StdBdry, Std), (MixRelBdry, MixBdry, Mix)] {
        let connecting = hom(&data, h(2, rel), h(1, bdry));
        let inclusion = hom(&data, h(1, bdry), h(1, abs));
        assert!(connecting.is_injective().unwrap());
        assert!(inclusion.is_surjective().unwrap());
        assert!(inclusion.compose(&connecting).unwrap().is_zero());
        // exact at H_1(∂M): the kernel of the inclusion is the image of ∂
        assert_eq!(inclusion.kernel().unwrap().rank(), connecting.image().unwrap().rank());
    }
}

/// `A --f--> B --g--> C` is exact at `B`: `g ∘ f = 0` and `B / im f`
/// surjects onto an isomorphic copy of `im g`.
fn exact_at(f: &HomMarkedAbelianGroup, g: &HomMarkedAbelianGroup) -> bool {
    g.compose(f).unwrap().is_zero() && f.cokernel().unwrap() == g.image().unwrap()
}

#[test]
fn long_exact_sequence_is_exact_at_every_position() {
    for (data, n) in [(engine(FIGURE_EIGHT, 3), 3), (ball3(), 3), (ball4(), 4)] {
        for m in [0u64, 2, 3] {
            let at = |d, system| h(d, system).with_modulus(m);
            let incl = |d| hom(&data, at(d, StdBdry), at(d, Std));
            let proj = |d| hom(&data, at(d, Std), at(d, StdRelBdry));
            let conn = |d: usize| hom(&data, at(d, StdRelBdry), at(d - 1, StdBdry));
            for d in 0..=n {
                if d < n {
                    assert!(exact_at(&conn(d + 1), &incl(d)), "H_{d}(bdry) with Z/{m}");
                    assert!(exact_at(&incl(d), &proj(d)), "H_{d}(M) with Z/{m}");
                } else {
                    assert!(proj(d).is_injective().unwrap(), "H_{d}(M) with Z/{m}");
                }
                if d > 0 {
                    assert!(exact_at(&proj(d), &conn(d)), "H_{d}(M, bdry) with Z/{m}");
                } else {
                    assert!(proj(d).is_surjective().unwrap(), "H_0(M, bdry) with Z/{m}");
                }
            }
        }
    }
}

#[test]
fn restriction_to_the_boundary() {
    let data = engine(FIGURE_EIGHT, 3);
    let r = hom(&data, GroupLocator::cohomology(1, Std), GroupLocator::cohomology(1, StdBdry));
    assert!(r.is_injective().unwrap());
    assert_eq!(r.cokernel().unwrap().rank(), 1);
    let delta = hom(
        &data,
        GroupLocator::cohomology(1, StdBdry),
        GroupLocator::cohomology(2, StdRelBdry),
    );
    assert!(delta.compose(&r).unwrap().is_zero());
}

#[test]
fn change_of_coefficients() {
    let data = engine(L41, 3);
    let to_two = hom(&data, h(1, Std), h(1, Std).with_modulus(2));
    assert!(to_two.is_surjective().unwrap());
    assert_eq!(to_two.kernel().unwrap().torsion(), &[2]);
    // coefficients and coordinates change in one request
    let mixed = hom(&data, h(1, Dual).with_modulus(4), h(1, Mix).with_modulus(2));
    assert!(mixed.is_surjective().unwrap());
    let bad = data.hom(&HomLocator::new(h(1, Std).with_modulus(2), h(1, Std).with_modulus(3)));
    assert!(matches!(bad, Err(HomologyError::UnsupportedHom(_))));
}

#[test]
fn unsupported_directions_fail() {
    let data = engine(FIGURE_EIGHT, 3);
    for (a, b) in [(h(1, Std), h(1, StdBdry)), (h(1, StdRelBdry), h(1, Std)), (h(1, Std), h(2, Std))] {
        let err = data.hom(&HomLocator::new(a, b)).unwrap_err();
        assert!(matches!(err, HomologyError::UnsupportedHom(_)), "{a} -> {b}: {err}");
    }
}

#[test]
fn chain_maps_have_the_chart_shapes() {
    let data = engine(L52, 3);
    for d in 0..=3 {
        let m = data.chain_map(&HomLocator::new(h(d, Std), h(d, Mix))).unwrap();
        assert_eq!(m.rows(), data.cell_count(d, Mix).unwrap());
        assert_eq!(m.cols(), data.cell_count(d, Std).unwrap());
    }
}

#[test]
fn identity_and_inverse_routes() {
    let data = engine(T3, 3);
    let id = hom(&data, h(2, Dual), h(2, Dual));
    assert!(id.is_iso().unwrap());
    let there = hom(&data, h(2, Mix), h(2, Std));
    let back = hom(&data, h(2, Std), h(2, Mix));
    let round = back.compose(&there).unwrap();
    for i in 0..3 {
        let mut e = vec![0; 3];
        e[i] = 1;
        assert_eq!(round.evaluate(&e).unwrap(), e);
    }
}

#[test]
fn subdivision_commutes_with_the_boundary_on_random_chains() {
    let mut rng = SmallRng::seed_from_u64(42);
    for (sig, systems) in [(L52, vec![Std, Dual]), (FIGURE_EIGHT, vec![Std])] {
        let data = engine(sig, 3);
        for &system in &systems {
            for d in 1..=3 {
                let upper = data.chain_map(&HomLocator::new(h(d, system), h(d, Mix))).unwrap();
                let lower = data.chain_map(&HomLocator::new(h(d - 1, system), h(d - 1, Mix))).unwrap();
                let mix_boundary = data.integer_chain_complex(d, Mix).unwrap();
                let boundary = data.integer_chain_complex(d, system).unwrap();
                for _ in 0..8 {
                    let chain: Vec<i64> = (0..upper.cols()).map(|_| rng.gen_range(-3..=3)).collect();
                    let lhs = mix_boundary.mul_vec(&upper.mul_vec(&chain).unwrap()).unwrap();
                    let rhs = lower.mul_vec(&boundary.mul_vec(&chain).unwrap()).unwrap();
                    assert_eq!(lhs, rhs, "{sig} {system} at {d}");
                }
            }
        }
    }
}
