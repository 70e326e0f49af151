//! Alexander ideals of manifolds with `b₁ = 1`.

mod util;

use cellular_homology::prelude::*;
use num_bigint::BigInt;
use util::*;

fn poly(terms: &[(i64, i64)]) -> LaurentPoly {
    LaurentPoly::from_terms(terms.iter().copied())
}

fn ideal(sig: &str, dim: usize) -> Vec<LaurentPoly> {
    engine(sig, dim).alexander_ideal().unwrap()
}

#[test]
fn knot_complements() {
    assert_eq!(ideal(FIGURE_EIGHT, 3), vec![poly(&[(0, -1), (1, 3), (2, -1)])]);
    assert_eq!(ideal(KNOT_5_2, 3), vec![poly(&[(0, 2), (1, -3), (2, 2)])]);
    assert_eq!(ideal(KNOT_6_1, 3), vec![poly(&[(0, -2), (1, 5), (2, -2)])]);
}

#[test]
fn knot_polynomials_are_symmetric_and_augmented() {
    for sig in [FIGURE_EIGHT, KNOT_5_2, KNOT_6_1] {
        let ideal = ideal(sig, 3);
        let [p] = ideal.as_slice() else {
            panic!("{sig}: ideal {ideal:?} is not principal");
        };
        assert!(p.is_symmetric_up_to_unit(), "{sig}");
        assert_eq!(p.eval_at_one(), BigInt::from(1), "{sig}");
    }
}

#[test]
fn gieseking_manifold() {
    // the mirror 1 + t − t² is the same ideal up to t ↦ t⁻¹
    assert_eq!(ideal(GIESEKING, 3), vec![poly(&[(0, -1), (1, 1), (2, 1)])]);
}

#[test]
fn cappell_shaneson_ideal() {
    assert_eq!(ideal(CAPPELL_SHANESON, 4), vec![poly(&[(0, -1), (2, 1), (3, 1)])]);
}

#[test]
fn reported_ideals_have_positive_leading_coefficients() {
    for (sig, dim) in [(GIESEKING, 3), (CAPPELL_SHANESON, 4), (KNOT_5_2, 3)] {
        for p in ideal(sig, dim) {
            assert!(p.leading_coefficient() > BigInt::from(0), "{sig}: {p}");
            assert_eq!(p.min_exponent(), Some(0));
        }
    }
}

#[test]
fn presentation_matrix_is_wide() {
    let data = engine(FIGURE_EIGHT, 3);
    let m = data.alexander_presentation_matrix().unwrap();
    assert!(m.rows() >= 1);
    assert!(m.cols() >= m.rows());
    // no unit entry survives simplification
    for r in 0..m.rows() {
        for c in 0..m.cols() {
            assert!(!m.get(r, c).is_unit());
        }
    }
}

#[test]
fn circle_times_sphere_has_trivial_ideal() {
    // π₁ = ℤ
    let data = engine(S2_TWISTED_S1, 3);
    assert_eq!(data.betti_number(1).unwrap(), 1);
    assert_eq!(data.alexander_ideal().unwrap(), vec![LaurentPoly::from_terms([(0, 1)])]);
}

#[test]
fn other_betti_numbers_are_rejected() {
    for (sig, betti) in [(L41, 0), (S3, 0), (T3, 3)] {
        let data = engine(sig, 3);
        assert_eq!(
            data.alexander_ideal().unwrap_err(),
            HomologyError::AlexanderPrecondition { betti }
        );
        // failures are memoized
        assert_eq!(
            data.alexander_presentation_matrix().unwrap_err(),
            HomologyError::AlexanderPrecondition { betti }
        );
    }
}
