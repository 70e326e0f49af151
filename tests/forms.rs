mod util;

use cellular_homology::prelude::*;
use proptest::prelude::*;
use util::*;

use CoordinateSystem::*;

fn h(d: usize, system: CoordinateSystem) -> GroupLocator {
    GroupLocator::homology(d, system)
}

#[test]
fn torus_intersection_pairs_h1_with_h2() {
    let data = engine(T3, 3);
    let form = data.form(&FormLocator::new(FormKind::Intersection, h(1, Dual), h(2, StdRelBdry))).unwrap();
    assert_eq!(form.range().rank(), 1);
    assert_eq!(form.rank().unwrap(), 3);
    assert!(form.is_nondegenerate().unwrap());
    // the same form in other coordinates
    let via_std = data.form(&FormLocator::new(FormKind::Intersection, h(1, Std), h(2, Std))).unwrap();
    assert_eq!(via_std.rank().unwrap(), 3);
}

#[test]
fn h2_self_intersection_in_the_torus_lands_in_h1() {
    let data = engine(T3, 3);
    let form = data.form(&FormLocator::new(FormKind::Intersection, h(2, Dual), h(2, StdRelBdry))).unwrap();
    assert_eq!(form.range().rank(), 3);
    // two coordinate tori meet in a coordinate circle
    assert_eq!(form.image().unwrap().rank(), 3);
}

#[test]
fn intersection_on_non_orientable_manifolds() {
    let data = engine(S2_TWISTED_S1, 3);
    let z = FormLocator::new(FormKind::Intersection, h(1, Dual), h(2, StdRelBdry));
    assert_eq!(data.form(&z).unwrap_err(), HomologyError::NonOrientableZForm);
    let two = FormLocator::new(
        FormKind::Intersection,
        h(1, Dual).with_modulus(2),
        h(2, StdRelBdry).with_modulus(2),
    );
    let form = data.form(&two).unwrap();
    assert_eq!(form.evaluate(&[1], &[1]).unwrap(), vec![1]);
}

#[test]
fn evaluation_is_perfect_on_free_classes() {
    let data = engine(T3, 3);
    let form = data
        .form(&FormLocator::new(FormKind::Evaluation, h(2, Mix), GroupLocator::cohomology(2, Mix)))
        .unwrap();
    assert!(form.is_nondegenerate().unwrap());
    let bad = FormLocator::new(FormKind::Evaluation, h(2, Mix), GroupLocator::cohomology(1, Mix));
    assert!(matches!(data.form(&bad), Err(HomologyError::UnsupportedForm(_))));
}

#[test]
fn four_manifold_signatures() {
    assert_eq!(sphere4().signature().unwrap(), 0);
    assert_eq!(ball4().signature().unwrap(), 0);
    assert_eq!(engine(L41, 3).signature().unwrap(), 0);
}

fn h2_intersection(data: &CellularData) -> std::sync::Arc<BilinearForm> {
    data.form(&FormLocator::new(FormKind::Intersection, h(2, Dual), h(2, Dual))).unwrap()
}

#[test]
fn projective_plane_has_a_definite_odd_form() {
    let data = cp2();
    assert_eq!(homology(&data, 2, Dual), free(1));
    let sig = data.signature().unwrap();
    assert_eq!(sig.abs(), 1);
    let form = h2_intersection(&data);
    assert!(form.is_symmetric());
    assert!(form.is_nondegenerate().unwrap());
    assert_eq!(form.gram_matrix().unwrap().get(0, 0), sig);
    assert_eq!(form.form_type().unwrap(), (true, sig as i8));
}

#[test]
fn sphere_product_has_a_hyperbolic_form() {
    let data = s2_times_s2();
    assert_eq!(homology(&data, 2, Dual), free(2));
    assert_eq!(data.euler_char().unwrap(), 4);
    assert_eq!(data.signature().unwrap(), 0);
    let form = h2_intersection(&data);
    assert!(form.is_nondegenerate().unwrap());
    assert_eq!(form.rank().unwrap(), 2);
    // even and indefinite
    assert_eq!(form.form_type().unwrap(), (false, 0));
    let gram = form.gram_matrix().unwrap();
    assert_eq!(gram.get(0, 0) * gram.get(1, 1) - gram.get(0, 1) * gram.get(1, 0), -1);
}

#[test]
fn cup_products_are_not_offered() {
    let data = engine(T3, 3);
    let loc = FormLocator::new(FormKind::CupProduct, GroupLocator::cohomology(1, Std), GroupLocator::cohomology(1, Std));
    assert!(matches!(data.form(&loc), Err(HomologyError::UnsupportedForm(_))));
}

#[test]
fn kawauchi_kojima_strings_for_lens_spaces() {
    let data = engine(L52, 3);
    let s = |r| data.string_info(r).unwrap().to_string();
    assert_eq!(s(StringRequest::TorsionRankVector), "5(1)");
    assert_eq!(s(StringRequest::TorsionLegendreSymbolVector), "5(-1)");
    assert_eq!(s(StringRequest::TorsionSigmaVector), "no 2-torsion");
    assert!(!data.bool_info(BoolRequest::TorsionFormIsHyperbolic).unwrap());
    assert!(data.bool_info(BoolRequest::TorsionFormIsSplit).unwrap());
    assert!(data.bool_info(BoolRequest::TorsionFormSatisfiesKkTwoTorCondition).unwrap());
    assert!(s(StringRequest::EmbeddabilityComment).contains("does not embed"));

    let data = engine(L41, 3);
    let s = |r| data.string_info(r).unwrap().to_string();
    assert_eq!(s(StringRequest::TorsionRankVector), "2(0 1)");
    assert_eq!(s(StringRequest::TorsionLegendreSymbolVector), "no odd p-torsion");
    assert!(["2(1 inf)", "2(7 inf)"].contains(&s(StringRequest::TorsionSigmaVector).as_str()));
    assert!(!data.bool_info(BoolRequest::TorsionFormSatisfiesKkTwoTorCondition).unwrap());
    // {0, 2} is isotropic
    assert!(data.bool_info(BoolRequest::TorsionFormIsHyperbolic).unwrap());
}

#[test]
fn torsion_free_and_non_orientable_cases() {
    let data = engine(S3, 3);
    assert_eq!(data.string_info(StringRequest::TorsionRankVector).unwrap().as_str(), "no torsion");
    assert!(data.bool_info(BoolRequest::TorsionFormIsHyperbolic).unwrap());

    let twisted = engine(S2_TWISTED_S1, 3);
    let rv = twisted.string_info(StringRequest::TorsionRankVector).unwrap();
    assert_eq!(rv.as_str(), "Orientable double cover: no torsion");

    let cusped = engine(FIGURE_EIGHT, 3);
    let comment = cusped.string_info(StringRequest::EmbeddabilityComment).unwrap();
    assert!(comment.starts_with("No torsion in H1"));

    let four = sphere4();
    assert!(matches!(
        four.string_info(StringRequest::TorsionRankVector),
        Err(HomologyError::UnsupportedForm(_))
    ));
}

#[test]
fn weber_seifert_is_not_hyperbolic() {
    let data = engine(WEBER_SEIFERT, 3);
    assert!(!data.bool_info(BoolRequest::TorsionFormIsHyperbolic).unwrap());
    assert_eq!(data.string_info(StringRequest::TorsionRankVector).unwrap().as_str(), "5(3)");
    assert!(data.bool_info(BoolRequest::TorsionFormSatisfiesKkTwoTorCondition).unwrap());
}

#[test]
fn linking_form_on_a_non_orientable_manifold_is_mod_two() {
    let data = engine(S2_TWISTED_S1, 3);
    let form = data.form(&FormLocator::new(FormKind::TorsionLinking, h(1, Dual), h(1, Dual))).unwrap();
    assert_eq!(form.range().torsion(), &[2]);
    // H₁ = ℤ has no torsion to pair
    assert_eq!(form.left().generator_count(), 0);
}

/// The torsion linking form on `H₁` in the coordinates `(left, right)`.
fn linking_in(data: &CellularData, left: CoordinateSystem, right: CoordinateSystem) -> std::sync::Arc<BilinearForm> {
    data.form(&FormLocator::new(FormKind::TorsionLinking, h(1, left), h(1, right))).unwrap()
}

fn torsion_map(data: &CellularData, from: CoordinateSystem, to: CoordinateSystem) -> HomMarkedAbelianGroup {
    data.hom(&HomLocator::new(h(1, from), h(1, to)))
        .unwrap()
        .torsion_restriction()
        .unwrap()
}

#[test]
fn linking_form_is_natural_under_change_of_coordinates() {
    for (p, q) in [(5, 2), (7, 3), (12, 5), (8, 3), (23, 7), (16, 7)] {
        let data = CellularData::new(&Triangulation::lens_space(p, q).unwrap()).unwrap();
        let dual = linking_in(&data, Dual, Dual);
        let to_dual = torsion_map(&data, Std, Dual);
        let e = to_dual.evaluate(&[1]).unwrap();
        let expected = dual.evaluate(&e, &e).unwrap();

        // the right-hand side goes through its own bounding chains here
        let std = linking_in(&data, Std, Std);
        assert_eq!(std.range().torsion(), &[p as i64][..]);
        assert_eq!(std.reduced_pairing(0, 0), &expected[..], "L({p}, {q})");
        let dual_std = linking_in(&data, Dual, Std);
        assert_eq!(dual_std.evaluate(&[1], &[1]).unwrap(), dual.evaluate(&[1], &e).unwrap());

        let mix = linking_in(&data, Mix, Dual);
        let from_mix = torsion_map(&data, Mix, Dual).evaluate(&[1]).unwrap();
        assert_eq!(mix.evaluate(&[1], &[1]).unwrap(), dual.evaluate(&from_mix, &[1]).unwrap());

        // relative classes pair with absolute ones
        let rel = linking_in(&data, StdRelBdry, Dual);
        let direct = linking_in(&data, Dual, StdRelBdry);
        assert_eq!(rel.reduced_pairing(0, 0), direct.reduced_pairing(0, 0));

        for form in [&dual, &std, &mix, &rel] {
            let v = form.reduced_pairing(0, 0)[0];
            assert!(in_square_class(v, q as i64, p as i64), "L({p}, {q}) gave {v}");
            assert!(form.is_nondegenerate().unwrap());
        }
    }
}

#[test]
fn oversized_two_torsion_keeps_the_other_invariants() {
    let options = EngineOptions {
        max_metabolizer_order: 4,
        ..EngineOptions::default()
    };
    let l24 = CellularData::with_options(&Triangulation::lens_space(24, 5).unwrap(), options.clone()).unwrap();
    let s = |r| l24.string_info(r).map(|t| t.to_string());
    assert_eq!(s(StringRequest::TorsionRankVector).unwrap(), "2(0 0 1) 3(1)");
    assert!(s(StringRequest::TorsionLegendreSymbolVector).unwrap().starts_with("3("));
    assert!(matches!(s(StringRequest::TorsionSigmaVector), Err(HomologyError::UnsupportedForm(_))));
    assert!(l24.bool_info(BoolRequest::TorsionFormSatisfiesKkTwoTorCondition).is_err());
    assert!(!l24.bool_info(BoolRequest::TorsionFormIsHyperbolic).unwrap());

    // {0, 3, 6} is a metabolizer of L(9, 2), whatever the bound
    let l92 = CellularData::with_options(&Triangulation::lens_space(9, 2).unwrap(), options).unwrap();
    assert!(l92.bool_info(BoolRequest::TorsionFormIsHyperbolic).unwrap());
    assert_eq!(l92.string_info(StringRequest::TorsionRankVector).unwrap().as_str(), "3(0 1)");
}

/// `v = ±q·u²` for some unit `u` mod `p`.
fn in_square_class(v: i64, q: i64, p: i64) -> bool {
    (1..p).filter(|&u| gcd(u, p) == 1).any(|u| {
        let s = (q * u * u).rem_euclid(p);
        v.rem_euclid(p) == s || v.rem_euclid(p) == (p - s) % p
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn lens_space_linking_form((p, q) in (2usize..=23).prop_flat_map(|p| (Just(p), 1..p))
        .prop_filter("coprime", |&(p, q)| gcd(p as i64, q as i64) == 1))
    {
        let data = CellularData::new(&Triangulation::lens_space(p, q).unwrap()).unwrap();
        let h1 = h(1, Dual);
        let form = data.form(&FormLocator::new(FormKind::TorsionLinking, h1, h1)).unwrap();
        prop_assert_eq!(form.range().torsion(), &[p as i64][..]);
        let v = form.evaluate(&[1], &[1]).unwrap()[0];
        prop_assert!(in_square_class(v, q as i64, p as i64), "L({}, {}) gave {}", p, q, v);
        prop_assert!(form.is_symmetric());
    }
}
