//! Presentations of π₁ and of the boundary components.

mod util;

use std::sync::Arc;

use cellular_homology::prelude::*;
use util::*;

fn abelianized(data: &CellularData, loc: PresentationLocator) -> (usize, Vec<i64>) {
    let ab = data.group_presentation(loc).unwrap().abelianization().unwrap();
    (ab.rank(), ab.torsion().to_vec())
}

#[test]
fn abelianization_matches_first_homology() {
    for (sig, dim) in [(S3, 3), (L41, 3), (L52, 3), (T3, 3), (S2_TWISTED_S1, 3), (FIGURE_EIGHT, 3), (CAPPELL_SHANESON, 4)] {
        let data = engine(sig, dim);
        assert_eq!(
            abelianized(&data, PresentationLocator::Whole),
            homology(&data, 1, CoordinateSystem::Std),
            "{sig}"
        );
    }
}

#[test]
fn generator_counts_follow_the_cover_complex() {
    // non-tree edges of the dual graph plus boundary edges
    for (sig, dim, gens) in [(S3, 3, 2), (L41, 3, 2), (T3, 3, 7), (S2_TWISTED_S1, 3, 3), (GIESEKING, 3, 8), (FIGURE_EIGHT, 3, 15), (KNOT_5_2, 3, 22), (KNOT_6_1, 3, 29), (CAPPELL_SHANESON, 4, 24)] {
        let data = engine(sig, dim);
        let g = data.group_presentation(PresentationLocator::Whole).unwrap();
        assert_eq!(g.generator_count(), gens, "{sig}");
    }
    assert_eq!(ball3().group_presentation(PresentationLocator::Whole).unwrap().generator_count(), 6);
    assert_eq!(ball4().group_presentation(PresentationLocator::Whole).unwrap().generator_count(), 16);
    assert_eq!(sphere4().group_presentation(PresentationLocator::Whole).unwrap().generator_count(), 10);
}

#[test]
fn boundary_components_are_counted() {
    for (data, n) in [
        (engine(S3, 3), 0),
        (engine(T3, 3), 0),
        (engine(FIGURE_EIGHT, 3), 1),
        (engine(GIESEKING, 3), 1),
        (engine(CAPPELL_SHANESON, 4), 1),
        (ball3(), 1),
        (ball4(), 1),
        (sphere4(), 0),
    ] {
        assert_eq!(data.boundary_component_count().unwrap(), n);
    }
}

#[test]
fn cusp_groups() {
    // torus cusp
    assert_eq!(abelianized(&engine(FIGURE_EIGHT, 3), PresentationLocator::IdealBoundary(0)), free(2));
    assert_eq!(abelianized(&engine(KNOT_5_2, 3), PresentationLocator::IdealBoundary(0)), free(2));
    // Klein bottle cusp
    assert_eq!(abelianized(&engine(GIESEKING, 3), PresentationLocator::IdealBoundary(0)), (1, vec![2]));
    // the Cappell–Shaneson cusp is S² × S¹
    assert_eq!(abelianized(&engine(CAPPELL_SHANESON, 4), PresentationLocator::IdealBoundary(0)), free(1));
}

#[test]
fn real_boundary_of_a_ball_is_simply_connected() {
    let b3 = ball3();
    assert_eq!(abelianized(&b3, PresentationLocator::StandardBoundary(0)), free(0));
    assert_eq!(abelianized(&b3, PresentationLocator::Whole), free(0));
    assert_eq!(abelianized(&ball4(), PresentationLocator::StandardBoundary(0)), free(0));
    assert!(b3.group_presentation(PresentationLocator::IdealBoundary(0)).is_err());
}

#[test]
fn missing_components_are_errors() {
    let data = engine(L52, 3);
    assert!(matches!(
        data.group_presentation(PresentationLocator::StandardBoundary(0)),
        Err(HomologyError::UnsupportedHom(_))
    ));
    let fig8 = engine(FIGURE_EIGHT, 3);
    assert!(fig8.group_presentation(PresentationLocator::IdealBoundary(1)).is_err());
    assert!(fig8.inclusion_hom(PresentationLocator::Whole).is_err());
}

#[test]
fn inclusion_renumbers_cusp_generators() {
    let data = engine(FIGURE_EIGHT, 3);
    let cusp = data.group_presentation(PresentationLocator::IdealBoundary(0)).unwrap();
    let whole = data.group_presentation(PresentationLocator::Whole).unwrap();
    let inc = data.inclusion_hom(PresentationLocator::IdealBoundary(0)).unwrap();
    assert!(Arc::ptr_eq(inc.domain(), &cusp));
    assert!(Arc::ptr_eq(inc.range(), &whole));

    let images: Vec<usize> = (0..cusp.generator_count())
        .map(|j| match inc.image(j).as_slice() {
            [(g, 1)] => *g,
            other => panic!("generator {j} maps to {other:?}"),
        })
        .collect();
    assert!(images.windows(2).all(|w| w[1] == w[0] + 1));

    // cusp relators are relators of the whole group
    for r in cusp.relators() {
        assert!(whole.relators().contains(&inc.evaluate(r)));
    }

    let m = inc.abelianization_matrix();
    assert_eq!((m.rows(), m.cols()), (whole.generator_count(), cusp.generator_count()));
}

#[test]
fn presentations_are_memoized() {
    let data = engine(KNOT_6_1, 3);
    let a = data.group_presentation(PresentationLocator::Whole).unwrap();
    let b = data.group_presentation(PresentationLocator::Whole).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    let i = data.inclusion_hom(PresentationLocator::IdealBoundary(0)).unwrap();
    let j = data.inclusion_hom(PresentationLocator::IdealBoundary(0)).unwrap();
    assert!(Arc::ptr_eq(&i, &j));
}
