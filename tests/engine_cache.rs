//! Memoization and sharing of engine results.

mod util;

use std::sync::Arc;
use std::thread;

use cellular_homology::cellular::cache::InvalidateCache;
use cellular_homology::prelude::*;
use util::*;

use CoordinateSystem::*;

#[test]
fn repeated_queries_share_one_answer() {
    let data = engine(L52, 3);
    let loc = GroupLocator::homology(1, Dual);
    let a = data.marked_group(&loc).unwrap();
    let b = data.marked_group(&loc).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let hloc = HomLocator::new(GroupLocator::homology(1, Std), GroupLocator::homology(1, Mix));
    assert!(Arc::ptr_eq(&data.hom(&hloc).unwrap(), &data.hom(&hloc).unwrap()));

    let s = data.string_info(StringRequest::TorsionRankVector).unwrap();
    let t = data.string_info(StringRequest::TorsionRankVector).unwrap();
    assert!(Arc::ptr_eq(&s, &t));
}

#[test]
fn failures_are_remembered() {
    let data = engine(FIGURE_EIGHT, 3);
    let loc = HomLocator::new(GroupLocator::homology(1, StdRelBdry), GroupLocator::homology(1, Std));
    let first = data.hom(&loc).unwrap_err();
    let second = data.hom(&loc).unwrap_err();
    assert_eq!(first, second);
    assert!(matches!(first, HomologyError::UnsupportedHom(_)));
}

#[test]
fn invalidation_recomputes_equal_answers() {
    let mut data = engine(T3, 3);
    let loc = GroupLocator::homology(2, Mix);
    let before = data.marked_group(&loc).unwrap();
    data.invalidate_cache();
    let after = data.marked_group(&loc).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(
        (before.group().rank(), before.group().torsion()),
        (after.group().rank(), after.group().torsion())
    );
}

#[test]
fn double_cover_is_built_once() {
    let data = engine(GIESEKING, 3);
    assert!(!data.is_orientable());
    let cover = data.double_cover().unwrap();
    assert!(cover.is_orientable());
    assert_eq!(cover.triangulation().size(), 2 * data.triangulation().size());
    assert!(Arc::ptr_eq(&cover, &data.double_cover().unwrap()));
}

#[test]
fn engines_are_shared_across_threads() {
    let data = engine(KNOT_5_2, 3);
    let expected: Vec<(usize, Vec<i64>)> = (0..=3).map(|d| homology(&engine(KNOT_5_2, 3), d, Dual)).collect();
    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| (0..=3).map(|d| homology(&data, d, Dual)).collect::<Vec<_>>()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
    assert!(data.alexander_ideal().is_ok());
}

#[test]
fn eager_invariant_checks_pass_on_valid_input() {
    let options = EngineOptions {
        check_invariants: true,
        ..EngineOptions::default()
    };
    for (sig, dim) in [(S3, 3), (FIGURE_EIGHT, 3), (CAPPELL_SHANESON, 4)] {
        let data = CellularData::with_options(&tri(sig, dim), options.clone()).unwrap();
        assert!(data.validate_invariants().is_ok());
    }
}
