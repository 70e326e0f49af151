use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use cellular_homology::algebra::smith::smith_form;
use cellular_homology::prelude::*;

const FIGURE_EIGHT: &str = "cPcbbbiht";
const KNOT_6_1: &str = "eLPkbcddddcwjb";

fn bench_lens_space_homology(c: &mut Criterion) {
    let mut group = c.benchmark_group("lens_space_homology");

    for &p in &[5usize, 11, 23] {
        let tri = Triangulation::lens_space(p, 2).expect("valid lens space");

        group.bench_with_input(BenchmarkId::new("std_h1", p), &p, |b, _| {
            b.iter(|| {
                let data = CellularData::new(&tri).expect("engine");
                let h1 = data.unmarked_group(&GroupLocator::homology(1, CoordinateSystem::Std));
                black_box(h1)
            });
        });

        group.bench_with_input(BenchmarkId::new("mix_h1", p), &p, |b, _| {
            b.iter(|| {
                let data = CellularData::new(&tri).expect("engine");
                let h1 = data.unmarked_group(&GroupLocator::homology(1, CoordinateSystem::Mix));
                black_box(h1)
            });
        });

        group.bench_with_input(BenchmarkId::new("linking_form", p), &p, |b, _| {
            b.iter(|| {
                let data = CellularData::new(&tri).expect("engine");
                black_box(data.string_info(StringRequest::TorsionSigmaVector))
            });
        });
    }

    group.finish();
}

fn bench_knot_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("knot_groups");

    for (name, sig) in [("4_1", FIGURE_EIGHT), ("6_1", KNOT_6_1)] {
        let tri = Triangulation::from_isosig(sig, 3).expect("valid signature");

        group.bench_function(BenchmarkId::new("pi1", name), |b| {
            b.iter(|| {
                let data = CellularData::new(&tri).expect("engine");
                black_box(data.group_presentation(PresentationLocator::Whole))
            });
        });

        group.bench_function(BenchmarkId::new("alexander_ideal", name), |b| {
            b.iter(|| {
                let data = CellularData::new(&tri).expect("engine");
                black_box(data.alexander_ideal())
            });
        });
    }

    group.finish();
}

fn bench_registry_and_smith(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_and_smith");
    let tri = Triangulation::lens_space(23, 5).expect("valid lens space");

    group.bench_function("build_engine", |b| {
        b.iter(|| black_box(CellularData::new(&tri).expect("engine")));
    });

    let data = CellularData::new(&tri).expect("engine");
    for d in 1..=3usize {
        let boundary = data
            .integer_chain_complex(d, CoordinateSystem::Mix)
            .expect("boundary matrix");
        group.bench_with_input(BenchmarkId::new("smith_mix_boundary", d), &d, |b, _| {
            b.iter(|| black_box(smith_form(&boundary)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lens_space_homology,
    bench_knot_groups,
    bench_registry_and_smith
);
criterion_main!(benches);
