use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ferrite::{
    move_gen::{attacks::AttackTables, magic::MagicSettings},
    notation::find_legal_move,
    perft::perft,
    position::Position,
};

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    moves: &'static [&'static str],
    expected_nodes: &'static [u64],
}

const CASES: &[BenchCase] = &[
    BenchCase { name: "initial", moves: &[], expected_nodes: &[20, 400, 8902, 197_281] },
    BenchCase { name: "after_e4", moves: &["e2e4"], expected_nodes: &[20, 600, 13_160] },
];

fn build_position(case: &BenchCase) -> Position {
    let mut position = Position::new();
    for text in case.moves {
        let mv = find_legal_move(&mut position, text).expect("benchmark moves should be legal");
        position.make(mv);
    }
    position
}

fn bench_perft(c: &mut Criterion) {
    ferrite::initialize().expect("attack tables should build");

    let mut group = c.benchmark_group("perft");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(4));
    group.sample_size(20);

    for case in CASES {
        let mut position = build_position(case);

        for (depth_idx, expected_nodes) in case.expected_nodes.iter().enumerate() {
            let depth = (depth_idx + 1) as u32;

            // Correctness guard before benchmarking.
            let warmup = perft(&mut position, depth).expect("perft should run");
            assert_eq!(warmup, *expected_nodes, "node mismatch in warmup for {} depth {}", case.name, depth);

            group.throughput(Throughput::Elements(*expected_nodes));
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{}_d{}", case.name, depth)),
                expected_nodes,
                |b, expected| {
                    b.iter(|| {
                        let nodes = perft(black_box(&mut position), black_box(depth)).expect("perft should run");
                        assert_eq!(nodes, *expected);
                        black_box(nodes)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_magic_search(c: &mut Criterion) {
    let settings = MagicSettings::default();
    c.bench_function("attack_tables_build", |b| {
        b.iter(|| AttackTables::new(black_box(&settings)).expect("magic search should succeed"))
    });
}

criterion_group!(benches, bench_perft, bench_magic_search);
criterion_main!(benches);
