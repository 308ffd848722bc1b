use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use xreduce::config::EngineConfigBuilder;
use xreduce::engine::{EdgeToNeighbor, Engine};
use xreduce::oracle::{InMemoryDistanceOracle, InMemoryGraphOracle};

/// A star graph of `n` leaves around a center, used to exercise the
/// rule-out engine's hot path (vertical fill + Stage 1 + Stage 2) at
/// growing widths.
fn build_star(n: usize) -> InMemoryGraphOracle {
    let mut g = InMemoryGraphOracle::new(n + 1);
    for leaf in 1..=n {
        g.add_edge(0, leaf, 1.0);
    }
    g
}

fn bench_rule_out_peripheral(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_out_peripheral");
    for &n in &[4usize, 8, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let graph = build_star(n);
            let distances = InMemoryDistanceOracle::new(&graph);
            let config = EngineConfigBuilder::default()
                .max_n_leaves(n + 1)
                .build()
                .unwrap();

            b.iter(|| {
                let mut engine = Engine::new(config.clone(), &graph, &distances);
                engine.add_root_level(0);
                engine.level_init();
                for leaf in 1..=n {
                    engine.vertical_add_leaf_initial(EdgeToNeighbor {
                        parent: 0,
                        child: leaf,
                        edge_id: leaf - 1,
                        edge_cost: 1.0,
                    });
                }
                engine.vertical_close();
                engine.horizontal_add();
                engine.level_close(0);
                engine.rule_out_peripheral()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rule_out_peripheral);
criterion_main!(benches);
