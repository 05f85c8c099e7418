//! Performance benchmarks for evonet

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use evonet::{Config, Hooks, IdRegistry, Network, Population, SeededEntropy};

/// Dynamic network grown by a few rounds of mutation
fn grown_network(config: &Config, rounds: usize, ids: &mut IdRegistry) -> Network {
    let mut rng = SeededEntropy::new(42);
    let mut network = Network::new(config, ids).unwrap();
    for _ in 0..rounds {
        network.evolve(config, &mut rng, ids).unwrap();
    }
    network
}

fn wide_config() -> Config {
    let mut config = Config::default();
    config.network.inputs = 16;
    config.network.outputs = 4;
    config.synapse.mutate.add = evonet::config::Chance::new(0.5).unwrap();
    config
}

fn benchmark_forward(c: &mut Criterion) {
    let config = wide_config();
    let mut ids = IdRegistry::new();
    let mut network = grown_network(&config, 50, &mut ids);
    let mut inputs = vec![0.5; 16];

    c.bench_function("input_one_changed", |b| {
        let mut toggle = 0.0;
        b.iter(|| {
            toggle = 1.0 - toggle;
            inputs[3] = toggle;
            network.input(black_box(&inputs)).unwrap()
        });
    });

    c.bench_function("input_unchanged", |b| {
        b.iter(|| network.input(black_box(&inputs)).unwrap());
    });

    c.bench_function("evaluate_full", |b| {
        b.iter(|| network.evaluate(black_box(&inputs)).unwrap());
    });
}

fn benchmark_mutation(c: &mut Criterion) {
    let config = wide_config();

    c.bench_function("network_evolve", |b| {
        let mut ids = IdRegistry::new();
        let mut rng = SeededEntropy::new(7);
        let mut network = Network::new(&config, &mut ids).unwrap();
        b.iter(|| network.evolve(&config, &mut rng, &mut ids).unwrap());
    });

    c.bench_function("update_map_rebuild", |b| {
        let mut ids = IdRegistry::new();
        let mut network = grown_network(&config, 50, &mut ids);
        b.iter(|| network.calculate_update_map());
    });
}

fn benchmark_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");

    for size in [20, 100, 250].iter() {
        let mut config = Config::default();
        config.population.size = *size;
        let hooks = Hooks::reward_only(|_, output| output[0]);
        let mut population = Population::with_seed(config, hooks, 42).unwrap();
        population.start(false).unwrap();

        group.bench_with_input(BenchmarkId::new("size", size), size, |b, _| {
            b.iter(|| {
                population.input(|i| vec![(i % 2) as f64, 1.0]).unwrap();
                population.evolve(false).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_forward,
    benchmark_mutation,
    benchmark_generation,
);

criterion_main!(benches);
