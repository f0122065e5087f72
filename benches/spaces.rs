//! Spaces benchmarks
use criterion::{
    criterion_group, criterion_main, measurement::Measurement, AxisScale, BenchmarkGroup,
    BenchmarkId, Criterion, PlotConfiguration, Throughput,
};
use gym_http::spaces::{BoxSpace, IndexSpace, JsonSpace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

fn sample<S: JsonSpace>(space: &S, count: u64) -> Vec<S::Element> {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    (&mut rng).sample_iter(space).take(count as usize).collect()
}

fn bench_space_to_json<S, M>(group: &mut BenchmarkGroup<M>, name: &str, space: S, sizes: &[u64])
where
    S: JsonSpace,
    M: Measurement,
{
    for &size in sizes {
        group.throughput(Throughput::Elements(size));
        let data = sample(&space, size);
        group.bench_with_input(BenchmarkId::new(name, size), &data, |b, data| {
            b.iter_with_large_drop(|| data.iter().map(|x| space.to_json(x)).collect::<Vec<_>>())
        });
    }
}

fn bench_space_contains_json<S, M>(
    group: &mut BenchmarkGroup<M>,
    name: &str,
    space: S,
    sizes: &[u64],
) where
    S: JsonSpace,
    M: Measurement,
{
    for &size in sizes {
        group.throughput(Throughput::Elements(size));
        let data: Vec<Value> = sample(&space, size)
            .iter()
            .map(|x| space.to_json(x))
            .collect();
        group.bench_with_input(BenchmarkId::new(name, size), &data, |b, data| {
            b.iter(|| data.iter().filter(|x| space.contains_json(x)).count())
        });
    }
}

fn bench_to_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_json");
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    group.plot_config(plot_config);

    let sizes = [1, 100, 10_000];
    bench_space_to_json(&mut group, "index_16", IndexSpace::new(16), &sizes);
    bench_space_to_json(&mut group, "box_4", BoxSpace::uniform(vec![4], -1.0, 1.0), &sizes);
    bench_space_to_json(
        &mut group,
        "box_8x8",
        BoxSpace::uniform(vec![8, 8], 0.0, 1.0),
        &sizes,
    );
}

fn bench_contains_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains_json");
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    group.plot_config(plot_config);

    let sizes = [1, 100, 10_000];
    bench_space_contains_json(&mut group, "index_16", IndexSpace::new(16), &sizes);
    bench_space_contains_json(
        &mut group,
        "box_4",
        BoxSpace::uniform(vec![4], -1.0, 1.0),
        &sizes,
    );
    bench_space_contains_json(
        &mut group,
        "box_8x8",
        BoxSpace::uniform(vec![8, 8], 0.0, 1.0),
        &sizes,
    );
}

criterion_group!(benches, bench_to_json, bench_contains_json);
criterion_main!(benches);
