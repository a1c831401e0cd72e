//! Benchmarks for graph traversal performance
//!
//! Measures cycle detection, reachability gathering and ignore matching on
//! synthetic import graphs of a few thousand files.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use depscope::graph::{detect_cycles, DependencyGraph, ReachabilityGatherer};
use depscope::ignore::{IgnoreEngine, RuleSource};
use std::path::PathBuf;

const ROOT: &str = "/bench";

fn file(i: usize) -> PathBuf {
    PathBuf::from(format!("{}/src/mod{}/file{}.ts", ROOT, i % 20, i))
}

/// Create a graph where each file imports `fan_out` later files, plus a
/// back edge every `cycle_every` files.
fn create_graph(total_files: usize, fan_out: usize, cycle_every: usize) -> DependencyGraph {
    let mut graph = DependencyGraph::with_capacity(total_files, total_files * fan_out);

    for i in 0..total_files {
        graph.add_file(file(i));
        for k in 1..=fan_out {
            let target = i * fan_out + k;
            if target < total_files {
                graph.add_dependency(file(i), file(target));
            }
        }
        if cycle_every > 0 && i > 0 && i % cycle_every == 0 {
            graph.add_dependency(file(i), file(i / 2));
        }
    }

    graph
}

/// Benchmark cycle detection over the whole graph
fn bench_detect_cycles(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_cycles");

    for size in [500, 1000, 2000, 5000].iter() {
        let graph = create_graph(*size, 3, 50);

        group.bench_with_input(BenchmarkId::new("files", size), &graph, |b, graph| {
            b.iter(|| black_box(detect_cycles(graph)));
        });
    }

    group.finish();
}

/// Benchmark unbounded and depth-bounded gathering from one entry
fn bench_gather(c: &mut Criterion) {
    let mut group = c.benchmark_group("gather");
    let ignore = IgnoreEngine::new(ROOT);
    let entries = [file(0)];

    for size in [1000, 2000, 5000].iter() {
        let graph = create_graph(*size, 3, 0);
        let gatherer = ReachabilityGatherer::new(&ignore);

        group.bench_with_input(BenchmarkId::new("unbounded", size), &graph, |b, graph| {
            b.iter(|| black_box(gatherer.gather(graph, &entries, None)));
        });

        group.bench_with_input(BenchmarkId::new("depth_3", size), &graph, |b, graph| {
            b.iter(|| black_box(gatherer.gather(graph, &entries, Some(3))));
        });
    }

    group.finish();
}

/// Benchmark gathering with a realistic ignore list in the way
fn bench_gather_with_ignores(c: &mut Criterion) {
    let mut group = c.benchmark_group("gather_ignored");
    let mut ignore = IgnoreEngine::new(ROOT);
    let patterns = ["!src/mod1/keep*.ts", "*.test.ts", "dist/", "src/mod3/", "fixtures", "**/*.d.ts"];
    if ignore.add_patterns(patterns, RuleSource::AdHoc).is_err() {
        return;
    }
    let entries = [file(0)];

    for size in [1000, 5000].iter() {
        let graph = create_graph(*size, 3, 0);
        let gatherer = ReachabilityGatherer::new(&ignore);

        group.bench_with_input(BenchmarkId::new("files", size), &graph, |b, graph| {
            b.iter(|| black_box(gatherer.gather(graph, &entries, None)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_detect_cycles,
    bench_gather,
    bench_gather_with_ignores
);
criterion_main!(benches);
