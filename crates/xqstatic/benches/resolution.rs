// resolution.rs - Benchmarks for static context resolution
//
// Run with: cargo bench --features test-support --bench resolution
// Compare baselines: cargo bench --features test-support --bench resolution -- --baseline before

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use xqstatic::cache::ResolutionCache;
use xqstatic::test_utils::fixture_query::{
    create_fixture_file, generate_query, generate_query_spec, FixtureConfig, PROBE,
};
use xqstatic::{DialectConfig, NodeId, StaticContext, SyntaxKind, SyntaxTree};

fn presets() -> [(&'static str, FixtureConfig); 3] {
    [
        ("small", FixtureConfig::small()),
        ("medium", FixtureConfig::medium()),
        ("large", FixtureConfig::large()),
    ]
}

fn probe(tree: &SyntaxTree) -> NodeId {
    tree.root()
        .descendants()
        .find(|n| n.kind() == SyntaxKind::EQName && n.text() == Some(PROBE))
        .map(|n| n.id())
        .unwrap()
}

// ---------------------------------------------------------------------------
// Benchmark: Loading trees
//
// Building from a node description, and parsing the JSON form the CLI reads.
// ---------------------------------------------------------------------------

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for (name, config) in presets() {
        let spec = generate_query_spec(&config);
        group.bench_with_input(BenchmarkId::new("from_spec", name), &spec, |b, spec| {
            b.iter(|| black_box(SyntaxTree::from_spec(black_box(spec)).unwrap()))
        });

        let (_dir, path) = create_fixture_file(&config);
        let json = std::fs::read_to_string(&path).unwrap();
        group.bench_with_input(BenchmarkId::new("from_json", name), &json, |b, json| {
            b.iter(|| black_box(SyntaxTree::from_json_str(black_box(json)).unwrap()))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: Each resolver at the innermost return
//
// The probe sits beneath every FLWOR level, so this is the deepest query
// position in the fixture.
// ---------------------------------------------------------------------------

fn bench_resolvers_at_probe(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolvers_at_probe");

    for (name, config) in presets() {
        let tree = generate_query(&config);
        let id = probe(&tree);
        let ctx = StaticContext::new(&tree, DialectConfig::marklogic(10));

        group.bench_with_input(BenchmarkId::new("namespaces", name), &id, |b, &id| {
            b.iter(|| black_box(ctx.namespaces(black_box(id))))
        });
        group.bench_with_input(BenchmarkId::new("default_function_namespace", name), &id, |b, &id| {
            b.iter(|| black_box(ctx.default_function_namespace(black_box(id))))
        });
        group.bench_with_input(BenchmarkId::new("variables", name), &id, |b, &id| {
            b.iter(|| black_box(ctx.in_scope_variables(black_box(id))))
        });
        group.bench_with_input(BenchmarkId::new("functions", name), &id, |b, &id| {
            b.iter(|| black_box(ctx.statically_known_functions(black_box(id))))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: Every node, cold cache vs. warm cache, serial vs. batch
// ---------------------------------------------------------------------------

fn bench_every_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("every_node_variables");
    group.sample_size(20);

    for (name, config) in presets() {
        let tree = generate_query(&config);
        let ids: Vec<NodeId> = tree.root().descendants().map(|n| n.id()).collect();

        group.bench_with_input(BenchmarkId::new("serial", name), &ids, |b, ids| {
            b.iter(|| {
                let ctx = StaticContext::new(&tree, DialectConfig::default());
                for &id in ids {
                    black_box(ctx.in_scope_variables(id));
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("batch", name), &ids, |b, ids| {
            b.iter(|| {
                let ctx = StaticContext::new(&tree, DialectConfig::default());
                black_box(ctx.in_scope_variables_batch(ids))
            })
        });

        let cache = ResolutionCache::with_capacity(ids.len());
        let warm = StaticContext::new(&tree, DialectConfig::default()).with_cache(&cache);
        warm.in_scope_variables_batch(&ids);
        group.bench_with_input(BenchmarkId::new("warm_cache", name), &ids, |b, ids| {
            b.iter(|| {
                for &id in ids {
                    black_box(warm.in_scope_variables(id));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_load, bench_resolvers_at_probe, bench_every_node);
criterion_main!(benches);
