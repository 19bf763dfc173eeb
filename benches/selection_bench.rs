use std::sync::Arc;

use credential_router::auth::{Auth, PickOptions, RoutingStrategy};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio_util::sync::CancellationToken;

fn pool(size: usize) -> Vec<Arc<Auth>> {
    (0..size)
        .map(|i| {
            let auth = Auth::new(format!("cred-{i:03}"), "gemini")
                .with_attribute("priority", if i % 4 == 0 { "10" } else { "0" })
                .with_attribute("weight", ((i % 5) + 1).to_string());
            Arc::new(auth)
        })
        .collect()
}

fn bench_strategies(c: &mut Criterion) {
    let cancel = CancellationToken::new();
    let options = PickOptions::default();
    let mut group = c.benchmark_group("pick");

    for size in [8usize, 128] {
        let auths = pool(size);
        for strategy in [
            RoutingStrategy::FillFirst,
            RoutingStrategy::RoundRobin,
            RoutingStrategy::Weighted,
        ] {
            let selector = strategy.selector();
            group.bench_with_input(BenchmarkId::new(strategy.as_str(), size), &auths, |b, auths| {
                b.iter(|| {
                    selector
                        .pick(&cancel, "gemini", black_box("gemini-2.5-pro"), &options, auths)
                        .map(|auth| auth.id.len())
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
