use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use scopehub::{ActorId, ChangeEvent, Hub, ObserverResult, ScopeId, ScopeRegistry, SessionId};

fn hub_with_guarded_observers(n: usize) -> (Hub, Vec<scopehub::Subscription>) {
    let hub = Hub::ephemeral();
    let subs = (0..n)
        .map(|i| {
            hub.subscribe_guarded(
                ScopeId::new("bench"),
                ActorId::new(format!("component-{i}")),
                |_: &Hub, _: &ChangeEvent| -> ObserverResult { Ok(()) },
            )
            .unwrap()
        })
        .collect();
    (hub, subs)
}

fn bench_store(c: &mut Criterion) {
    c.bench_function("store/overwrite", |b| {
        b.iter_custom(|iters| {
            // Fresh hub per sample so history growth does not leak between samples.
            let hub = Hub::new(
                scopehub::HubOrigin::Ephemeral,
                &scopehub::HubConfig::default().with_history_limit(16),
            );
            let scope = ScopeId::new("bench");
            let me = ActorId::new("Razor");

            let start = Instant::now();
            for i in 0..iters {
                hub.store(&scope, "counter", i64::try_from(i).unwrap_or(i64::MAX), &me)
                    .unwrap();
            }
            start.elapsed()
        })
    });
}

fn bench_notify_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("notify_one");
    group.throughput(Throughput::Elements(1));

    for observers in [1_usize, 8, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(observers),
            &observers,
            |b, &observers| {
                b.iter_custom(|iters| {
                    let (hub, _subs) = hub_with_guarded_observers(observers);
                    let scope = ScopeId::new("bench");
                    let me = ActorId::new("Razor");

                    let start = Instant::now();
                    for _ in 0..iters {
                        hub.notify_one(&scope, "counter", 1, &me).unwrap();
                    }
                    start.elapsed()
                })
            },
        );
    }
    group.finish();
}

fn bench_session_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_or_create_session", |b| {
        let registry = Arc::new(ScopeRegistry::default());
        let sessions: Vec<SessionId> = (0..256).map(|i| SessionId::new(format!("s{i}"))).collect();
        for s in &sessions {
            registry.get_or_create(None, Some(s)).unwrap();
        }

        let mut i = 0_usize;
        b.iter(|| {
            i = (i + 1) % sessions.len();
            registry.get_or_create(None, Some(&sessions[i])).unwrap()
        });
    });

    group.finish();
}

criterion_group!(broadcast, bench_store, bench_notify_fan_out, bench_session_lookup);
criterion_main!(broadcast);
