//! Resolution benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crucible_di::{Container, Lifestyle, Resolve};
use std::sync::Arc;

trait Service: Send + Sync {
    fn value(&self) -> u64;
}

struct Impl;
impl Service for Impl {
    fn value(&self) -> u64 {
        42
    }
}

struct Consumer {
    service: Arc<dyn Service>,
}

fn build_container() -> Container {
    let container = Container::new();
    container
        .register_factory(Lifestyle::Singleton, |_| 1u64)
        .unwrap();
    container
        .register_factory(Lifestyle::Transient, |_| 2u32)
        .unwrap();
    container
        .register_factory(Lifestyle::Scoped, |_| 3u16)
        .unwrap();
    container
        .register_trait_factory::<dyn Service, _>(Lifestyle::Singleton, |_| Arc::new(Impl))
        .unwrap();
    container
        .register_try_factory(Lifestyle::Transient, |ctx| {
            Ok(Consumer {
                service: ctx.resolve_trait::<dyn Service>()?,
            })
        })
        .unwrap();
    container
        .register_keyed_factory("alt", Lifestyle::Singleton, |_| 9u64)
        .unwrap();
    container
        .register_collection::<u8>((0u8..8).map(Arc::new).collect())
        .unwrap();
    container.lock();
    container
}

fn bench_resolution(c: &mut Criterion) {
    let container = build_container();
    // Warm every compiled factory and singleton cell.
    container.resolve::<u64>().unwrap();
    container.resolve::<u32>().unwrap();
    container.resolve::<Consumer>().unwrap();
    container.resolve_all::<u8>().unwrap();

    c.bench_function("resolve_singleton", |b| {
        b.iter(|| black_box(container.resolve::<u64>().unwrap()))
    });
    c.bench_function("resolve_transient", |b| {
        b.iter(|| black_box(container.resolve::<u32>().unwrap()))
    });
    c.bench_function("resolve_trait", |b| {
        b.iter(|| black_box(container.resolve_trait::<dyn Service>().unwrap()))
    });
    c.bench_function("resolve_with_dependency", |b| {
        b.iter(|| black_box(container.resolve::<Consumer>().unwrap()))
    });
    c.bench_function("resolve_keyed", |b| {
        b.iter(|| black_box(container.resolve_keyed::<u64>("alt").unwrap()))
    });
    c.bench_function("resolve_collection", |b| {
        b.iter(|| black_box(container.resolve_all::<u8>().unwrap()))
    });
}

fn bench_scopes(c: &mut Criterion) {
    let container = build_container();

    c.bench_function("scope_create_resolve_dispose", |b| {
        b.iter(|| {
            let scope = container.create_scope();
            black_box(scope.resolve::<u16>().unwrap());
            scope.dispose();
        })
    });
}

criterion_group!(benches, bench_resolution, bench_scopes);
criterion_main!(benches);
