//! Benchmarks for the in-memory store backend.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lodge_infra::store::{InMemoryStore, Store};
use lodge_listings::{Amenity, AmenityDraft};

fn seeded_store(n: usize) -> (InMemoryStore<Amenity>, Vec<Amenity>) {
    let store = InMemoryStore::new();
    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        let amenity = Amenity::build(AmenityDraft {
            name: format!("amenity-{i}"),
        });
        store.add(amenity.clone()).unwrap();
        records.push(amenity);
    }
    (store, records)
}

fn bench_add(c: &mut Criterion) {
    c.bench_function("store_add_1k", |b| {
        b.iter(|| {
            let store = InMemoryStore::new();
            for i in 0..1_000 {
                let amenity = Amenity::build(AmenityDraft {
                    name: format!("amenity-{i}"),
                });
                store.add(black_box(amenity)).unwrap();
            }
        })
    });
}

fn bench_get(c: &mut Criterion) {
    let (store, records) = seeded_store(1_000);
    let mid = records[records.len() / 2].id;
    c.bench_function("store_get", |b| {
        b.iter(|| store.get(black_box(&mid)).unwrap())
    });
}

fn bench_find_one(c: &mut Criterion) {
    let (store, _) = seeded_store(1_000);
    c.bench_function("store_find_one_last", |b| {
        b.iter(|| {
            store
                .find_one(&|a: &Amenity| a.name == "amenity-999")
                .unwrap()
        })
    });
}

fn bench_update(c: &mut Criterion) {
    let (store, records) = seeded_store(1_000);
    let mid = records[records.len() / 2].id;
    c.bench_function("store_update", |b| {
        b.iter(|| {
            store
                .update(black_box(&mid), &mut |a| {
                    a.name.push('x');
                    Ok(())
                })
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_add, bench_get, bench_find_one, bench_update);
criterion_main!(benches);
