use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use facesearch::FaceDescriptor;
use facesearch::encoding::{
    DESCRIPTOR_DIM, HALF_DIM, euclidean_distance, format_encoding, parse_encoding, split_distance,
    split_encoding,
};
use rand::prelude::*;

fn random_descriptor(rng: &mut impl Rng) -> FaceDescriptor {
    let values = (0..DESCRIPTOR_DIM).map(|_| rng.random_range(-0.3..0.3)).collect::<Vec<_>>();
    FaceDescriptor::try_from(values).unwrap()
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("Encoding");
    let mut rng = rand::rng();
    let descriptor = random_descriptor(&mut rng);
    let literal = format_encoding(descriptor.as_slice(), 0, DESCRIPTOR_DIM, false);

    group.throughput(Throughput::Elements(DESCRIPTOR_DIM as u64));
    group.bench_function("format_encoding", |b| {
        b.iter(|| format_encoding(black_box(descriptor.as_slice()), 0, HALF_DIM, true));
    });
    group.bench_function("split_encoding", |b| {
        b.iter(|| split_encoding(black_box(&descriptor), true));
    });
    group.bench_function("parse_encoding", |b| {
        b.iter(|| parse_encoding(black_box(&literal)).unwrap());
    });
    group.finish();
}

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Distance");
    let mut rng = rand::rng();
    let stored = (0..10000).map(|_| random_descriptor(&mut rng)).collect::<Vec<_>>();
    let query = random_descriptor(&mut rng);

    group.throughput(Throughput::Elements(stored.len() as u64));
    group.bench_function("euclidean", |b| {
        b.iter(|| {
            stored
                .iter()
                .map(|v| euclidean_distance(query.as_slice(), v.as_slice()))
                .fold(f64::INFINITY, f64::min)
        });
    });
    group.bench_function("split", |b| {
        b.iter(|| {
            stored
                .iter()
                .map(|v| split_distance(query.as_slice(), v.as_slice(), black_box(HALF_DIM)))
                .fold(f64::INFINITY, f64::min)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_format, bench_distance);
criterion_main!(benches);
