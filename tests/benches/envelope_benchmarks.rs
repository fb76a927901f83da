//! # SecureFabric Envelope Benchmarks
//!
//! | Operation | Target |
//! |-----------|--------|
//! | Seal plaintext envelope (1 KiB) | < 100µs |
//! | Seal encrypted envelope (1 KiB) | < 150µs |
//! | Verify envelope | < 150µs |
//! | Replay window accept | < 100ns |

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use fabric_envelope::{
    ContentKey, EnvelopeBuilder, EnvelopeVerifier, ReplayFilter, SendOptions, SigningIdentity,
};
use std::num::NonZeroUsize;
use std::sync::Arc;

const PAYLOAD_SIZES: [usize; 3] = [64, 1024, 16 * 1024];

fn builder() -> EnvelopeBuilder {
    EnvelopeBuilder::new(Arc::new(SigningIdentity::generate()))
}

fn bench_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope-seal");
    let builder = builder();
    let options = SendOptions::new().content_type("application/octet-stream");
    let key = ContentKey::generate(1).expect("content key");

    for size in PAYLOAD_SIZES {
        let payload = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("plaintext", size), &payload, |b, payload| {
            b.iter(|| builder.seal(black_box("bench.topic"), payload, &options))
        });
        group.bench_with_input(BenchmarkId::new("encrypted", size), &payload, |b, payload| {
            b.iter(|| builder.seal_encrypted(black_box("bench.topic"), payload, &options, &key))
        });
    }
    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope-verify");
    let builder = builder();

    for size in PAYLOAD_SIZES {
        let payload = vec![0x5Au8; size];
        let envelope = builder
            .seal("bench.topic", &payload, &SendOptions::new())
            .expect("seal");
        group.throughput(Throughput::Bytes(size as u64));

        // fresh verifier per iteration so the envelope is never a replay
        group.bench_with_input(BenchmarkId::new("verify", size), &envelope, |b, envelope| {
            b.iter_batched(
                EnvelopeVerifier::default,
                |verifier| verifier.verify(black_box(envelope)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_replay_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay-window");

    for window in [64usize, 1024] {
        let size = NonZeroUsize::new(window).expect("non-zero window");

        group.bench_function(BenchmarkId::new("in-order", window), |b| {
            let mut filter = ReplayFilter::new(size);
            let mut counter = 0u64;
            b.iter(|| {
                counter += 1;
                black_box(filter.accept(counter))
            })
        });

        group.bench_function(BenchmarkId::new("reordered", window), |b| {
            let mut filter = ReplayFilter::new(size);
            let mut counter = 0u64;
            b.iter(|| {
                counter += 2;
                let _ = filter.accept(counter);
                black_box(filter.accept(counter - 1))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_seal, bench_verify, bench_replay_window);
criterion_main!(benches);
