use core::hint::black_box;
use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use std::sync::Arc;
use tokio::runtime::Builder;
use wordid::{
    AliasService, Capacity, Config, DEFAULT_ROUND_KEYS, Dictionary, FeistelCipher, MemoryStore,
    SeededRandom, WordEncoder,
};

// Number of values processed per benchmark iteration.
const TOTAL_IDS: u64 = 4096;

fn bench_cipher(c: &mut Criterion) {
    let mut group = c.benchmark_group("cipher");
    group.throughput(Throughput::Elements(TOTAL_IDS));

    let cipher = FeistelCipher::new(36, DEFAULT_ROUND_KEYS.to_vec()).unwrap();
    group.bench_function(format!("encrypt/elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for x in 0..TOTAL_IDS {
                black_box(cipher.encrypt(black_box(x)).unwrap());
            }
        });
    });
    group.bench_function(format!("decrypt/elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for x in 0..TOTAL_IDS {
                black_box(cipher.decrypt(black_box(x)).unwrap());
            }
        });
    });
    group.finish();
}

fn bench_words(c: &mut Criterion) {
    let mut group = c.benchmark_group("words");
    group.throughput(Throughput::Elements(TOTAL_IDS));

    let encoder = WordEncoder::new(36, Dictionary::builtin()).unwrap();
    let encoded: Vec<Vec<&str>> = (0..TOTAL_IDS)
        .map(|x| encoder.encode(x * 16_769_023).unwrap())
        .collect();

    group.bench_function(format!("encode/elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for x in 0..TOTAL_IDS {
                black_box(encoder.encode(black_box(x * 16_769_023)).unwrap());
            }
        });
    });
    group.bench_function(format!("decode/elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for words in &encoded {
                black_box(encoder.decode(black_box(words)).unwrap());
            }
        });
    });
    group.finish();
}

/// Benchmarks the full create path against the in-memory store.
fn bench_create_alias(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_alias");
    group.throughput(Throughput::Elements(TOTAL_IDS));
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();

    group.bench_function(format!("memory/elems/{TOTAL_IDS}"), |b| {
        b.to_async(&rt).iter_batched(
            || {
                let service = AliasService::with_rand(
                    Arc::new(MemoryStore::new()),
                    Config::with_capacity(Capacity::DEFAULT),
                    SeededRandom::new(0),
                )
                .unwrap();
                Arc::new(service)
            },
            |service| async move {
                service.initialize().await.unwrap();
                for _ in 0..TOTAL_IDS {
                    black_box(service.create_alias("bench").await.unwrap());
                }
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_cipher, bench_words, bench_create_alias);
criterion_main!(benches);
