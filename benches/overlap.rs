//! Compares the quadratic and prefix-function overlap measurements.

use chunkbench::analysis::{longest_suffix_prefix_overlap, longest_suffix_prefix_overlap_linear};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Two adjacent chunks of roughly `words` words sharing a tail/head of
/// `shared` words.
fn chunk_pair(words: usize, shared: usize) -> (String, String) {
    let vocabulary = ["river", "silt", "delta", "channel", "flood", "bank", "sediment"];
    let text: Vec<&str> = vocabulary.iter().copied().cycle().take(words * 2).collect();
    let split = words.saturating_sub(shared);
    (text[..words].join(" "), text[split..split + words].join(" "))
}

fn benchmark_overlap(c: &mut Criterion) {
    let mut group = c.benchmark_group("suffix_prefix_overlap");

    for words in [32, 128, 512] {
        let pair = chunk_pair(words, words / 8);

        group.bench_with_input(BenchmarkId::new("quadratic", words), &pair, |b, (a, next)| {
            b.iter(|| longest_suffix_prefix_overlap(black_box(a), black_box(next)));
        });
        group.bench_with_input(BenchmarkId::new("linear", words), &pair, |b, (a, next)| {
            b.iter(|| longest_suffix_prefix_overlap_linear(black_box(a), black_box(next)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_overlap);
criterion_main!(benches);
