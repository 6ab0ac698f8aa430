//! # BTP Verifier Benchmarks
//!
//! | Path | Cost driver |
//! |------|-------------|
//! | Quorum verification | One secp256k1 recovery per signature slot |
//! | Message proof | Leaf hashing plus O(log n) proof nodes |
//! | Relay message | Decode, quorum, extraction and one store write |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use bmv_btpblock::domain::quorum_size;
use bmv_btpblock::{build_message_proof, compute_messages_root, verify_quorum, LinkState};
use bmv_tests::fixtures::{
    messages, proof_element, update_element, Link, SourceChain, Validators,
};

fn bench_quorum_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("quorum");
    group.measurement_time(Duration::from_secs(10));

    for size in [4usize, 16, 64] {
        let mut chain = SourceChain::new(Validators::random(size));
        chain.genesis();
        let update = chain.sign_quorum(chain.next_header(&[]));
        let hash = chain.decision(&update.header).hash();
        let context = chain.validators().context();

        group.throughput(Throughput::Elements(quorum_size(size) as u64));
        group.bench_with_input(BenchmarkId::new("verify_quorum", size), &size, |b, _| {
            b.iter(|| black_box(verify_quorum(&hash, &update.proofs, &context).is_ok()))
        });
    }
    group.finish();
}

fn bench_message_proof(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_proof");

    for size in [16usize, 256, 4096] {
        let batch = messages("bench", size);
        let root = compute_messages_root(&batch);
        let proof = build_message_proof(&batch, size / 2, size / 2 + 1).unwrap();

        group.bench_with_input(BenchmarkId::new("build", size), &size, |b, &n| {
            b.iter(|| black_box(build_message_proof(&batch, n / 2, n / 2 + 1).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("prove", size), &size, |b, _| {
            b.iter(|| {
                let result = proof.prove().unwrap();
                black_box(Some(result.root) == root)
            })
        });
    }
    group.finish();
}

fn bench_relay_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay_message");
    group.sample_size(20);

    for count in [1usize, 64] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("update_and_proof", count), &count, |b, &n| {
            b.iter_batched(
                || {
                    let mut link = Link::new(16);
                    let batch = messages("relay", n);
                    let update = link.chain.produce(&batch);
                    let proof = build_message_proof(&batch, 0, n).unwrap();
                    (link, vec![update_element(update), proof_element(proof)])
                },
                |(mut link, elements)| black_box(link.submit(elements).unwrap()),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_link_state_decode(c: &mut Criterion) {
    use bmv_codec::Encodable;

    let link = Link::new(64);
    let encoded = link.state().to_rlp();
    c.bench_function("link_state_decode", |b| {
        b.iter(|| black_box(LinkState::from_stored(&encoded).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_quorum_verification,
    bench_message_proof,
    bench_relay_message,
    bench_link_state_decode,
);
criterion_main!(benches);
