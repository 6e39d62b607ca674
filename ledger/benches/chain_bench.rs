use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ballot_ledger::{link_record, recompute_hash, verify_records, CastRequest};
use ballot_types::{Identity, OptionId, Timestamp, TopicId, VoteRecord};

fn build_chain(len: usize) -> Vec<VoteRecord> {
    let mut records: Vec<VoteRecord> = Vec::with_capacity(len);
    for i in 0..len {
        let request = CastRequest {
            topic_id: TopicId::new(1),
            identity: Identity::parse(&format!("erf{i}")).unwrap(),
            option_id: OptionId::new(1),
        };
        let record = link_record(records.last(), &request, 1, Timestamp::new(i as u64));
        records.push(record);
    }
    records
}

fn vote_hash_bench(c: &mut Criterion) {
    let records = build_chain(1);
    c.bench_function("vote_digest", |b| {
        b.iter(|| recompute_hash(black_box(&records[0])))
    });
}

fn verify_1k_bench(c: &mut Criterion) {
    let records = build_chain(1_000);
    c.bench_function("verify_chain_1k", |b| {
        b.iter(|| verify_records(black_box(&records)))
    });
}

criterion_group!(benches, vote_hash_bench, verify_1k_bench);
criterion_main!(benches);
