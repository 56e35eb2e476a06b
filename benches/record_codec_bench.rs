//! Benchmarks for the JSON record codec.
//!
//! Device loops decode every inbound record inline, so decoding cost bounds
//! how many records a loop iteration can drain.

use criterion::{Criterion, criterion_group, criterion_main};
use latchkey_core::DeviceIdentity;
use latchkey_protocol::{
    Delivery, KeySubmission, OutboundRecord, RecordCodec, TopicConfig, encode_input,
};
use std::hint::black_box;

fn bench_decode(c: &mut Criterion) {
    let codec = RecordCodec::new(TopicConfig::default());
    let state = Delivery::new(
        "keypad/state",
        r#"{"deviceId": "304242375241C9033432", "state": "AwaitingPassword", "time": 3000}"#,
    );
    let door = Delivery::new(
        "doorlock/action",
        "{\n  \"deviceId\": \"304242375241C9033432\",\n  \"action\": \"close\"\n}",
    );

    let mut group = c.benchmark_group("decode");
    group.bench_function("keypad_state", |b| {
        b.iter(|| codec.decode(black_box(&state)))
    });
    group.bench_function("door_action", |b| b.iter(|| codec.decode(black_box(&door))));
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let codec = RecordCodec::new(TopicConfig::default());
    let record = OutboundRecord::KeySubmission(KeySubmission {
        device_id: DeviceIdentity::new("304242375241C9033432").expect("valid identity"),
        input: encode_input("12345678"),
    });

    c.bench_function("encode/key_submission", |b| {
        b.iter(|| codec.encode(black_box(&record)))
    });
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
