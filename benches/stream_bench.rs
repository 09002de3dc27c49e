//! Benchmarks for decoding streamed Gemini replies.
//!
//! Run with: cargo bench --bench stream_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gemini_relay::transformer::{GenerateContentResponse, SseParser};
use serde_json::json;

fn sse_payload(chunks: usize) -> Vec<u8> {
    (0..chunks)
        .map(|i| {
            let chunk = json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": format!("fragment {} of the reply ", i)}]},
                    "index": 0
                }]
            });
            format!("data: {}\r\n\r\n", chunk)
        })
        .collect::<String>()
        .into_bytes()
}

fn bench_sse_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("sse_parse");

    for network_chunk in [64usize, 512, 4096] {
        let payload = sse_payload(100);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(network_chunk),
            &payload,
            |b, payload| {
                b.iter(|| {
                    let mut parser = SseParser::new();
                    let mut events = 0;
                    for chunk in payload.chunks(network_chunk) {
                        events += parser.push(black_box(chunk)).len();
                    }
                    events
                })
            },
        );
    }

    group.finish();
}

fn bench_chunk_text(c: &mut Criterion) {
    let data = json!({
        "candidates": [{
            "content": {"role": "model", "parts": [
                {"text": "Let me think.", "thought": true},
                {"text": "Here is the answer you asked for."}
            ]},
            "index": 0
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 9, "totalTokenCount": 21}
    })
    .to_string();

    c.bench_function("chunk_text", |b| {
        b.iter(|| {
            serde_json::from_str::<GenerateContentResponse>(black_box(&data))
                .ok()
                .and_then(|chunk| chunk.text().ok())
        })
    });
}

criterion_group!(benches, bench_sse_parse, bench_chunk_text);
criterion_main!(benches);
