//! Benchmark – `jsonsink::PushParser`
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use jsonsink::{EventSink, ParserOptions, PushParser};

/// Sink that counts events and otherwise does nothing, so the benchmark
/// measures the parser rather than a consumer.
#[derive(Default)]
struct CountSink {
    events: usize,
    bytes: usize,
}

impl EventSink for CountSink {
    type Error = std::convert::Infallible;

    fn on_document_begin(&mut self) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
    fn on_document_end(&mut self) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
    fn on_object_begin(&mut self) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
    fn on_object_end(&mut self, _n: usize) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
    fn on_array_begin(&mut self) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
    fn on_array_end(&mut self, _n: usize) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
    fn on_key_part(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        self.bytes += s.len();
        Ok(())
    }
    fn on_key(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        self.events += 1;
        self.bytes += s.len();
        Ok(())
    }
    fn on_string_part(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        self.bytes += s.len();
        Ok(())
    }
    fn on_string(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        self.events += 1;
        self.bytes += s.len();
        Ok(())
    }
    fn on_int64(&mut self, _v: i64) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
    fn on_uint64(&mut self, _v: u64) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
    fn on_double(&mut self, _v: f64) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
    fn on_bool(&mut self, _v: bool) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
    fn on_null(&mut self) -> Result<(), Self::Error> {
        self.events += 1;
        Ok(())
    }
}

/// Produce a deterministic JSON document of exactly `target_len` bytes: an
/// array of small objects padded by a long string property at the end.
fn make_json_payload(target_len: usize) -> String {
    let mut s = String::with_capacity(target_len);
    s.push('[');
    let mut i = 0usize;
    loop {
        let item = format!("{{\"id\":{i},\"on\":{},\"v\":{}.25}},", i % 2 == 0, i % 97);
        if s.len() + item.len() + "{\"pad\":\"\"}]".len() > target_len {
            break;
        }
        s.push_str(&item);
        i += 1;
    }
    s.push_str("{\"pad\":\"");
    while s.len() + "\"}]".len() < target_len {
        s.push('a');
    }
    s.push_str("\"}]");
    debug_assert_eq!(s.len(), target_len);
    s
}

/// Feed the payload in `parts` chunks and return the number of events the
/// sink observed, so criterion can black-box the work.
fn run_push_parser(payload: &[u8], parts: usize) -> usize {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts);

    let mut parser = PushParser::new(ParserOptions::default());
    let mut sink = CountSink::default();

    let chunks: Vec<&[u8]> = payload.chunks(chunk_size).collect();
    let last = chunks.len() - 1;
    for (i, chunk) in chunks.iter().enumerate() {
        parser
            .write_some(&mut sink, i < last, chunk)
            .expect("payload is valid JSON");
    }
    assert!(parser.is_done());
    sink.events
}

fn bench_parse_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_parser");
    group.measurement_time(Duration::from_secs(5));

    for &size in &[1_024usize, 65_536, 1_048_576] {
        let payload = make_json_payload(size);
        group.throughput(criterion::Throughput::Bytes(size as u64));
        for &parts in &[1usize, 16, 256] {
            group.bench_with_input(
                BenchmarkId::new(format!("{size}B"), parts),
                &parts,
                |b, &parts| b.iter(|| black_box(run_push_parser(payload.as_bytes(), parts))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_parse_events);
criterion_main!(benches);
