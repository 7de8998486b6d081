//! Differential target: parsing a byte stream in one chunk and in seeded
//! random chunks must produce the same event tape and the same error class.
#![no_main]

use jsonsink::{ErrorSource, EventSink, ParserOptions, PushParser, SyntaxError};
use libfuzzer_sys::fuzz_target;

const HEADER: usize = 8; // split seed

/// Tape entry with doubles stored as bits so comparison is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Ev {
    DocBegin,
    DocEnd,
    ObjBegin,
    ObjEnd(usize),
    ArrBegin,
    ArrEnd(usize),
    Key(Vec<u8>),
    Str(Vec<u8>),
    Int(i64),
    Uint(u64),
    Double(u64),
    Bool(bool),
    Null,
}

#[derive(Default)]
struct Tape {
    events: Vec<Ev>,
    buf: Vec<u8>,
}

impl EventSink for Tape {
    type Error = std::convert::Infallible;

    fn on_document_begin(&mut self) -> Result<(), Self::Error> {
        self.events.push(Ev::DocBegin);
        Ok(())
    }
    fn on_document_end(&mut self) -> Result<(), Self::Error> {
        self.events.push(Ev::DocEnd);
        Ok(())
    }
    fn on_object_begin(&mut self) -> Result<(), Self::Error> {
        self.events.push(Ev::ObjBegin);
        Ok(())
    }
    fn on_object_end(&mut self, n: usize) -> Result<(), Self::Error> {
        self.events.push(Ev::ObjEnd(n));
        Ok(())
    }
    fn on_array_begin(&mut self) -> Result<(), Self::Error> {
        self.events.push(Ev::ArrBegin);
        Ok(())
    }
    fn on_array_end(&mut self, n: usize) -> Result<(), Self::Error> {
        self.events.push(Ev::ArrEnd(n));
        Ok(())
    }
    fn on_key_part(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        self.buf.extend_from_slice(s);
        Ok(())
    }
    fn on_key(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        self.buf.extend_from_slice(s);
        self.events.push(Ev::Key(std::mem::take(&mut self.buf)));
        Ok(())
    }
    fn on_string_part(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        self.buf.extend_from_slice(s);
        Ok(())
    }
    fn on_string(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        self.buf.extend_from_slice(s);
        self.events.push(Ev::Str(std::mem::take(&mut self.buf)));
        Ok(())
    }
    fn on_int64(&mut self, v: i64) -> Result<(), Self::Error> {
        self.events.push(Ev::Int(v));
        Ok(())
    }
    fn on_uint64(&mut self, v: u64) -> Result<(), Self::Error> {
        self.events.push(Ev::Uint(v));
        Ok(())
    }
    fn on_double(&mut self, v: f64) -> Result<(), Self::Error> {
        self.events.push(Ev::Double(v.to_bits()));
        Ok(())
    }
    fn on_bool(&mut self, v: bool) -> Result<(), Self::Error> {
        self.events.push(Ev::Bool(v));
        Ok(())
    }
    fn on_null(&mut self) -> Result<(), Self::Error> {
        self.events.push(Ev::Null);
        Ok(())
    }
}

fn parse(chunks: &[&[u8]]) -> (Vec<Ev>, Option<SyntaxError>) {
    let mut parser = PushParser::new(ParserOptions::default());
    let mut tape = Tape::default();
    let last = chunks.len() - 1;
    for (i, chunk) in chunks.iter().enumerate() {
        let mut rest: &[u8] = chunk;
        loop {
            match parser.write_some(&mut tape, i < last, rest) {
                Ok(n) => {
                    if parser.is_done() {
                        // ignore trailing bytes; the document is over
                        return (tape.events, None);
                    }
                    rest = &rest[n..];
                    if rest.is_empty() {
                        break;
                    }
                }
                Err(err) => {
                    let ErrorSource::Syntax(kind) = err.source() else {
                        unreachable!("sink is infallible");
                    };
                    return (tape.events, Some(*kind));
                }
            }
        }
    }
    (tape.events, None)
}

/// Split into boundary-free chunks driven by the seed; every chunk is at
/// least one byte.
fn split<'a>(data: &'a [u8], mut seed: u64) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < data.len() {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let size = 1 + (seed >> 33) as usize % (data.len() - start);
        chunks.push(&data[start..start + size]);
        start += size;
    }
    if chunks.is_empty() {
        chunks.push(data);
    }
    chunks
}

fuzz_target!(|data: &[u8]| {
    if data.len() < HEADER + 1 {
        return;
    }
    let seed = u64::from_le_bytes(data[..HEADER].try_into().unwrap());
    let doc = &data[HEADER..];

    let (whole, whole_err) = parse(&[doc]);
    let chunks = split(doc, seed);
    let (chunked, chunked_err) = parse(&chunks);

    assert_eq!(whole, chunked, "event tape diverged for chunking {chunks:?}");
    assert_eq!(
        whole_err.is_some(),
        chunked_err.is_some(),
        "error class diverged"
    );
});
