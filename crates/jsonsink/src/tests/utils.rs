//! Shared test helpers: a recording sink, chunking utilities, and a small
//! canonical serializer used to check the round-trip property.

use alloc::{
    format,
    string::String,
    vec::Vec,
};

use crate::{EventSink, ParseError, ParserOptions, PushParser};

/// One entry of a recorded event tape.
///
/// Key and string fragments are concatenated before being recorded, so a
/// tape is invariant under re-chunking of the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    DocumentBegin,
    DocumentEnd,
    ObjectBegin,
    ObjectEnd(usize),
    ArrayBegin,
    ArrayEnd(usize),
    Key(String),
    Str(String),
    Int(i64),
    Uint(u64),
    Double(f64),
    Bool(bool),
    Null,
}

/// Sink that records the full event trace, replaying fragments into whole
/// keys and strings.
#[derive(Debug, Default)]
pub struct Tape {
    pub events: Vec<Event>,
    buf: Vec<u8>,
}

impl Tape {
    fn take_buf(&mut self, terminal: &[u8]) -> String {
        self.buf.extend_from_slice(terminal);
        let bytes = core::mem::take(&mut self.buf);
        String::from_utf8(bytes).expect("concatenated fragments are valid UTF-8")
    }
}

impl EventSink for Tape {
    type Error = &'static str;

    fn on_document_begin(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::DocumentBegin);
        Ok(())
    }

    fn on_document_end(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::DocumentEnd);
        Ok(())
    }

    fn on_object_begin(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::ObjectBegin);
        Ok(())
    }

    fn on_object_end(&mut self, n: usize) -> Result<(), Self::Error> {
        self.events.push(Event::ObjectEnd(n));
        Ok(())
    }

    fn on_array_begin(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::ArrayBegin);
        Ok(())
    }

    fn on_array_end(&mut self, n: usize) -> Result<(), Self::Error> {
        self.events.push(Event::ArrayEnd(n));
        Ok(())
    }

    fn on_key_part(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        self.buf.extend_from_slice(s);
        Ok(())
    }

    fn on_key(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        let key = self.take_buf(s);
        self.events.push(Event::Key(key));
        Ok(())
    }

    fn on_string_part(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        self.buf.extend_from_slice(s);
        Ok(())
    }

    fn on_string(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        let value = self.take_buf(s);
        self.events.push(Event::Str(value));
        Ok(())
    }

    fn on_int64(&mut self, v: i64) -> Result<(), Self::Error> {
        self.events.push(Event::Int(v));
        Ok(())
    }

    fn on_uint64(&mut self, v: u64) -> Result<(), Self::Error> {
        self.events.push(Event::Uint(v));
        Ok(())
    }

    fn on_double(&mut self, v: f64) -> Result<(), Self::Error> {
        self.events.push(Event::Double(v));
        Ok(())
    }

    fn on_bool(&mut self, v: bool) -> Result<(), Self::Error> {
        self.events.push(Event::Bool(v));
        Ok(())
    }

    fn on_null(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::Null);
        Ok(())
    }
}

/// Feed `chunks` in order, `more = true` for all but the last, and return
/// the recorded tape. Panics if a chunk is not fully consumed.
pub fn parse_chunks(chunks: &[&[u8]]) -> Result<Vec<Event>, ParseError<&'static str>> {
    let mut parser = PushParser::new(ParserOptions::default());
    let mut tape = Tape::default();
    let last = chunks.len().saturating_sub(1);
    for (i, chunk) in chunks.iter().enumerate() {
        let n = parser.write_some(&mut tape, i < last, chunk)?;
        assert_eq!(n, chunk.len(), "chunk {i} not fully consumed");
    }
    Ok(tape.events)
}

/// Parse a complete document presented as a single final chunk.
pub fn parse_one(payload: &str) -> Result<Vec<Event>, ParseError<&'static str>> {
    parse_chunks(&[payload.as_bytes()])
}

/// Parse the payload whole, then once more for every possible two-chunk
/// split, asserting every split produces the identical tape.
pub fn parse_every_split(payload: &str) -> Vec<Event> {
    let bytes = payload.as_bytes();
    let whole = parse_chunks(&[bytes]).expect("payload is valid");
    for cut in 0..=bytes.len() {
        let (a, b) = bytes.split_at(cut);
        let split = parse_chunks(&[a, b]).expect("split payload is valid");
        assert_eq!(split, whole, "tape differs for split at byte {cut}");
    }
    whole
}

/// Split `payload` into `parts` chunks of roughly equal size.
pub fn produce_chunks(payload: &[u8], parts: usize) -> Vec<&[u8]> {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts).max(1);
    payload.chunks(chunk_size).collect()
}

fn escape_into(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0}'..='\u{1F}' => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(c),
        }
    }
    out.push('"');
}

/// Render a tape back to canonical JSON text: no whitespace, shortest
/// round-trip float formatting.
pub fn serialize(events: &[Event]) -> String {
    let mut out = String::new();
    // (is_object, values_emitted) per open container
    let mut open: Vec<(bool, usize)> = Vec::new();
    for ev in events {
        // comma before any array element or object key except the first
        match ev {
            Event::Key(_) => {
                if let Some((true, n)) = open.last_mut().map(|f| (f.0, &mut f.1)) {
                    if *n > 0 {
                        out.push(',');
                    }
                    *n += 1;
                }
            }
            Event::DocumentBegin
            | Event::DocumentEnd
            | Event::ObjectEnd(_)
            | Event::ArrayEnd(_) => {}
            _ => {
                if let Some((false, n)) = open.last_mut().map(|f| (f.0, &mut f.1)) {
                    if *n > 0 {
                        out.push(',');
                    }
                    *n += 1;
                }
            }
        }
        match ev {
            Event::DocumentBegin | Event::DocumentEnd => {}
            Event::ObjectBegin => {
                out.push('{');
                open.push((true, 0));
            }
            Event::ObjectEnd(_) => {
                out.push('}');
                open.pop();
            }
            Event::ArrayBegin => {
                out.push('[');
                open.push((false, 0));
            }
            Event::ArrayEnd(_) => {
                out.push(']');
                open.pop();
            }
            Event::Key(k) => {
                escape_into(&mut out, k);
                out.push(':');
            }
            Event::Str(s) => escape_into(&mut out, s),
            Event::Int(v) => out.push_str(&format!("{v}")),
            Event::Uint(v) => out.push_str(&format!("{v}")),
            Event::Double(v) => out.push_str(&format!("{v:?}")),
            Event::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            Event::Null => out.push_str("null"),
        }
    }
    out
}
