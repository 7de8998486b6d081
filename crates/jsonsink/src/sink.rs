//! The surface between the parser core and its consumers.
//!
//! Every handler can fail; a returned error aborts parsing and surfaces
//! unchanged through [`ErrorSource::Sink`](crate::ErrorSource::Sink).
//!
//! # Fragment protocol
//!
//! A single JSON string yields zero or more `*_part` calls followed by
//! exactly one terminal [`on_string`](EventSink::on_string) /
//! [`on_key`](EventSink::on_key) (whose fragment may be empty). The
//! concatenation of all fragments is the decoded UTF-8 string. The parser
//! may split at any point — including inside a multi-byte UTF-8 sequence
//! when a chunk boundary lands there — so sinks must treat fragments as
//! bytes and tolerate arbitrary fragmentation.
//!
//! # Borrowing
//!
//! When a run of string bytes contains no escapes, the fragment is a
//! zero-copy view into the caller's chunk. Sinks that keep string data must
//! copy it before returning; the borrow does not outlive the `write_some`
//! call that produced it.

/// Receiver for parse events, in strict document order.
///
/// Every handler has a default body that accepts and discards the event, so
/// a sink only implements what it cares about.
pub trait EventSink {
    /// Error type returned by handlers to abort the parse.
    type Error;

    /// A new document has started. First event of every parse.
    fn on_document_begin(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// The document is complete. Last event of every successful parse.
    fn on_document_end(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_object_begin(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// `n` is the number of key/value pairs the object held.
    fn on_object_end(&mut self, n: usize) -> Result<(), Self::Error> {
        let _ = n;
        Ok(())
    }

    fn on_array_begin(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// `n` is the number of elements the array held.
    fn on_array_end(&mut self, n: usize) -> Result<(), Self::Error> {
        let _ = n;
        Ok(())
    }

    /// A non-terminal fragment of an object key.
    fn on_key_part(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        let _ = s;
        Ok(())
    }

    /// The terminal fragment of an object key; ends the key.
    fn on_key(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        let _ = s;
        Ok(())
    }

    /// A non-terminal fragment of a string value.
    fn on_string_part(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        let _ = s;
        Ok(())
    }

    /// The terminal fragment of a string value; ends the string.
    fn on_string(&mut self, s: &[u8]) -> Result<(), Self::Error> {
        let _ = s;
        Ok(())
    }

    fn on_int64(&mut self, v: i64) -> Result<(), Self::Error> {
        let _ = v;
        Ok(())
    }

    fn on_uint64(&mut self, v: u64) -> Result<(), Self::Error> {
        let _ = v;
        Ok(())
    }

    fn on_double(&mut self, v: f64) -> Result<(), Self::Error> {
        let _ = v;
        Ok(())
    }

    fn on_bool(&mut self, v: bool) -> Result<(), Self::Error> {
        let _ = v;
        Ok(())
    }

    fn on_null(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
