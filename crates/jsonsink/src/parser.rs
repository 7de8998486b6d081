//! The push parser: a resumable recursive-descent state machine.
//!
//! Each sub-parser (`parse_null`, `parse_string`, `parse_number`,
//! `parse_object`, `parse_array`) is an explicit state loop returning a
//! three-way result: done, incomplete, or failed. When input runs out
//! mid-token with more chunks expected, the sub-parser pushes a resume frame
//! and the incomplete signal propagates outward, collecting one frame per
//! enclosing container on the way. The next `write_some` call pops frames
//! from the outside in until it reaches the byte where the cut happened.
#![allow(clippy::too_many_lines)]

use crate::{
    cursor::Cursor,
    error::{ErrorSource, ParseError, SyntaxError},
    number::{Num, dec_to_float},
    options::ParserOptions,
    scan,
    scratch::Scratch,
    sink::EventSink,
    stack::{Frame, State, SuspendStack},
};

/// Non-local exit from a sub-parser: either the cursor drained mid-token, or
/// the parse failed.
enum Break<E> {
    Incomplete,
    Error(ErrorSource<E>),
}

type Step<E> = Result<(), Break<E>>;

#[inline]
fn fail<E>(err: SyntaxError) -> Break<E> {
    Break::Error(ErrorSource::Syntax(err))
}

#[inline]
fn sink_err<E>(err: E) -> Break<E> {
    Break::Error(ErrorSource::Sink(err))
}

/// Skip leading whitespace. Returns `false` if that drained the cursor.
fn skip_white(cs: &mut Cursor<'_>) -> bool {
    let tail = cs.tail();
    let n = scan::count_whitespace(tail);
    cs.advance(n);
    n < tail.len()
}

fn hex4(b: &[u8]) -> Option<u32> {
    let d1 = scan::hex_digit(b[0])?;
    let d2 = scan::hex_digit(b[1])?;
    let d3 = scan::hex_digit(b[2])?;
    let d4 = scan::hex_digit(b[3])?;
    Some((d1 << 12) | (d2 << 8) | (d3 << 4) | d4)
}

/// Decode `\uXXXX` (and a following low surrogate if needed) in one pass.
/// The cursor is at the `u` with at least 11 bytes remaining, enough for
/// both halves of a surrogate pair without resuspending.
fn utf16_escape_fast<E>(cs: &mut Cursor<'_>, temp: &mut Scratch) -> Result<(), Break<E>> {
    let t = cs.tail();
    let Some(u1) = hex4(&t[1..5]) else {
        cs.advance(1);
        for &b in &t[1..5] {
            if scan::hex_digit(b).is_none() {
                break;
            }
            cs.advance(1);
        }
        return Err(fail(SyntaxError::ExpectedHexDigit));
    };
    if !(0xD800..=0xDFFF).contains(&u1) {
        cs.advance(5);
        temp.append_utf8(u1);
        return Ok(());
    }
    if u1 >= 0xDC00 {
        return Err(fail(SyntaxError::IllegalTrailingSurrogate));
    }
    cs.advance(5);
    if cs.peek() != b'\\' {
        return Err(fail(SyntaxError::IllegalLeadingSurrogate));
    }
    cs.advance(1);
    if cs.peek() != b'u' {
        return Err(fail(SyntaxError::IllegalLeadingSurrogate));
    }
    cs.advance(1);
    let t = cs.tail();
    let Some(u2) = hex4(&t[..4]) else {
        for &b in &t[..4] {
            if scan::hex_digit(b).is_none() {
                break;
            }
            cs.advance(1);
        }
        return Err(fail(SyntaxError::ExpectedHexDigit));
    };
    if !(0xDC00..=0xDFFF).contains(&u2) {
        return Err(fail(SyntaxError::IllegalTrailingSurrogate));
    }
    cs.advance(4);
    temp.append_utf8(((u1 - 0xD800) << 10) + (u2 - 0xDC00) + 0x10000);
    Ok(())
}

fn finish_int<S: EventSink>(h: &mut S, num: &Num) -> Step<S::Error> {
    if num.neg {
        // two's-complement negation; mant <= |i64::MIN| here
        return h.on_int64(num.mant.wrapping_neg() as i64).map_err(sink_err);
    }
    if num.mant <= i64::MAX as u64 {
        return h.on_int64(num.mant as i64).map_err(sink_err);
    }
    h.on_uint64(num.mant).map_err(sink_err)
}

fn finish_dub<S: EventSink>(h: &mut S, num: &Num) -> Step<S::Error> {
    let exp = if num.frac {
        -i64::from(num.exp)
    } else {
        i64::from(num.exp)
    };
    let d = dec_to_float(num.mant, i64::from(num.bias) + exp, num.neg);
    h.on_double(d).map_err(sink_err)
}

/// The incremental push parser.
///
/// Feed chunks with [`write_some`](Self::write_some) until
/// [`is_done`](Self::is_done) reports a complete document or an error is
/// returned. [`reset`](Self::reset) returns the instance to a pristine state
/// for the next document.
///
/// # Examples
///
/// ```rust
/// use jsonsink::{EventSink, ParserOptions, PushParser};
///
/// struct Ints(Vec<i64>);
///
/// impl EventSink for Ints {
///     type Error = core::convert::Infallible;
///
///     fn on_int64(&mut self, v: i64) -> Result<(), Self::Error> {
///         self.0.push(v);
///         Ok(())
///     }
/// }
///
/// let mut parser = PushParser::new(ParserOptions::default());
/// let mut sink = Ints(Vec::new());
/// parser.write_some(&mut sink, true, b"[1, 2, ").unwrap();
/// parser.write_some(&mut sink, false, b"3]").unwrap();
/// assert!(parser.is_done());
/// assert_eq!(sink.0, [1, 2, 3]);
/// ```
#[derive(Debug)]
pub struct PushParser {
    st: SuspendStack,
    /// Accumulators for an in-progress `\uXXXX` escape.
    u1: u32,
    u2: u32,
    depth: usize,
    max_depth: usize,
    done: bool,
    more: bool,
    /// True while the next string token is an object key.
    is_key: bool,
}

impl Default for PushParser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl PushParser {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self {
            st: SuspendStack::new(),
            u1: 0,
            u2: 0,
            depth: 0,
            max_depth: options.max_depth,
            done: false,
            more: true,
            is_key: false,
        }
    }

    /// True once a complete document has been parsed. `write_some` must not
    /// be called again until [`reset`](Self::reset).
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Current container nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The configured maximum nesting depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Abandon any in-progress state and prepare for a new document.
    pub fn reset(&mut self) {
        self.done = false;
        self.more = true;
        self.st.clear();
    }

    /// Parse one chunk, emitting events to `sink`.
    ///
    /// `more` declares whether further chunks may follow. Returns the number
    /// of bytes consumed, always `<= data.len()`; the caller must submit any
    /// remainder in a subsequent call, or start a new document. When `more`
    /// is false and the chunk ends mid-token, the error is
    /// [`SyntaxError::Incomplete`]. Errors carry the consumed count and are
    /// terminal for the current document.
    pub fn write_some<S: EventSink>(
        &mut self,
        sink: &mut S,
        more: bool,
        data: &[u8],
    ) -> Result<usize, ParseError<S::Error>> {
        debug_assert!(!self.done, "write_some on a finished parser; reset() first");
        self.more = more;
        let mut cs = Cursor::new(data);
        let result = self.run(sink, &mut cs);
        let consumed = cs.offset();
        match result {
            Ok(()) => Ok(consumed),
            Err(Break::Incomplete) => {
                if self.more {
                    Ok(consumed)
                } else {
                    Err(ParseError::syntax(SyntaxError::Incomplete, consumed))
                }
            }
            Err(Break::Error(reason)) => Err(ParseError { reason, consumed }),
        }
    }

    /// Like [`write_some`](Self::write_some), but the whole chunk must
    /// belong to the document: leftover bytes after a completed document
    /// fail with [`SyntaxError::ExtraData`].
    pub fn write<S: EventSink>(
        &mut self,
        sink: &mut S,
        more: bool,
        data: &[u8],
    ) -> Result<usize, ParseError<S::Error>> {
        let n = self.write_some(sink, more, data)?;
        if n < data.len() {
            return Err(ParseError::syntax(SyntaxError::ExtraData, n));
        }
        Ok(n)
    }

    /// Declare the end of input. Fails with [`SyntaxError::Incomplete`] if
    /// the document is still unfinished.
    pub fn finish<S: EventSink>(&mut self, sink: &mut S) -> Result<(), ParseError<S::Error>> {
        if self.done {
            return Ok(());
        }
        self.write_some(sink, false, &[]).map(|_| ())
    }

    fn run<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        if self.st.is_empty() {
            self.depth = 0;
            self.is_key = false;
            h.on_document_begin().map_err(sink_err)?;
        }
        self.parse_element(h, cs)?;
        h.on_document_end().map_err(sink_err)?;
        self.done = true;
        Ok(())
    }

    // ----------------------------------------------------------------
    // Suspension
    // ----------------------------------------------------------------

    fn push_frame(&mut self, frame: Frame) {
        self.st.reserve(self.max_depth);
        self.st.push(frame);
    }

    /// Record a payload-less resume point, if another chunk may follow.
    fn incomplete<E>(&mut self, st: State) -> Break<E> {
        if self.more {
            self.push_frame(Frame::State(st));
        }
        Break::Incomplete
    }

    fn incomplete_count<E>(&mut self, st: State, n: usize) -> Break<E> {
        if self.more {
            self.push_frame(Frame::Count(st, n));
        }
        Break::Incomplete
    }

    fn incomplete_num<E>(&mut self, st: State, num: Num) -> Break<E> {
        if self.more {
            self.push_frame(Frame::Num(st, num));
        }
        Break::Incomplete
    }

    /// Add this container's resume frame while an incomplete signal from an
    /// inner parser unwinds through it.
    fn suspend_through<E>(&mut self, b: Break<E>, frame: Frame) -> Break<E> {
        if matches!(b, Break::Incomplete) && self.more {
            self.push_frame(frame);
        }
        b
    }

    // ----------------------------------------------------------------
    // Document framing
    // ----------------------------------------------------------------

    fn parse_element<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        let mut st = State::Ele1;
        if !self.st.is_empty() {
            st = self.st.pop_state();
        }
        loop {
            match st {
                State::Ele1 => {
                    if !skip_white(cs) {
                        return Err(self.incomplete(State::Ele1));
                    }
                    st = State::Ele2;
                }
                State::Ele2 => {
                    self.parse_value(h, cs)
                        .map_err(|b| self.suspend_through(b, Frame::State(State::Ele2)))?;
                    st = State::Ele3;
                }
                State::Ele3 => {
                    if !skip_white(cs) && self.more {
                        return Err(self.incomplete(State::Ele3));
                    }
                    return Ok(());
                }
                _ => unreachable!("not an element state: {st:?}"),
            }
        }
    }

    // ----------------------------------------------------------------
    // Value dispatch
    // ----------------------------------------------------------------

    fn parse_value<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        if !self.st.is_empty() {
            return self.resume_value(h, cs);
        }
        match cs.peek() {
            b'n' => {
                if cs.remaining() >= 4 {
                    if !cs.tail().starts_with(b"null") {
                        return Err(fail(SyntaxError::Syntax));
                    }
                    cs.advance(4);
                    return h.on_null().map_err(sink_err);
                }
                cs.advance(1);
                self.parse_null(h, cs)
            }
            b't' => {
                if cs.remaining() >= 4 {
                    if !cs.tail().starts_with(b"true") {
                        return Err(fail(SyntaxError::Syntax));
                    }
                    cs.advance(4);
                    return h.on_bool(true).map_err(sink_err);
                }
                cs.advance(1);
                self.parse_true(h, cs)
            }
            b'f' => {
                if cs.remaining() >= 5 {
                    if !cs.tail()[1..].starts_with(b"alse") {
                        return Err(fail(SyntaxError::Syntax));
                    }
                    cs.advance(5);
                    return h.on_bool(false).map_err(sink_err);
                }
                cs.advance(1);
                self.parse_false(h, cs)
            }
            b'"' => self.parse_string(h, cs),
            b'{' => self.parse_object(h, cs),
            b'[' => self.parse_array(h, cs),
            _ => self.parse_number(h, cs),
        }
    }

    /// Dispatch on the innermost unresumed frame. Each sub-parser pops its
    /// own frame; this only peeks.
    fn resume_value<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        use State::*;
        match self.st.peek_state() {
            Nul1 | Nul2 | Nul3 => self.parse_null(h, cs),
            Tru1 | Tru2 | Tru3 => self.parse_true(h, cs),
            Fal1 | Fal2 | Fal3 | Fal4 => self.parse_false(h, cs),
            Str1 | Str2 | Str3 | Str4 | Str5 | Str6 | Str7 | Sur1 | Sur2 | Sur3 | Sur4 | Sur5
            | Sur6 => self.parse_string(h, cs),
            Obj1 | Obj2 | Obj3 | Obj4 | Obj5 | Obj6 | Obj7 => self.parse_object(h, cs),
            Arr1 | Arr2 | Arr3 | Arr4 => self.parse_array(h, cs),
            Num1 | Num2 | Num3 | Num4 | Num5 | Num6 | Num7 | Num8 | Exp1 | Exp2 | Exp3 => {
                self.parse_number(h, cs)
            }
            st @ (Ele1 | Ele2 | Ele3) => unreachable!("element frame below a value: {st:?}"),
        }
    }

    // ----------------------------------------------------------------
    // Literals
    // ----------------------------------------------------------------

    /// Consume `b` or record `st` as the resume point.
    fn expect_byte<E>(&mut self, cs: &mut Cursor<'_>, b: u8, st: State) -> Result<(), Break<E>> {
        if cs.remaining() == 0 {
            return Err(self.incomplete(st));
        }
        if cs.peek() != b {
            return Err(fail(SyntaxError::Syntax));
        }
        cs.advance(1);
        Ok(())
    }

    fn parse_null<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        let mut st = State::Nul1;
        if !self.st.is_empty() {
            st = self.st.pop_state();
        }
        loop {
            match st {
                State::Nul1 => {
                    self.expect_byte(cs, b'u', State::Nul1)?;
                    st = State::Nul2;
                }
                State::Nul2 => {
                    self.expect_byte(cs, b'l', State::Nul2)?;
                    st = State::Nul3;
                }
                State::Nul3 => {
                    self.expect_byte(cs, b'l', State::Nul3)?;
                    return h.on_null().map_err(sink_err);
                }
                _ => unreachable!("not a null state: {st:?}"),
            }
        }
    }

    fn parse_true<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        let mut st = State::Tru1;
        if !self.st.is_empty() {
            st = self.st.pop_state();
        }
        loop {
            match st {
                State::Tru1 => {
                    self.expect_byte(cs, b'r', State::Tru1)?;
                    st = State::Tru2;
                }
                State::Tru2 => {
                    self.expect_byte(cs, b'u', State::Tru2)?;
                    st = State::Tru3;
                }
                State::Tru3 => {
                    self.expect_byte(cs, b'e', State::Tru3)?;
                    return h.on_bool(true).map_err(sink_err);
                }
                _ => unreachable!("not a true state: {st:?}"),
            }
        }
    }

    fn parse_false<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        let mut st = State::Fal1;
        if !self.st.is_empty() {
            st = self.st.pop_state();
        }
        loop {
            match st {
                State::Fal1 => {
                    self.expect_byte(cs, b'a', State::Fal1)?;
                    st = State::Fal2;
                }
                State::Fal2 => {
                    self.expect_byte(cs, b'l', State::Fal2)?;
                    st = State::Fal3;
                }
                State::Fal3 => {
                    self.expect_byte(cs, b's', State::Fal3)?;
                    st = State::Fal4;
                }
                State::Fal4 => {
                    self.expect_byte(cs, b'e', State::Fal4)?;
                    return h.on_bool(false).map_err(sink_err);
                }
                _ => unreachable!("not a false state: {st:?}"),
            }
        }
    }

    // ----------------------------------------------------------------
    // Strings
    // ----------------------------------------------------------------

    /// Emit a non-terminal fragment, skipping empty ones.
    fn emit_part<S: EventSink>(&mut self, h: &mut S, s: &[u8]) -> Step<S::Error> {
        if s.is_empty() {
            return Ok(());
        }
        if self.is_key {
            h.on_key_part(s).map_err(sink_err)
        } else {
            h.on_string_part(s).map_err(sink_err)
        }
    }

    /// Emit the terminal fragment; ends the key or string.
    fn emit_terminal<S: EventSink>(&mut self, h: &mut S, s: &[u8]) -> Step<S::Error> {
        if self.is_key {
            self.is_key = false;
            h.on_key(s).map_err(sink_err)
        } else {
            h.on_string(s).map_err(sink_err)
        }
    }

    fn flush_scratch<S: EventSink>(&mut self, h: &mut S, temp: &mut Scratch) -> Step<S::Error> {
        if !temp.is_empty() {
            if self.is_key {
                h.on_key_part(temp.as_bytes()).map_err(sink_err)?;
            } else {
                h.on_string_part(temp.as_bytes()).map_err(sink_err)?;
            }
            temp.clear();
        }
        Ok(())
    }

    /// Consume one `\uXXXX` nibble or record `st` as the resume point.
    fn hex_nibble<E>(&mut self, cs: &mut Cursor<'_>, st: State) -> Result<u32, Break<E>> {
        if cs.remaining() == 0 {
            return Err(self.incomplete(st));
        }
        let Some(d) = scan::hex_digit(cs.peek()) else {
            return Err(fail(SyntaxError::ExpectedHexDigit));
        };
        cs.advance(1);
        Ok(d)
    }

    fn parse_string<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        let mut temp = Scratch::new();
        let mut st;
        if self.st.is_empty() {
            if cs.peek() != b'"' {
                return Err(fail(SyntaxError::Syntax));
            }
            cs.advance(1);
            st = State::Str1;
        } else {
            st = self.st.pop_state();
            if st != State::Str1 {
                // Escape-path states stage output in the scratch; bound the
                // window so the staged bytes can never exceed its capacity.
                cs.clip(Scratch::CAPACITY);
            }
        }
        let start = cs.offset();
        loop {
            match st {
                // Zero-copy runs between escapes.
                State::Str1 => {
                    cs.advance(scan::count_unescaped(cs.tail()));
                    if cs.remaining() == 0 {
                        if self.more {
                            self.emit_part(h, cs.used(start))?;
                            return Err(self.incomplete(State::Str1));
                        }
                        return Err(Break::Incomplete);
                    }
                    match cs.peek() {
                        b'"' => {
                            self.emit_terminal(h, cs.used(start))?;
                            cs.advance(1);
                            return Ok(());
                        }
                        b'\\' => {
                            self.emit_part(h, cs.used(start))?;
                            cs.clip(Scratch::CAPACITY);
                            st = State::Str2;
                        }
                        // control byte; count_unescaped stops at nothing else
                        _ => return Err(fail(SyntaxError::Syntax)),
                    }
                }

                // Escaped region: decode through the scratch buffer.
                State::Str2 => loop {
                    if cs.remaining() == 0 {
                        self.flush_scratch(h, &mut temp)?;
                        cs.clip(Scratch::CAPACITY);
                        if cs.remaining() > 0 {
                            continue;
                        }
                        if self.more {
                            return Err(self.incomplete(State::Str2));
                        }
                        return Err(Break::Incomplete);
                    }
                    match cs.peek() {
                        b'"' => {
                            self.emit_terminal(h, temp.as_bytes())?;
                            cs.advance(1);
                            cs.unclip();
                            return Ok(());
                        }
                        b'\\' => {
                            cs.advance(1);
                            st = State::Str3;
                            break;
                        }
                        c if c < 0x20 => return Err(fail(SyntaxError::Syntax)),
                        c => {
                            temp.push(c);
                            cs.advance(1);
                        }
                    }
                },

                // The byte after a backslash.
                State::Str3 => {
                    if cs.remaining() == 0 {
                        self.flush_scratch(h, &mut temp)?;
                        cs.clip(Scratch::CAPACITY);
                        if cs.remaining() == 0 {
                            if self.more {
                                return Err(self.incomplete(State::Str3));
                            }
                            return Err(Break::Incomplete);
                        }
                    }
                    let c = cs.peek();
                    let decoded = match c {
                        b'"' | b'\\' | b'/' => Some(c),
                        b'b' => Some(0x08),
                        b'f' => Some(0x0C),
                        b'n' => Some(0x0A),
                        b'r' => Some(0x0D),
                        b't' => Some(0x09),
                        b'u' => None,
                        _ => return Err(fail(SyntaxError::Syntax)),
                    };
                    if let Some(b) = decoded {
                        temp.push(b);
                        cs.advance(1);
                        st = State::Str2;
                    } else if cs.remaining() >= 11 {
                        // room for both halves of a surrogate pair
                        utf16_escape_fast(cs, &mut temp)?;
                        st = State::Str2;
                    } else {
                        // byte-at-a-time, individually resumable
                        self.flush_scratch(h, &mut temp)?;
                        cs.clip(Scratch::CAPACITY);
                        cs.advance(1);
                        st = State::Str4;
                    }
                }

                // First UTF-16 unit, one hex digit per state.
                State::Str4 => {
                    let d = self.hex_nibble(cs, State::Str4)?;
                    self.u1 = d << 12;
                    st = State::Str5;
                }
                State::Str5 => {
                    let d = self.hex_nibble(cs, State::Str5)?;
                    self.u1 += d << 8;
                    st = State::Str6;
                }
                State::Str6 => {
                    let d = self.hex_nibble(cs, State::Str6)?;
                    self.u1 += d << 4;
                    st = State::Str7;
                }
                State::Str7 => {
                    let d = self.hex_nibble(cs, State::Str7)?;
                    self.u1 += d;
                    if !(0xD800..=0xDFFF).contains(&self.u1) {
                        temp.append_utf8(self.u1);
                        st = State::Str2;
                    } else if self.u1 >= 0xDC00 {
                        return Err(fail(SyntaxError::IllegalTrailingSurrogate));
                    } else {
                        st = State::Sur1;
                    }
                }

                // A high surrogate requires an immediately following \u unit.
                State::Sur1 => {
                    if cs.remaining() == 0 {
                        return Err(self.incomplete(State::Sur1));
                    }
                    if cs.peek() != b'\\' {
                        return Err(fail(SyntaxError::IllegalLeadingSurrogate));
                    }
                    cs.advance(1);
                    st = State::Sur2;
                }
                State::Sur2 => {
                    if cs.remaining() == 0 {
                        return Err(self.incomplete(State::Sur2));
                    }
                    if cs.peek() != b'u' {
                        return Err(fail(SyntaxError::IllegalLeadingSurrogate));
                    }
                    cs.advance(1);
                    st = State::Sur3;
                }
                State::Sur3 => {
                    let d = self.hex_nibble(cs, State::Sur3)?;
                    self.u2 = d << 12;
                    st = State::Sur4;
                }
                State::Sur4 => {
                    let d = self.hex_nibble(cs, State::Sur4)?;
                    self.u2 += d << 8;
                    st = State::Sur5;
                }
                State::Sur5 => {
                    let d = self.hex_nibble(cs, State::Sur5)?;
                    self.u2 += d << 4;
                    st = State::Sur6;
                }
                State::Sur6 => {
                    let d = self.hex_nibble(cs, State::Sur6)?;
                    self.u2 += d;
                    if !(0xDC00..=0xDFFF).contains(&self.u2) {
                        return Err(fail(SyntaxError::IllegalTrailingSurrogate));
                    }
                    temp.append_utf8(((self.u1 - 0xD800) << 10) + (self.u2 - 0xDC00) + 0x10000);
                    st = State::Str2;
                }

                _ => unreachable!("not a string state: {st:?}"),
            }
        }
    }

    // ----------------------------------------------------------------
    // Containers
    // ----------------------------------------------------------------

    fn parse_object<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        let mut n: usize = 0;
        let mut st;
        if self.st.is_empty() {
            debug_assert_eq!(cs.peek(), b'{');
            if self.depth >= self.max_depth {
                return Err(fail(SyntaxError::TooDeep));
            }
            self.depth += 1;
            h.on_object_begin().map_err(sink_err)?;
            cs.advance(1);
            st = State::Obj1;
        } else {
            let (saved, count) = self.st.pop_count();
            st = saved;
            n = count;
        }
        loop {
            match st {
                State::Obj1 => {
                    if !skip_white(cs) {
                        return Err(self.incomplete_count(State::Obj1, n));
                    }
                    if cs.peek() == b'}' {
                        h.on_object_end(n).map_err(sink_err)?;
                        self.depth -= 1;
                        cs.advance(1);
                        return Ok(());
                    }
                    self.is_key = true;
                    st = State::Obj2;
                }
                State::Obj2 => {
                    self.parse_string(h, cs)
                        .map_err(|b| self.suspend_through(b, Frame::Count(State::Obj2, n)))?;
                    st = State::Obj3;
                }
                State::Obj3 => {
                    if !skip_white(cs) {
                        return Err(self.incomplete_count(State::Obj3, n));
                    }
                    if cs.peek() != b':' {
                        return Err(fail(SyntaxError::Syntax));
                    }
                    cs.advance(1);
                    st = State::Obj4;
                }
                State::Obj4 => {
                    if !skip_white(cs) {
                        return Err(self.incomplete_count(State::Obj4, n));
                    }
                    st = State::Obj5;
                }
                State::Obj5 => {
                    self.parse_value(h, cs)
                        .map_err(|b| self.suspend_through(b, Frame::Count(State::Obj5, n)))?;
                    n += 1;
                    st = State::Obj6;
                }
                State::Obj6 => {
                    if !skip_white(cs) {
                        return Err(self.incomplete_count(State::Obj6, n));
                    }
                    match cs.peek() {
                        b',' => {
                            cs.advance(1);
                            st = State::Obj7;
                        }
                        b'}' => {
                            h.on_object_end(n).map_err(sink_err)?;
                            self.depth -= 1;
                            cs.advance(1);
                            return Ok(());
                        }
                        _ => return Err(fail(SyntaxError::Syntax)),
                    }
                }
                State::Obj7 => {
                    if !skip_white(cs) {
                        return Err(self.incomplete_count(State::Obj7, n));
                    }
                    self.is_key = true;
                    st = State::Obj2;
                }
                _ => unreachable!("not an object state: {st:?}"),
            }
        }
    }

    fn parse_array<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        let mut n: usize = 0;
        let mut st;
        if self.st.is_empty() {
            debug_assert_eq!(cs.peek(), b'[');
            if self.depth >= self.max_depth {
                return Err(fail(SyntaxError::TooDeep));
            }
            self.depth += 1;
            h.on_array_begin().map_err(sink_err)?;
            cs.advance(1);
            st = State::Arr1;
        } else {
            let (saved, count) = self.st.pop_count();
            st = saved;
            n = count;
        }
        loop {
            match st {
                State::Arr1 => {
                    if !skip_white(cs) {
                        return Err(self.incomplete_count(State::Arr1, n));
                    }
                    if cs.peek() == b']' {
                        h.on_array_end(n).map_err(sink_err)?;
                        self.depth -= 1;
                        cs.advance(1);
                        return Ok(());
                    }
                    st = State::Arr2;
                }
                State::Arr2 => {
                    self.parse_value(h, cs)
                        .map_err(|b| self.suspend_through(b, Frame::Count(State::Arr2, n)))?;
                    n += 1;
                    st = State::Arr3;
                }
                State::Arr3 => {
                    if !skip_white(cs) {
                        return Err(self.incomplete_count(State::Arr3, n));
                    }
                    match cs.peek() {
                        b',' => {
                            cs.advance(1);
                            st = State::Arr4;
                        }
                        b']' => {
                            h.on_array_end(n).map_err(sink_err)?;
                            self.depth -= 1;
                            cs.advance(1);
                            return Ok(());
                        }
                        _ => return Err(fail(SyntaxError::Syntax)),
                    }
                }
                State::Arr4 => {
                    if !skip_white(cs) {
                        return Err(self.incomplete_count(State::Arr4, n));
                    }
                    st = State::Arr2;
                }
                _ => unreachable!("not an array state: {st:?}"),
            }
        }
    }

    // ----------------------------------------------------------------
    // Numbers
    // ----------------------------------------------------------------

    fn parse_number<S: EventSink>(&mut self, h: &mut S, cs: &mut Cursor<'_>) -> Step<S::Error> {
        let mut num;
        let mut st;
        if self.st.is_empty() {
            num = Num::default();
            if cs.peek() == b'-' {
                cs.advance(1);
                num.neg = true;
            }
            st = State::Num1;
            if cs.remaining() >= 16 + 1 + 16 {
                // digits . digits
                match number_fast_path(h, cs, &mut num)? {
                    Some(next) => st = next,
                    None => return Ok(()),
                }
            }
        } else {
            let (saved, record) = self.st.pop_num();
            st = saved;
            num = record;
        }
        loop {
            match st {
                // First digit (the sign is already consumed).
                State::Num1 => {
                    if cs.remaining() == 0 {
                        return Err(self.incomplete_num(State::Num1, num));
                    }
                    match cs.peek() {
                        c @ b'1'..=b'9' => {
                            cs.advance(1);
                            num.mant = u64::from(c - b'0');
                            st = State::Num2;
                        }
                        b'0' => {
                            cs.advance(1);
                            num.mant = 0;
                            st = State::Num6;
                        }
                        _ => return Err(fail(SyntaxError::Syntax)),
                    }
                }

                // Significant digits left of the decimal point.
                State::Num2 => {
                    let overflow = loop {
                        if cs.remaining() == 0 {
                            if self.more {
                                return Err(self.incomplete_num(State::Num2, num));
                            }
                            return finish_int(h, &num);
                        }
                        let c = cs.peek();
                        if !c.is_ascii_digit() {
                            break false;
                        }
                        cs.advance(1);
                        let d = c - b'0';
                        if num.neg {
                            //               9223372036854775808 == |i64::MIN|
                            if num.mant > 922_337_203_685_477_580
                                || (num.mant == 922_337_203_685_477_580 && d > 8)
                            {
                                break true;
                            }
                        } else {
                            //               18446744073709551615 == u64::MAX
                            if num.mant > 1_844_674_407_370_955_161
                                || (num.mant == 1_844_674_407_370_955_161 && d > 5)
                            {
                                break true;
                            }
                        }
                        num.mant = num.mant * 10 + u64::from(d);
                    };
                    if overflow {
                        // the digit is consumed but no longer significant
                        num.bias += 1;
                        st = State::Num3;
                    } else {
                        st = State::Num6;
                    }
                }

                // Non-significant digits left of the decimal point.
                State::Num3 => loop {
                    if cs.remaining() == 0 {
                        if self.more {
                            return Err(self.incomplete_num(State::Num3, num));
                        }
                        return finish_dub(h, &num);
                    }
                    let c = cs.peek();
                    if c.is_ascii_digit() {
                        cs.advance(1);
                        num.bias += 1;
                    } else if c == b'.' {
                        cs.advance(1);
                        st = State::Num4;
                        break;
                    } else if (c | 0x20) == b'e' {
                        cs.advance(1);
                        st = State::Exp1;
                        break;
                    } else {
                        return finish_dub(h, &num);
                    }
                },

                // First discarded digit right of the point; required.
                State::Num4 => {
                    if cs.remaining() == 0 {
                        return Err(self.incomplete_num(State::Num4, num));
                    }
                    if !cs.peek().is_ascii_digit() {
                        return Err(fail(SyntaxError::Syntax));
                    }
                    cs.advance(1);
                    st = State::Num5;
                }

                // Discarded fraction digits; still validated.
                State::Num5 => loop {
                    if cs.remaining() == 0 {
                        if self.more {
                            return Err(self.incomplete_num(State::Num5, num));
                        }
                        return finish_dub(h, &num);
                    }
                    let c = cs.peek();
                    if c.is_ascii_digit() {
                        cs.advance(1);
                    } else if (c | 0x20) == b'e' {
                        cs.advance(1);
                        st = State::Exp1;
                        break;
                    } else {
                        return finish_dub(h, &num);
                    }
                },

                // After the integer part: '.', exponent, or the end.
                State::Num6 => {
                    if cs.remaining() == 0 {
                        if self.more {
                            return Err(self.incomplete_num(State::Num6, num));
                        }
                        return finish_int(h, &num);
                    }
                    let c = cs.peek();
                    if c == b'.' {
                        cs.advance(1);
                        st = State::Num7;
                    } else if (c | 0x20) == b'e' {
                        cs.advance(1);
                        st = State::Exp1;
                    } else {
                        return finish_int(h, &num);
                    }
                }

                // First fraction digit; required.
                State::Num7 => {
                    if cs.remaining() == 0 {
                        if self.more {
                            return Err(self.incomplete_num(State::Num7, num));
                        }
                        return Err(fail(SyntaxError::Syntax));
                    }
                    if !cs.peek().is_ascii_digit() {
                        return Err(fail(SyntaxError::Syntax));
                    }
                    // not consumed; Num8 accumulates it
                    st = State::Num8;
                }

                // Significant fraction digits, up to 2^53 - 1.
                State::Num8 => loop {
                    if cs.remaining() == 0 {
                        if self.more {
                            return Err(self.incomplete_num(State::Num8, num));
                        }
                        return finish_dub(h, &num);
                    }
                    let c = cs.peek();
                    if c.is_ascii_digit() {
                        cs.advance(1);
                        if num.mant <= 9_007_199_254_740_991 {
                            // 2^53 - 1
                            num.bias -= 1;
                            num.mant = num.mant * 10 + u64::from(c - b'0');
                        } else {
                            st = State::Num5;
                            break;
                        }
                    } else if (c | 0x20) == b'e' {
                        cs.advance(1);
                        st = State::Exp1;
                        break;
                    } else {
                        return finish_dub(h, &num);
                    }
                },

                // Optional exponent sign.
                State::Exp1 => {
                    if cs.remaining() == 0 {
                        return Err(self.incomplete_num(State::Exp1, num));
                    }
                    match cs.peek() {
                        b'+' => cs.advance(1),
                        b'-' => {
                            cs.advance(1);
                            num.frac = true;
                        }
                        _ => {}
                    }
                    st = State::Exp2;
                }

                // First exponent digit; required.
                State::Exp2 => {
                    if cs.remaining() == 0 {
                        if self.more {
                            return Err(self.incomplete_num(State::Exp2, num));
                        }
                        return Err(fail(SyntaxError::Syntax));
                    }
                    let c = cs.peek();
                    if !c.is_ascii_digit() {
                        return Err(fail(SyntaxError::Syntax));
                    }
                    cs.advance(1);
                    num.exp = i32::from(c - b'0');
                    st = State::Exp3;
                }

                // Remaining exponent digits.
                State::Exp3 => loop {
                    if cs.remaining() == 0 {
                        if self.more {
                            return Err(self.incomplete_num(State::Exp3, num));
                        }
                        return finish_dub(h, &num);
                    }
                    let c = cs.peek();
                    if !c.is_ascii_digit() {
                        return finish_dub(h, &num);
                    }
                    let d = i32::from(c - b'0');
                    //              2147483647 == i32::MAX
                    if num.exp > 214_748_364 || (num.exp == 214_748_364 && d > 7) {
                        return Err(fail(SyntaxError::ExponentOverflow));
                    }
                    cs.advance(1);
                    num.exp = num.exp * 10 + d;
                },

                _ => unreachable!("not a number state: {st:?}"),
            }
        }
    }
}

/// Bulk-lex a number when the whole mantissa and fraction fit the window.
/// Returns the state to continue from, or `None` if the number was finished
/// and emitted. Bails back to the per-digit machine whenever precision
/// trimming could kick in, so results match the chunked path bit for bit.
fn number_fast_path<S: EventSink>(
    h: &mut S,
    cs: &mut Cursor<'_>,
    num: &mut Num,
) -> Result<Option<State>, Break<S::Error>> {
    let t = cs.tail();
    let n1;
    if t[0] == b'0' {
        n1 = 0;
        num.mant = 0;
        cs.advance(1);
    } else {
        n1 = scan::count_digits(t);
        if n1 == 0 {
            return Err(fail(SyntaxError::Syntax));
        }
        num.mant = scan::parse_unsigned(0, t, n1);
        cs.advance(n1);
        if n1 == 16 {
            return Ok(Some(State::Num2));
        }
    }
    if cs.peek() != b'.' {
        return Ok(Some(State::Num6));
    }
    let n2 = scan::count_digits(&cs.tail()[1..]);
    if n2 == 0 {
        // first fraction digit required
        cs.advance(1);
        return Err(fail(SyntaxError::Syntax));
    }
    if n1 + n2 >= 17 {
        // the mantissa would cross 2^53; re-enter before the '.' so the
        // per-digit machine applies its trimming rule
        return Ok(Some(State::Num6));
    }
    cs.advance(1);
    num.mant = scan::parse_unsigned(num.mant, cs.tail(), n2);
    num.bias -= n2 as i32;
    cs.advance(n2);
    let c = cs.peek();
    if (c | 0x20) == b'e' {
        cs.advance(1);
        return Ok(Some(State::Exp1));
    }
    if c.is_ascii_digit() {
        return Ok(Some(State::Num8));
    }
    finish_dub(h, num)?;
    Ok(None)
}
