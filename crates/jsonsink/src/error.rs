//! Parse errors.
//!
//! Errors are terminal for the current document: the parser makes no attempt
//! at recovery, and only [`reset`](crate::PushParser::reset) returns an
//! errored instance to service. Errors returned by the sink are propagated
//! verbatim inside [`ErrorSource::Sink`].

use thiserror::Error;

/// An error produced by [`write_some`](crate::PushParser::write_some) and
/// friends. Carries the number of bytes accepted before the failure.
#[derive(Error, Debug, PartialEq)]
#[error("{reason} (after {consumed} bytes)")]
pub struct ParseError<E> {
    pub(crate) reason: ErrorSource<E>,
    pub(crate) consumed: usize,
}

impl<E> ParseError<E> {
    pub(crate) fn syntax(err: SyntaxError, consumed: usize) -> Self {
        Self {
            reason: ErrorSource::Syntax(err),
            consumed,
        }
    }

    /// What went wrong.
    pub fn source(&self) -> &ErrorSource<E> {
        &self.reason
    }

    /// Bytes of the chunk accepted before the failure.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// True if the final chunk ended mid-token.
    pub fn is_incomplete(&self) -> bool {
        matches!(self.reason, ErrorSource::Syntax(SyntaxError::Incomplete))
    }
}

/// Distinguishes the parser's own failures from errors the sink returned.
#[derive(Error, Debug, PartialEq)]
pub enum ErrorSource<E> {
    /// An error returned by an [`EventSink`](crate::EventSink) handler,
    /// unchanged.
    #[error("sink error: {0}")]
    Sink(E),
    /// A failure detected by the parser itself.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// The parser's error taxonomy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxError {
    /// Malformed token.
    #[error("syntax error")]
    Syntax,
    /// Non-hex digit inside a `\uXXXX` escape.
    #[error("expected hex digit")]
    ExpectedHexDigit,
    /// High surrogate without a matching low surrogate.
    #[error("illegal leading surrogate")]
    IllegalLeadingSurrogate,
    /// Standalone or out-of-range low surrogate.
    #[error("illegal trailing surrogate")]
    IllegalTrailingSurrogate,
    /// Decimal exponent does not fit a 32-bit integer.
    #[error("exponent overflow")]
    ExponentOverflow,
    /// The final chunk ended in the middle of a token or document.
    #[error("incomplete JSON document")]
    Incomplete,
    /// Nesting exceeded the configured maximum depth.
    #[error("maximum nesting depth exceeded")]
    TooDeep,
    /// Bytes other than trailing whitespace followed a complete document
    /// passed to [`write`](crate::PushParser::write).
    #[error("extra data after JSON document")]
    ExtraData,
}
