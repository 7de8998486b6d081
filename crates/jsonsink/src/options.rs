//! Configuration options for the push parser.

/// Configuration for [`PushParser`](crate::PushParser).
///
/// # Examples
///
/// ```rust
/// use jsonsink::{ParserOptions, PushParser};
///
/// let parser = PushParser::new(ParserOptions {
///     max_depth: 64,
///     ..Default::default()
/// });
/// # let _ = parser;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum allowed nesting depth of arrays and objects.
    ///
    /// Exceeding it fails the parse with
    /// [`SyntaxError::TooDeep`](crate::SyntaxError::TooDeep). The suspension
    /// stack is sized from this bound, so memory use is `O(max_depth)`
    /// regardless of input length.
    ///
    /// # Default
    ///
    /// `32`
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}
