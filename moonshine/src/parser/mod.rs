pub mod classify;
pub mod error;
pub mod expression;
pub mod hosted;
pub mod line;
mod structural;

pub use classify::{LineCategory, classify};
pub use error::{ErrorKind, NameError, ParseError};

use tracing::debug;

use crate::Document;
use crate::parser::line::LineCursor;

/// Deepest allowed nesting of parenthesized argument groups within a line,
/// and of context calls within a body.
pub const MAX_NESTING: usize = 128;

/// Knobs that change how strictly source is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Reject keyword lines (`define ...`, `when ...`) that are malformed
    /// enough to fall through to the call fallbacks, instead of reading
    /// them as context or step calls.
    pub strict: bool,
}

/// Parser entry point.
///
/// Holds only the source and options; every [`Parser::parse`] call walks a
/// fresh cursor, so one parser may be reused or shared across threads.
pub struct Parser {
    source: String,
    options: ParserOptions,
}

impl Parser {
    pub fn new(source: String) -> Self {
        Parser::with_options(source, ParserOptions::default())
    }

    pub fn with_options(source: String, options: ParserOptions) -> Self {
        Parser { source, options }
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Parse the whole source into a Document, stopping at the first error.
    pub fn parse(&self) -> Result<Document, ParseError> {
        let mut cursor = LineCursor::new(&self.source);
        structural::parse_document(&mut cursor, &self.options)
            .inspect_err(|err| debug!(line = err.line_number(), "parse failed: {}", err))
    }
}
