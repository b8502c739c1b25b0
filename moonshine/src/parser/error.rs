use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

use crate::parser::line::Line;

/// Which part of the grammar a [`ParseError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognized or misplaced line, or a container that never closes.
    Structural,
    /// Bad name, parameter, expression or returns clause inside a line.
    NameSyntax,
    /// A library header that does not carry `hue: (n) language: (s)`.
    Metadata,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Structural => write!(f, "structural error"),
            ErrorKind::NameSyntax => write!(f, "name error"),
            ErrorKind::Metadata => write!(f, "metadata error"),
        }
    }
}

/// A fatal parse error. Parsing stops at the first one; no partial tree is returned.
///
/// `span` is a byte range into the whole source, for codespan-reporting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Reported against a whole source line.
    #[error("{kind}: {message} on line {line}: \"{text}\"")]
    Line {
        kind: ErrorKind,
        message: String,
        /// 1-based source line.
        line: usize,
        /// The offending raw line.
        text: String,
        span: Range<usize>,
    },
    /// Reported against a character inside the text handed to the name parser.
    #[error("{kind}: {message} on line {line} at index {index}:\n\"{text}\"\n{}", caret(.index))]
    Char {
        kind: ErrorKind,
        message: String,
        line: usize,
        /// The text that was being scanned.
        text: String,
        /// Character (not byte) index into `text`.
        index: usize,
        span: Range<usize>,
    },
}

/// A caret under character `index` of a string printed inside quotes.
fn caret(index: &usize) -> String {
    format!("{}^", " ".repeat(index + 1))
}

impl ParseError {
    pub fn line(kind: ErrorKind, message: impl Into<String>, line: &Line<'_>) -> Self {
        ParseError::Line {
            kind,
            message: message.into(),
            line: line.number,
            text: line.text.to_string(),
            span: line.span(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Line { kind, .. } | ParseError::Char { kind, .. } => *kind,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::Line { message, .. } | ParseError::Char { message, .. } => message,
        }
    }

    /// The 1-based source line the error was raised on.
    pub fn line_number(&self) -> usize {
        match self {
            ParseError::Line { line, .. } | ParseError::Char { line, .. } => *line,
        }
    }

    /// The character index, present only for character-level errors.
    pub fn index(&self) -> Option<usize> {
        match self {
            ParseError::Line { .. } => None,
            ParseError::Char { index, .. } => Some(*index),
        }
    }

    pub fn span(&self) -> Range<usize> {
        match self {
            ParseError::Line { span, .. } | ParseError::Char { span, .. } => span.clone(),
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        let label = match self {
            ParseError::Line { .. } => Label::primary(file_id, self.span()),
            ParseError::Char { index, .. } => {
                Label::primary(file_id, self.span()).with_message(format!("index {}", index))
            }
        };
        Diagnostic::error()
            .with_message(format!("{}: {}", self.kind(), self.message()))
            .with_labels(vec![label])
    }
}

/// A character-level failure raised while scanning a single piece of text.
/// It has no idea which source line it came from until [`NameError::at_line`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("name error: {message} at index {index}:\n\"{text}\"\n{}", caret(.index))]
pub struct NameError {
    pub message: String,
    pub text: String,
    pub index: usize,
}

impl NameError {
    pub fn new(text: &str, index: usize, message: impl Into<String>) -> Self {
        NameError {
            message: message.into(),
            text: text.to_string(),
            index,
        }
    }

    /// Attach the source line the scanned text was taken from.
    pub fn at_line(self, line: &Line<'_>) -> ParseError {
        let span = match line.text.find(self.text.as_str()) {
            Some(offset) if !self.text.is_empty() => {
                let (byte, width) = self
                    .text
                    .char_indices()
                    .nth(self.index)
                    .map(|(b, c)| (b, c.len_utf8()))
                    .unwrap_or((self.text.len(), 0));
                let start = line.start + offset + byte;
                start..start + width
            }
            _ => line.span(),
        };
        ParseError::Char {
            kind: ErrorKind::NameSyntax,
            message: self.message,
            line: line.number,
            text: self.text,
            index: self.index,
            span,
        }
    }
}
