pub mod definition;
pub mod document;
pub mod parser;
pub mod step;

pub use crate::definition::{BlockDef, ContextDef, Definition, Parameter, Returns, TriggerDef};
pub use crate::document::{Comment, Document, Library, Placeholder, Sprite, Stage, Unit};
pub use crate::parser::{ErrorKind, ParseError, Parser, ParserOptions};
pub use crate::step::expression::{BlockCall, Expression};
pub use crate::step::{ContextCall, Hosted, HostedNoReturns, Step, StepCall, TriggerCall};

/// Parse source text with default options.
pub fn parse(text: &str) -> Result<Document, ParseError> {
    Parser::new(text.to_string()).parse()
}
