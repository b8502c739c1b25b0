use tracing::trace;

use crate::parser::error::{ErrorKind, ParseError};
use crate::parser::expression;
use crate::parser::line::{Line, LineCursor};
use crate::step::{Hosted, HostedNoReturns, Step};

/// Opens an escape when it ends a `hosted` header line.
pub const OPEN: &str = "[@";
/// Closes an escape when it is the only thing on a line.
pub const TERMINATOR: &str = "@]";

/// Read a hosted escape whose header is `header`, inside the definition
/// named `block`.
///
/// Lines up to the terminator are copied verbatim: no classification, no
/// trimming, blank lines kept. The cursor is left on the terminator line.
pub fn parse_hosted<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    block: &str,
) -> Result<Step, ParseError> {
    let clause = header
        .trimmed()
        .strip_prefix("hosted")
        .and_then(|rest| rest.strip_suffix(OPEN))
        .map(str::trim)
        .unwrap_or_default();

    let returns = if clause.is_empty() {
        None
    } else {
        Some(expression::returns(clause, block).map_err(|e| e.at_line(&header))?)
    };

    let mut code: Vec<&str> = Vec::new();
    loop {
        let Some(line) = cursor.advance() else {
            return Err(ParseError::line(
                ErrorKind::Structural,
                format!("unterminated hosted block, no closing \"{}\" found", TERMINATOR),
                &header,
            ));
        };
        if line.trimmed() == TERMINATOR {
            break;
        }
        code.push(line.text);
    }

    trace!(line = header.number, lines = code.len(), "read hosted escape");

    let code = code.join("\n");
    Ok(match returns {
        Some(returns) => Step::Hosted(Hosted { returns, code }),
        None => Step::HostedNoReturns(HostedNoReturns { code }),
    })
}
