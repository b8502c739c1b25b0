use once_cell::sync::Lazy;
use regex::Regex;

use crate::definition::{Parameter, Returns};
use crate::parser::MAX_NESTING;
use crate::parser::error::NameError;
use crate::step::expression::{BlockCall, Expression};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A parsed definition signature.
#[derive(Debug, Clone, PartialEq)]
pub struct NameDef {
    /// Canonical name with one `()` per ordinary parameter.
    pub name: String,
    pub params: Vec<Parameter>,
    pub blocklists: Vec<Parameter>,
}

/// A parsed call site: canonical name plus one argument per `()`.
#[derive(Debug, Clone, PartialEq)]
pub struct NameCall {
    pub name: String,
    pub args: Vec<Expression>,
}

/// Parse a definition signature such as `wait (seconds:Number) seconds`.
///
/// Ordinary parameters leave a `()` seam between the literal parts around
/// them. `BlockList` parameters leave none: the parts on either side merge,
/// so `loop over (list:L) (action:BlockList)` becomes `loop over ()`.
pub fn name_def(text: &str) -> Result<NameDef, NameError> {
    let mut scanner = NameScanner::new(text);
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut params = Vec::new();
    let mut blocklists = Vec::new();

    while let Some(c) = scanner.peek() {
        match c {
            '[' => return Err(scanner.error("illegal open bracket")),
            ')' => return Err(scanner.error("illegal close parens")),
            '(' => {
                let param = scanner.parameter()?;
                if param.is_block_list() {
                    // no seam: the next literal part continues this one
                    blocklists.push(param);
                } else {
                    parts.push(std::mem::take(&mut current));
                    params.push(param);
                }
            }
            _ => {
                current.push(c);
                scanner.bump();
            }
        }
    }
    parts.push(current);

    let name = normalize_name(&parts.join("()"));
    if name.is_empty() {
        return Err(NameError::new(text, 0, "a definition needs a name"));
    }
    if is_number(&name) {
        return Err(NameError::new(text, 0, "a number cannot be used as a name"));
    }

    Ok(NameDef {
        name,
        params,
        blocklists,
    })
}

/// Parse a call site such as `repeat until ((Game Over) = (1))`.
/// Every parenthesized group is a full, possibly nested, expression.
pub fn name_call(text: &str) -> Result<NameCall, NameError> {
    if text.trim().is_empty() {
        return Err(NameError::new(text, 0, "a name cannot be empty or only whitespace"));
    }
    if is_number(text) {
        return Err(NameError::new(text, 0, "a number cannot be used as a name"));
    }

    let mut scanner = NameScanner::new(text);
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut args = Vec::new();

    while let Some(c) = scanner.peek() {
        match c {
            '(' => {
                parts.push(std::mem::take(&mut current));
                args.push(scanner.expression(1)?);
            }
            '[' => return Err(scanner.error("illegal open bracket")),
            ')' => return Err(scanner.error("illegal close parens")),
            _ => {
                current.push(c);
                scanner.bump();
            }
        }
    }
    parts.push(current);

    Ok(NameCall {
        name: normalize_name(&parts.join("()")),
        args,
    })
}

/// A plain name: no brackets, parentheses or colons, not blank, not a
/// number. Returned trimmed.
pub fn simple_name(text: &str) -> Result<String, NameError> {
    if text.is_empty() {
        return Err(NameError::new(text, 0, "a name cannot be empty"));
    }
    if text.trim().is_empty() {
        return Err(NameError::new(text, 0, "a name cannot be only whitespace"));
    }
    if is_number(text) {
        return Err(NameError::new(text, 0, "a number cannot be used as a name"));
    }
    if let Some(index) = text.chars().position(|c| matches!(c, '(' | ')' | '[' | ']' | ':')) {
        return Err(NameError::new(
            text,
            index,
            "a name cannot contain square brackets, parentheses, or colons",
        ));
    }
    Ok(text.trim().to_string())
}

static RETURNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^returns\s+(.+):(.+)$").expect("valid regex"));

/// Parse `returns NAME:TYPE`. `block` names the definition for the diagnostic.
pub fn returns(text: &str, block: &str) -> Result<Returns, NameError> {
    let malformed =
        || NameError::new(text, 0, format!("problem parsing returns for block definition \"{}\"", block));

    let captures = RETURNS.captures(text.trim()).ok_or_else(malformed)?;
    let name = simple_name(&captures[1]).map_err(|_| malformed())?;
    let return_type = simple_name(&captures[2]).map_err(|_| malformed())?;
    Ok(Returns { name, return_type })
}

/// True when the whole text is a finite number, e.g. `1`, ` 0.5 `, `-3`.
pub fn is_number(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Strip leading/trailing whitespace and collapse interior runs to one space.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Character scanner
// ---------------------------------------------------------------------------

struct NameScanner<'t> {
    text: &'t str,
    chars: Vec<char>,
    pos: usize,
}

impl<'t> NameScanner<'t> {
    fn new(text: &'t str) -> Self {
        NameScanner {
            text,
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn error(&self, msg: impl Into<String>) -> NameError {
        NameError::new(self.text, self.pos, msg)
    }

    fn error_at(&self, index: usize, msg: impl Into<String>) -> NameError {
        NameError::new(self.text, index, msg)
    }

    /// `(name:Type)`, starting on the open paren. Leaves the scanner past the close.
    fn parameter(&mut self) -> Result<Parameter, NameError> {
        let open = self.pos;
        if self.peek() != Some('(') {
            return Err(self.error("a parameter must begin with \"(\""));
        }
        self.bump();

        let mut name = String::new();
        let mut param_type = String::new();
        let mut in_type = false;

        while let Some(c) = self.peek() {
            match c {
                '(' => return Err(self.error("illegal open parens")),
                '[' => return Err(self.error("illegal open bracket")),
                ':' if in_type => return Err(self.error("a parameter takes a single colon")),
                ':' => {
                    in_type = true;
                    self.bump();
                }
                ')' => {
                    self.bump();
                    let name = name.trim();
                    let param_type = param_type.trim();
                    if name.is_empty() || param_type.is_empty() {
                        return Err(self.error_at(open, "a parameter needs both a name and a type"));
                    }
                    return Ok(Parameter {
                        name: name.to_string(),
                        param_type: param_type.to_string(),
                    });
                }
                _ => {
                    if in_type {
                        param_type.push(c);
                    } else {
                        name.push(c);
                    }
                    self.bump();
                }
            }
        }

        Err(self.error("missing close parens"))
    }

    /// A parenthesized expression, starting on the open paren. Either a
    /// number, or a block call whose `()` seams hold nested expressions.
    /// `depth` counts the groups open around this one, itself included.
    fn expression(&mut self, depth: usize) -> Result<Expression, NameError> {
        let open = self.pos;
        if self.peek() != Some('(') {
            return Err(self.error("an expression must begin with \"(\""));
        }
        if depth > MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        self.bump();

        let mut parts: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut args = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                ')' => {
                    self.bump();
                    parts.push(current);
                    return self.finish_group(open, parts, args);
                }
                '(' => {
                    parts.push(std::mem::take(&mut current));
                    args.push(self.expression(depth + 1)?);
                }
                '[' => return Err(self.error("illegal open bracket")),
                _ => {
                    current.push(c);
                    self.bump();
                }
            }
        }

        Err(self.error("missing close parens"))
    }

    fn finish_group(
        &self,
        open: usize,
        parts: Vec<String>,
        args: Vec<Expression>,
    ) -> Result<Expression, NameError> {
        if let [only] = parts.as_slice() {
            if is_number(only) {
                let value = only.trim().parse::<f64>().map_err(|_| {
                    self.error_at(open, "invalid number")
                })?;
                return Ok(Expression::Number(value));
            }
            if only.trim().is_empty() {
                return Err(self.error_at(open, "an expression cannot be empty"));
            }
        }
        Ok(Expression::BlockCall(BlockCall {
            name: normalize_name(&parts.join("()")),
            args,
        }))
    }
}
