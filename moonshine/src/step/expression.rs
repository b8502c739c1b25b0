use serde::Serialize;

/// An argument expression at a call site. Always written in parentheses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Expression {
    /// `(1)`, `(0.5)`, `(-3)`
    Number(f64),
    /// `(Game Over)`, `((a) + (b))`
    BlockCall(BlockCall),
}

impl Expression {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expression::Number(n) => Some(*n),
            Expression::BlockCall(_) => None,
        }
    }

    pub fn as_block_call(&self) -> Option<&BlockCall> {
        match self {
            Expression::BlockCall(call) => Some(call),
            Expression::Number(_) => None,
        }
    }
}

/// A value-producing call nested inside an argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockCall {
    /// Canonical name with one `()` per argument, e.g. `() = ()`.
    pub name: String,
    pub args: Vec<Expression>,
}
