pub mod expression;

use serde::Serialize;

use crate::definition::Returns;
use crate::document::Comment;
use crate::step::expression::Expression;

/// A single entry in a `steps` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Step {
    Call(StepCall),
    Context(ContextCall),
    Hosted(Hosted),
    HostedNoReturns(HostedNoReturns),
}

impl Step {
    /// The call name, or `None` for hosted escapes.
    pub fn name(&self) -> Option<&str> {
        match self {
            Step::Call(call) => Some(&call.name),
            Step::Context(call) => Some(&call.name),
            Step::Hosted(_) | Step::HostedNoReturns(_) => None,
        }
    }

    pub fn args(&self) -> &[Expression] {
        match self {
            Step::Call(call) => &call.args,
            Step::Context(call) => &call.args,
            Step::Hosted(_) | Step::HostedNoReturns(_) => &[],
        }
    }
}

/// A concrete event handler instance: `when EVENT [ ... ]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct TriggerCall {
    /// The raw event name, e.g. `I receive (Bounce)`.
    pub name: String,
    pub steps: Vec<Step>,
    pub comments: Vec<Comment>,
}

/// Invocation of a context block carrying nested child steps: `NAME [ ... ]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ContextCall {
    pub name: String,
    pub args: Vec<Expression>,
    pub steps: Vec<Step>,
    pub comments: Vec<Comment>,
}

/// Leaf invocation of a named operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct StepCall {
    pub name: String,
    pub args: Vec<Expression>,
}

/// Host-language source embedded as a definition's implementation,
/// with a declared return slot: `hosted returns NAME:TYPE [@ ... @]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Hosted {
    pub returns: Returns,
    /// Raw lines between the markers, newline-joined, whitespace untouched.
    pub code: String,
}

/// Host-language source with no return slot: `hosted [@ ... @]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct HostedNoReturns {
    pub code: String,
}
