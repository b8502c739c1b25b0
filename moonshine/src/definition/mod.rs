use serde::Serialize;

use crate::document::Comment;
use crate::step::Step;

/// Any definition that may appear in a library body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Definition {
    Block(BlockDef),
    Context(ContextDef),
    Trigger(TriggerDef),
}

impl Definition {
    /// The canonical (placeholder-form) name of the definition.
    pub fn name(&self) -> &str {
        match self {
            Definition::Block(def) => &def.name,
            Definition::Context(def) => &def.name,
            Definition::Trigger(def) => &def.name,
        }
    }

    pub fn params(&self) -> &[Parameter] {
        match self {
            Definition::Block(def) => &def.params,
            Definition::Context(def) => &def.params,
            Definition::Trigger(def) => &def.params,
        }
    }

    pub fn steps(&self) -> &[Step] {
        match self {
            Definition::Block(def) => &def.steps,
            Definition::Context(def) => &def.steps,
            Definition::Trigger(def) => &def.steps,
        }
    }

    /// Trigger definitions are fire-and-forget and never return.
    pub fn returns(&self) -> Option<&Returns> {
        match self {
            Definition::Block(def) => def.returns.as_ref(),
            Definition::Context(def) => def.returns.as_ref(),
            Definition::Trigger(_) => None,
        }
    }
}

/// Definition of a callable step or value block: `define NAME [ ... ]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct BlockDef {
    /// Canonical name, e.g. `wait () seconds`.
    pub name: String,
    pub params: Vec<Parameter>,
    pub steps: Vec<Step>,
    pub returns: Option<Returns>,
    pub comments: Vec<Comment>,
}

/// Definition of a control structure that takes nested block lists:
/// `define context NAME (slot:BlockList) [ ... ]`.
/// Contexts are never called directly; they give [`crate::step::ContextCall`]s their shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ContextDef {
    pub name: String,
    pub params: Vec<Parameter>,
    pub blocklists: Vec<Parameter>,
    pub steps: Vec<Step>,
    pub returns: Option<Returns>,
    pub comments: Vec<Comment>,
}

/// Definition of a system-invoked event handler shape:
/// `define trigger NAME (slot:BlockList) [ ... ]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct TriggerDef {
    pub name: String,
    pub params: Vec<Parameter>,
    pub blocklists: Vec<Parameter>,
    pub steps: Vec<Step>,
    pub comments: Vec<Comment>,
}

/// A typed slot in a definition signature, `(name:Type)`.
/// Serialized as a plain `{ name, type }` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

impl Parameter {
    /// The reserved type marking a slot that holds steps rather than a value.
    pub const BLOCK_LIST: &'static str = "BlockList";

    pub fn is_block_list(&self) -> bool {
        self.param_type == Self::BLOCK_LIST
    }
}

/// A typed return clause, `returns name:Type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Returns {
    pub name: String,
    #[serde(rename = "type")]
    pub return_type: String,
}
