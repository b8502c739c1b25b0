use serde::Serialize;

use crate::definition::{BlockDef, Definition};
use crate::step::TriggerCall;

/// The root of a parsed source file.
/// Produced once per parse call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type")]
pub struct Document {
    /// Comments found at the top level, outside any unit.
    pub comments: Vec<Comment>,
    pub units: Vec<Unit>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.comments.is_empty()
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }
}

/// A top-level named compilation scope: `unit NAME [ ... ]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Unit {
    pub name: String,
    pub comments: Vec<Comment>,
    pub libraries: Vec<Library>,
    pub sprites: Vec<Sprite>,
    pub stages: Vec<Stage>,
}

impl Unit {
    pub fn sprite(&self, name: &str) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.name == name)
    }

    pub fn library(&self, name: &str) -> Option<&Library> {
        self.libraries.iter().find(|l| l.name == name)
    }
}

/// A hued, language-tagged module of reusable definitions:
/// `library NAME hue: (N) language: (TEXT) [ ... ]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct Library {
    pub name: String,
    pub hue: i64,
    /// The host language hosted escapes inside this library are written in.
    pub language: String,
    pub comments: Vec<Comment>,
    /// Not supported by the grammar yet, always empty.
    pub structs: Vec<Placeholder>,
    /// Block, context and trigger definitions, in source order.
    pub block_defs: Vec<Definition>,
}

impl Library {
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.block_defs.iter().find(|d| d.name() == name)
    }
}

/// A visual actor grouping behaviour definitions and event handlers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct Sprite {
    pub name: String,
    pub comments: Vec<Comment>,
    pub block_defs: Vec<BlockDef>,
    pub trigger_calls: Vec<TriggerCall>,
    pub forms: Vec<Placeholder>,
    /// Flattened across every `sounds [ ... ]` block in the sprite.
    pub sounds: Vec<Placeholder>,
    /// Flattened across every `costumes [ ... ]` block in the sprite.
    pub costumes: Vec<Placeholder>,
    pub structs: Vec<Placeholder>,
}

/// The backdrop actor. Accepts the same children as a [`Sprite`]; its
/// header name is optional (`stage [` or `stage NAME [`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct Stage {
    pub name: Option<String>,
    pub comments: Vec<Comment>,
    pub block_defs: Vec<BlockDef>,
    pub trigger_calls: Vec<TriggerCall>,
    pub forms: Vec<Placeholder>,
    pub sounds: Vec<Placeholder>,
    pub costumes: Vec<Placeholder>,
    pub structs: Vec<Placeholder>,
}

/// A `//` line comment or a `/* ... */` block comment.
/// Block comment lines are trimmed and joined with `\n`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Comment {
    pub text: String,
}

/// Content kinds the grammar reserves but does not implement yet
/// (forms, structs, sounds, costumes). Uninhabited, so the collections
/// typed with it are always empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Placeholder {}
