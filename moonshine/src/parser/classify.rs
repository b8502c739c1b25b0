use once_cell::sync::Lazy;
use regex::Regex;

/// The structural role of a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCategory {
    Whitespace,
    Comment,
    Unit,
    Library,
    Sprite,
    Stage,
    Costumes,
    Sounds,
    /// `hosted [@` or `hosted returns NAME:TYPE [@`
    Hosted,
    ContextDef,
    TriggerDef,
    BlockDef,
    TriggerCall,
    /// Any other line ending in `[`.
    ContextCall,
    /// Any other non-empty line.
    StepCall,
}

impl LineCategory {
    /// Human-readable node name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            LineCategory::Whitespace => "blank line",
            LineCategory::Comment => "comment",
            LineCategory::Unit => "unit",
            LineCategory::Library => "library",
            LineCategory::Sprite => "sprite",
            LineCategory::Stage => "stage",
            LineCategory::Costumes => "costumes",
            LineCategory::Sounds => "sounds",
            LineCategory::Hosted => "hosted block",
            LineCategory::ContextDef => "context definition",
            LineCategory::TriggerDef => "trigger definition",
            LineCategory::BlockDef => "block definition",
            LineCategory::TriggerCall => "trigger",
            LineCategory::ContextCall => "context call",
            LineCategory::StepCall => "step",
        }
    }
}

/// A parenthesized parameter whose type is `BlockList`.
static BLOCK_LIST_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*[^()\[\]:]+:\s*BlockList\s*\)").expect("valid regex"));

/// Keywords whose lines should never reach the call fallbacks in strict mode.
pub(crate) const RESERVED_KEYWORDS: &[&str] = &[
    "unit", "library", "sprite", "stage", "define", "when", "hosted", "sounds", "costumes",
];

/// Classify one line. The first matching predicate wins, so the order
/// below runs from most to least specific; the two call fallbacks come last.
///
/// A keyword line that is malformed (e.g. `define foo` with no `[`) is not
/// rejected here: it falls through to [`LineCategory::ContextCall`] or
/// [`LineCategory::StepCall`]. Strict parsing reports these separately.
pub fn classify(line: &str) -> LineCategory {
    let line = line.trim();

    if is_whitespace(line) {
        LineCategory::Whitespace
    } else if is_comment(line) {
        LineCategory::Comment
    } else if is_unit(line) {
        LineCategory::Unit
    } else if is_library(line) {
        LineCategory::Library
    } else if is_sprite(line) {
        LineCategory::Sprite
    } else if is_stage(line) {
        LineCategory::Stage
    } else if is_costumes(line) {
        LineCategory::Costumes
    } else if is_sounds(line) {
        LineCategory::Sounds
    } else if is_hosted(line) {
        LineCategory::Hosted
    } else if is_context_def(line) {
        LineCategory::ContextDef
    } else if is_trigger_def(line) {
        LineCategory::TriggerDef
    } else if is_block_def(line) {
        LineCategory::BlockDef
    } else if is_trigger_call(line) {
        LineCategory::TriggerCall
    } else if is_context_call(line) {
        LineCategory::ContextCall
    } else {
        LineCategory::StepCall
    }
}

pub fn is_whitespace(line: &str) -> bool {
    line.trim().is_empty()
}

/// Only whole-line comments are recognized; a trailing `//` after code is not a comment.
pub fn is_comment(line: &str) -> bool {
    let line = line.trim();
    line.starts_with("//") || line.starts_with("/*")
}

/// `keyword NAME [`, with at least one space after the keyword.
fn is_named_container(line: &str, keyword: &str) -> bool {
    line.strip_prefix(keyword)
        .is_some_and(|rest| rest.starts_with(' '))
        && line.ends_with('[')
}

/// `keyword [` or `keyword NAME [`: the keyword must end at whitespace or the bracket.
fn is_keyword_container(line: &str, keyword: &str, close: &str) -> bool {
    starts_with_keyword(line, keyword) && line.ends_with(close)
}

/// True when `line` begins with `keyword` as a whole word.
pub(crate) fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    match line.strip_prefix(keyword) {
        Some(rest) => rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == '['),
        None => false,
    }
}

pub fn is_unit(line: &str) -> bool {
    is_named_container(line.trim(), "unit")
}

pub fn is_library(line: &str) -> bool {
    is_named_container(line.trim(), "library")
}

pub fn is_sprite(line: &str) -> bool {
    is_named_container(line.trim(), "sprite")
}

pub fn is_stage(line: &str) -> bool {
    is_keyword_container(line.trim(), "stage", "[")
}

pub fn is_costumes(line: &str) -> bool {
    is_keyword_container(line.trim(), "costumes", "[")
}

pub fn is_sounds(line: &str) -> bool {
    is_keyword_container(line.trim(), "sounds", "[")
}

pub fn is_hosted(line: &str) -> bool {
    is_keyword_container(line.trim(), "hosted", "[@")
}

pub fn is_context_def(line: &str) -> bool {
    let line = line.trim();
    is_named_container(line, "define context") && BLOCK_LIST_PARAM.is_match(line)
}

pub fn is_trigger_def(line: &str) -> bool {
    let line = line.trim();
    is_named_container(line, "define trigger") && BLOCK_LIST_PARAM.is_match(line)
}

pub fn is_block_def(line: &str) -> bool {
    is_named_container(line.trim(), "define")
}

pub fn is_trigger_call(line: &str) -> bool {
    is_named_container(line.trim(), "when")
}

/// Must be checked after every keyword container.
pub fn is_context_call(line: &str) -> bool {
    line.trim().ends_with('[')
}
