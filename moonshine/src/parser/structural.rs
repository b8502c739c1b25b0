use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::definition::{BlockDef, ContextDef, Definition, Returns, TriggerDef};
use crate::document::{Comment, Document, Library, Placeholder, Sprite, Stage, Unit};
use crate::parser::{MAX_NESTING, ParserOptions};
use crate::parser::classify::{self, LineCategory, RESERVED_KEYWORDS};
use crate::parser::error::{ErrorKind, NameError, ParseError};
use crate::parser::expression::{self, NameDef};
use crate::parser::hosted;
use crate::parser::line::{Line, LineCursor};
use crate::step::{ContextCall, Step, StepCall, TriggerCall};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse every line under `cursor` into a Document.
/// The top level holds only blank lines, comments and units.
pub fn parse_document(
    cursor: &mut LineCursor<'_>,
    options: &ParserOptions,
) -> Result<Document, ParseError> {
    let mut document = Document::default();

    while let Some(line) = cursor.current() {
        match categorize(line, options)? {
            LineCategory::Whitespace => {}
            LineCategory::Comment => document.comments.push(parse_comment(cursor, line)?),
            LineCategory::Unit => document.units.push(parse_unit(cursor, line, options)?),
            other => return Err(not_permitted(line, other, "file")),
        }
        cursor.advance();
    }

    Ok(document)
}

// ---------------------------------------------------------------------------
// Line dispatch
// ---------------------------------------------------------------------------

/// Classify a line, and in strict mode refuse keyword lines that only
/// matched one of the call fallbacks.
fn categorize(line: Line<'_>, options: &ParserOptions) -> Result<LineCategory, ParseError> {
    let category = classify::classify(line.text);
    if options.strict && matches!(category, LineCategory::ContextCall | LineCategory::StepCall) {
        let trimmed = line.trimmed();
        if let Some(keyword) = RESERVED_KEYWORDS
            .iter()
            .find(|kw| classify::starts_with_keyword(trimmed, kw))
        {
            return Err(ParseError::line(
                ErrorKind::Structural,
                format!("malformed {} header", keyword),
                &line,
            ));
        }
    }
    Ok(category)
}

fn not_permitted(line: Line<'_>, category: LineCategory, parent: &str) -> ParseError {
    let message = match category {
        LineCategory::StepCall | LineCategory::ContextCall => {
            format!("unrecognized line inside {}", parent)
        }
        other => format!("{} not permitted inside {}", other.describe(), parent),
    };
    ParseError::line(ErrorKind::Structural, message, &line)
}

/// Walk the body of the container whose header is `header`, handing each
/// non-blank line to `child` until a line accepted by `is_close`.
/// Returns that closing line; the cursor is left parked on it.
fn parse_body<'a>(
    cursor: &mut LineCursor<'a>,
    options: &ParserOptions,
    header: Line<'a>,
    what: &str,
    is_close: impl Fn(&str) -> bool,
    mut child: impl FnMut(&mut LineCursor<'a>, Line<'a>, LineCategory) -> Result<(), ParseError>,
) -> Result<Line<'a>, ParseError> {
    loop {
        let Some(line) = cursor.advance() else {
            return Err(ParseError::line(
                ErrorKind::Structural,
                format!("unterminated {}, no closing \"]\" found", what),
                &header,
            ));
        };
        if is_close(line.trimmed()) {
            return Ok(line);
        }
        match categorize(line, options)? {
            LineCategory::Whitespace => {}
            category => child(cursor, line, category)?,
        }
    }
}

fn is_bracket_close(line: &str) -> bool {
    line == "]"
}

/// Definitions may carry a returns clause on their closing line: `] returns x:T`.
fn is_definition_close(line: &str) -> bool {
    line.starts_with(']')
}

/// The text between a header keyword and the trailing `[`.
fn header_text<'a>(line: &Line<'a>, keyword: &str) -> &'a str {
    let trimmed = line.trimmed();
    let rest = trimmed.strip_prefix(keyword).unwrap_or(trimmed);
    rest.strip_suffix('[').unwrap_or(rest).trim()
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// `// text`, or `/* ... */` spanning one or more lines.
fn parse_comment<'a>(cursor: &mut LineCursor<'a>, line: Line<'a>) -> Result<Comment, ParseError> {
    let trimmed = line.trimmed();
    if let Some(text) = trimmed.strip_prefix("//") {
        return Ok(Comment {
            text: text.trim().to_string(),
        });
    }

    let mut pieces: Vec<&str> = Vec::new();
    let mut current = trimmed.strip_prefix("/*").unwrap_or(trimmed).trim();
    loop {
        if let Some(last) = current.strip_suffix("*/") {
            let last = last.trim();
            if !last.is_empty() || pieces.is_empty() {
                pieces.push(last);
            }
            break;
        }
        if !current.is_empty() || !pieces.is_empty() {
            pieces.push(current);
        }
        current = match cursor.advance() {
            Some(next) => next.trimmed(),
            None => {
                return Err(ParseError::line(
                    ErrorKind::Structural,
                    "unterminated comment, no closing \"*/\" found",
                    &line,
                ));
            }
        };
    }

    Ok(Comment {
        text: pieces.join("\n"),
    })
}

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

fn parse_unit<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
) -> Result<Unit, ParseError> {
    let name = expression::simple_name(header_text(&header, "unit")).map_err(|e| e.at_line(&header))?;
    debug!(unit = %name, line = header.number, "parsing unit");

    let mut comments = Vec::new();
    let mut libraries = Vec::new();
    let mut sprites = Vec::new();
    let mut stages = Vec::new();

    parse_body(cursor, options, header, "unit", is_bracket_close, |cursor, line, category| {
        match category {
            LineCategory::Comment => comments.push(parse_comment(cursor, line)?),
            LineCategory::Library => libraries.push(parse_library(cursor, line, options)?),
            LineCategory::Sprite => sprites.push(parse_sprite(cursor, line, options)?),
            LineCategory::Stage => stages.push(parse_stage(cursor, line, options)?),
            other => return Err(not_permitted(line, other, "unit")),
        }
        Ok(())
    })?;

    Ok(Unit {
        name,
        comments,
        libraries,
        sprites,
        stages,
    })
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

static LIBRARY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^library\s+(?P<name>.+?)\s+hue:\s*\((?P<hue>[^)]*)\)\s*language:\s*\((?P<language>[^)]*)\)\s*\[$",
    )
    .expect("valid regex")
});

fn parse_library<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
) -> Result<Library, ParseError> {
    let metadata_error = |message: &str| ParseError::line(ErrorKind::Metadata, message, &header);

    let captures = LIBRARY_HEADER.captures(header.trimmed()).ok_or_else(|| {
        metadata_error("library header must have the shape \"library NAME hue: (N) language: (TEXT) [\"")
    })?;
    let name = expression::simple_name(&captures["name"]).map_err(|e| e.at_line(&header))?;
    let hue = captures["hue"]
        .trim()
        .parse::<i64>()
        .map_err(|_| metadata_error("library hue must be an integer"))?;
    let language = captures["language"].trim().to_string();
    if language.is_empty() {
        return Err(metadata_error("library language cannot be empty"));
    }
    debug!(library = %name, hue, language = %language, line = header.number, "parsing library");

    let mut comments = Vec::new();
    let mut block_defs = Vec::new();

    parse_body(cursor, options, header, "library", is_bracket_close, |cursor, line, category| {
        match category {
            LineCategory::Comment => comments.push(parse_comment(cursor, line)?),
            LineCategory::BlockDef => {
                block_defs.push(Definition::Block(parse_block_def(cursor, line, options)?))
            }
            LineCategory::ContextDef => {
                block_defs.push(Definition::Context(parse_context_def(cursor, line, options)?))
            }
            LineCategory::TriggerDef => {
                block_defs.push(Definition::Trigger(parse_trigger_def(cursor, line, options)?))
            }
            other => return Err(not_permitted(line, other, "library")),
        }
        Ok(())
    })?;

    Ok(Library {
        name,
        hue,
        language,
        comments,
        structs: Vec::new(),
        block_defs,
    })
}

// ---------------------------------------------------------------------------
// Sprite / Stage
// ---------------------------------------------------------------------------

/// The children shared by sprites and stages.
#[derive(Default)]
struct ActorBody {
    comments: Vec<Comment>,
    block_defs: Vec<BlockDef>,
    trigger_calls: Vec<TriggerCall>,
    sounds: Vec<Placeholder>,
    costumes: Vec<Placeholder>,
}

fn parse_actor_body<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
    what: &str,
) -> Result<ActorBody, ParseError> {
    let mut body = ActorBody::default();

    parse_body(cursor, options, header, what, is_bracket_close, |cursor, line, category| {
        match category {
            LineCategory::Comment => body.comments.push(parse_comment(cursor, line)?),
            // every sounds/costumes block feeds one collection; their comments are dropped
            LineCategory::Sounds => body.sounds.extend(parse_placeholder_block(cursor, line, options, "sounds")?),
            LineCategory::Costumes => {
                body.costumes.extend(parse_placeholder_block(cursor, line, options, "costumes")?)
            }
            LineCategory::TriggerCall => body.trigger_calls.push(parse_trigger_call(cursor, line, options)?),
            LineCategory::BlockDef => body.block_defs.push(parse_block_def(cursor, line, options)?),
            other => return Err(not_permitted(line, other, what)),
        }
        Ok(())
    })?;

    Ok(body)
}

fn parse_sprite<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
) -> Result<Sprite, ParseError> {
    let name = expression::simple_name(header_text(&header, "sprite")).map_err(|e| e.at_line(&header))?;
    debug!(sprite = %name, line = header.number, "parsing sprite");

    let body = parse_actor_body(cursor, header, options, "sprite")?;
    Ok(Sprite {
        name,
        comments: body.comments,
        block_defs: body.block_defs,
        trigger_calls: body.trigger_calls,
        forms: Vec::new(),
        sounds: body.sounds,
        costumes: body.costumes,
        structs: Vec::new(),
    })
}

fn parse_stage<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
) -> Result<Stage, ParseError> {
    let text = header_text(&header, "stage");
    let name = if text.is_empty() {
        None
    } else {
        Some(expression::simple_name(text).map_err(|e| e.at_line(&header))?)
    };
    debug!(stage = ?name, line = header.number, "parsing stage");

    let body = parse_actor_body(cursor, header, options, "stage")?;
    Ok(Stage {
        name,
        comments: body.comments,
        block_defs: body.block_defs,
        trigger_calls: body.trigger_calls,
        forms: Vec::new(),
        sounds: body.sounds,
        costumes: body.costumes,
        structs: Vec::new(),
    })
}

/// `sounds [ ... ]` / `costumes [ ... ]`. Only blank lines and comments are
/// understood so far, so the content is always empty.
fn parse_placeholder_block<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
    what: &str,
) -> Result<Vec<Placeholder>, ParseError> {
    parse_body(cursor, options, header, what, is_bracket_close, |cursor, line, category| {
        match category {
            LineCategory::Comment => {
                parse_comment(cursor, line)?;
                Ok(())
            }
            _ => Err(ParseError::line(
                ErrorKind::Structural,
                format!("unrecognized {} child type", what),
                &line,
            )),
        }
    })?;
    Ok(Vec::new())
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Steps and comments collected from a definition or call body.
#[derive(Default)]
struct StepBody {
    steps: Vec<Step>,
    comments: Vec<Comment>,
}

/// Parse a body of steps. Hosted escapes are only allowed directly inside a
/// definition, whose name `definition` carries. `depth` is the number of
/// context calls enclosing the body.
fn parse_steps<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
    what: &str,
    definition: Option<&str>,
    depth: usize,
    is_close: impl Fn(&str) -> bool,
) -> Result<(StepBody, Line<'a>), ParseError> {
    let mut body = StepBody::default();

    let close = parse_body(cursor, options, header, what, is_close, |cursor, line, category| {
        match (category, definition) {
            (LineCategory::Comment, _) => body.comments.push(parse_comment(cursor, line)?),
            (LineCategory::Hosted, Some(block)) => body.steps.push(hosted::parse_hosted(cursor, line, block)?),
            (LineCategory::ContextCall, _) => {
                body.steps.push(Step::Context(parse_context_call(cursor, line, options, depth + 1)?))
            }
            (LineCategory::StepCall, _) => body.steps.push(Step::Call(parse_step_call(line)?)),
            (other, _) => return Err(not_permitted(line, other, what)),
        }
        Ok(())
    })?;

    Ok((body, close))
}

/// The signature of a definition header such as `define wait (s:Number) seconds [`.
fn definition_signature(header: &Line<'_>, keyword: &str) -> Result<NameDef, ParseError> {
    expression::name_def(header_text(header, keyword)).map_err(|e| e.at_line(header))
}

/// The optional returns clause trailing a definition's `]`.
fn closing_returns(close: &Line<'_>, block: &str) -> Result<Option<Returns>, ParseError> {
    let rest = close.trimmed().trim_start_matches(']').trim();
    if rest.is_empty() {
        return Ok(None);
    }
    expression::returns(rest, block)
        .map(Some)
        .map_err(|e| e.at_line(close))
}

fn parse_block_def<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
) -> Result<BlockDef, ParseError> {
    let NameDef {
        name,
        params,
        blocklists,
    } = definition_signature(&header, "define")?;
    if !blocklists.is_empty() {
        return Err(ParseError::line(
            ErrorKind::Structural,
            "only context and trigger definitions may take BlockList parameters",
            &header,
        ));
    }
    debug!(block = %name, line = header.number, "parsing block definition");

    let (body, close) = parse_steps(cursor, header, options, "block definition", Some(name.as_str()), 0, is_definition_close)?;
    let returns = closing_returns(&close, &name)?;

    Ok(BlockDef {
        name,
        params,
        steps: body.steps,
        returns,
        comments: body.comments,
    })
}

fn parse_context_def<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
) -> Result<ContextDef, ParseError> {
    let NameDef {
        name,
        params,
        blocklists,
    } = definition_signature(&header, "define context")?;
    debug!(context = %name, line = header.number, "parsing context definition");

    let (body, close) = parse_steps(cursor, header, options, "context definition", Some(name.as_str()), 0, is_definition_close)?;
    let returns = closing_returns(&close, &name)?;

    Ok(ContextDef {
        name,
        params,
        blocklists,
        steps: body.steps,
        returns,
        comments: body.comments,
    })
}

fn parse_trigger_def<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
) -> Result<TriggerDef, ParseError> {
    let NameDef {
        name,
        params,
        blocklists,
    } = definition_signature(&header, "define trigger")?;
    debug!(trigger = %name, line = header.number, "parsing trigger definition");

    let (body, close) = parse_steps(cursor, header, options, "trigger definition", Some(name.as_str()), 0, is_definition_close)?;
    if close.trimmed() != "]" {
        return Err(ParseError::line(
            ErrorKind::Structural,
            "trigger definitions cannot declare returns",
            &close,
        ));
    }

    Ok(TriggerDef {
        name,
        params,
        blocklists,
        steps: body.steps,
        comments: body.comments,
    })
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

fn parse_trigger_call<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
) -> Result<TriggerCall, ParseError> {
    let name = header_text(&header, "when");
    if name.is_empty() {
        return Err(ParseError::line(
            ErrorKind::NameSyntax,
            "a trigger needs an event name",
            &header,
        ));
    }
    if expression::is_number(name) {
        return Err(NameError::new(name, 0, "a number cannot be used as a name").at_line(&header));
    }
    let name = name.to_string();
    debug!(event = %name, line = header.number, "parsing trigger call");

    let (body, _) = parse_steps(cursor, header, options, "trigger", None, 0, is_bracket_close)?;
    Ok(TriggerCall {
        name,
        steps: body.steps,
        comments: body.comments,
    })
}

fn parse_context_call<'a>(
    cursor: &mut LineCursor<'a>,
    header: Line<'a>,
    options: &ParserOptions,
    depth: usize,
) -> Result<ContextCall, ParseError> {
    if depth > MAX_NESTING {
        return Err(ParseError::line(
            ErrorKind::Structural,
            "context calls nested too deeply",
            &header,
        ));
    }
    let text = header_text(&header, "");
    let call = expression::name_call(text).map_err(|e| e.at_line(&header))?;
    debug!(context = %call.name, line = header.number, "parsing context call");

    let (body, _) = parse_steps(cursor, header, options, "context call", None, depth, is_bracket_close)?;
    Ok(ContextCall {
        name: call.name,
        args: call.args,
        steps: body.steps,
        comments: body.comments,
    })
}

fn parse_step_call(line: Line<'_>) -> Result<StepCall, ParseError> {
    let call = expression::name_call(line.trimmed()).map_err(|e| e.at_line(&line))?;
    Ok(StepCall {
        name: call.name,
        args: call.args,
    })
}
