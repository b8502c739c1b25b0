use moonshine::{Definition, Expression, ErrorKind, Parser, Step, parse};

const PONG: &str = r#"unit Pong [
  sprite Ball [

    when 🏁 clicked [
      Initialize
      Reset
      repeat until ((Game Over) = (1))[
        move (speed) steps
      ]
    ]

    costumes [
      // Not supported yet
    ]

    sounds [
      // Not supported yet
    ]

    define Start at x (x:Number) y (y:Number)[
      go to x: (x) y: (y)
      turn to (90)
    ] returns this:Sprite

    when I receive (Bounce)[
      turn ↻ (((Bounce Direction) - (direction)) * 2) degrees
      move (speed) steps
    ]

    when I receive (Score Player)[
      change (speed) by (0.5)
      Reset
    ]
  ]
]"#;

const BUILT_INS: &str = r#"unit Built-ins [
  library Controls hue: (0) language: (JavaScript)[

    define wait (seconds:Number) seconds[
      // pause before calling next block
      log (seconds)
    ] returns elapsed:Number

    define trigger each frame (elapsed time:Number) (steps:BlockList)[
      render triangles
      consolidate sprites
    ]

    define context loop over (list:TypeAList) (action:BlockList)[
      // needs locals for item and index
      // returns a new list
      before (action)
      action
      after (action)
    ] returns list:TypeBList
  ]
]"#;

#[test]
fn minimal_sprite_with_comment() {
    let doc = parse("unit Pong [\n sprite Ball [\n  // c\n ]\n]").unwrap();
    assert_eq!(doc.units.len(), 1);
    let unit = &doc.units[0];
    assert_eq!(unit.name, "Pong");
    assert_eq!(unit.sprites.len(), 1);

    let sprite = &unit.sprites[0];
    assert_eq!(sprite.name, "Ball");
    assert!(sprite.block_defs.is_empty());
    assert!(sprite.trigger_calls.is_empty());
    assert_eq!(sprite.comments.len(), 1);
    assert_eq!(sprite.comments[0].text, "c");
}

#[test]
fn empty_input_is_an_empty_document() {
    assert!(parse("").unwrap().is_empty());
    assert!(parse("\n   \n").unwrap().is_empty());
}

#[test]
fn top_level_comments() {
    let doc = parse("// header\n/* a\n   b */\nunit X [\n]\n").unwrap();
    assert_eq!(doc.comments.len(), 2);
    assert_eq!(doc.comments[0].text, "header");
    assert_eq!(doc.comments[1].text, "a\nb");
    assert_eq!(doc.units[0].name, "X");
}

#[test]
fn pong_sprite() {
    let doc = parse(PONG).unwrap();
    let sprite = doc.unit("Pong").and_then(|u| u.sprite("Ball")).unwrap();

    assert_eq!(sprite.block_defs.len(), 1);
    let start = &sprite.block_defs[0];
    assert_eq!(start.name, "Start at x () y ()");
    assert_eq!(start.params.len(), 2);
    assert_eq!(start.params[0].name, "x");
    assert_eq!(start.params[0].param_type, "Number");
    let returns = start.returns.as_ref().unwrap();
    assert_eq!(returns.name, "this");
    assert_eq!(returns.return_type, "Sprite");
    assert_eq!(start.steps[0].name(), Some("go to x: () y: ()"));
    assert_eq!(start.steps[1].args()[0], Expression::Number(90.0));
    assert_eq!(start.steps[1].args()[0].as_number(), Some(90.0));

    assert_eq!(sprite.trigger_calls.len(), 3);
    assert_eq!(sprite.trigger_calls[0].name, "🏁 clicked");
    assert_eq!(sprite.trigger_calls[1].name, "I receive (Bounce)");
    assert_eq!(sprite.trigger_calls[2].steps.len(), 2);

    // comments inside sounds/costumes blocks are dropped
    assert!(sprite.comments.is_empty());
    assert!(sprite.sounds.is_empty());
    assert!(sprite.costumes.is_empty());
    assert!(sprite.forms.is_empty());
    assert!(sprite.structs.is_empty());
}

#[test]
fn nested_context_call_in_trigger() {
    let doc = parse(PONG).unwrap();
    let trigger = &doc.units[0].sprites[0].trigger_calls[0];
    assert_eq!(trigger.steps.len(), 3);
    assert_eq!(trigger.steps[0].name(), Some("Initialize"));

    let Step::Context(repeat) = &trigger.steps[2] else {
        panic!("expected a context call, got {:?}", trigger.steps[2]);
    };
    assert_eq!(repeat.name, "repeat until ()");
    assert_eq!(repeat.args.len(), 1);

    let condition = repeat.args[0].as_block_call().unwrap();
    assert_eq!(condition.name, "() = ()");
    assert_eq!(condition.args[0].as_block_call().unwrap().name, "Game Over");
    assert_eq!(condition.args[1], Expression::Number(1.0));

    assert_eq!(repeat.steps.len(), 1);
    let Step::Call(step) = &repeat.steps[0] else {
        panic!("expected a step call");
    };
    assert_eq!(step.name, "move () steps");
}

#[test]
fn context_calls_nest() {
    let src = "unit U [\n sprite S [\n  when go [\n   forever [\n    if ((x) > (1)) [\n     stop\n    ]\n   ]\n  ]\n ]\n]";
    let doc = parse(src).unwrap();
    let Step::Context(forever) = &doc.units[0].sprites[0].trigger_calls[0].steps[0] else {
        panic!("expected forever");
    };
    let Step::Context(branch) = &forever.steps[0] else {
        panic!("expected if");
    };
    assert_eq!(branch.name, "if ()");
    assert_eq!(branch.steps[0].name(), Some("stop"));
}

#[test]
fn library_definitions() {
    let doc = parse(BUILT_INS).unwrap();
    let unit = &doc.units[0];
    assert_eq!(unit.name, "Built-ins");
    let library = unit.library("Controls").unwrap();
    assert_eq!(library.hue, 0);
    assert_eq!(library.language, "JavaScript");
    assert_eq!(library.block_defs.len(), 3);
    assert_eq!(library.block_defs[0].params()[0].name, "seconds");
    assert_eq!(library.block_defs[0].returns().map(|r| r.name.as_str()), Some("elapsed"));
    // trigger definitions never return
    assert!(library.block_defs[1].returns().is_none());

    let Some(Definition::Block(wait)) = library.definition("wait () seconds") else {
        panic!("expected wait block");
    };
    assert_eq!(wait.params[0].name, "seconds");
    assert_eq!(wait.returns.as_ref().unwrap().name, "elapsed");
    assert_eq!(wait.comments[0].text, "pause before calling next block");
    assert_eq!(wait.steps[0].name(), Some("log ()"));
    assert_eq!(wait.steps[0].args()[0].as_block_call().unwrap().name, "seconds");

    let Some(Definition::Trigger(frame)) = library.definition("each frame ()") else {
        panic!("expected each frame trigger");
    };
    assert_eq!(frame.params[0].name, "elapsed time");
    assert_eq!(frame.blocklists[0].name, "steps");
    assert_eq!(frame.steps.len(), 2);
    assert_eq!(frame.steps[1].name(), Some("consolidate sprites"));

    let Some(Definition::Context(looped)) = library.definition("loop over ()") else {
        panic!("expected loop over context");
    };
    assert_eq!(looped.params[0].param_type, "TypeAList");
    assert_eq!(looped.blocklists.len(), 1);
    assert_eq!(looped.blocklists[0].name, "action");
    assert_eq!(looped.returns.as_ref().unwrap().return_type, "TypeBList");
    let names: Vec<_> = looped.steps.iter().filter_map(|s| s.name()).collect();
    assert_eq!(names, vec!["before ()", "action", "after ()"]);
    assert_eq!(looped.comments.len(), 2);
}

#[test]
fn negative_hue() {
    let doc = parse("unit U [\n library Colors hue:(-40) language:(Lua) [\n ]\n]").unwrap();
    let library = &doc.units[0].libraries[0];
    assert_eq!(library.hue, -40);
    assert_eq!(library.language, "Lua");
}

#[test]
fn stages_share_sprite_children() {
    let doc = parse("unit U [\n stage [\n  when loaded [\n   show\n  ]\n ]\n stage Night [\n ]\n]").unwrap();
    let stages = &doc.units[0].stages;
    assert_eq!(stages.len(), 2);
    assert_eq!(stages[0].name, None);
    assert_eq!(stages[0].trigger_calls[0].name, "loaded");
    assert_eq!(stages[1].name.as_deref(), Some("Night"));
}

#[test]
fn names_are_whitespace_normalized() {
    let doc = parse("unit U [\n sprite S [\n  define  say   (text:String)  twice [\n  ]\n ]\n]").unwrap();
    assert_eq!(doc.units[0].sprites[0].block_defs[0].name, "say () twice");
}

#[test]
fn parsing_is_deterministic() {
    let first = Parser::new(PONG.to_string()).parse().unwrap();
    let second = Parser::new(PONG.to_string()).parse().unwrap();
    assert_eq!(first, second);

    let parser = Parser::new(BUILT_INS.to_string());
    assert_eq!(parser.parse().unwrap(), parser.parse().unwrap());
}

#[test]
fn parsers_run_on_separate_threads() {
    let handles: Vec<_> = [PONG, BUILT_INS]
        .into_iter()
        .map(|src| std::thread::spawn(move || parse(src)))
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }
}

#[test]
fn block_def_rejects_block_list_parameters() {
    let err = parse("unit U [\n sprite S [\n  define run (body:BlockList) now [\n  ]\n ]\n]").unwrap_err();
    // `define run (...BlockList)` is not a context header, so it lands in BlockDef
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.line_number(), 3);
}
