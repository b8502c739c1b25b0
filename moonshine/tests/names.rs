use moonshine::parser::expression::{name_call, name_def, returns, simple_name};
use moonshine::parser::MAX_NESTING;
use moonshine::{Expression, Parameter};

fn param(name: &str, ty: &str) -> Parameter {
    Parameter {
        name: name.to_string(),
        param_type: ty.to_string(),
    }
}

#[test]
fn def_with_one_parameter() {
    let def = name_def("wait (seconds:Number) seconds").unwrap();
    assert_eq!(def.name, "wait () seconds");
    assert_eq!(def.params, vec![param("seconds", "Number")]);
    assert!(def.blocklists.is_empty());
}

#[test]
fn def_with_two_parameters() {
    let def = name_def("Start at x (x:Number) y (y:Number)").unwrap();
    assert_eq!(def.name, "Start at x () y ()");
    assert_eq!(def.params.len(), 2);
    assert_eq!(def.params[1], param("y", "Number"));
}

#[test]
fn block_list_parameters_merge_their_seam() {
    let def = name_def("loop over (list:TypeAList) (action:BlockList)").unwrap();
    assert_eq!(def.name, "loop over ()");
    assert_eq!(def.params, vec![param("list", "TypeAList")]);
    assert_eq!(def.blocklists, vec![param("action", "BlockList")]);
}

#[test]
fn block_list_between_literals_joins_them() {
    let def = name_def("if (test:Boolean) (then:BlockList) else (otherwise:BlockList)").unwrap();
    assert_eq!(def.name, "if () else");
    assert_eq!(def.params.len(), 1);
    assert_eq!(def.blocklists.len(), 2);
}

#[test]
fn parameter_names_may_contain_spaces() {
    let def = name_def("each frame (elapsed time:Number) (steps:BlockList)").unwrap();
    assert_eq!(def.name, "each frame ()");
    assert_eq!(def.params[0].name, "elapsed time");
}

#[test]
fn def_rejects_brackets_and_stray_parens() {
    let err = name_def("if (c:Boolean) [passing:BlockList]").unwrap_err();
    assert_eq!(err.index, 15);
    assert!(err.message.contains("open bracket"));

    let err = name_def("oops) here").unwrap_err();
    assert_eq!(err.index, 4);
}

#[test]
fn def_parameter_needs_name_and_type() {
    let err = name_def("go (x) now").unwrap_err();
    assert_eq!(err.index, 3);
    assert!(name_def("go (x:a:b)").is_err());
    assert!(name_def("go (x:(y))").is_err());
}

#[test]
fn unclosed_parameter_reports_past_the_end() {
    let err = name_def("wait (seconds:Number").unwrap_err();
    assert_eq!(err.index, "wait (seconds:Number".len());
}

#[test]
fn call_with_nested_expressions() {
    let call = name_call("repeat until ((Game Over) = (1))").unwrap();
    assert_eq!(call.name, "repeat until ()");
    assert_eq!(call.args.len(), 1);

    let inner = call.args[0].as_block_call().unwrap();
    assert_eq!(inner.name, "() = ()");
    assert_eq!(inner.args.len(), 2);
    assert_eq!(inner.args[0].as_block_call().unwrap().name, "Game Over");
    assert!(inner.args[0].as_block_call().unwrap().args.is_empty());
    assert_eq!(inner.args[1], Expression::Number(1.0));
}

#[test]
fn deeply_nested_arithmetic() {
    let call = name_call("turn ↻ (((Bounce Direction) - (direction)) * 2) degrees").unwrap();
    assert_eq!(call.name, "turn ↻ () degrees");
    let product = call.args[0].as_block_call().unwrap();
    assert_eq!(product.name, "() * 2");
    let difference = product.args[0].as_block_call().unwrap();
    assert_eq!(difference.name, "() - ()");
    assert_eq!(difference.args.len(), 2);
}

#[test]
fn numbers_and_names_in_arguments() {
    let call = name_call("change (speed) by (0.5)").unwrap();
    assert_eq!(call.name, "change () by ()");
    assert_eq!(call.args[0].as_block_call().unwrap().name, "speed");
    assert_eq!(call.args[1].as_number(), Some(0.5));
}

#[test]
fn plain_call_has_no_args() {
    let call = name_call("consolidate sprites").unwrap();
    assert_eq!(call.name, "consolidate sprites");
    assert!(call.args.is_empty());
}

#[test]
fn unclosed_call_reports_input_length() {
    let err = name_call("a(b").unwrap_err();
    assert_eq!(err.index, 3);
    assert!(err.message.contains("missing close parens"));

    let text = "move ((speed) steps";
    assert_eq!(name_call(text).unwrap_err().index, text.chars().count());
}

#[test]
fn call_index_counts_characters_not_bytes() {
    let text = "turn ↻ (x";
    assert_eq!(name_call(text).unwrap_err().index, 9);
}

#[test]
fn call_rejects_brackets_anywhere() {
    assert_eq!(name_call("go [now]").unwrap_err().index, 3);
    assert_eq!(name_call("go ((a) [b])").unwrap_err().index, 8);
}

#[test]
fn call_rejects_empty_and_numeric_names() {
    assert!(name_call("").is_err());
    assert!(name_call("   ").is_err());
    assert!(name_call("42").is_err());
    assert!(name_call("say ()").is_err());
}

#[test]
fn simple_names() {
    assert_eq!(simple_name(" Built-ins ").unwrap(), "Built-ins");
    assert!(simple_name("").is_err());
    assert!(simple_name("  ").is_err());
    assert_eq!(simple_name("a:b").unwrap_err().index, 1);
    assert!(simple_name("x(y)").is_err());
    assert!(simple_name("x[y").is_err());
}

#[test]
fn simple_names_cannot_be_numbers() {
    for text in ["42", " 7 ", "-3", "0.5"] {
        let err = simple_name(text).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.message, "a number cannot be used as a name");
    }
    assert_eq!(simple_name("Level 2").unwrap(), "Level 2");
}

#[test]
fn returns_clause_rejects_numeric_names() {
    assert!(returns("returns 1:2", "go").is_err());
    assert!(returns("returns total:2", "go").is_err());
}

fn nested_call(depth: usize) -> String {
    format!("say {}1{}", "(".repeat(depth), ")".repeat(depth))
}

#[test]
fn nesting_up_to_the_limit_parses() {
    let call = name_call(&nested_call(MAX_NESTING)).unwrap();
    assert_eq!(call.name, "say ()");

    let mut depth = 1;
    let mut arg = &call.args[0];
    while let Expression::BlockCall(inner) = arg {
        assert_eq!(inner.name, "()");
        arg = &inner.args[0];
        depth += 1;
    }
    assert_eq!(depth, MAX_NESTING);
    assert_eq!(*arg, Expression::Number(1.0));
}

#[test]
fn nesting_past_the_limit_is_an_error() {
    for depth in [MAX_NESTING + 1, 20_000] {
        let err = name_call(&nested_call(depth)).unwrap_err();
        assert_eq!(err.message, "expression nested too deeply");
        // the first group past the limit
        assert_eq!(err.index, "say ".len() + MAX_NESTING);
    }
}

#[test]
fn hex_and_infinite_literals_are_names() {
    let call = name_call("go (0x10) (Infinity) (1e3)").unwrap();
    assert_eq!(call.args[0].as_block_call().unwrap().name, "0x10");
    assert_eq!(call.args[1].as_block_call().unwrap().name, "Infinity");
    assert_eq!(call.args[2], Expression::Number(1000.0));
}

#[test]
fn returns_clause() {
    let ret = returns("returns elapsed:Number", "wait () seconds").unwrap();
    assert_eq!(ret.name, "elapsed");
    assert_eq!(ret.return_type, "Number");

    let err = returns("gives elapsed:Number", "wait () seconds").unwrap_err();
    assert!(err.message.contains("wait () seconds"));
    assert_eq!(err.index, 0);

    assert!(returns("returns elapsed", "x").is_err());
    assert!(returns("returns a:b:c", "x").is_err());
}
