//! Literal parsing and grammar errors through the public `parse` entry point.

use scope_expression::options::DEFAULT_MAX_DEPTH;
use scope_expression::{parse, ExprError, Parser, ParserOptions, Value};
use serde_json::json;

fn value_of(text: &str) -> Value {
    parse(text)
        .unwrap_or_else(|e| panic!("parse({:?}) failed: {}", text, e))
        .eval(&Value::Undefined)
        .unwrap_or_else(|e| panic!("eval({:?}) failed: {}", text, e))
}

fn json_of(text: &str) -> serde_json::Value {
    value_of(text)
        .to_json()
        .unwrap_or_else(|| panic!("{:?} has no JSON form", text))
}

fn parse_err(text: &str) -> ExprError {
    parse(text)
        .err()
        .unwrap_or_else(|| panic!("expected error for {:?}", text))
}

// ------------------------------------------------------------------- Numbers

#[test]
fn test_numbers() {
    assert_eq!(value_of("4.2"), Value::Number(4.2));
    assert_eq!(value_of("42e3"), Value::Number(42000.0));
    assert_eq!(value_of(".42e+2"), Value::Number(42.0));
    assert_eq!(value_of("4200e-2"), Value::Number(42.0));
    assert_eq!(value_of(".42E2"), Value::Number(42.0));
    assert_eq!(value_of(" \n42 "), Value::Number(42.0));
}

#[test]
fn test_malformed_exponent() {
    assert!(parse_err("42e-").is_lex());
    assert!(parse_err("42e-a").is_lex());
    assert!(matches!(parse_err("42e-"), ExprError::InvalidExponent { .. }));
}

// ------------------------------------------------------------------- Strings

#[test]
fn test_strings() {
    assert_eq!(value_of(r"'a\'b'"), Value::from("a'b"));
    assert_eq!(value_of(r#""\u00A0""#), Value::from("\u{a0}"));
    assert_eq!(value_of(r#""tab\there""#), Value::from("tab\there"));
    assert_eq!(value_of("'double \" inside'"), Value::from("double \" inside"));
}

#[test]
fn test_string_errors() {
    assert!(matches!(
        parse_err(r#""\u00T0""#),
        ExprError::InvalidUnicodeEscape { .. }
    ));
    assert!(matches!(parse_err("'a\""), ExprError::UnmatchedQuote { position: 0 }));
    assert!(parse_err("\"abc").is_lex());
}

// --------------------------------------------------------- Keyword constants

#[test]
fn test_keywords() {
    assert_eq!(value_of("null"), Value::Null);
    assert_eq!(value_of("true"), Value::Bool(true));
    assert_eq!(value_of("false"), Value::Bool(false));
}

// ------------------------------------------------------ Array/Object literals

#[test]
fn test_arrays() {
    assert_eq!(json_of("[]"), json!([]));
    assert_eq!(json_of("[1,2,3,]"), json!([1.0, 2.0, 3.0]));
    assert_eq!(
        json_of("[1,\"two\",[3],true]"),
        json!([1.0, "two", [3.0], true])
    );
}

#[test]
fn test_objects() {
    assert_eq!(json_of("{}"), json!({}));
    assert_eq!(
        json_of("{a: 1, 'b c': [null], 3: {d: false}}"),
        json!({"a": 1.0, "b c": [null], "3": {"d": false}})
    );
}

// -------------------------------------------------------------------- Errors

#[test]
fn test_lex_errors() {
    assert_eq!(
        parse_err("a # b"),
        ExprError::UnexpectedCharacter { ch: '#', position: 2 }
    );
    assert!(parse_err("a * b").is_lex());
}

#[test]
fn test_parse_errors() {
    for text in ["[1, 2", "{a 1}", "a =", "!", "a b", "a.", "f(1", "{a: 1,", ""] {
        let err = parse_err(text);
        assert!(err.is_parse(), "{:?} gave {:?}", text, err);
        assert!(!err.to_string().is_empty());
    }
}

#[test]
fn test_nesting_limit() {
    let parser = Parser::new(ParserOptions::default().with_max_depth(4));
    assert!(parser.parse("[[1]]").is_ok());
    assert!(matches!(
        parser.parse("[[[[[1]]]]]"),
        Err(ExprError::TooDeep { max_depth: 4 })
    ));
}

#[test]
fn test_long_postfix_chains() {
    let scope = Value::object();
    let chain = format!("a{}", ".b".repeat(100));
    assert_eq!(parse(&chain).unwrap().eval(&scope), Ok(Value::Undefined));

    let store = format!("{} = 1", chain);
    assert_eq!(parse(&store).unwrap().eval(&scope), Ok(Value::from(1)));
    assert_eq!(parse(&chain).unwrap().eval(&scope), Ok(Value::from(1)));

    for text in [
        format!("a{}", ".b".repeat(5000)),
        format!("a{}", "[0]".repeat(1000)),
        format!("f{}", "()".repeat(1000)),
        format!("{} = 1", format!("a{}", ".b".repeat(400))),
    ] {
        assert_eq!(
            parse(&text).err(),
            Some(ExprError::TooDeep { max_depth: DEFAULT_MAX_DEPTH })
        );
    }
}

// --------------------------------------------------------- Evaluator facts

#[test]
fn test_evaluator_flags() {
    let literal = parse("'x'").unwrap();
    assert!(literal.is_literal());
    assert!(literal.is_constant());
    assert!(!literal.is_assignable());
    assert_eq!(literal.text(), "'x'");

    let constant = parse("-[1, {a: 2}][0]").unwrap();
    assert!(!constant.is_literal());
    assert!(constant.is_constant());
    assert!(parse("[1, {a: x}]").unwrap().is_literal());
    assert!(!parse("[1, {a: x}]").unwrap().is_constant());

    let member = parse("a.b").unwrap();
    assert!(!member.is_constant());
    assert!(member.is_assignable());

    assert!(!parse("f()").unwrap().is_assignable());
}

#[test]
fn test_listing_escapes_strings() {
    let evaluator = parse(r"'a\'b'").unwrap();
    assert_eq!(evaluator.source(), "function(s, l) { return 'a\\u0027b'; }");
}
