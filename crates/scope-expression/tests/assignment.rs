//! Assignment expressions, auto-vivification and `Evaluator::assign`.

use scope_expression::{parse, ExprError, Object, Value};
use serde_json::json;

fn run(text: &str, scope: &Value, locals: &Value) -> scope_expression::Result<Value> {
    parse(text)
        .unwrap_or_else(|e| panic!("parse({:?}) failed: {}", text, e))
        .call(scope, locals)
}

#[test]
fn test_deep_assignment_creates_links() {
    let scope = Value::object();
    assert_eq!(run("a.b.c = 1", &scope, &Value::Undefined), Ok(Value::from(1)));
    assert_eq!(scope.to_json(), Some(json!({"a": {"b": {"c": 1.0}}})));
}

#[test]
fn test_computed_chains_vivify_too() {
    let scope = Value::from(json!({"a": {}}));
    let locals = Value::from(json!({"k": "x"}));
    run("a[k].c = 2", &scope, &locals).unwrap();
    run("m['p'][k] = 3", &scope, &locals).unwrap();
    assert_eq!(
        scope.to_json(),
        Some(json!({"a": {"x": {"c": 2.0}}, "m": {"p": {"x": 3.0}}}))
    );
    assert_eq!(locals.to_json(), Some(json!({"k": "x"})));
}

#[test]
fn test_null_links_are_replaced() {
    let scope = Value::from(json!({"a": null}));
    run("a.b = true", &scope, &Value::Undefined).unwrap();
    assert_eq!(scope.to_json(), Some(json!({"a": {"b": true}})));
}

#[test]
fn test_existing_objects_are_kept() {
    let scope = Value::from(json!({"a": {"keep": 1}}));
    run("a.b = 2", &scope, &Value::Undefined).unwrap();
    assert_eq!(scope.to_json(), Some(json!({"a": {"keep": 1.0, "b": 2.0}})));
}

#[test]
fn test_reads_never_vivify() {
    let scope = Value::object();
    assert_eq!(run("a.b.c", &scope, &Value::Undefined), Ok(Value::Undefined));
    assert_eq!(run("x = a.b.c", &scope, &Value::Undefined), Ok(Value::Undefined));
    assert_eq!(scope.to_json(), Some(json!({})));
    assert!(scope.has_own("x"));
}

#[test]
fn test_locals_binding_is_updated() {
    let scope = Value::from(json!({"x": 1}));
    let locals = Value::from(json!({"x": 2}));
    run("x = 5", &scope, &locals).unwrap();
    assert_eq!(scope.to_json(), Some(json!({"x": 1.0})));
    assert_eq!(locals.to_json(), Some(json!({"x": 5.0})));

    run("y = x", &scope, &locals).unwrap();
    assert_eq!(scope.get_member("y"), Value::from(5));
}

#[test]
fn test_array_elements() {
    let scope = Value::from(json!({"list": [1]}));
    run("list[2] = 'c'", &scope, &Value::Undefined).unwrap();
    assert_eq!(scope.to_json(), Some(json!({"list": [1.0, null, "c"]})));
}

#[test]
fn test_assignment_value_is_shared() {
    let scope = Value::object();
    run("a = {n: 1}", &scope, &Value::Undefined).unwrap();
    run("b = a", &scope, &Value::Undefined).unwrap();
    run("b.n = 2", &scope, &Value::Undefined).unwrap();
    assert_eq!(scope.get_member("a").get_member("n"), Value::from(2));
}

#[test]
fn test_store_into_scalar_fails() {
    let scope = Value::from(json!({"a": 5}));
    assert_eq!(
        run("a.b = 1", &scope, &Value::Undefined),
        Err(ExprError::CannotSetProperty { property: "b".into() })
    );
    assert_eq!(
        run("a = 1", &Value::Undefined, &Value::Undefined),
        Err(ExprError::CannotSetProperty { property: "a".into() })
    );
}

#[test]
fn test_non_reference_target() {
    assert_eq!(run("1 = 2", &Value::object(), &Value::Undefined), Err(ExprError::NotAssignable));
    assert_eq!(run("f() = 2", &Value::object(), &Value::Undefined), Err(ExprError::NotAssignable));
}

#[test]
fn test_assign_api() {
    let scope = Value::object();
    let path = parse("settings.theme.name").unwrap();
    assert!(path.is_assignable());
    assert_eq!(
        path.assign(&scope, &Value::Undefined, Value::from("dark")),
        Ok(Value::from("dark"))
    );
    assert_eq!(path.eval(&scope), Ok(Value::from("dark")));
    assert_eq!(
        scope.to_json(),
        Some(json!({"settings": {"theme": {"name": "dark"}}}))
    );

    let literal = parse("'text'").unwrap();
    assert_eq!(
        literal.assign(&scope, &Value::Undefined, Value::Null),
        Err(ExprError::NotAssignable)
    );
}

#[test]
fn test_assign_api_guards_value() {
    let window = Object::new();
    window.set("window", window.clone());
    let err = parse("w")
        .unwrap()
        .assign(&Value::object(), &Value::Undefined, Value::Object(window))
        .unwrap_err();
    assert!(err.is_security());
}

#[test]
fn test_self_references_stay_printable() {
    let scope = Value::from(json!({"a": {"n": 1}, "list": []}));
    run("a.self = a", &scope, &Value::Undefined).unwrap();
    run("list[0] = list", &scope, &Value::Undefined).unwrap();

    assert_eq!(scope.to_json(), None);
    assert_eq!(scope.get_member("a").get_member("self"), scope.get_member("a"));
    assert_eq!(format!("{:?}", scope.get_member("list")), "[Array(len = 1)]");
    assert_eq!(run("a.self.self.n", &scope, &Value::Undefined), Ok(Value::from(1)));
}
