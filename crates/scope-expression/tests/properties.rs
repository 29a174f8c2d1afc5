//! Property tests: scalar literals evaluate to themselves and compilation is
//! deterministic.

use proptest::prelude::*;
use scope_expression::{parse, Value};
use serde_json::json;

proptest! {
    #[test]
    fn decimal_literals_round_trip(n in 0f64..1e15) {
        let text = format!("{}", n);
        prop_assert_eq!(parse(&text).unwrap().eval(&Value::Undefined), Ok(Value::Number(n)));
    }

    #[test]
    fn exponent_literals_round_trip(n in 1e-30f64..1e30) {
        let text = format!("{:e}", n);
        prop_assert_eq!(parse(&text).unwrap().eval(&Value::Undefined), Ok(Value::Number(n)));
    }

    #[test]
    fn string_literals_round_trip(s in "[a-zA-Z0-9 _$.,:!?-]*") {
        let single = format!("'{}'", s);
        let double = format!("\"{}\"", s);
        prop_assert_eq!(parse(&single).unwrap().eval(&Value::Undefined), Ok(Value::from(s.as_str())));
        prop_assert_eq!(parse(&double).unwrap().eval(&Value::Undefined), Ok(Value::from(s.as_str())));
    }

    #[test]
    fn compiling_twice_is_indistinguishable(
        path in "[a-z]{1,4}(\\.[a-z]{1,4}){0,3}",
        value in any::<i32>(),
    ) {
        let first = parse(&path).unwrap();
        let second = parse(&path).unwrap();
        prop_assert_eq!(first.source(), second.source());

        let scope = Value::from(json!({"a": {"b": {"c": value}}, "ab": value}));
        prop_assert_eq!(first.eval(&scope), second.eval(&scope));

        let assign = format!("{} = {}", path, value);
        let left = Value::object();
        let right = Value::object();
        prop_assert_eq!(
            parse(&assign).unwrap().eval(&left),
            parse(&assign).unwrap().eval(&right)
        );
        prop_assert_eq!(left.to_json(), right.to_json());
    }
}

#[test]
fn keyword_literals() {
    for (text, expected) in [("true", Value::Bool(true)), ("false", Value::Bool(false)), ("null", Value::Null)] {
        assert_eq!(parse(text).unwrap().eval(&Value::Undefined), Ok(expected));
    }
}
