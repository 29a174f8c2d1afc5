//! Numeric prefix operators.

use super::OperatorDefinition;
use crate::ast::UnaryOperator;
use crate::util;
use crate::value::Value;

fn plus_eval(operand: &Value) -> Value {
    Value::Number(util::num(operand))
}

fn minus_eval(operand: &Value) -> Value {
    Value::Number(-util::num(operand))
}

pub const PLUS: OperatorDefinition = OperatorDefinition {
    operator: UnaryOperator::Plus,
    name: "+",
    eval_fn: plus_eval,
};

pub const MINUS: OperatorDefinition = OperatorDefinition {
    operator: UnaryOperator::Minus,
    name: "-",
    eval_fn: minus_eval,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_coerces() {
        assert_eq!(plus_eval(&Value::from("42")), Value::Number(42.0));
        assert_eq!(plus_eval(&Value::Bool(true)), Value::Number(1.0));
        assert_eq!(plus_eval(&Value::Null), Value::Number(0.0));
    }

    #[test]
    fn test_minus_negates() {
        assert_eq!(minus_eval(&Value::from(3)), Value::Number(-3.0));
        assert_eq!(minus_eval(&Value::from("-2")), Value::Number(2.0));
        assert!(matches!(minus_eval(&Value::object()), Value::Number(n) if n.is_nan()));
    }
}
