//! Logical prefix operators.

use super::OperatorDefinition;
use crate::ast::UnaryOperator;
use crate::util;
use crate::value::Value;

fn not_eval(operand: &Value) -> Value {
    Value::Bool(!util::is_truthy(operand))
}

pub const NOT: OperatorDefinition = OperatorDefinition {
    operator: UnaryOperator::Not,
    name: "!",
    eval_fn: not_eval,
};
