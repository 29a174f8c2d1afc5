//! Unary operator definitions.

pub mod arithmetic;
pub mod logical;

use crate::ast::UnaryOperator;
use crate::value::Value;

/// The evaluation function of a unary operator.
pub type UnaryFn = fn(&Value) -> Value;

/// An operator definition: its source spelling and how it evaluates.
#[derive(Debug, Clone, Copy)]
pub struct OperatorDefinition {
    pub operator: UnaryOperator,
    pub name: &'static str,
    pub eval_fn: UnaryFn,
}

/// All unary operators.
pub fn all_operators() -> [OperatorDefinition; 3] {
    [arithmetic::PLUS, arithmetic::MINUS, logical::NOT]
}

/// Looks up the definition of `operator`.
pub fn definition(operator: UnaryOperator) -> OperatorDefinition {
    match operator {
        UnaryOperator::Plus => arithmetic::PLUS,
        UnaryOperator::Minus => arithmetic::MINUS,
        UnaryOperator::Not => logical::NOT,
    }
}
