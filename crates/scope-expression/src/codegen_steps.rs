//! Codegen result types.
//!
//! Every node the compiler visits yields one of these alongside its
//! executable closure. The `code` is the node's text in the evaluator
//! listing.

use serde_json::Value as JsonValue;

/// A compile-time constant: the value is known while compiling.
#[derive(Debug, Clone)]
pub struct Literal {
    pub code: String,
    pub val: JsonValue,
}

impl Literal {
    pub fn new(code: impl Into<String>, val: JsonValue) -> Self {
        Literal {
            code: code.into(),
            val,
        }
    }
}

/// A runtime expression: an inline composite or a temporary.
#[derive(Debug, Clone)]
pub struct DynamicExpr {
    pub code: String,
}

impl DynamicExpr {
    pub fn new(code: impl Into<String>) -> Self {
        DynamicExpr { code: code.into() }
    }
}

#[derive(Debug, Clone)]
pub enum ExpressionResult {
    Literal(Literal),
    Dynamic(DynamicExpr),
}

impl ExpressionResult {
    pub fn literal_val(&self) -> Option<&JsonValue> {
        match self {
            ExpressionResult::Literal(l) => Some(&l.val),
            _ => None,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ExpressionResult::Literal(l) => &l.code,
            ExpressionResult::Dynamic(d) => &d.code,
        }
    }
}
