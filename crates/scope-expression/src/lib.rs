//! Sandboxed evaluator for JavaScript-like template expressions.
//!
//! # Overview
//!
//! An expression such as `user.name`, `items[i].save(draft)` or
//! `a.b.c = -count` is tokenized, built into a small syntax tree and compiled
//! into an [`Evaluator`]. The evaluator is a pure function of two layered
//! contexts: a long-lived `scope` and short-lived `locals` that shadow it.
//!
//! Reads through missing links yield `undefined` instead of failing, and
//! assignments create missing intermediate objects. Every property name,
//! intermediate value, callee and call result passes through a runtime guard
//! that rejects constructors, the global object, DOM nodes and the
//! `call`/`apply`/`bind` reflection functions.
//!
//! # Example
//!
//! ```
//! use scope_expression::{parse, Value};
//! use serde_json::json;
//!
//! let scope = Value::from(json!({"user": {"name": "Ada"}}));
//! let locals = Value::from(json!({"greeting": "hi"}));
//!
//! let read = parse("user.name").unwrap();
//! assert_eq!(read.call(&scope, &locals).unwrap(), Value::from("Ada"));
//!
//! let missing = parse("user.address.city").unwrap();
//! assert_eq!(missing.eval(&scope).unwrap(), Value::Undefined);
//!
//! let write = parse("profile.settings.theme = greeting").unwrap();
//! write.call(&scope, &locals).unwrap();
//! assert_eq!(
//!     scope.to_json(),
//!     Some(json!({"user": {"name": "Ada"}, "profile": {"settings": {"theme": "hi"}}}))
//! );
//! ```

pub mod ast;
pub mod codegen_steps;
pub mod compiler;
pub mod error;
pub mod eval_ctx;
pub mod guards;
pub mod lexer;
pub mod operators;
pub mod options;
pub mod parser;
pub mod util;
pub mod value;

use log::debug;

pub use ast::{Ast, Node, UnaryOperator};
pub use compiler::{compile, Evaluator};
pub use error::{ErrorKind, ExprError, ForbiddenCategory, Result};
pub use eval_ctx::EvalCtx;
pub use options::ParserOptions;
pub use value::{Array, Function, FunctionKind, Object, ObjectKind, Value};

/// Expression parser: lexer, tree builder and compiler in one pass.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParserOptions,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Parser { options }
    }

    /// Parses `text` into an evaluator. Lexical and grammar errors are
    /// reported here; guard violations only surface when the evaluator runs.
    pub fn parse(&self, text: &str) -> Result<Evaluator> {
        let tokens = lexer::lex(text)?;
        let tree = parser::AstBuilder::build(&tokens, &self.options)?;
        let evaluator = compile(&tree).with_text(text);
        debug!(target: "scope_expression", "compiled {:?}: {}", text, evaluator.source());
        Ok(evaluator)
    }
}

/// Parses `text` with default options.
pub fn parse(text: &str) -> Result<Evaluator> {
    Parser::default().parse(text)
}
