use std::fmt;
use thiserror::Error;

/// Categories of values an expression is never allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenCategory {
    /// The global object (`window`).
    Global,
    /// A DOM node or a DOM library wrapper around one.
    DomNode,
    /// A value that is its own constructor, i.e. the function-construction primitive.
    Constructor,
    /// The root object constructor.
    ObjectConstructor,
    /// `call`, `apply` or `bind`.
    Reflection,
}

impl fmt::Display for ForbiddenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForbiddenCategory::Global => "the Window",
            ForbiddenCategory::DomNode => "DOM nodes",
            ForbiddenCategory::Constructor => "the Function constructor",
            ForbiddenCategory::ObjectConstructor => "the Object constructor",
            ForbiddenCategory::Reflection => "call, apply or bind",
        };
        f.write_str(name)
    }
}

/// Which pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Security,
    Runtime,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("Lexer error: unexpected character '{ch}' at {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("Lexer error: invalid exponent at {position}")]
    InvalidExponent { position: usize },

    #[error("Lexer error: invalid number at {position}")]
    InvalidNumber { position: usize },

    #[error("Lexer error: invalid unicode escape at {position}")]
    InvalidUnicodeEscape { position: usize },

    #[error("Lexer error: unmatched quote at {position}")]
    UnmatchedQuote { position: usize },

    #[error("Parse error: unexpected token '{found}', expecting {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Parse error: unexpected end of expression, expecting {expected}")]
    UnexpectedEnd { expected: String },

    #[error("Parse error: expression nesting too deep (max {max_depth})")]
    TooDeep { max_depth: usize },

    #[error("Referencing \"{0}\" in expressions is disallowed")]
    UnsafeMemberName(String),

    #[error("Referencing {0} in expressions is disallowed")]
    UnsafeObject(ForbiddenCategory),

    #[error("Calling {0} in expressions is disallowed")]
    UnsafeFunction(ForbiddenCategory),

    #[error("{0} is not a function")]
    NotAFunction(String),

    #[error("Expression is not assignable")]
    NotAssignable,

    #[error("Cannot set property \"{property}\"")]
    CannotSetProperty { property: String },

    #[error("{0}")]
    Thrown(String),
}

impl ExprError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExprError::UnexpectedCharacter { .. }
            | ExprError::InvalidExponent { .. }
            | ExprError::InvalidNumber { .. }
            | ExprError::InvalidUnicodeEscape { .. }
            | ExprError::UnmatchedQuote { .. } => ErrorKind::Lex,
            ExprError::UnexpectedToken { .. }
            | ExprError::UnexpectedEnd { .. }
            | ExprError::TooDeep { .. } => ErrorKind::Parse,
            ExprError::UnsafeMemberName(_)
            | ExprError::UnsafeObject(_)
            | ExprError::UnsafeFunction(_) => ErrorKind::Security,
            ExprError::NotAFunction(_)
            | ExprError::NotAssignable
            | ExprError::CannotSetProperty { .. }
            | ExprError::Thrown(_) => ErrorKind::Runtime,
        }
    }

    pub fn is_lex(&self) -> bool {
        self.kind() == ErrorKind::Lex
    }

    pub fn is_parse(&self) -> bool {
        self.kind() == ErrorKind::Parse
    }

    pub fn is_security(&self) -> bool {
        self.kind() == ErrorKind::Security
    }
}

pub type Result<T> = std::result::Result<T, ExprError>;
