//! Abstract syntax tree produced by the tree builder.

use serde_json::Value as JsonValue;

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

impl UnaryOperator {
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "+" => Some(UnaryOperator::Plus),
            "-" => Some(UnaryOperator::Minus),
            "!" => Some(UnaryOperator::Not),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Not => "!",
        }
    }
}

/// Object literal key: a bare identifier or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Identifier(String),
    Literal(JsonValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program {
        body: Box<Node>,
    },
    /// Scalar literal: number, string, boolean or null.
    Literal {
        value: JsonValue,
    },
    ArrayExpression {
        elements: Vec<Node>,
    },
    ObjectExpression {
        properties: Vec<Property>,
    },
    Identifier {
        name: String,
    },
    ThisExpression,
    /// `object.property` when not computed (the property is an `Identifier`),
    /// `object[property]` otherwise.
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    AssignmentExpression {
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryExpression {
        operator: UnaryOperator,
        argument: Box<Node>,
    },
}

/// Helper functions for constructing AST nodes.
pub struct Ast;

impl Ast {
    pub fn program(body: Node) -> Node {
        Node::Program { body: Box::new(body) }
    }

    pub fn literal(value: impl Into<JsonValue>) -> Node {
        Node::Literal { value: value.into() }
    }

    pub fn identifier(name: impl Into<String>) -> Node {
        Node::Identifier { name: name.into() }
    }

    pub fn member(object: Node, name: impl Into<String>) -> Node {
        Node::MemberExpression {
            object: Box::new(object),
            property: Box::new(Ast::identifier(name)),
            computed: false,
        }
    }

    pub fn computed(object: Node, property: Node) -> Node {
        Node::MemberExpression {
            object: Box::new(object),
            property: Box::new(property),
            computed: true,
        }
    }

    pub fn call(callee: Node, arguments: Vec<Node>) -> Node {
        Node::CallExpression {
            callee: Box::new(callee),
            arguments,
        }
    }

    pub fn assign(left: Node, right: Node) -> Node {
        Node::AssignmentExpression {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(operator: UnaryOperator, argument: Node) -> Node {
        Node::UnaryExpression {
            operator,
            argument: Box::new(argument),
        }
    }
}

impl Node {
    /// Literal, array literal or object literal at the top.
    pub fn is_literal(&self) -> bool {
        match self {
            Node::Program { body } => body.is_literal(),
            Node::Literal { .. } | Node::ArrayExpression { .. } | Node::ObjectExpression { .. } => true,
            _ => false,
        }
    }

    /// True when evaluation cannot depend on scope or locals.
    pub fn is_constant(&self) -> bool {
        match self {
            Node::Program { body } => body.is_constant(),
            Node::Literal { .. } => true,
            Node::ArrayExpression { elements } => elements.iter().all(Node::is_constant),
            Node::ObjectExpression { properties } => properties.iter().all(|p| p.value.is_constant()),
            Node::UnaryExpression { argument, .. } => argument.is_constant(),
            // Member reads on a constant are still constant (`[1,2][0]`).
            Node::MemberExpression { object, property, computed } => {
                object.is_constant() && (!computed || property.is_constant())
            }
            Node::Identifier { .. }
            | Node::ThisExpression
            | Node::CallExpression { .. }
            | Node::AssignmentExpression { .. } => false,
        }
    }

    /// Identifier or member access: something `=` can store into.
    pub fn is_assignable(&self) -> bool {
        match self {
            Node::Program { body } => body.is_assignable(),
            Node::Identifier { .. } | Node::MemberExpression { .. } => true,
            _ => false,
        }
    }
}
