//! Tree builder: recursive descent over the token vector.
//!
//! ```text
//! program    := assignment
//! assignment := unary ('=' unary)?
//! unary      := ('+'|'-'|'!') unary | primary
//! primary    := base ( '.' identifier | '[' assignment ']' | '(' arguments ')' )*
//! base       := '[' arrayLit | '{' objectLit | constant | identifier | literal
//! ```
//!
//! The first violation aborts the parse; there is no recovery.

use crate::ast::{Node, Property, PropertyKey, UnaryOperator};
use crate::error::{ExprError, Result};
use crate::lexer::Token;
use crate::options::ParserOptions;

/// Up to four candidates, matching `expect` in the grammar description.
const MAX_CANDIDATES: usize = 4;

pub struct AstBuilder<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> AstBuilder<'a> {
    /// Builds a `Program` node from `tokens`.
    pub fn build(tokens: &'a [Token], options: &ParserOptions) -> Result<Node> {
        let mut builder = AstBuilder {
            tokens,
            pos: 0,
            depth: 0,
            max_depth: options.max_depth,
        };
        builder.program()
    }

    fn program(&mut self) -> Result<Node> {
        let body = self.assignment()?;
        if let Some(token) = self.peek(&[]) {
            return Err(ExprError::UnexpectedToken {
                expected: "end of expression".to_string(),
                found: token.text.clone(),
            });
        }
        Ok(Node::Program { body: Box::new(body) })
    }

    fn assignment(&mut self) -> Result<Node> {
        let left = self.unary()?;
        if self.expect(&["="]).is_some() {
            let right = self.unary()?;
            return Ok(Node::AssignmentExpression {
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    /// One more level of tree nesting.
    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ExprError::TooDeep {
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    fn unary(&mut self) -> Result<Node> {
        self.descend()?;
        let node = match self.expect(&["+", "-", "!"]) {
            Some(token) => {
                let operator = UnaryOperator::from_text(&token.text).ok_or_else(|| {
                    ExprError::UnexpectedToken {
                        expected: "a unary operator".to_string(),
                        found: token.text.clone(),
                    }
                })?;
                Node::UnaryExpression {
                    operator,
                    argument: Box::new(self.unary()?),
                }
            }
            None => self.primary()?,
        };
        self.depth -= 1;
        Ok(node)
    }

    fn primary(&mut self) -> Result<Node> {
        let mut primary = if self.expect(&["["]).is_some() {
            self.array_declaration()?
        } else if self.expect(&["{"]).is_some() {
            self.object()?
        } else if let Some(constant) = self.peek(&[]).and_then(keyword_constant) {
            self.pos += 1;
            constant
        } else if self.peek(&[]).is_some_and(|t| t.identifier) {
            self.identifier()?
        } else {
            self.constant()?
        };

        // Every link wraps the chain so far in one more node.
        let mut links = 0;
        while let Some(next) = self.expect(&[".", "[", "("]) {
            self.descend()?;
            links += 1;
            primary = match next.text.as_str() {
                "[" => {
                    let property = self.assignment()?;
                    self.consume("]")?;
                    Node::MemberExpression {
                        object: Box::new(primary),
                        property: Box::new(property),
                        computed: true,
                    }
                }
                "." => Node::MemberExpression {
                    object: Box::new(primary),
                    property: Box::new(self.identifier()?),
                    computed: false,
                },
                _ => {
                    let arguments = self.parse_arguments()?;
                    self.consume(")")?;
                    Node::CallExpression {
                        callee: Box::new(primary),
                        arguments,
                    }
                }
            };
        }
        self.depth -= links;

        Ok(primary)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>> {
        let mut args = Vec::new();
        if self.peek(&[")"]).is_none() {
            loop {
                args.push(self.assignment()?);
                if self.expect(&[","]).is_none() {
                    break;
                }
            }
        }
        Ok(args)
    }

    fn array_declaration(&mut self) -> Result<Node> {
        let mut elements = Vec::new();
        if self.peek(&["]"]).is_none() {
            loop {
                // Trailing comma.
                if self.peek(&["]"]).is_some() {
                    break;
                }
                elements.push(self.assignment()?);
                if self.expect(&[","]).is_none() {
                    break;
                }
            }
        }
        self.consume("]")?;
        Ok(Node::ArrayExpression { elements })
    }

    fn object(&mut self) -> Result<Node> {
        let mut properties = Vec::new();
        if self.peek(&["}"]).is_none() {
            loop {
                let key = if self.peek(&[]).is_some_and(|t| t.identifier) {
                    PropertyKey::Identifier(self.consume_any("property key")?.text.clone())
                } else {
                    PropertyKey::Literal(self.literal_value()?)
                };
                self.consume(":")?;
                let value = self.assignment()?;
                properties.push(Property { key, value });
                if self.expect(&[","]).is_none() {
                    break;
                }
            }
        }
        self.consume("}")?;
        Ok(Node::ObjectExpression { properties })
    }

    fn constant(&mut self) -> Result<Node> {
        Ok(Node::Literal {
            value: self.literal_value()?,
        })
    }

    fn literal_value(&mut self) -> Result<serde_json::Value> {
        let token = self.consume_any("a literal")?;
        match &token.value {
            Some(value) => Ok(value.clone()),
            None => Err(ExprError::UnexpectedToken {
                expected: "a literal".to_string(),
                found: token.text.clone(),
            }),
        }
    }

    fn identifier(&mut self) -> Result<Node> {
        let token = self.consume_any("an identifier")?;
        if !token.identifier {
            return Err(ExprError::UnexpectedToken {
                expected: "an identifier".to_string(),
                found: token.text.clone(),
            });
        }
        Ok(Node::Identifier {
            name: token.text.clone(),
        })
    }

    /// Returns the next token if its text is one of `candidates`, or any next
    /// token when `candidates` is empty. Never advances.
    fn peek(&self, candidates: &[&str]) -> Option<&'a Token> {
        debug_assert!(candidates.len() <= MAX_CANDIDATES);
        let tokens: &'a [Token] = self.tokens;
        let token = tokens.get(self.pos)?;
        if candidates.is_empty() || candidates.contains(&token.text.as_str()) {
            Some(token)
        } else {
            None
        }
    }

    /// `peek` that advances past the matched token.
    fn expect(&mut self, candidates: &[&str]) -> Option<&'a Token> {
        let token = self.peek(candidates)?;
        self.pos += 1;
        Some(token)
    }

    fn consume(&mut self, candidate: &str) -> Result<&'a Token> {
        match self.expect(&[candidate]) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(&format!("'{}'", candidate))),
        }
    }

    fn consume_any(&mut self, expected: &str) -> Result<&'a Token> {
        self.expect(&[]).ok_or_else(|| self.unexpected(expected))
    }

    fn unexpected(&self, expected: &str) -> ExprError {
        match self.tokens.get(self.pos) {
            Some(token) => ExprError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.text.clone(),
            },
            None => ExprError::UnexpectedEnd {
                expected: expected.to_string(),
            },
        }
    }
}

/// `null`, `true`, `false` and `this` win over variables of the same name.
fn keyword_constant(token: &Token) -> Option<Node> {
    if !token.identifier {
        return None;
    }
    let node = match token.text.as_str() {
        "null" => Node::Literal {
            value: serde_json::Value::Null,
        },
        "true" => Node::Literal {
            value: serde_json::Value::Bool(true),
        },
        "false" => Node::Literal {
            value: serde_json::Value::Bool(false),
        },
        "this" => Node::ThisExpression,
        _ => return None,
    };
    Some(node)
}
