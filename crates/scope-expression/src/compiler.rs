//! Code generator: one walk over the tree producing an `Evaluator`.
//!
//! Each node compiles to a closure over its children's closures. In the same
//! walk the compiler records a listing of the equivalent evaluator body, with
//! temporaries `v0, v1, ...` and the guard calls placed where the closures
//! invoke them. The listing is diagnostic only; nothing ever executes it.

use crate::ast::{Node, PropertyKey};
use crate::codegen_steps::{DynamicExpr, ExpressionResult, Literal};
use crate::error::{ExprError, Result};
use crate::eval_ctx::EvalCtx;
use crate::guards;
use crate::operators;
use crate::util;
use crate::value::{Object, Value};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::OnceLock;

type EvalFn = Box<dyn Fn(&EvalCtx<'_>) -> Result<Value> + Send + Sync>;
type LocateFn = Box<dyn Fn(&EvalCtx<'_>) -> Result<Slot> + Send + Sync>;

fn eval_fn<F>(f: F) -> EvalFn
where
    F: Fn(&EvalCtx<'_>) -> Result<Value> + Send + Sync + 'static,
{
    Box::new(f)
}

fn locate_fn<F>(f: F) -> LocateFn
where
    F: Fn(&EvalCtx<'_>) -> Result<Slot> + Send + Sync + 'static,
{
    Box::new(f)
}

/// A compiled expression, callable any number of times.
pub struct Evaluator {
    text: String,
    source: String,
    literal: bool,
    constant: bool,
    root: EvalFn,
    assign: Option<LocateFn>,
}

impl Evaluator {
    /// Evaluates against `scope` and `locals`; pass `Value::Undefined` for an
    /// absent context.
    pub fn call(&self, scope: &Value, locals: &Value) -> Result<Value> {
        (self.root)(&EvalCtx::new(scope, locals))
    }

    /// Evaluates against `scope` without locals.
    pub fn eval(&self, scope: &Value) -> Result<Value> {
        self.call(scope, &Value::Undefined)
    }

    /// Stores `value` into the location the expression names, creating
    /// missing intermediate objects. Returns the stored value.
    pub fn assign(&self, scope: &Value, locals: &Value, value: Value) -> Result<Value> {
        let locate = self.assign.as_ref().ok_or(ExprError::NotAssignable)?;
        let ctx = EvalCtx::new(scope, locals);
        let slot = locate(&ctx)?;
        let value = guards::ensure_safe_object(value)?;
        slot.store(value.clone())?;
        Ok(value)
    }

    pub fn is_assignable(&self) -> bool {
        self.assign.is_some()
    }

    pub fn is_literal(&self) -> bool {
        self.literal
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// The listing of the compiled evaluator body.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The expression text this evaluator was compiled from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("text", &self.text)
            .field("source", &self.source)
            .finish()
    }
}

/// Compiles a tree (normally a `Program`) into an evaluator.
pub fn compile(tree: &Node) -> Evaluator {
    let body = match tree {
        Node::Program { body } => &**body,
        other => other,
    };

    let mut compiler = Compiler::new();
    let compiled = compiler.recurse(body, Create::No);
    compiler.state.body.push(format!("return {};", compiled.step.code()));

    // Compiled separately so the store path stays out of the listing.
    let assign = if body.is_assignable() {
        Some(Compiler::new().reference(body, Create::Target).locate)
    } else {
        None
    };

    Evaluator {
        text: String::new(),
        source: compiler.state.render(),
        literal: body.is_literal(),
        constant: body.is_constant(),
        root: compiled.eval,
        assign,
    }
}

/// Auto-vivification mode threaded through member chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Create {
    No,
    /// Replace a missing link with an empty object before reading it.
    Intermediate,
    /// The final link of an assignment target: located, never read.
    Target,
}

impl Create {
    fn for_object(self) -> Create {
        match self {
            Create::No => Create::No,
            Create::Intermediate | Create::Target => Create::Intermediate,
        }
    }
}

/// Where a reference points once evaluated.
struct Slot {
    /// Container the value was read from; `Undefined` for plain values.
    owner: Value,
    key: String,
    value: Value,
    assignable: bool,
}

impl Slot {
    fn store(&self, value: Value) -> Result<()> {
        if !self.assignable {
            return Err(ExprError::NotAssignable);
        }
        self.owner.set_member(&self.key, value)
    }
}

/// Structured result of compiling something that may be read, called or
/// assigned through.
struct Reference {
    /// Listing text of the location (`(v0).name`, `(v0)[v1]`).
    member: String,
    /// Listing text of the value read, a temporary when one was allocated.
    value: String,
    locate: LocateFn,
}

enum Key {
    Static(String),
    Computed(EvalFn),
}

struct Compiled {
    step: ExpressionResult,
    eval: EvalFn,
}

struct State {
    body: Vec<String>,
    vars: Vec<String>,
    next_id: usize,
}

impl State {
    fn render(&self) -> String {
        let vars = if self.vars.is_empty() {
            String::new()
        } else {
            format!("var {}; ", self.vars.join(", "))
        };
        format!("function(s, l) {{ {}{} }}", vars, self.body.join(" "))
    }
}

struct Compiler {
    state: State,
}

impl Compiler {
    fn new() -> Self {
        Compiler {
            state: State {
                body: Vec::new(),
                vars: Vec::new(),
                next_id: 0,
            },
        }
    }

    fn recurse(&mut self, node: &Node, create: Create) -> Compiled {
        match node {
            Node::Program { body } => self.recurse(body, create),

            Node::Literal { value } => {
                let val = value.clone();
                Compiled {
                    step: ExpressionResult::Literal(Literal::new(escape(value), value.clone())),
                    eval: eval_fn(move |_: &EvalCtx<'_>| Ok(Value::from(&val))),
                }
            }

            Node::ArrayExpression { elements } => {
                let elements: Vec<Compiled> =
                    elements.iter().map(|e| self.recurse(e, Create::No)).collect();
                let code = format!(
                    "[{}]",
                    elements.iter().map(|e| e.step.code()).collect::<Vec<_>>().join(",")
                );
                let evals: Vec<EvalFn> = elements.into_iter().map(|e| e.eval).collect();
                Compiled {
                    step: ExpressionResult::Dynamic(DynamicExpr::new(code)),
                    eval: eval_fn(move |ctx: &EvalCtx<'_>| {
                        let items = evals.iter().map(|f| f(ctx)).collect::<Result<Vec<_>>>()?;
                        Ok(Value::array(items))
                    }),
                }
            }

            Node::ObjectExpression { properties } => {
                let mut codes = Vec::with_capacity(properties.len());
                let mut entries: Vec<(String, EvalFn)> = Vec::with_capacity(properties.len());
                for property in properties {
                    let (key_code, key) = match &property.key {
                        PropertyKey::Identifier(name) => (name.clone(), name.clone()),
                        PropertyKey::Literal(v) => (escape(v), util::property_key(&Value::from(v))),
                    };
                    let value = self.recurse(&property.value, Create::No);
                    codes.push(format!("{}:{}", key_code, value.step.code()));
                    entries.push((key, value.eval));
                }
                Compiled {
                    step: ExpressionResult::Dynamic(DynamicExpr::new(format!("{{ {} }}", codes.join(", ")))),
                    eval: eval_fn(move |ctx: &EvalCtx<'_>| {
                        let obj = Object::new();
                        for (key, f) in &entries {
                            obj.set(key.clone(), f(ctx)?);
                        }
                        Ok(Value::Object(obj))
                    }),
                }
            }

            Node::ThisExpression => Compiled {
                step: ExpressionResult::Dynamic(DynamicExpr::new("s")),
                eval: eval_fn(|ctx: &EvalCtx<'_>| Ok(ctx.scope.clone())),
            },

            Node::Identifier { .. } | Node::MemberExpression { .. } => {
                let Reference { value, locate, .. } = self.reference(node, create);
                Compiled {
                    step: ExpressionResult::Dynamic(DynamicExpr::new(value)),
                    eval: eval_fn(move |ctx: &EvalCtx<'_>| Ok(locate(ctx)?.value)),
                }
            }

            Node::CallExpression { callee, arguments } => self.call_expression(callee, arguments),

            Node::AssignmentExpression { left, right } => {
                let left = self.reference(left, Create::Target);
                let right = self.recurse(right, Create::No);
                let id = self.next_id();
                self.state.body.push(assign(&id, &format!("ensureSafeObject({})", right.step.code())));
                self.state.body.push(assign(&left.member, &id));

                let locate = left.locate;
                let right = right.eval;
                Compiled {
                    step: ExpressionResult::Dynamic(DynamicExpr::new(id)),
                    eval: eval_fn(move |ctx: &EvalCtx<'_>| {
                        let slot = locate(ctx)?;
                        let value = guards::ensure_safe_object(right(ctx)?)?;
                        slot.store(value.clone())?;
                        Ok(value)
                    }),
                }
            }

            Node::UnaryExpression { operator, argument } => {
                let argument = self.recurse(argument, Create::No);
                let definition = operators::definition(*operator);
                let code = format!("{}(ifDefined({}, 0))", definition.name, argument.step.code());
                let argument = argument.eval;
                Compiled {
                    step: ExpressionResult::Dynamic(DynamicExpr::new(code)),
                    eval: eval_fn(move |ctx: &EvalCtx<'_>| {
                        let operand = guards::if_defined(argument(ctx)?, Value::Number(0.0));
                        Ok((definition.eval_fn)(&operand))
                    }),
                }
            }
        }
    }

    fn call_expression(&mut self, callee: &Node, arguments: &[Node]) -> Compiled {
        let description = describe(callee);
        let callee = self.reference(callee, Create::No);
        let args: Vec<Compiled> = arguments.iter().map(|a| self.recurse(a, Create::No)).collect();

        let id = self.next_id();
        let arg_codes: Vec<String> = args
            .iter()
            .map(|a| format!("ensureSafeObject({})", a.step.code()))
            .collect();
        self.if_(
            &format!("{} != null", callee.value),
            &format!(
                "ensureSafeFunction({}); {}",
                callee.value,
                assign(&id, &format!("ensureSafeObject({}({}))", callee.member, arg_codes.join(", ")))
            ),
        );

        let locate = callee.locate;
        let args: Vec<EvalFn> = args.into_iter().map(|a| a.eval).collect();
        Compiled {
            step: ExpressionResult::Dynamic(DynamicExpr::new(id)),
            eval: eval_fn(move |ctx: &EvalCtx<'_>| {
                let slot = locate(ctx)?;
                if slot.value.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let callee = guards::ensure_safe_function(slot.value)?;
                let Value::Function(function) = callee else {
                    return Err(ExprError::NotAFunction(description.clone()));
                };
                let args = args
                    .iter()
                    .map(|f| f(ctx).and_then(guards::ensure_safe_object))
                    .collect::<Result<Vec<_>>>()?;
                guards::ensure_safe_object(function.call(&slot.owner, &args)?)
            }),
        }
    }

    /// Compiles a node as a location. Identifiers and member accesses keep the
    /// container they resolve against (the call receiver, the store target);
    /// any other node is a plain value that cannot be stored into.
    fn reference(&mut self, node: &Node, create: Create) -> Reference {
        match node {
            Node::Identifier { name } => self.identifier(name, create),
            Node::MemberExpression {
                object,
                property,
                computed,
            } => self.member(object, property, *computed, create),
            other => {
                let compiled = self.recurse(other, Create::No);
                let code = compiled.step.code().to_string();
                let eval = compiled.eval;
                Reference {
                    member: code.clone(),
                    value: code,
                    locate: locate_fn(move |ctx: &EvalCtx<'_>| {
                        Ok(Slot {
                            owner: Value::Undefined,
                            key: String::new(),
                            value: eval(ctx)?,
                            assignable: false,
                        })
                    }),
                }
            }
        }
    }

    fn identifier(&mut self, name: &str, create: Create) -> Reference {
        let quoted = escape_str(name);
        let has_local = self.get_has_own_property("l", &quoted);
        let owner = format!("({} ? l : s)", has_local);
        let member = non_computed_member(&owner, name);
        self.state.body.push(format!("ensureSafeMemberName({});", quoted));

        let value = if create == Create::Target {
            member.clone()
        } else {
            let id = self.next_id();
            self.if_(&has_local, &assign(&id, &non_computed_member("l", name)));
            self.if_(
                &format!("{} && s", not(&has_local)),
                &assign(&id, &non_computed_member("s", name)),
            );
            if create == Create::Intermediate {
                self.if_(&format!("{} == null", id), &assign(&id, &format!("{} = {{}}", member)));
            }
            self.state.body.push(assign(&id, &format!("ensureSafeObject({})", id)));
            id
        };

        let name = name.to_string();
        Reference {
            member,
            value,
            locate: locate_fn(move |ctx: &EvalCtx<'_>| {
                guards::ensure_safe_member_name(&name)?;
                let owner = ctx.container_of(&name);
                let value = if create == Create::Target {
                    Value::Undefined
                } else {
                    let found = if util::is_truthy(owner) {
                        owner.get_member(&name)
                    } else {
                        Value::Undefined
                    };
                    guards::ensure_safe_object(vivify(owner, &name, found, create)?)?
                };
                Ok(Slot {
                    owner: owner.clone(),
                    key: name.clone(),
                    value,
                    assignable: true,
                })
            }),
        }
    }

    fn member(&mut self, object: &Node, property: &Node, computed: bool, create: Create) -> Reference {
        let left = self.recurse(object, create.for_object());

        let (key, member) = match property {
            Node::Identifier { name } if !computed => {
                self.state.body.push(format!("ensureSafeMemberName({});", escape_str(name)));
                (Key::Static(name.clone()), non_computed_member(left.step.code(), name))
            }
            _ => {
                let right = self.recurse(property, Create::No);
                match right.step.literal_val() {
                    // Literal keys are resolved now; the name guard still runs
                    // on every evaluation.
                    Some(val) => {
                        let key = util::property_key(&Value::from(val));
                        let quoted = escape_str(&key);
                        self.state.body.push(format!("ensureSafeMemberName({});", quoted));
                        (Key::Static(key), computed_member(left.step.code(), &quoted))
                    }
                    None => {
                        let id = self.next_id();
                        self.state.body.push(assign(
                            &id,
                            &format!("ensureSafeMemberName({})", right.step.code()),
                        ));
                        let member = computed_member(left.step.code(), &id);
                        (Key::Computed(right.eval), member)
                    }
                }
            }
        };

        let value = if create == Create::Target {
            member.clone()
        } else {
            let id = self.next_id();
            if create == Create::Intermediate {
                self.if_(
                    &format!("{} && {} == null", left.step.code(), member),
                    &format!("{} = {{}};", member),
                );
            }
            self.if_(left.step.code(), &assign(&id, &format!("ensureSafeObject({})", member)));
            id
        };

        let left = left.eval;
        Reference {
            member,
            value,
            locate: locate_fn(move |ctx: &EvalCtx<'_>| {
                let owner = left(ctx)?;
                let key = match &key {
                    Key::Static(name) => name.clone(),
                    Key::Computed(f) => util::property_key(&f(ctx)?),
                };
                guards::ensure_safe_member_name(&key)?;
                let value = if create == Create::Target {
                    Value::Undefined
                } else {
                    let found = if util::is_truthy(&owner) {
                        owner.get_member(&key)
                    } else {
                        Value::Undefined
                    };
                    guards::ensure_safe_object(vivify(&owner, &key, found, create)?)?
                };
                Ok(Slot {
                    owner,
                    key,
                    value,
                    assignable: true,
                })
            }),
        }
    }

    fn next_id(&mut self) -> String {
        let id = format!("v{}", self.state.next_id);
        self.state.next_id += 1;
        self.state.vars.push(id.clone());
        id
    }

    fn if_(&mut self, test: &str, consequent: &str) {
        self.state.body.push(format!("if({}){{ {} }}", test, consequent));
    }

    fn get_has_own_property(&self, object: &str, property: &str) -> String {
        format!("{} && ({} in {})", object, property, object)
    }
}

/// Replaces a missing link with an empty object when vivifying. The owner
/// must be a container; anything else is left for the final store to reject.
fn vivify(owner: &Value, key: &str, found: Value, create: Create) -> Result<Value> {
    if create != Create::Intermediate || !found.is_nullish() {
        return Ok(found);
    }
    match owner {
        Value::Object(_) | Value::Array(_) => {
            let created = Value::object();
            owner.set_member(key, created.clone())?;
            Ok(created)
        }
        _ => Ok(found),
    }
}

fn describe(callee: &Node) -> String {
    match callee {
        Node::Identifier { name } => name.clone(),
        Node::MemberExpression {
            object,
            property,
            computed: false,
        } => match &**property {
            Node::Identifier { name } => format!("{}.{}", describe(object), name),
            _ => "expression".to_string(),
        },
        Node::MemberExpression { object, .. } => format!("{}[...]", describe(object)),
        _ => "expression".to_string(),
    }
}

fn assign(id: &str, value: &str) -> String {
    format!("{} = {};", id, value)
}

fn not(e: &str) -> String {
    format!("!({})", e)
}

fn non_computed_member(left: &str, right: &str) -> String {
    format!("({}).{}", left, right)
}

fn computed_member(left: &str, right: &str) -> String {
    format!("({})[{}]", left, right)
}

fn string_escape_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"[^ a-zA-Z0-9]").unwrap())
}

/// Quotes a string for the listing, rewriting every character other than
/// ASCII letters, digits and space as `\uXXXX`.
fn escape_str(s: &str) -> String {
    let escaped = string_escape_regex().replace_all(s, |caps: &regex::Captures| {
        caps[0]
            .encode_utf16()
            .map(|unit| format!("\\u{:04x}", unit))
            .collect::<String>()
    });
    format!("'{}'", escaped)
}

fn escape(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => escape_str(s),
        JsonValue::Null => "null".to_string(),
        JsonValue::Number(n) => util::format_number(n.as_f64().unwrap_or(f64::NAN)),
        other => other.to_string(),
    }
}
