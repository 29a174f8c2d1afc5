//! Runtime values seen by compiled expressions.
//!
//! Arrays and objects are shared, mutable containers (`Rc<RefCell<..>>`), so
//! an assignment performed by an evaluator is visible through every handle the
//! caller holds on the same scope.

use crate::error::{ExprError, Result};
use crate::util;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Signature of host functions: `(this, arguments) -> result`.
pub type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value>;

/// Host-supplied classification of an object.
///
/// Hosts tag environment objects explicitly; the guards additionally
/// duck-type untagged objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectKind {
    #[default]
    Plain,
    Global,
    DomNode,
    DomWrapper,
}

/// Host-supplied classification of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionKind {
    #[default]
    Native,
    /// The function-construction primitive (`Function`), its own constructor.
    Constructor,
    /// The root object constructor (`Object`).
    ObjectConstructor,
    Call,
    Apply,
    Bind,
}

/// Any value an expression can produce, including `undefined`.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
    Function(Function),
}

// ------------------------------------------------------------------- Object

struct ObjectData {
    kind: ObjectKind,
    props: RefCell<BTreeMap<String, Value>>,
}

#[derive(Clone)]
pub struct Object(Rc<ObjectData>);

impl Object {
    pub fn new() -> Self {
        Object::with_kind(ObjectKind::Plain)
    }

    pub fn with_kind(kind: ObjectKind) -> Self {
        Object(Rc::new(ObjectData {
            kind,
            props: RefCell::new(BTreeMap::new()),
        }))
    }

    pub fn kind(&self) -> ObjectKind {
        self.0.kind
    }

    /// Returns the own property `key`, or `Undefined`.
    pub fn get(&self, key: &str) -> Value {
        self.0.props.borrow().get(key).cloned().unwrap_or_default()
    }

    pub fn has_own(&self, key: &str) -> bool {
        self.0.props.borrow().contains_key(key)
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.props.borrow_mut().insert(key.into(), value.into());
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.props.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.props.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.props.borrow().is_empty()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    /// True when `key` holds this very object (`window.window === window`).
    pub fn refers_to_itself(&self, key: &str) -> bool {
        match self.0.props.borrow().get(key) {
            Some(Value::Object(o)) => o.ptr_eq(self),
            _ => false,
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Object::new()
    }
}

impl fmt::Debug for Object {
    // Keys only: host objects may be self-referential.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("kind", &self.kind())
            .field("keys", &self.keys())
            .finish()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        objects_eq(self, other, &mut Vec::new())
    }
}

// -------------------------------------------------------------------- Array

#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new(items: Vec<Value>) -> Self {
        Array(Rc::new(RefCell::new(items)))
    }

    pub fn get(&self, index: usize) -> Value {
        self.0.borrow().get(index).cloned().unwrap_or_default()
    }

    /// Stores `value` at `index`, padding any gap with `Undefined`.
    pub fn set(&self, index: usize, value: Value) {
        let mut items = self.0.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value;
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for Array {
    // Nested arrays print their length only, like objects print their keys.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.0.borrow();
        let mut list = f.debug_list();
        for item in items.iter() {
            match item {
                Value::Array(nested) => list.entry(&format_args!("Array(len = {})", nested.len())),
                other => list.entry(other),
            };
        }
        list.finish()
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        arrays_eq(self, other, &mut Vec::new())
    }
}

// --------------------------------------------------------- Structural equality

/// Container pairs currently being compared further up the walk.
type PairPath = Vec<(*const (), *const ())>;

fn values_eq(a: &Value, b: &Value, path: &mut PairPath) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => arrays_eq(a, b, path),
        (Value::Object(a), Value::Object(b)) => objects_eq(a, b, path),
        (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
        _ => false,
    }
}

fn objects_eq(a: &Object, b: &Object, path: &mut PairPath) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    if a.kind() != b.kind() {
        return false;
    }
    // A pair met again inside itself is equal if everything else is.
    let pair = (a.addr(), b.addr());
    if path.contains(&pair) {
        return true;
    }
    let (left, right) = (a.0.props.borrow(), b.0.props.borrow());
    if left.len() != right.len() {
        return false;
    }
    path.push(pair);
    let equal = left
        .iter()
        .zip(right.iter())
        .all(|((ka, va), (kb, vb))| ka == kb && values_eq(va, vb, path));
    path.pop();
    equal
}

fn arrays_eq(a: &Array, b: &Array, path: &mut PairPath) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    let pair = (a.addr(), b.addr());
    if path.contains(&pair) {
        return true;
    }
    let (left, right) = (a.0.borrow(), b.0.borrow());
    if left.len() != right.len() {
        return false;
    }
    path.push(pair);
    let equal = left.iter().zip(right.iter()).all(|(va, vb)| values_eq(va, vb, path));
    path.pop();
    equal
}

// ----------------------------------------------------------------- Function

struct FunctionData {
    name: String,
    kind: FunctionKind,
    body: Box<NativeFn>,
}

#[derive(Clone)]
pub struct Function(Rc<FunctionData>);

impl Function {
    /// Wraps a host closure as an ordinary callable.
    pub fn native<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        Function::with_kind(name, FunctionKind::Native, body)
    }

    pub fn with_kind<F>(name: impl Into<String>, kind: FunctionKind, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        Function(Rc::new(FunctionData {
            name: name.into(),
            kind,
            body: Box::new(body),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> FunctionKind {
        self.0.kind
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        (self.0.body)(this, args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The generic `call`/`apply`/`bind` primitives every function exposes.
    ///
    /// They receive the target function as `this`.
    pub fn reflection(kind: FunctionKind) -> Option<Function> {
        let f = match kind {
            FunctionKind::Call => Function::with_kind("call", kind, |this, args| {
                let target = as_callable(this, "call")?;
                let (receiver, rest) = split_receiver(args);
                target.call(&receiver, rest)
            }),
            FunctionKind::Apply => Function::with_kind("apply", kind, |this, args| {
                let target = as_callable(this, "apply")?;
                let (receiver, rest) = split_receiver(args);
                let spread = match rest.first() {
                    Some(Value::Array(a)) => a.to_vec(),
                    _ => Vec::new(),
                };
                target.call(&receiver, &spread)
            }),
            FunctionKind::Bind => Function::with_kind("bind", kind, |this, args| {
                let target = as_callable(this, "bind")?;
                let (receiver, rest) = split_receiver(args);
                let bound_args = rest.to_vec();
                let name = format!("bound {}", target.name());
                Ok(Value::Function(Function::native(name, move |_, args| {
                    let mut all = bound_args.clone();
                    all.extend_from_slice(args);
                    target.call(&receiver, &all)
                })))
            }),
            _ => return None,
        };
        Some(f)
    }
}

fn as_callable(this: &Value, primitive: &str) -> Result<Function> {
    match this {
        Value::Function(f) => Ok(f.clone()),
        other => Err(ExprError::NotAFunction(format!(
            "{}.{}",
            util::type_name(other),
            primitive
        ))),
    }
}

fn split_receiver(args: &[Value]) -> (Value, &[Value]) {
    match args.split_first() {
        Some((receiver, rest)) => (receiver.clone(), rest),
        None => (Value::Undefined, &[]),
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({}, {:?})", self.name(), self.kind())
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// -------------------------------------------------------------------- Value

impl Value {
    pub fn object() -> Value {
        Value::Object(Object::new())
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Array::new(items))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// `null` or `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Own-property test used for locals shadowing.
    pub fn has_own(&self, key: &str) -> bool {
        match self {
            Value::Object(o) => o.has_own(key),
            Value::Array(a) => key == "length" || util::array_index(key).is_some_and(|i| i < a.len()),
            _ => false,
        }
    }

    /// Property read with JavaScript-like results for the built-in shapes.
    /// Anything unresolvable is `Undefined`.
    pub fn get_member(&self, key: &str) -> Value {
        match self {
            Value::Object(o) => o.get(key),
            Value::Array(a) => match key {
                "length" => Value::Number(a.len() as f64),
                _ => util::array_index(key).map(|i| a.get(i)).unwrap_or_default(),
            },
            // Length and indices count UTF-16 units; a lone surrogate half
            // reads as U+FFFD.
            Value::String(s) => match key {
                "length" => Value::Number(s.encode_utf16().count() as f64),
                _ => util::array_index(key)
                    .and_then(|i| s.encode_utf16().nth(i))
                    .map(|unit| Value::String(String::from_utf16_lossy(&[unit])))
                    .unwrap_or_default(),
            },
            Value::Function(f) => match key {
                "call" => Function::reflection(FunctionKind::Call).map(Value::Function).unwrap_or_default(),
                "apply" => Function::reflection(FunctionKind::Apply).map(Value::Function).unwrap_or_default(),
                "bind" => Function::reflection(FunctionKind::Bind).map(Value::Function).unwrap_or_default(),
                "name" => Value::String(f.name().to_string()),
                _ => Value::Undefined,
            },
            _ => Value::Undefined,
        }
    }

    /// Property write. Only objects and arrays accept stores.
    pub fn set_member(&self, key: &str, value: Value) -> Result<()> {
        match self {
            Value::Object(o) => {
                o.set(key, value);
                Ok(())
            }
            Value::Array(a) => match util::array_index(key) {
                Some(i) => {
                    a.set(i, value);
                    Ok(())
                }
                None => Err(ExprError::CannotSetProperty { property: key.to_string() }),
            },
            _ => Err(ExprError::CannotSetProperty { property: key.to_string() }),
        }
    }

    /// Converts to JSON the way `JSON.stringify` would: `undefined` and
    /// functions are dropped from objects and become `null` in arrays.
    /// Returns `None` when the value itself has no JSON form or contains a
    /// container nested inside itself.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        self.json_on_path(&mut Vec::new()).ok().flatten()
    }

    fn json_on_path(&self, path: &mut Vec<*const ()>) -> std::result::Result<Option<serde_json::Value>, Cycle> {
        let json = match self {
            Value::Undefined | Value::Function(_) => return Ok(None),
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(a) => {
                enter(path, a.addr())?;
                let mut items = Vec::with_capacity(a.len());
                for item in a.to_vec() {
                    items.push(item.json_on_path(path)?.unwrap_or(serde_json::Value::Null));
                }
                path.pop();
                serde_json::Value::Array(items)
            }
            Value::Object(o) => {
                enter(path, o.addr())?;
                let mut map = serde_json::Map::new();
                for key in o.keys() {
                    if let Some(v) = o.get(&key).json_on_path(path)? {
                        map.insert(key, v);
                    }
                }
                path.pop();
                serde_json::Value::Object(map)
            }
        };
        Ok(Some(json))
    }
}

/// A container reached again through its own contents.
struct Cycle;

fn enter(path: &mut Vec<*const ()>, addr: *const ()) -> std::result::Result<(), Cycle> {
    if path.contains(&addr) {
        return Err(Cycle);
    }
    path.push(addr);
    Ok(())
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&util::format_number(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(a) => fmt::Debug::fmt(a, f),
            Value::Object(o) => fmt::Debug::fmt(o, f),
            Value::Function(func) => fmt::Debug::fmt(func, f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&util::str_val(self))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_eq(self, other, &mut Vec::new())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let obj = Object::new();
                for (k, v) in map {
                    obj.set(k, Value::from(v));
                }
                Value::Object(obj)
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        Value::from(v.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}
