//! Runtime safety guards invoked by compiled expressions.
//!
//! Each guard is stateless and either hands its argument back or fails with
//! a security error. The compiler only decides where the calls go.

use crate::error::{ExprError, ForbiddenCategory, Result};
use crate::util::is_truthy;
use crate::value::{FunctionKind, Object, ObjectKind, Value};
use log::warn;

/// Member names that give access to prototypes or constructors.
pub const FORBIDDEN_MEMBER_NAMES: [&str; 6] = [
    "constructor",
    "__proto__",
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
];

pub fn ensure_safe_member_name(name: &str) -> Result<&str> {
    if FORBIDDEN_MEMBER_NAMES.contains(&name) {
        warn!(target: "scope_expression", "rejected member name {:?}", name);
        return Err(ExprError::UnsafeMemberName(name.to_string()));
    }
    Ok(name)
}

pub fn ensure_safe_object(value: Value) -> Result<Value> {
    if !is_truthy(&value) {
        return Ok(value);
    }
    let category = match &value {
        Value::Object(obj) => forbidden_object(obj),
        Value::Function(f) => match f.kind() {
            FunctionKind::Constructor => Some(ForbiddenCategory::Constructor),
            FunctionKind::ObjectConstructor => Some(ForbiddenCategory::ObjectConstructor),
            _ => None,
        },
        _ => None,
    };
    match category {
        Some(category) => {
            warn!(target: "scope_expression", "rejected object: {}", category);
            Err(ExprError::UnsafeObject(category))
        }
        None => Ok(value),
    }
}

fn forbidden_object(obj: &Object) -> Option<ForbiddenCategory> {
    match obj.kind() {
        ObjectKind::Global => return Some(ForbiddenCategory::Global),
        ObjectKind::DomNode | ObjectKind::DomWrapper => return Some(ForbiddenCategory::DomNode),
        ObjectKind::Plain => {}
    }
    if obj.refers_to_itself("window") {
        return Some(ForbiddenCategory::Global);
    }
    if obj.refers_to_itself("constructor") {
        return Some(ForbiddenCategory::Constructor);
    }
    let has = |key: &str| is_truthy(&obj.get(key));
    if has("children") && (has("nodeName") || (has("prop") && has("attr") && has("find"))) {
        return Some(ForbiddenCategory::DomNode);
    }
    None
}

pub fn ensure_safe_function(value: Value) -> Result<Value> {
    if let Value::Function(f) = &value {
        let category = match f.kind() {
            FunctionKind::Constructor => Some(ForbiddenCategory::Constructor),
            FunctionKind::Call | FunctionKind::Apply | FunctionKind::Bind => {
                Some(ForbiddenCategory::Reflection)
            }
            FunctionKind::Native | FunctionKind::ObjectConstructor => None,
        };
        if let Some(category) = category {
            warn!(target: "scope_expression", "rejected function {:?}: {}", f.name(), category);
            return Err(ExprError::UnsafeFunction(category));
        }
    }
    Ok(value)
}

/// `fallback` when `value` is undefined, `value` otherwise.
pub fn if_defined(value: Value, fallback: Value) -> Value {
    if value.is_undefined() {
        fallback
    } else {
        value
    }
}
