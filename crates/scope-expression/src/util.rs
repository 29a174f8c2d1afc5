//! JavaScript-style coercions shared by the compiler, guards and operators.

use crate::value::{Array, Value};

// ----------------------------------------------------------------- Type helpers

/// Returns the `typeof`-like name of a value.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "undefined",
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Function(_) => "function",
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
    }
}

// ------------------------------------------------------------- Number helpers

/// ToNumber. Unlike the unary operators, `undefined` is NaN here.
pub fn num(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => parse_numeric_string(s),
        Value::Array(a) => match a.len() {
            0 => 0.0,
            1 => num(&Value::String(str_val(&a.get(0)))),
            _ => f64::NAN,
        },
        Value::Object(_) | Value::Function(_) => f64::NAN,
    }
}

fn parse_numeric_string(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf"/"nan" spellings that JavaScript does not.
        t if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        t => t.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Number ToString: shortest round-trip digits, written in plain notation
/// for decimal exponents in `-7 < e < 21` and as `1.5e+21` otherwise.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        // Covers -0.
        return "0".to_string();
    }

    let sign = if n < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", n.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    // Position of the decimal point counted from the first digit.
    let point = exponent + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat(-point as usize), digits)
    } else {
        let (first, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() { String::new() } else { format!(".{}", rest) };
        let e = point - 1;
        format!("{}{}e{}{}", first, fraction, if e < 0 { '-' } else { '+' }, e.abs())
    };
    format!("{}{}", sign, body)
}

// ------------------------------------------------------------- String helpers

/// ToString.
pub fn str_val(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::Array(a) => join_elements(a, &mut Vec::new()),
        Value::Object(_) => "[object Object]".to_string(),
        Value::Function(f) => format!("function {}() {{ [native code] }}", f.name()),
    }
}

/// Comma join of array elements; nullish elements and an array met again
/// inside itself join as empty strings.
fn join_elements(array: &Array, path: &mut Vec<Array>) -> String {
    if path.iter().any(|seen| seen.ptr_eq(array)) {
        return String::new();
    }
    path.push(array.clone());
    let mut parts = Vec::with_capacity(array.len());
    for item in array.to_vec() {
        parts.push(match &item {
            Value::Array(nested) => join_elements(nested, path),
            v if v.is_nullish() => String::new(),
            v => str_val(v),
        });
    }
    path.pop();
    parts.join(",")
}

/// Converts a computed-member key to the property name it addresses.
pub fn property_key(value: &Value) -> String {
    str_val(value)
}

/// Parses a canonical array index (`"0"`, `"12"`, never `"01"` or `"-1"`).
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<usize>().ok()
}
