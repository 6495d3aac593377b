//! Reference lookup and value coercion.
//!
//! A "ref" in a script is either a literal (a number, a quoted string,
//! `true`/`false`/`null`) or a dotted path into the eval context.
//! Coercion rules intentionally mirror loose scripting semantics so
//! authored conditions behave the way authors expect: `"10"` is the
//! number ten, an absent value is null, null and empty string are falsy.

use serde_json::{Number, Value};

use tripwright_domain::EvalContext;

/// Resolve a ref to its value. Non-string refs pass through; string
/// refs resolve as literal number, constant, quoted string, or context
/// path, in that order. Absent paths resolve to null.
pub fn lookup_ref(eval_context: &EvalContext, ref_value: &Value) -> Value {
    let text = match ref_value {
        Value::Bool(_) | Value::Number(_) | Value::Null => return ref_value.clone(),
        Value::String(text) => text,
        // Containers are not valid refs.
        _ => return Value::Null,
    };
    if let Some(number) = parse_number_literal(text) {
        return Value::Number(number);
    }
    match text.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Some(inner) = strip_quotes(text) {
        return Value::String(inner.to_string());
    }
    eval_context
        .lookup_path(text)
        .cloned()
        .unwrap_or(Value::Null)
}

/// Loose truthiness: null, false, zero, and the empty string are falsy;
/// everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric coercion for comparisons. Unparseable values coerce to zero
/// so a bad ref compares as zero rather than failing the pass.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return 0.0;
            }
            parse_f64(trimmed).unwrap_or(0.0)
        }
        Value::Array(_) | Value::Object(_) => 0.0,
    }
}

/// String coercion for case-insensitive equality: falsy values compare
/// as the empty string, numbers print without a trailing `.0`.
pub fn to_comparable_string(value: &Value) -> String {
    if !is_truthy(value) {
        return String::new();
    }
    match value {
        Value::Bool(_) => "true".to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
        // Null and false are unreachable here (falsy).
    }
}

fn format_number(number: &Number) -> String {
    if let Some(i) = number.as_i64() {
        return i.to_string();
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => number.to_string(),
    }
}

fn parse_number_literal(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        // An empty ref coerces to zero, matching loose number semantics.
        return Some(Number::from(0));
    }
    let parsed = parse_f64(trimmed)?;
    if parsed.fract() == 0.0 && parsed.abs() < 9e15 {
        Some(Number::from(parsed as i64))
    } else {
        Number::from_f64(parsed)
    }
}

fn parse_f64(text: &str) -> Option<f64> {
    // Rust accepts "inf"/"nan" spellings that scripts never mean.
    if text
        .chars()
        .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E'))
    {
        return None;
    }
    let parsed: f64 = text.parse().ok()?;
    parsed.is_finite().then_some(parsed)
}

fn strip_quotes(text: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return Some(&text[1..text.len() - 1]);
        }
    }
    None
}
