//! Text templating.
//!
//! Message content supports `{{ ref }}` interpolation and
//! `{% if ref %}...{% else %}...{% endif %}` blocks. Consumed by action
//! handlers; the kernel itself never templates.

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex_lite::{Captures, Regex};
use serde_json::Value;

use tripwright_domain::EvalContext;

use super::lookup::{is_truthy, lookup_ref};

fn iso_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.?\d*Z$")
            .expect("static pattern should compile")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{10}$").expect("static pattern should compile"))
}

fn interpolation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([\w\-.:]+)\s*\}\}").expect("static pattern should compile")
    })
}

fn if_else_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{%\s*if\s+(.+?)\s*%\}(.*?)(?:\{%\s*else\s*%\}(.*?))?\{%\s*endif\s*%\}")
            .expect("static pattern should compile")
    })
}

/// Render a value as user-facing text, interpolating refs from the
/// context. Booleans read as Yes/No; ISO timestamps render as clock
/// times in the given display offset (UTC when none).
pub fn template_text(
    eval_context: &EvalContext,
    text: &Value,
    timezone: Option<FixedOffset>,
) -> String {
    match text {
        Value::Null => String::new(),
        Value::Bool(false) => "No".to_string(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => template_string(eval_context, s, timezone),
        other => other.to_string(),
    }
}

fn template_string(
    eval_context: &EvalContext,
    text: &str,
    timezone: Option<FixedOffset>,
) -> String {
    if iso_time_regex().is_match(text) {
        return format_clock_time(text, timezone);
    }
    if phone_regex().is_match(text) {
        return format!("({}) {}-{}", &text[0..3], &text[3..6], &text[6..]);
    }

    // Interpolate {{ }}s first, then {% if %} blocks.
    let interpolated = interpolation_regex().replace_all(text, |caps: &Captures<'_>| {
        let resolved = lookup_ref(eval_context, &Value::String(caps[1].to_string()));
        template_text(eval_context, &resolved, timezone)
    });
    if_else_regex()
        .replace_all(&interpolated, |caps: &Captures<'_>| {
            let test = lookup_ref(eval_context, &Value::String(caps[1].to_string()));
            if is_truthy(&test) {
                caps[2].to_string()
            } else {
                caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default()
            }
        })
        .into_owned()
}

fn format_clock_time(raw: &str, timezone: Option<FixedOffset>) -> String {
    let Ok(parsed) = raw.parse::<DateTime<Utc>>() else {
        return raw.to_string();
    };
    match timezone {
        Some(offset) => parsed.with_timezone(&offset).format("%-I:%M%P").to_string(),
        None => parsed.format("%-I:%M%P").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> EvalContext {
        serde_json::from_value(json!({
            "name": "Sarai",
            "excited": true,
            "calm": false,
            "count": 3
        }))
        .expect("context should deserialize")
    }

    #[test]
    fn test_scalar_rendering() {
        let ctx = EvalContext::new();
        assert_eq!(template_text(&ctx, &Value::Null, None), "");
        assert_eq!(template_text(&ctx, &json!(true), None), "Yes");
        assert_eq!(template_text(&ctx, &json!(false), None), "No");
        assert_eq!(template_text(&ctx, &json!(7), None), "7");
    }

    #[test]
    fn test_interpolation() {
        let ctx = context();
        assert_eq!(
            template_text(&ctx, &json!("hello {{name}}, you have {{count}}"), None),
            "hello Sarai, you have 3"
        );
        assert_eq!(template_text(&ctx, &json!("{{ missing }}"), None), "");
    }

    #[test]
    fn test_if_else_blocks() {
        let ctx = context();
        assert_eq!(
            template_text(&ctx, &json!("{% if excited %}yay{% endif %}"), None),
            "yay"
        );
        assert_eq!(
            template_text(&ctx, &json!("{% if calm %}shh{% else %}yay{% endif %}"), None),
            "yay"
        );
        assert_eq!(
            template_text(&ctx, &json!("{% if calm %}shh{% endif %}"), None),
            ""
        );
    }

    #[test]
    fn test_time_formatting() {
        let ctx = EvalContext::new();
        assert_eq!(
            template_text(&ctx, &json!("2023-05-01T19:05:00.000Z"), None),
            "7:05pm"
        );
        let offset = FixedOffset::west_opt(7 * 3600).expect("offset");
        assert_eq!(
            template_text(&ctx, &json!("2023-05-01T19:05:00.000Z"), Some(offset)),
            "12:05pm"
        );
    }

    #[test]
    fn test_phone_formatting() {
        let ctx = EvalContext::new();
        assert_eq!(
            template_text(&ctx, &json!("5551234567"), None),
            "(555) 123-4567"
        );
    }
}
